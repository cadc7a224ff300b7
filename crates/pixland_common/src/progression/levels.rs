//! Level System
//!
//! Tier table and the classifier that maps a pixel count onto it.
//!
//! The table partitions the counter into half-open ranges
//! `[min_pixels_i, min_pixels_{i+1})`, the last one unbounded. The table is
//! validated when it is built, so classification itself cannot fail.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Built-in tiers: (name, min_pixels, message, pixel_limit, profile image)
pub const STANDARD_LEVELS: &[(&str, u64, &str, u32, &str)] = &[
    ("Pixel Peasant", 0, "You've placed your first humble dot.", 6, "images/profiles/pixel-peasant.png"),
    ("Color Dabbler", 500, "Starting to make a mess, in style.", 7, "images/profiles/color-dabbler.png"),
    ("Dot Dropper", 1_500, "You're making tiny waves in the canvas ocean.", 8, "images/profiles/dot-dropper.png"),
    ("Hue Hustler", 3_000, "You've got an eye for color and no shame in clicking.", 9, "images/profiles/hue-hustler.png"),
    ("Shade Slinger", 6_000, "Flipping palettes like a cowboy flips coins.", 10, "images/profiles/shade-slinger.png"),
    ("Grid Graffiti", 10_000, "Who needs permission to paint?", 11, "images/profiles/grid-graffiti.png"),
    ("Palette Pioneer", 15_000, "Blazing trails through pixels unknown.", 12, "images/profiles/palette-pioneer.png"),
    ("Canvas Commander", 25_000, "You don't paint pixels, you order them around.", 13, "images/profiles/canvas-commander.png"),
    ("Bitmaster", 40_000, "The binary bows to your will.", 14, "images/profiles/bitmaster.png"),
    ("Pixel Picasso", 70_000, "Your mess is starting to look like art.", 15, "images/profiles/pixel-picasso.png"),
    ("Color Overlord", 120_000, "You control more shades than the sunset.", 16, "images/profiles/color-overlord.png"),
    ("The Dithering Duke", 200_000, "Smoothing edges like a royal.", 18, "images/profiles/dithering-duke.png"),
    ("Hue Sorcerer", 350_000, "Summoning colors with a click and a curse.", 20, "images/profiles/hue-sorcerer.png"),
    ("Render Ruler", 500_000, "The canvas is your kingdom. The cursor is your crown.", 22, "images/profiles/render-ruler.png"),
    ("Pixel Prophet", 700_000, "You see the final image before it even exists.", 24, "images/profiles/pixel-prophet.png"),
    ("The Glitch God", 1_000_000, "Reality bends at the power of your pixels.", 30, "images/profiles/glitch-god.png"),
];

#[derive(Error, Debug)]
pub enum LevelTableError {
    #[error("Malformed level table: {0}")]
    MalformedLevelTable(String),

    #[error("Failed to read level table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse level table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One tier of the progression table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub message: String,
    /// Lowest pixel count that belongs to this tier
    pub min_pixels: u64,
    /// Pixels the player may place per tick while in this tier
    pub pixel_limit: u32,
    /// Reward identifiers unlocked on reaching this tier
    #[serde(default)]
    pub rewards: Vec<String>,
}

/// Lower bound of the tier above the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextThreshold {
    Pixels(u64),
    /// Already in the top tier
    Unbounded,
}

impl NextThreshold {
    pub fn pixels(&self) -> Option<u64> {
        match self {
            NextThreshold::Pixels(p) => Some(*p),
            NextThreshold::Unbounded => None,
        }
    }
}

impl std::fmt::Display for NextThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextThreshold::Pixels(p) => write!(f, "{}", p),
            NextThreshold::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Classification of a pixel count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    /// Position of the tier in the table
    pub index: usize,
    pub name: String,
    pub message: String,
    pub pixel_limit: u32,
    /// Rewards owned by this tier
    pub rewards: Vec<String>,
    /// Rewards owned by this tier and every tier below it
    pub unlocked_rewards: Vec<String>,
    pub pixels_placed: u64,
    pub current_threshold: u64,
    pub next_threshold: NextThreshold,
}

impl LevelResult {
    pub fn is_max_level(&self) -> bool {
        self.next_threshold == NextThreshold::Unbounded
    }

    /// Pixels still needed to reach the next tier (None at the top)
    pub fn pixels_to_next(&self) -> Option<u64> {
        self.next_threshold
            .pixels()
            .map(|next| next.saturating_sub(self.pixels_placed))
    }

    /// Progress through the current tier (0-100)
    pub fn progress_percent(&self) -> u8 {
        let Some(next) = self.next_threshold.pixels() else {
            return 100;
        };
        let span = next.saturating_sub(self.current_threshold);
        if span == 0 {
            return 100;
        }
        let done = self.pixels_placed.saturating_sub(self.current_threshold);
        ((done as u128 * 100) / span as u128).min(100) as u8
    }
}

/// Validated, immutable level table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelTable {
    levels: Vec<Level>,
}

#[derive(Deserialize)]
struct LevelTableFile {
    levels: Vec<Level>,
}

impl LevelTable {
    /// Build a table, rejecting gaps, overlaps and duplicates.
    pub fn new(levels: Vec<Level>) -> Result<Self, LevelTableError> {
        validate(&levels)?;
        debug!(levels = levels.len(), "level table loaded");
        Ok(Self { levels })
    }

    /// The sixteen built-in tiers
    pub fn standard() -> Self {
        let levels = STANDARD_LEVELS
            .iter()
            .map(|&(name, min_pixels, message, pixel_limit, image)| Level {
                name: name.to_string(),
                message: message.to_string(),
                min_pixels,
                pixel_limit,
                rewards: vec![image.to_string()],
            })
            .collect();
        Self { levels }
    }

    /// Parse a TOML document made of `[[levels]]` records
    pub fn from_toml_str(content: &str) -> Result<Self, LevelTableError> {
        let file: LevelTableFile = toml::from_str(content)?;
        Self::new(file.levels)
    }

    pub fn load(path: &Path) -> Result<Self, LevelTableError> {
        let content = fs::read_to_string(path).map_err(|source| LevelTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the tier a count falls into: the last tier whose
    /// threshold is <= `pixels_placed`.
    pub fn level_index(&self, pixels_placed: u64) -> usize {
        // First threshold is 0, so at least one tier always matches.
        self.levels
            .partition_point(|level| level.min_pixels <= pixels_placed)
            .saturating_sub(1)
    }

    pub fn classify(&self, pixels_placed: u64) -> LevelResult {
        let index = self.level_index(pixels_placed);
        let current = &self.levels[index];
        let next_threshold = match self.levels.get(index + 1) {
            Some(next) => NextThreshold::Pixels(next.min_pixels),
            None => NextThreshold::Unbounded,
        };
        let unlocked_rewards = self.levels[..=index]
            .iter()
            .flat_map(|level| level.rewards.iter().cloned())
            .collect();

        LevelResult {
            index,
            name: current.name.clone(),
            message: current.message.clone(),
            pixel_limit: current.pixel_limit,
            rewards: current.rewards.clone(),
            unlocked_rewards,
            pixels_placed,
            current_threshold: current.min_pixels,
            next_threshold,
        }
    }

    /// The new tier, if going from `old` to `new` pixels crossed a threshold
    pub fn level_up(&self, old: u64, new: u64) -> Option<LevelResult> {
        if self.level_index(new) > self.level_index(old) {
            Some(self.classify(new))
        } else {
            None
        }
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn validate(levels: &[Level]) -> Result<(), LevelTableError> {
    let malformed = |msg: String| Err(LevelTableError::MalformedLevelTable(msg));

    let Some(first) = levels.first() else {
        return malformed("table has no levels".to_string());
    };
    if first.min_pixels != 0 {
        return malformed(format!(
            "first level '{}' starts at {} pixels, expected 0",
            first.name, first.min_pixels
        ));
    }

    for pair in levels.windows(2) {
        if pair[1].min_pixels <= pair[0].min_pixels {
            return malformed(format!(
                "level '{}' ({} pixels) does not come after '{}' ({} pixels)",
                pair[1].name, pair[1].min_pixels, pair[0].name, pair[0].min_pixels
            ));
        }
    }

    let mut names = HashSet::new();
    let mut rewards = HashSet::new();
    for level in levels {
        if level.name.trim().is_empty() {
            return malformed(format!("level at {} pixels has no name", level.min_pixels));
        }
        if !names.insert(level.name.as_str()) {
            return malformed(format!("duplicate level name '{}'", level.name));
        }
        if level.pixel_limit == 0 {
            return malformed(format!("level '{}' has a pixel limit of 0", level.name));
        }
        for reward in &level.rewards {
            if !rewards.insert(reward.as_str()) {
                return malformed(format!("reward '{}' is owned by more than one level", reward));
            }
        }
    }

    Ok(())
}
