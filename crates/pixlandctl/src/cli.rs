//! Command-line definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pixlandctl")]
#[command(about = "Pixland - canvas keys, player levels and job polling", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: $PIXLAND_CONFIG or ./pixland.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode and decode canvas cell keys
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Show the level for a pixel count
    Level {
        /// Pixels placed so far
        pixels: u64,

        /// Previous count, to report a level-up and new rewards
        #[arg(long)]
        since: Option<u64>,
    },

    /// List rewards and whether they are unlocked
    Rewards {
        /// Pixels placed so far
        pixels: u64,

        /// Hide locked rewards
        #[arg(long)]
        unlocked_only: bool,
    },

    /// Inspect level tables
    Levels {
        #[command(subcommand)]
        action: LevelsAction,
    },

    /// Poll an image-generation job until it finishes
    Poll {
        /// Job id returned when the job was submitted
        job_id: String,

        /// Retries after the first check (default from config)
        #[arg(long)]
        max_attempts: Option<u32>,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Pack a cell into a key
    Encode {
        #[arg(allow_negative_numbers = true)]
        x: i64,
        #[arg(allow_negative_numbers = true)]
        y: i64,
        /// Largest coordinate, 2^n - 1 (default from config)
        #[arg(long)]
        max_value: Option<u64>,
    },

    /// Unpack a key into a cell
    Decode {
        key: u64,
        #[arg(long)]
        max_value: Option<u64>,
    },

    /// Keys of every cell in a box, row by row
    Box {
        #[arg(allow_negative_numbers = true)]
        left: i64,
        #[arg(allow_negative_numbers = true)]
        top: i64,
        #[arg(allow_negative_numbers = true)]
        right: i64,
        #[arg(allow_negative_numbers = true)]
        bottom: i64,
        #[arg(long)]
        max_value: Option<u64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LevelsAction {
    /// Print the active level table
    Show,

    /// Validate a level table file
    Check { path: PathBuf },
}
