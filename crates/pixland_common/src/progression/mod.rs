//! Progression Module
//!
//! Player levels driven by the number of pixels placed on the canvas.
//!
//! ## Level Table
//!
//! - Ordered tiers, each with a `min_pixels` threshold starting at 0
//! - Closed lower bound: a count equal to a threshold belongs to that tier
//! - Each tier sets the per-tick placement quota and unlocks rewards
//!
//! ## Rewards
//!
//! - Cosmetic identifiers (profile images) owned by a tier
//! - Unlocked once the owning tier is reached, and never re-locked

pub mod levels;
pub mod rewards;

pub use levels::{Level, LevelResult, LevelTable, LevelTableError, NextThreshold, STANDARD_LEVELS};
pub use rewards::{format_reward_unlock, RewardStatus};
