//! Reward unlocks for the progression table.
//!
//! Every reward is owned by exactly one tier and counts as unlocked once the
//! player's pixel count reaches that tier's threshold.

use super::levels::LevelTable;
use serde::{Deserialize, Serialize};

/// A reward and whether it is available at some pixel count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardStatus {
    pub identifier: String,
    /// Name of the tier that unlocks it
    pub owner_tier_name: String,
    pub unlocked: bool,
}

impl LevelTable {
    /// Every configured reward, in table order, with its unlock state
    pub fn list_rewards(&self, pixels_placed: u64) -> Vec<RewardStatus> {
        self.levels()
            .iter()
            .flat_map(|level| {
                let unlocked = level.min_pixels <= pixels_placed;
                level.rewards.iter().map(move |reward| RewardStatus {
                    identifier: reward.clone(),
                    owner_tier_name: level.name.clone(),
                    unlocked,
                })
            })
            .collect()
    }

    /// Identifiers of the rewards unlocked at `pixels_placed`
    pub fn unlocked_rewards(&self, pixels_placed: u64) -> Vec<String> {
        self.list_rewards(pixels_placed)
            .into_iter()
            .filter(|r| r.unlocked)
            .map(|r| r.identifier)
            .collect()
    }

    /// Rewards unlocked at `new` that were still locked at `old` (for notifications)
    pub fn newly_unlocked(&self, old: u64, new: u64) -> Vec<RewardStatus> {
        self.list_rewards(new)
            .into_iter()
            .zip(self.list_rewards(old))
            .filter(|(now, before)| now.unlocked && !before.unlocked)
            .map(|(now, _)| now)
            .collect()
    }
}

/// Format a single unlock for notification
pub fn format_reward_unlock(reward: &RewardStatus) -> String {
    format!(
        "[+] Reward unlocked: {} ({})",
        reward.identifier, reward.owner_tier_name
    )
}
