//! Rule options

use serde::{Deserialize, Serialize};

/// Variations on the card rules
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Also reject plain captures of the opponent's shielded square.
    /// Off by default: shields only stop Knight's Leap.
    pub shield_blocks_standard_captures: bool,
}

impl RuleConfig {
    /// Shields stop every capture path
    pub fn strict_shields() -> Self {
        Self {
            shield_blocks_standard_captures: true,
        }
    }
}
