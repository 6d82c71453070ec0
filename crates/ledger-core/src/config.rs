//! Chain parameters.
//!
//! Difficulty and reward are fixed for the lifetime of a chain. They default to
//! the values in [`crate::constants`] and can be read from a JSON file, e.g.
//!
//! ```json
//! { "difficulty": 3, "mining_reward": 12.5, "strategy": "parallel" }
//! ```
//!
//! Missing keys fall back to their defaults.

use crate::constants::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MINING_REWARD};
use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the proof-of-work search is run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiningStrategy {
    /// Single thread, nonce 0, 1, 2, ...
    #[default]
    Sequential,
    /// Rayon search over the nonce space. Finds the same nonce as `Sequential`.
    Parallel,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Required count of leading `'0'` hex characters in a mined block hash.
    pub difficulty: usize,
    /// Amount paid by the `network` sender to the miner of each block.
    pub mining_reward: f64,
    pub strategy: MiningStrategy,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: MINING_REWARD,
            strategy: MiningStrategy::default(),
        }
    }
}

impl ChainConfig {
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::InvalidDifficulty {
                got: self.difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        if !self.mining_reward.is_finite() || self.mining_reward < 0.0 {
            return Err(ConfigError::InvalidReward(self.mining_reward));
        }
        Ok(())
    }

    /// Reads and validates a JSON config file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ChainConfig = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}
