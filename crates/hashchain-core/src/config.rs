use crate::{constants::DEFAULT_DIFFICULTY, pow::MiningLimit};
use serde::{Deserialize, Serialize};

/// How a ledger seals new blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Required leading zero hex digits.
    pub difficulty: u32,
    /// Give up after this many digests. `None` searches until found.
    pub max_attempts: Option<u64>,
    /// Spread the nonce search over the rayon pool.
    pub parallel: bool,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_attempts: None,
            parallel: false,
        }
    }
}

impl MinerConfig {
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    pub fn limit(&self) -> MiningLimit {
        match self.max_attempts {
            Some(max) => MiningLimit::attempts(max),
            None => MiningLimit::unbounded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MinerConfig::default();
        assert_eq!(config.difficulty, DEFAULT_DIFFICULTY);
        assert!(config.limit().is_unbounded());
        assert!(!config.parallel);
    }

    #[test]
    fn limit_from_cap() {
        let config = MinerConfig {
            max_attempts: Some(7),
            ..MinerConfig::with_difficulty(4)
        };
        assert_eq!(config.limit().max_attempts(), Some(7));
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: MinerConfig = serde_json::from_str(r#"{"difficulty":3}"#).unwrap();
        assert_eq!(config, MinerConfig::with_difficulty(3));
    }
}
