use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{self, EngineError};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("four_probability must be within [0, 1], got {0}")]
    FourProbability(f64),
}

/// Settings for a single game.
///
/// Every field may be omitted in TOML:
///
/// ```toml
/// size = 5
/// four_probability = 0.1
/// seed = 42
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "defaults::size")]
    pub size: usize,
    #[serde(default = "defaults::four_probability")]
    pub four_probability: f64,
    /// Seed for the first game. Drawn from entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self { size: defaults::size(), four_probability: defaults::four_probability(), seed: None }
    }
}

impl GameConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = std::fs::File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        engine::check_size(self.size)?;
        if !(0.0..=1.0).contains(&self.four_probability) {
            return Err(ConfigError::FourProbability(self.four_probability));
        }
        Ok(())
    }
}

mod defaults {
    use crate::engine;

    pub fn size() -> usize { engine::DEFAULT_SIZE }
    pub fn four_probability() -> f64 { engine::FOUR_PROBABILITY }
}
