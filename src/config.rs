use crate::arms::MAX_ARMS;
use std::fmt;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9381;
pub const DEFAULT_NUM_ARMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Arm count outside 1..=MAX_ARMS
    NumArmsOutOfRange(usize),
    /// Port zero cannot be connected to
    InvalidPort(u16),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NumArmsOutOfRange(n) => {
                write!(f, "Number of arms must be between 1 and {MAX_ARMS}, got {n}")
            }
            Self::InvalidPort(port) => write!(f, "Invalid decision service port: {port}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Per-session switches, read afresh for every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaoSettings {
    /// Master switch. When off the host plans exactly as it would without us.
    pub enable_bao: bool,
    /// Report observed latency after execution.
    pub enable_rewards: bool,
    /// Let the decision service choose among arms. When off, plans are only tracked.
    pub enable_selection: bool,
    pub host: String,
    pub port: u16,
    /// Arms evaluated per query when selecting.
    pub num_arms: usize,
    /// Add the raw plan and census JSON to explain output.
    pub include_json_in_explain: bool,
}

impl Default for BaoSettings {
    fn default() -> Self {
        Self {
            enable_bao: false,
            enable_rewards: true,
            enable_selection: true,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            num_arms: DEFAULT_NUM_ARMS,
            include_json_in_explain: false,
        }
    }
}

impl BaoSettings {
    pub fn enabled() -> Self {
        Self {
            enable_bao: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_arms == 0 || self.num_arms > MAX_ARMS {
            return Err(ConfigError::NumArmsOutOfRange(self.num_arms));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        Ok(())
    }
}
