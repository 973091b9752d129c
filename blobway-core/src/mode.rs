use std::fmt;
use std::str::FromStr;

/// Environment variable holding the runtime mode.
pub const MODE_ENV_VAR: &str = "BLOBWAY_ENV";

/// Runtime mode. The only externally configurable behavior of the gateway:
/// production redacts error bodies, every other mode is verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Production,
    #[default]
    Development,
}

impl Mode {
    /// Read [`MODE_ENV_VAR`]; unset or unknown values mean development.
    pub fn from_env() -> Self {
        std::env::var(MODE_ENV_VAR)
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }

    pub fn from_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Mode::Production
        } else {
            Mode::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl FromStr for Mode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_value(s))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Production => f.write_str("production"),
            Mode::Development => f.write_str("development"),
        }
    }
}
