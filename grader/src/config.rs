use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use treeval::runtime::Evaluator;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Grader configuration. Every section and field is optional in TOML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraderConfig {
    pub equivalence: EquivalenceConfig,
    pub runtime: RuntimeConfig,
    pub feedback: FeedbackConfig,
}

/// Tolerances for the `equivalent` equality mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivalenceConfig {
    /// Relative tolerance, scaled by the expected value.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
}

impl Default for EquivalenceConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Nested function applications allowed before a `RecursionError`.
    pub max_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_depth: Evaluator::DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Default for prefixing nested lambda body feedback with its location.
    pub expand_message: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            expand_message: true,
        }
    }
}

impl GraderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GraderConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Defaults overridden by `GRADER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = GraderConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `GRADER_RTOL`, `GRADER_ATOL`, `GRADER_MAX_DEPTH` and
    /// `GRADER_EXPAND_MESSAGE` as returned by `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup("GRADER_RTOL") {
            self.equivalence.rtol = parse_override("GRADER_RTOL", &raw)?;
        }
        if let Some(raw) = lookup("GRADER_ATOL") {
            self.equivalence.atol = parse_override("GRADER_ATOL", &raw)?;
        }
        if let Some(raw) = lookup("GRADER_MAX_DEPTH") {
            self.runtime.max_depth = parse_override("GRADER_MAX_DEPTH", &raw)?;
        }
        if let Some(raw) = lookup("GRADER_EXPAND_MESSAGE") {
            self.feedback.expand_message = parse_override("GRADER_EXPAND_MESSAGE", &raw)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("equivalence.rtol", self.equivalence.rtol),
            ("equivalence.atol", self.equivalence.atol),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    key: key.to_string(),
                    message: format!("expected a non-negative number, got {}", value),
                });
            }
        }
        let max_depth = Evaluator::MAX_SUPPORTED_DEPTH;
        if !(1..=max_depth).contains(&self.runtime.max_depth) {
            return Err(ConfigError::Invalid {
                key: "runtime.max_depth".to_string(),
                message: format!("must be between 1 and {}, got {}", max_depth, self.runtime.max_depth),
            });
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        message: format!("cannot parse '{}'", raw),
    })
}
