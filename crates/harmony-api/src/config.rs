//! Engine configuration.

use harmony_agents::{AgentConfig, LearningConfig, OrchestratorConfig};
use harmony_core::{Error, Result};
use harmony_scoring::ProfileMapperConfig;
use serde::{Deserialize, Serialize};

/// Environment prefix, e.g. `HARMONY_LEARNING__LEARNING_RATE=0.2`
pub const ENV_PREFIX: &str = "HARMONY";

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarmonyConfig {
    /// Feedback learning parameters
    pub learning: LearningConfig,

    /// Explainer timeout and retry policy
    pub explainer: AgentConfig,

    /// Session behaviour
    pub session: OrchestratorConfig,

    /// Questionnaire mapping confidences
    pub mapper: ProfileMapperConfig,
}

impl HarmonyConfig {
    /// Load configuration from file, with environment overrides
    pub fn from_file(path: &str) -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables
    pub fn from_env() -> std::result::Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }

    /// Reject values the learning loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        let learning = &self.learning;
        if !(learning.learning_rate > 0.0 && learning.learning_rate <= 1.0) {
            return Err(Error::Config(format!(
                "learning_rate must be in (0, 1], got {}",
                learning.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&learning.pass_factor) {
            return Err(Error::Config(format!(
                "pass_factor must be in [0, 1], got {}",
                learning.pass_factor
            )));
        }
        if !(0.0..=1.0).contains(&learning.dominant_threshold) {
            return Err(Error::Config(format!(
                "dominant_threshold must be in [0, 1], got {}",
                learning.dominant_threshold
            )));
        }
        if self.explainer.timeout_ms == 0 {
            return Err(Error::Config("explainer timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarmonyConfig::default();
        assert_eq!(config.learning.learning_rate, 0.1);
        assert_eq!(config.learning.pass_factor, 0.5);
        assert_eq!(config.explainer.timeout_ms, 2_000);
        assert_eq!(config.explainer.max_retries, 1);
        assert_eq!(config.session.initial_batch, 3);
        assert!(config.session.follow_up_questions);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial_overrides() {
        let path = std::env::temp_dir().join(format!("harmony-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[learning]\nlearning_rate = 0.25\n\n[session]\ninitial_batch = 5\n",
        )
        .unwrap();

        let config = HarmonyConfig::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.learning.learning_rate, 0.25);
        assert_eq!(config.learning.pass_factor, 0.5);
        assert_eq!(config.session.initial_batch, 5);
        assert_eq!(config.explainer, AgentConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_learning_rate() {
        let mut config = HarmonyConfig::default();
        config.learning.learning_rate = 0.0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), harmony_core::ErrorKind::ConfigError);
    }
}
