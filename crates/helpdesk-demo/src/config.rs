use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use helpdesk_types::{Participant, SyncConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub participant: Participant,
    #[serde(default)]
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Knobs for the scripted walkthrough
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub subject: String,
    pub message: String,
    pub reply: String,
    /// Upper bound on waiting for any single snapshot
    pub step_timeout_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            subject: "Station 4 tire rack".to_string(),
            message: "Need a part replaced".to_string(),
            reply: "A technician is on the way".to_string(),
            step_timeout_ms: 2_000,
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with HELPDESK, sections split on `__`
    ///    (e.g. `HELPDESK__PARTICIPANT__ID`, `HELPDESK__LOGGING__LEVEL`)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("HELPDESK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize::<Config>()?.validated()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize::<Config>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.participant.id.trim().is_empty() {
            return Err(ConfigError::Message(
                "participant.id must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_types::Sender;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [participant]
            id = "dispatcher-7"
            role = "user"

            [sync]
            near_bottom_threshold_px = 80.0
            completion_buffer = 16
            temp_id_prefix = "pending-"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.participant.id, "dispatcher-7");
        assert_eq!(config.participant.role, Sender::User);
        assert_eq!(config.sync.near_bottom_threshold_px, 80.0);
        assert_eq!(config.sync.temp_id_prefix, "pending-");
        assert_eq!(config.demo.message, "Need a part replaced");
    }

    #[test]
    fn test_sync_section_is_optional() {
        let toml = r#"
            [participant]
            id = "support-1"
            role = "admin"

            [logging]
            level = "info"
            format = "pretty"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.participant.role.is_admin());
        assert_eq!(config.sync, SyncConfig::default());
    }

    #[test]
    fn test_default_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.participant.id, "dispatcher-7");
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.demo.step_timeout_ms, 2_000);
    }

    #[test]
    fn test_blank_participant_is_rejected() {
        let toml = r#"
            [participant]
            id = "  "
            role = "user"

            [logging]
            level = "info"
            format = "pretty"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_partial_sync_section_keeps_defaults() {
        let toml = r#"
            [participant]
            id = "dispatcher-7"
            role = "user"

            [sync]
            near_bottom_threshold_px = 150.0

            [logging]
            level = "info"
            format = "pretty"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.sync.near_bottom_threshold_px, 150.0);
        assert_eq!(config.sync.completion_buffer, 64);
    }
}
