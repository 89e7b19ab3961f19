use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {section} configuration: {source}")]
    Env {
        section: &'static str,
        #[source]
        source: envy::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
}

/// `APP_*`
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_env")]
    pub env: String,

    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,
}

/// `DATABASE_*`, plus the unprefixed `RUN_MIGRATIONS` switch.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_true", skip)]
    pub run_migrations: bool,
}

/// `KAFKA_*`
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaConfig {
    /// When false the service runs against the in-process broker.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_kafka_brokers")]
    pub brokers: String,

    #[serde(default = "default_kafka_topic")]
    pub topic: String,

    #[serde(default = "default_kafka_group_id")]
    pub group_id: String,

    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub auto_create_topic: bool,

    #[serde(default = "default_true")]
    pub consumer_enabled: bool,
}

#[derive(Deserialize)]
struct MigrationSwitch {
    #[serde(default = "default_true")]
    run_migrations: bool,
}

// Default value functions
fn default_app_env() -> String {
    "development".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_kafka_brokers() -> String {
    "localhost:9092".to_string()
}

fn default_kafka_topic() -> String {
    user_events::USER_EVENTS_TOPIC.to_string()
}

fn default_kafka_group_id() -> String {
    user_events::USER_EVENTS_GROUP.to_string()
}

fn default_publish_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Read the configuration from the process environment.
    ///
    /// `.env` loading is left to the binary so tests see only what they set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let app: AppConfig = envy::prefixed("APP_")
            .from_env()
            .map_err(|source| ConfigError::Env {
                section: "app",
                source,
            })?;

        let mut database: DatabaseConfig = envy::prefixed("DATABASE_")
            .from_env()
            .map_err(|source| ConfigError::Env {
                section: "database",
                source,
            })?;
        let switch: MigrationSwitch = envy::from_env().map_err(|source| ConfigError::Env {
            section: "database",
            source,
        })?;
        database.run_migrations = switch.run_migrations;

        let kafka: KafkaConfig = envy::prefixed("KAFKA_")
            .from_env()
            .map_err(|source| ConfigError::Env {
                section: "kafka",
                source,
            })?;

        let config = Config {
            app,
            database,
            kafka,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Invalid("DATABASE_URL must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }
        if self.kafka.enabled && self.kafka.brokers.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "KAFKA_BROKERS must be set when Kafka is enabled".into(),
            ));
        }
        if self.kafka.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("KAFKA_TOPIC must not be empty".into()));
        }
        if self.kafka.publish_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "KAFKA_PUBLISH_TIMEOUT_MS must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.app.host.clone(), self.app.port)
    }
}

impl KafkaConfig {
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}
