//! 应用运行配置加载。

use std::env;
use std::str::FromStr;
use tsw_storage::Precision;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 存储后端类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Influx,
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "influx" | "influxdb" => Ok(Self::Influx),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown storage: {}", other)),
        }
    }
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub storage: StorageKind,
    pub db_name: String,
    pub db_precision: Precision,
    pub influx_url: String,
    pub influx_username: Option<String>,
    pub influx_password: Option<String>,
    pub database_url: Option<String>,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub mqtt_topic_prefix: String,
    pub ingest_enabled: bool,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = env::var("TSW_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8905".to_string());
        let storage = read_parsed_with_default("TSW_STORAGE", StorageKind::Influx)?;
        let db_name = env::var("TSW_DB_NAME").unwrap_or_else(|_| "messages".to_string());
        let db_precision = read_parsed_with_default("TSW_DB_PRECISION", Precision::Seconds)?;
        let influx_url =
            env::var("TSW_INFLUX_URL").unwrap_or_else(|_| "http://127.0.0.1:8086".to_string());
        let influx_username = read_optional("TSW_INFLUX_USER");
        let influx_password = read_optional("TSW_INFLUX_PASS");
        let database_url = read_optional("TSW_DATABASE_URL");
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("TSW_DATABASE_URL".to_string()));
        }
        let mqtt_host = env::var("TSW_MQTT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let mqtt_port = read_parsed_with_default("TSW_MQTT_PORT", 1883u16)?;
        let mqtt_username = read_optional("TSW_MQTT_USERNAME");
        let mqtt_password = read_optional("TSW_MQTT_PASSWORD");
        let mqtt_topic_prefix =
            env::var("TSW_MQTT_TOPIC_PREFIX").unwrap_or_else(|_| "channels".to_string());
        let ingest_enabled = read_bool_with_default("TSW_INGEST", true);

        Ok(Self {
            http_addr,
            storage,
            db_name,
            db_precision,
            influx_url,
            influx_username,
            influx_password,
            database_url,
            mqtt_host,
            mqtt_port,
            mqtt_username,
            mqtt_password,
            mqtt_topic_prefix,
            ingest_enabled,
        })
    }
}

fn read_parsed_with_default<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    let value = match env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => return Ok(default),
    };
    value
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
