use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};
use voltbridge_domain::RetryPolicy;
use voltbridge_mqtt::{CloudBrokerConfig, LocalBrokerConfig};

use crate::probe::ProbeConfig;

/// Immutable gateway configuration, constructed once at startup from
/// `VOLTBRIDGE_`-prefixed environment variables and handed to each component
/// as a narrow per-component struct.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Local broker configuration
    /// Local broker URL (mqtt://host:port)
    #[serde(default = "default_local_broker_url")]
    pub local_broker_url: String,

    /// Topic the sensor node publishes on
    #[serde(default = "default_local_topic")]
    pub local_topic: String,

    /// Client identifier for the local session
    #[serde(default = "default_local_client_id")]
    pub local_client_id: String,

    /// MQTT keep-alive for both legs, in seconds
    #[serde(default = "default_mqtt_keep_alive_secs")]
    pub mqtt_keep_alive_secs: u64,

    // Cloud broker configuration
    /// Cloud broker host
    #[serde(default = "default_cloud_broker_host")]
    pub cloud_broker_host: String,

    /// Cloud broker port
    #[serde(default = "default_cloud_broker_port")]
    pub cloud_broker_port: u16,

    /// Cloud broker username (empty disables authentication)
    #[serde(default = "default_cloud_username")]
    pub cloud_username: String,

    /// Cloud broker password
    #[serde(default = "default_cloud_password")]
    pub cloud_password: String,

    /// Client identifier for cloud publishes
    #[serde(default = "default_cloud_client_id")]
    pub cloud_client_id: String,

    /// Topic the enriched envelopes are published on
    #[serde(default = "default_cloud_topic")]
    pub cloud_topic: String,

    /// Device identifier stamped on every outbound envelope
    #[serde(default = "default_device_id")]
    pub device_id: String,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    /// Maximum number of pooled connections
    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    // Connectivity probe configuration
    /// Probe target host (a well-known reachable endpoint)
    #[serde(default = "default_probe_host")]
    pub probe_host: String,

    /// Probe target port
    #[serde(default = "default_probe_port")]
    pub probe_port: u16,

    /// Probe connect timeout in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Probe attempts before giving up (1 = no retry)
    #[serde(default = "default_probe_max_attempts")]
    pub probe_max_attempts: u32,

    /// Backoff between probe attempts in seconds
    #[serde(default = "default_probe_backoff_secs")]
    pub probe_backoff_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

// Local broker defaults
fn default_local_broker_url() -> String {
    "mqtt://localhost:1883".to_string()
}

fn default_local_topic() -> String {
    "DATA/LOCAL/SENSOR/PANEL_1".to_string()
}

fn default_local_client_id() -> String {
    "voltbridge-gateway".to_string()
}

fn default_mqtt_keep_alive_secs() -> u64 {
    30
}

// Cloud broker defaults
fn default_cloud_broker_host() -> String {
    "localhost".to_string()
}

fn default_cloud_broker_port() -> u16 {
    1883
}

fn default_cloud_username() -> String {
    String::new()
}

fn default_cloud_password() -> String {
    String::new()
}

fn default_cloud_client_id() -> String {
    "voltbridge-cloud".to_string()
}

fn default_cloud_topic() -> String {
    "DATA/ONLINE/SENSOR/PANEL_1".to_string()
}

fn default_device_id() -> String {
    "panel-1".to_string()
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "sensor_db".to_string()
}

fn default_postgres_username() -> String {
    "voltbridge".to_string()
}

fn default_postgres_password() -> String {
    "voltbridge".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    5
}

// Probe defaults
fn default_probe_host() -> String {
    "8.8.8.8".to_string()
}

fn default_probe_port() -> u16 {
    53
}

fn default_probe_timeout_secs() -> u64 {
    3
}

fn default_probe_max_attempts() -> u32 {
    1
}

fn default_probe_backoff_secs() -> u64 {
    5
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("VOLTBRIDGE"))
            .build()?
            .try_deserialize()
    }

    pub fn local_broker(&self) -> LocalBrokerConfig {
        LocalBrokerConfig {
            broker_url: self.local_broker_url.clone(),
            topic: self.local_topic.clone(),
            client_id: self.local_client_id.clone(),
            keep_alive: Duration::from_secs(self.mqtt_keep_alive_secs),
        }
    }

    pub fn cloud_broker(&self) -> CloudBrokerConfig {
        CloudBrokerConfig {
            host: self.cloud_broker_host.clone(),
            port: self.cloud_broker_port,
            username: self.cloud_username.clone(),
            password: self.cloud_password.clone(),
            client_id: self.cloud_client_id.clone(),
            topic: self.cloud_topic.clone(),
            keep_alive: Duration::from_secs(self.mqtt_keep_alive_secs),
        }
    }

    pub fn probe(&self) -> ProbeConfig {
        ProbeConfig {
            host: self.probe_host.clone(),
            port: self.probe_port,
            timeout: Duration::from_secs(self.probe_timeout_secs),
        }
    }

    pub fn probe_policy(&self) -> RetryPolicy {
        if self.probe_max_attempts <= 1 {
            RetryPolicy::no_retry()
        } else {
            RetryPolicy::fixed(
                self.probe_max_attempts,
                Duration::from_secs(self.probe_backoff_secs),
            )
        }
    }
}
