use crate::error::RegistryError;
use crate::transport::{ConnectionPolicy, DEFAULT_DIAL_TIMEOUT, DEFAULT_KEEPALIVE_PERIOD};
use config::Config;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Registry client configuration, loadable from a file or assembled
/// with the builder. Immutable once handed to a client.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(default)]
pub struct RegistryConfig {
    /// Seed machine addresses, in preference order, e.g. `10.0.0.2:8080`
    /// or `https://registry.internal:443`. Scheme defaults to http.
    #[serde(default)]
    pub endpoints: Vec<String>,
    /// Upper bound on connection establishment per machine, e.g. `1s`, `250ms`
    #[serde(rename = "timeout", default = "default_dial_timeout", with = "humantime_serde")]
    pub dial_timeout: Duration,
    /// TCP keepalive probe period. Explicit `null` turns probing off.
    #[serde(default = "default_keepalive", with = "humantime_serde")]
    pub keepalive: Option<Duration>,
    /// Consistency mode forwarded to the registry. The client does not
    /// interpret it.
    #[serde(default)]
    pub consistency: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            keepalive: Some(DEFAULT_KEEPALIVE_PERIOD),
            consistency: String::new(),
        }
    }
}

fn default_dial_timeout() -> Duration {
    DEFAULT_DIAL_TIMEOUT
}

fn default_keepalive() -> Option<Duration> {
    Some(DEFAULT_KEEPALIVE_PERIOD)
}

impl RegistryConfig {
    pub fn load(path: &PathBuf) -> Result<RegistryConfig, RegistryError> {
        let cfg = Config::builder()
            .add_source(config::File::from(path.to_path_buf()))
            .build()?;

        Ok(cfg.try_deserialize::<RegistryConfig>()?)
    }

    /// Validates the configuration before a client is built from it
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.endpoints.is_empty() {
            return Err(RegistryError::NoSeedMachines);
        }

        if self.dial_timeout.is_zero() {
            return Err(RegistryError::Config(config::ConfigError::Message(
                "timeout must be non-zero".to_string(),
            )));
        }

        Ok(())
    }

    /// The connection policy this configuration asks transports to honor.
    pub fn policy(&self) -> ConnectionPolicy {
        ConnectionPolicy {
            dial_timeout: self.dial_timeout,
            keepalive: self.keepalive,
        }
    }
}
