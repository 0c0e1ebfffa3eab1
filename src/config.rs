//! Stream configuration
//!
//! All knobs are fixed at construction; the façade never mutates them.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Error, Result};

/// Configuration for one streaming session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// MQTT broker hostname or IP
    pub broker_host: String,
    /// MQTT broker port
    pub broker_port: u16,
    /// Client identity presented to the broker
    pub client_id: String,
    /// Topic namespace prefix, without trailing slash
    pub base_topic: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Sample bit depth (must be 16)
    pub bit_depth: u16,
    /// Frames the device's playback buffer can hold
    pub device_queue: u32,
    /// Queue depth at/above which writes are dropped
    pub max_queue: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: DEFAULT_BROKER_PORT,
            client_id: "streamy-sender".to_string(),
            base_topic: "/stream".to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: DEFAULT_BIT_DEPTH,
            device_queue: DEFAULT_DEVICE_QUEUE,
            max_queue: DEFAULT_MAX_QUEUE,
        }
    }
}

impl StreamConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.broker_host.is_empty() {
            return Err(Error::Config("broker host must not be empty".into()));
        }
        if self.client_id.is_empty() {
            return Err(Error::Config("client id must not be empty".into()));
        }
        if self.base_topic.is_empty() || self.base_topic.ends_with('/') {
            return Err(Error::Config(
                "base topic must be non-empty without trailing slash".into(),
            ));
        }
        if self.sample_rate == 0 {
            return Err(Error::Config("sample rate must be positive".into()));
        }
        if self.bit_depth != 16 {
            return Err(Error::Config(format!(
                "unsupported bit depth: {}",
                self.bit_depth
            )));
        }
        if self.device_queue == 0 {
            return Err(Error::Config("device queue must be positive".into()));
        }
        if self.max_queue < self.device_queue {
            return Err(Error::Config(
                "max queue must be at least the device queue".into(),
            ));
        }
        Ok(())
    }
}
