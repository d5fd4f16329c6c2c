use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::{KeyboardError, Result};
use crate::keyboard::REPORT_MIN_LEN;

const ENDPOINT_DIR_IN: u8 = 0x80;

/// Transport settings, loadable from YAML.
///
/// ```yaml
/// device: "001:004"
/// interface: 0
/// endpoint: 129
/// report_size: 27
/// read_timeout_ms: 50
/// ```
///
/// Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeysConfig {
    /// Enumeration path of the dongle to open; the first one found if unset.
    pub device: Option<String>,
    pub interface: u8,
    /// Interrupt IN endpoint carrying the reports.
    pub endpoint: u8,
    /// Size of the read buffer handed to the transport.
    pub report_size: usize,
    /// How long one read waits before the loop polls again.
    pub read_timeout_ms: u64,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            device: None,
            interface: 0,
            endpoint: 0x81,
            report_size: 27,
            read_timeout_ms: 50,
        }
    }
}

impl KeysConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_yaml::from_str(text).map_err(|err| KeyboardError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.report_size < REPORT_MIN_LEN {
            return Err(KeyboardError::Config(format!(
                "report_size must be at least {REPORT_MIN_LEN}, got {}",
                self.report_size
            )));
        }
        if self.read_timeout_ms == 0 {
            return Err(KeyboardError::Config(
                "read_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.endpoint & ENDPOINT_DIR_IN == 0 {
            return Err(KeyboardError::Config(format!(
                "endpoint {:#04x} is not an IN endpoint",
                self.endpoint
            )));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}
