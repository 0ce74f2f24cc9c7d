//! Managed device profiles and their validation.

use serde::{Deserialize, Serialize};

use crate::capability::{Protocol, ProtocolSupport};
use crate::error::{Error, Result};
use crate::transport::SessionConfigBuilder;
use crate::transport::config::DEFAULT_PORT;

/// Static description of one managed OLT, as an operator would supply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    pub vendor: String,
    #[serde(default)]
    pub model: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "ProtocolSupport::cli_only")]
    pub protocols: ProtocolSupport,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Protocol a vendor must have enabled for configuration changes.
pub fn required_config_protocol(vendor: &str) -> Protocol {
    match vendor.trim().to_lowercase().as_str() {
        "nokia" => Protocol::Netconf,
        _ => Protocol::Cli,
    }
}

impl DeviceProfile {
    /// Check the profile before any connection attempt.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::validation("host", "must not be empty"));
        }

        let vendor = self.vendor.trim().to_lowercase();
        if vendor.is_empty() {
            return Err(Error::validation("vendor", "must not be empty"));
        }

        if self.port == 0 {
            return Err(Error::validation("port", "must not be zero"));
        }

        if self.protocols.is_empty() {
            return Err(Error::validation(
                "protocols",
                "at least one protocol must be enabled",
            ));
        }

        let required = required_config_protocol(&vendor);
        if !self.protocols.supports(required) {
            return Err(Error::validation(
                "protocols",
                format!("vendor {vendor} requires config protocol {required} but it is not enabled"),
            ));
        }

        Ok(())
    }

    /// Start a session config for this device; credentials still need to
    /// be supplied.
    pub fn session_config(&self) -> SessionConfigBuilder {
        SessionConfigBuilder::new(self.host.clone())
            .port(self.port)
            .vendor(self.vendor.clone())
    }
}
