//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{Error, Result};

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Default command timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default liveness-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Host key verification mode, analogous to OpenSSH's `StrictHostKeyChecking`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Reject unknown and changed keys. Connection fails if the host
    /// is not already in known_hosts.
    Strict,

    /// Accept and auto-learn unknown keys, but reject changed keys.
    #[default]
    AcceptNew,

    /// Accept all keys without checking. OLT management networks are
    /// frequently re-imaged lab gear; use deliberately.
    Disabled,
}

/// Connection settings for one managed OLT.
///
/// A session keeps its own copy, so later changes to a config value never
/// affect an established session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Username, used for SSH and, when the device asks again, for the
    /// shell-level login.
    pub username: String,

    /// Password, used for SSH and the shell-level login.
    pub secret: SecretString,

    /// Secondary password for privilege escalation (`enable`). Falls back
    /// to `secret` when unset.
    pub enable_secret: Option<SecretString>,

    /// Private key for SSH public-key authentication. When set, it is
    /// tried instead of password authentication.
    pub private_key: Option<PathBuf>,

    /// Vendor tag (e.g. "huawei", "zte"); selects prompt and pager tables.
    pub vendor: String,

    /// Per-step timeout for banner, login and command execution.
    pub timeout: Duration,

    /// Timeout for the blank-line liveness probe.
    pub probe_timeout: Duration,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Host key verification mode.
    pub host_key_verification: HostKeyVerification,

    /// Path to known_hosts file.
    pub known_hosts_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Start building a config for the given host.
    pub fn builder(host: impl Into<String>) -> SessionConfigBuilder {
        SessionConfigBuilder::new(host)
    }

    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Secret used for privilege escalation.
    pub fn escalation_secret(&self) -> &SecretString {
        self.enable_secret.as_ref().unwrap_or(&self.secret)
    }
}

/// Builder for [`SessionConfig`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use oltssh::SessionConfig;
///
/// let config = SessionConfig::builder("10.10.0.2")
///     .username("admin")
///     .secret("admin123")
///     .vendor("huawei")
///     .timeout(Duration::from_secs(60))
///     .build()
///     .unwrap();
/// assert_eq!(config.port, 22);
/// ```
#[derive(Debug)]
pub struct SessionConfigBuilder {
    host: String,
    port: Option<u16>,
    username: Option<String>,
    secret: Option<SecretString>,
    enable_secret: Option<SecretString>,
    private_key: Option<PathBuf>,
    vendor: Option<String>,
    timeout: Option<Duration>,
    probe_timeout: Option<Duration>,
    terminal_width: u32,
    terminal_height: u32,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SessionConfigBuilder {
    /// Create a new builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: None,
            secret: None,
            enable_secret: None,
            private_key: None,
            vendor: None,
            timeout: None,
            probe_timeout: None,
            terminal_width: 511,
            terminal_height: 24,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    /// Set the SSH port (default: 22). Zero means "use the default".
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Set a distinct password for privilege escalation.
    pub fn enable_secret(mut self, secret: impl Into<String>) -> Self {
        self.enable_secret = Some(SecretString::from(secret.into()));
        self
    }

    /// Use public-key authentication with the given key file.
    pub fn private_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key = Some(path.into());
        self
    }

    /// Set the vendor tag.
    pub fn vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Set the per-step timeout (default: 30s). Zero means "use the default".
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the liveness-probe timeout (default: 5s).
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set host key verification mode.
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Validate and build the config. No I/O happens here.
    pub fn build(self) -> Result<SessionConfig> {
        if self.host.trim().is_empty() {
            return Err(Error::validation("host", "must not be empty"));
        }

        let username = self
            .username
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::validation("username", "is required"))?;

        let vendor = self
            .vendor
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::validation("vendor", "is required"))?;

        if self.secret.is_none() && self.private_key.is_none() {
            return Err(Error::validation(
                "secret",
                "a password or a private key is required",
            ));
        }

        let port = match self.port {
            Some(0) | None => DEFAULT_PORT,
            Some(p) => p,
        };

        let timeout = match self.timeout {
            Some(t) if !t.is_zero() => t,
            _ => DEFAULT_TIMEOUT,
        };

        let probe_timeout = match self.probe_timeout {
            Some(t) if !t.is_zero() => t,
            _ => DEFAULT_PROBE_TIMEOUT,
        };

        Ok(SessionConfig {
            host: self.host,
            port,
            username,
            secret: self.secret.unwrap_or_else(|| SecretString::from(String::new())),
            enable_secret: self.enable_secret,
            private_key: self.private_key,
            vendor,
            timeout,
            probe_timeout,
            terminal_width: self.terminal_width,
            terminal_height: self.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_applied() {
        let config = SessionConfig::builder("olt-1")
            .username("admin")
            .secret("pw")
            .vendor("Huawei")
            .port(0)
            .timeout(Duration::ZERO)
            .build()
            .unwrap();

        assert_eq!(config.port, 22);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.vendor, "huawei");
        assert_eq!(config.socket_addr(), "olt-1:22");
    }

    #[test]
    fn test_escalation_secret_falls_back() {
        let config = SessionConfig::builder("olt-1")
            .username("admin")
            .secret("pw")
            .vendor("zte")
            .build()
            .unwrap();
        assert_eq!(config.escalation_secret().expose_secret(), "pw");

        let config = SessionConfig::builder("olt-1")
            .username("admin")
            .secret("pw")
            .enable_secret("en")
            .vendor("zte")
            .build()
            .unwrap();
        assert_eq!(config.escalation_secret().expose_secret(), "en");
    }

    #[test]
    fn test_missing_fields_are_validation_errors() {
        let err = SessionConfig::builder("olt-1")
            .secret("pw")
            .vendor("zte")
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("username"));

        let err = SessionConfig::builder("")
            .username("admin")
            .secret("pw")
            .vendor("zte")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("host"));

        let err = SessionConfig::builder("olt-1")
            .username("admin")
            .vendor("zte")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let config = SessionConfig::builder("olt-1")
            .username("admin")
            .secret("hunter2")
            .vendor("nokia")
            .build()
            .unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
