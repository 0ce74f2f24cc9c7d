//! Error types for oltssh.
//!
//! Errors are layered the same way the crate is: transport (SSH dial and
//! credentials), channel (prompt matching over the byte stream), driver
//! (command results, capability checks, caller input) and platform
//! (vendor registry). [`Error::kind`] flattens them into the taxonomy
//! callers branch on.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for oltssh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Both halves of a session teardown failed.
    #[error("Close failed: {}", join_errors(.0))]
    Close(Vec<Error>),
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Credentials were rejected, either by SSH or by the device shell
    #[error("Authentication failed for user '{user}' on {host}: {reason}")]
    AuthenticationFailed {
        host: String,
        user: String,
        reason: String,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key does not match the known_hosts entry
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Connection was closed unexpectedly
    #[error("Connection disconnected")]
    Disconnected,
}

/// Channel layer errors (pattern matching over the shell stream).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// A blocking step exceeded its deadline
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
        partial: String,
    },

    /// The caller cancelled a blocking step
    #[error("{operation} cancelled")]
    Cancelled {
        operation: &'static str,
        partial: String,
    },

    /// Remote end closed the stream
    #[error("Channel closed")]
    Closed { partial: String },

    /// I/O error on the shell stream
    #[error("Channel I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Driver layer errors (command results, capability checks, caller input).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Session not connected
    #[error("Session not connected - call connect() first")]
    NotConnected,

    /// Command response carried an error banner, or the prompt never came back
    #[error("Command '{command}' failed: {message}")]
    CommandFailed {
        command: String,
        message: String,
        output: Option<String>,
    },

    /// The vendor/model cannot perform the operation
    #[error("{operation} is not supported by {vendor} {model}{}", fmt_reason(.reason))]
    Unsupported {
        vendor: String,
        model: String,
        operation: String,
        reason: Option<String>,
    },

    /// Caller-supplied argument is malformed
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Referenced resource does not exist on the device
    #[error("{resource} '{id}' not found")]
    NotFound { resource: String, id: String },

    /// Operation is not valid in the current shell state
    #[error("Cannot {event} while {state}")]
    InvalidState { state: String, event: String },
}

fn fmt_reason(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(" ({r})"),
        None => String::new(),
    }
}

/// Platform/vendor registry errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No driver registered for the vendor
    #[error("Unsupported vendor '{vendor}'")]
    UnsupportedVendor { vendor: String },

    /// Invalid vendor table or capability definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },
}

/// Flat classification of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Connection,
    Authentication,
    Command,
    Timeout,
    Cancelled,
    Unsupported,
    Validation,
    NotFound,
    NotConnected,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connection => "connection",
            Self::Authentication => "authentication",
            Self::Command => "command",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
            Self::Unsupported => "unsupported",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::NotConnected => "not_connected",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(e) => match e {
                TransportError::AuthenticationFailed { .. } | TransportError::Key(_) => {
                    ErrorKind::Authentication
                }
                _ => ErrorKind::Connection,
            },
            Error::Channel(e) => match e {
                ChannelError::Timeout { .. } => ErrorKind::Timeout,
                ChannelError::Cancelled { .. } => ErrorKind::Cancelled,
                ChannelError::Closed { .. } | ChannelError::Io(_) => ErrorKind::Connection,
                ChannelError::InvalidPattern(_) => ErrorKind::Validation,
            },
            Error::Driver(e) => match e {
                DriverError::NotConnected => ErrorKind::NotConnected,
                DriverError::CommandFailed { .. } => ErrorKind::Command,
                DriverError::Unsupported { .. } => ErrorKind::Unsupported,
                DriverError::Validation { .. } => ErrorKind::Validation,
                DriverError::NotFound { .. } => ErrorKind::NotFound,
                DriverError::InvalidState { .. } => ErrorKind::Other,
            },
            Error::Platform(e) => match e {
                PlatformError::UnsupportedVendor { .. } => ErrorKind::Unsupported,
                PlatformError::InvalidDefinition { .. } => ErrorKind::Validation,
            },
            Error::Close(_) => ErrorKind::Other,
        }
    }

    /// Device text captured before the failure, if any.
    pub fn partial_output(&self) -> Option<&str> {
        match self {
            Error::Channel(
                ChannelError::Timeout { partial, .. }
                | ChannelError::Cancelled { partial, .. }
                | ChannelError::Closed { partial },
            ) => Some(partial.as_str()),
            Error::Driver(DriverError::CommandFailed { output, .. }) => output.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DriverError::Validation {
            field: field.into(),
            message: message.into(),
        }
        .into()
    }
}

/// Result type alias using oltssh's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err: Error = TransportError::AuthenticationFailed {
            host: "10.0.0.1".into(),
            user: "admin".into(),
            reason: "rejected".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let err: Error = ChannelError::Timeout {
            operation: "execute",
            timeout: Duration::from_secs(3),
            partial: "half a table".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(err.partial_output(), Some("half a table"));

        let err: Error = DriverError::NotConnected.into();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        assert!(err.partial_output().is_none());
    }

    #[test]
    fn test_command_failed_without_output() {
        let err: Error = DriverError::CommandFailed {
            command: "display board 0".into(),
            message: "prompt not detected".into(),
            output: None,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(err.partial_output().is_none());
    }

    #[test]
    fn test_unsupported_display() {
        let err: Error = DriverError::Unsupported {
            vendor: "vsol".into(),
            model: "V1600D".into(),
            operation: "vlan_translation".into(),
            reason: Some("firmware lacks translation tables".into()),
        }
        .into();
        let text = err.to_string();
        assert!(text.contains("vlan_translation is not supported by vsol V1600D"));
        assert!(text.contains("(firmware lacks translation tables)"));
    }

    #[test]
    fn test_close_aggregates_messages() {
        let err = Error::Close(vec![
            ChannelError::Closed {
                partial: String::new(),
            }
            .into(),
            TransportError::Disconnected.into(),
        ]);
        let text = err.to_string();
        assert!(text.contains("Channel closed"));
        assert!(text.contains("Connection disconnected"));
    }
}
