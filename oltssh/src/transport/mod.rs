//! SSH transport layer wrapping russh.
//!
//! This module provides the low-level SSH connection management,
//! handling connection setup, authentication, and PTY shell creation.
//! It has no knowledge of prompts or commands.

pub mod config;
mod ssh;

pub use config::{HostKeyVerification, SessionConfig, SessionConfigBuilder};
pub use ssh::SshTransport;
