//! Channel layer: the expect engine and everything it matches with.
//!
//! This module handles the interactive shell: prompt and banner detection,
//! shell-level login, ANSI stripping, pager handling and command output
//! cleaning. It knows nothing about SSH; any async byte stream will do.

mod buffer;
mod engine;
mod normalize;
mod patterns;
mod state;
pub mod tables;

pub use buffer::PatternBuffer;
pub use engine::{DEFAULT_SEARCH_DEPTH, ExpectEngine};
pub use normalize::{clean_output, detect_error};
pub use patterns::{
    BannerMatch, GENERIC_PROMPT, PAGER_PATTERN, PASSWORD_PATTERN, PromptPattern,
    USERNAME_PATTERN, classify_banner,
};
pub use state::{ShellEvent, ShellState};
pub use tables::VendorTables;
