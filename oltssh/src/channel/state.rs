//! Shell session state machine.

use std::fmt;

/// Where an interactive shell session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellState {
    /// No shell opened yet.
    Disconnected,
    /// Waiting for the first prompt or a login banner.
    AwaitingBanner,
    /// Username sent in response to a shell-level login banner.
    LoginUsername,
    /// Secret sent in response to a password banner.
    LoginPassword,
    /// Prompt seen; ready for a command.
    Ready,
    /// A command was sent; waiting for the prompt.
    Executing,
    /// Closed or failed; unusable.
    Closed,
}

/// Inputs that move a [`ShellState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
    Open,
    PromptMatched,
    LoginMatched,
    PasswordMatched,
    CommandSent,
    /// A command wait ended without the prompt (timeout or cancellation).
    Abandoned,
    Fail,
    Close,
}

impl ShellState {
    /// The state reached by applying `event`, or `None` if the transition
    /// is not allowed.
    pub fn next(self, event: ShellEvent) -> Option<ShellState> {
        use ShellEvent as E;
        use ShellState as S;

        match (self, event) {
            (_, E::Close) | (_, E::Fail) => Some(S::Closed),
            (S::Disconnected, E::Open) => Some(S::AwaitingBanner),
            (S::AwaitingBanner, E::PromptMatched) => Some(S::Ready),
            (S::AwaitingBanner, E::LoginMatched) => Some(S::LoginUsername),
            // SSH already carried the username; the shell only wants the secret
            (S::AwaitingBanner, E::PasswordMatched) => Some(S::LoginPassword),
            (S::LoginUsername, E::PasswordMatched) => Some(S::LoginPassword),
            // some shells accept the username alone
            (S::LoginUsername, E::PromptMatched) => Some(S::Ready),
            (S::LoginPassword, E::PromptMatched) => Some(S::Ready),
            (S::Ready, E::CommandSent) => Some(S::Executing),
            (S::Executing, E::PromptMatched) => Some(S::Ready),
            (S::Executing, E::Abandoned) => Some(S::Ready),
            _ => None,
        }
    }

    /// Whether a command may be sent.
    pub fn is_ready(self) -> bool {
        self == ShellState::Ready
    }
}

impl fmt::Display for ShellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::AwaitingBanner => "awaiting banner",
            Self::LoginUsername => "sending username",
            Self::LoginPassword => "sending password",
            Self::Ready => "ready",
            Self::Executing => "executing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

impl fmt::Display for ShellEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::PromptMatched => "match prompt",
            Self::LoginMatched => "match login banner",
            Self::PasswordMatched => "match password banner",
            Self::CommandSent => "send command",
            Self::Abandoned => "abandon command",
            Self::Fail => "fail",
            Self::Close => "close",
        };
        f.write_str(s)
    }
}
