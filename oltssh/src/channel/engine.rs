//! Expect engine: prompt detection, shell login and serialized command
//! execution over an interactive byte stream.
//!
//! The engine owns the stream outright. There is no background reader;
//! every blocking step is a single `tokio::select!` race between the next
//! read, a deadline and an optional cancellation future, so whichever
//! finishes first wins and the others are simply dropped.

use std::future::{Future, pending};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::buffer::PatternBuffer;
use super::normalize::{clean_output, detect_error};
use super::patterns::{PAGER_PATTERN, PASSWORD_PATTERN, PromptPattern, USERNAME_PATTERN};
use super::state::{ShellEvent, ShellState};
use super::tables::VendorTables;
use crate::driver::{BatchItem, BatchOptions, BatchOutcome, BatchResult, Response};
use crate::error::{ChannelError, DriverError, Error, Result, TransportError};
use crate::transport::SessionConfig;

/// Default number of trailing bytes searched for a prompt.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Resource name in not-found errors raised straight from command output.
const COMMAND_TARGET: &str = "target of";

const READ_CHUNK: usize = 4096;

// Ctrl-C
const INTERRUPT: &[u8] = b"\x03";

/// What ended one wait inside [`ExpectEngine::read_until`].
enum Wake {
    Data(io::Result<usize>),
    Deadline,
    Cancelled,
}

/// Expect-style driver for one interactive shell.
///
/// `S` is any bidirectional byte stream: an SSH channel in production, a
/// scripted mock or an in-memory duplex pipe in tests.
pub struct ExpectEngine<S> {
    stream: Option<S>,
    state: ShellState,

    host: String,
    port: u16,
    vendor: String,
    username: String,
    secret: SecretString,
    escalation_secret: SecretString,

    tables: Arc<VendorTables>,
    prompt: PromptPattern,

    timeout: Duration,
    probe_timeout: Duration,

    buffer: PatternBuffer,
    paging_disabled: bool,
}

impl<S> ExpectEngine<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a freshly opened shell stream.
    ///
    /// Nothing is read until [`open`](Self::open) is called.
    pub fn new(stream: S, config: &SessionConfig, tables: Arc<VendorTables>) -> Self {
        let prompt = tables.prompt_for(&config.vendor).clone();
        Self {
            stream: Some(stream),
            state: ShellState::Disconnected,
            host: config.host.clone(),
            port: config.port,
            vendor: config.vendor.clone(),
            username: config.username.clone(),
            secret: config.secret.clone(),
            escalation_secret: config.escalation_secret().clone(),
            tables,
            prompt,
            timeout: config.timeout,
            probe_timeout: config.probe_timeout,
            buffer: PatternBuffer::new(DEFAULT_SEARCH_DEPTH),
            paging_disabled: false,
        }
    }

    /// Current shell state.
    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// The active prompt pattern.
    pub fn prompt_pattern(&self) -> &PromptPattern {
        &self.prompt
    }

    /// Replace the active prompt pattern, e.g. after a mode change renames
    /// the prompt.
    pub fn set_prompt_pattern(&mut self, prompt: PromptPattern) {
        debug!("{}: prompt pattern set to {}", self.host, prompt.as_str());
        self.prompt = prompt;
    }

    /// Per-step timeout used by `open` and `execute`.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Whether the pager-disable command has been accepted.
    pub fn paging_disabled(&self) -> bool {
        self.paging_disabled
    }

    /// Whether pager suppression is still waiting for privilege escalation.
    pub fn paging_deferred(&self) -> bool {
        !self.paging_disabled && self.tables.requires_escalation_before_pager(&self.vendor)
    }

    /// Wait for the first prompt, log in at shell level if the device asks,
    /// then suppress paging.
    ///
    /// On failure the session is closed and the stream dropped.
    pub async fn open(&mut self) -> Result<()> {
        if let Err(e) = self.open_shell().await {
            self.abort_session();
            return Err(e);
        }

        if self.tables.requires_escalation_before_pager(&self.vendor) {
            debug!(
                "{}: deferring pager suppression for {} until escalation",
                self.host, self.vendor
            );
        } else if let Err(e) = self.disable_paging().await {
            warn!("{}: pager suppression failed: {}", self.host, e);
        }

        Ok(())
    }

    async fn open_shell(&mut self) -> Result<()> {
        self.transition(ShellEvent::Open)?;

        let prompt = self.prompt.tail().clone();
        let (matched, _) = self
            .read_until(
                &[&prompt, &*USERNAME_PATTERN, &*PASSWORD_PATTERN],
                "banner",
                self.timeout,
                pending(),
            )
            .await
            .map_err(|e| self.banner_error(e))?;

        match matched {
            0 => {}
            1 => {
                self.transition(ShellEvent::LoginMatched)?;
                self.send_username().await?;
            }
            _ => {
                self.transition(ShellEvent::PasswordMatched)?;
                self.send_password().await?;
            }
        }

        self.transition(ShellEvent::PromptMatched)?;
        debug!("{}: shell ready", self.host);
        Ok(())
    }

    async fn send_username(&mut self) -> Result<()> {
        if self.username.is_empty() {
            return Err(self.rejected("login banner received but no username is configured"));
        }

        let username = self.username.clone();
        self.send_line(&username).await?;

        match self.await_login_step().await? {
            0 => Ok(()),
            1 => {
                self.transition(ShellEvent::PasswordMatched)?;
                self.send_password().await
            }
            _ => Err(self.rejected("username rejected by device")),
        }
    }

    async fn send_password(&mut self) -> Result<()> {
        debug!("{}: sending login secret", self.host);
        let payload = secret_line(&self.secret);
        self.write_raw(&payload).await?;

        match self.await_login_step().await? {
            0 => Ok(()),
            _ => Err(self.rejected("credentials rejected by device shell")),
        }
    }

    /// Race prompt, password and username banners after a login step.
    async fn await_login_step(&mut self) -> Result<usize> {
        let prompt = self.prompt.tail().clone();
        self.read_until(
            &[&prompt, &*PASSWORD_PATTERN, &*USERNAME_PATTERN],
            "login",
            self.timeout,
            pending(),
        )
        .await
        .map(|(matched, _)| matched)
        .map_err(|e| self.login_error(e))
    }

    /// Send the vendor's pager-disable command.
    ///
    /// Called by [`open`](Self::open) for most vendors; vendors that need
    /// privilege first get it after escalation.
    pub async fn disable_paging(&mut self) -> Result<()> {
        let command = self.tables.pager_command(&self.vendor).to_string();
        self.execute(&command).await?;
        self.paging_disabled = true;
        debug!("{}: paging disabled with '{}'", self.host, command);
        Ok(())
    }

    /// Send one command and wait for the prompt.
    pub async fn execute(&mut self, command: &str) -> Result<Response> {
        self.execute_with_cancel(command, pending()).await
    }

    /// Like [`execute`](Self::execute), also racing `cancel`.
    ///
    /// A cancelled command leaves its output unread on the device; treat the
    /// session as desynchronized.
    pub async fn execute_with_cancel<F>(&mut self, command: &str, cancel: F) -> Result<Response>
    where
        F: Future<Output = ()>,
    {
        self.ensure_ready()?;
        let start = Instant::now();

        self.buffer.clear();
        debug!("{}: sending '{}'", self.host, command);
        self.send_line(command).await?;
        self.transition(ShellEvent::CommandSent)?;

        let prompt = self.prompt.tail().clone();
        let data = match self
            .read_until(&[&prompt], "execute", self.timeout, cancel)
            .await
        {
            Ok((_, data)) => data,
            Err(e) => return Err(self.settle(command, e)),
        };
        self.transition(ShellEvent::PromptMatched)?;

        let response = self.finish(command, &data, start.elapsed())?;
        debug!(
            "{}: '{}' completed in {:?} ({} bytes)",
            self.host,
            command,
            response.elapsed,
            response.raw_result.len()
        );
        Ok(response)
    }

    /// Send an elevation command (`enable`), answer its password prompt if
    /// one appears, and wait for the prompt.
    ///
    /// `secret` falls back to the configured enable secret, then the login
    /// secret.
    pub async fn execute_privileged(
        &mut self,
        command: &str,
        secret: Option<&SecretString>,
    ) -> Result<Response> {
        self.ensure_ready()?;
        let start = Instant::now();

        self.buffer.clear();
        debug!("{}: escalating with '{}'", self.host, command);
        self.send_line(command).await?;
        self.transition(ShellEvent::CommandSent)?;

        let prompt = self.prompt.tail().clone();
        let (matched, mut data) = match self
            .read_until(
                &[&prompt, &*PASSWORD_PATTERN],
                "escalate",
                self.timeout,
                pending(),
            )
            .await
        {
            Ok(found) => found,
            Err(e) => return Err(self.settle(command, e)),
        };

        if matched == 1 {
            let payload = secret_line(secret.unwrap_or(&self.escalation_secret));
            self.write_raw(&payload).await?;

            let (matched, more) = match self
                .read_until(
                    &[&prompt, &*PASSWORD_PATTERN],
                    "escalate",
                    self.timeout,
                    pending(),
                )
                .await
            {
                Ok(found) => found,
                Err(e) => return Err(self.settle(command, e)),
            };
            data.extend_from_slice(&more);

            if matched == 1 {
                warn!("{}: escalation secret rejected", self.host);
                let output = String::from_utf8_lossy(&data).into_owned();
                self.leave_password_prompt().await;
                return Err(DriverError::CommandFailed {
                    command: command.to_string(),
                    message: "escalation secret rejected".to_string(),
                    output: Some(output),
                }
                .into());
            }
        }

        self.transition(ShellEvent::PromptMatched)?;
        self.finish(command, &data, start.elapsed())
    }

    /// Run commands one after another.
    ///
    /// Never fails as a whole: each item carries its own outcome, and when
    /// `continue_on_error` is off everything after the first failure is
    /// reported as skipped.
    pub async fn execute_batch<C>(&mut self, commands: &[C], options: BatchOptions) -> BatchResult
    where
        C: AsRef<str>,
    {
        let start = Instant::now();
        let mut items = Vec::with_capacity(commands.len());
        let mut aborted = false;

        for (index, command) in commands.iter().enumerate() {
            let command = command.as_ref();
            let outcome = if aborted {
                BatchOutcome::Skipped
            } else {
                match self.execute(command).await {
                    Ok(response) => BatchOutcome::Succeeded(response),
                    Err(e) => {
                        if !options.continue_on_error {
                            debug!("{}: batch aborted at item {}: {}", self.host, index, e);
                            aborted = true;
                        }
                        BatchOutcome::Failed(e)
                    }
                }
            };
            items.push(BatchItem {
                index,
                command: command.to_string(),
                outcome,
            });
        }

        BatchResult {
            items,
            elapsed: start.elapsed(),
        }
    }

    /// Send a blank line and expect the prompt within the probe timeout.
    pub async fn is_alive(&mut self) -> bool {
        if self.ensure_ready().is_err() {
            return false;
        }

        self.buffer.clear();
        if self.write_raw(b"\n").await.is_err() || self.transition(ShellEvent::CommandSent).is_err()
        {
            return false;
        }

        let prompt = self.prompt.tail().clone();
        match self
            .read_until(&[&prompt], "liveness probe", self.probe_timeout, pending())
            .await
        {
            Ok(_) => self.transition(ShellEvent::PromptMatched).is_ok(),
            Err(e) => {
                debug!("{}: liveness probe failed: {}", self.host, e);
                let _ = self.settle("<blank line>", e);
                false
            }
        }
    }

    /// Shut the stream down. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        let stream = self.stream.take();
        self.transition(ShellEvent::Close)?;
        if let Some(mut stream) = stream {
            stream.shutdown().await.map_err(ChannelError::Io)?;
        }
        Ok(())
    }

    /// Read until one of `patterns` matches the buffer tail.
    ///
    /// Returns the index of the pattern that matched and drains the buffer.
    /// In-band pagers are answered on the way.
    async fn read_until<F>(
        &mut self,
        patterns: &[&Regex],
        operation: &'static str,
        timeout: Duration,
        cancel: F,
    ) -> Result<(usize, Vec<u8>)>
    where
        F: Future<Output = ()>,
    {
        let deadline = tokio::time::Instant::now() + timeout;
        tokio::pin!(cancel);
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(matched) = patterns.iter().position(|p| self.buffer.tail_contains(p)) {
                return Ok((matched, self.buffer.take()));
            }

            if self.buffer.strip_tail_match(&PAGER_PATTERN) {
                trace!("{}: answering pager", self.host);
                self.write_raw(b" ").await?;
                continue;
            }

            let stream = self.stream.as_mut().ok_or(DriverError::NotConnected)?;
            let wake = tokio::select! {
                biased;
                _ = &mut cancel => Wake::Cancelled,
                _ = tokio::time::sleep_until(deadline) => Wake::Deadline,
                read = stream.read(&mut chunk) => Wake::Data(read),
            };

            match wake {
                Wake::Data(Ok(0)) => {
                    return Err(ChannelError::Closed {
                        partial: self.buffer.take_string(),
                    }
                    .into());
                }
                Wake::Data(Ok(n)) => {
                    trace!("{}: read {} bytes", self.host, n);
                    self.buffer.extend(&chunk[..n]);
                }
                Wake::Data(Err(e)) => return Err(ChannelError::Io(e).into()),
                Wake::Deadline => {
                    return Err(ChannelError::Timeout {
                        operation,
                        timeout,
                        partial: self.buffer.take_string(),
                    }
                    .into());
                }
                Wake::Cancelled => {
                    return Err(ChannelError::Cancelled {
                        operation,
                        partial: self.buffer.take_string(),
                    }
                    .into());
                }
            }
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');
        self.write_raw(&payload).await
    }

    async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(DriverError::NotConnected)?;
        let mut written = stream.write_all(data).await;
        if written.is_ok() {
            written = stream.flush().await;
        }

        if let Err(e) = written {
            self.abort_session();
            return Err(ChannelError::Io(e).into());
        }
        Ok(())
    }

    /// Clean the captured output and classify error banners.
    ///
    /// Shared syntax errors always mean the command failed. A vendor error
    /// banner that also says the target is absent (Huawei's
    /// `Failure: The ONT does not exist`) is reported as not found.
    fn finish(&self, command: &str, data: &[u8], elapsed: Duration) -> Result<Response> {
        let raw = String::from_utf8_lossy(data).into_owned();
        let prompt = self.prompt.find_prompt(data).unwrap_or_default();
        let result = clean_output(&raw, command, &self.prompt);

        if let Some(banner) = detect_error(&result, self.tables.shared_error_substrings()) {
            return Err(self.command_failed(command, banner, raw));
        }

        if let Some(banner) = detect_error(&result, self.tables.vendor_error_substrings(&self.vendor))
        {
            if let Some(hit) = detect_error(&result, self.tables.not_found_substrings()) {
                debug!("{}: '{}' target missing ('{}')", self.host, command, hit);
                return Err(DriverError::NotFound {
                    resource: COMMAND_TARGET.to_string(),
                    id: command.to_string(),
                }
                .into());
            }
            return Err(self.command_failed(command, banner, raw));
        }

        Ok(Response::new(command, result, raw, prompt, elapsed))
    }

    fn command_failed(&self, command: &str, banner: &str, raw: String) -> Error {
        debug!("{}: '{}' failed with '{}'", self.host, command, banner);
        DriverError::CommandFailed {
            command: command.to_string(),
            message: format!("device reported '{banner}'"),
            output: Some(raw),
        }
        .into()
    }

    fn ensure_ready(&mut self) -> Result<()> {
        match self.state {
            ShellState::Ready if self.stream.is_some() => Ok(()),
            // a previous execute future was dropped mid-flight
            ShellState::Executing if self.stream.is_some() => {
                warn!(
                    "{}: previous command never completed; output may be desynchronized",
                    self.host
                );
                self.transition(ShellEvent::Abandoned)
            }
            ShellState::Disconnected | ShellState::Closed => Err(DriverError::NotConnected.into()),
            _ if self.stream.is_none() => Err(DriverError::NotConnected.into()),
            state => Err(DriverError::InvalidState {
                state: state.to_string(),
                event: ShellEvent::CommandSent.to_string(),
            }
            .into()),
        }
    }

    /// Settle the state after a command wait failed and shape the error.
    fn settle(&mut self, command: &str, err: Error) -> Error {
        match err {
            Error::Channel(ChannelError::Timeout { .. } | ChannelError::Cancelled { .. }) => {
                warn!(
                    "{}: '{}' abandoned ({}); session may be desynchronized",
                    self.host, command, err
                );
                let _ = self.transition(ShellEvent::Abandoned);
                err
            }
            Error::Channel(ChannelError::Closed { partial }) => {
                self.abort_session();
                DriverError::CommandFailed {
                    command: command.to_string(),
                    message: "connection closed before the prompt returned".to_string(),
                    output: Some(partial).filter(|p| !p.is_empty()),
                }
                .into()
            }
            other => {
                self.abort_session();
                other
            }
        }
    }

    /// Interrupt a password prompt left open by a rejected secret.
    ///
    /// Returns to `Ready` when the prompt comes back within the probe
    /// timeout; otherwise the session is closed, since anything sent next
    /// would be read as another password attempt.
    async fn leave_password_prompt(&mut self) {
        if self.write_raw(INTERRUPT).await.is_err() {
            return;
        }

        let prompt = self.prompt.tail().clone();
        match self
            .read_until(&[&prompt], "escalation recovery", self.probe_timeout, pending())
            .await
        {
            Ok(_) => {
                debug!("{}: back at the prompt after rejected escalation", self.host);
                let _ = self.transition(ShellEvent::Abandoned);
            }
            Err(e) => {
                warn!("{}: shell stuck at password prompt ({}); closing", self.host, e);
                self.abort_session();
            }
        }
    }

    fn banner_error(&self, err: Error) -> Error {
        match err {
            Error::Channel(ChannelError::Timeout { timeout, .. }) => {
                TransportError::ConnectionFailed {
                    host: self.host.clone(),
                    port: self.port,
                    source: io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no prompt or login banner within {timeout:?}"),
                    ),
                }
                .into()
            }
            other => other,
        }
    }

    fn login_error(&self, err: Error) -> Error {
        match err {
            Error::Channel(ChannelError::Timeout { timeout, .. }) => {
                self.rejected(&format!("no response to login within {timeout:?}"))
            }
            Error::Channel(ChannelError::Closed { .. }) => {
                self.rejected("connection closed during login")
            }
            other => other,
        }
    }

    fn rejected(&self, reason: &str) -> Error {
        TransportError::AuthenticationFailed {
            host: self.host.clone(),
            user: self.username.clone(),
            reason: reason.to_string(),
        }
        .into()
    }

    fn transition(&mut self, event: ShellEvent) -> Result<()> {
        match self.state.next(event) {
            Some(next) => {
                debug!("{}: {} -> {} on {}", self.host, self.state, next, event);
                self.state = next;
                Ok(())
            }
            None => Err(DriverError::InvalidState {
                state: self.state.to_string(),
                event: event.to_string(),
            }
            .into()),
        }
    }

    /// Move to `Closed` and drop the stream without a graceful shutdown.
    fn abort_session(&mut self) {
        if self.state != ShellState::Closed {
            debug!("{}: {} -> {} on {}", self.host, self.state, ShellState::Closed, ShellEvent::Fail);
        }
        self.state = ShellState::Closed;
        self.stream = None;
    }
}

fn secret_line(secret: &SecretString) -> Vec<u8> {
    let mut payload = secret.expose_secret().as_bytes().to_vec();
    payload.push(b'\n');
    payload
}
