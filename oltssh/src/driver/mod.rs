//! High-level driver for OLT interaction.
//!
//! The driver layer is the API callers use: connect, send commands, and
//! check capabilities before attempting an operation. A driver is shared
//! by reference; executions on one device are serialized inside it while
//! different devices run concurrently.

mod batch;
mod generic;
pub(crate) mod response;
mod session;

pub use batch::{BatchItem, BatchOptions, BatchOutcome, BatchResult};
pub use generic::{DEFAULT_ESCALATE_COMMAND, GenericOltDriver};
pub use response::Response;
pub use session::{BoxedShell, Session, ShellStream};

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::capability::{Capabilities, Operation};
use crate::error::Result;

/// Trait implemented by every vendor driver.
///
/// Vendor drivers own their command strings and output parsing; the shared
/// session logic lives in [`Session`] and is composed in, not inherited.
#[async_trait]
pub trait OltDriver: Send + Sync {
    /// Open the session. A no-op when already connected.
    async fn connect(&self) -> Result<()>;

    /// Close the session. Safe to call when already closed.
    async fn close(&self) -> Result<()>;

    /// Send a command and wait for the prompt.
    async fn execute(&self, command: &str) -> Result<Response>;

    /// Send a command, giving up early when `cancel` completes.
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use futures_util::FutureExt;
    /// use oltssh::driver::OltDriver;
    ///
    /// # async fn example(driver: &dyn OltDriver) -> Result<(), oltssh::Error> {
    /// let cancel = tokio::time::sleep(Duration::from_secs(5)).boxed();
    /// let response = driver
    ///     .execute_with_cancel("display ont info 0 all", cancel)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn execute_with_cancel(
        &self,
        command: &str,
        cancel: BoxFuture<'static, ()>,
    ) -> Result<Response>;

    /// Send commands one after another.
    async fn execute_batch(
        &self,
        commands: &[String],
        options: BatchOptions,
    ) -> Result<BatchResult>;

    /// Enter privileged mode, then finish any pager suppression that had
    /// to wait for it.
    async fn escalate(&self) -> Result<()>;

    /// Probe the session with a blank line.
    async fn is_alive(&self) -> bool;

    /// Vendor tag, lower-case.
    fn vendor(&self) -> &str;

    fn model(&self) -> &str;

    fn capabilities(&self) -> &Capabilities;

    /// Fail with an unsupported-operation error unless the device supports `op`.
    fn require(&self, op: Operation) -> Result<()> {
        self.capabilities().require(op)
    }
}
