//! Generic capability-aware OLT driver.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use tokio::sync::Mutex;

use super::OltDriver;
use super::batch::{BatchOptions, BatchResult};
use super::response::Response;
use super::session::Session;
use crate::capability::{Capabilities, Operation};
use crate::channel::{ShellState, VendorTables, detect_error};
use crate::error::{DriverError, Error, Result};
use crate::transport::SessionConfig;

/// Privilege escalation command used unless overridden.
pub const DEFAULT_ESCALATE_COMMAND: &str = "enable";

static BUILTIN_TABLES: Lazy<Arc<VendorTables>> = Lazy::new(|| Arc::new(VendorTables::builtin()));

/// Driver for any vendor with an entry in the vendor tables.
///
/// Holds the session behind an async mutex, so one device sees strictly
/// one command at a time no matter how many tasks share the driver.
///
/// # Example
///
/// ```rust,no_run
/// use oltssh::capability::Operation;
/// use oltssh::driver::OltDriver;
/// use oltssh::{DriverFactory, SessionConfig};
///
/// # async fn example() -> Result<(), oltssh::Error> {
/// let config = SessionConfig::builder("10.10.0.2")
///     .username("admin")
///     .secret("admin123")
///     .vendor("huawei")
///     .build()?;
///
/// let driver = DriverFactory::global().create_driver(config, "MA5800-X17")?;
/// driver.connect().await?;
///
/// driver.require(Operation::OnuInfo)?;
/// let response = driver.execute("display ont info 0/1/1 all").await?;
/// println!("{}", response.result);
///
/// driver.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct GenericOltDriver {
    config: SessionConfig,
    capabilities: Capabilities,
    tables: Arc<VendorTables>,
    escalate_command: String,
    session: Mutex<Option<Session>>,
}

impl GenericOltDriver {
    /// Create a driver using the built-in vendor tables.
    pub fn new(config: SessionConfig, capabilities: Capabilities) -> Self {
        Self::with_tables(config, capabilities, BUILTIN_TABLES.clone())
    }

    /// Create a driver with custom vendor tables.
    pub fn with_tables(
        config: SessionConfig,
        capabilities: Capabilities,
        tables: Arc<VendorTables>,
    ) -> Self {
        Self {
            config,
            capabilities,
            tables,
            escalate_command: DEFAULT_ESCALATE_COMMAND.to_string(),
            session: Mutex::new(None),
        }
    }

    /// Use a different privilege escalation command.
    pub fn with_escalate_command(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = command.into();
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tables(&self) -> &Arc<VendorTables> {
        &self.tables
    }

    /// Adopt a session opened elsewhere, closing any current one.
    pub async fn attach(&self, session: Session) {
        let mut guard = self.session.lock().await;
        if let Some(old) = guard.replace(session)
            && let Err(e) = old.close().await
        {
            warn!("{}: closing replaced session failed: {}", self.config.host, e);
        }
    }

    /// Whether a usable session is held.
    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| s.engine().state() != ShellState::Closed)
    }

    /// Check the capability matrix for `op`, then execute `command`.
    ///
    /// Nothing is sent when the operation is unsupported.
    pub async fn run(&self, op: Operation, command: &str) -> Result<Response> {
        self.require(op)?;
        self.execute(command).await
    }

    /// Query one resource, reporting its absence as not found.
    ///
    /// Devices signal a missing object either with an error banner or with
    /// a plain reply; both come back as [`DriverError::NotFound`] naming
    /// `resource` and `id`.
    pub async fn lookup(
        &self,
        op: Operation,
        resource: &str,
        id: &str,
        command: &str,
    ) -> Result<Response> {
        let response = self.run(op, command).await.map_err(|e| match e {
            Error::Driver(DriverError::NotFound { .. }) => DriverError::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            }
            .into(),
            other => other,
        })?;
        self.check_not_found(resource, id, &response.result)?;
        Ok(response)
    }

    /// Classify output that says a referenced resource is absent.
    pub fn check_not_found(&self, resource: &str, id: &str, output: &str) -> Result<()> {
        match detect_error(output, self.tables.not_found_substrings()) {
            Some(hit) => {
                debug!("{}: {} '{}' not found ('{}')", self.config.host, resource, id, hit);
                Err(DriverError::NotFound {
                    resource: resource.to_string(),
                    id: id.to_string(),
                }
                .into())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OltDriver for GenericOltDriver {
    async fn connect(&self) -> Result<()> {
        let mut guard = self.session.lock().await;

        if let Some(session) = guard.as_ref()
            && session.engine().state() != ShellState::Closed
        {
            debug!("{}: already connected", self.config.host);
            return Ok(());
        }

        if let Some(stale) = guard.take()
            && let Err(e) = stale.close().await
        {
            debug!("{}: closing dead session: {}", self.config.host, e);
        }

        info!(
            "{}: connecting ({} {})",
            self.config.socket_addr(),
            self.config.vendor,
            self.capabilities.model
        );
        *guard = Some(Session::connect(&self.config, self.tables.clone()).await?);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let session = self.session.lock().await.take();
        match session {
            Some(session) => {
                debug!("{}: closing session", self.config.host);
                session.close().await
            }
            None => Ok(()),
        }
    }

    async fn execute(&self, command: &str) -> Result<Response> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(DriverError::NotConnected)?;
        session.engine_mut().execute(command).await
    }

    async fn execute_with_cancel(
        &self,
        command: &str,
        cancel: BoxFuture<'static, ()>,
    ) -> Result<Response> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(DriverError::NotConnected)?;
        session
            .engine_mut()
            .execute_with_cancel(command, cancel)
            .await
    }

    async fn execute_batch(
        &self,
        commands: &[String],
        options: BatchOptions,
    ) -> Result<BatchResult> {
        let mut guard = self.session.lock().await;
        let session = guard.as_mut().ok_or(DriverError::NotConnected)?;
        Ok(session.engine_mut().execute_batch(commands, options).await)
    }

    async fn escalate(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        let engine = guard
            .as_mut()
            .ok_or(DriverError::NotConnected)?
            .engine_mut();

        engine
            .execute_privileged(&self.escalate_command, None)
            .await?;

        if engine.paging_deferred()
            && let Err(e) = engine.disable_paging().await
        {
            warn!("{}: pager suppression after escalation failed: {}", self.config.host, e);
        }
        Ok(())
    }

    async fn is_alive(&self) -> bool {
        match self.session.lock().await.as_mut() {
            Some(session) => session.engine_mut().is_alive().await,
            None => false,
        }
    }

    fn vendor(&self) -> &str {
        &self.config.vendor
    }

    fn model(&self) -> &str {
        &self.capabilities.model
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};
    use tokio_test::io::{Builder, Mock};

    use super::*;
    use crate::capability::builtin_capabilities;
    use crate::driver::BatchOutcome;
    use crate::error::ErrorKind;

    fn driver(vendor: &str, model: &str) -> GenericOltDriver {
        let config = SessionConfig::builder("olt-test")
            .username("admin")
            .secret("secret")
            .vendor(vendor)
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let caps = builtin_capabilities(vendor, model).unwrap();
        GenericOltDriver::new(config, caps)
    }

    async fn attach(driver: &GenericOltDriver, mock: Mock) {
        let session = Session::from_stream(mock, driver.config(), driver.tables().clone())
            .await
            .unwrap();
        driver.attach(session).await;
    }

    #[tokio::test]
    async fn test_execute_requires_connection() {
        let driver = driver("huawei", "MA5800-X17");
        let err = driver.execute("display board 0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotConnected);
        assert!(!driver.is_alive().await);
        assert!(!driver.is_connected().await);
        driver.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_attached_session_executes() {
        let mock = Builder::new()
            .read(b"MA5800#")
            .write(b"scroll\n")
            .read(b"scroll\r\nMA5800#")
            .write(b"display board 0\n")
            .read(b"display board 0\r\n  1  H901GPHF  Normal\r\nMA5800#")
            .build();

        let driver = driver("huawei", "MA5800-X17");
        attach(&driver, mock).await;
        assert!(driver.is_connected().await);

        // already connected: no dial
        driver.connect().await.unwrap();

        let resp = driver.execute("display board 0").await.unwrap();
        assert_eq!(resp.result, "  1  H901GPHF  Normal");

        driver.close().await.unwrap();
        driver.close().await.unwrap();
        assert!(!driver.is_connected().await);
    }

    #[tokio::test]
    async fn test_unsupported_operation_sends_nothing() {
        let mock = Builder::new().read(b"V1600D#").build();

        let driver = driver("vsol", "V1600D");
        attach(&driver, mock).await;

        let err = driver
            .run(Operation::PerformanceCounters, "show pon statistics 1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(driver.require(Operation::OnuInfo).is_ok());
    }

    #[tokio::test]
    async fn test_escalate_runs_deferred_pager() {
        let mock = Builder::new()
            .read(b"V1600D>")
            .write(b"enable\n")
            .read(b"enable\r\nV1600D#")
            .write(b"terminal length 0\n")
            .read(b"terminal length 0\r\nV1600D#")
            .build();

        let driver = driver("vsol", "V1600G1");
        attach(&driver, mock).await;
        driver.escalate().await.unwrap();
        driver.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_batch_through_driver() {
        let mock = Builder::new()
            .read(b"OLT#")
            .write(b"show onu 1\n")
            .read(b"show onu 1\r\nonline\r\nOLT#")
            .write(b"show onu 2\n")
            .read(b"show onu 2\r\nbad command\r\nOLT#")
            .build();

        let driver = driver("cdata", "FD1616");
        attach(&driver, mock).await;

        let commands = vec![
            "show onu 1".to_string(),
            "show onu 2".to_string(),
            "show onu 3".to_string(),
        ];
        let result = driver
            .execute_batch(&commands, BatchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.succeeded(), 1);
        assert_eq!(result.failed(), 1);
        assert!(matches!(result.items[2].outcome, BatchOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_missing_ont_reported_as_not_found() {
        let mock = Builder::new()
            .read(b"MA5800#")
            .write(b"scroll\n")
            .read(b"scroll\r\nMA5800#")
            .write(b"display ont info 0/1/1 7\n")
            .read(b"display ont info 0/1/1 7\r\n  Failure: The ONT does not exist\r\n\r\nMA5800#")
            .write(b"display ont info 0/1/1 7\n")
            .read(b"display ont info 0/1/1 7\r\n  Failure: The ONT does not exist\r\n\r\nMA5800#")
            .write(b"display ont info 0/1/1 1\n")
            .read(b"display ont info 0/1/1 1\r\n  ONT-ID : 1\r\n  Run state : online\r\nMA5800#")
            .build();

        let driver = driver("huawei", "MA5800-X17");
        attach(&driver, mock).await;

        let err = driver.execute("display ont info 0/1/1 7").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = driver
            .lookup(Operation::OnuInfo, "ont", "0/1/1 7", "display ont info 0/1/1 7")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("ont '0/1/1 7' not found"));

        let resp = driver
            .lookup(Operation::OnuInfo, "ont", "0/1/1 1", "display ont info 0/1/1 1")
            .await
            .unwrap();
        assert_eq!(resp.field("run state"), Some("online"));
    }

    #[tokio::test]
    async fn test_concurrent_executes_are_serialized() {
        let (client, mut server) = duplex(4096);
        server.write_all(b"OLT#").await.unwrap();

        let device = tokio::spawn(async move {
            let mut seen = Vec::new();
            let mut line = Vec::new();
            let mut buf = [0u8; 256];
            loop {
                let n = match server.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                for &b in &buf[..n] {
                    seen.push(b);
                    if b != b'\n' {
                        line.push(b);
                        continue;
                    }
                    let command = String::from_utf8_lossy(&line).into_owned();
                    line.clear();
                    // a late reply gives an overlapping send time to show up
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let reply = format!("{command}\r\noutput of {command}\r\nOLT#");
                    if server.write_all(reply.as_bytes()).await.is_err() {
                        return seen;
                    }
                }
            }
            seen
        });

        let driver = driver("vsol", "V1600G1");
        let session = Session::from_stream(client, driver.config(), driver.tables().clone())
            .await
            .unwrap();
        driver.attach(session).await;

        let (a, b) = tokio::join!(driver.execute("show onu 1"), driver.execute("show onu 2"));
        assert_eq!(a.unwrap().result, "output of show onu 1");
        assert_eq!(b.unwrap().result, "output of show onu 2");

        driver.close().await.unwrap();
        let seen = device.await.unwrap();
        assert_eq!(seen, b"show onu 1\nshow onu 2\n");
    }

    #[test]
    fn test_not_found_classification() {
        let driver = driver("huawei", "MA5608T");
        let err = driver
            .check_not_found("ont", "0/1/1 7", "  Failure: The ONT does not exist")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("0/1/1 7"));

        assert!(driver
            .check_not_found("ont", "0/1/1 1", "  ONT-ID : 1")
            .is_ok());
    }

    #[test]
    fn test_identity() {
        let driver = driver("zte", "C320");
        assert_eq!(driver.vendor(), "zte");
        assert_eq!(driver.model(), "C320");
        assert_eq!(driver.capabilities().pon_ports, 8);
    }
}
