//! A connected device session: SSH transport plus expect engine.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::channel::{ExpectEngine, VendorTables};
use crate::error::{Error, Result};
use crate::transport::{SessionConfig, SshTransport};

/// Any bidirectional byte stream an engine can drive.
pub trait ShellStream: AsyncRead + AsyncWrite + Send {}

impl<T: AsyncRead + AsyncWrite + Send + ?Sized> ShellStream for T {}

/// Type-erased shell stream.
pub type BoxedShell = Pin<Box<dyn ShellStream>>;

/// The connection a shell runs over, released after the shell itself.
#[async_trait]
pub(crate) trait Disconnect: Send {
    async fn disconnect(self: Box<Self>) -> Result<()>;
}

#[async_trait]
impl Disconnect for SshTransport {
    async fn disconnect(self: Box<Self>) -> Result<()> {
        (*self).close().await
    }
}

/// One open shell on one device.
///
/// The transport is optional so a session can also wrap a stream that was
/// opened some other way (a jump host, a serial console server, a test pipe).
pub struct Session {
    transport: Option<Box<dyn Disconnect>>,
    engine: ExpectEngine<BoxedShell>,
}

impl Session {
    /// Dial, authenticate, open a PTY shell and run the engine's open
    /// sequence. Anything opened along the way is released on failure.
    pub async fn connect(config: &SessionConfig, tables: Arc<VendorTables>) -> Result<Self> {
        let transport = SshTransport::connect(config.clone()).await?;

        let stream = match transport.open_shell().await {
            Ok(stream) => stream,
            Err(e) => {
                if let Err(close_err) = transport.close().await {
                    debug!("{}: close after failed shell open: {}", config.host, close_err);
                }
                return Err(e);
            }
        };

        let mut session = Self {
            transport: Some(Box::new(transport)),
            engine: ExpectEngine::new(Box::pin(stream) as BoxedShell, config, tables),
        };

        if let Err(e) = session.engine.open().await {
            if let Err(close_err) = session.close().await {
                debug!("{}: close after failed open: {}", config.host, close_err);
            }
            return Err(e);
        }

        Ok(session)
    }

    /// Open a session over an already established stream.
    pub async fn from_stream<S>(
        stream: S,
        config: &SessionConfig,
        tables: Arc<VendorTables>,
    ) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let mut engine = ExpectEngine::new(Box::pin(stream) as BoxedShell, config, tables);
        engine.open().await?;
        Ok(Self {
            transport: None,
            engine,
        })
    }

    pub fn engine(&self) -> &ExpectEngine<BoxedShell> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ExpectEngine<BoxedShell> {
        &mut self.engine
    }

    /// Close the shell and then the transport.
    ///
    /// Both are always attempted. A single failure is returned as is; two
    /// failures come back together as [`Error::Close`].
    pub async fn close(mut self) -> Result<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.engine.close().await {
            warn!("shell close failed: {}", e);
            errors.push(e);
        }

        if let Some(transport) = self.transport.take()
            && let Err(e) = transport.disconnect().await
        {
            warn!("transport close failed: {}", e);
            errors.push(e);
        }

        collect_close_errors(errors)
    }
}

/// No error is success, one is returned as is, more become [`Error::Close`].
fn collect_close_errors(mut errors: Vec<Error>) -> Result<()> {
    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(Error::Close(errors)),
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};
    use std::time::Duration;

    use tokio::io::ReadBuf;
    use tokio_test::io::{Builder, Mock};

    use super::*;
    use crate::channel::ShellState;
    use crate::error::{ChannelError, ErrorKind, TransportError};

    fn config() -> SessionConfig {
        SessionConfig::builder("olt-test")
            .username("admin")
            .secret("secret")
            .vendor("zte")
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    fn zte_shell() -> Mock {
        Builder::new()
            .read(b"ZXAN#")
            .write(b"terminal length 0\n")
            .read(b"terminal length 0\r\nZXAN#")
            .build()
    }

    /// Shell stream whose shutdown always fails.
    struct BrokenShutdown(Mock);

    impl AsyncRead for BrokenShutdown {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Pin::new(&mut self.0).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for BrokenShutdown {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Pin::new(&mut self.0).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Pin::new(&mut self.0).poll_flush(cx)
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }
    }

    struct FakeTransport {
        closed: Arc<AtomicBool>,
        fail: bool,
    }

    #[async_trait]
    impl Disconnect for FakeTransport {
        async fn disconnect(self: Box<Self>) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            if self.fail {
                return Err(TransportError::Disconnected.into());
            }
            Ok(())
        }
    }

    async fn session<S>(stream: S, transport_fails: bool) -> (Session, Arc<AtomicBool>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let closed = Arc::new(AtomicBool::new(false));
        let mut session = Session::from_stream(stream, &config(), Arc::new(VendorTables::builtin()))
            .await
            .unwrap();
        session.transport = Some(Box::new(FakeTransport {
            closed: closed.clone(),
            fail: transport_fails,
        }));
        (session, closed)
    }

    #[tokio::test]
    async fn test_from_stream_opens_engine() {
        let (session, closed) = session(zte_shell(), false).await;
        assert_eq!(session.engine().state(), ShellState::Ready);
        session.close().await.unwrap();
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_transport_closed_when_shell_close_fails() {
        let (session, closed) = session(BrokenShutdown(zte_shell()), false).await;

        let err = session.close().await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Io(_))));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_transport_failure_alone_is_returned_as_is() {
        let (session, closed) = session(zte_shell(), true).await;

        let err = session.close().await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Disconnected)));
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_both_close_failures_aggregated() {
        let (session, closed) = session(BrokenShutdown(zte_shell()), true).await;

        let err = session.close().await.unwrap_err();
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(err.kind(), ErrorKind::Other);
        match err {
            Error::Close(errors) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].kind(), ErrorKind::Connection);
                assert!(matches!(errors[1], Error::Transport(TransportError::Disconnected)));
            }
            other => panic!("expected aggregated close error, got {other}"),
        }
    }

    #[test]
    fn test_collect_close_errors() {
        assert!(collect_close_errors(Vec::new()).is_ok());

        let one = collect_close_errors(vec![TransportError::Disconnected.into()]).unwrap_err();
        assert!(matches!(one, Error::Transport(_)));
    }
}
