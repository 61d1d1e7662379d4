// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Connection building for the two transport variants: a filesystem-path
//! socket, or TCP optionally under (mutual) TLS. Both produce the same
//! channel type; every exchange gets its own freshly connected channel.

use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls_pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::{TcpStream, UnixStream};
use tokio::time::Sleep;
use tokio_rustls::TlsConnector;

use vessel_config::conn::{ConnectionConfig, UNIX_PLACEHOLDER_AUTHORITY};
use vessel_config::errors::ConfigError;

use crate::errors::ClientError;

/// A connected, ready-to-use byte channel.
pub trait Channel: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Channel for T {}

/// Effective timeouts for one exchange, resolved from the connection
/// configuration's defaults.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
    pub call: Duration,
}

impl Timeouts {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            connect: config.connect_timeout(),
            read: config.read_timeout(),
            write: config.write_timeout(),
            call: config.call_timeout(),
        }
    }
}

/// The two connection variants behind one connect contract.
pub enum Transport {
    /// Filesystem-path socket. The requested authority is ignored; no DNS
    /// resolution is ever attempted for the path.
    Local { path: PathBuf },
    /// TCP, optionally under TLS.
    Remote {
        host: String,
        port: u16,
        tls: Option<Arc<rustls::ClientConfig>>,
        server_name: ServerName<'static>,
    },
}

impl Transport {
    /// Builds a transport from the connection descriptor, loading TLS
    /// material eagerly so configuration errors surface before any
    /// invocation.
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, ClientError> {
        let uri = config.parse_endpoint_uri()?;

        match uri.scheme_str() {
            Some("unix") => Ok(Transport::Local {
                path: PathBuf::from(uri.path()),
            }),
            Some(scheme @ ("http" | "https")) => {
                let authority = uri.authority().ok_or(ConfigError::MissingAuthority)?;
                let host = authority
                    .host()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .to_string();
                let port = uri
                    .port_u16()
                    .unwrap_or(if scheme == "https" { 443 } else { 80 });

                let tls = if scheme == "https" {
                    Some(Arc::new(config.tls_setting.load_rustls_config()?))
                } else {
                    None
                };

                let server_name = ServerName::try_from(host.clone())
                    .map_err(|_| ConfigError::InvalidServerName(host.clone()))?;

                Ok(Transport::Remote {
                    host,
                    port,
                    tls,
                    server_name,
                })
            }
            other => Err(ClientError::Config(ConfigError::InvalidEndpointScheme(
                other.unwrap_or("<none>").to_string(),
            ))),
        }
    }

    /// Authority placed in the Host header. Meaningless (and unresolved)
    /// for the local variant.
    pub fn authority(&self) -> String {
        match self {
            Transport::Local { .. } => UNIX_PLACEHOLDER_AUTHORITY.to_string(),
            Transport::Remote { host, port, .. } => format!("{}:{}", host, port),
        }
    }

    /// Opens a fresh channel for one exchange. Connect (and TLS handshake)
    /// failures are surfaced verbatim as the underlying I/O errors.
    pub async fn connect(&self, timeouts: &Timeouts) -> Result<Box<dyn Channel>, io::Error> {
        match self {
            Transport::Local { path } => {
                tracing::debug!(path = %path.display(), "connecting to unix socket");
                let stream = within(timeouts.connect, UnixStream::connect(path)).await?;
                Ok(Box::new(TimedStream::new(stream, timeouts)))
            }
            Transport::Remote {
                host,
                port,
                tls,
                server_name,
            } => {
                tracing::debug!(%host, %port, tls = tls.is_some(), "connecting over tcp");
                let stream =
                    within(timeouts.connect, TcpStream::connect((host.as_str(), *port))).await?;
                match tls {
                    Some(tls_config) => {
                        let connector = TlsConnector::from(tls_config.clone());
                        let stream = within(
                            timeouts.connect,
                            connector.connect(server_name.clone(), stream),
                        )
                        .await?;
                        Ok(Box::new(TimedStream::new(stream, timeouts)))
                    }
                    None => Ok(Box::new(TimedStream::new(stream, timeouts))),
                }
            }
        }
    }
}

async fn within<T>(
    limit: Duration,
    fut: impl std::future::Future<Output = io::Result<T>>,
) -> io::Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connect timed out after {:?}", limit),
        )),
    }
}

/// AsyncRead/AsyncWrite adapter enforcing inactivity timeouts. A deadline is
/// armed when a poll returns pending and cleared on progress, so it bounds
/// the gap between reads (or writes), not the exchange as a whole.
pub struct TimedStream<S> {
    inner: S,
    read_timeout: Duration,
    write_timeout: Duration,
    read_deadline: Option<Pin<Box<Sleep>>>,
    write_deadline: Option<Pin<Box<Sleep>>>,
}

impl<S> TimedStream<S> {
    pub fn new(inner: S, timeouts: &Timeouts) -> Self {
        Self {
            inner,
            read_timeout: timeouts.read,
            write_timeout: timeouts.write,
            read_deadline: None,
            write_deadline: None,
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for TimedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.read_deadline = None;
                Poll::Ready(result)
            }
            Poll::Pending => {
                let timeout = this.read_timeout;
                let deadline = this
                    .read_deadline
                    .get_or_insert_with(|| Box::pin(tokio::time::sleep(timeout)));
                match deadline.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        this.read_deadline = None;
                        Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("read timed out after {:?}", timeout),
                        )))
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for TimedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(result) => {
                this.write_deadline = None;
                Poll::Ready(result)
            }
            Poll::Pending => {
                let timeout = this.write_timeout;
                let deadline = this
                    .write_deadline
                    .get_or_insert_with(|| Box::pin(tokio::time::sleep(timeout)));
                match deadline.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        this.write_deadline = None;
                        Poll::Ready(Err(io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("write timed out after {:?}", timeout),
                        )))
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
