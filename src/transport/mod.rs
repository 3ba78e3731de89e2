//! # Transport Module
//!
//! Handles the TCP link to the CameraVision command port.
//!
//! This module handles:
//! - Resolving and connecting to the command port with a timeout
//! - Writing each tick's tokens as a single flushed write
//! - Closing the link on shutdown
//!
//! The link is write-only; the command port never answers.

pub mod sink;

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use sink::{CommandSink, StreamSink};

/// Default CameraVision host
pub const DEFAULT_HOST: &str = "localhost";

/// Default CameraVision command port
pub const DEFAULT_PORT: u16 = 2222;

/// Link to the CameraVision command port
pub struct CameraLink<S = StreamSink<TcpStream>> {
    sink: S,
    peer: String,
    bytes_sent: u64,
}

impl<S> std::fmt::Debug for CameraLink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraLink")
            .field("peer", &self.peer)
            .field("bytes_sent", &self.bytes_sent)
            .finish_non_exhaustive()
    }
}

impl CameraLink {
    /// Connect to the command port
    ///
    /// # Arguments
    ///
    /// * `host` - Host name or address running CameraVision
    /// * `port` - Command port
    /// * `timeout` - Upper bound on resolution plus connection time
    ///
    /// # Errors
    ///
    /// Returns `Connect` if the host cannot be resolved, refuses the
    /// connection, or does not answer within `timeout`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use camvision_bridge::transport::CameraLink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let mut link = CameraLink::connect("localhost", 2222, Duration::from_secs(5)).await?;
    ///     link.send(b"c").await?;
    ///     link.close().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let addr = format!("{}:{}", host, port);
        debug!("Connecting to CameraVision at {}", addr);

        let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(BridgeError::Connect { addr, source }),
            Err(_) => {
                return Err(BridgeError::Connect {
                    addr,
                    source: std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("no answer within {} ms", timeout.as_millis()),
                    ),
                })
            }
        };

        // Tokens are a few bytes each; do not let Nagle hold them back
        stream.set_nodelay(true)?;

        info!("Connected to CameraVision at {}", addr);
        Ok(Self::from_sink(StreamSink::new(stream), addr))
    }
}

impl<S: CommandSink> CameraLink<S> {
    /// Wrap an already open sink
    pub fn from_sink(sink: S, peer: impl Into<String>) -> Self {
        Self {
            sink,
            peer: peer.into(),
            bytes_sent: 0,
        }
    }

    /// Send one tick's worth of tokens
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the write or flush fails.
    pub async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink
            .write_all(bytes)
            .await
            .map_err(|e| BridgeError::Transport(format!("Failed to write to {}: {}", self.peer, e)))?;

        self.sink
            .flush()
            .await
            .map_err(|e| BridgeError::Transport(format!("Failed to flush {}: {}", self.peer, e)))?;

        self.bytes_sent += bytes.len() as u64;
        debug!("Sent {:?} to {}", String::from_utf8_lossy(bytes), self.peer);
        Ok(())
    }

    /// Close the link
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the shutdown handshake fails.
    pub async fn close(&mut self) -> Result<()> {
        self.sink
            .shutdown()
            .await
            .map_err(|e| BridgeError::Transport(format!("Failed to close {}: {}", self.peer, e)))?;
        info!("Closed link to {} ({} bytes sent)", self.peer, self.bytes_sent);
        Ok(())
    }

    /// Address this link was opened to
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Total bytes written since the link was opened
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}
