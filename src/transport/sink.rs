//! Trait abstraction for the outbound command stream to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Trait for outbound command stream operations
#[async_trait]
pub trait CommandSink: Send {
    /// Write all data to the stream
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush buffered data
    async fn flush(&mut self) -> io::Result<()>;

    /// Close the write half of the stream
    async fn shutdown(&mut self) -> io::Result<()>;
}

/// Wrapper around any tokio writer (a `TcpStream` in production)
#[derive(Debug)]
pub struct StreamSink<W> {
    writer: W,
}

impl<W> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

#[async_trait]
impl<W> CommandSink for StreamSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}
