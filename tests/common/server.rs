//! A one-connection IRC server speaking raw lines.

use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};

pub struct FakeIrcServer {
    listener: TcpListener,
}

/// The server side of an accepted client.
pub struct ServerSide {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

#[allow(dead_code)]
impl FakeIrcServer {
    pub async fn bind() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn accept(&self) -> Result<ServerSide> {
        let (stream, _) = tokio::time::timeout(Duration::from_secs(5), self.listener.accept())
            .await
            .context("timed out waiting for client")??;
        Ok(ServerSide::new(stream))
    }
}

#[allow(dead_code)]
impl ServerSide {
    fn new(stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();
        Self {
            reader: BufReader::new(read),
            writer: write,
        }
    }

    /// Next line from the client, without the line ending.
    pub async fn recv(&mut self) -> Result<String> {
        let mut line = String::new();
        let n = tokio::time::timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .context("timed out waiting for line")??;
        if n == 0 {
            return Err(anyhow!("client closed the connection"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Skip lines until one starts with `prefix`.
    pub async fn recv_until(&mut self, prefix: &str) -> Result<String> {
        loop {
            let line = self.recv().await?;
            if line.starts_with(prefix) {
                return Ok(line);
            }
        }
    }

    pub async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}
