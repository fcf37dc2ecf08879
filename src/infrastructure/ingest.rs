//! Local Ingestion Listener
//!
//! Loopback TCP listener the report producers connect to. Each producer
//! sends a stream of newline-delimited binary frames, one pre-encoded HID
//! report per frame; the delimiter is stripped and every complete frame is
//! handed to the broadcaster. Producer failures never reach the Bluetooth
//! side: a dead producer closes only its own reader.

use crate::infrastructure::bluetooth::broadcaster::Broadcaster;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

pub struct IngestListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl IngestListener {
    pub async fn bind(host: &str, port: u16) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("binding ingestion listener on {host}:{port}"))?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "ingestion listener ready");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Actual bound address; useful when the configured port is 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept producer connections forever, reading frames from each in an
    /// independent task.
    pub async fn run(self, broadcaster: Broadcaster) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    debug!(%peer, "producer connected");
                    tokio::spawn(read_frames(stream, peer, broadcaster.clone()));
                }
                Err(err) => {
                    debug!(%err, "producer accept failed");
                }
            }
        }
    }
}

/// Read newline-delimited frames from one producer until it disconnects.
/// Empty frames (bare delimiter) are skipped; a trailing unterminated frame
/// at EOF is still delivered.
async fn read_frames(stream: TcpStream, peer: SocketAddr, broadcaster: Broadcaster) {
    let mut reader = BufReader::new(stream);
    let mut frame = Vec::new();

    loop {
        frame.clear();
        match reader.read_until(b'\n', &mut frame).await {
            Ok(0) => break,
            Ok(_) => {
                if frame.last() == Some(&b'\n') {
                    frame.pop();
                }
                if !frame.is_empty() {
                    broadcaster.broadcast(&frame);
                }
            }
            Err(err) => {
                debug!(%peer, %err, "producer read error");
                break;
            }
        }
    }

    debug!(%peer, "producer disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    async fn start_listener(broadcaster: &Broadcaster) -> SocketAddr {
        let listener = IngestListener::bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr();
        tokio::spawn(listener.run(broadcaster.clone()));
        addr
    }

    #[tokio::test]
    async fn test_frames_are_broadcast_with_delimiter_stripped() {
        let broadcaster = Broadcaster::new(16);
        let addr = start_listener(&broadcaster).await;
        let mut a = broadcaster.register();
        let mut b = broadcaster.register();

        let mut producer = TcpStream::connect(addr).await.unwrap();
        producer
            .write_all(b"\xA1\x01\x00\x00\x1E\x00\x00\x00\x00\x00\n")
            .await
            .unwrap();
        producer
            .write_all(b"\xA1\x01\x00\x00\x00\x00\x00\x00\x00\x00\n")
            .await
            .unwrap();
        producer.flush().await.unwrap();

        let press = b"\xA1\x01\x00\x00\x1E\x00\x00\x00\x00\x00".to_vec();
        let release = b"\xA1\x01\x00\x00\x00\x00\x00\x00\x00\x00".to_vec();
        for client in [&mut a, &mut b] {
            assert_eq!(client.recv().await, Some(press.clone()));
            assert_eq!(client.recv().await, Some(release.clone()));
        }
    }

    #[tokio::test]
    async fn test_producer_disconnect_does_not_stop_the_listener() {
        let broadcaster = Broadcaster::new(16);
        let addr = start_listener(&broadcaster).await;
        let mut client = broadcaster.register();

        // First producer drops without sending a complete frame.
        let first = TcpStream::connect(addr).await.unwrap();
        drop(first);

        let mut second = TcpStream::connect(addr).await.unwrap();
        second.write_all(b"\x01\x02\n").await.unwrap();
        second.flush().await.unwrap();

        assert_eq!(client.recv().await, Some(vec![0x01, 0x02]));
        assert_eq!(broadcaster.client_count(), 1);
    }

    #[tokio::test]
    async fn test_multiple_concurrent_producers() {
        let broadcaster = Broadcaster::new(16);
        let addr = start_listener(&broadcaster).await;
        let mut client = broadcaster.register();

        let mut p1 = TcpStream::connect(addr).await.unwrap();
        let mut p2 = TcpStream::connect(addr).await.unwrap();
        p1.write_all(b"\xAA\n").await.unwrap();
        p1.flush().await.unwrap();
        assert_eq!(client.recv().await, Some(vec![0xAA]));

        p2.write_all(b"\xBB\n").await.unwrap();
        p2.flush().await.unwrap();
        assert_eq!(client.recv().await, Some(vec![0xBB]));
    }

    #[tokio::test]
    async fn test_empty_frames_are_skipped() {
        let broadcaster = Broadcaster::new(16);
        let addr = start_listener(&broadcaster).await;
        let mut client = broadcaster.register();

        let mut producer = TcpStream::connect(addr).await.unwrap();
        producer.write_all(b"\n\n\x42\n").await.unwrap();
        producer.flush().await.unwrap();

        assert_eq!(client.recv().await, Some(vec![0x42]));
    }
}
