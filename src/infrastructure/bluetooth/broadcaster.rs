//! Client Fan-out Broadcaster
//!
//! Owns the live-client set. Every frame handed to [`Broadcaster::broadcast`]
//! is pushed onto each connected client's bounded FIFO queue; a dedicated
//! forwarding task per client drains its queue onto the interrupt socket.
//!
//! Overflow policy: a client whose queue is full when a frame arrives is
//! evicted. Its forwarding task observes the closed queue, tears down, and
//! closes the socket. Dropping frames for just that client would silently
//! desynchronize its host-visible input state instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One pre-encoded HID report, delimiter already stripped.
pub type Frame = Vec<u8>;

struct Inner {
    next_id: u64,
    clients: HashMap<u64, mpsc::Sender<Frame>>,
}

/// Fan-out hub shared between the ingestion listener and the interrupt
/// accept path. Cheap to clone.
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<Mutex<Inner>>,
    queue_depth: usize,
}

/// Receiving side of one client's queue.
///
/// Deregistration is tied to drop, so every exit path of a forwarding task
/// (peer reset, write error, overflow eviction) removes the client from the
/// live set exactly once.
pub struct ClientHandle {
    id: u64,
    rx: mpsc::Receiver<Frame>,
    inner: Arc<Mutex<Inner>>,
}

impl Broadcaster {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                next_id: 0,
                clients: HashMap::new(),
            })),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Register a newly accepted interrupt client and hand back its queue.
    pub fn register(&self) -> ClientHandle {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let mut inner = self.inner.lock().expect("client set lock poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.clients.insert(id, tx);
        debug!(client = id, total = inner.clients.len(), "client registered");
        ClientHandle {
            id,
            rx,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Push a copy of `frame` onto every live client's queue. Clients whose
    /// queue is full (or already gone) are evicted; nobody else is affected.
    pub fn broadcast(&self, frame: &[u8]) {
        let mut inner = self.inner.lock().expect("client set lock poisoned");
        let mut evicted = Vec::new();

        for (&id, tx) in &inner.clients {
            match tx.try_send(frame.to_vec()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(client = id, "client queue full, disconnecting slow client");
                    evicted.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    evicted.push(id);
                }
            }
        }

        for id in evicted {
            inner.clients.remove(&id);
        }
    }

    /// Number of currently connected interrupt clients.
    pub fn client_count(&self) -> usize {
        self.inner
            .lock()
            .expect("client set lock poisoned")
            .clients
            .len()
    }
}

impl ClientHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next frame in FIFO order; `None` once the client has been evicted
    /// and the queue drained.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().expect("client set lock poisoned");
        if inner.clients.remove(&self.id).is_some() {
            debug!(
                client = self.id,
                total = inner.clients.len(),
                "client deregistered"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_all_clients_receive_all_frames_in_order() {
        let broadcaster = Broadcaster::new(16);
        let mut a = broadcaster.register();
        let mut b = broadcaster.register();

        let frames: Vec<Frame> = (0u8..5).map(|i| vec![0xA1, 0x01, i]).collect();
        for frame in &frames {
            broadcaster.broadcast(frame);
        }

        for client in [&mut a, &mut b] {
            for expected in &frames {
                assert_eq!(client.recv().await.as_ref(), Some(expected));
            }
        }
    }

    #[tokio::test]
    async fn test_disconnect_does_not_affect_remaining_clients() {
        let broadcaster = Broadcaster::new(16);
        let a = broadcaster.register();
        let mut b = broadcaster.register();

        broadcaster.broadcast(&[1]);
        drop(a);
        assert_eq!(broadcaster.client_count(), 1);

        broadcaster.broadcast(&[2]);
        assert_eq!(b.recv().await, Some(vec![1]));
        assert_eq!(b.recv().await, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_slow_client_is_evicted_on_overflow() {
        let broadcaster = Broadcaster::new(1);
        let mut slow = broadcaster.register();
        let mut healthy = broadcaster.register();

        broadcaster.broadcast(&[1]);
        assert_eq!(healthy.recv().await, Some(vec![1]));

        // Slow client never drained; the second frame overflows its queue.
        broadcaster.broadcast(&[2]);

        assert_eq!(broadcaster.client_count(), 1);
        assert_eq!(slow.recv().await, Some(vec![1]));
        assert_eq!(slow.recv().await, None);
        assert_eq!(healthy.recv().await, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_drop_deregisters_exactly_once() {
        let broadcaster = Broadcaster::new(4);
        let a = broadcaster.register();
        let b = broadcaster.register();
        assert_eq!(broadcaster.client_count(), 2);
        drop(a);
        drop(b);
        assert_eq!(broadcaster.client_count(), 0);
    }
}
