//! Bluetooth Connection Acceptor
//!
//! One accept loop per HID channel, both on L2CAP sequential-packet sockets
//! bound to the local adapter. The control channel (PSM 0x0011) is mandated
//! by the HID profile but carries nothing we act on; connections are kept
//! open and drained. The interrupt channel (PSM 0x0013) carries the actual
//! report traffic and hands each connection to the fan-out broadcaster.

use crate::infrastructure::bluetooth::broadcaster::Broadcaster;
use anyhow::{Context, Result};
use bluer::l2cap::{SeqPacket, SeqPacketListener, Socket, SocketAddr};
use bluer::{Address, AddressType};
use tracing::{debug, info};

/// HID control channel PSM, fixed by the Bluetooth HID specification.
pub const PSM_HID_CONTROL: u16 = 0x0011;

/// HID interrupt channel PSM, fixed by the Bluetooth HID specification.
pub const PSM_HID_INTERRUPT: u16 = 0x0013;

/// Receive buffer for the control drain loop. Control payloads are tiny
/// HIDP transactions; anything larger is discarded just the same.
const CONTROL_RECV_BUF: usize = 1024;

pub struct L2capAcceptor {
    listener: SeqPacketListener,
    psm: u16,
}

impl L2capAcceptor {
    /// Bind a sequential-packet socket on the adapter at the given PSM and
    /// start listening. Fails fatally on bind errors (wrong privilege, PSM
    /// already claimed, adapter gone).
    pub fn bind(address: Address, psm: u16, backlog: u32) -> Result<Self> {
        let socket = Socket::<SeqPacket>::new_seq_packet()
            .with_context(|| format!("creating L2CAP socket for PSM {psm:#06x}"))?;
        let addr = SocketAddr::new(address, AddressType::BrEdr, psm);
        socket
            .bind(addr)
            .with_context(|| format!("binding L2CAP PSM {psm:#06x} on {address}"))?;
        let listener = socket
            .listen(backlog)
            .with_context(|| format!("listening on L2CAP PSM {psm:#06x}"))?;
        info!(psm, %address, "listening on L2CAP PSM");
        Ok(Self { listener, psm })
    }

    /// Accept control-channel connections forever. Each connection gets an
    /// independent drain task; the loop never waits on a connection.
    pub async fn run_control(self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((conn, peer)) => {
                    info!(peer = %peer.addr, "control channel connected");
                    tokio::spawn(drain_control(conn, peer));
                }
                Err(err) => {
                    debug!(psm = self.psm, %err, "control accept failed");
                }
            }
        }
    }

    /// Accept interrupt-channel connections forever, registering each with
    /// the broadcaster and forwarding its queue onto the socket.
    pub async fn run_interrupt(self, broadcaster: Broadcaster) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((conn, peer)) => {
                    info!(peer = %peer.addr, "interrupt channel connected");
                    tokio::spawn(forward_reports(conn, peer, broadcaster.clone()));
                }
                Err(err) => {
                    debug!(psm = self.psm, %err, "interrupt accept failed");
                }
            }
        }
    }
}

/// Read and discard control traffic until the peer closes the channel.
/// The socket is released when the task returns.
async fn drain_control(conn: SeqPacket, peer: SocketAddr) {
    let mut buf = vec![0u8; CONTROL_RECV_BUF];
    loop {
        match conn.recv(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                debug!(peer = %peer.addr, %err, "control channel read error");
                break;
            }
        }
    }
    info!(peer = %peer.addr, "control channel closed");
}

/// Per-client forwarding task: drain the client's queue onto its interrupt
/// socket until the peer resets, a write fails, or the broadcaster evicts
/// it. Dropping the handle deregisters the client on every exit path.
async fn forward_reports(conn: SeqPacket, peer: SocketAddr, broadcaster: Broadcaster) {
    let mut client = broadcaster.register();
    debug!(client = client.id(), peer = %peer.addr, "forwarding task started");

    while let Some(frame) = client.recv().await {
        if let Err(err) = conn.send(&frame).await {
            debug!(client = client.id(), peer = %peer.addr, %err, "interrupt write failed");
            break;
        }
    }

    info!(client = client.id(), peer = %peer.addr, "interrupt channel closed");
}
