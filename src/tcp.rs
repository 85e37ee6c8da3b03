//! RPC transport over a single TCP connection.
//!
//! Calls are serialized on the connection: one call is written, then
//! records are read until the reply carrying its xid arrives. Run several
//! transports to get calls in flight in parallel.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::rpc::{self, wire, Request, Transport};

/// [`Transport`] speaking record-marked RPC over TCP.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Mutex<TcpStream>,
    next_xid: AtomicU32,
    /// Set once an exchange failed or was abandoned halfway; the stream is
    /// no longer known to be at a record boundary.
    broken: AtomicBool,
    timeout: Option<Duration>,
    peer: String,
}

impl TcpTransport {
    /// Connects to an RPC service such as `nfsd` (usually port 2049) or
    /// `mountd`.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let socket = TcpStream::connect(addr).await.map_err(Error::Transport)?;
        let _ = socket.set_nodelay(true);
        let peer = socket
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!("connected to {}", peer);
        Ok(TcpTransport {
            stream: Mutex::new(socket),
            next_xid: AtomicU32::new(initial_xid()),
            broken: AtomicBool::new(false),
            timeout: None,
            peer,
        })
    }

    /// Fails calls that get no reply within `timeout`.
    ///
    /// A timed out or failed call leaves the connection unusable; later calls
    /// fail immediately with [`io::ErrorKind::NotConnected`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    async fn exchange(stream: &mut TcpStream, xid: u32, msg: &[u8]) -> io::Result<Vec<u8>> {
        wire::write_record(stream, msg).await?;
        loop {
            let record = wire::read_record(stream).await?;
            match record.get(..4) {
                Some(head) if u32::from_be_bytes([head[0], head[1], head[2], head[3]]) == xid => {
                    return Ok(record);
                }
                Some(head) => {
                    let got = u32::from_be_bytes([head[0], head[1], head[2], head[3]]);
                    debug!("dropping reply for xid {} while waiting for {}", got, xid);
                }
                None => {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, "RPC record too short"))
                }
            }
        }
    }
}

/// Marks the connection broken when dropped while armed, so an exchange
/// whose future is dropped midway still poisons the stream.
struct PoisonOnDrop<'a> {
    broken: &'a AtomicBool,
    armed: bool,
}

impl Drop for PoisonOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.broken.store(true, Ordering::Release);
        }
    }
}

/// Xids are seeded from the clock so a reconnecting client does not reuse
/// the xids of its previous connection, which a server's duplicate request
/// cache would treat as retransmissions.
fn initial_xid() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(1)
}

#[async_trait]
impl Transport for TcpTransport {
    async fn call(&self, request: Request) -> Result<Vec<u8>> {
        let xid = self.next_xid.fetch_add(1, Ordering::Relaxed);
        let msg = request.encode(xid)?;

        let mut stream = self.stream.lock().await;
        if self.broken.load(Ordering::Acquire) {
            return Err(Error::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection abandoned after a failed call",
            )));
        }

        let mut poison = PoisonOnDrop { broken: &self.broken, armed: true };
        let reply = match self.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, Self::exchange(&mut stream, xid, &msg)).await {
                    Ok(res) => res,
                    Err(_) => {
                        warn!("call {} to {} timed out after {:?}", xid, self.peer, limit);
                        Err(io::Error::new(io::ErrorKind::TimedOut, "RPC call timed out"))
                    }
                }
            }
            None => Self::exchange(&mut stream, xid, &msg).await,
        }
        .map_err(Error::Transport)?;
        poison.armed = false;
        drop(stream);

        rpc::decode_reply(xid, &reply)
    }
}
