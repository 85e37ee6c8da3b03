//! Per-call transfer ceilings negotiated with the server.

use tracing::debug;

use crate::protocol::xdr::nfs3::fs::fsinfo3;

/// Chunk size used when the server advertises neither a preferred nor a
/// maximum size.
pub const DEFAULT_TRANSFER_SIZE: u32 = 8192;

/// Read and write sizes for one session.
///
/// Every READ asks for at most `read` bytes and every WRITE carries at most
/// `write` bytes. Obtained once per session and shared read-only by all its
/// files.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransferLimits {
    read: u32,
    write: u32,
}

impl TransferLimits {
    /// Fixed limits. A zero size is replaced by [`DEFAULT_TRANSFER_SIZE`].
    pub fn new(read: u32, write: u32) -> Self {
        TransferLimits { read: nonzero(read), write: nonzero(write) }
    }

    /// Limits derived from the FSINFO reply of the export root.
    pub fn from_fsinfo(info: &fsinfo3) -> Self {
        let limits = TransferLimits {
            read: pick(info.rtpref, info.rtmax),
            write: pick(info.wtpref, info.wtmax),
        };
        debug!(
            "transfer limits read:{} (pref {}, max {}) write:{} (pref {}, max {})",
            limits.read, info.rtpref, info.rtmax, limits.write, info.wtpref, info.wtmax
        );
        limits
    }

    /// Preferred READ size.
    pub fn read_size(&self) -> u32 {
        self.read
    }

    /// Preferred WRITE size.
    pub fn write_size(&self) -> u32 {
        self.write
    }

    /// Bytes to request for a caller buffer of `wanted` bytes.
    pub fn read_chunk(&self, wanted: usize) -> usize {
        wanted.min(self.read as usize)
    }

    /// Bytes to send next when `remaining` are left to write.
    pub fn write_chunk(&self, remaining: usize) -> usize {
        remaining.min(self.write as usize)
    }
}

impl Default for TransferLimits {
    fn default() -> Self {
        TransferLimits::new(DEFAULT_TRANSFER_SIZE, DEFAULT_TRANSFER_SIZE)
    }
}

fn nonzero(size: u32) -> u32 {
    if size == 0 {
        DEFAULT_TRANSFER_SIZE
    } else {
        size
    }
}

/// The preferred size, never above the maximum when one is advertised.
fn pick(pref: u32, max: u32) -> u32 {
    match (pref, max) {
        (0, 0) => DEFAULT_TRANSFER_SIZE,
        (0, max) => max,
        (pref, 0) => pref,
        (pref, max) => pref.min(max),
    }
}
