//! Errors returned by every client operation.

use thiserror::Error;

use crate::protocol::xdr::mount::mountstat3;
use crate::protocol::xdr::nfs3::nfsstat3;
use crate::protocol::xdr::rpc::auth_stat;

/// Failure of a single client operation.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection failed, timed out or was closed.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// The RPC layer refused or could not run the call.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    /// The server ran the call and answered with an error status.
    #[error("nfs error: {0:?}")]
    Status(nfsstat3),

    /// The MOUNT service refused the export.
    #[error("mount error: {0:?}")]
    Mount(mountstat3),

    /// A local argument was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The reply could not be decoded.
    #[error("malformed reply: {0}")]
    Decode(#[source] std::io::Error),

    /// The reply decoded but is inconsistent with the request.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl Error {
    /// True when the server reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status(nfsstat3::NFS3ERR_NOENT))
    }

    /// The NFS status carried by this error, if any.
    pub fn status(&self) -> Option<nfsstat3> {
        match self {
            Error::Status(stat) => Some(*stat),
            _ => None,
        }
    }
}

/// Reasons the RPC layer did not produce procedure results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("program unavailable")]
    ProgUnavail,
    #[error("program version mismatch (server supports {low}..={high})")]
    ProgMismatch { low: u32, high: u32 },
    #[error("procedure unavailable")]
    ProcUnavail,
    #[error("server could not decode arguments")]
    GarbageArgs,
    #[error("server system error")]
    SystemErr,
    #[error("rpc version mismatch (server supports {low}..={high})")]
    RpcMismatch { low: u32, high: u32 },
    #[error("authentication failed: {0:?}")]
    Auth(auth_stat),
    #[error("reply xid {got} does not match call xid {expected}")]
    XidMismatch { expected: u32, got: u32 },
    #[error("expected a reply, received a call")]
    NotAReply,
}

/// A write that stopped early.
///
/// `written` bytes, counted from the start of the caller's buffer, were
/// accepted by the server before `source` occurred. Re-issuing the write
/// with `&buf[written..]` resumes where it stopped.
#[derive(Debug, Error)]
#[error("write stopped after {written} bytes: {source}")]
pub struct WriteError {
    pub written: usize,
    #[source]
    pub source: Error,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
