//! NFS Mamont Client - file data transfer over NFS version 3
//!
//! This library lets an application treat a file on an NFS version 3 server
//! (RFC 1813) as a readable, writable, seekable byte stream. NFS is stateless:
//! the server keeps no open-file state, so every operation is one
//! self-contained RPC call naming a file handle, an offset and a count. The
//! cursor lives on the client.
//!
//! ## Main Components
//!
//! - `session`: [`Session`] holds what every call of one mount shares: the
//!   transport, the credentials, the root handle and the transfer sizes
//!   negotiated with FSINFO. It resolves paths and produces file handles.
//!
//! - `file`: [`NfsFile`] is one remote file: a handle, a local cursor and the
//!   last attributes seen. It offers positioned `read`, chunked `write`,
//!   local `seek`, `commit` and `readlink`.
//!
//! - `limits`: [`TransferLimits`], the per-call read and write ceilings.
//!
//! - `mount`: obtains the root handle of an export from the MOUNT service.
//!
//! - `tcp`: [`TcpTransport`], the record-marked TCP transport.
//!
//! - `protocol`: XDR encoding and the RPC envelope shared by all calls.
//!
//! ## Standards Compliance
//!
//! - RFC 1813: NFS Version 3 Protocol Specification
//! - RFC 5531: RPC: Remote Procedure Call Protocol Specification Version 2
//! - RFC 4506: XDR: External Data Representation Standard
//!
//! ## Usage
//!
//! Mount an export with [`mount::mount`], build a [`Session`] over a
//! [`TcpTransport`] connected to the NFS service, then [`Session::open`] or
//! [`Session::open_file`] paths and use the returned [`NfsFile`].

pub mod error;
pub mod file;
pub mod limits;
pub mod mount;
pub mod protocol;
pub mod session;
pub mod tcp;

pub use error::{Error, Result, RpcError, WriteError};
pub use file::{NfsFile, ReadOutcome, Whence};
pub use limits::TransferLimits;
pub use protocol::rpc::{Credentials, Request, Transport};
pub use protocol::xdr;
pub use session::Session;
pub use tcp::TcpTransport;
