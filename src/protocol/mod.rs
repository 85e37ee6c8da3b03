//! Wire protocols spoken by the client.
//!
//! - `xdr`: External Data Representation (RFC 4506) and the message types of
//!   ONC RPC, NFS version 3 and MOUNT version 3 built on it.
//!
//! - `rpc`: the client side of ONC RPC version 2 (RFC 5531): call envelopes,
//!   credentials, the transport seam, reply validation and record marking.

pub mod rpc;
pub mod xdr;
