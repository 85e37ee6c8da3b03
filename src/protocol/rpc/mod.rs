//! Client side of ONC RPC version 2 (RFC 5531).
//!
//! Every NFS operation is one self-contained call. This module owns the
//! pieces all of them share:
//!
//! 1. The call envelope: fixed RPC version, program, program version,
//!    procedure, the session credentials and a null verifier
//!    ([`call_header`], [`Request`]).
//! 2. Credentials attached to every call ([`Credentials`]).
//! 3. The [`Transport`] seam through which encoded calls travel. The crate
//!    ships a TCP implementation in [`crate::tcp`]; tests substitute their own.
//! 4. Validation of the reply header before procedure results are decoded
//!    ([`decode_reply`]).
//! 5. Record marking for stream transports ([`wire`]).

use std::io::Cursor;

use async_trait::async_trait;
use num_traits::ToPrimitive;
use tracing::{debug, warn};

use crate::error::{Error, Result, RpcError};
use crate::protocol::xdr::{self, nfs3, Serialize};

pub mod wire;

/// Upper bound on a reassembled RPC record.
///
/// Large enough for a 1 MiB READ or WRITE plus headers.
pub const MAX_RPC_RECORD_LENGTH: usize = 4 * 1024 * 1024;

/// RFC 5531 limits an AUTH_UNIX machine name to 255 bytes.
const MAX_MACHINE_NAME_LEN: usize = 255;
/// RFC 5531 limits AUTH_UNIX supplementary groups to 16.
const MAX_AUTH_UNIX_GIDS: usize = 16;

/// Authentication material attached to every call of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    cred: xdr::rpc::opaque_auth,
}

impl Credentials {
    /// `AUTH_NULL`: the server treats the caller as anonymous.
    pub fn null() -> Self {
        Credentials { cred: xdr::rpc::opaque_auth::null() }
    }

    /// `AUTH_UNIX` credentials for the given identity.
    pub fn unix(machinename: &str, uid: u32, gid: u32, gids: &[u32]) -> Result<Self> {
        if machinename.len() > MAX_MACHINE_NAME_LEN {
            return Err(Error::InvalidArgument("machine name longer than 255 bytes"));
        }
        if gids.len() > MAX_AUTH_UNIX_GIDS {
            return Err(Error::InvalidArgument("more than 16 supplementary groups"));
        }
        let body = xdr::rpc::auth_unix {
            stamp: 0,
            machinename: machinename.as_bytes().to_vec(),
            uid,
            gid,
            gids: gids.to_vec(),
        };
        let cred = xdr::rpc::opaque_auth::unix(&body)
            .map_err(|_| Error::InvalidArgument("AUTH_UNIX credential is not encodable"))?;
        Ok(Credentials { cred })
    }

    pub fn flavor(&self) -> xdr::rpc::auth_flavor {
        self.cred.flavor
    }

    pub fn as_opaque_auth(&self) -> &xdr::rpc::opaque_auth {
        &self.cred
    }
}

/// Builds the header of a call to `proc` of `prog`/`vers`.
pub fn call_header(prog: u32, vers: u32, proc: u32, credentials: &Credentials) -> xdr::rpc::call_body {
    xdr::rpc::call_body {
        rpcvers: xdr::rpc::RPC_VERSION,
        prog,
        vers,
        proc,
        cred: credentials.cred.clone(),
        verf: xdr::rpc::opaque_auth::null(),
    }
}

/// Builds the header of an NFS version 3 call.
pub fn nfs3_call_header(proc: nfs3::NFSProgram, credentials: &Credentials) -> xdr::rpc::call_body {
    // every NFSProgram discriminant fits in u32
    let proc = proc.to_u32().unwrap_or_default();
    call_header(nfs3::PROGRAM, nfs3::VERSION, proc, credentials)
}

/// A call ready to be sent: header plus encoded procedure arguments.
///
/// The xid is left to the transport, which is the only party that knows
/// which replies are outstanding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub header: xdr::rpc::call_body,
    pub args: Vec<u8>,
}

impl Request {
    pub fn new<A: Serialize>(header: xdr::rpc::call_body, args: &A) -> Result<Request> {
        let mut buf = Vec::new();
        args.serialize(&mut buf)
            .map_err(|_| Error::InvalidArgument("request arguments are not encodable"))?;
        Ok(Request { header, args: buf })
    }

    /// Encodes the complete call message under `xid`.
    pub fn encode(&self, xid: u32) -> Result<Vec<u8>> {
        let msg = xdr::rpc::rpc_msg { xid, body: xdr::rpc::rpc_body::CALL(self.header.clone()) };
        let mut buf = Vec::with_capacity(self.args.len() + 64);
        msg.serialize(&mut buf)
            .map_err(|_| Error::InvalidArgument("call header is not encodable"))?;
        buf.extend_from_slice(&self.args);
        Ok(buf)
    }
}

/// The RPC collaborator: sends one call and waits for its reply.
///
/// Implementations own connection management, xid assignment, timeouts and
/// retransmission. They return the procedure results of an accepted,
/// successful reply (everything after the reply header), usually by passing
/// the raw reply through [`decode_reply`]. Connection failures and timeouts
/// surface as [`Error::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: Request) -> Result<Vec<u8>>;
}

/// Validates a raw reply message for call `xid` and returns its results.
pub fn decode_reply(xid: u32, reply: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(reply);
    let msg = xdr::deserialize::<xdr::rpc::rpc_msg>(&mut cursor).map_err(Error::Decode)?;
    if msg.xid != xid {
        return Err(RpcError::XidMismatch { expected: xid, got: msg.xid }.into());
    }
    let xdr::rpc::rpc_body::REPLY(body) = msg.body else {
        return Err(RpcError::NotAReply.into());
    };
    let err = match body {
        xdr::rpc::reply_body::MSG_ACCEPTED(accepted) => match accepted.reply_data {
            xdr::rpc::accept_body::SUCCESS => {
                let start = cursor.position() as usize;
                return Ok(reply[start..].to_vec());
            }
            xdr::rpc::accept_body::PROG_UNAVAIL => RpcError::ProgUnavail,
            xdr::rpc::accept_body::PROG_MISMATCH(info) => {
                RpcError::ProgMismatch { low: info.low, high: info.high }
            }
            xdr::rpc::accept_body::PROC_UNAVAIL => RpcError::ProcUnavail,
            xdr::rpc::accept_body::GARBAGE_ARGS => RpcError::GarbageArgs,
            xdr::rpc::accept_body::SYSTEM_ERR => RpcError::SystemErr,
        },
        xdr::rpc::reply_body::MSG_DENIED(rejected) => match rejected {
            xdr::rpc::rejected_reply::RPC_MISMATCH(info) => {
                RpcError::RpcMismatch { low: info.low, high: info.high }
            }
            xdr::rpc::rejected_reply::AUTH_ERROR(stat) => RpcError::Auth(stat),
        },
    };
    warn!("call {} not executed: {}", xid, err);
    Err(err.into())
}

/// Reads the leading `nfsstat3` of NFS results, failing on anything but OK.
pub fn check_status(results: &mut Cursor<Vec<u8>>) -> Result<()> {
    let stat = xdr::deserialize::<nfs3::nfsstat3>(results).map_err(Error::Decode)?;
    if stat != nfs3::nfsstat3::NFS3_OK {
        debug!("server returned {:?}", stat);
        return Err(Error::Status(stat));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_carries_fixed_identifiers_and_null_verifier() {
        let cred = Credentials::unix("client", 1000, 100, &[10, 20]).unwrap();
        let header = nfs3_call_header(nfs3::NFSProgram::NFSPROC3_WRITE, &cred);
        assert_eq!(header.rpcvers, 2);
        assert_eq!(header.prog, 100003);
        assert_eq!(header.vers, 3);
        assert_eq!(header.proc, 7);
        assert_eq!(header.cred.flavor, xdr::rpc::auth_flavor::AUTH_UNIX);
        assert_eq!(header.verf, xdr::rpc::opaque_auth::null());

        let decoded =
            xdr::deserialize::<xdr::rpc::auth_unix>(&mut header.cred.body.as_slice()).unwrap();
        assert_eq!(decoded.machinename, b"client");
        assert_eq!(decoded.uid, 1000);
        assert_eq!(decoded.gids, vec![10, 20]);
    }

    #[test]
    fn unix_credentials_are_bounded() {
        let long_name = "x".repeat(256);
        assert!(matches!(
            Credentials::unix(&long_name, 0, 0, &[]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(Credentials::unix("h", 0, 0, &[0; 17]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn encoded_request_is_header_then_args() {
        let header = nfs3_call_header(nfs3::NFSProgram::NFSPROC3_NULL, &Credentials::null());
        let request = Request::new(header.clone(), &7_u32).unwrap();
        let bytes = request.encode(99).unwrap();

        let mut cursor = Cursor::new(bytes);
        let msg = xdr::deserialize::<xdr::rpc::rpc_msg>(&mut cursor).unwrap();
        assert_eq!(msg.xid, 99);
        match msg.body {
            xdr::rpc::rpc_body::CALL(call) => assert_eq!(call, header),
            other => panic!("expected CALL, got {other:?}"),
        }
        assert_eq!(xdr::deserialize::<u32>(&mut cursor).unwrap(), 7);
    }

    #[test]
    fn decode_reply_returns_results_after_header() {
        let mut reply = Vec::new();
        xdr::rpc::make_success_reply(5).serialize(&mut reply).unwrap();
        0xdead_beef_u32.serialize(&mut reply).unwrap();

        let results = decode_reply(5, &reply).unwrap();
        assert_eq!(results, 0xdead_beef_u32.to_be_bytes());
    }

    #[test]
    fn decode_reply_maps_rejections() {
        let mut reply = Vec::new();
        xdr::rpc::accepted_reply_message(5, xdr::rpc::accept_body::PROC_UNAVAIL)
            .serialize(&mut reply)
            .unwrap();
        assert!(matches!(decode_reply(5, &reply), Err(Error::Rpc(RpcError::ProcUnavail))));

        let mut reply = Vec::new();
        xdr::rpc::denied_reply_message(
            6,
            xdr::rpc::rejected_reply::AUTH_ERROR(xdr::rpc::auth_stat::AUTH_TOOWEAK),
        )
        .serialize(&mut reply)
        .unwrap();
        assert!(matches!(
            decode_reply(6, &reply),
            Err(Error::Rpc(RpcError::Auth(xdr::rpc::auth_stat::AUTH_TOOWEAK)))
        ));
    }

    #[test]
    fn decode_reply_rejects_wrong_xid_and_garbage() {
        let mut reply = Vec::new();
        xdr::rpc::make_success_reply(1).serialize(&mut reply).unwrap();
        assert!(matches!(
            decode_reply(2, &reply),
            Err(Error::Rpc(RpcError::XidMismatch { expected: 2, got: 1 }))
        ));
        assert!(matches!(decode_reply(1, &reply[..6]), Err(Error::Decode(_))));
    }

    #[test]
    fn check_status_surfaces_server_errors() {
        let mut ok = Cursor::new(vec![0, 0, 0, 0]);
        assert!(check_status(&mut ok).is_ok());
        let mut stale = Cursor::new(70_u32.to_be_bytes().to_vec());
        assert!(matches!(
            check_status(&mut stale),
            Err(Error::Status(nfs3::nfsstat3::NFS3ERR_STALE))
        ));
    }
}
