#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use nfs_mamont_client::protocol::rpc::decode_reply;
use nfs_mamont_client::xdr::{self, nfs3, Deserialize, Serialize};
use nfs_mamont_client::{Credentials, Error, Request, Session, TransferLimits, Transport};

/// What the scripted server answers to the next call.
enum Scripted {
    /// Procedure results of an accepted, successful reply.
    Results(Vec<u8>),
    /// A complete reply message, validated like a real transport would.
    Reply(xdr::rpc::rpc_msg),
    Fail(Error),
}

/// In-memory [`Transport`] that records every call and answers from a
/// queue filled by the test.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Request>>,
    next_xid: AtomicU32,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues `NFS3_OK` followed by `resok`.
    pub fn ok<T: Serialize>(&self, resok: &T) {
        let mut results = Vec::new();
        nfs3::nfsstat3::NFS3_OK.serialize(&mut results).unwrap();
        resok.serialize(&mut results).unwrap();
        self.raw(results);
    }

    /// Queues a failed NFS status. Servers send attributes after the status,
    /// the client must not need them.
    pub fn status(&self, stat: nfs3::nfsstat3) {
        let mut results = Vec::new();
        stat.serialize(&mut results).unwrap();
        nfs3::wcc_data::default().serialize(&mut results).unwrap();
        self.raw(results);
    }

    pub fn raw(&self, results: Vec<u8>) {
        self.script.lock().unwrap().push_back(Scripted::Results(results));
    }

    /// Queues an accepted reply that did not run the procedure.
    pub fn not_executed(&self, body: xdr::rpc::accept_body) {
        let msg = xdr::rpc::accepted_reply_message(0, body);
        self.script.lock().unwrap().push_back(Scripted::Reply(msg));
    }

    pub fn fail(&self, err: Error) {
        self.script.lock().unwrap().push_back(Scripted::Fail(err));
    }

    pub fn broken_pipe(&self) {
        self.fail(Error::Transport(io::Error::new(io::ErrorKind::BrokenPipe, "connection lost")));
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    /// Procedure numbers of all calls so far, in order.
    pub fn procs(&self) -> Vec<nfs3::NFSProgram> {
        self.calls()
            .iter()
            .map(|r| num_traits::FromPrimitive::from_u32(r.header.proc).unwrap())
            .collect()
    }

    /// Decoded arguments of call `index`.
    pub fn args<T: Deserialize + Default>(&self, index: usize) -> T {
        let calls = self.calls.lock().unwrap();
        xdr::deserialize::<T>(&mut calls[index].args.as_slice()).unwrap()
    }

    pub fn pending(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, request: Request) -> Result<Vec<u8>, Error> {
        let xid = self.next_xid.fetch_add(1, Ordering::Relaxed);
        self.calls.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next.expect("call issued with an empty script") {
            Scripted::Results(results) => Ok(results),
            Scripted::Reply(mut msg) => {
                msg.xid = xid;
                let mut buf = Vec::new();
                msg.serialize(&mut buf).unwrap();
                decode_reply(xid, &buf)
            }
            Scripted::Fail(err) => Err(err),
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn root_fh() -> nfs3::nfs_fh3 {
    nfs3::nfs_fh3::from(vec![0xaa, 0, 0, 1])
}

pub fn fh(id: u8) -> nfs3::nfs_fh3 {
    nfs3::nfs_fh3::from(vec![0xbb, 0, 0, id])
}

pub fn attr(size: u64) -> nfs3::fattr3 {
    nfs3::fattr3 { ftype: nfs3::ftype3::NF3REG, mode: 0o644, size, ..Default::default() }
}

/// Session over `transport` with fixed read and write sizes.
pub fn session(transport: &Arc<ScriptedTransport>, read: u32, write: u32) -> Arc<Session> {
    session_with(transport, Credentials::null(), read, write)
}

pub fn session_with(
    transport: &Arc<ScriptedTransport>,
    credentials: Credentials,
    read: u32,
    write: u32,
) -> Arc<Session> {
    Session::with_limits(
        transport.clone(),
        credentials,
        root_fh(),
        TransferLimits::new(read, write),
    )
}

pub fn write_ok(count: u32, verf: nfs3::writeverf3) -> nfs3::file::WRITE3resok {
    nfs3::file::WRITE3resok {
        file_wcc: nfs3::wcc_data::default(),
        count,
        committed: nfs3::file::stable_how::FILE_SYNC,
        verf,
    }
}
