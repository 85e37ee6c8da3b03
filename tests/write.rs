use nfs_mamont_client::xdr::nfs3;
use nfs_mamont_client::xdr::nfs3::file::{stable_how, WRITE3args};
use nfs_mamont_client::{Error, RpcError, Whence};

mod support;
use support::{fh, session, write_ok, ScriptedTransport};

const VERF: nfs3::writeverf3 = [1, 2, 3, 4, 5, 6, 7, 8];

#[tokio::test]
async fn full_acceptance_issues_one_call_per_chunk() {
    support::init_tracing();
    for (size, wsize) in [(10_usize, 4_u32), (8, 4), (1, 4), (4096, 512), (1000, 999)] {
        let transport = ScriptedTransport::new();
        let mut file = session(&transport, 64, wsize).open_by_fh(fh(1), None);
        let payload: Vec<u8> = (0..size).map(|i| i as u8).collect();

        let mut expected_calls = 0;
        let mut left = size;
        while left > 0 {
            let chunk = left.min(wsize as usize);
            transport.ok(&write_ok(chunk as u32, VERF));
            left -= chunk;
            expected_calls += 1;
        }
        assert_eq!(expected_calls, size.div_ceil(wsize as usize));

        assert_eq!(file.write(&payload).await.unwrap(), size);
        assert_eq!(file.position(), size as u64);
        assert_eq!(transport.calls().len(), expected_calls);

        let mut offset = 0;
        let mut sent = Vec::new();
        for i in 0..expected_calls {
            let args = transport.args::<WRITE3args>(i);
            assert_eq!(args.offset, offset);
            assert!(args.count <= wsize);
            assert_eq!(args.count as usize, args.data.len());
            offset += args.count as u64;
            sent.extend_from_slice(&args.data);
        }
        assert_eq!(sent, payload);
    }
}

#[tokio::test]
async fn ten_bytes_in_chunks_of_four() {
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    for count in [4, 4, 2] {
        transport.ok(&write_ok(count, VERF));
    }

    assert_eq!(file.write(b"0123456789").await.unwrap(), 10);
    let sizes: Vec<u32> = (0..3).map(|i| transport.args::<WRITE3args>(i).count).collect();
    assert_eq!(sizes, [4, 4, 2]);
    assert_eq!(transport.procs(), [nfs3::NFSProgram::NFSPROC3_WRITE; 3]);
}

#[tokio::test]
async fn writes_request_file_sync() {
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    transport.ok(&write_ok(3, VERF));

    file.write(b"abc").await.unwrap();
    let args = transport.args::<WRITE3args>(0);
    assert_eq!(args.stable, stable_how::FILE_SYNC);
    assert_eq!(args.file, fh(1));
}

#[tokio::test]
async fn partial_acceptance_resumes_after_accepted_bytes() {
    support::init_tracing();
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    for count in [2, 4, 2, 2] {
        transport.ok(&write_ok(count, VERF));
    }

    assert_eq!(file.write(b"0123456789").await.unwrap(), 10);
    assert_eq!(file.position(), 10);
    assert_eq!(transport.calls().len(), 4);

    let calls: Vec<(u64, Vec<u8>)> = (0..4)
        .map(|i| {
            let args = transport.args::<WRITE3args>(i);
            (args.offset, args.data)
        })
        .collect();
    assert_eq!(
        calls,
        [
            (0, b"0123".to_vec()),
            (2, b"2345".to_vec()),
            (6, b"6789".to_vec()),
            (8, b"89".to_vec()),
        ]
    );
}

#[tokio::test]
async fn partial_acceptance_then_full_remainder() {
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    for count in [2, 4, 4] {
        transport.ok(&write_ok(count, VERF));
    }

    assert_eq!(file.write(b"0123456789").await.unwrap(), 10);
    let offsets: Vec<u64> = (0..3).map(|i| transport.args::<WRITE3args>(i).offset).collect();
    assert_eq!(offsets, [0, 2, 6]);
    assert_eq!(transport.pending(), 0);
}

#[tokio::test]
async fn any_acceptance_pattern_advances_by_accepted_bytes() {
    const PAYLOAD: &[u8] = b"0123456789";
    const START: u64 = 100;
    let patterns: &[&[u32]] = &[
        &[1; 10],
        &[4, 4, 2],
        &[2, 4, 2, 2],
        &[2, 4, 4],
        &[3, 3, 3, 1],
        &[1, 4, 4, 1],
        &[4, 1, 4, 1],
    ];

    for pattern in patterns {
        let transport = ScriptedTransport::new();
        let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
        file.seek(START as i64, Whence::Start).unwrap();
        for count in pattern.iter() {
            transport.ok(&write_ok(*count, VERF));
        }

        assert_eq!(file.write(PAYLOAD).await.unwrap(), PAYLOAD.len(), "{pattern:?}");
        assert_eq!(file.position(), START + PAYLOAD.len() as u64, "{pattern:?}");
        assert_eq!(transport.calls().len(), pattern.len(), "{pattern:?}");
        assert_eq!(transport.pending(), 0, "{pattern:?}");

        let mut accepted = 0_usize;
        for (i, count) in pattern.iter().enumerate() {
            let args = transport.args::<WRITE3args>(i);
            let sent = args.data.len();
            assert_eq!(args.offset, START + accepted as u64, "{pattern:?} call {i}");
            assert_eq!(args.count as usize, sent, "{pattern:?} call {i}");
            assert_eq!(sent, 4.min(PAYLOAD.len() - accepted), "{pattern:?} call {i}");
            assert_eq!(args.data, &PAYLOAD[accepted..accepted + sent], "{pattern:?} call {i}");
            accepted += *count as usize;
        }
        assert_eq!(accepted, PAYLOAD.len());
    }
}

#[tokio::test]
async fn failure_reports_bytes_accepted_before_it() {
    support::init_tracing();
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    file.seek(100, Whence::Start).unwrap();
    transport.ok(&write_ok(4, VERF));
    transport.ok(&write_ok(3, VERF));
    transport.status(nfs3::nfsstat3::NFS3ERR_NOSPC);
    transport.ok(&write_ok(4, VERF));
    transport.broken_pipe();

    let err = file.write(b"0123456789ab").await.unwrap_err();
    assert_eq!(err.written, 7);
    assert!(matches!(err.source, Error::Status(nfs3::nfsstat3::NFS3ERR_NOSPC)));
    assert_eq!(file.position(), 107);
    assert_eq!(transport.calls().len(), 3);
    assert_eq!(transport.pending(), 2);

    // resuming with the rest continues at the cursor
    assert_eq!(file.write(&b"0123456789ab"[err.written..]).await.unwrap_err().written, 4);
}

#[tokio::test]
async fn transport_failure_stops_the_write() {
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    transport.ok(&write_ok(4, VERF));
    transport.broken_pipe();

    let err = file.write(b"0123456789").await.unwrap_err();
    assert_eq!(err.written, 4);
    match err.source {
        Error::Transport(e) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
        other => panic!("expected transport error, got {other:?}"),
    }
    assert_eq!(file.position(), 4);
}

#[tokio::test]
async fn rpc_rejection_stops_the_write() {
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    transport.not_executed(nfs_mamont_client::xdr::rpc::accept_body::SYSTEM_ERR);

    let err = file.write(b"abc").await.unwrap_err();
    assert_eq!(err.written, 0);
    assert!(matches!(err.source, Error::Rpc(RpcError::SystemErr)));
    assert_eq!(file.position(), 0);
}

#[tokio::test]
async fn zero_or_excess_acceptance_is_a_protocol_error() {
    for count in [0, 5] {
        let transport = ScriptedTransport::new();
        let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
        transport.ok(&write_ok(4, VERF));
        transport.ok(&write_ok(count, VERF));

        let err = file.write(b"0123456789").await.unwrap_err();
        assert_eq!(err.written, 4);
        assert!(matches!(err.source, Error::Protocol(_)), "count {count}: {:?}", err.source);
        assert_eq!(file.position(), 4);
    }
}

#[tokio::test]
async fn empty_write_sends_nothing() {
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    assert_eq!(file.write(&[]).await.unwrap(), 0);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn write_refreshes_cached_size() {
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 8).open_by_fh(fh(1), Some(support::attr(0)));
    let mut reply = write_ok(6, VERF);
    reply.file_wcc.after = Some(support::attr(6));
    transport.ok(&reply);

    file.write(b"abcdef").await.unwrap();
    file.seek(0, Whence::Start).unwrap();
    assert_eq!(file.seek(0, Whence::End).unwrap(), 6);
}

#[tokio::test]
async fn verifier_change_between_chunks_does_not_fail() {
    support::init_tracing();
    let transport = ScriptedTransport::new();
    let mut file = session(&transport, 64, 4).open_by_fh(fh(1), None);
    transport.ok(&write_ok(4, VERF));
    transport.ok(&write_ok(4, [9; 8]));

    assert_eq!(file.write(b"01234567").await.unwrap(), 8);
}
