//! Record marking for RPC over stream transports (RFC 5531, section 11).
//!
//! A record is a sequence of fragments, each prefixed by a 4-byte header:
//! the low 31 bits hold the fragment length and the high bit is set on the
//! last fragment of the record.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use super::MAX_RPC_RECORD_LENGTH;

/// Largest fragment a header can describe.
const MAX_FRAGMENT_SIZE: usize = (1 << 31) - 1;
const LAST_FRAGMENT: u32 = 1 << 31;

/// Reads one fragment and appends its payload to `append_to`.
///
/// Returns true if it was the last fragment of the record.
async fn read_fragment<R: AsyncRead + Unpin>(
    socket: &mut R,
    append_to: &mut Vec<u8>,
) -> io::Result<bool> {
    let mut header_buf = [0_u8; 4];
    socket.read_exact(&mut header_buf).await?;
    let fragment_header = u32::from_be_bytes(header_buf);
    let is_last = (fragment_header & LAST_FRAGMENT) > 0;
    let length = (fragment_header & !LAST_FRAGMENT) as usize;
    trace!("Reading fragment length:{}, last:{}", length, is_last);
    if append_to.len().saturating_add(length) > MAX_RPC_RECORD_LENGTH {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("RPC record length {} exceeds max {}", length, MAX_RPC_RECORD_LENGTH),
        ));
    }
    let start_offset = append_to.len();
    append_to.resize(start_offset + length, 0);
    socket.read_exact(&mut append_to[start_offset..]).await?;
    Ok(is_last)
}

/// Reads fragments until a complete record has been reassembled.
pub async fn read_record<R: AsyncRead + Unpin>(socket: &mut R) -> io::Result<Vec<u8>> {
    let mut record = Vec::new();
    while !read_fragment(socket, &mut record).await? {}
    Ok(record)
}

/// Writes `buf` as one record, split into as many fragments as needed.
pub async fn write_record<W: AsyncWrite + Unpin>(socket: &mut W, buf: &[u8]) -> io::Result<()> {
    let mut offset = 0;
    loop {
        let fragment_size = std::cmp::min(buf.len() - offset, MAX_FRAGMENT_SIZE);
        let is_last = offset + fragment_size >= buf.len();
        let fragment_header =
            if is_last { fragment_size as u32 | LAST_FRAGMENT } else { fragment_size as u32 };

        trace!("Writing fragment length:{}, last:{}", fragment_size, is_last);
        socket.write_all(&fragment_header.to_be_bytes()).await?;
        socket.write_all(&buf[offset..offset + fragment_size]).await?;

        offset += fragment_size;
        if is_last {
            break;
        }
    }
    socket.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_survives_a_round_trip() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_record(&mut client, b"hello").await.unwrap();
        let record = read_record(&mut server).await.unwrap();
        assert_eq!(record, b"hello");
    }

    #[tokio::test]
    async fn empty_record_is_a_single_last_fragment() {
        let (mut client, mut server) = tokio::io::duplex(64);
        write_record(&mut client, &[]).await.unwrap();
        let mut header = [0_u8; 4];
        server.read_exact(&mut header).await.unwrap();
        assert_eq!(u32::from_be_bytes(header), LAST_FRAGMENT);
    }

    #[tokio::test]
    async fn fragments_are_reassembled() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        client.write_all(&3_u32.to_be_bytes()).await.unwrap();
        client.write_all(b"abc").await.unwrap();
        client.write_all(&(2_u32 | LAST_FRAGMENT).to_be_bytes()).await.unwrap();
        client.write_all(b"de").await.unwrap();

        let record = read_record(&mut server).await.unwrap();
        assert_eq!(record, b"abcde");
    }

    #[tokio::test]
    async fn rejects_oversized_record() {
        let (mut client, mut server) = tokio::io::duplex(64);
        let header = LAST_FRAGMENT | (MAX_RPC_RECORD_LENGTH as u32 + 1);
        client.write_all(&header.to_be_bytes()).await.unwrap();

        let err = read_record(&mut server).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("exceeds max"), "unexpected error: {err:?}");
    }
}
