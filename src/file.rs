//! A remote file used as a byte stream.
//!
//! The server keeps no open-file state: every READ and WRITE names the
//! handle, an offset and a count. The cursor, the last attributes seen and
//! the last write verifier live here, on the client.

use std::io;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::error::{Error, Result, WriteError};
use crate::protocol::xdr::nfs3;
use crate::protocol::xdr::nfs3::file::stable_how;
use crate::session::{decode, Session};

/// Result of a single [`NfsFile::read`].
///
/// Data and end of file can arrive together: `count` bytes were copied and
/// the server reported that they end the file.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadOutcome {
    pub count: usize,
    pub eof: bool,
}

/// Reference point of [`NfsFile::seek`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// Conventional `whence` numbering: 0 start, 1 current, 2 end.
impl TryFrom<i32> for Whence {
    type Error = Error;

    fn try_from(whence: i32) -> Result<Self> {
        match whence {
            0 => Ok(Whence::Start),
            1 => Ok(Whence::Current),
            2 => Ok(Whence::End),
            _ => Err(Error::InvalidArgument("invalid whence")),
        }
    }
}

/// One remote file: a handle plus a client-side cursor.
///
/// Dropping an `NfsFile` releases nothing on the server. Operations take
/// `&mut self`; a file shared between tasks needs a lock around it. Distinct
/// `NfsFile`s, even for the same handle, can be used concurrently.
#[derive(Debug)]
pub struct NfsFile {
    session: Arc<Session>,
    fh: nfs3::nfs_fh3,
    cursor: u64,
    attr: Option<nfs3::fattr3>,
    last_verf: Option<nfs3::writeverf3>,
}

impl NfsFile {
    pub(crate) fn new(
        session: Arc<Session>,
        fh: nfs3::nfs_fh3,
        attr: Option<nfs3::fattr3>,
    ) -> NfsFile {
        NfsFile { session, fh, cursor: 0, attr, last_verf: None }
    }

    pub fn handle(&self) -> &nfs3::nfs_fh3 {
        &self.fh
    }

    /// Current cursor, the offset of the next read or write.
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Last attributes received for this file. May be stale.
    pub fn attributes(&self) -> Option<&nfs3::fattr3> {
        self.attr.as_ref()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn refresh_attributes(&mut self, attr: nfs3::post_op_attr) {
        if attr.is_some() {
            self.attr = attr;
        }
    }

    fn note_verifier(&mut self, verf: nfs3::writeverf3) {
        match self.last_verf {
            Some(prev) if prev != verf => {
                warn!(
                    "write verifier of {} changed from {:02x?} to {:02x?}, server restarted",
                    self.fh, prev, verf
                );
            }
            _ => {}
        }
        self.last_verf = Some(verf);
    }

    /// Reads at the cursor into `buf` with a single READ call.
    ///
    /// At most `min(buf.len(), read limit)` bytes are requested; read again
    /// for more. The cursor advances by the bytes returned. On error nothing
    /// is copied and the cursor does not move.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<ReadOutcome> {
        if buf.is_empty() {
            return Ok(ReadOutcome::default());
        }
        let count = self.session.limits().read_chunk(buf.len());
        let args = nfs3::file::READ3args {
            file: self.fh.clone(),
            offset: self.cursor,
            // bounded by the u32 read limit
            count: count as nfs3::count3,
        };
        debug!("read {} offset {} count {}", self.fh, self.cursor, count);
        let mut results = self.session.call(nfs3::NFSProgram::NFSPROC3_READ, &args).await?;
        let res = decode::<nfs3::file::READ3resok>(&mut results)?;

        let got = res.data.len();
        if got != res.count as usize || got > count {
            return Err(Error::Protocol(format!(
                "READ asked for {} bytes, reply claims {} and carries {}",
                count, res.count, got
            )));
        }
        buf[..got].copy_from_slice(&res.data);
        self.cursor += got as u64;
        self.refresh_attributes(res.file_attributes);
        if res.eof {
            debug!("read {} reached eof at {}", self.fh, self.cursor);
        }
        Ok(ReadOutcome { count: got, eof: res.eof })
    }

    /// Writes all of `buf` at the cursor as FILE_SYNC WRITE calls no larger
    /// than the write limit.
    ///
    /// A call that accepts fewer bytes than sent is not an error: the next
    /// call resumes after the accepted bytes. The first failing call stops
    /// the write; [`WriteError::written`] then says how many bytes of `buf`
    /// the server accepted, and the cursor has advanced by exactly that.
    pub async fn write(&mut self, buf: &[u8]) -> Result<usize, WriteError> {
        let mut written = 0;
        while written < buf.len() {
            let chunk = self.session.limits().write_chunk(buf.len() - written);
            match self.write_chunk(&buf[written..written + chunk]).await {
                Ok(accepted) => written += accepted,
                Err(source) => {
                    error!(
                        "write {} offset {} failed after {} bytes: {}",
                        self.fh, self.cursor, written, source
                    );
                    return Err(WriteError { written, source });
                }
            }
        }
        Ok(written)
    }

    /// One WRITE call. Returns the bytes the server accepted.
    async fn write_chunk(&mut self, data: &[u8]) -> Result<usize> {
        let args = nfs3::file::WRITE3args {
            file: self.fh.clone(),
            offset: self.cursor,
            // bounded by the u32 write limit
            count: data.len() as nfs3::count3,
            stable: stable_how::FILE_SYNC,
            data: data.to_vec(),
        };
        debug!("write {} offset {} count {}", self.fh, self.cursor, data.len());
        let mut results = self.session.call(nfs3::NFSProgram::NFSPROC3_WRITE, &args).await?;
        let res = decode::<nfs3::file::WRITE3resok>(&mut results)?;

        let accepted = res.count as usize;
        if accepted == 0 || accepted > data.len() {
            return Err(Error::Protocol(format!(
                "WRITE of {} bytes acknowledged {}",
                data.len(),
                accepted
            )));
        }
        if accepted < data.len() {
            warn!(
                "partial write {} offset {}: server accepted {} of {} bytes",
                self.fh,
                self.cursor,
                accepted,
                data.len()
            );
        }
        if res.committed < stable_how::FILE_SYNC {
            warn!("write {} committed as {:?}, FILE_SYNC was requested", self.fh, res.committed);
        }
        self.note_verifier(res.verf);
        self.refresh_attributes(res.file_wcc.after);
        self.cursor += accepted as u64;
        Ok(accepted)
    }

    /// Moves the cursor without talking to the server and returns it.
    ///
    /// - `Start`: the cursor becomes `offset`, which must not be negative.
    /// - `Current`: `offset` is added to the cursor. A result below zero or
    ///   above `i64::MAX` is rejected.
    /// - `End`: the cursor moves to the cached file size if that is past the
    ///   cursor; `offset` is not used. The size is the last one seen and is
    ///   never refetched, so it may be stale.
    ///
    /// A rejected seek leaves the cursor unchanged.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let target = match whence {
            Whence::Start => u64::try_from(offset)
                .map_err(|_| Error::InvalidArgument("negative seek offset"))?,
            Whence::Current => self
                .cursor
                .checked_add_signed(offset)
                .filter(|pos| *pos <= i64::MAX as u64)
                .ok_or(Error::InvalidArgument("seek outside the file offset range"))?,
            Whence::End => {
                let size = self.attr.as_ref().map_or(0, |attr| attr.size);
                self.cursor.max(size)
            }
        };
        self.cursor = target;
        Ok(target)
    }

    /// Asks the server to flush everything written to this file to stable
    /// storage (COMMIT with offset 0, count 0).
    pub async fn commit(&mut self) -> Result<()> {
        let args = nfs3::file::COMMIT3args { file: self.fh.clone(), offset: 0, count: 0 };
        debug!("commit {}", self.fh);
        let mut results = self.session.call(nfs3::NFSProgram::NFSPROC3_COMMIT, &args).await?;
        let res = decode::<nfs3::file::COMMIT3resok>(&mut results)?;
        if let Some(prev) = self.last_verf {
            if prev != res.verf {
                warn!(
                    "commit {} verifier {:02x?} differs from write verifier {:02x?}",
                    self.fh, res.verf, prev
                );
            }
        }
        self.refresh_attributes(res.file_wcc.after);
        Ok(())
    }

    /// Durability barrier at the end of use. Same as [`NfsFile::commit`];
    /// the handle stays usable.
    pub async fn close(&mut self) -> Result<()> {
        self.commit().await
    }

    /// Returns the target of this symbolic link.
    pub async fn readlink(&self) -> Result<String> {
        let args = nfs3::file::READLINK3args { symlink: self.fh.clone() };
        let mut results = self.session.call(nfs3::NFSProgram::NFSPROC3_READLINK, &args).await?;
        let res = decode::<nfs3::file::READLINK3resok>(&mut results)?;
        String::from_utf8(res.data.0)
            .map_err(|e| Error::Decode(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
