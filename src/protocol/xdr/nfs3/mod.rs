//! XDR data types and constants of NFS version 3 (RFC 1813) needed by a
//! client moving file data.
//!
//! Procedure arguments and results live in submodules grouped by what they
//! act on: [`file`] (READ, WRITE, COMMIT, READLINK), [`dir`] (LOOKUP, CREATE,
//! SYMLINK) and [`fs`] (GETATTR, FSINFO).

// Keep RFC naming for wire structures
#![allow(non_camel_case_types)]

use std::fmt;
use std::io::{Read, Write};

use num_derive::{FromPrimitive, ToPrimitive};

use super::{deserialize, Deserialize, DeserializeEnum, Serialize, SerializeEnum};
use crate::{DeserializeStruct, SerializeStruct};

pub mod dir;
pub mod file;
pub mod fs;

/// RPC program number of the NFS service.
pub const PROGRAM: u32 = 100003;
/// Protocol version implemented here.
pub const VERSION: u32 = 3;

/// Largest file handle a server may hand out.
pub const NFS3_FHSIZE: u32 = 64;
/// Size of the verifier returned by WRITE and COMMIT.
pub const NFS3_WRITEVERFSIZE: u32 = 8;
/// Size of the verifier used by exclusive CREATE.
pub const NFS3_CREATEVERFSIZE: u32 = 8;

/// Byte string used for file names and symlink contents.
///
/// NFS does not mandate an encoding, so this stays raw bytes.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct nfsstring(pub Vec<u8>);

impl nfsstring {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for nfsstring {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for nfsstring {
    fn from(value: &[u8]) -> Self {
        Self(value.into())
    }
}

impl From<&str> for nfsstring {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().into())
    }
}

impl AsRef<[u8]> for nfsstring {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for nfsstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for nfsstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for nfsstring {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        self.0.serialize(dest)
    }
}

impl Deserialize for nfsstring {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> std::io::Result<()> {
        self.0.deserialize(src)
    }
}

/// NFS version 3 procedure numbers.
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum NFSProgram {
    NFSPROC3_NULL = 0,
    NFSPROC3_GETATTR = 1,
    NFSPROC3_SETATTR = 2,
    NFSPROC3_LOOKUP = 3,
    NFSPROC3_ACCESS = 4,
    NFSPROC3_READLINK = 5,
    NFSPROC3_READ = 6,
    NFSPROC3_WRITE = 7,
    NFSPROC3_CREATE = 8,
    NFSPROC3_MKDIR = 9,
    NFSPROC3_SYMLINK = 10,
    NFSPROC3_MKNOD = 11,
    NFSPROC3_REMOVE = 12,
    NFSPROC3_RMDIR = 13,
    NFSPROC3_RENAME = 14,
    NFSPROC3_LINK = 15,
    NFSPROC3_READDIR = 16,
    NFSPROC3_READDIRPLUS = 17,
    NFSPROC3_FSSTAT = 18,
    NFSPROC3_FSINFO = 19,
    NFSPROC3_PATHCONF = 20,
    NFSPROC3_COMMIT = 21,
}

pub type filename3 = nfsstring;
pub type nfspath3 = nfsstring;
pub type fileid3 = u64;
pub type uid3 = u32;
pub type gid3 = u32;
pub type size3 = u64;
pub type offset3 = u64;
pub type mode3 = u32;
pub type count3 = u32;
/// Changes only when the server restarts; lets a client detect lost
/// unstable writes.
pub type writeverf3 = [u8; NFS3_WRITEVERFSIZE as usize];
pub type createverf3 = [u8; NFS3_CREATEVERFSIZE as usize];

/// Status of every NFS version 3 reply.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum nfsstat3 {
    #[default]
    NFS3_OK = 0,
    /// Caller is not the owner or not privileged
    NFS3ERR_PERM = 1,
    /// No such file or directory
    NFS3ERR_NOENT = 2,
    /// Hard I/O error on the server
    NFS3ERR_IO = 5,
    NFS3ERR_NXIO = 6,
    /// Permission denied
    NFS3ERR_ACCES = 13,
    NFS3ERR_EXIST = 17,
    NFS3ERR_XDEV = 18,
    NFS3ERR_NODEV = 19,
    NFS3ERR_NOTDIR = 20,
    NFS3ERR_ISDIR = 21,
    /// Invalid argument, e.g. READLINK on something that is not a symlink
    NFS3ERR_INVAL = 22,
    NFS3ERR_FBIG = 27,
    NFS3ERR_NOSPC = 28,
    NFS3ERR_ROFS = 30,
    NFS3ERR_MLINK = 31,
    NFS3ERR_NAMETOOLONG = 63,
    NFS3ERR_NOTEMPTY = 66,
    NFS3ERR_DQUOT = 69,
    /// The handle no longer refers to a live object
    NFS3ERR_STALE = 70,
    NFS3ERR_REMOTE = 71,
    NFS3ERR_BADHANDLE = 10001,
    NFS3ERR_NOT_SYNC = 10002,
    NFS3ERR_BAD_COOKIE = 10003,
    NFS3ERR_NOTSUPP = 10004,
    NFS3ERR_TOOSMALL = 10005,
    NFS3ERR_SERVERFAULT = 10006,
    NFS3ERR_BADTYPE = 10007,
    /// Server is busy, retry later with a new xid
    NFS3ERR_JUKEBOX = 10008,
}
impl SerializeEnum for nfsstat3 {}
impl DeserializeEnum for nfsstat3 {}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum ftype3 {
    #[default]
    NF3REG = 1,
    NF3DIR = 2,
    NF3BLK = 3,
    NF3CHR = 4,
    NF3LNK = 5,
    NF3SOCK = 6,
    NF3FIFO = 7,
}
impl SerializeEnum for ftype3 {}
impl DeserializeEnum for ftype3 {}

/// Major and minor device numbers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct specdata3 {
    pub specdata1: u32,
    pub specdata2: u32,
}
DeserializeStruct!(specdata3, specdata1, specdata2);
SerializeStruct!(specdata3, specdata1, specdata2);

/// Opaque server-assigned identity of a file system object.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct nfs_fh3 {
    pub data: Vec<u8>,
}
DeserializeStruct!(nfs_fh3, data);
SerializeStruct!(nfs_fh3, data);

impl From<Vec<u8>> for nfs_fh3 {
    fn from(data: Vec<u8>) -> Self {
        nfs_fh3 { data }
    }
}

/// Handles are logged as lowercase hex.
impl fmt::Display for nfs_fh3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.data {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for nfs_fh3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "nfs_fh3({self})")
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct nfstime3 {
    pub seconds: u32,
    pub nseconds: u32,
}
DeserializeStruct!(nfstime3, seconds, nseconds);
SerializeStruct!(nfstime3, seconds, nseconds);

/// Attributes of a file system object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct fattr3 {
    pub ftype: ftype3,
    pub mode: mode3,
    pub nlink: u32,
    pub uid: uid3,
    pub gid: gid3,
    /// Size in bytes
    pub size: size3,
    /// Bytes of disk actually allocated
    pub used: size3,
    pub rdev: specdata3,
    pub fsid: u64,
    pub fileid: fileid3,
    pub atime: nfstime3,
    pub mtime: nfstime3,
    pub ctime: nfstime3,
}
DeserializeStruct!(
    fattr3, ftype, mode, nlink, uid, gid, size, used, rdev, fsid, fileid, atime, mtime, ctime
);
SerializeStruct!(
    fattr3, ftype, mode, nlink, uid, gid, size, used, rdev, fsid, fileid, atime, mtime, ctime
);

/// Subset of attributes used for weak cache consistency.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct wcc_attr {
    pub size: size3,
    pub mtime: nfstime3,
    pub ctime: nfstime3,
}
DeserializeStruct!(wcc_attr, size, mtime, ctime);
SerializeStruct!(wcc_attr, size, mtime, ctime);

/// `union pre_op_attr switch (bool attributes_follow)` is an XDR optional.
pub type pre_op_attr = Option<wcc_attr>;
/// `union post_op_attr switch (bool attributes_follow)` is an XDR optional.
pub type post_op_attr = Option<fattr3>;
/// `union post_op_fh3 switch (bool handle_follows)` is an XDR optional.
pub type post_op_fh3 = Option<nfs_fh3>;

/// Attributes before and after a modifying call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct wcc_data {
    pub before: pre_op_attr,
    pub after: post_op_attr,
}
DeserializeStruct!(wcc_data, before, after);
SerializeStruct!(wcc_data, before, after);

pub type set_mode3 = Option<mode3>;
pub type set_uid3 = Option<uid3>;
pub type set_gid3 = Option<gid3>;
pub type set_size3 = Option<size3>;

/// `time_how` union used for both atime and mtime in [`sattr3`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum set_time {
    #[default]
    DONT_CHANGE,
    SET_TO_SERVER_TIME,
    SET_TO_CLIENT_TIME(nfstime3),
}

impl Serialize for set_time {
    fn serialize<W: Write>(&self, dest: &mut W) -> std::io::Result<()> {
        match self {
            set_time::DONT_CHANGE => 0_u32.serialize(dest),
            set_time::SET_TO_SERVER_TIME => 1_u32.serialize(dest),
            set_time::SET_TO_CLIENT_TIME(v) => {
                2_u32.serialize(dest)?;
                v.serialize(dest)
            }
        }
    }
}

impl Deserialize for set_time {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> std::io::Result<()> {
        match deserialize::<u32>(src)? {
            0 => *self = set_time::DONT_CHANGE,
            1 => *self = set_time::SET_TO_SERVER_TIME,
            2 => *self = set_time::SET_TO_CLIENT_TIME(deserialize(src)?),
            c => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Invalid time_how value: {c}"),
                ));
            }
        }

        Ok(())
    }
}

/// Attributes to set on create. Every field defaults to "leave alone".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct sattr3 {
    pub mode: set_mode3,
    pub uid: set_uid3,
    pub gid: set_gid3,
    pub size: set_size3,
    pub atime: set_time,
    pub mtime: set_time,
}
DeserializeStruct!(sattr3, mode, uid, gid, size, atime, mtime);
SerializeStruct!(sattr3, mode, uid, gid, size, atime, mtime);

/// A name within a directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct diropargs3 {
    pub dir: nfs_fh3,
    pub name: filename3,
}
DeserializeStruct!(diropargs3, dir, name);
SerializeStruct!(diropargs3, dir, name);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_op_attr_encodes_as_optional() {
        let mut buf = Vec::new();
        let none: post_op_attr = None;
        none.serialize(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 0]);

        buf.clear();
        let attr: post_op_attr = Some(fattr3 { size: 42, ..Default::default() });
        attr.serialize(&mut buf).unwrap();
        // discriminant + 84 bytes of fattr3
        assert_eq!(buf.len(), 4 + 84);
        let decoded = deserialize::<post_op_attr>(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded.map(|a| a.size), Some(42));
    }

    #[test]
    fn handle_displays_as_hex() {
        let fh = nfs_fh3::from(vec![0x01, 0xab, 0x00]);
        assert_eq!(fh.to_string(), "01ab00");
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut src: &[u8] = &[0, 0, 0, 3];
        assert!(deserialize::<nfsstat3>(&mut src).is_err());
    }
}
