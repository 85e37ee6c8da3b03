//! Arguments and results of the procedures that move file data:
//! READ (6), WRITE (7), COMMIT (21) and READLINK (5).
//!
//! Results here are the `resok` arm only. The leading `nfsstat3` is
//! decoded separately and the `resfail` arm is never read, since the
//! status alone is what gets reported.

// Keep RFC naming for wire structures
#![allow(non_camel_case_types)]

use num_derive::{FromPrimitive, ToPrimitive};

use super::*;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct READ3args {
    pub file: nfs_fh3,
    pub offset: offset3,
    pub count: count3,
}
DeserializeStruct!(READ3args, file, offset, count);
SerializeStruct!(READ3args, file, offset, count);

#[derive(Debug, Default)]
pub struct READ3resok {
    pub file_attributes: post_op_attr,
    /// Bytes actually returned
    pub count: count3,
    /// The read reached the end of the file
    pub eof: bool,
    pub data: Vec<u8>,
}
DeserializeStruct!(READ3resok, file_attributes, count, eof, data);
SerializeStruct!(READ3resok, file_attributes, count, eof, data);

/// How durably the server must store data before replying.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, ToPrimitive)]
#[repr(u32)]
pub enum stable_how {
    /// May be cached; needs a COMMIT to be durable
    #[default]
    UNSTABLE = 0,
    /// File data is on stable storage, metadata may not be
    DATA_SYNC = 1,
    /// File data and metadata are on stable storage
    FILE_SYNC = 2,
}
impl SerializeEnum for stable_how {}
impl DeserializeEnum for stable_how {}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct WRITE3args {
    pub file: nfs_fh3,
    pub offset: offset3,
    pub count: count3,
    pub stable: stable_how,
    pub data: Vec<u8>,
}
DeserializeStruct!(WRITE3args, file, offset, count, stable, data);
SerializeStruct!(WRITE3args, file, offset, count, stable, data);

#[derive(Debug, Default)]
pub struct WRITE3resok {
    pub file_wcc: wcc_data,
    /// Bytes the server accepted, possibly fewer than sent
    pub count: count3,
    /// Stability level the server actually used
    pub committed: stable_how,
    pub verf: writeverf3,
}
DeserializeStruct!(WRITE3resok, file_wcc, count, committed, verf);
SerializeStruct!(WRITE3resok, file_wcc, count, committed, verf);

/// `offset == 0` and `count == 0` ask the server to flush the whole file.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct COMMIT3args {
    pub file: nfs_fh3,
    pub offset: offset3,
    pub count: count3,
}
DeserializeStruct!(COMMIT3args, file, offset, count);
SerializeStruct!(COMMIT3args, file, offset, count);

#[derive(Debug, Default)]
pub struct COMMIT3resok {
    pub file_wcc: wcc_data,
    pub verf: writeverf3,
}
DeserializeStruct!(COMMIT3resok, file_wcc, verf);
SerializeStruct!(COMMIT3resok, file_wcc, verf);

#[derive(Debug, Default, PartialEq, Eq)]
pub struct READLINK3args {
    pub symlink: nfs_fh3,
}
DeserializeStruct!(READLINK3args, symlink);
SerializeStruct!(READLINK3args, symlink);

#[derive(Debug, Default)]
pub struct READLINK3resok {
    pub symlink_attributes: post_op_attr,
    pub data: nfspath3,
}
DeserializeStruct!(READLINK3resok, symlink_attributes, data);
SerializeStruct!(READLINK3resok, symlink_attributes, data);
