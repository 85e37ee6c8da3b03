//! Arguments and results of GETATTR (1) and FSINFO (19).

// Keep RFC naming for wire structures
#![allow(non_camel_case_types)]

use super::*;

/// The server supports hard links.
pub const FSF_LINK: u32 = 0x0001;
/// The server supports symbolic links.
pub const FSF_SYMLINK: u32 = 0x0002;
/// PATHCONF answers are the same for every object.
pub const FSF_HOMOGENEOUS: u32 = 0x0008;
/// SETATTR can set times.
pub const FSF_CANSETTIME: u32 = 0x0010;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct GETATTR3args {
    pub object: nfs_fh3,
}
DeserializeStruct!(GETATTR3args, object);
SerializeStruct!(GETATTR3args, object);

#[derive(Debug, Default)]
pub struct GETATTR3resok {
    pub obj_attributes: fattr3,
}
DeserializeStruct!(GETATTR3resok, obj_attributes);
SerializeStruct!(GETATTR3resok, obj_attributes);

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FSINFO3args {
    pub fsroot: nfs_fh3,
}
DeserializeStruct!(FSINFO3args, fsroot);
SerializeStruct!(FSINFO3args, fsroot);

/// Static file system information, the source of transfer sizes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct fsinfo3 {
    pub obj_attributes: post_op_attr,
    /// Largest READ the server accepts
    pub rtmax: u32,
    /// Preferred READ size
    pub rtpref: u32,
    /// Suggested READ multiple
    pub rtmult: u32,
    /// Largest WRITE the server accepts
    pub wtmax: u32,
    /// Preferred WRITE size
    pub wtpref: u32,
    /// Suggested WRITE multiple
    pub wtmult: u32,
    /// Preferred READDIR size
    pub dtpref: u32,
    pub maxfilesize: size3,
    pub time_delta: nfstime3,
    /// Bit mask of `FSF_*` flags
    pub properties: u32,
}
DeserializeStruct!(
    fsinfo3,
    obj_attributes,
    rtmax,
    rtpref,
    rtmult,
    wtmax,
    wtpref,
    wtmult,
    dtpref,
    maxfilesize,
    time_delta,
    properties
);
SerializeStruct!(
    fsinfo3,
    obj_attributes,
    rtmax,
    rtpref,
    rtmult,
    wtmax,
    wtpref,
    wtmult,
    dtpref,
    maxfilesize,
    time_delta,
    properties
);
