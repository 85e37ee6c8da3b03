//! MOUNT version 3 client: turns an export path into the root file handle.

use std::io::Cursor;

use num_traits::ToPrimitive;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::rpc::{call_header, Credentials, Request, Transport};
use crate::protocol::xdr::{self, mount, nfs3};

fn mount_request(
    proc: mount::MountProgram,
    credentials: &Credentials,
    export: &str,
) -> Result<Request> {
    if export.len() > mount::MNTPATHLEN as usize {
        return Err(Error::InvalidArgument("export path longer than MNTPATHLEN"));
    }
    let proc = proc.to_u32().unwrap_or_default();
    let header = call_header(mount::PROGRAM, mount::VERSION, proc, credentials);
    let path: mount::dirpath = export.as_bytes().to_vec();
    Request::new(header, &path)
}

/// Issues `MNT` for `export` and returns the root handle of the export.
///
/// `transport` must be connected to the MOUNT service (`mountd`), which is
/// often a different port than the NFS service.
pub async fn mount(
    transport: &dyn Transport,
    credentials: &Credentials,
    export: &str,
) -> Result<nfs3::nfs_fh3> {
    let request = mount_request(mount::MountProgram::MOUNTPROC3_MNT, credentials, export)?;
    let mut results = Cursor::new(transport.call(request).await?);

    let stat = xdr::deserialize::<mount::mountstat3>(&mut results).map_err(Error::Decode)?;
    if stat != mount::mountstat3::MNT3_OK {
        warn!("mount of {:?} refused: {:?}", export, stat);
        return Err(Error::Mount(stat));
    }
    let ok = xdr::deserialize::<mount::mountres3_ok>(&mut results).map_err(Error::Decode)?;
    let fh = nfs3::nfs_fh3::from(ok.fhandle);
    debug!("mounted {:?} root {} auth flavors {:?}", export, fh, ok.auth_flavors);
    Ok(fh)
}

/// Issues `UMNT` so the server drops `export` from its mount list.
pub async fn unmount(
    transport: &dyn Transport,
    credentials: &Credentials,
    export: &str,
) -> Result<()> {
    let request = mount_request(mount::MountProgram::MOUNTPROC3_UMNT, credentials, export)?;
    transport.call(request).await?;
    debug!("unmounted {:?}", export);
    Ok(())
}
