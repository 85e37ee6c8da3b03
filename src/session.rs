//! State shared by every file of one mounted export, and the directory
//! operations that produce file handles.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::file::NfsFile;
use crate::limits::TransferLimits;
use crate::protocol::rpc::{check_status, nfs3_call_header, Credentials, Request, Transport};
use crate::protocol::xdr::{self, nfs3, Deserialize, Serialize};

/// One mounted export.
///
/// Holds the transport, the credentials attached to every call, the root
/// handle and the negotiated [`TransferLimits`]. All of it is immutable, so
/// a session is shared behind an [`Arc`] by any number of [`NfsFile`]s,
/// including ones used from different tasks.
pub struct Session {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    root: nfs3::nfs_fh3,
    limits: TransferLimits,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.credentials.flavor())
            .field("root", &self.root)
            .field("limits", &self.limits)
            .finish()
    }
}

/// Decodes procedure results, mapping codec failures to [`Error::Decode`].
pub(crate) fn decode<T: Deserialize + Default>(results: &mut Cursor<Vec<u8>>) -> Result<T> {
    xdr::deserialize::<T>(results).map_err(Error::Decode)
}

fn path_components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty() && *c != ".")
}

impl Session {
    /// Starts a session on the export whose root handle is `root`, reading
    /// the transfer sizes from FSINFO.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        root: nfs3::nfs_fh3,
    ) -> Result<Arc<Session>> {
        let mut session =
            Session { transport, credentials, root, limits: TransferLimits::default() };
        let info = session.fsinfo(&session.root).await?;
        session.limits = TransferLimits::from_fsinfo(&info);
        info!("session on root {} ready, {:?}", session.root, session.limits);
        Ok(Arc::new(session))
    }

    /// Starts a session with known transfer sizes, without calling FSINFO.
    pub fn with_limits(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        root: nfs3::nfs_fh3,
        limits: TransferLimits,
    ) -> Arc<Session> {
        Arc::new(Session { transport, credentials, root, limits })
    }

    pub fn root(&self) -> &nfs3::nfs_fh3 {
        &self.root
    }

    pub fn limits(&self) -> TransferLimits {
        self.limits
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Issues one NFS call and returns its results positioned after a
    /// successful status.
    pub(crate) async fn call<A>(
        &self,
        proc: nfs3::NFSProgram,
        args: &A,
    ) -> Result<Cursor<Vec<u8>>>
    where
        A: Serialize + Sync,
    {
        let request = Request::new(nfs3_call_header(proc, &self.credentials), args)?;
        let mut results = Cursor::new(self.transport.call(request).await?);
        check_status(&mut results)?;
        Ok(results)
    }

    pub async fn fsinfo(&self, fh: &nfs3::nfs_fh3) -> Result<nfs3::fs::fsinfo3> {
        let args = nfs3::fs::FSINFO3args { fsroot: fh.clone() };
        let mut results = self.call(nfs3::NFSProgram::NFSPROC3_FSINFO, &args).await?;
        decode(&mut results)
    }

    pub async fn getattr(&self, fh: &nfs3::nfs_fh3) -> Result<nfs3::fattr3> {
        let args = nfs3::fs::GETATTR3args { object: fh.clone() };
        let mut results = self.call(nfs3::NFSProgram::NFSPROC3_GETATTR, &args).await?;
        Ok(decode::<nfs3::fs::GETATTR3resok>(&mut results)?.obj_attributes)
    }

    /// Looks up `name` in directory `dir`.
    ///
    /// A missing entry fails with `Error::Status(NFS3ERR_NOENT)`, see
    /// [`Error::is_not_found`].
    pub async fn lookup(
        &self,
        dir: &nfs3::nfs_fh3,
        name: &str,
    ) -> Result<(nfs3::nfs_fh3, nfs3::post_op_attr)> {
        let args = nfs3::dir::LOOKUP3args {
            what: nfs3::diropargs3 { dir: dir.clone(), name: name.into() },
        };
        let mut results = self.call(nfs3::NFSProgram::NFSPROC3_LOOKUP, &args).await?;
        let res = decode::<nfs3::dir::LOOKUP3resok>(&mut results)?;
        debug!("lookup {} in {} -> {}", name, dir, res.object);
        Ok((res.object, res.obj_attributes))
    }

    /// Walks `path` from the root with one LOOKUP per component.
    pub async fn resolve(&self, path: &str) -> Result<(nfs3::nfs_fh3, nfs3::post_op_attr)> {
        let mut fh = self.root.clone();
        let mut attr = None;
        for name in path_components(path) {
            (fh, attr) = self.lookup(&fh, name).await?;
        }
        Ok((fh, attr))
    }

    /// Resolves the directory containing `path` and returns it with the
    /// final component.
    pub async fn resolve_parent<'a>(&self, path: &'a str) -> Result<(nfs3::nfs_fh3, &'a str)> {
        let mut components: Vec<&str> = path_components(path).collect();
        let Some(name) = components.pop() else {
            return Err(Error::InvalidArgument("path has no final component"));
        };
        let mut dir = self.root.clone();
        for component in components {
            dir = self.lookup(&dir, component).await?.0;
        }
        Ok((dir, name))
    }

    /// Creates a regular file at `path` with permission bits `mode`.
    ///
    /// The create is UNCHECKED and sets only the mode, so an existing file
    /// is returned as it is: its size and contents are left alone.
    pub async fn create(
        &self,
        path: &str,
        mode: nfs3::mode3,
    ) -> Result<(nfs3::nfs_fh3, nfs3::post_op_attr)> {
        let (dir, name) = self.resolve_parent(path).await?;
        let attr = nfs3::sattr3 { mode: Some(mode), ..Default::default() };
        let args = nfs3::dir::CREATE3args {
            dirops: nfs3::diropargs3 { dir: dir.clone(), name: name.into() },
            how: nfs3::dir::createhow3::UNCHECKED(attr),
        };
        let mut results = self.call(nfs3::NFSProgram::NFSPROC3_CREATE, &args).await?;
        let res = decode::<nfs3::dir::CREATE3resok>(&mut results)?;
        match res.obj {
            Some(fh) => {
                debug!("created {} mode {:o} -> {}", path, mode, fh);
                Ok((fh, res.obj_attributes))
            }
            // the server may omit the handle, it is then found by name
            None => self.lookup(&dir, name).await,
        }
    }

    /// Opens an existing file.
    pub async fn open(self: &Arc<Self>, path: &str) -> Result<NfsFile> {
        let (fh, attr) = self.resolve(path).await?;
        Ok(NfsFile::new(self.clone(), fh, attr))
    }

    /// Opens `path`, creating it with `mode` if it does not exist.
    ///
    /// Only a not-found failure leads to a create; any other failure of the
    /// lookup is returned as is.
    pub async fn open_file(self: &Arc<Self>, path: &str, mode: nfs3::mode3) -> Result<NfsFile> {
        match self.open(path).await {
            Err(err) if err.is_not_found() => {
                debug!("{} not found, creating", path);
                let (fh, attr) = self.create(path, mode).await?;
                Ok(NfsFile::new(self.clone(), fh, attr))
            }
            other => other,
        }
    }

    /// Wraps a handle obtained elsewhere. Nothing is sent to the server.
    pub fn open_by_fh(self: &Arc<Self>, fh: nfs3::nfs_fh3, attr: Option<nfs3::fattr3>) -> NfsFile {
        NfsFile::new(self.clone(), fh, attr)
    }

    /// Creates a symbolic link at `link_path` pointing to `target`.
    pub async fn symlink(self: &Arc<Self>, target: &str, link_path: &str) -> Result<NfsFile> {
        let (dir, name) = self.resolve_parent(link_path).await?;
        let args = nfs3::dir::SYMLINK3args {
            dirops: nfs3::diropargs3 { dir, name: name.into() },
            symlink: nfs3::dir::symlinkdata3 {
                symlink_attributes: nfs3::sattr3::default(),
                symlink_data: target.into(),
            },
        };
        let mut results = self.call(nfs3::NFSProgram::NFSPROC3_SYMLINK, &args).await?;
        let res = decode::<nfs3::dir::SYMLINK3resok>(&mut results)?;
        let Some(fh) = res.obj else {
            return Err(Error::Protocol(format!(
                "SYMLINK {link_path} succeeded without returning a handle"
            )));
        };
        debug!("symlink {} -> {} created as {}", link_path, target, fh);
        Ok(NfsFile::new(self.clone(), fh, res.obj_attributes))
    }
}
