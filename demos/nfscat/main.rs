use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use nfs_mamont_client::{mount, Credentials, Session, TcpTransport};

const NFS_PORT: u16 = 2049;
const TIMEOUT: Duration = Duration::from_secs(30);

struct Args {
    host: String,
    export: String,
    path: String,
    nfs_port: u16,
    mount_port: u16,
    write: bool,
}

fn usage() -> ! {
    eprintln!(
        "Usage: nfscat [--nfs-port PORT] --mount-port PORT [--write] <HOST> <EXPORT> <PATH>\n\
         \n\
         Copies PATH on the export to stdout, or writes stdin into PATH with --write.\n\
         \n\
         Options:\n\
           --nfs-port PORT    NFS service port (default 2049)\n\
           --mount-port PORT  MOUNT service port\n\
           --write            Write stdin into PATH from offset 0, creating it if needed\n\
           -h, --help         Show this help and exit"
    );
    std::process::exit(2);
}

fn parse_args() -> anyhow::Result<Args> {
    let mut nfs_port = NFS_PORT;
    let mut mount_port = None;
    let mut write = false;
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--nfs-port" => {
                let value = args.next().context("--nfs-port needs a value")?;
                nfs_port = value.parse().context("invalid --nfs-port")?;
            }
            "--mount-port" => {
                let value = args.next().context("--mount-port needs a value")?;
                mount_port = Some(value.parse().context("invalid --mount-port")?);
            }
            "--write" => write = true,
            "--help" | "-h" => usage(),
            _ if arg.starts_with('-') => bail!("unknown flag: {arg}"),
            _ => positional.push(arg),
        }
    }
    let Some(mount_port) = mount_port else {
        usage();
    };
    let [host, export, path]: [String; 3] = match positional.try_into() {
        Ok(p) => p,
        Err(_) => usage(),
    };
    Ok(Args { host, export, path, nfs_port, mount_port, write })
}

/// Reads or writes one file on an NFS version 3 export.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let credentials = Credentials::unix("nfscat", 0, 0, &[])?;

    let mountd = TcpTransport::connect((args.host.as_str(), args.mount_port))
        .await
        .context("connecting to mountd")?
        .with_timeout(TIMEOUT);
    let root = mount::mount(&mountd, &credentials, &args.export).await?;

    let nfsd = TcpTransport::connect((args.host.as_str(), args.nfs_port))
        .await
        .context("connecting to nfsd")?
        .with_timeout(TIMEOUT);
    let session = Session::connect(Arc::new(nfsd), credentials.clone(), root).await?;

    if args.write {
        let mut file = session.open_file(&args.path, 0o644).await?;
        let mut input = Vec::new();
        tokio::io::stdin().read_to_end(&mut input).await?;
        let written = file.write(&input).await?;
        file.close().await?;
        eprintln!("wrote {written} bytes to {}", args.path);
    } else {
        let mut file = session.open(&args.path).await?;
        let mut stdout = tokio::io::stdout();
        let mut buf = vec![0_u8; session.limits().read_size() as usize];
        loop {
            let outcome = file.read(&mut buf).await?;
            stdout.write_all(&buf[..outcome.count]).await?;
            if outcome.eof {
                break;
            }
            if outcome.count == 0 {
                bail!("server returned no data before end of file");
            }
        }
        stdout.flush().await?;
    }

    mount::unmount(&mountd, &credentials, &args.export).await?;
    Ok(())
}
