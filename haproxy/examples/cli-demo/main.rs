/*
A minimal stats-socket demo: binds a TCP port, accepts line-oriented CLI
commands (`set server bk/s1 weight 50`, `get weight bk/s1`, ...) and runs
them against a small in-memory server directory.

This is a socket harness around [`haproxy::Directory::dispatch`], which does
all of the actual parsing and state mutation; nothing here is load-bearing.
*/

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use haproxy::{server::Server, Directory};

#[derive(Debug, Parser)]
#[command(name = "cli-demo", about = "Minimal stats-socket CLI demo")]
struct Opt {
    /// Specify the address to listen on
    #[arg(short, long, default_value = "127.0.0.1")]
    address: String,

    /// Specify the port to listen on
    #[arg(short, long, default_value_t = 9999)]
    port: u16,
}

fn seed_directory() -> Directory {
    let mut dir = Directory::new();

    dir.register("web", Server::new(1, "s1", Ipv4Addr::new(10, 0, 0, 1).into(), 80));
    dir.register("web", Server::new(2, "s2", Ipv4Addr::new(10, 0, 0, 2).into(), 80));

    dir
}

#[tokio::main]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let opt = Opt::parse();
    debug!("opt: {:#?}", opt);

    let directory = Arc::new(Mutex::new(seed_directory()));

    let listener = TcpListener::bind((opt.address.as_str(), opt.port)).await?;

    info!("listening on {}", listener.local_addr()?);

    loop {
        let (stream, peer) = listener.accept().await?;
        let directory = directory.clone();

        debug!("client accepted: {}", peer);

        tokio::spawn(async move {
            if let Err(err) = serve(stream, directory).await {
                warn!("client crashed: {}", err);
            }
        });
    }
}

async fn serve(stream: tokio::net::TcpStream, directory: Arc<Mutex<Directory>>) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }

        let response = directory.lock().unwrap().dispatch(&line);

        write_half.write_all(response.message.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
    }

    Ok(())
}
