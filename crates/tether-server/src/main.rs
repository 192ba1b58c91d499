//! tether-server: serves a server-side shell to WebSocket clients.
//!
//! One session per connection: accept, spawn a shell on a fresh PTY,
//! bridge the two, and clean both endpoints up when the bridge returns.

mod ws;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tokio_util::sync::CancellationToken;

use tether_bridge::{Bridge, BridgeOptions, FileErrorPolicy};
use tether_pty::PtySlave;

use crate::ws::WsMaster;

/// Initial PTY geometry until the client negotiates its own.
const DEFAULT_COLUMNS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;

#[derive(Parser)]
#[command(
    name = "tether-server",
    about = "Bridge a server-side shell to WebSocket clients"
)]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 9000)]
    port: u16,

    /// Allow clients to type, resize, and mutate files.
    #[arg(long)]
    permit_write: bool,

    /// Fix terminal columns (0 lets the client negotiate).
    #[arg(long, default_value_t = 0)]
    columns: u16,

    /// Fix terminal rows (0 lets the client negotiate).
    #[arg(long, default_value_t = 0)]
    rows: u16,

    /// Directory served as the snapshot root.
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Keep sessions alive when a remote file operation fails.
    #[arg(long)]
    tolerate_file_errors: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tether_server=info".into()),
        )
        .init();

    let args = Arc::new(Args::parse());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind listener");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, permit_write = args.permit_write, "tether-server listening");

    let root_token = CancellationToken::new();
    {
        let token = root_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                token.cancel();
            }
        });
    }

    loop {
        let (stream, peer) = tokio::select! {
            _ = root_token.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::warn!(error = %err, "tcp accept error");
                    continue;
                }
            },
        };

        let args = args.clone();
        let token = root_token.child_token();
        tokio::spawn(async move {
            let socket = match accept_async(stream).await {
                Ok(socket) => socket,
                Err(err) => {
                    tracing::warn!(%peer, error = %err, "websocket handshake failed");
                    return;
                }
            };
            serve_session(socket, peer, &args, token).await;
        });
    }

    tracing::info!("tether-server stopped");
}

/// Wire one connection to one fresh shell and run the bridge between
/// them. The bridge leaves both endpoints open, so closing them here is
/// what unblocks its remaining relay loop.
async fn serve_session(
    socket: tokio_tungstenite::WebSocketStream<TcpStream>,
    peer: SocketAddr,
    args: &Args,
    cancel: CancellationToken,
) {
    let columns = if args.columns != 0 { args.columns } else { DEFAULT_COLUMNS };
    let rows = if args.rows != 0 { args.rows } else { DEFAULT_ROWS };

    let slave = match PtySlave::spawn(columns, rows) {
        Ok(slave) => Arc::new(slave),
        Err(err) => {
            tracing::error!(%peer, error = %err, "failed to spawn shell pty");
            return;
        }
    };

    let master = Arc::new(WsMaster::new(socket));
    let bridge = Bridge::new(
        master.clone(),
        slave.clone(),
        BridgeOptions {
            permit_write: args.permit_write,
            columns: args.columns,
            rows: args.rows,
            root: args.workdir.clone(),
            file_errors: if args.tolerate_file_errors {
                FileErrorPolicy::Report
            } else {
                FileErrorPolicy::Fatal
            },
            ..BridgeOptions::default()
        },
    );

    tracing::info!(%peer, "session started");
    match bridge.run(cancel).await {
        Ok(()) => tracing::info!(%peer, "session finished"),
        Err(reason) => tracing::info!(%peer, %reason, "session closed"),
    }

    master.close().await;
    slave.kill();
    slave.wait();
}
