use std::io;

use clearslot_service::ClearslotServer;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    let filter =
        EnvFilter::try_from_env("CLEARSLOT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the stdio transport
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let server = match ClearslotServer::from_env() {
        Ok(server) => server,
        Err(err) => {
            error!(error = %err, "clearslotd failed to start");
            return Err(io::Error::new(io::ErrorKind::InvalidInput, err.to_string()));
        }
    };

    let mode = std::env::var("CLEARSLOT_TRANSPORT").unwrap_or_else(|_| "stdio".to_string());
    match mode.as_str() {
        "stdio" => server.serve_stdio(),
        "http" => {
            let addr = std::env::var("CLEARSLOT_HTTP_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8788".to_string());
            server.serve_http(&addr)
        }
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "CLEARSLOT_TRANSPORT must be stdio or http",
        )),
    }
}
