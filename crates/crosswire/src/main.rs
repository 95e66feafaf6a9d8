//! Launcher binary: `crosswire <port>`.
//!
//! Thin by design — argument handling, logging setup, and optional
//! config file, then hand off to [`CrosswireServer`]. The config file
//! path comes from `CROSSWIRE_CONFIG`; the port argument overrides the
//! file's bind address.

use crosswire::{CrosswireServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match std::env::var_os("CROSSWIRE_CONFIG") {
        Some(path) => ServerConfig::from_json_file(path)?,
        None => ServerConfig::default(),
    };

    let mut args = std::env::args().skip(1);
    match (args.next(), args.next()) {
        (Some(port), None) => {
            let port: u16 = match port.parse() {
                Ok(port) => port,
                Err(_) => {
                    eprintln!("Usage: crosswire <port>");
                    std::process::exit(1);
                }
            };
            config.bind = format!("0.0.0.0:{port}");
        }
        (None, None) => {}
        _ => {
            eprintln!("Usage: crosswire <port>");
            std::process::exit(1);
        }
    }

    let server = CrosswireServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");
    server.run().await?;
    Ok(())
}
