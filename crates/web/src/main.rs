use std::net::SocketAddr;

use tracing::{info, warn};

use tienda_web::server::{WebServer, WebServerConfig};
use tienda_web::auth::JwtConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let web_addr: SocketAddr = std::env::var("TIENDA_WEB_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let db_path = std::env::var("TIENDA_DB_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| tienda_common::default_db_path());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = tienda_common::Database::open(&db_path)?;

    // JWT secret: from env, or an ephemeral one generated at startup. Tokens
    // issued under an ephemeral secret do not survive a restart.
    let secret = match std::env::var("TIENDA_JWT_SECRET") {
        Ok(secret) if !secret.trim().is_empty() => secret,
        _ => {
            let secret = hex::encode(rand::random::<[u8; 32]>());
            warn!("TIENDA_JWT_SECRET not set; using an ephemeral signing secret");
            secret
        }
    };

    let cfg = WebServerConfig {
        jwt: JwtConfig { secret },
    };

    info!("Starting Tienda storefront API on http://{} (db: {})", web_addr, db_path.display());

    WebServer::new(db, cfg).serve(web_addr).await
}
