//! Waveform HTTP server binary.
//!
//! Serves the login flow, the story proxy and link previews. Configuration
//! comes from the environment (and `.env`); see `ApiConfig::from_env`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use waveform_api::config::ApiConfig;
use waveform_core::transport::ReqwestTransport;

/// How often expired link previews are evicted.
const PREVIEW_CLEANUP_EVERY: Duration = Duration::from_secs(600);

/// CLI arguments for the server. Flags override the environment.
#[derive(Parser, Debug)]
#[command(name = "waveform_server", about = "Waveform news server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Public origin used for OAuth redirect and logout URIs.
    #[arg(long, env = "WAVEFORM_PUBLIC_ORIGIN")]
    public_origin: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,waveform_api=debug,waveform_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(origin) = args.public_origin {
        config.set_public_origin(&origin)?;
    }

    info!(
        bind_addr = %config.bind_addr,
        public_origin = %config.public_origin,
        api_key_configured = config.api_key.is_some(),
        client_secret_configured = config.identity.client_secret.is_some(),
        "starting waveform_server"
    );

    let transport = Arc::new(ReqwestTransport::new(config.http_timeout)?);
    let bind_addr = config.bind_addr.clone();
    let state = waveform_api::AppState::new(config, transport);
    let cleanup = state.previews.cache().spawn_cleanup_task(PREVIEW_CLEANUP_EVERY);

    let app = waveform_api::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    cleanup.abort();
    Ok(())
}
