use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Admin console for the TaraG travel platform
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides CONSOLE_PORT)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// TaraG backend base URL (overrides API_BASE_URL)
    #[arg(long)]
    api_base_url: Option<String>,
}

mod backend;
mod config;
mod error;
mod firebase;
mod logging;
mod models;
mod notifications;
mod session;
mod web;
mod workflows;

use backend::BackendClient;
use config::ConsoleConfig;
use firebase::FirebaseClient;
use notifications::ConfirmationQueue;
use web::AdminState;
use workflows::Console;

/// How long a pending confirmation stays valid
const CONFIRMATION_TTL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let mut config = ConsoleConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(url) = args.api_base_url.as_deref() {
        config = config.with_api_base_url(url);
    }
    config.validate()?;

    // Create log buffer for the logs page
    let log_buffer = logging::create_log_buffer(config.log_buffer_size);

    // Initialize tracing with our custom layer
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(logging::LogCaptureLayer::new(log_buffer.clone()))
        .init();

    info!("TaraG backend: {}", config.api_base_url);
    if config.alerts_base_url != config.api_base_url {
        info!("Alerts backend: {}", config.alerts_base_url);
    }

    let firebase = match &config.firebase {
        Some(firebase_config) => {
            info!("Firebase project: {}", firebase_config.project_id);
            Some(FirebaseClient::new(firebase_config))
        }
        None => {
            warn!("Firebase not configured, admin activity goes to the REST endpoint only");
            None
        }
    };

    let console = Console::new(Arc::new(BackendClient::new(&config)), firebase);
    let state = AdminState {
        console: Arc::new(console),
        session_store: session::create_session_store(),
        confirmations: Arc::new(ConfirmationQueue::new(CONFIRMATION_TTL)),
        log_buffer,
        session_ttl_secs: config.session_ttl_secs,
    };

    web::start_server(&config, state).await
}
