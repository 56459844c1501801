use clap::Parser;
use nim_proxy::config::config_search_paths;
use nim_proxy::{build_router, AppState, ProxyConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "nim-proxy",
    about = "OpenAI-compatible chat completion proxy for NVIDIA NIM",
    version
)]
struct Cli {
    /// Path to config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print config search paths and exit
    #[arg(long)]
    show_config_paths: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nim_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.show_config_paths {
        println!("Config search paths:");
        for (i, path) in config_search_paths().iter().enumerate() {
            println!("  {}. {}", i + 1, path.display());
        }
        println!("  (built-in defaults when none exist)");
        return Ok(());
    }

    let mut config = ProxyConfig::find_and_load(cli.config.as_deref())?;
    config.apply_env_overrides();
    if let Some(port) = cli.port {
        config.port = port;
    }

    if config.resolve_api_key().is_none() {
        warn!(
            "{} is not set; upstream calls will be rejected",
            config.upstream.api_key_env
        );
    }

    info!("nim-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("  Upstream:  {}", config.chat_completions_url());
    info!("  Port:      {}", config.port);
    info!("  Models:    {} mapped", config.models.len());
    info!(
        "  Reasoning: {}",
        if config.show_reasoning { "enabled" } else { "disabled" }
    );

    let mut client = reqwest::Client::builder();
    if let Some(secs) = config.upstream.timeout_secs {
        client = client.timeout(Duration::from_secs(secs));
    }
    let client = client.build()?;

    let port = config.port;
    let state = Arc::new(AppState::new(config, client));

    let app = build_router(state);
    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Proxy running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
