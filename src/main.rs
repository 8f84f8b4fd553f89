//! Status Page Binary

use clap::{Parser, Subcommand};
use status_page::render::{RenderOptions, Renderer};
use status_page::server::{AppState, run_server};
use status_page::source::source_from_config;
use status_page::{Config, Result, StatusPageError, Theme, ViewState};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "status-page", version, about = "Service status dashboard")]
struct Cli {
    /// Base URL of the status API
    #[arg(long, env = "STATUS_API_BASE", global = true)]
    api_base: Option<String>,

    /// Directory of pre-generated status_N.json files
    #[arg(long, env = "STATUS_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the live dashboard
    Serve {
        #[arg(long, env = "BIND_ADDRESS")]
        bind: Option<String>,
    },
    /// Render a single static page
    Render {
        /// Day range to render
        #[arg(long)]
        days: Option<u32>,

        /// Write the page here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[arg(long)]
        dark: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    initialize_tracing();

    info!("Starting status page v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env();
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = Some(data_dir);
    }
    if let Command::Serve { bind: Some(bind) } = &cli.command {
        config.bind_address = bind.clone();
    }

    if let Err(e) = config.validate() {
        error!("{}", StatusPageError::Config(e));
        std::process::exit(1);
    }

    info!(
        "Status page configuration - Default range: {} days, Ranges: {:?}, Refresh: {}s",
        config.default_days,
        config.range_options,
        config.refresh_interval.as_secs()
    );

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::Render { days, output, dark } => {
            let days = days.unwrap_or(config.default_days);
            let theme = if dark { Theme::Dark } else { Theme::Light };
            render_once(config, days, theme, output).await
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    let source = source_from_config(&config)?;
    let state = AppState::new(config, source);

    if let Err(e) = run_server(state).await {
        error!("Server failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Fetch one range and write a page without controls or reloads.
async fn render_once(config: Config, days: u32, theme: Theme, output: Option<PathBuf>) -> Result<()> {
    let source = source_from_config(&config)?;

    let view = match source.fetch(days).await {
        Ok(snapshot) => ViewState::Loaded {
            snapshot,
            fetched_at: chrono::Utc::now(),
        },
        Err(e) => {
            error!("Failed to load status for {} days: {}", days, e);
            ViewState::Failed {
                message: e.to_string(),
            }
        }
    };

    let renderer = Renderer::new(RenderOptions {
        interactive: false,
        reload_after_secs: None,
        ..RenderOptions::from(&config)
    });
    let html = renderer.render_page(&view, days, theme, &chrono::Local::now());

    match output {
        Some(path) => {
            tokio::fs::write(&path, html).await?;
            info!("Wrote status page to {}", path.display());
        }
        None => println!("{}", html),
    }

    Ok(())
}

/// Initialize structured logging
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
