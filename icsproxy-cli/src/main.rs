//! icsproxy CLI
//!
//! Runs the caching calendar proxy, or fetches the upstream calendar once.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use icsproxy_api::{ApiConfig, ApiServer};
use icsproxy_core::traits::CalendarSource;
use icsproxy_fetch::HttpSource;

/// icsproxy - caching reverse proxy for a single iCalendar feed
#[derive(Parser)]
#[command(name = "icsproxy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the proxy server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "8000")]
        port: u16,
        /// Bind address
        #[arg(short, long, env = "ICSPROXY_BIND", default_value = "0.0.0.0")]
        bind: String,
    },

    /// Fetch and normalize the upstream calendar once
    Fetch {
        /// Write the calendar here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "icsproxy=debug,info"
    } else {
        "icsproxy=info,warn"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    match cli.command {
        Commands::Serve { port, bind } => cmd_serve(port, &bind).await,
        Commands::Fetch { output } => cmd_fetch(output).await,
    }
}

/// Run the proxy server
async fn cmd_serve(port: u16, bind: &str) -> Result<()> {
    let config = ApiConfig::from_env().context("Refusing to start")?;
    debug!(?config, "Loaded configuration");

    let ip: IpAddr = bind.parse().context("Invalid bind address")?;
    let addr = SocketAddr::new(ip, port);

    let server = ApiServer::new(config).context("Failed to build server")?;
    server.run(addr).await.context("Server error")?;

    Ok(())
}

/// Fetch the upstream calendar once and print or save it
async fn cmd_fetch(output: Option<PathBuf>) -> Result<()> {
    let config = ApiConfig::from_env().context("Invalid configuration")?;
    let source = HttpSource::with_config(config.fetch_config())?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid spinner template")?,
    );
    spinner.set_message(format!("Fetching {}", source.url()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = source.fetch().await;
    spinner.finish_and_clear();
    let calendar = result.context("Failed to fetch upstream calendar")?;

    match output {
        Some(path) => {
            std::fs::write(&path, calendar.body())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "✅ Calendar saved to:".green(), path.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(calendar.body())
                .context("Failed to write calendar to stdout")?;
        }
    }

    eprintln!("   {} {} bytes", "Size:".dimmed(), calendar.len());
    eprintln!("   {} \"{}\"", "ETag:".dimmed(), calendar.validator());
    if let Some(last_modified) = calendar.last_modified() {
        eprintln!("   {} {}", "Last-Modified:".dimmed(), last_modified);
    }

    Ok(())
}
