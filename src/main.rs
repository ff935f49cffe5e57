//! CLI entry point for the MBTA accessibility tracker.
//!
//! Serves the map dashboard, prints status summaries and station briefings,
//! and records per-station snapshots for historical tracking.

mod explore;

use access_tracker::{
    config::Config,
    mbta::MbtaClient,
    output::{append_snapshot, render_json, render_status, render_station},
    reconcile::reconcile_snapshot,
    report::{self, OllamaClient, TextGenerator},
    server::{AppState, start_web_server},
};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "access_tracker")]
#[command(about = "MBTA elevator and escalator accessibility tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the map dashboard
    Serve {
        /// Address to listen on (overrides BIND_ADDR)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },
    /// Print system status and current outages
    Status {
        /// Print the full reconciled view as JSON instead
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print a generated accessibility briefing for one station
    Report {
        /// Station id (e.g. place-pktrm) or name
        #[arg(value_name = "STATION")]
        station: String,
    },
    /// Browse stations interactively from the terminal
    Explore,
    /// Append one CSV row per station to a history file
    Snapshot {
        /// CSV file to append to
        #[arg(short, long, default_value = "snapshots.csv")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/access_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("access_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    info!(base_url = %config.api.base_url, authenticated = config.api.api_key.is_some(), "Configuration loaded");

    let mbta = Arc::new(MbtaClient::from_config(&config.api)?);

    match cli.command {
        Commands::Serve { bind } => {
            let reports = report_generator(&config)?;
            let addr = bind.unwrap_or(config.bind_addr);
            start_web_server(AppState { mbta, reports }, addr).await?;
        }
        Commands::Status { json } => {
            let snapshot = mbta
                .fetch_snapshot()
                .await
                .context("no data: check MBTA_API_KEY and your network connection")?;
            let view = reconcile_snapshot(&snapshot);
            if json {
                println!("{}", render_json(&view)?);
            } else {
                print!("{}", render_status(&view));
            }
        }
        Commands::Report { station } => {
            let reports = report_generator(&config)?;
            let snapshot = mbta
                .fetch_snapshot()
                .await
                .context("no data: check MBTA_API_KEY and your network connection")?;
            let view = reconcile_snapshot(&snapshot);
            let Some(found) = view.find_station(&station) else {
                bail!("no station matches '{station}'");
            };
            print!("{}", render_station(&view, found, Utc::now()));
            let outcome = report::station_report(mbta.as_ref(), reports.as_ref(), &view, found).await;
            println!("\n{}", outcome.display_text());
        }
        Commands::Explore => {
            let reports = report_generator(&config)?;
            explore::run(mbta, reports).await?;
        }
        Commands::Snapshot { output } => {
            let snapshot = mbta
                .fetch_snapshot()
                .await
                .context("no data: check MBTA_API_KEY and your network connection")?;
            let view = reconcile_snapshot(&snapshot);
            let rows = append_snapshot(&output, &view, Utc::now())?;
            info!(rows, output = %output, "Snapshot recorded");
        }
    }

    Ok(())
}

fn report_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let client = OllamaClient::from_config(&config.report).context("building report client")?;
    info!(endpoint = %config.report.endpoint, model = %config.report.model, "Report generator configured");
    Ok(Arc::new(client))
}
