use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stratascribe::config::AppConfig;
use stratascribe::fetch::{FetcherConfig, HttpSource};
use stratascribe::matching::Reconciler;
use stratascribe::models::ProcessingOptions;
use stratascribe::roster;
use stratascribe::service::{generate_report, ForceSummary, ReportService};
use stratascribe::storage::{DatasetStore, RefreshPolicy, UploadStore};

#[derive(Parser)]
#[command(name = "stratascribe")]
#[command(about = "Warhammer 40k roster stratagem reporter")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./stratascribe.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the stratagem report for a roster as JSON
    Report {
        /// Roster file (.ros or .rosz)
        roster: PathBuf,

        #[command(flatten)]
        flags: ReportFlags,
    },

    /// Show how each force of a roster was resolved
    Inspect {
        /// Roster file (.ros or .rosz)
        roster: PathBuf,
    },

    /// Refresh the cached reference dataset
    Update {
        /// Re-fetch every table regardless of the update marker
        #[arg(long)]
        force: bool,
    },

    /// Start the API server
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
struct ReportFlags {
    /// Number units and tag phase entries with unit numbers
    #[arg(long)]
    show_units: bool,

    /// Tag unit entries with phase initials
    #[arg(long)]
    show_phases: bool,

    /// Include faction rules not linked to any unit
    #[arg(long)]
    show_empty: bool,

    /// Include core stratagems
    #[arg(long)]
    show_core: bool,

    /// Never include army of renown stratagems
    #[arg(long)]
    dont_show_renown: bool,

    /// Drop before-battle stratagems
    #[arg(long)]
    dont_show_before: bool,
}

impl From<ReportFlags> for ProcessingOptions {
    fn from(flags: ReportFlags) -> Self {
        Self {
            show_units: flags.show_units,
            show_phases: flags.show_phases,
            show_empty: flags.show_empty,
            show_core: flags.show_core,
            dont_show_renown: flags.dont_show_renown,
            dont_show_before: flags.dont_show_before,
        }
    }
}

fn build_service(config: &AppConfig) -> Result<ReportService> {
    let storage = config.storage();
    let fetcher = FetcherConfig::from_dataset(&config.dataset)?;
    let source = HttpSource::new(fetcher)?;
    let policy = RefreshPolicy {
        ttl: config.dataset.refresh_interval(),
        check_interval: config.dataset.check_interval(),
    };

    Ok(ReportService::new(
        DatasetStore::new(storage.dataset_dir(), policy),
        Arc::new(source),
        UploadStore::new(storage.uploads_dir, config.uploads.retention()),
    ))
}

fn read_roster(path: &Path) -> Result<stratascribe::models::Roster> {
    roster::parse_file(path).with_context(|| format!("Failed to read roster {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(Some(cli.config.as_path())).context("Failed to load configuration")?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting stratascribe v{}", env!("CARGO_PKG_VERSION"));

    let service = build_service(&config)?;

    match cli.command {
        Commands::Report { roster, flags } => {
            let options = ProcessingOptions::from(flags);
            let parsed = read_roster(&roster)?;
            let reference = service.reference().await?;
            let result = generate_report(&parsed, &reference, &options)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Inspect { roster } => {
            let parsed = read_roster(&roster)?;
            let reference = service.reference().await?;
            let forces = Reconciler::new(&reference).resolve_roster(&parsed);
            let summaries: Vec<ForceSummary> = forces.iter().map(ForceSummary::from).collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        Commands::Update { force } => {
            let report = service.refresh(force).await?;
            let snapshot = service.snapshot().await;

            println!("\n=== Dataset Update ===");
            println!("Checked remote:   {}", report.checked_remote);
            println!("Marker changed:   {}", report.marker_changed);
            println!("Last update:      {}", snapshot.last_update().unwrap_or("unknown"));
            println!("Fetched:          {}", report.fetched.join(", "));
            if !report.kept_cached.is_empty() {
                println!("\nKept cached copies:");
                for file in &report.kept_cached {
                    println!("  - {}", file);
                }
            }
            let issues = snapshot.phase_issues();
            if !issues.is_empty() {
                println!("\nPhase issues:");
                for issue in issues {
                    println!("  - {} '{}': {:?}", issue.stratagem_id, issue.phase, issue.unknown);
                }
            }
        }
        Commands::Serve { host, port } => {
            if let Err(e) = service.refresh(false).await {
                tracing::warn!("Dataset not loaded at startup: {}", e);
            }

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = stratascribe::api::state::AppState {
                service: Arc::new(service),
                config: Arc::new(config),
            };
            let app = stratascribe::api::build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
