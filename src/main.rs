use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use sahayak::config::{ClassifierBackend, Config};
use sahayak::db::models::{hours_before, ReportFilter, VerificationStatus};
use sahayak::db::ReportStore;
use sahayak::output::terminal;
use sahayak::pipeline::submission::{SubmissionPipeline, SubmitError};
use sahayak::pipeline::validation::SubmissionInput;
use sahayak::verification::traits::Classifier;

/// Sahayak: authenticity scoring for disaster distress reports.
///
/// Accepts emergency reports, answers immediately, and estimates in the
/// background whether each one looks genuine or like a scam.
#[derive(Parser)]
#[command(name = "sahayak", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Submit a distress report and wait for its verdict
    Submit {
        /// What is happening
        message: String,

        /// Where it is happening
        #[arg(long, short)]
        location: String,

        /// Phone number or other way to reach the reporter
        #[arg(long)]
        contact: Option<String>,

        /// GPS latitude (requires --lon)
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        /// GPS longitude (requires --lat)
        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Classify a message without storing it
    Classify {
        message: String,

        #[arg(long, short)]
        location: String,

        /// Use the heuristic scorer even if the AI backend is configured
        #[arg(long)]
        heuristic: bool,
    },

    /// List recent reports
    Feed {
        /// pending | genuine | verify | scam
        #[arg(long)]
        status: Option<String>,

        /// Only reports from the last N hours
        #[arg(long)]
        hours: Option<u32>,

        /// Search message and location text
        #[arg(long)]
        search: Option<String>,

        /// Max reports to list (default: 20)
        #[arg(long, default_value = "20")]
        limit: u32,

        /// Keep running and print changes as they happen
        #[arg(long)]
        follow: bool,
    },

    /// Show one report in full
    Show {
        /// Report id
        id: String,
    },

    /// Dashboard numbers: status breakdown, 7-day timeline, top locations
    Stats,

    /// Delete a report
    Delete {
        /// Report id
        id: String,
    },

    /// Show system status (DB stats, classifier, pending backlog)
    Status,

    /// Run the HTTP API
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on (default: 3000)
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },
}

/// How often `feed --follow` checks for changes.
const FOLLOW_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sahayak=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Sahayak database...");
            let config = Config::load()?;
            let store = sahayak::db::initialize_store(&config.db_path)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nSahayak is ready. Optional: set SAHAYAK_AI_API_KEY in .env");
            println!("  and SAHAYAK_CLASSIFIER=ai to use the language-model classifier.");
            println!("\nThen run: cargo run -- submit \"<message>\" --location \"<place>\"");
        }

        Commands::Submit {
            message,
            location,
            contact,
            lat,
            lon,
        } => {
            let config = Config::load()?;
            config.require_classifier()?;
            let store = sahayak::db::open_store(&config.db_path)?;
            let classifier = sahayak::verification::build_classifier(&config)?;
            let pipeline = SubmissionPipeline::new(store, classifier);

            let input = SubmissionInput {
                message,
                location,
                contact,
                latitude: lat,
                longitude: lon,
                submitted_by: None,
            };

            let submitted = match pipeline.submit(input).await {
                Ok(s) => s,
                Err(SubmitError::Validation(errors)) => {
                    println!("{}", "Submission rejected:".red().bold());
                    for e in &errors.0 {
                        println!("  {}: {}", e.field, e.message);
                    }
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };

            println!(
                "{} report {} (status: {})",
                "Accepted".green().bold(),
                submitted.report.id,
                submitted.report.classification
            );
            println!("{}", "Analyzing...".dimmed());

            match submitted.classification.await {
                Ok(Some(report)) => terminal::display_report_detail(&report),
                Ok(None) => println!(
                    "{} classification could not be stored; the report stays Pending.",
                    "Warning:".yellow()
                ),
                Err(e) => warn!(error = %e, "Classification task failed"),
            }
        }

        Commands::Classify {
            message,
            location,
            heuristic,
        } => {
            let mut config = Config::load()?;
            if heuristic {
                config.classifier_backend = ClassifierBackend::Heuristic;
            }
            config.require_classifier()?;
            let classifier = sahayak::verification::build_classifier(&config)?;
            let result = classifier.classify(message.trim(), location.trim()).await;
            terminal::display_classification(&result, classifier.name());
        }

        Commands::Feed {
            status,
            hours,
            search,
            limit,
            follow,
        } => {
            let config = Config::load()?;
            let store = sahayak::db::open_store(&config.db_path)?;

            let status = match status.as_deref() {
                None => None,
                Some(raw) => Some(VerificationStatus::from_filter(raw).ok_or_else(|| {
                    anyhow::anyhow!(
                        "Unknown status '{raw}'. Use pending, genuine, verify or scam."
                    )
                })?),
            };
            let since = match hours {
                None => None,
                Some(h) => Some(hours_before(chrono::Utc::now(), h).ok_or_else(|| {
                    anyhow::anyhow!("--hours {h} reaches too far back. Omit it to list all reports.")
                })?),
            };
            let filter = ReportFilter {
                status,
                since,
                search,
                limit: Some(limit),
                ..Default::default()
            };

            let reports = store.query(&filter).await?;
            terminal::display_report_list(&reports);

            if follow {
                follow_feed(store, filter).await?;
            }
        }

        Commands::Show { id } => {
            let config = Config::load()?;
            let store = sahayak::db::open_store(&config.db_path)?;
            match store.get(&id).await? {
                Some(report) => terminal::display_report_detail(&report),
                None => anyhow::bail!("No report with id {id}"),
            }
        }

        Commands::Stats => {
            let config = Config::load()?;
            let store = sahayak::db::open_store(&config.db_path)?;
            let stats = sahayak::analytics::load(store.as_ref(), chrono::Utc::now()).await?;
            terminal::display_stats(&stats);
        }

        Commands::Delete { id } => {
            let config = Config::load()?;
            let store = sahayak::db::open_store(&config.db_path)?;
            match store.delete(&id).await? {
                Some(report) => {
                    info!(id = %report.id, "Report deleted");
                    println!("Deleted report {}", report.id);
                }
                None => anyhow::bail!("No report with id {id}"),
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            let store = sahayak::db::open_store(&config.db_path)?;
            sahayak::status::show(&store, &config).await?;
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            let store = sahayak::db::initialize_store(&config.db_path)?;
            sahayak::web::run_server(config, store, port, &bind).await?;
        }
    }

    Ok(())
}

/// Print changes until interrupted. Polls the database so writes from a
/// separate `sahayak serve` process show up too.
async fn follow_feed(store: Arc<dyn ReportStore>, filter: ReportFilter) -> Result<()> {
    println!("{}", "Watching for changes (Ctrl-C to stop)...".dimmed());
    let mut watcher = sahayak::db::watch::ReportWatcher::start(store, filter).await?;
    let mut ticker = tokio::time::interval(FOLLOW_INTERVAL);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                match watcher.poll().await {
                    Ok(events) => {
                        for event in &events {
                            terminal::display_event(event);
                        }
                    }
                    Err(e) => warn!(error = %e, "Feed poll failed"),
                }
            }
        }
    }
    Ok(())
}
