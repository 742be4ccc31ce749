use anyhow::Result;
use cf_images_uploader::cache::{ImageCache, JsonFileStore, StateStore, CACHE_MAX_AGE_DAYS};
use cf_images_uploader::format::DocumentKind;
use cf_images_uploader::models::CacheEntry;
use cf_images_uploader::uploader::Uploader;
use chrono::Duration;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "cf-images")]
#[command(about = "Upload images to Cloudflare Images, reusing URLs for content seen before")]
struct CliArgs {
    /// State file holding the upload cache (defaults to CF_IMAGES_STATE_PATH).
    #[arg(long, global = true, value_name = "PATH")]
    state_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload image files and print an embeddable link for each.
    Upload {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Link style: a kind (markup, markdown, stylesheet, quoted, plain)
        /// or an editor language id such as `html` or `rust`.
        #[arg(long, default_value = "markdown", value_parser = parse_document_kind)]
        format: DocumentKind,
    },
    /// Upload a pasted `data:image/...;base64,...` URL read from stdin.
    Paste {
        #[arg(long, default_value = "markdown", value_parser = parse_document_kind)]
        format: DocumentKind,
    },
    /// Inspect or prune the upload cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// List cached uploads, newest first.
    List,
    /// Drop cached uploads older than the given age.
    Prune {
        #[arg(long, default_value_t = CACHE_MAX_AGE_DAYS)]
        max_age_days: i64,
    },
}

fn parse_document_kind(input: &str) -> std::result::Result<DocumentKind, String> {
    input.parse::<DocumentKind>()
}

fn open_store(state_file: Option<PathBuf>) -> Box<dyn StateStore> {
    match state_file {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(JsonFileStore::from_env()),
    }
}

/// One `cache list` row. The digest is shortened by characters, since a
/// hand-edited state file may hold anything there.
fn cache_list_line(entry: &CacheEntry) -> String {
    format!(
        "{}  {}  {}  {}",
        entry.created_at.format("%Y-%m-%d %H:%M"),
        entry.digest.chars().take(12).collect::<String>(),
        entry.original_file_name,
        entry.remote_url
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cf_images_uploader=info,cf_images=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();
    let args = CliArgs::parse();

    if let Err(e) = run(args).await {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: CliArgs) -> cf_images_uploader::Result<()> {
    match args.command {
        Command::Upload { files, format } => {
            let mut uploader = Uploader::from_env(open_store(args.state_file))?;
            info!("Uploading {} image(s)", files.len());

            let report = uploader.upload_batch(&files, format).await;
            for link in &report.links {
                println!("{}", link);
            }
            if let Some(message) = report.duplicate_message() {
                info!("{}", message);
            }
            for (path, reason) in &report.failures {
                warn!("Failed to upload {}: {}", path.display(), reason);
            }

            if report.links.is_empty() && !report.failures.is_empty() {
                return Err(cf_images_uploader::Error::Upload(format!(
                    "{} image(s) failed to upload",
                    report.failures.len()
                )));
            }
        }
        Command::Paste { format } => {
            let mut uploader = Uploader::from_env(open_store(args.state_file))?;

            let mut data_url = String::new();
            std::io::stdin().read_to_string(&mut data_url)?;

            let outcome = uploader.upload_data_url(&data_url).await?;
            if outcome.duplicate {
                info!("Duplicate image detected - reused existing URL");
            }
            println!("{}", format.format_link(&outcome.url, &outcome.file_name));
        }
        Command::Cache { action } => {
            let mut cache = ImageCache::load(open_store(args.state_file));
            match action {
                CacheAction::List => {
                    for entry in cache.entries() {
                        println!("{}", cache_list_line(entry));
                    }
                    info!("{} cached upload(s)", cache.len());
                }
                CacheAction::Prune { max_age_days } => {
                    let max_age = Duration::try_days(max_age_days.max(0)).ok_or_else(|| {
                        cf_images_uploader::Error::Config(format!(
                            "--max-age-days {} is out of range",
                            max_age_days
                        ))
                    })?;
                    let removed = cache.prune(max_age);
                    println!("Removed {} cached upload(s)", removed);
                }
            }
        }
    }

    Ok(())
}
