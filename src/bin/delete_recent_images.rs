//! Delete every image uploaded to the account in the last 7 days.
//!
//! Lists the account, shows what will go, waits for Enter on stdin, then
//! deletes one image at a time. Needs `CF_ACCOUNT_ID` and `CF_API_TOKEN`
//! (a token with Images:Edit). Exits 1 if credentials are missing or the
//! listing fails; individual delete failures only show up in the summary.

use anyhow::Result as AnyResult;
use cf_images_uploader::images::CloudflareImagesClient;
use cf_images_uploader::models::ApiCredentials;
use cf_images_uploader::purge::{BulkDeleter, RECENT_WINDOW_DAYS};
use cf_images_uploader::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "delete_recent_images")]
#[command(about = "Delete Cloudflare Images uploaded in the last 7 days")]
struct CliArgs {
    /// Override the Images API base URL (defaults to CF_API_BASE_URL or the
    /// public Cloudflare endpoint).
    #[arg(long, env = "CF_API_BASE_URL")]
    api_base_url: Option<String>,
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cf_images_uploader=info,delete_recent_images=info".into()),
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

async fn run(args: CliArgs) -> Result<()> {
    let credentials = ApiCredentials::from_env()?;
    let mut client = CloudflareImagesClient::with_credentials(credentials);
    if let Some(base_url) = args.api_base_url.filter(|url| !url.trim().is_empty()) {
        client = client.with_base_url(base_url);
    }

    info!("Deleting images uploaded in the last {} days", RECENT_WINDOW_DAYS);

    let deleter = BulkDeleter::new(&client);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    deleter
        .run(Utc::now(), &mut stdin.lock(), &mut stdout.lock())
        .await?;
    Ok(())
}
