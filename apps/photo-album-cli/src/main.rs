//! Search and upload photos through the photo album API.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apigw_client::{ApiGatewayConfig, AuthType, Blob, PhotoAlbumClient, PhotoReference};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Parser)]
#[command(version, about = "Photo album API client", long_about = None)]
struct Cli {
    /// Base URL of the image bucket, used for results without an explicit URL
    #[arg(long, env = "PHOTO_BUCKET_ENDPOINT", default_value = "")]
    bucket_endpoint: String,

    /// Sign requests with SigV4 instead of sending them with the API key only
    #[arg(long)]
    signed: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search photos by keyword
    Search {
        /// Free-text query
        query: String,
    },

    /// Upload a photo
    Upload {
        /// Image file to upload; its file name becomes the object key
        file: PathBuf,

        /// Custom labels stored with the photo
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ApiGatewayConfig::from_env().context("failed to load gateway configuration")?;
    let auth_type = if cli.signed {
        AuthType::Signed
    } else {
        AuthType::Unauthenticated
    };
    let client = PhotoAlbumClient::from_config(&config)
        .context("failed to create photo album client")?
        .with_auth_type(auth_type);

    match cli.command {
        Command::Search { query } => {
            let hits = client
                .search(&query)
                .await
                .with_context(|| format!("search for {query:?} failed"))?;
            if hits.is_empty() {
                println!("no photos match {query:?}");
            }
            for hit in &hits {
                println!("{}", render_hit(hit, &cli.bucket_endpoint));
            }
        }
        Command::Upload { file, labels } => {
            let filename = file_name(&file)?;
            let blob = Blob::from_file(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?
                .with_content_type(content_type_for(&file))
                .with_name(filename.clone());
            let response = client
                .upload(&filename, blob, &join_labels(&labels))
                .await
                .with_context(|| format!("upload of {filename} failed"))?;
            println!("uploaded {filename} ({})", response.status());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map_or_else(|| FALLBACK_CONTENT_TYPE.to_owned(), |mime| mime.essence_str().to_owned())
}

fn join_labels(labels: &[String]) -> String {
    labels
        .iter()
        .map(|label| label.trim())
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_hit(hit: &PhotoReference, bucket_endpoint: &str) -> String {
    let mut line = hit.object_key.clone();
    if let Some(bucket) = &hit.bucket {
        line.push_str(&format!("  bucket={bucket}"));
    }
    if !hit.labels.is_empty() {
        line.push_str(&format!("  labels={}", hit.labels.join(",")));
    }
    line.push_str(&format!("  {}", hit.image_url(bucket_endpoint)));
    line
}
