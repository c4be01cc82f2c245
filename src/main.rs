//! vercel-blob - command line client for the Vercel Blob store

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use vercel_blob::blob::{
    BlobClient, CopyOptions, DownloadOptions, ListMode, ListOptions, PutOptions, RequestOptions,
};
use vercel_blob::config::ClientConfig;
use vercel_blob::logging::{init_subscriber, LoggingOptions};
use vercel_blob::progress::{current_colors, set_progress_bar_colors, TerminalProgress};
use vercel_blob::{metrics, VERSION};

/// Vercel Blob client
#[derive(Parser, Debug)]
#[command(name = "vercel-blob")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Bearer token (defaults to BLOB_READ_WRITE_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log filter when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Print Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a local file
    Put(PutArgs),
    /// List blobs
    List {
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        cursor: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        /// Fold blobs inside folders into folder entries
        #[arg(long)]
        folded: bool,
    },
    /// Show blob metadata
    Head { url: String },
    /// Delete one or more blobs
    Delete {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Copy a blob to a new pathname
    Copy {
        from_url: String,
        to_pathname: String,
        #[arg(long)]
        random_suffix: bool,
        #[arg(long)]
        allow_overwrite: bool,
    },
    /// Download a blob into a directory
    Download {
        url: String,
        #[arg(default_value = ".")]
        dest_dir: PathBuf,
        #[command(flatten)]
        display: DisplayArgs,
    },
}

#[derive(Args, Debug)]
struct PutArgs {
    /// Local file to upload
    file: PathBuf,

    /// Destination pathname (defaults to the file name)
    #[arg(long)]
    pathname: Option<String>,

    /// Use the multipart protocol
    #[arg(long)]
    multipart: bool,

    /// Parts uploaded at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Keep the pathname exactly as given
    #[arg(long)]
    no_random_suffix: bool,

    #[arg(long)]
    allow_overwrite: bool,

    #[arg(long)]
    content_type: Option<String>,

    /// x-cache-control-max-age in seconds
    #[arg(long)]
    cache_max_age: Option<u64>,

    #[command(flatten)]
    display: DisplayArgs,
}

#[derive(Args, Debug)]
struct DisplayArgs {
    /// Show a progress bar
    #[arg(long)]
    progress: bool,

    /// Description colour, `#RRGGBB`
    #[arg(long)]
    desc_color: Option<String>,

    /// Bar colour, `#RRGGBB`
    #[arg(long)]
    bar_color: Option<String>,

    /// Text colour, `#RRGGBB`
    #[arg(long)]
    text_color: Option<String>,
}

impl DisplayArgs {
    fn progress_bar(&self, label: &str) -> Option<Arc<TerminalProgress>> {
        if !self.progress {
            return None;
        }

        if self.desc_color.is_some() || self.bar_color.is_some() || self.text_color.is_some() {
            set_progress_bar_colors(
                self.desc_color.as_deref(),
                self.bar_color.as_deref(),
                self.text_color.as_deref(),
            );
        }

        Some(Arc::new(TerminalProgress::with_colors(
            label,
            &current_colors(),
        )))
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => ClientConfig::default(),
    };

    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    if let Some(api_url) = &cli.api_url {
        config = config.with_base_url(api_url.clone());
    }

    Ok(config)
}

fn file_pathname(file: &Path) -> anyhow::Result<String> {
    file.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .with_context(|| format!("Cannot derive a pathname from {:?}", file))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: &Cli, client: &BlobClient) -> anyhow::Result<()> {
    match &cli.command {
        Command::Put(args) => {
            let pathname = match &args.pathname {
                Some(pathname) => pathname.clone(),
                None => file_pathname(&args.file)?,
            };
            let data = tokio::fs::read(&args.file)
                .await
                .with_context(|| format!("Failed to read {:?}", args.file))?;

            let mut options = PutOptions::new()
                .multipart(args.multipart)
                .allow_overwrite(args.allow_overwrite);
            if args.no_random_suffix {
                options = options.add_random_suffix(false);
            }
            if let Some(concurrency) = args.concurrency {
                options = options.max_concurrent_uploads(concurrency);
            }
            if let Some(content_type) = &args.content_type {
                options = options.content_type(content_type.clone());
            }
            if let Some(max_age) = args.cache_max_age {
                options = options.cache_control_max_age(max_age);
            }
            if let Some(bar) = args.display.progress_bar(&pathname) {
                options = options.progress(bar);
            }

            info!(pathname = %pathname, bytes = data.len(), "Uploading");
            let blob = client.put(&pathname, data, options).await?;
            print_json(&blob)
        }
        Command::List {
            prefix,
            cursor,
            limit,
            folded,
        } => {
            let mut options = ListOptions::new();
            if let Some(prefix) = prefix {
                options = options.prefix(prefix.clone());
            }
            if let Some(cursor) = cursor {
                options = options.cursor(cursor.clone());
            }
            if let Some(limit) = limit {
                options = options.limit(*limit);
            }
            if *folded {
                options = options.mode(ListMode::Folded);
            }

            print_json(&client.list(options).await?)
        }
        Command::Head { url } => print_json(&client.head(url, RequestOptions::new()).await?),
        Command::Delete { urls } => {
            let result = client.delete(urls.clone(), RequestOptions::new()).await?;
            print_json(&serde_json::json!({ "deleted": urls, "result": result }))
        }
        Command::Copy {
            from_url,
            to_pathname,
            random_suffix,
            allow_overwrite,
        } => {
            let options = CopyOptions::new()
                .add_random_suffix(*random_suffix)
                .allow_overwrite(*allow_overwrite);
            print_json(&client.copy(from_url, to_pathname, options).await?)
        }
        Command::Download {
            url,
            dest_dir,
            display,
        } => {
            let mut options = DownloadOptions::new();
            if let Some(bar) = display.progress_bar(url) {
                options = options.progress(bar);
            }

            let path = client.download_file(url, dest_dir, options).await?;
            print_json(&serde_json::json!({ "path": path }))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_subscriber(&LoggingOptions {
        level: cli.log_level.clone(),
        json: cli.json_logs,
    })?;

    info!("Starting vercel-blob v{}", VERSION);

    let config = load_config(&cli)?;
    let client = BlobClient::new(config)?;

    let result = run(&cli, &client).await;

    if cli.metrics {
        eprintln!("{}", metrics::gather());
    }

    result
}
