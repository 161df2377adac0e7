//! CLI entry point for quire

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quire::{commands, server, Site};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version)]
#[command(about = "Render Markdown documents with front matter into HTML pages", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post or page
    New {
        /// Layout to use (post, page, or a site layout)
        #[arg(short, long)]
        layout: Option<String>,

        /// Title of the new document
        title: String,

        /// Path for the new document, relative to the source directory
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Render the site
    #[command(alias = "b")]
    Build {
        /// Rebuild when files change
        #[arg(short, long)]
        watch: bool,

        /// Fail if any document fails to render
        #[arg(long)]
        strict: bool,

        /// Render drafts and unpublished documents
        #[arg(long)]
        drafts: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Serve without watching or live reload
        #[arg(long)]
        r#static: bool,

        /// Render drafts and unpublished documents
        #[arg(long)]
        drafts: bool,
    },

    /// Remove the output directory
    Clean,

    /// List site information
    List {
        /// Type of content to list (posts, pages, tags, layouts)
        #[arg(default_value = "posts")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "quire=debug,info"
    } else {
        "quire=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            commands::init::init_site(&target_dir)?;
            println!("Initialized empty site in {:?}", target_dir);
        }

        Commands::New {
            layout,
            title,
            path,
        } => {
            let site = Site::new(&base_dir)?;
            commands::new::run(&site, &title, layout.as_deref(), path.as_deref())?;
        }

        Commands::Build {
            watch,
            strict,
            drafts,
        } => {
            let mut site = Site::new(&base_dir)?;
            site.config.strict |= strict;
            site.config.drafts |= drafts;

            tracing::info!("Rendering {:?}...", site.source_dir);
            let report = site.build()?;
            println!("{}", report.summary());

            if watch {
                tokio::task::spawn_blocking(move || {
                    commands::build::watch(&site, |report| println!("{}", report.summary()))
                })
                .await??;
            }
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
            drafts,
        } => {
            let mut site = Site::new(&base_dir)?;
            site.config.drafts |= drafts;

            let report = site.build()?;
            println!("{}", report.summary());

            tracing::info!("Starting server at http://{}:{}", ip, port);
            server::start(&site, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            commands::list::run(&site, &r#type)?;
        }

        Commands::Version => {
            println!("quire version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
