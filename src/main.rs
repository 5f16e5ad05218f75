//! CLI entry point for postpress

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use postpress::{commands, server, Site};

#[derive(Parser)]
#[command(name = "postpress")]
#[command(version)]
#[command(about = "Publish a directory of markdown posts as a blog", long_about = None)]
struct Cli {
    /// Set the site directory (defaults to current directory)
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
    /// Publish the static site
    #[command(alias = "g")]
    Build {
        /// Output directory, relative to the site directory
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Republish whenever posts, templates or assets change
        #[arg(short, long)]
        watch: bool,
    },

    /// Serve pages rendered on every request
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// List posts in listing order
    List,

    /// Create a new post
    New {
        /// Title of the new post
        title: String,

        /// File name to use instead of the slugified title
        #[arg(short, long)]
        slug: Option<String>,
    },

    /// Remove the output directory
    Clean,

    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postpress=debug,info"
    } else {
        "postpress=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build { out, watch } => {
            let mut site = Site::new(&base_dir)?;
            if let Some(out) = out {
                site.set_out_dir(out);
            }

            commands::build::run(&site).await?;
            println!("Published to {:?}", site.out_dir);

            if watch {
                commands::build::watch(&site).await?;
            }
        }

        Commands::Server { port, ip } => {
            let site = Site::new(&base_dir)?;
            let port = port.unwrap_or(site.config.server.port);
            let ip = ip.unwrap_or_else(|| site.config.server.ip.clone());

            server::start(&site, &ip, port).await?;
        }

        Commands::List => {
            let site = Site::new(&base_dir)?;
            commands::list::run(&site).await?;
        }

        Commands::New { title, slug } => {
            let site = Site::new(&base_dir)?;
            let path = commands::new::create_post(&site, &title, slug.as_deref())?;
            println!("Created {:?}", path);
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            site.clean().await?;
            println!("Cleaned successfully!");
        }

        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::Version => {
            println!("postpress version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
