use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use flowsync::config::{BootstrapConfig, DbConfig, ServerConfig};
use owo_colors::OwoColorize;
use std::path::PathBuf;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Flowsync: keeps automation platform workflows and credentials in sync with a version-controllable file tree
#[derive(Parser)]
#[command(name = "flowsync", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source configuration from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync server that receives platform change notifications
    Serve {
        /// Server port (overrides SYNC_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Shared webhook secret (overrides WEBHOOK_SECRET)
        #[arg(short, long)]
        secret: Option<String>,

        /// Root directory of the file representation (overrides SYNC_BASE_DIR)
        #[arg(short, long)]
        base_dir: Option<PathBuf>,
    },

    /// Seed a fresh platform deployment from the credential manifest
    Bootstrap {
        /// Root directory of the file representation (overrides SYNC_BASE_DIR)
        #[arg(short, long)]
        base_dir: Option<PathBuf>,

        /// Manifest file to read instead of the canonical location
        #[arg(short, long)]
        manifest: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if std::path::Path::new(&cli.env).exists() {
        dotenvy::from_filename(&cli.env)?;
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Serve {
            port,
            secret,
            base_dir,
        } => {
            let mut config = ServerConfig::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(secret) = secret {
                config.secret = Some(secret);
            }
            if let Some(base_dir) = base_dir {
                config.base_dir = base_dir;
            }
            log::info!(
                "starting sync server on {}:{} over {}",
                config.host,
                config.port,
                config.base_dir.display().bright_black()
            );
            flowsync::server::run(config).await?;
        }
        Commands::Bootstrap { base_dir, manifest } => {
            let mut config = BootstrapConfig::from_env()?;
            if let Some(base_dir) = base_dir {
                config.base_dir = base_dir;
            }
            if let Some(manifest) = manifest {
                config.manifest = Some(manifest);
            }
            let db_config = DbConfig::from_env()?;
            log::info!(
                "bootstrapping platform from {}",
                config.base_dir.display().bright_black()
            );
            flowsync::bootstrap::run(config, db_config).await?;
        }
    }

    Ok(())
}
