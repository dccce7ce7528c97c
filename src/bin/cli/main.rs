mod commands;
mod output;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use output::{OutputConfig, OutputFormat};
use rskeb::config::{self, CliArgs, Config};
use rskeb::storage::{HubStore, LocalStore, MirrorStore};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// CLI for the rskeb mirroring pipeline
#[derive(Parser, Debug)]
#[clap(
    name = "rskeb",
    about = "Mirrors Skeb artwork deliveries to local disks and Hugging Face repositories"
)]
struct Cli {
    #[command(flatten)]
    config: CliArgs,

    /// Mirror into a local directory instead of a Hub repository
    #[clap(long, env = "RSKEB_LOCAL_ROOT", global = true)]
    local_root: Option<PathBuf>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just names or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl the newest works into a fresh image pack
    Newest {
        /// How many listing entries to consider
        #[clap(short = 'n', long, default_value_t = 200)]
        number: usize,
    },
    /// Archive external resources linked from the newest posts
    Mirror {
        /// How many posts to scan for links
        #[clap(short = 'n', long, default_value_t = 200)]
        number: usize,
    },
    /// Fold unarchived resource archives into one merged pack
    Repack,
    /// Show the mirror's bookkeeping
    Status,
}

/// Installs the tracing subscriber; the returned guard must stay alive for
/// file logging to flush
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rskeb=info"));
    match config.log_dir {
        Some(ref dir) => {
            let appender = tracing_appender::rolling::daily(dir, "rskeb.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .json()
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

/// Builds the storage medium the run targets
fn build_store(
    local_root: Option<PathBuf>,
    config: &Config,
) -> Result<Box<dyn MirrorStore>, Box<dyn std::error::Error>> {
    match local_root {
        Some(root) => Ok(Box::new(LocalStore::new(root))),
        None => {
            if config.repository.is_empty() {
                return Err(
                    "a mirror repository is required: pass --repository (or RSKEB_REPOSITORY), \
                     or use --local-root to mirror into a directory"
                        .into(),
                );
            }
            Ok(Box::new(HubStore::new(
                &config.repository,
                &config.endpoint,
                config.token.as_deref(),
            )?))
        }
    }
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    // reqwest transport failures read poorly; point at the likely cause
    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!("Could not reach the remote endpoint. Network down?\n  {}", err_string);
    }

    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if std::fs::metadata(".env").is_ok() {
        dotenv::dotenv().ok();
    }

    let config = config::get_config(cli.config);
    let _log_guard = init_tracing(&config);
    let output_config = OutputConfig { format: cli.format, quiet: cli.quiet };

    let result = async {
        let store = build_store(cli.local_root, &config)?;
        match cli.command {
            Commands::Newest { number } => {
                commands::newest::execute(store.as_ref(), &config, number, &output_config).await
            }
            Commands::Mirror { number } => {
                commands::mirror::execute(store.as_ref(), &config, number, &output_config).await
            }
            Commands::Repack => commands::repack::execute(store.as_ref(), &output_config).await,
            Commands::Status => commands::status::execute(store.as_ref(), &output_config).await,
        }
    }
    .await;

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
