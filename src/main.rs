//! rd-init - early-boot provisioning agent
//!
//! Runs once per boot as a systemd `Type=notify` service.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rd_init::paths::SEED_DIR;
use rd_init::{Orchestrator, Paths};

#[derive(Parser)]
#[command(name = "rd-init")]
#[command(author, version, about = "Provision a VM from its NoCloud seed volume", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Directory holding meta-data, user-data and network-config
    #[arg(long, env = "RD_INIT_SEED_DIR", default_value = SEED_DIR)]
    seed_dir: PathBuf,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = Paths::new().with_seed_dir(&cli.seed_dir);
    match Orchestrator::new(paths).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "rd-init failed");
            ExitCode::FAILURE
        }
    }
}
