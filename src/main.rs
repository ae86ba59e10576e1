use clap::Parser;
use remsync::config::SyncConfig;
use remsync::jobs::run_jobs;
use remsync::known_store::KnownFileStore;
use remsync::logging::init_logging;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "remsync")]
#[command(about = "Download new files from FTP/SFTP servers")]
#[command(version)]
struct Cli {
    /// JSON job configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    /// Overrides `logLevel` from the configuration
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match SyncConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("remsync: {}", e);
            return ExitCode::from(2);
        }
    };

    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    if let Err(e) = init_logging(level, cli.json_logs || config.json_logs) {
        eprintln!("remsync: {}", e);
        return ExitCode::from(2);
    }

    let mut store = match KnownFileStore::load(config.known_store_path()) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };
    tracing::info!(
        jobs = config.jobs.len(),
        known = store.len(),
        store = %store.path().display(),
        "starting"
    );

    let outcomes = run_jobs(&config, &mut store).await;

    if let Err(e) = store.save() {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => {
                for (remote, local) in result {
                    println!("{}\t{}\t{}", outcome.name, remote, local);
                }
            }
            Err(e) => {
                failed += 1;
                tracing::error!(job = %outcome.name, "{}", e);
            }
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
