use anyhow::{Context, Result};

use level_watch::archive::CsvArchive;
use level_watch::config::Config;
use level_watch::okx::OkxRestClient;
use level_watch::pipeline::{run_once, RunOutcome};

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config
            .logging
            .level
            .parse()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout);
    if config.logging.json {
        builder.with_ansi(false).json().init();
    } else {
        builder.init();
    }
}

fn run(config: &Config) -> Result<()> {
    let client = OkxRestClient::from_config(&config.okx).context("failed to build OKX client")?;
    let archive = CsvArchive::new(&config.archive.root);

    match run_once(&client, &archive, config, chrono::Utc::now()).context("run failed")? {
        RunOutcome::Skipped => tracing::info!("Run skipped, nothing archived"),
        RunOutcome::Completed { written, .. } => {
            tracing::info!(files = written.len(), root = %archive.root().display(), "Run complete")
        }
    }
    Ok(())
}

fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Set LEVEL_WATCH_CONFIG or provide config/default.toml");
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    tracing::info!(
        inst_id = %config.okx.inst_id,
        base_url = %config.okx.base_url,
        archive_root = %config.archive.root.display(),
        "Starting level-watch"
    );

    // Failures end up in the log only; the scheduler just sees a finished run.
    if let Err(e) = run(&config) {
        let detail = format!("{:#}", e);
        tracing::error!(error = %detail, "Run aborted");
    }
}
