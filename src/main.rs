mod app;
mod cli;
mod copy;
mod error;
mod model;
mod output;
mod plugin;
mod process;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use cli::Cli;
use model::config::AppConfig;
use process::ShellRunner;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging goes to a file so it never interleaves with status lines.
    let _guard = match init_logging(cli.verbose) {
        Ok(guard) => Some(guard),
        Err(err) => {
            output::warning(format!("file logging disabled: {err:#}"));
            None
        }
    };

    tracing::info!("plasma-deploy starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            output::error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?.with_overrides(&cli.overrides());

    let pipelines = cli.pipelines();
    if pipelines.is_empty() {
        output::warning("Nothing to do: pass -w, -k or -r (see --help)");
        return Ok(());
    }

    App::new(config, ShellRunner).run(&pipelines)
}

fn init_logging(verbosity: u8) -> Result<WorkerGuard> {
    let log_dir = directories::ProjectDirs::from("", "", "plasma-deploy")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("plasma-deploy"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "plasma-deploy.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let level = match verbosity {
        0 => "plasma_deploy=info",
        1 => "plasma_deploy=debug",
        _ => "plasma_deploy=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| anyhow::anyhow!("cannot install log subscriber: {err}"))?;

    Ok(guard)
}
