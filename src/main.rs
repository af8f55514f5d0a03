use clap::Parser;
use log::error;
use meteolog::{Config, Pipeline};
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file. Without one the built-in defaults are used.
    #[arg(short, long, env = "METEOLOG_CONFIG")]
    config: Option<PathBuf>,

    /// CSV log file, overriding the config's `file`
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Keep running and log a row every SECS seconds instead of exiting after one
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    ExitCode::from(run(Args::parse()).await)
}

/// Loads the config, applies the command line overrides and runs either one
/// cycle or the loop. Returns the process exit status.
async fn run(args: Args) -> u8 {
    let mut config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("{}", e);
                return EXIT_FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(file) = args.file {
        config.file = file;
    }
    if let Some(secs) = args.interval {
        config.interval_secs = Some(secs);
    }

    let pipeline = match Pipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("{}", e);
            return EXIT_FAILURE;
        }
    };

    if let Some(interval) = config.interval() {
        pipeline.run_forever(interval).await;
        return EXIT_OK;
    }

    match pipeline.run_once(chrono::Utc::now()).await {
        Ok(_) => EXIT_OK,
        Err(e) => {
            error!("Write failed: {}", e);
            EXIT_FAILURE
        }
    }
}
