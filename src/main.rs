use log::{error, info};
use panoconv::error::ConvertError;
use panoconv::io::cli::{Cli, Invocation};
use panoconv::pipeline::job::run_job;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(ConvertError::Usage(msg)) => {
            // clap already formats the usage block
            eprintln!("{msg}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run() -> Result<(), ConvertError> {
    let settings = match Cli::process(std::env::args_os())? {
        Invocation::Run(settings) => settings,
        Invocation::Info(text) => {
            print!("{text}");
            return Ok(());
        }
    };

    if let Some(threads) = settings.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| ConvertError::Config(format!("failed to start thread pool: {e}")))?;
        info!("Using {threads} worker threads");
    }

    run_job(&settings)
}
