//! four - build and run .four descriptor packages

use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use four_core::FourError;
use tracing_subscriber::EnvFilter;

use four_cli::cmd;
use four_cli::ui::Output;
use four_cli::{Cli, Commands};

/// How long an interrupted operation gets to clean up its staging directory.
/// A child started by `run` is not killed, so a run that outlives this
/// leaves its staging directory behind.
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    // No arguments: usage, not an error
    if args.len() == 1 {
        let _ = Cli::command().print_help();
        println!();
        return;
    }

    let cli = Cli::parse_from(args);
    let output = Output::new();

    let worker_output = output.clone();
    let mut worker = tokio::task::spawn_blocking(move || dispatch(cli, &worker_output));

    let code = tokio::select! {
        joined = &mut worker => match joined {
            Ok(Ok(code)) => code,
            Ok(Err(err)) => {
                report_error(&output, &err);
                1
            }
            Err(join_err) => {
                tracing::error!(error = %join_err, "worker task failed");
                output.error(&format!("Unexpected error: {join_err}"));
                1
            }
        },
        _ = tokio::signal::ctrl_c() => {
            output.warning("Interrupted, cleaning up");
            if tokio::time::timeout(INTERRUPT_GRACE, &mut worker).await.is_err() {
                tracing::warn!("operation did not finish within the grace period");
            }
            130
        }
    };

    output.wait_async().await;
    // The runtime would otherwise wait for a still-running blocking task.
    std::process::exit(code);
}

fn dispatch(cli: Cli, output: &Output) -> Result<i32> {
    match cli.command {
        Commands::Build { file, out_dir } => cmd::build::build(&file, out_dir, output).map(|()| 0),
        Commands::Run {
            file,
            timeout,
            platform,
        } => cmd::run::run(&file, timeout, platform, output),
        Commands::Info { file } => cmd::info::info(&file).map(|()| 0),
        Commands::Version => {
            cmd::version::version();
            Ok(0)
        }
    }
}

fn report_error(output: &Output, err: &anyhow::Error) {
    match err.downcast_ref::<FourError>() {
        Some(known) => output.error(&format!("Error: {known}")),
        None => output.error(&format!("Unexpected error: {err:#}")),
    }
}
