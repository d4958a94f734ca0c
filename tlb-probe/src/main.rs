mod cli;
#[cfg_attr(not(windows), allow(dead_code))]
mod report;

use std::process::ExitCode;

use clap::Parser;
use tlb_dispatch::{DispatchError, friendly_dispatch_hint};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::Cli;
use crate::report::ProbeReport;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli);

    tracing::info!(
        interface = %cli.interface,
        library = %cli.type_library.display(),
        "Starting tlb-probe"
    );

    match run(&cli) {
        Ok(report) => {
            print!("{report}");
            if report.all_resolved() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            tracing::error!(error = ?err, "Probe failed");
            eprintln!("error: {err:#}");
            if let Some(hint) = err
                .downcast_ref::<DispatchError>()
                .and_then(friendly_dispatch_hint)
            {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr, or to a daily file under `--log-dir`. The returned
/// guard flushes the file writer on drop.
fn init_logging(cli: &Cli) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.default_filter()));

    match &cli.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "tlb-probe.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_filter(filter),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
                .init();
            None
        }
    }
}

#[cfg(windows)]
fn run(cli: &Cli) -> anyhow::Result<ProbeReport> {
    use anyhow::Context;
    use tlb_dispatch::{Apartment, ComGuard, LazyTypeLibrary, OleTypeLibLoader};

    // Declared first so COM outlives the loaded library.
    let _com = ComGuard::new(Apartment::SingleThreaded).context("Failed to initialize COM")?;
    let library = LazyTypeLibrary::new(OleTypeLibLoader, cli.source());

    Ok(report::probe(&library, cli.interface, &cli.names)?)
}

#[cfg(not(windows))]
fn run(cli: &Cli) -> anyhow::Result<ProbeReport> {
    let path = cli.source().resolve()?;
    anyhow::bail!(
        "cannot load {}: OLE automation type libraries are only available on Windows",
        path.display()
    )
}
