//! Command line front end
//!
//! Parses arguments, resolves the layered configuration and runs the zeta
//! summation through the reduction engine with results on stdout.

pub mod args;

pub use args::Cli;

use crate::config;
use crate::error::Result;
use crate::reduction::{self, GlobalResult};
use crate::sink::{ResultLabel, StdoutSink};
use crate::term::ZetaTerm;
use std::sync::Arc;
use tracing::{debug, info};

/// Name the zeta result is published under
pub const RESULT_NAME: &str = "z";
pub const RESULT_DESCRIPTION: &str = "zeta";

/// Map the `-v` count to a tracing filter directive
pub fn get_log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,tokio=debug,runtime=debug",
    }
}

/// Run the zeta summation described by `cli`.
pub async fn execute(cli: &Cli) -> Result<GlobalResult> {
    let run_config =
        config::resolve(cli.exponent, cli.config.as_deref(), &cli.overrides()).await?;
    debug!(
        "Summing zeta({}) over {} iterations on {} workers",
        run_config.exponent, run_config.total_iterations, run_config.workers
    );

    let label = ResultLabel::new(RESULT_NAME, RESULT_DESCRIPTION)?;
    let result = reduction::run(
        run_config.plan(),
        Arc::new(ZetaTerm::new(run_config.exponent)),
        Arc::new(StdoutSink::new()),
        label,
    )
    .await?;

    info!("zeta({}) = {:.15}", run_config.exponent, result.value);
    Ok(result)
}
