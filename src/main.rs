use clap::Parser;
use parsum::cli::{self, Cli};
use parsum::error::describe_error_code;
use parsum::ParsumError;
use tracing::{debug, error, trace};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only result lines.
    tracing_subscriber::fmt()
        .with_env_filter(cli::get_log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .init();

    debug!("parsum started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(&cli).await {
        error!("Fatal error: {:#}", e);
        if let Some(code) = e.downcast_ref::<ParsumError>().map(ParsumError::code) {
            debug!("E{:04}: {}", code, describe_error_code(code));
        }
        eprintln!("Error: {}", user_message(&e));
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    cli::execute(cli).await?;
    Ok(())
}

fn user_message(err: &anyhow::Error) -> String {
    err.downcast_ref::<ParsumError>()
        .map(ParsumError::user_message)
        .unwrap_or_else(|| err.to_string())
}

fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ParsumError>()
        .map(ParsumError::exit_code)
        .unwrap_or(1)
}
