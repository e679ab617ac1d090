mod cli;
mod commands;
mod error;

use clap::Parser;
use clap::error::ErrorKind;

use cli::Cli;

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse_from(wild::args_os()) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            tracing::debug!(error = %err, "argument parsing failed");
            cli::print_usage();
            std::process::exit(1);
        }
    };

    commands::patch(cli)?;

    Ok(())
}
