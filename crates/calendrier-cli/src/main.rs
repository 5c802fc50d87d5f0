use calendrier_cli::cli_args::Cli;
use calendrier_cli::dispatch;
use calendrier_core::logging::{LoggingDestination, init_logging};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(LoggingDestination::FileAndStderr) {
        eprintln!("Warning: structured logging unavailable: {err}");
    }
    if let Err(err) = dispatch(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
