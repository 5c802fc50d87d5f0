//! Command-line front end for the calendar generator.

pub mod cli_args;

use std::path::Path;

use calendrier_core::config::{
    FileConfig, apply_runtime_overrides, config_path, load_config_from,
    runtime_preferences_to_calendar, save_config_to,
};
use calendrier_core::{RunOutcome, run_with_config};
use cli_args::{Cli, Command, ConfigCommand, GenerateArgs};

/// Execute the parsed command line.
pub fn dispatch(cli: Cli) -> Result<(), String> {
    let path = cli.config.clone().unwrap_or_else(config_path);
    match cli.command {
        Some(Command::Config(cmd)) => {
            if !cli.generate.is_empty() {
                return Err(
                    "Generation flags cannot be combined with config management commands.".into(),
                );
            }
            handle_config_command(cmd, &path)
        }
        None => run_generate(&cli.generate, &path).map(|outcome| report(&outcome)),
    }
}

/// Load preferences from `config_file`, layer the CLI flags on top and generate.
pub fn run_generate(args: &GenerateArgs, config_file: &Path) -> Result<RunOutcome, String> {
    let load = load_config_from(config_file);
    let mut warnings = load.warnings;

    let mut runtime_config =
        runtime_preferences_to_calendar(&load.config.runtime, &load.config.document);
    apply_runtime_overrides(
        &mut runtime_config,
        &args.to_runtime_overrides(),
        &mut warnings,
    );

    for warning in warnings {
        eprintln!("Warning: {warning}");
    }

    run_with_config(runtime_config).map_err(|err| err.to_string())
}

fn report(outcome: &RunOutcome) {
    let summary = &outcome.summary;
    let target = outcome.outfile.effective.display();
    if outcome.written {
        println!(
            "Wrote {} ({} day(s), {} event(s), {} bytes)",
            target, summary.days, summary.events, summary.bytes
        );
    } else {
        println!(
            "Dry run: {} day(s), {} event(s); would write {} bytes to {}",
            summary.days, summary.events, summary.bytes, target
        );
    }
    println!("{}", summary.week_label);
}

fn handle_config_command(command: ConfigCommand, path: &Path) -> Result<(), String> {
    match command {
        ConfigCommand::Show => {
            let load = load_config_from(path);
            for warning in load.warnings {
                eprintln!("Warning: {warning}");
            }
            let rendered = toml::to_string_pretty(&load.config).map_err(|err| err.to_string())?;
            print!("{rendered}");
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Set(args) => {
            if args.is_empty() {
                return Err("Nothing to update; pass at least one preference flag.".into());
            }
            let mut config = load_config_from(path).config;
            args.apply(&mut config);
            save_config_to(&config, path).map_err(|err| err.to_string())?;

            for warning in load_config_from(path).warnings {
                eprintln!("Warning: {warning}");
            }
            println!("Updated {}", path.display());
            Ok(())
        }
        ConfigCommand::Reset => {
            save_config_to(&FileConfig::default(), path).map_err(|err| err.to_string())?;
            println!("Reset {}", path.display());
            Ok(())
        }
    }
}
