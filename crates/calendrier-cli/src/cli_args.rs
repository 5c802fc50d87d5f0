use std::path::PathBuf;

use calendrier_core::config::{FileConfig, RuntimeOverrides};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

/// Top-level CLI entrypoint.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Génère le calendrier hebdomadaire des conférences (.docx)", long_about = None)]
pub struct Cli {
    /// Use this config file instead of the per-user config.toml.
    #[arg(long = "config", global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub generate: GenerateArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Configuration management subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the location of config.toml.
    Path,
    /// Update persisted preferences.
    Set(ConfigSetArgs),
    /// Restore every preference to its default.
    Reset,
}

/// Arguments for the generation flow (default command).
#[derive(Debug, Clone, Args, Default)]
pub struct GenerateArgs {
    /// JSON events file; `-` reads standard input.
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub infile: Option<String>,

    /// Directory the calendar is written to.
    #[arg(long = "output-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub output_dir: Option<String>,

    /// Build the document without writing it.
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Author recorded in the document properties.
    #[arg(long, value_name = "NAME")]
    pub creator: Option<String>,

    /// Override the output file.
    #[arg(value_name = "OUTFILE", value_hint = ValueHint::FilePath)]
    pub outfile: Option<String>,
}

impl GenerateArgs {
    /// Returns true when no overrides were provided.
    pub fn is_empty(&self) -> bool {
        self.infile.is_none()
            && self.output_dir.is_none()
            && !self.dry_run
            && self.creator.is_none()
            && self.outfile.is_none()
    }

    /// Convert CLI flags into runtime overrides.
    pub fn to_runtime_overrides(&self) -> RuntimeOverrides {
        let mut overrides = RuntimeOverrides::default();

        if let Some(ref infile) = self.infile {
            overrides.infile = Some(infile.trim().to_string());
        }
        if let Some(ref outfile) = self.outfile {
            overrides.outfile = Some(parse_optional_field(outfile));
        }
        if let Some(ref dir) = self.output_dir {
            overrides.output_directory = Some(parse_optional_field(dir));
        }
        if self.dry_run {
            overrides.dry_run = Some(true);
        }
        if let Some(ref creator) = self.creator {
            overrides.creator = Some(creator.clone());
        }

        overrides
    }
}

/// Preferences persisted by `config set`.
#[derive(Debug, Clone, Args, Default)]
pub struct ConfigSetArgs {
    /// Default events file (`-` for standard input).
    #[arg(long = "input-path", value_name = "PATH")]
    pub input_path: Option<String>,

    /// Default output file name.
    #[arg(long = "output-file-name", value_name = "NAME")]
    pub output_file_name: Option<String>,

    /// Default output directory; `none` clears it.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<String>,

    /// Whether runs default to dry-run mode.
    #[arg(long = "dry-run", value_name = "BOOL", value_parser = clap::value_parser!(bool))]
    pub dry_run: Option<bool>,

    /// Default document author.
    #[arg(long, value_name = "NAME")]
    pub creator: Option<String>,
}

impl ConfigSetArgs {
    pub fn is_empty(&self) -> bool {
        self.input_path.is_none()
            && self.output_file_name.is_none()
            && self.output_dir.is_none()
            && self.dry_run.is_none()
            && self.creator.is_none()
    }

    /// Write the provided values into `config`.
    pub fn apply(&self, config: &mut FileConfig) {
        if let Some(ref path) = self.input_path {
            config.runtime.input_path = path.trim().to_string();
        }
        if let Some(ref name) = self.output_file_name {
            config.runtime.output_file_name = name.trim().to_string();
        }
        if let Some(ref dir) = self.output_dir {
            config.runtime.output_directory = parse_optional_field(dir);
        }
        if let Some(dry_run) = self.dry_run {
            config.runtime.dry_run = dry_run;
        }
        if let Some(ref creator) = self.creator {
            config.document.creator = creator.trim().to_string();
        }
    }
}

fn parse_optional_field(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "none" | "null" | "unset"
    ) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
