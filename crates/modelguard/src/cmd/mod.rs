use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod check;
pub mod required;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a JSON model against schemas and rules.
    Check(CheckArgs),
    /// List the fields of a class that carry rules, and which are required.
    Required(RequiredArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Check(args) => check::run(args, format),
        Command::Required(args) => required::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON model file to validate.
    pub model: PathBuf,
    /// Class of the root object.
    #[arg(long, short = 'c')]
    pub class: String,
    /// Directory of `*.model.json` schema documents.
    #[arg(long, value_name = "DIR", env = "MODELGUARD_SCHEMAS")]
    pub schemas: Option<PathBuf>,
    /// Rule file mapping class -> field -> rules.
    #[arg(long, value_name = "FILE", env = "MODELGUARD_RULES")]
    pub rules: Option<PathBuf>,
    /// Previous snapshot of the model, passed to model rules.
    #[arg(long, value_name = "FILE")]
    pub original: Option<PathBuf>,
    /// Only validate fields on this path (e.g. `.Items[0].Name`).
    #[arg(long, value_name = "PATH")]
    pub scope: Option<String>,
    /// Reject properties not declared by object-typed schema fragments.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct RequiredArgs {
    /// Class to report on.
    #[arg(long, short = 'c')]
    pub class: String,
    /// Rule file mapping class -> field -> rules.
    #[arg(long, value_name = "FILE", env = "MODELGUARD_RULES")]
    pub rules: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
