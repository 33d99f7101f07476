use std::path::PathBuf;

use clap::Parser;
use sr_core::RunMode;

#[derive(Debug, Parser)]
#[command(name = "srsh")]
#[command(about = "Script Report shell", version)]
pub(crate) struct Cli {
    /// interactive, quiet, batch, one-shot or one-shot-interactive
    #[arg(long = "mode", value_parser = parse_mode)]
    pub(crate) mode: Option<RunMode>,
    /// Keep the host API under `sr.engine` instead of the global namespace.
    #[arg(long = "isolate")]
    pub(crate) isolate: bool,
    /// Evaluate this code instead of reading a file.
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    pub(crate) eval: Option<String>,
    /// Extra directory searched by `importExtension`.
    #[arg(short = 'I', long = "extension-path", value_name = "DIR")]
    pub(crate) extension_paths: Vec<PathBuf>,
    #[arg(long = "throttle", value_name = "N", allow_negative_numbers = true)]
    pub(crate) throttle: Option<i32>,
    #[arg(value_name = "FILE")]
    pub(crate) file: Option<PathBuf>,
    #[arg(last = true, value_name = "ARGS")]
    pub(crate) arguments: Vec<String>,
}

fn parse_mode(value: &str) -> Result<RunMode, String> {
    value.parse()
}
