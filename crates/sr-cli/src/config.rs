use std::ffi::OsString;
use std::path::PathBuf;

use sr_core::{RunMode, ShellError};

use crate::cli_args::Cli;
use crate::error_map::map_cli_config;

pub(crate) const EXTENSION_PATH_VAR: &str = "SRSH_EXTENSION_PATH";
pub(crate) const EVENT_THROTTLE_VAR: &str = "SRSH_EVENT_THROTTLE";
const HISTORY_FILE_NAME: &str = ".srsh_history";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InputKind {
    Console,
    Eval(String),
    File(PathBuf),
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShellConfig {
    pub(crate) mode: RunMode,
    pub(crate) input: InputKind,
    pub(crate) isolate: bool,
    pub(crate) extension_paths: Vec<PathBuf>,
    pub(crate) event_throttle: Option<i32>,
    pub(crate) arguments: Vec<String>,
    pub(crate) history_file: Option<PathBuf>,
}

impl ShellConfig {
    /// Folds the command line and the `SRSH_*` environment into one config.
    /// Command-line values win over the environment.
    pub(crate) fn resolve(
        cli: Cli,
        env: &dyn Fn(&str) -> Option<OsString>,
        stdin_is_terminal: bool,
    ) -> Result<Self, ShellError> {
        let input = match (cli.eval, cli.file) {
            (Some(code), _) => InputKind::Eval(code),
            (None, Some(file)) => InputKind::File(file),
            (None, None) if stdin_is_terminal => InputKind::Console,
            (None, None) => InputKind::Stdin,
        };
        let mode = cli.mode.unwrap_or(match input {
            InputKind::Console => RunMode::Interactive,
            _ => RunMode::Batch,
        });

        let mut extension_paths = cli.extension_paths;
        if let Some(paths) = env(EXTENSION_PATH_VAR) {
            extension_paths.extend(
                std::env::split_paths(&paths).filter(|path| !path.as_os_str().is_empty()),
            );
        }

        let event_throttle = match cli.throttle {
            Some(throttle) => Some(throttle),
            None => env(EVENT_THROTTLE_VAR)
                .map(|value| parse_throttle(&value.to_string_lossy()))
                .transpose()?,
        };

        Ok(Self {
            mode,
            input,
            isolate: cli.isolate,
            extension_paths,
            event_throttle,
            arguments: cli.arguments,
            history_file: dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME)),
        })
    }
}

fn parse_throttle(value: &str) -> Result<i32, ShellError> {
    value.trim().parse::<i32>().map_err(|error| {
        map_cli_config(format!("{}={}: {}", EVENT_THROTTLE_VAR, value, error))
    })
}
