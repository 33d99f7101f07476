use std::ffi::OsString;
use std::fs;
use std::io::{self, IsTerminal, Read};

use clap::Parser;
use sr_core::ShellError;
use sr_shell::{BufferSource, SentenceSource, Shell};

mod cli_args;
mod config;
mod console;
mod error_map;

pub(crate) use cli_args::Cli;
pub(crate) use config::{InputKind, ShellConfig};
pub(crate) use console::{ConsoleHost, ConsoleSource};
pub(crate) use error_map::{emit_error, map_cli_source_read, map_cli_stdin_read};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            error.print().ok();
            return error.exit_code();
        }
    };
    init_logging();
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init()
        .ok();
}

fn run(cli: Cli) -> Result<i32, ShellError> {
    let config = ShellConfig::resolve(
        cli,
        &|name: &str| std::env::var_os(name),
        io::stdin().is_terminal(),
    )?;
    log::debug!("starting in {} mode from {:?}", config.mode, config.input);

    let mut shell = Shell::new(ConsoleHost);
    shell.set_use_global_engine(!config.isolate);
    shell.set_arguments(config.arguments.clone());
    for path in &config.extension_paths {
        shell.add_extension_path(path);
    }
    if let Some(throttle) = config.event_throttle {
        shell.set_event_throttle(throttle);
    }

    let mut source = open_source(&config, &mut shell)?;
    shell.run(config.mode, source.as_mut())?;
    Ok(shell.exit_code())
}

fn open_source(config: &ShellConfig, shell: &mut Shell) -> Result<Box<dyn SentenceSource>, ShellError> {
    let source: Box<dyn SentenceSource> = match &config.input {
        InputKind::Console => Box::new(ConsoleSource::new(config.history_file.clone())?),
        InputKind::Eval(code) => {
            shell.set_source_name("<eval>");
            Box::new(BufferSource::new(code))
        }
        InputKind::File(path) => {
            let text = fs::read_to_string(path).map_err(map_cli_source_read)?;
            shell.set_source_name(path.display().to_string());
            Box::new(BufferSource::new(&text))
        }
        InputKind::Stdin => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(map_cli_stdin_read)?;
            shell.set_source_name("<stdin>");
            Box::new(BufferSource::new(&text))
        }
    };
    Ok(source)
}
