use std::fmt::Display;

use sr_core::ShellError;

fn map_error(code: &'static str, error: impl Display) -> ShellError {
    ShellError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: ShellError) -> i32 {
    log::debug!("cli failed with {}", error.code);
    match error.line {
        Some(line) => eprintln!("srsh: {} (line {})", error, line),
        None => eprintln!("srsh: {}", error),
    }
    1
}

pub(crate) fn map_cli_config(error: impl Display) -> ShellError {
    map_error("CLI_CONFIG", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> ShellError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_stdin_read(error: std::io::Error) -> ShellError {
    map_error("CLI_STDIN_READ", error)
}

pub(crate) fn map_console(error: rustyline::error::ReadlineError) -> ShellError {
    map_error("CLI_CONSOLE", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(ShellError::new("ERR", "failed"));
        assert_eq!(code, 1);
        assert_eq!(emit_error(ShellError::with_line("ERR", "failed", 3)), 1);
    }

    #[test]
    fn mappers_keep_codes_and_messages() {
        let io = || std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(map_cli_source_read(io()).code, "CLI_SOURCE_READ");
        assert_eq!(map_cli_stdin_read(io()).message, "gone");
        assert_eq!(map_cli_config("bad").code, "CLI_CONFIG");
        let console = map_console(rustyline::error::ReadlineError::Eof);
        assert_eq!(console.code, "CLI_CONSOLE");
    }
}
