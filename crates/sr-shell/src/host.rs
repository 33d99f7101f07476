use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use sr_core::ScriptValue;

/// Uncaught exception as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionReport {
    pub source: String,
    pub line: Option<usize>,
    pub message: String,
    pub backtrace: Vec<String>,
}

impl fmt::Display for ExceptionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.source, line, self.message)?,
            None => write!(f, "{}: {}", self.source, self.message)?,
        }
        for frame in &self.backtrace {
            write!(f, "\n  at {}", frame)?;
        }
        Ok(())
    }
}

/// Where the shell writes output and reads script-requested input.
///
/// `last` is true for the final piece of one logical print call; sinks end the
/// line there and separate earlier pieces with a space.
pub trait ShellHost {
    fn print_out(&mut self, text: &str, last: bool);
    fn print_err(&mut self, text: &str, last: bool);

    /// Prompt printed by `read(...)` before waiting for input.
    fn print_for_read(&mut self, text: &str, last: bool);

    /// `None` at end of input.
    fn read_line(&mut self) -> Option<String>;

    fn print_result(&mut self, value: &ScriptValue) {
        self.print_out(&value.to_string(), true);
    }

    fn print_uncaught_exception(&mut self, report: &ExceptionReport) {
        self.print_err(&report.to_string(), true);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub stdout: String,
    pub stderr: String,
    pub input: VecDeque<String>,
}

/// In-memory host; clones share one transcript.
#[derive(Debug, Clone, Default)]
pub struct BufferHost {
    transcript: Rc<RefCell<Transcript>>,
}

impl BufferHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let host = Self::default();
        host.transcript
            .borrow_mut()
            .input
            .extend(lines.into_iter().map(Into::into));
        host
    }

    pub fn transcript(&self) -> Rc<RefCell<Transcript>> {
        Rc::clone(&self.transcript)
    }

    pub fn stdout(&self) -> String {
        self.transcript.borrow().stdout.clone()
    }

    pub fn stderr(&self) -> String {
        self.transcript.borrow().stderr.clone()
    }
}

fn append(buffer: &mut String, text: &str, last: bool) {
    buffer.push_str(text);
    buffer.push(if last { '\n' } else { ' ' });
}

impl ShellHost for BufferHost {
    fn print_out(&mut self, text: &str, last: bool) {
        append(&mut self.transcript.borrow_mut().stdout, text, last);
    }

    fn print_err(&mut self, text: &str, last: bool) {
        append(&mut self.transcript.borrow_mut().stderr, text, last);
    }

    fn print_for_read(&mut self, text: &str, last: bool) {
        let mut transcript = self.transcript.borrow_mut();
        transcript.stdout.push_str(text);
        if !last {
            transcript.stdout.push(' ');
        }
    }

    fn read_line(&mut self) -> Option<String> {
        self.transcript.borrow_mut().input.pop_front()
    }
}

#[cfg(test)]
mod host_tests {
    use super::*;

    #[test]
    fn buffer_host_joins_pieces_until_last() {
        let mut host = BufferHost::new();
        let observer = host.clone();
        host.print_out("a", false);
        host.print_out("b", true);
        host.print_err("oops", true);
        assert_eq!(observer.stdout(), "a b\n");
        assert_eq!(observer.stderr(), "oops\n");
    }

    #[test]
    fn read_prompts_stay_on_the_input_line() {
        let mut host = BufferHost::with_input(["first", "second"]);
        host.print_for_read("name?", true);
        assert_eq!(host.read_line().as_deref(), Some("first"));
        assert_eq!(host.read_line().as_deref(), Some("second"));
        assert_eq!(host.read_line(), None);
        assert_eq!(host.stdout(), "name?");
    }

    #[test]
    fn default_result_and_exception_sinks() {
        let mut host = BufferHost::new();
        host.print_result(&ScriptValue::Int(3));
        host.print_uncaught_exception(&ExceptionReport {
            source: "main.rhai".to_string(),
            line: Some(4),
            message: "boom".to_string(),
            backtrace: vec!["f() at main.rhai:2".to_string()],
        });
        assert_eq!(host.stdout(), "3\n");
        assert_eq!(host.stderr(), "main.rhai:4: boom\n  at f() at main.rhai:2\n");
    }

    #[test]
    fn report_without_line() {
        let report = ExceptionReport {
            source: "<input>".to_string(),
            line: None,
            message: "bad".to_string(),
            backtrace: Vec::new(),
        };
        assert_eq!(report.to_string(), "<input>: bad");
    }
}
