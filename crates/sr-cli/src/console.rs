use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use rustyline::completion::{Completer, Pair};
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Context, Editor, Helper};
use sr_core::{PropertyEnumerator, ScriptValue, Sentence, ShellError};
use sr_shell::{complete_expression, ReadRequest, SentenceSource, ShellHost};

use crate::error_map::map_console;

pub(crate) const PROMPT: &str = "srsh> ";
pub(crate) const CONTINUATION_PROMPT: &str = "... ";

/// Process stdout/stderr/stdin.
#[derive(Debug, Default)]
pub(crate) struct ConsoleHost;

fn write_piece(out: &mut dyn Write, text: &str, end: &str) {
    if let Err(error) = out
        .write_all(text.as_bytes())
        .and_then(|_| out.write_all(end.as_bytes()))
        .and_then(|_| out.flush())
    {
        log::warn!("console write failed: {}", error);
    }
}

fn piece_end(last: bool) -> &'static str {
    if last {
        "\n"
    } else {
        " "
    }
}

impl ShellHost for ConsoleHost {
    fn print_out(&mut self, text: &str, last: bool) {
        write_piece(&mut io::stdout().lock(), text, piece_end(last));
    }

    fn print_err(&mut self, text: &str, last: bool) {
        write_piece(&mut io::stderr().lock(), text, piece_end(last));
    }

    fn print_for_read(&mut self, text: &str, last: bool) {
        write_piece(&mut io::stdout().lock(), text, if last { "" } else { " " });
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(error) => {
                log::warn!("reading stdin failed: {}", error);
                None
            }
        }
    }
}

struct CompletionScope {
    context: ScriptValue,
    enumerate: PropertyEnumerator,
}

/// Tab completion against the engine's context and property enumerator, refreshed
/// before every prompt.
#[derive(Clone, Default)]
pub(crate) struct ScriptCompleter {
    scope: Rc<RefCell<Option<CompletionScope>>>,
}

impl ScriptCompleter {
    fn refresh(&self, context: ScriptValue, enumerate: PropertyEnumerator) {
        *self.scope.borrow_mut() = Some(CompletionScope { context, enumerate });
    }

    fn refresh_from(&self, request: &ReadRequest<'_>) {
        self.refresh(request.context(), request.property_enumerator());
    }

    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<Pair>) {
        let scope = self.scope.borrow();
        let Some(scope) = scope.as_ref() else {
            return (pos, Vec::new());
        };
        let typed = &line[..pos];
        let result = complete_expression(&scope.context, typed, &|value: &ScriptValue| {
            (scope.enumerate)(value)
        });
        // Completion offsets count characters, rustyline wants bytes.
        let start = typed
            .char_indices()
            .nth(result.insertion_offset)
            .map_or(pos, |(index, _)| index);
        let pairs = result
            .candidates
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        (start, pairs)
    }
}

impl Completer for ScriptCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.candidates(line, pos))
    }
}

impl Hinter for ScriptCompleter {
    type Hint = String;
}

impl Highlighter for ScriptCompleter {}

impl Validator for ScriptCompleter {}

impl Helper for ScriptCompleter {}

/// Line editor front end for interactive sessions.
pub(crate) struct ConsoleSource {
    editor: Editor<ScriptCompleter, FileHistory>,
    completer: ScriptCompleter,
    history_file: Option<PathBuf>,
}

impl ConsoleSource {
    pub(crate) fn new(history_file: Option<PathBuf>) -> Result<Self, ShellError> {
        let mut editor = Editor::<ScriptCompleter, FileHistory>::new().map_err(map_console)?;
        editor.set_completion_type(CompletionType::List);
        let completer = ScriptCompleter::default();
        editor.set_helper(Some(completer.clone()));
        if let Some(path) = &history_file {
            if let Err(error) = editor.load_history(path) {
                log::debug!("no history loaded from {}: {}", path.display(), error);
            }
        }
        Ok(Self {
            editor,
            completer,
            history_file,
        })
    }

    fn remember(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if let Err(error) = self.editor.add_history_entry(text) {
            log::debug!("history entry dropped: {}", error);
        }
    }

    fn save_history(&mut self) {
        let Some(path) = &self.history_file else {
            return;
        };
        if let Err(error) = self.editor.save_history(path) {
            log::warn!("cannot save history to {}: {}", path.display(), error);
        }
    }
}

impl Drop for ConsoleSource {
    fn drop(&mut self) {
        self.save_history();
    }
}

impl SentenceSource for ConsoleSource {
    fn read_statement(&mut self, request: &ReadRequest<'_>) -> Result<Option<Sentence>, ShellError> {
        self.completer.refresh_from(request);
        let mut text = String::new();
        let mut consumed = 0;
        loop {
            let prompt = if consumed == 0 {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if consumed > 0 {
                        text.push('\n');
                    }
                    text.push_str(&line);
                    consumed += 1;
                    if request.is_complete(&text) {
                        break;
                    }
                }
                // Ctrl-C drops the statement being typed.
                Err(ReadlineError::Interrupted) => {
                    text.clear();
                    consumed = 0;
                }
                Err(ReadlineError::Eof) if consumed == 0 => return Ok(None),
                Err(ReadlineError::Eof) => break,
                Err(error) => return Err(map_console(error)),
            }
        }
        self.remember(&text);
        Ok(Some(Sentence {
            text,
            next_line: request.line_number() + consumed,
        }))
    }

    fn read_all(&mut self, request: &ReadRequest<'_>) -> Result<Option<Sentence>, ShellError> {
        self.completer.refresh_from(request);
        let mut lines = Vec::new();
        loop {
            let prompt = if lines.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            match self.editor.readline(prompt) {
                Ok(line) => lines.push(line),
                Err(ReadlineError::Interrupted) => lines.clear(),
                Err(ReadlineError::Eof) => break,
                Err(error) => return Err(map_console(error)),
            }
        }
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(Sentence {
            text: lines.join("\n"),
            next_line: request.line_number() + lines.len(),
        }))
    }
}
