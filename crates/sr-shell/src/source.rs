use std::collections::VecDeque;

use sr_core::{
    CompletionResult, PropertyEnumerator, ScriptEngine, ScriptValue, Sentence, ShellError,
    SyntaxCheck,
};

use crate::completion::complete_expression;

/// What a source may ask of the shell while it assembles a sentence.
pub struct ReadRequest<'a> {
    line_number: usize,
    engine: &'a dyn ScriptEngine,
}

impl<'a> ReadRequest<'a> {
    pub fn new(line_number: usize, engine: &'a dyn ScriptEngine) -> Self {
        Self {
            line_number,
            engine,
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn check_syntax(&self, text: &str) -> SyntaxCheck {
        self.engine.check_syntax_completeness(text)
    }

    /// Complete sentences include ones with syntax errors; only a prefix of a
    /// valid program asks for more input.
    pub fn is_complete(&self, text: &str) -> bool {
        !self.check_syntax(text).is_intermediate()
    }

    /// Top-level object completion starts from.
    pub fn context(&self) -> ScriptValue {
        self.engine.current_context()
    }

    pub fn property_enumerator(&self) -> PropertyEnumerator {
        self.engine.property_enumerator()
    }

    pub fn complete(&self, expression: &str) -> CompletionResult {
        let context = self.engine.current_context();
        complete_expression(&context, expression, &|value: &ScriptValue| {
            self.engine.enumerate_properties(value)
        })
    }
}

/// Supplies script text to a running shell.
pub trait SentenceSource {
    /// Reads physical lines until they form a complete sentence. `None` when exhausted.
    fn read_statement(&mut self, request: &ReadRequest<'_>) -> Result<Option<Sentence>, ShellError>;

    /// Reads everything that is left as one sentence.
    fn read_all(&mut self, request: &ReadRequest<'_>) -> Result<Option<Sentence>, ShellError>;
}

#[derive(Debug, Clone, Default)]
pub struct BufferSource {
    lines: VecDeque<String>,
}

impl BufferSource {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.lines.is_empty()
    }
}

impl SentenceSource for BufferSource {
    fn read_statement(&mut self, request: &ReadRequest<'_>) -> Result<Option<Sentence>, ShellError> {
        if self.lines.is_empty() {
            return Ok(None);
        }
        let mut text = String::new();
        let mut consumed = 0;
        while let Some(line) = self.lines.pop_front() {
            if consumed > 0 {
                text.push('\n');
            }
            text.push_str(&line);
            consumed += 1;
            if request.is_complete(&text) {
                break;
            }
        }
        Ok(Some(Sentence {
            text,
            next_line: request.line_number() + consumed,
        }))
    }

    fn read_all(&mut self, request: &ReadRequest<'_>) -> Result<Option<Sentence>, ShellError> {
        if self.lines.is_empty() {
            return Ok(None);
        }
        let consumed = self.lines.len();
        let text = self.lines.drain(..).collect::<Vec<_>>().join("\n");
        Ok(Some(Sentence {
            text,
            next_line: request.line_number() + consumed,
        }))
    }
}
