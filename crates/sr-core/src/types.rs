use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::value::ScriptValue;

/// Read granularity and output policy of one `Shell::run`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    Interactive,
    Quiet,
    Batch,
    OneShot,
    OneShotInteractive,
}

impl RunMode {
    pub const ALL: [RunMode; 5] = [
        RunMode::Interactive,
        RunMode::Quiet,
        RunMode::Batch,
        RunMode::OneShot,
        RunMode::OneShotInteractive,
    ];

    pub fn reads_whole_input(self) -> bool {
        matches!(self, Self::Batch)
    }

    pub fn prints_results(self) -> bool {
        matches!(self, Self::Interactive | Self::OneShotInteractive)
    }

    pub fn loops(self) -> bool {
        matches!(self, Self::Interactive | Self::Quiet)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Quiet => "quiet",
            Self::Batch => "batch",
            Self::OneShot => "one-shot",
            Self::OneShotInteractive => "one-shot-interactive",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RunMode::ALL
            .into_iter()
            .find(|mode| mode.name() == value)
            .ok_or_else(|| {
                format!(
                    "unknown run mode \"{}\", expected one of: {}",
                    value,
                    RunMode::ALL.map(RunMode::name).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationOutcome {
    pub result: ScriptValue,
    pub has_uncaught_exception: bool,
    pub exception: ScriptValue,
    pub exception_line: Option<usize>,
    pub backtrace: Vec<String>,
}

impl EvaluationOutcome {
    pub fn value(result: ScriptValue) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    pub fn exception(exception: ScriptValue, line: Option<usize>, backtrace: Vec<String>) -> Self {
        Self {
            result: exception.clone(),
            has_uncaught_exception: true,
            exception,
            exception_line: line,
            backtrace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    Valid,
    /// The text is a prefix of a valid program; more input is needed.
    Intermediate,
    Error {
        message: String,
        line: Option<usize>,
    },
}

impl SyntaxCheck {
    pub fn is_intermediate(&self) -> bool {
        matches!(self, Self::Intermediate)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResult {
    pub path: Vec<String>,
    pub candidates: Vec<String>,
    pub insertion_offset: usize,
    pub common_suffix: String,
}

/// One unit of input handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub next_line: usize,
}
