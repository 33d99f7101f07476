mod eval;
mod register;
#[cfg(test)]
mod tests;

use std::rc::Rc;

use rhai::{Engine, AST};
use sr_core::{
    EvaluationOutcome, HostFunction, Property, PropertyEnumerator, PropertyFlags, ScriptEngine,
    ScriptObject, ScriptValue, SyntaxCheck,
};

use crate::helpers::syntax::{scan_balance, Balance};

pub use register::MAX_HOST_FUNCTION_ARGS;

pub const RUNTIME_VERSION: &str = "rhai 1.23";

/// `ScriptEngine` backed by Rhai.
///
/// Rhai has no persistent global object, so the host-side `ScriptObject` is the
/// source of truth: every evaluation materializes it into a fresh `Scope`, runs,
/// and writes the scope back. Script-defined functions are kept in a functions-only
/// AST merged into each run.
pub struct RhaiEngine {
    global: ScriptObject,
    script_functions: AST,
    parser: Engine,
    event_throttle: i32,
    last_outcome: EvaluationOutcome,
}

impl Default for RhaiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RhaiEngine {
    pub fn new() -> Self {
        let global = ScriptObject::new();
        global.define(
            "print",
            ScriptValue::Function(stdout_print()),
            PropertyFlags::NONE,
        );
        Self {
            global,
            script_functions: AST::empty(),
            parser: Engine::new_raw(),
            event_throttle: -1,
            last_outcome: EvaluationOutcome::default(),
        }
    }

    /// Names of the functions scripts have defined so far.
    pub fn script_function_names(&self) -> Vec<String> {
        self.script_functions
            .iter_functions()
            .map(|function| function.name.to_string())
            .collect()
    }
}

fn stdout_print() -> HostFunction {
    HostFunction::new("print", |args| {
        let line = args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        println!("{}", line);
        Ok(ScriptValue::Undefined)
    })
}

impl ScriptEngine for RhaiEngine {
    fn evaluate(&mut self, source: &str, name: &str, start_line: usize) -> EvaluationOutcome {
        log::debug!(
            "evaluating {} bytes from {}:{}",
            source.len(),
            if name.is_empty() { "<input>" } else { name },
            start_line
        );
        let outcome = self.run(source, name, start_line);
        if outcome.has_uncaught_exception {
            log::debug!("uncaught exception: {}", outcome.exception);
        }
        self.last_outcome = outcome.clone();
        outcome
    }

    fn has_uncaught_exception(&self) -> bool {
        self.last_outcome.has_uncaught_exception
    }

    fn uncaught_exception(&self) -> ScriptValue {
        self.last_outcome.exception.clone()
    }

    fn uncaught_exception_line(&self) -> Option<usize> {
        self.last_outcome.exception_line
    }

    fn uncaught_exception_backtrace(&self) -> Vec<String> {
        self.last_outcome.backtrace.clone()
    }

    fn global_namespace(&self) -> ScriptObject {
        self.global.clone()
    }

    fn set_global_namespace(&mut self, global: ScriptObject) {
        self.global = global;
    }

    fn enumerate_properties(&self, value: &ScriptValue) -> Vec<Property> {
        value.own_properties()
    }

    fn property_enumerator(&self) -> PropertyEnumerator {
        Rc::new(ScriptValue::own_properties)
    }

    fn event_throttle(&self) -> i32 {
        self.event_throttle
    }

    fn set_event_throttle(&mut self, interval: i32) {
        self.event_throttle = interval;
    }

    fn check_syntax_completeness(&self, text: &str) -> SyntaxCheck {
        match scan_balance(text) {
            Balance::Open => SyntaxCheck::Intermediate,
            Balance::Broken { message, line } => SyntaxCheck::Error {
                message,
                line: Some(line),
            },
            Balance::Closed if text.trim().is_empty() => SyntaxCheck::Valid,
            Balance::Closed => match self.parser.compile(text) {
                Ok(_) => SyntaxCheck::Valid,
                Err(error) => SyntaxCheck::Error {
                    message: error.err_type().to_string(),
                    line: error.position().line(),
                },
            },
        }
    }

    fn runtime_version(&self) -> String {
        RUNTIME_VERSION.to_string()
    }
}
