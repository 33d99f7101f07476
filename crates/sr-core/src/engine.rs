use std::rc::Rc;

use crate::types::{EvaluationOutcome, SyntaxCheck};
use crate::value::{Property, ScriptObject, ScriptValue};

/// `enumerate_properties` detached from the engine that produced it.
pub type PropertyEnumerator = Rc<dyn Fn(&ScriptValue) -> Vec<Property>>;

/// Capabilities the shell needs from an embedded script engine.
pub trait ScriptEngine {
    /// Evaluates `source`; diagnostics are numbered from `start_line`.
    fn evaluate(&mut self, source: &str, name: &str, start_line: usize) -> EvaluationOutcome;

    fn has_uncaught_exception(&self) -> bool;
    fn uncaught_exception(&self) -> ScriptValue;
    fn uncaught_exception_line(&self) -> Option<usize>;
    fn uncaught_exception_backtrace(&self) -> Vec<String>;

    fn global_namespace(&self) -> ScriptObject;
    fn set_global_namespace(&mut self, global: ScriptObject);

    /// Must not run script code.
    fn enumerate_properties(&self, value: &ScriptValue) -> Vec<Property>;

    /// For front ends that complete while the shell is blocked reading input and
    /// cannot borrow the engine. Must enumerate like `enumerate_properties`.
    fn property_enumerator(&self) -> PropertyEnumerator;

    fn event_throttle(&self) -> i32;
    fn set_event_throttle(&mut self, interval: i32);

    fn check_syntax_completeness(&self, text: &str) -> SyntaxCheck;

    /// The receiver that completion resolves `this` against.
    fn current_context(&self) -> ScriptValue {
        ScriptValue::Object(self.global_namespace())
    }

    fn runtime_version(&self) -> String;
}
