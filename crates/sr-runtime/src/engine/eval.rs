use rhai::{Dynamic, Engine, EvalAltResult, Position, Scope};
use sr_core::{EvaluationOutcome, HostFunction, PropertyFlags, ScriptObject, ScriptValue};

use super::register::{
    register_free_function, register_method_function, register_options_alias,
    register_print_overloads, PendingPrint,
};
use super::RhaiEngine;
use crate::helpers::options_call::{options_alias, route_option_calls};
use crate::helpers::rhai_bridge::{assign_dynamic, dynamic_to_value, value_to_dynamic, HostSymbols};

type FreeFunctions = Vec<(String, HostFunction)>;

impl RhaiEngine {
    pub(super) fn run(&mut self, source: &str, name: &str, start_line: usize) -> EvaluationOutcome {
        let writers = self.option_writers();
        let paths = writers.iter().map(|(path, _)| path.clone()).collect::<Vec<_>>();
        let routed = route_option_calls(source, &paths);
        let mut compiled = match self.parser.compile(routed.as_ref()) {
            Ok(ast) => ast,
            Err(error) => {
                return EvaluationOutcome::exception(
                    ScriptValue::String(format!("SyntaxError: {}", error.err_type())),
                    shift_line(error.position(), start_line),
                    Vec::new(),
                );
            }
        };
        if !name.is_empty() {
            compiled.set_source(name);
        }

        let mut symbols = HostSymbols::default();
        let (mut scope, free_functions) = self.materialize_scope(&mut symbols);
        let mut engine = self.build_engine(&free_functions, &symbols);
        for (path, function) in &writers {
            register_options_alias(&mut engine, &options_alias(path), function);
        }

        let program = self.script_functions.merge(&compiled);
        let result = engine.eval_ast_with_scope::<Dynamic>(&mut scope, &program);
        self.script_functions = self
            .script_functions
            .merge(&compiled.clone_functions_only());
        self.write_back_scope(&scope, &symbols);

        match result {
            Ok(value) => EvaluationOutcome::value(dynamic_to_value(value, &symbols)),
            Err(error) => exception_outcome(*error, start_line, &symbols),
        }
    }

    /// Host functions at the top level become native functions; everything else
    /// becomes a scope variable, read-only entries as constants.
    fn materialize_scope(&self, symbols: &mut HostSymbols) -> (Scope<'static>, FreeFunctions) {
        let mut scope = Scope::new();
        let mut functions = Vec::new();
        for property in self.global.properties() {
            if let ScriptValue::Function(function) = &property.value {
                functions.push((property.name, function.clone()));
                continue;
            }
            let value = value_to_dynamic(&property.value, symbols);
            if property.read_only {
                scope.push_constant_dynamic(property.name, value);
            } else {
                scope.push_dynamic(property.name, value);
            }
        }
        (scope, functions)
    }

    /// Host functions that update a trailing option object, by dotted path.
    fn option_writers(&self) -> FreeFunctions {
        let mut writers = Vec::new();
        let mut ancestors = vec![self.global.id()];
        collect_option_writers(&self.global, "", &mut ancestors, &mut writers);
        writers
    }

    fn build_engine(&self, functions: &[(String, HostFunction)], symbols: &HostSymbols) -> Engine {
        let mut engine = Engine::new();

        let print = functions
            .iter()
            .find(|(name, _)| name == "print")
            .map(|(_, function)| function.clone());
        let pending = PendingPrint::default();
        register_print_overloads(&mut engine, &pending);
        engine.on_print(move |text| {
            let values = pending
                .borrow_mut()
                .take()
                .unwrap_or_else(|| vec![ScriptValue::from(text)]);
            match &print {
                Some(function) => {
                    if let Err(thrown) = function.call(&values) {
                        log::warn!("print raised {}", thrown);
                    }
                }
                None => {
                    let pieces = values.iter().map(ToString::to_string).collect::<Vec<_>>();
                    println!("{}", pieces.join(" "));
                }
            }
        });
        engine.on_debug(|text, source, position| {
            log::debug!("{} @ {}:{}", text, source.unwrap_or("<input>"), position);
        });

        for (name, function) in functions {
            if name != "print" {
                register_free_function(&mut engine, name, function);
            }
        }
        for (symbol, function) in symbols.iter() {
            register_method_function(&mut engine, symbol, function);
        }

        if self.event_throttle > 0 {
            let interval = self.event_throttle as u64;
            engine.on_progress(move |operations| {
                if operations % interval == 0 {
                    log::trace!("yielding after {} operations", operations);
                    std::thread::yield_now();
                }
                None
            });
        }
        engine
    }

    /// Later scope entries shadow earlier ones with the same name.
    fn write_back_scope(&self, scope: &Scope<'static>, symbols: &HostSymbols) {
        let mut latest: Vec<(String, bool, Dynamic)> = Vec::new();
        for (name, constant, value) in scope.iter() {
            match latest.iter_mut().find(|(known, _, _)| known == name) {
                Some(slot) => *slot = (name.to_string(), constant, value),
                None => latest.push((name.to_string(), constant, value)),
            }
        }
        for (name, constant, value) in latest {
            if constant {
                self.keep_constant(&name, value, symbols);
            } else {
                assign_dynamic(&self.global, &name, value, symbols);
            }
        }
    }

    /// A `const` declared by the script stays read-only in the global namespace.
    /// Constants that mirror read-only globals or getters are left as they are.
    fn keep_constant(&self, name: &str, value: Dynamic, symbols: &HostSymbols) {
        if self.global.is_getter(name) {
            return;
        }
        let flags = self.global.flags(name).unwrap_or_default();
        if flags.read_only {
            return;
        }
        let flags = PropertyFlags {
            read_only: true,
            ..flags
        };
        self.global
            .define(name, dynamic_to_value(value, symbols), flags);
    }
}

const MAX_WRITER_DEPTH: usize = 4;

fn collect_option_writers(
    object: &ScriptObject,
    prefix: &str,
    ancestors: &mut Vec<usize>,
    writers: &mut FreeFunctions,
) {
    for property in object.properties() {
        let path = format!("{}{}", prefix, property.name);
        match property.value {
            ScriptValue::Function(function) if function.writes_back_options() => {
                writers.push((path, function));
            }
            ScriptValue::Object(child)
                if ancestors.len() < MAX_WRITER_DEPTH && !ancestors.contains(&child.id()) =>
            {
                ancestors.push(child.id());
                collect_option_writers(&child, &format!("{}.", path), ancestors, writers);
                ancestors.pop();
            }
            _ => {}
        }
    }
}

fn shift_line(position: Position, start_line: usize) -> Option<usize> {
    position
        .line()
        .map(|line| (line + start_line).saturating_sub(1))
}

fn exception_outcome(error: EvalAltResult, start_line: usize, symbols: &HostSymbols) -> EvaluationOutcome {
    let mut backtrace = Vec::new();
    let mut current = error;
    while let EvalAltResult::ErrorInFunctionCall(name, source, inner, position) = current {
        backtrace.push(frame_label(&name, &source, shift_line(position, start_line)));
        current = *inner;
    }

    let line = shift_line(current.position(), start_line);
    let exception = match current {
        EvalAltResult::ErrorRuntime(value, _) => dynamic_to_value(value, symbols),
        mut other => {
            other.clear_position();
            ScriptValue::String(other.to_string())
        }
    };
    EvaluationOutcome::exception(exception, line, backtrace)
}

fn frame_label(name: &str, source: &str, line: Option<usize>) -> String {
    let source = if source.is_empty() { "<input>" } else { source };
    match line {
        Some(line) => format!("{}() at {}:{}", name, source, line),
        None => format!("{}() at {}", name, source),
    }
}
