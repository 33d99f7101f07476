use std::cell::RefCell;
use std::rc::Rc;

use rhai::{Dynamic, Engine, EvalAltResult, Position};
use sr_core::{HostFunction, ScriptValue};

use crate::helpers::rhai_bridge::{dynamic_to_value, value_to_dynamic, HostSymbols};

/// Rhai dispatches on arity, so variadic host functions are registered once per
/// argument count up to this limit.
pub const MAX_HOST_FUNCTION_ARGS: usize = 6;

type HostResult = Result<Dynamic, Box<EvalAltResult>>;

/// Arguments of a `print` call that did not take exactly one argument. Rhai
/// hands every `print` result to `on_print` as text, which then takes these.
pub(super) type PendingPrint = Rc<RefCell<Option<Vec<ScriptValue>>>>;

macro_rules! register_arity {
    ($engine:expr, $name:expr, $function:expr; $($arg:ident),*) => {{
        let function = $function.clone();
        $engine.register_fn($name, move |$($arg: Dynamic),*| -> HostResult {
            call_host(&function, vec![$($arg),*])
        });
    }};
}

macro_rules! register_options_arity {
    ($engine:expr, $name:expr, $function:expr; $($arg:ident),*) => {{
        let function = $function.clone();
        $engine.register_fn($name, move |options: &mut Dynamic, $($arg: Dynamic),*| -> HostResult {
            call_host_with_options(&function, options, vec![$($arg),*])
        });
    }};
}

macro_rules! register_method_arity {
    ($engine:expr, $name:expr, $function:expr; $($arg:ident),*) => {{
        let function = $function.clone();
        $engine.register_fn($name, move |_receiver: Dynamic, $($arg: Dynamic),*| -> HostResult {
            call_host(&function, vec![$($arg),*])
        });
    }};
}

macro_rules! register_print_arity {
    ($engine:expr, $pending:expr; $($arg:ident),*) => {{
        let pending = Rc::clone($pending);
        $engine.register_fn("print", move |$($arg: Dynamic),*| -> String {
            park_print(&pending, vec![$($arg),*])
        });
    }};
}

pub(super) fn register_free_function(engine: &mut Engine, name: &str, function: &HostFunction) {
    register_arity!(engine, name, function;);
    register_arity!(engine, name, function; a);
    register_arity!(engine, name, function; a, b);
    register_arity!(engine, name, function; a, b, c);
    register_arity!(engine, name, function; a, b, c, d);
    register_arity!(engine, name, function; a, b, c, d, e);
    register_arity!(engine, name, function; a, b, c, d, e, f);
}

/// Target of a routed call `alias(opts, args..., opts)`: the first `opts` arrives by
/// reference and receives the object the host function updated.
pub(super) fn register_options_alias(engine: &mut Engine, alias: &str, function: &HostFunction) {
    register_options_arity!(engine, alias, function; a);
    register_options_arity!(engine, alias, function; a, b);
    register_options_arity!(engine, alias, function; a, b, c);
    register_options_arity!(engine, alias, function; a, b, c, d);
    register_options_arity!(engine, alias, function; a, b, c, d, e);
    register_options_arity!(engine, alias, function; a, b, c, d, e, f);
}

/// Target of an `FnPtr` stored in a map: `map.name(args)` passes the map first.
pub(super) fn register_method_function(engine: &mut Engine, symbol: &str, function: &HostFunction) {
    register_method_arity!(engine, symbol, function;);
    register_method_arity!(engine, symbol, function; a);
    register_method_arity!(engine, symbol, function; a, b);
    register_method_arity!(engine, symbol, function; a, b, c);
    register_method_arity!(engine, symbol, function; a, b, c, d);
    register_method_arity!(engine, symbol, function; a, b, c, d, e);
    register_method_arity!(engine, symbol, function; a, b, c, d, e, f);
}

/// Arity one stays with Rhai's own `print`, which formats the value.
pub(super) fn register_print_overloads(engine: &mut Engine, pending: &PendingPrint) {
    register_print_arity!(engine, pending;);
    register_print_arity!(engine, pending; a, b);
    register_print_arity!(engine, pending; a, b, c);
    register_print_arity!(engine, pending; a, b, c, d);
    register_print_arity!(engine, pending; a, b, c, d, e);
    register_print_arity!(engine, pending; a, b, c, d, e, f);
}

fn park_print(pending: &PendingPrint, args: Vec<Dynamic>) -> String {
    let symbols = HostSymbols::default();
    let values = args
        .into_iter()
        .map(|arg| dynamic_to_value(arg, &symbols))
        .collect();
    *pending.borrow_mut() = Some(values);
    String::new()
}

fn call_host(function: &HostFunction, args: Vec<Dynamic>) -> HostResult {
    let mut symbols = HostSymbols::default();
    let values = args
        .into_iter()
        .map(|arg| dynamic_to_value(arg, &symbols))
        .collect::<Vec<_>>();
    finish_call(function.call(&values), &mut symbols)
}

fn call_host_with_options(function: &HostFunction, options: &mut Dynamic, args: Vec<Dynamic>) -> HostResult {
    let mut symbols = HostSymbols::default();
    let values = args
        .into_iter()
        .map(|arg| dynamic_to_value(arg, &symbols))
        .collect::<Vec<_>>();

    let result = function.call(&values);
    if let Some(ScriptValue::Object(updated)) = values.last() {
        *options = value_to_dynamic(&ScriptValue::Object(updated.clone()), &mut symbols);
    }
    finish_call(result, &mut symbols)
}

fn finish_call(result: Result<ScriptValue, ScriptValue>, symbols: &mut HostSymbols) -> HostResult {
    match result {
        Ok(value) => Ok(value_to_dynamic(&value, symbols)),
        Err(thrown) => Err(Box::new(EvalAltResult::ErrorRuntime(
            value_to_dynamic(&thrown, symbols),
            Position::NONE,
        ))),
    }
}
