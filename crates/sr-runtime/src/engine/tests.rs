use std::cell::RefCell;
use std::rc::Rc;

use sr_core::{HostFunction, PropertyFlags, ScriptEngine, ScriptObject, ScriptValue, SyntaxCheck};

use super::RhaiEngine;

fn capture_print(engine: &RhaiEngine) -> Rc<RefCell<Vec<String>>> {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lines);
    engine.global_namespace().define(
        "print",
        ScriptValue::Function(HostFunction::new("print", move |args| {
            let text = args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            sink.borrow_mut().push(text);
            Ok(ScriptValue::Undefined)
        })),
        PropertyFlags::UNDELETABLE,
    );
    lines
}

#[test]
fn evaluates_expressions() {
    let mut engine = RhaiEngine::new();
    let outcome = engine.evaluate("1 + 2", "", 1);
    assert!(!outcome.has_uncaught_exception);
    assert_eq!(outcome.result, ScriptValue::Int(3));
    assert!(!engine.has_uncaught_exception());
}

#[test]
fn variables_persist_between_evaluations() {
    let mut engine = RhaiEngine::new();
    engine.evaluate("let answer = 40;", "", 1);
    assert_eq!(
        engine.global_namespace().get("answer"),
        Some(ScriptValue::Int(40))
    );
    let outcome = engine.evaluate("answer + 2", "", 2);
    assert_eq!(outcome.result, ScriptValue::Int(42));
}

#[test]
fn script_functions_persist_between_evaluations() {
    let mut engine = RhaiEngine::new();
    engine.evaluate("fn twice(v) { v * 2 }", "", 1);
    assert_eq!(engine.script_function_names(), vec!["twice".to_string()]);
    assert_eq!(engine.evaluate("twice(21)", "", 2).result, ScriptValue::Int(42));
}

#[test]
fn thrown_values_report_shifted_lines() {
    let mut engine = RhaiEngine::new();
    let outcome = engine.evaluate("let a = 1;\nthrow \"boom\";", "input", 5);
    assert!(outcome.has_uncaught_exception);
    assert_eq!(outcome.exception, ScriptValue::from("boom"));
    assert_eq!(outcome.exception_line, Some(6));
    assert!(engine.has_uncaught_exception());
    assert_eq!(engine.uncaught_exception(), ScriptValue::from("boom"));
    assert_eq!(engine.uncaught_exception_line(), Some(6));

    engine.evaluate("1", "input", 7);
    assert!(!engine.has_uncaught_exception());
}

#[test]
fn syntax_errors_become_exceptions() {
    let mut engine = RhaiEngine::new();
    let outcome = engine.evaluate("let = ;", "input", 3);
    assert!(outcome.has_uncaught_exception);
    assert!(outcome.exception.to_string().starts_with("SyntaxError"));
    assert_eq!(outcome.exception_line, Some(3));
}

#[test]
fn nested_calls_build_a_backtrace() {
    let mut engine = RhaiEngine::new();
    let outcome = engine.evaluate(
        "fn inner() { throw \"deep\" }\nfn outer() { inner() }\nouter()",
        "trace",
        1,
    );
    assert_eq!(outcome.exception, ScriptValue::from("deep"));
    assert!(!outcome.backtrace.is_empty());
    assert!(outcome.backtrace[0].starts_with("outer()"));
    assert_eq!(engine.uncaught_exception_backtrace(), outcome.backtrace);
}

#[test]
fn read_only_globals_are_constants() {
    let mut engine = RhaiEngine::new();
    engine
        .global_namespace()
        .define("version", "1.0".into(), PropertyFlags::READ_ONLY);
    assert_eq!(engine.evaluate("version", "", 1).result, ScriptValue::from("1.0"));
    let outcome = engine.evaluate("version = \"2.0\";", "", 1);
    assert!(outcome.has_uncaught_exception);
    assert_eq!(
        engine.global_namespace().get("version"),
        Some(ScriptValue::from("1.0"))
    );
}

#[test]
fn script_constants_persist_between_evaluations() {
    let mut engine = RhaiEngine::new();
    let declared = engine.evaluate("const LIMIT = 5;", "", 1);
    assert!(!declared.has_uncaught_exception);
    assert_eq!(
        engine.global_namespace().flags("LIMIT"),
        Some(PropertyFlags::READ_ONLY)
    );
    assert_eq!(engine.evaluate("LIMIT * 2", "", 2).result, ScriptValue::Int(10));

    let outcome = engine.evaluate("LIMIT = 6;", "", 3);
    assert!(outcome.has_uncaught_exception);
    assert_eq!(
        engine.global_namespace().get("LIMIT"),
        Some(ScriptValue::Int(5))
    );
}

#[test]
fn host_functions_accept_any_arity() {
    let mut engine = RhaiEngine::new();
    engine.global_namespace().define(
        "count",
        ScriptValue::Function(HostFunction::new("count", |args| {
            Ok(ScriptValue::Int(args.len() as i64))
        })),
        PropertyFlags::NONE,
    );
    assert_eq!(engine.evaluate("count()", "", 1).result, ScriptValue::Int(0));
    assert_eq!(
        engine.evaluate("count(1, \"a\", [3])", "", 1).result,
        ScriptValue::Int(3)
    );
}

#[test]
fn host_errors_are_thrown_into_scripts() {
    let mut engine = RhaiEngine::new();
    engine.global_namespace().define(
        "fail",
        ScriptValue::Function(HostFunction::new("fail", |_| Err("bad input".into()))),
        PropertyFlags::NONE,
    );
    let outcome = engine.evaluate("fail()", "", 1);
    assert_eq!(outcome.exception, ScriptValue::from("bad input"));

    let caught = engine.evaluate(
        "let seen = 0;\ntry { fail(); } catch (e) { seen = e; }\nseen",
        "",
        1,
    );
    assert!(!caught.has_uncaught_exception);
    assert_eq!(caught.result, ScriptValue::from("bad input"));
}

#[test]
fn print_is_routed_to_the_global_function() {
    let mut engine = RhaiEngine::new();
    let lines = capture_print(&engine);
    engine.evaluate("print(\"hi\"); print(40 + 2);", "", 1);
    assert_eq!(*lines.borrow(), vec!["hi".to_string(), "42".to_string()]);
}

#[test]
fn print_takes_any_number_of_arguments() {
    let mut engine = RhaiEngine::new();
    let lines = capture_print(&engine);
    let outcome = engine.evaluate("print(\"a\", 1); print(); print(1, 2, 3, 4, 5, 6);", "", 1);
    assert!(!outcome.has_uncaught_exception);
    assert_eq!(
        *lines.borrow(),
        vec!["a 1".to_string(), String::new(), "1 2 3 4 5 6".to_string()]
    );
}

#[test]
fn functions_inside_objects_are_callable_as_methods() {
    let mut engine = RhaiEngine::new();
    let api = ScriptObject::new().with(
        "sum",
        HostFunction::new("sum", |args| {
            Ok(ScriptValue::Int(args.iter().filter_map(ScriptValue::as_int).sum()))
        }),
    );
    engine
        .global_namespace()
        .define("api", ScriptValue::Object(api.clone()), PropertyFlags::UNDELETABLE);

    assert_eq!(engine.evaluate("api.sum(1, 2, 3)", "", 1).result, ScriptValue::Int(6));
    assert!(matches!(api.get("sum"), Some(ScriptValue::Function(_))));
}

#[test]
fn option_objects_passed_last_are_updated() {
    let mut engine = RhaiEngine::new();
    let stamp = HostFunction::new("stamp", |args| {
        if let Some(ScriptValue::Object(options)) = args.last() {
            options.set("seen", ScriptValue::Int(args.len() as i64));
        }
        Ok(ScriptValue::Undefined)
    })
    .writing_back_options();
    let global = engine.global_namespace();
    global.define("stamp", ScriptValue::Function(stamp.clone()), PropertyFlags::NONE);
    global.define(
        "tools",
        ScriptValue::Object(ScriptObject::new().with("stamp", stamp)),
        PropertyFlags::NONE,
    );

    let outcome = engine.evaluate(
        "let o = #{};\nstamp(\"a\", \"b\", o);\nlet p = #{};\ntools.stamp(p);\n[o.seen, p.seen, stamp(1, 2)]",
        "",
        1,
    );

    assert!(!outcome.has_uncaught_exception);
    assert_eq!(
        outcome.result,
        ScriptValue::Array(vec![ScriptValue::Int(3), ScriptValue::Int(1), ScriptValue::Undefined])
    );
}

#[test]
fn object_mutations_write_back_into_live_objects() {
    let mut engine = RhaiEngine::new();
    let config = ScriptObject::new().with("a", 1i64);
    config.define_getter("now", || ScriptValue::Int(9), PropertyFlags::NONE);
    engine
        .global_namespace()
        .define("config", ScriptValue::Object(config.clone()), PropertyFlags::NONE);

    engine.evaluate("config.a = 2; config.b = 3;", "", 1);

    assert!(engine
        .global_namespace()
        .get("config")
        .and_then(|value| value.as_object().map(|object| object.ptr_eq(&config)))
        .unwrap_or(false));
    assert_eq!(config.get("a"), Some(ScriptValue::Int(2)));
    assert_eq!(config.get("b"), Some(ScriptValue::Int(3)));
    assert!(config.is_getter("now"));
}

#[test]
fn objects_can_be_cleared_but_cycles_survive() {
    let mut engine = RhaiEngine::new();
    engine.evaluate("let a = #{ x: 1 };", "", 1);
    engine.evaluate("a = ();", "", 2);
    assert_eq!(engine.global_namespace().get("a"), Some(ScriptValue::Undefined));
    assert_eq!(engine.evaluate("type_of(a)", "", 3).result, ScriptValue::from("()"));

    let node = ScriptObject::new().with("x", 1i64);
    node.set("me", ScriptValue::Object(node.clone()));
    engine
        .global_namespace()
        .define("node", ScriptValue::Object(node.clone()), PropertyFlags::NONE);
    engine.evaluate("node.x = 2;", "", 4);
    assert_eq!(node.get("x"), Some(ScriptValue::Int(2)));
    assert_eq!(node.get("me"), Some(ScriptValue::Object(node.clone())));
}

#[test]
fn opaque_values_survive_between_evaluations() {
    let mut engine = RhaiEngine::new();
    engine.evaluate("let f = Fn(\"abs\");", "", 1);
    assert!(matches!(
        engine.global_namespace().get("f"),
        Some(ScriptValue::Opaque(_))
    ));
    assert_eq!(engine.evaluate("type_of(f)", "", 2).result, ScriptValue::from("Fn"));
}

#[test]
fn syntax_completeness_classification() {
    let engine = RhaiEngine::new();
    assert_eq!(engine.check_syntax_completeness(""), SyntaxCheck::Valid);
    assert_eq!(engine.check_syntax_completeness("let x = 1;"), SyntaxCheck::Valid);
    assert_eq!(
        engine.check_syntax_completeness("fn f() {\n  1\n}"),
        SyntaxCheck::Valid
    );
    assert_eq!(
        engine.check_syntax_completeness("fn f() {"),
        SyntaxCheck::Intermediate
    );
    assert_eq!(
        engine.check_syntax_completeness("let s = `abc"),
        SyntaxCheck::Intermediate
    );
    assert!(matches!(
        engine.check_syntax_completeness("1 + )"),
        SyntaxCheck::Error { line: Some(1), .. }
    ));
    assert!(matches!(
        engine.check_syntax_completeness("let = ;"),
        SyntaxCheck::Error { .. }
    ));
}

#[test]
fn event_throttle_is_kept() {
    let mut engine = RhaiEngine::new();
    assert_eq!(engine.event_throttle(), -1);
    engine.set_event_throttle(10);
    assert_eq!(engine.event_throttle(), 10);
    let outcome = engine.evaluate("let t = 0; for i in 0..100 { t += i; } t", "", 1);
    assert_eq!(outcome.result, ScriptValue::Int(4950));
}

#[test]
fn replacing_the_global_namespace() {
    let mut engine = RhaiEngine::new();
    let global = ScriptObject::new().with("x", 5i64);
    engine.set_global_namespace(global.clone());
    assert!(engine.global_namespace().ptr_eq(&global));
    assert_eq!(engine.evaluate("x * 2", "", 1).result, ScriptValue::Int(10));
    assert_eq!(engine.runtime_version(), super::RUNTIME_VERSION);
}
