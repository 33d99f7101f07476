use std::rc::Rc;

use sr_core::{PropertyFlags, ScriptEngine, ScriptObject, ScriptValue};

use crate::host_api;
use crate::session::Session;

/// Publishes the host API into `engine`'s global namespace.
///
/// With `use_global_engine` the API object becomes the global namespace and the
/// previous globals are copied onto it, except `print`. Otherwise the globals stay
/// and only an undeletable `print` is added. Either way the namespace gains
/// `sr.engine`, a separate API object.
pub(crate) fn install(engine: &mut dyn ScriptEngine, session: &Rc<Session>) {
    let merge = session.state.borrow().use_global_engine;
    let global = if merge {
        merge_into_host_api(engine, session)
    } else {
        let global = engine.global_namespace();
        global.define(
            "print",
            ScriptValue::Function(host_api::print_function(session)),
            PropertyFlags::UNDELETABLE,
        );
        global
    };

    let sr = ScriptObject::new();
    sr.define(
        "engine",
        ScriptValue::Object(host_api::build(session)),
        PropertyFlags::UNDELETABLE,
    );
    global.define("sr", ScriptValue::Object(sr), PropertyFlags::UNDELETABLE);
    log::debug!(
        "host API installed ({})",
        if merge { "merged" } else { "isolated" }
    );
}

fn merge_into_host_api(engine: &mut dyn ScriptEngine, session: &Rc<Session>) -> ScriptObject {
    let api = host_api::build(session);
    let current = engine.global_namespace();
    for property in engine.enumerate_properties(&ScriptValue::Object(current.clone())) {
        if property.name == "print" {
            continue;
        }
        let flags = current.flags(&property.name).unwrap_or(PropertyFlags::NONE);
        api.define(&property.name, property.value, flags);
    }
    engine.set_global_namespace(api.clone());
    api
}

#[cfg(test)]
mod binding_tests {
    use super::*;
    use crate::host::BufferHost;
    use sr_runtime::RhaiEngine;

    fn session(merge: bool) -> Rc<Session> {
        let session = Rc::new(Session::new(Box::new(BufferHost::new()), String::new()));
        session.state.borrow_mut().use_global_engine = merge;
        session
    }

    #[test]
    fn merge_keeps_globals_and_replaces_print() {
        let mut engine = RhaiEngine::new();
        let before = engine.global_namespace();
        before.set("x", ScriptValue::Int(1));
        let old_print = before.get("print");

        install(&mut engine, &session(true));

        let global = engine.global_namespace();
        assert!(!global.ptr_eq(&before));
        assert_eq!(global.get("x"), Some(ScriptValue::Int(1)));
        assert_ne!(global.get("print"), old_print);
        assert!(matches!(global.get("exit"), Some(ScriptValue::Function(_))));
        assert!(global.is_getter("srVersion"));
        assert!(matches!(global.get("sr"), Some(ScriptValue::Object(_))));
        assert!(!global.remove("sr"));
    }

    #[test]
    fn isolate_adds_print_and_leaves_globals() {
        let mut engine = RhaiEngine::new();
        let before = engine.global_namespace();
        before.set("x", ScriptValue::Int(1));

        install(&mut engine, &session(false));

        let global = engine.global_namespace();
        assert!(global.ptr_eq(&before));
        assert_eq!(global.get("x"), Some(ScriptValue::Int(1)));
        assert!(!global.contains("exit"));
        assert_eq!(global.flags("print"), Some(PropertyFlags::UNDELETABLE));
        assert!(!global.remove("print"));

        let sr_engine = ScriptValue::Object(global).property("sr").property("engine");
        assert!(matches!(sr_engine.property("exit"), ScriptValue::Function(_)));
        assert!(matches!(sr_engine.property("version"), ScriptValue::String(_)));
    }

    #[test]
    fn sr_engine_is_a_separate_object() {
        let mut engine = RhaiEngine::new();
        install(&mut engine, &session(true));
        let global = engine.global_namespace();
        let sr_engine = ScriptValue::Object(global.clone())
            .property("sr")
            .property("engine");
        let Some(inner) = sr_engine.as_object() else {
            panic!("sr.engine missing");
        };
        assert!(!inner.ptr_eq(&global));
        assert!(!inner.contains("sr"));
    }
}
