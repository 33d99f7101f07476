use std::fs;
use std::rc::Rc;

use sr_core::{HostFunction, PropertyFlags, ScriptObject, ScriptValue};

use crate::command::run_command;
use crate::help::help_message;
use crate::session::{PendingLoad, Session};
use crate::VERSION;

type HostResult = Result<ScriptValue, ScriptValue>;

/// Builds the object scripts use to talk to the shell. Every call returns a
/// distinct object sharing the same session.
pub(crate) fn build(session: &Rc<Session>) -> ScriptObject {
    let api = ScriptObject::new();

    define(&api, session, "print", |session, args| {
        session.print_values(args, false);
        Ok(ScriptValue::Undefined)
    });
    define(&api, session, "error", |session, args| {
        session.print_values(args, true);
        Ok(ScriptValue::Undefined)
    });
    define(&api, session, "exit", |session, args| {
        let code = args.first().and_then(ScriptValue::as_int).unwrap_or(0);
        session.request_exit(code as i32);
        Ok(ScriptValue::Undefined)
    });
    define(&api, session, "quit", |session, _| {
        session.request_exit(0);
        Ok(ScriptValue::Undefined)
    });
    define(&api, session, "help", |_, _| {
        Ok(ScriptValue::String(help_message(VERSION)))
    });
    define(&api, session, "load", load);
    define(&api, session, "importExtension", import_extension);
    define(&api, session, "read", read);
    define(&api, session, "readFile", |_, args| read_file(args));
    define(&api, session, "getFromEnvironment", |_, args| {
        let name = required_string("getFromEnvironment", args)?;
        Ok(std::env::var(name).map_or(ScriptValue::Null, ScriptValue::String))
    });
    api.define(
        "runCommand",
        ScriptValue::Function(
            HostFunction::new("runCommand", run_command).writing_back_options(),
        ),
        PropertyFlags::UNDELETABLE,
    );

    let state = Rc::clone(session);
    api.define_getter(
        "arguments",
        move || {
            ScriptValue::Array(
                state
                    .state
                    .borrow()
                    .arguments
                    .iter()
                    .map(|argument| ScriptValue::from(argument.as_str()))
                    .collect(),
            )
        },
        PropertyFlags::SEALED,
    );
    api.define_getter("version", || ScriptValue::from(VERSION), PropertyFlags::SEALED);
    api.define_getter("srVersion", || ScriptValue::from(VERSION), PropertyFlags::SEALED);
    let runtime = session.runtime_version().to_string();
    api.define_getter(
        "runtimeVersion",
        move || ScriptValue::from(runtime.as_str()),
        PropertyFlags::SEALED,
    );
    let registry = Rc::clone(session);
    api.define_getter(
        "availableExtensions",
        move || string_array(registry.extensions.borrow().available()),
        PropertyFlags::SEALED,
    );
    let registry = Rc::clone(session);
    api.define_getter(
        "importedExtensions",
        move || string_array(registry.extensions.borrow().imported().to_vec()),
        PropertyFlags::SEALED,
    );

    api
}

/// The `print` installed on an isolated global namespace.
pub(crate) fn print_function(session: &Rc<Session>) -> HostFunction {
    bind(session, "print", |session, args| {
        session.print_values(args, false);
        Ok(ScriptValue::Undefined)
    })
}

fn bind(
    session: &Rc<Session>,
    name: &str,
    action: impl Fn(&Session, &[ScriptValue]) -> HostResult + 'static,
) -> HostFunction {
    let session = Rc::clone(session);
    HostFunction::new(name, move |args| action(&session, args))
}

fn define(
    api: &ScriptObject,
    session: &Rc<Session>,
    name: &str,
    action: impl Fn(&Session, &[ScriptValue]) -> HostResult + 'static,
) {
    api.define(
        name,
        ScriptValue::Function(bind(session, name, action)),
        PropertyFlags::UNDELETABLE,
    );
}

fn string_array(items: Vec<String>) -> ScriptValue {
    ScriptValue::Array(items.into_iter().map(ScriptValue::String).collect())
}

fn required_string(function: &str, args: &[ScriptValue]) -> Result<String, ScriptValue> {
    match args.first() {
        Some(value) if !value.is_null_or_undefined() => Ok(value.to_string()),
        _ => Err(ScriptValue::String(format!(
            "{}: missing argument",
            function
        ))),
    }
}

fn read_file(args: &[ScriptValue]) -> HostResult {
    let name = required_string("readFile", args)?;
    fs::read_to_string(&name)
        .map(ScriptValue::String)
        .map_err(|error| ScriptValue::String(format!("readFile: cannot read {}: {}", name, error)))
}

fn load(session: &Session, args: &[ScriptValue]) -> HostResult {
    for file in args {
        let name = file.to_string();
        let source = fs::read_to_string(&name)
            .map_err(|error| ScriptValue::String(format!("load: cannot read {}: {}", name, error)))?;
        session.queue_load(PendingLoad { name, source });
    }
    Ok(ScriptValue::Undefined)
}

fn import_extension(session: &Session, args: &[ScriptValue]) -> HostResult {
    for name in args {
        let load = session
            .extensions
            .borrow_mut()
            .import(&name.to_string())
            .map_err(ScriptValue::String)?;
        if let Some(load) = load {
            session.queue_load(load);
        }
    }
    Ok(ScriptValue::Undefined)
}

fn read(session: &Session, args: &[ScriptValue]) -> HostResult {
    session.with_host(|host| {
        for (index, prompt) in args.iter().enumerate() {
            host.print_for_read(&prompt.to_string(), index + 1 == args.len());
        }
        Ok(host
            .read_line()
            .map_or(ScriptValue::Null, ScriptValue::String))
    })
}

#[cfg(test)]
mod host_api_tests {
    use super::*;
    use crate::host::BufferHost;
    use std::cell::Cell;

    fn session_with(host: BufferHost) -> Rc<Session> {
        Rc::new(Session::new(Box::new(host), "rhai test".to_string()))
    }

    fn call(api: &ScriptObject, name: &str, args: &[ScriptValue]) -> HostResult {
        match api.get(name) {
            Some(ScriptValue::Function(function)) => function.call(args),
            other => panic!("{} is not a function: {:?}", name, other),
        }
    }

    #[test]
    fn print_and_error_flag_the_last_piece() {
        let host = BufferHost::new();
        let api = build(&session_with(host.clone()));
        call(&api, "print", &["a".into(), ScriptValue::Int(1)]).expect("print");
        call(&api, "print", &[]).expect("print");
        call(&api, "error", &["bad".into()]).expect("error");
        assert_eq!(host.stdout(), "a 1\n\n");
        assert_eq!(host.stderr(), "bad\n");
    }

    #[test]
    fn exit_records_the_code_and_notifies() {
        let session = session_with(BufferHost::new());
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        session.set_finished_listener(Box::new(move |code| sink.set(Some(code))));
        let api = build(&session);

        call(&api, "exit", &[ScriptValue::Int(7)]).expect("exit");
        assert_eq!(seen.get(), Some(7));
        assert!(session.is_exit_requested());
        assert_eq!(session.state.borrow().exit_code, 7);

        call(&api, "quit", &[]).expect("quit");
        assert_eq!(session.state.borrow().exit_code, 0);
    }

    #[test]
    fn read_prompts_then_returns_a_line_or_null() {
        let host = BufferHost::with_input(["Ada"]);
        let api = build(&session_with(host.clone()));
        assert_eq!(
            call(&api, "read", &["name:".into()]),
            Ok(ScriptValue::from("Ada"))
        );
        assert_eq!(call(&api, "read", &[]), Ok(ScriptValue::Null));
        assert_eq!(host.stdout(), "name:");
    }

    #[test]
    fn read_only_properties_are_sealed_getters() {
        let session = session_with(BufferHost::new());
        session.state.borrow_mut().arguments = vec!["x".to_string()];
        let api = build(&session);
        assert_eq!(
            api.get("arguments"),
            Some(ScriptValue::Array(vec!["x".into()]))
        );
        assert_eq!(api.get("srVersion"), Some(ScriptValue::from(VERSION)));
        assert_eq!(api.get("runtimeVersion"), Some(ScriptValue::from("rhai test")));
        for name in ["arguments", "version", "importedExtensions", "availableExtensions"] {
            assert!(api.is_getter(name));
            assert_eq!(api.flags(name), Some(PropertyFlags::SEALED));
        }
        assert!(!api.remove("print"));
    }

    #[test]
    fn missing_files_throw() {
        let api = build(&session_with(BufferHost::new()));
        let error = call(&api, "readFile", &["/no/such/file.rhai".into()]).expect_err("throws");
        assert!(error.to_string().starts_with("readFile: cannot read"));
        assert!(call(&api, "load", &["/no/such/file.rhai".into()]).is_err());
        assert!(call(&api, "importExtension", &["nothing.here".into()]).is_err());
    }

    #[test]
    fn environment_lookup() {
        let api = build(&session_with(BufferHost::new()));
        assert_eq!(
            call(&api, "getFromEnvironment", &["SR_SHELL_SURELY_UNSET_VARIABLE".into()]),
            Ok(ScriptValue::Null)
        );
        assert!(call(&api, "getFromEnvironment", &[]).is_err());
    }

    #[test]
    fn help_mentions_the_version() {
        let api = build(&session_with(BufferHost::new()));
        let text = call(&api, "help", &[]).expect("help").to_string();
        assert!(text.contains(VERSION));
    }
}
