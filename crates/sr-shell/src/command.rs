use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use sr_core::{ScriptObject, ScriptValue};

pub(crate) const STATUS_LAUNCH_FAILED: i64 = -2;
pub(crate) const STATUS_CRASHED: i64 = -1;

#[derive(Debug, Default, PartialEq, Eq)]
struct CommandSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    input: Option<String>,
}

/// `runCommand(command, args..., [options])` or `runCommand(options)`.
///
/// The option object is updated in place with `output`, `err` and `result`
/// when the caller put those keys in it.
pub(crate) fn run_command(args: &[ScriptValue]) -> Result<ScriptValue, ScriptValue> {
    let (positional, options) = match args.split_last() {
        Some((ScriptValue::Object(options), rest)) => (rest, Some(options)),
        _ => (args, None),
    };
    let spec = command_spec(positional, options)?;
    let wants_output = options.is_some_and(|options| options.contains("output"));
    let wants_err = options.is_some_and(|options| options.contains("err"));

    let (status, stdout, stderr) = execute(&spec, wants_output, wants_err);

    if let Some(options) = options {
        if wants_output {
            append_text(options, "output", &stdout);
        }
        if wants_err {
            append_text(options, "err", &stderr);
        }
        if options.contains("result") {
            options.set("result", ScriptValue::Int(status));
        }
    }
    Ok(ScriptValue::Int(status))
}

fn command_spec(
    positional: &[ScriptValue],
    options: Option<&ScriptObject>,
) -> Result<CommandSpec, ScriptValue> {
    let option = |key: &str| options.and_then(|options| options.get(key));

    let mut spec = CommandSpec::default();
    let mut positional = positional.iter().map(ToString::to_string);
    spec.program = match positional.next() {
        Some(program) => program,
        None => match option("command") {
            Some(command) if !command.is_null_or_undefined() => command.to_string(),
            _ => return Err("runCommand: no command given".into()),
        },
    };
    spec.args.extend(positional);

    match option("args") {
        Some(ScriptValue::Array(items)) => spec.args.extend(items.iter().map(ToString::to_string)),
        Some(value) if !value.is_null_or_undefined() => spec.args.push(value.to_string()),
        _ => {}
    }
    if let Some(ScriptValue::Object(env)) = option("env") {
        spec.env = env
            .properties()
            .into_iter()
            .map(|property| (property.name, property.value.to_string()))
            .collect();
    }
    spec.input = option("input")
        .filter(|input| !input.is_null_or_undefined())
        .map(|input| input.to_string());
    Ok(spec)
}

fn execute(spec: &CommandSpec, capture_out: bool, capture_err: bool) -> (i64, String, String) {
    let pipe_or_inherit = |capture: bool| if capture { Stdio::piped() } else { Stdio::inherit() };

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(spec.env.iter().map(|(key, value)| (key, value)))
        .stdin(if spec.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(pipe_or_inherit(capture_out))
        .stderr(pipe_or_inherit(capture_err));

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(error) => {
            log::warn!("runCommand: cannot start {}: {}", spec.program, error);
            return (STATUS_LAUNCH_FAILED, String::new(), String::new());
        }
    };
    log::debug!("runCommand: started {} {:?}", spec.program, spec.args);

    let writer = match (child.stdin.take(), spec.input.clone()) {
        (Some(mut stdin), Some(input)) => Some(thread::spawn(move || {
            if let Err(error) = stdin.write_all(input.as_bytes()) {
                log::debug!("runCommand: input not fully written: {}", error);
            }
        })),
        _ => None,
    };

    let output = child.wait_with_output();
    if let Some(writer) = writer {
        if writer.join().is_err() {
            log::warn!("runCommand: input writer panicked");
        }
    }

    match output {
        Ok(output) => {
            let status = output.status.code().map_or(STATUS_CRASHED, i64::from);
            (
                status,
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            )
        }
        Err(error) => {
            log::warn!("runCommand: waiting for {} failed: {}", spec.program, error);
            (STATUS_CRASHED, String::new(), String::new())
        }
    }
}

fn append_text(options: &ScriptObject, key: &str, text: &str) {
    let previous = match options.get(key) {
        Some(value) if !value.is_null_or_undefined() => value.to_string(),
        _ => String::new(),
    };
    options.set(key, ScriptValue::String(previous + text));
}

#[cfg(test)]
mod command_tests {
    use super::*;

    #[test]
    fn positional_arguments_and_options_merge() {
        let options = ScriptObject::new()
            .with("args", vec![ScriptValue::from("-l")])
            .with("env", ScriptObject::new().with("LANG", "C"))
            .with("input", "data");
        let spec = command_spec(&["ls".into(), ScriptValue::Int(1)], Some(&options)).expect("spec");
        assert_eq!(spec.program, "ls");
        assert_eq!(spec.args, vec!["1", "-l"]);
        assert_eq!(spec.env, vec![("LANG".to_string(), "C".to_string())]);
        assert_eq!(spec.input.as_deref(), Some("data"));
    }

    #[test]
    fn command_can_come_from_options() {
        let options = ScriptObject::new().with("command", "echo");
        let spec = command_spec(&[], Some(&options)).expect("spec");
        assert_eq!(spec.program, "echo");
        assert!(command_spec(&[], None).is_err());
    }

    #[test]
    fn missing_program_reports_launch_failure() {
        let options = ScriptObject::new().with("result", ScriptValue::Null);
        let status = run_command(&[
            "sr-shell-no-such-program".into(),
            ScriptValue::Object(options.clone()),
        ])
        .expect("status");
        assert_eq!(status, ScriptValue::Int(STATUS_LAUNCH_FAILED));
        assert_eq!(options.get("result"), Some(ScriptValue::Int(STATUS_LAUNCH_FAILED)));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_feeds_input() {
        let options = ScriptObject::new()
            .with("input", "hello")
            .with("output", "> ")
            .with("err", ScriptValue::Null)
            .with("result", ScriptValue::Null);
        let status = run_command(&[
            "sh".into(),
            "-c".into(),
            "cat; echo warn >&2; exit 3".into(),
            ScriptValue::Object(options.clone()),
        ])
        .expect("status");
        assert_eq!(status, ScriptValue::Int(3));
        assert_eq!(options.get("output"), Some(ScriptValue::from("> hello")));
        assert_eq!(options.get("err"), Some(ScriptValue::from("warn\n")));
        assert_eq!(options.get("result"), Some(ScriptValue::Int(3)));
    }

    #[cfg(unix)]
    #[test]
    fn killed_process_reports_crash() {
        let status = run_command(&["sh".into(), "-c".into(), "kill -9 $$".into()]).expect("status");
        assert_eq!(status, ScriptValue::Int(STATUS_CRASHED));
    }
}
