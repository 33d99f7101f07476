use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use serde::Serialize;
use sr_shell::{BufferHost, BufferSource, Shell};

use crate::source::{read_file, read_test_case};
use crate::{ExpectedTranscript, SrToolError, TestCase};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub transcript: ExpectedTranscript,
    /// Code passed to the finished listener, if it fired.
    pub finished_code: Option<i32>,
    pub exit_called: bool,
}

/// Runs the case's entry script in a fresh shell with an in-memory host. The
/// case directory doubles as the extension search path.
pub fn run_case(case_dir: &Path, case: &TestCase) -> Result<RunReport, SrToolError> {
    let script = read_file(&case_dir.join(&case.entry_script))?;
    let host = BufferHost::with_input(case.input.iter().cloned());
    let mut shell = Shell::new(host.clone());
    shell.set_source_name(case.entry_script.as_str());
    shell.set_use_global_engine(!case.isolate);
    shell.set_arguments(case.arguments.clone());
    shell.add_extension_path(case_dir);

    let finished = Rc::new(Cell::new(None));
    let sink = Rc::clone(&finished);
    shell.on_finished(move |code| sink.set(Some(code)));

    log::debug!("running {} in {} mode", case_dir.display(), case.mode);
    let mut source = BufferSource::new(&script);
    shell.run(case.mode, &mut source)?;

    Ok(RunReport {
        transcript: ExpectedTranscript {
            stdout: host.stdout(),
            stderr: host.stderr(),
            exit_code: shell.exit_code(),
        },
        finished_code: finished.get(),
        exit_called: shell.is_exit_called(),
    })
}

pub fn assert_case(case_dir: &Path, case_path: &Path) -> Result<RunReport, SrToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(case_dir, &case)?;
    let expected = &case.expected;
    let actual = &report.transcript;

    let mismatch = if expected.stdout != actual.stdout {
        Some(("stdout", quote(&expected.stdout)?, quote(&actual.stdout)?))
    } else if expected.stderr != actual.stderr {
        Some(("stderr", quote(&expected.stderr)?, quote(&actual.stderr)?))
    } else if expected.exit_code != actual.exit_code {
        Some((
            "exitCode",
            expected.exit_code.to_string(),
            actual.exit_code.to_string(),
        ))
    } else {
        None
    };

    if let Some((field, expected, actual)) = mismatch {
        let observed =
            serde_json::to_string_pretty(&report).map_err(SrToolError::TranscriptSerialize)?;
        return Err(SrToolError::TranscriptMismatch {
            field,
            expected,
            actual,
            observed,
        });
    }
    Ok(report)
}

fn quote(text: &str) -> Result<String, SrToolError> {
    serde_json::to_string(text).map_err(SrToolError::TranscriptSerialize)
}
