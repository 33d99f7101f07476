mod case;
mod runner;
mod source;

pub use case::{ExpectedTranscript, TestCase, TESTCASE_FILE_NAME, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{discover_cases, read_test_case};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SrToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No testcase.json files under {path}.")]
    SourceEmpty { path: PathBuf },
    #[error("Shell error: {0}")]
    Shell(#[from] sr_core::ShellError),
    #[error("Transcript mismatch in {field}. expected={expected} actual={actual} observed={observed}")]
    TranscriptMismatch {
        field: &'static str,
        expected: String,
        actual: String,
        observed: String,
    },
    #[error("Failed to serialize transcript for diff: {0}")]
    TranscriptSerialize(serde_json::Error),
}
