use serde::{Deserialize, Serialize};
use sr_core::RunMode;

pub const TESTCASE_SCHEMA_V1: &str = "sr-tool-case.v1";
pub const TESTCASE_FILE_NAME: &str = "testcase.json";

/// One scripted shell session and the transcript it must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_entry_script")]
    pub entry_script: String,
    #[serde(default = "default_mode")]
    pub mode: RunMode,
    #[serde(default)]
    pub isolate: bool,
    #[serde(default)]
    pub arguments: Vec<String>,
    /// Lines handed to `read(...)`.
    #[serde(default)]
    pub input: Vec<String>,
    pub expected: ExpectedTranscript,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedTranscript {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: i32,
}

fn default_entry_script() -> String {
    "main.rhai".to_string()
}

fn default_mode() -> RunMode {
    RunMode::Batch
}
