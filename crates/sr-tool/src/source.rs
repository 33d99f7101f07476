use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{SrToolError, TestCase, TESTCASE_FILE_NAME, TESTCASE_SCHEMA_V1};

/// Directories under `root` holding a `testcase.json`, sorted.
pub fn discover_cases(root: &Path) -> Result<Vec<PathBuf>, SrToolError> {
    let mut cases = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == TESTCASE_FILE_NAME)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect::<Vec<_>>();
    cases.sort();

    if cases.is_empty() {
        return Err(SrToolError::SourceEmpty {
            path: root.to_path_buf(),
        });
    }
    Ok(cases)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, SrToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| SrToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(SrToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

pub(crate) fn read_file(path: &Path) -> Result<String, SrToolError> {
    fs::read_to_string(path).map_err(|source| SrToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}
