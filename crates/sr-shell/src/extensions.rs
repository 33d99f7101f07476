use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::session::PendingLoad;

pub const EXTENSION_FILE_SUFFIX: &str = "rhai";

const EXTENSION_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$";

fn extension_name_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(EXTENSION_NAME_PATTERN).ok())
        .as_ref()
}

pub fn is_valid_extension_name(name: &str) -> bool {
    extension_name_regex().is_some_and(|pattern| pattern.is_match(name))
}

/// Script extensions found under a list of directories. `util.strings` lives in
/// `<dir>/util/strings.rhai`; the first directory that has it wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionRegistry {
    search_paths: Vec<PathBuf>,
    imported: Vec<String>,
}

impl ExtensionRegistry {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            imported: Vec::new(),
        }
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.search_paths.contains(&path) {
            self.search_paths.push(path);
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn available(&self) -> Vec<String> {
        let mut names = Vec::new();
        for root in &self.search_paths {
            if !root.is_dir() {
                log::debug!("skipping missing extension directory {}", root.display());
                continue;
            }
            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(name) = extension_name(root, entry.path()) {
                    names.push(name);
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }

    pub fn imported(&self) -> &[String] {
        &self.imported
    }

    pub fn is_imported(&self, name: &str) -> bool {
        self.imported.iter().any(|known| known == name)
    }

    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        if !is_valid_extension_name(name) {
            return None;
        }
        let mut relative = name.split('.').collect::<PathBuf>();
        relative.set_extension(EXTENSION_FILE_SUFFIX);
        self.search_paths
            .iter()
            .map(|root| root.join(&relative))
            .find(|candidate| candidate.is_file())
    }

    /// Marks `name` imported and returns its script, or `None` when it already was.
    pub(crate) fn import(&mut self, name: &str) -> Result<Option<PendingLoad>, String> {
        if self.is_imported(name) {
            return Ok(None);
        }
        let path = self
            .locate(name)
            .ok_or_else(|| format!("importExtension: extension \"{}\" not found", name))?;
        let source = fs::read_to_string(&path).map_err(|error| {
            format!(
                "importExtension: cannot read {}: {}",
                path.display(),
                error
            )
        })?;
        self.imported.push(name.to_string());
        log::debug!("importing extension {} from {}", name, path.display());
        Ok(Some(PendingLoad {
            name: path.to_string_lossy().to_string(),
            source,
        }))
    }

    pub fn clear_imported(&mut self) {
        self.imported.clear();
    }
}

fn extension_name(root: &Path, path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != EXTENSION_FILE_SUFFIX {
        return None;
    }
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    let name = parts.join(".");
    is_valid_extension_name(&name).then_some(name)
}
