/// Mutable bookkeeping of one `Shell`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    /// Line number the next sentence starts at.
    pub line_number: usize,
    pub initialized: bool,
    /// Merge the host API into the global namespace instead of only exposing `sr.engine`.
    pub use_global_engine: bool,
    pub exit_requested: bool,
    pub exit_code: i32,
    pub source_name: String,
    pub arguments: Vec<String>,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            line_number: 1,
            initialized: false,
            use_global_engine: true,
            exit_requested: false,
            exit_code: 0,
            source_name: String::new(),
            arguments: Vec::new(),
        }
    }
}

impl ShellState {
    pub fn display_source(&self) -> &str {
        if self.source_name.is_empty() {
            "<input>"
        } else {
            &self.source_name
        }
    }
}
