mod binding;
mod command;
mod completion;
mod extensions;
mod help;
mod host;
mod host_api;
mod session;
mod shell;
mod source;
mod state;

pub use completion::complete_expression;
pub use extensions::{is_valid_extension_name, ExtensionRegistry, EXTENSION_FILE_SUFFIX};
pub use help::help_message;
pub use host::{BufferHost, ExceptionReport, ShellHost, Transcript};
pub use shell::Shell;
pub use source::{BufferSource, ReadRequest, SentenceSource};
pub use state::ShellState;

/// Version reported to scripts as `version` and `srVersion`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
