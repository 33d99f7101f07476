pub mod engine;
pub mod error;
pub mod types;
pub mod value;

pub use engine::{PropertyEnumerator, ScriptEngine};
pub use error::ShellError;
pub use types::*;
pub use value::*;
