mod engine;
mod helpers;

pub use engine::{RhaiEngine, MAX_HOST_FUNCTION_ARGS, RUNTIME_VERSION};
