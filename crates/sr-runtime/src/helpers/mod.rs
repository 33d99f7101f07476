pub(crate) mod options_call;
pub(crate) mod rhai_bridge;
pub(crate) mod syntax;
