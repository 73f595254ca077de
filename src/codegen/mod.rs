mod module;

pub use module::{ModuleParams, render_module};
