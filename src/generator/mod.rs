mod font;

pub use font::{FontArtifacts, build_font};
