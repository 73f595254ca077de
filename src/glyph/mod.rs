mod builder;

pub use builder::{BuildOptions, build_glyph};
