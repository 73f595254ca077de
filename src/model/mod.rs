mod glyph;
mod icon;

pub use glyph::Glyph;
pub use icon::{IconEntry, IconSource};
