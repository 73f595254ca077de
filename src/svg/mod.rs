mod document;
mod path;
mod shapes;
mod transform;

pub use document::{Document, Element, Shape};
pub use path::parse_path;
pub use shapes::shape_to_path;
pub(crate) use transform::parse_transform;
