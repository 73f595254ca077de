use kurbo::{BezPath, Rect};

/// A named icon glyph, ready for CharString encoding.
///
/// Outlines are cubic-only and expressed in font units (Y up, baseline at
/// zero) once the builder has run.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub name: String,
    pub unicode: u32,
    pub outlines: Vec<BezPath>,
    pub advance_width: u16,
    /// Tight bounding box over all outlines; `None` for an empty glyph.
    pub bounds: Option<Rect>,
}

impl Glyph {
    pub fn is_empty(&self) -> bool {
        self.outlines.iter().all(|path| path.elements().is_empty())
    }
}
