use kurbo::{BezPath, PathEl, Point};
use svgtypes::{SimplePathSegment, SimplifyingPathParser};

use crate::error::Error;

/// Parse a path `d` attribute into absolute path elements.
///
/// The simplifying parser resolves relative commands, splits implicit
/// command repeats into independent segments, reflects the smooth
/// shorthand control points and lowers elliptical arcs to cubics, so the
/// output alphabet is MoveTo/LineTo/QuadTo/CurveTo/ClosePath only.
/// Quadratics are kept as-is; the glyph builder raises them later.
pub fn parse_path(d: &str) -> Result<BezPath, Error> {
    let mut path = BezPath::new();

    for segment in SimplifyingPathParser::from(d) {
        let segment =
            segment.map_err(|e| Error::MalformedSvg(format!("invalid path data: {e}")))?;

        match segment {
            SimplePathSegment::MoveTo { x, y } => {
                path.push(PathEl::MoveTo(Point::new(x, y)));
            }
            SimplePathSegment::LineTo { x, y } => {
                path.push(PathEl::LineTo(Point::new(x, y)));
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                path.push(PathEl::QuadTo(Point::new(x1, y1), Point::new(x, y)));
            }
            SimplePathSegment::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                path.push(PathEl::CurveTo(
                    Point::new(x1, y1),
                    Point::new(x2, y2),
                    Point::new(x, y),
                ));
            }
            SimplePathSegment::ClosePath => path.push(PathEl::ClosePath),
        }
    }

    Ok(path)
}
