use kurbo::{Affine, BezPath, PathEl, Point, QuadBez, Rect, Shape as _, Vec2};

use crate::model::Glyph;
use crate::svg::{Document, Shape, shape_to_path};

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Scale and center each glyph into the em square.
    pub normalize: bool,
    /// Drop shape primitives, keeping only `<path>` outlines.
    pub ignore_shapes: bool,
    pub units_per_em: u16,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            normalize: true,
            ignore_shapes: true,
            units_per_em: 1000,
        }
    }
}

/// Turn a parsed document into a glyph ready for CharString encoding.
///
/// Leaf transforms are applied, quadratics are raised to cubics, open
/// contours are closed and the result is mapped into the em square.
pub fn build_glyph(name: &str, unicode: u32, doc: &Document, opts: &BuildOptions) -> Glyph {
    let mut outlines = Vec::new();
    for element in &doc.elements {
        if opts.ignore_shapes && !matches!(element.shape, Shape::Path { .. }) {
            continue;
        }
        let Some(mut path) = shape_to_path(&element.shape) else {
            continue;
        };
        path.apply_affine(element.transform);
        let path = close_contours(&with_cubics(&path));
        if !path.elements().is_empty() {
            outlines.push(path);
        }
    }

    if outlines.is_empty() {
        log::warn!("icon '{name}' has no contours, emitting an empty glyph");
    } else if opts.normalize {
        normalize_to_em(&mut outlines, opts.units_per_em);
    } else {
        // Pre-aligned input is only flipped from Y-down SVG space to the
        // Y-up baseline space of the font.
        let flip = Affine::new([1.0, 0.0, 0.0, -1.0, 0.0, f64::from(opts.units_per_em)]);
        for path in &mut outlines {
            path.apply_affine(flip);
        }
    }

    let bounds = union_bounds(&outlines);

    Glyph {
        name: name.to_string(),
        unicode,
        outlines,
        advance_width: opts.units_per_em,
        bounds,
    }
}

/// Raise every quadratic segment to its exact cubic form.
fn with_cubics(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut start = Point::ZERO;
    let mut current = Point::ZERO;

    for el in path.iter() {
        match el {
            PathEl::MoveTo(p) => {
                out.push(PathEl::MoveTo(p));
                start = p;
                current = p;
            }
            PathEl::LineTo(p) => {
                out.push(PathEl::LineTo(p));
                current = p;
            }
            PathEl::QuadTo(c, p) => {
                let cubic = QuadBez::new(current, c, p).raise();
                out.push(PathEl::CurveTo(cubic.p1, cubic.p2, cubic.p3));
                current = p;
            }
            PathEl::CurveTo(c1, c2, p) => {
                out.push(PathEl::CurveTo(c1, c2, p));
                current = p;
            }
            PathEl::ClosePath => {
                out.push(PathEl::ClosePath);
                current = start;
            }
        }
    }

    out
}

/// Terminate every contour with an explicit close.
///
/// Lines and polylines produce open subpaths, but glyph contours are
/// always closed, so the encoder expects a canonical trailing close.
fn close_contours(path: &BezPath) -> BezPath {
    let mut out = BezPath::new();
    let mut open = false;

    for el in path.iter() {
        match el {
            PathEl::MoveTo(p) => {
                if open {
                    out.push(PathEl::ClosePath);
                }
                out.push(PathEl::MoveTo(p));
                open = true;
            }
            PathEl::ClosePath => {
                out.push(PathEl::ClosePath);
                open = false;
            }
            other => out.push(other),
        }
    }
    if open {
        out.push(PathEl::ClosePath);
    }

    out
}

fn union_bounds(outlines: &[BezPath]) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    for path in outlines {
        if path.elements().is_empty() {
            continue;
        }
        let bbox = path.bounding_box();
        bounds = Some(match bounds {
            Some(acc) => acc.union(bbox),
            None => bbox,
        });
    }
    bounds
}

/// Fit the outlines into the em square: uniform scale, Y flip, centered
/// on both axes with the baseline at zero.
fn normalize_to_em(outlines: &mut [BezPath], units_per_em: u16) {
    const MIN_DIM: f64 = 1e-6;

    let Some(bbox) = union_bounds(outlines) else {
        return;
    };
    let (w, h) = (bbox.width(), bbox.height());
    if w <= MIN_DIM && h <= MIN_DIM {
        log::warn!("glyph dimensions are too small to normalize");
        return;
    }

    let em = f64::from(units_per_em);
    let scale = (em / w.max(MIN_DIM)).min(em / h.max(MIN_DIM));

    let ts = Affine::translate(Vec2::new(-bbox.x0, -bbox.y0))
        .then_scale_non_uniform(scale, -scale)
        .then_translate(Vec2::new(
            (em - w * scale) / 2.0,
            (em + h * scale) / 2.0,
        ));

    for path in outlines {
        path.apply_affine(ts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::BuildOptions;

    fn options(normalize: bool, ignore_shapes: bool) -> BuildOptions {
        BuildOptions {
            normalize,
            ignore_shapes,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn quad_raises_to_exact_cubic() {
        let mut path = BezPath::new();
        path.push(PathEl::MoveTo(Point::new(0.0, 0.0)));
        path.push(PathEl::QuadTo(Point::new(3.0, 6.0), Point::new(6.0, 0.0)));
        let cubic = with_cubics(&path);

        match cubic.elements()[1] {
            PathEl::CurveTo(c1, c2, p) => {
                // c1 = p0 + 2/3 (c - p0), c2 = p + 2/3 (c - p)
                assert_eq!(c1, Point::new(2.0, 4.0));
                assert_eq!(c2, Point::new(4.0, 4.0));
                assert_eq!(p, Point::new(6.0, 0.0));
            }
            other => panic!("expected a cubic, got {other:?}"),
        }
    }

    #[test]
    fn open_contours_are_closed() {
        let mut path = BezPath::new();
        path.push(PathEl::MoveTo(Point::new(0.0, 0.0)));
        path.push(PathEl::LineTo(Point::new(5.0, 5.0)));
        path.push(PathEl::MoveTo(Point::new(10.0, 0.0)));
        path.push(PathEl::LineTo(Point::new(15.0, 5.0)));

        let closed = close_contours(&path);
        let closes = closed
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::ClosePath))
            .count();
        assert_eq!(closes, 2);
        assert!(matches!(closed.elements()[2], PathEl::ClosePath));
    }

    #[test]
    fn normalized_square_fills_the_em() {
        let doc = Document::parse(
            r#"<svg><path d="M 0 0 H 100 V 100 H 0 Z"/></svg>"#,
        )
        .unwrap();
        let glyph = build_glyph("square", 0xE000, &doc, &options(true, true));

        let bounds = glyph.bounds.unwrap();
        assert!((bounds.x0 - 0.0).abs() < 1e-6);
        assert!((bounds.y0 - 0.0).abs() < 1e-6);
        assert!((bounds.x1 - 1000.0).abs() < 1e-6);
        assert!((bounds.y1 - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn tall_glyph_is_centered_horizontally() {
        let doc = Document::parse(
            r#"<svg><path d="M 0 0 H 10 V 100 H 0 Z"/></svg>"#,
        )
        .unwrap();
        let glyph = build_glyph("bar", 0xE000, &doc, &options(true, true));

        let bounds = glyph.bounds.unwrap();
        // 10x100 scales by 10; the 100-unit-wide result centers at 500.
        assert!((bounds.y1 - bounds.y0 - 1000.0).abs() < 1e-6);
        assert!(((bounds.x0 + bounds.x1) / 2.0 - 500.0).abs() < 1e-6);
    }

    #[test]
    fn unnormalized_input_is_only_flipped() {
        let doc = Document::parse(
            r#"<svg><path d="M 0 0 H 1000 V 250 H 0 Z"/></svg>"#,
        )
        .unwrap();
        let glyph = build_glyph("flip", 0xE000, &doc, &options(false, true));

        let bounds = glyph.bounds.unwrap();
        assert_eq!((bounds.x0, bounds.x1), (0.0, 1000.0));
        assert_eq!((bounds.y0, bounds.y1), (750.0, 1000.0));
    }

    #[test]
    fn ignore_shapes_drops_primitives() {
        let doc = Document::parse(
            r#"<svg><rect width="10" height="10"/><circle r="4"/></svg>"#,
        )
        .unwrap();
        let glyph = build_glyph("shapes", 0xE000, &doc, &options(true, true));
        assert!(glyph.is_empty());

        let glyph = build_glyph("shapes", 0xE000, &doc, &options(true, false));
        assert_eq!(glyph.outlines.len(), 2);
    }

    #[test]
    fn leaf_transform_is_applied() {
        let doc = Document::parse(
            r#"<svg><g transform="scale(2)"><path d="M 0 0 H 10 V 10 H 0 Z"/></g></svg>"#,
        )
        .unwrap();
        let glyph = build_glyph("scaled", 0xE000, &doc, &options(false, true));
        let bounds = glyph.bounds.unwrap();
        assert_eq!(bounds.width(), 20.0);
    }
}
