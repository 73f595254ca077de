use kurbo::{Arc, BezPath, PathEl, Point, SvgArc, Vec2};

use crate::svg::Shape;

/// Lower a shape primitive to cubic path data.
///
/// Returns `None` for degenerate shapes (zero-sized rects, radius-less
/// circles, one-point polylines); those are skipped with a warning, the
/// rest of the icon still converts.
pub fn shape_to_path(shape: &Shape) -> Option<BezPath> {
    match shape {
        Shape::Path { data } => Some(data.clone()),
        Shape::Rect {
            x,
            y,
            width,
            height,
            rx,
            ry,
        } => convert_rect(*x, *y, *width, *height, *rx, *ry),
        Shape::Circle { cx, cy, r } => {
            if *r <= 0.0 {
                log::warn!("circle has an invalid 'r' value, skipped");
                return None;
            }
            Some(ellipse_to_path(*cx, *cy, *r, *r))
        }
        Shape::Ellipse { cx, cy, rx, ry } => {
            let (rx, ry) = resolve_rx_ry(*rx, *ry);
            if rx <= 0.0 || ry <= 0.0 {
                log::warn!("ellipse has invalid radii, skipped");
                return None;
            }
            Some(ellipse_to_path(*cx, *cy, rx, ry))
        }
        Shape::Line { x1, y1, x2, y2 } => {
            let mut path = BezPath::new();
            path.push(PathEl::MoveTo(Point::new(*x1, *y1)));
            path.push(PathEl::LineTo(Point::new(*x2, *y2)));
            Some(path)
        }
        Shape::Polyline { points } => points_to_path(points, false),
        Shape::Polygon { points } => points_to_path(points, true),
    }
}

/// `rx` and `ry` each fall back to the other; only when both are missing
/// (or invalid) do they resolve to zero. Negative values count as missing.
fn resolve_rx_ry(rx: Option<f64>, ry: Option<f64>) -> (f64, f64) {
    let rx = rx.filter(|v| *v >= 0.0);
    let ry = ry.filter(|v| *v >= 0.0);
    match (rx, ry) {
        (None, None) => (0.0, 0.0),
        (Some(rx), None) => (rx, rx),
        (None, Some(ry)) => (ry, ry),
        (Some(rx), Some(ry)) => (rx, ry),
    }
}

fn convert_rect(
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    rx: Option<f64>,
    ry: Option<f64>,
) -> Option<BezPath> {
    if width <= 0.0 || height <= 0.0 {
        log::warn!("rect has an invalid 'width' or 'height' value, skipped");
        return None;
    }

    let (mut rx, mut ry) = resolve_rx_ry(rx, ry);

    // Clamp after resolving, not before.
    rx = rx.min(width / 2.0);
    ry = ry.min(height / 2.0);

    let mut path = BezPath::new();
    if rx == 0.0 || ry == 0.0 {
        path.push(PathEl::MoveTo(Point::new(x, y)));
        path.push(PathEl::LineTo(Point::new(x + width, y)));
        path.push(PathEl::LineTo(Point::new(x + width, y + height)));
        path.push(PathEl::LineTo(Point::new(x, y + height)));
        path.push(PathEl::ClosePath);
    } else {
        path.push(PathEl::MoveTo(Point::new(x + rx, y)));

        path.push(PathEl::LineTo(Point::new(x + width - rx, y)));
        arc_to(&mut path, rx, ry, x + width, y + ry);

        path.push(PathEl::LineTo(Point::new(x + width, y + height - ry)));
        arc_to(&mut path, rx, ry, x + width - rx, y + height);

        path.push(PathEl::LineTo(Point::new(x + rx, y + height)));
        arc_to(&mut path, rx, ry, x, y + height - ry);

        path.push(PathEl::LineTo(Point::new(x, y + ry)));
        arc_to(&mut path, rx, ry, x + rx, y);

        path.push(PathEl::ClosePath);
    }

    Some(path)
}

fn ellipse_to_path(cx: f64, cy: f64, rx: f64, ry: f64) -> BezPath {
    let mut path = BezPath::new();
    path.push(PathEl::MoveTo(Point::new(cx + rx, cy)));
    arc_to(&mut path, rx, ry, cx, cy + ry);
    arc_to(&mut path, rx, ry, cx - rx, cy);
    arc_to(&mut path, rx, ry, cx, cy - ry);
    arc_to(&mut path, rx, ry, cx + rx, cy);
    path.push(PathEl::ClosePath);
    path
}

fn points_to_path(points: &[(f64, f64)], close: bool) -> Option<BezPath> {
    // Both polyline and polygon need at least two points.
    if points.len() < 2 {
        log::warn!("poly shape has less than 2 points, skipped");
        return None;
    }

    let mut path = BezPath::new();
    for (i, &(x, y)) in points.iter().enumerate() {
        let p = Point::new(x, y);
        if i == 0 {
            path.push(PathEl::MoveTo(p));
        } else {
            path.push(PathEl::LineTo(p));
        }
    }
    if close {
        path.push(PathEl::ClosePath);
    }
    Some(path)
}

/// Append a sweeping, non-large elliptical arc as cubic segments.
fn arc_to(path: &mut BezPath, rx: f64, ry: f64, x: f64, y: f64) {
    let from = match path.elements().last() {
        Some(PathEl::MoveTo(p))
        | Some(PathEl::LineTo(p))
        | Some(PathEl::QuadTo(_, p))
        | Some(PathEl::CurveTo(_, _, p)) => *p,
        _ => return,
    };

    let svg_arc = SvgArc {
        from,
        to: Point::new(x, y),
        radii: Vec2::new(rx, ry),
        x_rotation: 0.0,
        large_arc: false,
        sweep: true,
    };

    match Arc::from_svg_arc(&svg_arc) {
        Some(arc) => {
            arc.to_cubic_beziers(0.1, |p1, p2, p| {
                path.push(PathEl::CurveTo(p1, p2, p));
            });
        }
        None => path.push(PathEl::LineTo(Point::new(x, y))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn end_points(path: &BezPath) -> Vec<Point> {
        path.elements()
            .iter()
            .filter_map(|el| match el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::CurveTo(_, _, p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn sharp_rect_is_four_corners() {
        let shape = Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 50.0,
            rx: None,
            ry: None,
        };
        let path = shape_to_path(&shape).unwrap();
        assert_eq!(
            end_points(&path),
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(0.0, 50.0),
            ]
        );
        assert_eq!(path.elements().last(), Some(&PathEl::ClosePath));
    }

    #[test]
    fn rounded_rect_has_four_arcs() {
        let shape = Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rx: Some(10.0),
            ry: Some(20.0),
        };
        let path = shape_to_path(&shape).unwrap();
        let curves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::CurveTo(..)))
            .count();
        assert!(curves >= 4, "expected at least one cubic per corner");
        // Path starts on the top edge, after the top-left radius.
        assert_eq!(path.elements()[0], PathEl::MoveTo(Point::new(10.0, 0.0)));
    }

    #[test]
    fn rect_radius_fallback_applies_to_both() {
        let shape = Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rx: None,
            ry: Some(8.0),
        };
        let path = shape_to_path(&shape).unwrap();
        assert_eq!(path.elements()[0], PathEl::MoveTo(Point::new(8.0, 0.0)));
    }

    #[test]
    fn oversized_radii_clamp_to_half_sides() {
        let shape = Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            rx: Some(400.0),
            ry: None,
        };
        let path = shape_to_path(&shape).unwrap();
        assert_eq!(path.elements()[0], PathEl::MoveTo(Point::new(5.0, 0.0)));
    }

    #[test]
    fn zero_sized_rect_is_skipped() {
        let shape = Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 10.0,
            rx: None,
            ry: None,
        };
        assert!(shape_to_path(&shape).is_none());
    }

    #[test]
    fn circle_closes_on_its_start() {
        let shape = Shape::Circle {
            cx: 50.0,
            cy: 50.0,
            r: 25.0,
        };
        let path = shape_to_path(&shape).unwrap();
        assert_eq!(path.elements()[0], PathEl::MoveTo(Point::new(75.0, 50.0)));
        assert_eq!(path.elements().last(), Some(&PathEl::ClosePath));
    }

    #[test]
    fn polygon_closes_polyline_does_not() {
        let points = vec![(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)];
        let polygon = shape_to_path(&Shape::Polygon {
            points: points.clone(),
        })
        .unwrap();
        let polyline = shape_to_path(&Shape::Polyline { points }).unwrap();
        assert_eq!(polygon.elements().last(), Some(&PathEl::ClosePath));
        assert!(!polyline
            .elements()
            .iter()
            .any(|el| matches!(el, PathEl::ClosePath)));
    }

    #[test]
    fn single_point_poly_is_skipped() {
        assert!(shape_to_path(&Shape::Polyline {
            points: vec![(1.0, 1.0)],
        })
        .is_none());
    }
}
