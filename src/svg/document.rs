use std::str::FromStr;

use kurbo::{Affine, BezPath};
use svgtypes::{Length, LengthUnit, PointsParser};

use crate::error::Error;
use crate::svg::{parse_path, parse_transform};

/// A leaf shape of the parsed document.
///
/// `rx`/`ry` keep the absent-vs-zero distinction: each falls back to the
/// other during conversion, and only when both are absent do they resolve
/// to plain corners.
#[derive(Debug, Clone)]
pub enum Shape {
    Path {
        data: BezPath,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        rx: Option<f64>,
        ry: Option<f64>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: Option<f64>,
        ry: Option<f64>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
    },
    Polyline {
        points: Vec<(f64, f64)>,
    },
    Polygon {
        points: Vec<(f64, f64)>,
    },
}

/// A leaf with its fully composed transform.
#[derive(Debug, Clone)]
pub struct Element {
    pub shape: Shape,
    pub transform: Affine,
}

/// A parsed SVG document, flattened to leaves.
///
/// Groups are dissolved while walking the tree: every group composes its
/// transform onto its children (left to right in source order) and is
/// replaced by them, so each surviving element carries the matrix of its
/// whole ancestor chain.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub elements: Vec<Element>,
}

impl Document {
    pub fn parse(text: &str) -> Result<Document, Error> {
        let doc = roxmltree::Document::parse(text)
            .map_err(|e| Error::MalformedSvg(e.to_string()))?;
        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(Error::MalformedSvg(format!(
                "expected an <svg> root, found <{}>",
                root.tag_name().name()
            )));
        }

        let mut elements = Vec::new();
        collect(root, Affine::IDENTITY, &mut elements)?;
        Ok(Document { elements })
    }
}

fn collect(
    node: roxmltree::Node,
    parent: Affine,
    out: &mut Vec<Element>,
) -> Result<(), Error> {
    for child in node.children().filter(|n| n.is_element()) {
        let transform = match child.attribute("transform") {
            Some(value) => parent * parse_transform(value)?,
            None => parent,
        };

        let shape = match child.tag_name().name() {
            "g" => {
                collect(child, transform, out)?;
                continue;
            }
            "path" => match child.attribute("d") {
                Some(d) => Shape::Path {
                    data: parse_path(d)?,
                },
                None => continue,
            },
            "rect" => Shape::Rect {
                x: number(child, "x")?,
                y: number(child, "y")?,
                width: number(child, "width")?,
                height: number(child, "height")?,
                rx: opt_number(child, "rx")?,
                ry: opt_number(child, "ry")?,
            },
            "circle" => Shape::Circle {
                cx: number(child, "cx")?,
                cy: number(child, "cy")?,
                r: number(child, "r")?,
            },
            "ellipse" => Shape::Ellipse {
                cx: number(child, "cx")?,
                cy: number(child, "cy")?,
                rx: opt_number(child, "rx")?,
                ry: opt_number(child, "ry")?,
            },
            "line" => Shape::Line {
                x1: number(child, "x1")?,
                y1: number(child, "y1")?,
                x2: number(child, "x2")?,
                y2: number(child, "y2")?,
            },
            "polyline" => Shape::Polyline {
                points: points(child)?,
            },
            "polygon" => Shape::Polygon {
                points: points(child)?,
            },
            other => {
                log::warn!("skipping unsupported element <{other}>");
                continue;
            }
        };

        out.push(Element { shape, transform });
    }

    Ok(())
}

/// Parse a scalar attribute, defaulting to zero when absent.
///
/// Unit-less and `px` lengths are accepted; any other unit would require
/// viewport resolution and is rejected.
fn number(node: roxmltree::Node, name: &str) -> Result<f64, Error> {
    match node.attribute(name) {
        Some(value) => scalar(name, value),
        None => Ok(0.0),
    }
}

fn opt_number(node: roxmltree::Node, name: &str) -> Result<Option<f64>, Error> {
    node.attribute(name)
        .map(|value| scalar(name, value))
        .transpose()
}

fn scalar(name: &str, value: &str) -> Result<f64, Error> {
    let length = Length::from_str(value)
        .map_err(|_| Error::MalformedSvg(format!("invalid '{name}' value '{value}'")))?;
    match length.unit {
        LengthUnit::None | LengthUnit::Px => Ok(length.number),
        unit => Err(Error::MalformedSvg(format!(
            "unsupported unit {unit:?} in '{name}' value '{value}'"
        ))),
    }
}

fn points(node: roxmltree::Node) -> Result<Vec<(f64, f64)>, Error> {
    let value = node.attribute("points").unwrap_or("");
    Ok(PointsParser::from(value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_dissolve_into_leaf_transforms() {
        let doc = Document::parse(
            r#"<svg xmlns="http://www.w3.org/2000/svg">
                 <g transform="translate(10 0)">
                   <g transform="scale(2)">
                     <rect width="4" height="4"/>
                   </g>
                   <circle r="1" transform="translate(0 5)"/>
                 </g>
               </svg>"#,
        )
        .unwrap();

        assert_eq!(doc.elements.len(), 2);

        // translate(10 0) * scale(2)
        let rect = &doc.elements[0];
        assert_eq!(rect.transform.as_coeffs(), [2.0, 0.0, 0.0, 2.0, 10.0, 0.0]);

        // translate(10 0) * translate(0 5)
        let circle = &doc.elements[1];
        assert_eq!(
            circle.transform.as_coeffs(),
            [1.0, 0.0, 0.0, 1.0, 10.0, 5.0]
        );
    }

    #[test]
    fn rx_ry_absence_is_preserved() {
        let doc = Document::parse(
            r#"<svg><rect width="10" height="10" rx="3"/></svg>"#,
        )
        .unwrap();
        match &doc.elements[0].shape {
            Shape::Rect { rx, ry, .. } => {
                assert_eq!(*rx, Some(3.0));
                assert_eq!(*ry, None);
            }
            other => panic!("expected a rect, got {other:?}"),
        }
    }

    #[test]
    fn unknown_elements_are_skipped() {
        let doc = Document::parse(
            r#"<svg><text x="1" y="1">hi</text><line x2="5" y2="5"/></svg>"#,
        )
        .unwrap();
        assert_eq!(doc.elements.len(), 1);
        assert!(matches!(doc.elements[0].shape, Shape::Line { .. }));
    }

    #[test]
    fn missing_scalar_defaults_to_zero() {
        let doc = Document::parse(r#"<svg><circle r="2"/></svg>"#).unwrap();
        match doc.elements[0].shape {
            Shape::Circle { cx, cy, r } => {
                assert_eq!((cx, cy, r), (0.0, 0.0, 2.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn broken_xml_is_fatal() {
        assert!(Document::parse("<svg><rect").is_err());
    }

    #[test]
    fn bad_number_is_fatal() {
        assert!(Document::parse(r#"<svg><rect width="abc"/></svg>"#).is_err());
    }
}
