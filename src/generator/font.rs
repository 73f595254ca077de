use std::collections::BTreeSet;

use kurbo::Rect;

use crate::cff::{Cff2Table, Index, charstring};
use crate::error::Error;
use crate::glyph::{BuildOptions, build_glyph};
use crate::model::{IconEntry, IconSource};
use crate::otf::{self, FontBuilder, Metrics};
use crate::svg::Document;
use crate::utils::const_name;

/// Code points are handed out from here, one per icon in name order.
const FIRST_CODEPOINT: u32 = 0xE000;

#[derive(Debug, Clone)]
pub struct FontArtifacts {
    /// The complete OpenType file.
    pub font: Vec<u8>,
    /// Generated constant names with their code points, in glyph order.
    pub entries: Vec<IconEntry>,
}

/// Convert a set of icons into a font.
///
/// Icons sort lexicographically by name and receive sequential Private
/// Use Area code points starting at U+E000; glyph 0 is an empty
/// `.notdef`. Nothing is produced if any icon fails: duplicate
/// identifiers are detected up front and per-icon parse errors abort the
/// whole conversion.
pub fn build_font(
    font_name: &str,
    icons: &[IconSource],
    options: &BuildOptions,
) -> Result<FontArtifacts, Error> {
    let mut sorted: Vec<&IconSource> = icons.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen = BTreeSet::new();
    for icon in &sorted {
        if !seen.insert(const_name(&icon.name)) {
            return Err(Error::DuplicateIconName(icon.name.clone()));
        }
    }

    let mut charstrings = vec![Vec::new()]; // .notdef
    let mut entries = Vec::with_capacity(sorted.len());
    let mut bounds: Option<Rect> = None;

    for (i, icon) in sorted.iter().enumerate() {
        let codepoint = FIRST_CODEPOINT + i as u32;
        let doc = Document::parse(&icon.svg).map_err(|e| in_icon(&icon.name, e))?;
        let glyph = build_glyph(&icon.name, codepoint, &doc, options);

        charstrings.push(
            charstring::encode(&glyph.outlines).map_err(|e| in_icon(&icon.name, e))?,
        );
        if let Some(bbox) = glyph.bounds {
            bounds = Some(bounds.map_or(bbox, |acc| acc.union(bbox)));
        }
        entries.push(IconEntry {
            name: const_name(&icon.name),
            codepoint,
        });
    }

    let glyph_count = u16::try_from(charstrings.len())
        .map_err(|_| Error::OffsetOverflow(charstrings.len() as u64))?;

    let mut cff2 = Cff2Table::new(Index::from_items(charstrings));
    cff2.recalculate_offsets()?;
    let cff2_bytes = cff2.encode()?;

    let mut metrics = Metrics::new(glyph_count, rounded_bounds(bounds));
    metrics.units_per_em = options.units_per_em;
    metrics.ascent = options.units_per_em as i16;
    metrics.advance_width = options.units_per_em;

    let mut builder = FontBuilder::new();
    builder.add_table(*b"CFF2", cff2_bytes);
    builder.add_table(*b"OS/2", otf::os2(&metrics));
    builder.add_table(*b"cmap", otf::cmap(&metrics));
    builder.add_table(*b"head", otf::head(&metrics));
    builder.add_table(*b"hhea", otf::hhea(&metrics));
    builder.add_table(*b"hmtx", otf::hmtx(&metrics));
    builder.add_table(*b"maxp", otf::maxp(&metrics));
    builder.add_table(*b"name", otf::name(font_name));
    builder.add_table(*b"post", otf::post());

    Ok(FontArtifacts {
        font: builder.build()?,
        entries,
    })
}

fn in_icon(name: &str, err: Error) -> Error {
    match err {
        Error::MalformedSvg(reason) => Error::MalformedSvg(format!("icon '{name}': {reason}")),
        other => other,
    }
}

fn rounded_bounds(bounds: Option<Rect>) -> (i16, i16, i16, i16) {
    let Some(b) = bounds else {
        return (0, 0, 0, 0);
    };
    let clamp = |v: f64| v.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
    (clamp(b.x0), clamp(b.y0), clamp(b.x1), clamp(b.y1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_icon(name: &str) -> IconSource {
        IconSource::new(
            name,
            r#"<svg xmlns="http://www.w3.org/2000/svg"><path d="M 0 0 H 100 V 100 H 0 Z"/></svg>"#,
        )
    }

    #[test]
    fn codepoints_follow_name_order() {
        let icons = vec![square_icon("zebra"), square_icon("apple")];
        let artifacts = build_font("Demo", &icons, &BuildOptions::default()).unwrap();
        assert_eq!(
            artifacts.entries,
            vec![
                IconEntry {
                    name: "APPLE".into(),
                    codepoint: 0xE000
                },
                IconEntry {
                    name: "ZEBRA".into(),
                    codepoint: 0xE001
                },
            ]
        );
    }

    #[test]
    fn duplicate_identifiers_are_fatal() {
        // Distinct stems that sanitize to the same constant.
        let icons = vec![square_icon("home"), square_icon("HOME")];
        let err = build_font("Demo", &icons, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DuplicateIconName(_)));
    }

    #[test]
    fn malformed_icon_aborts_with_its_name() {
        let icons = vec![IconSource::new("broken", "<svg><path d=\"M 0 x\"/></svg>")];
        let err = build_font("Demo", &icons, &BuildOptions::default()).unwrap_err();
        match err {
            Error::MalformedSvg(msg) => assert!(msg.contains("broken")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
