//! Fixed-layout OpenType tables surrounding the CFF2 outlines.
//!
//! Everything is written big-endian straight into byte vectors; the
//! layouts are small and stable enough that field-by-field writers stay
//! clearer than an extra abstraction.

/// Shared font-wide values derived from the glyph set.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub units_per_em: u16,
    pub ascent: i16,
    pub descent: i16,
    pub advance_width: u16,
    /// Including the leading `.notdef`.
    pub glyph_count: u16,
    /// (x_min, y_min, x_max, y_max) over all glyphs, zeros when empty.
    pub bounds: (i16, i16, i16, i16),
    pub first_char: u16,
    pub last_char: u16,
}

impl Metrics {
    pub fn new(glyph_count: u16, bounds: (i16, i16, i16, i16)) -> Metrics {
        let last = if glyph_count > 1 {
            0xE000 + glyph_count - 2
        } else {
            0xE000
        };
        Metrics {
            units_per_em: 1000,
            ascent: 1000,
            descent: 0,
            advance_width: 1000,
            glyph_count,
            bounds,
            first_char: 0xE000,
            last_char: last,
        }
    }
}

pub fn head(metrics: &Metrics) -> Vec<u8> {
    let mut out = Vec::with_capacity(54);
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // fontRevision
    out.extend_from_slice(&0u32.to_be_bytes()); // checkSumAdjustment, patched later
    out.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magicNumber
    out.extend_from_slice(&0u16.to_be_bytes()); // flags
    out.extend_from_slice(&metrics.units_per_em.to_be_bytes());
    out.extend_from_slice(&0i64.to_be_bytes()); // created
    out.extend_from_slice(&0i64.to_be_bytes()); // modified
    out.extend_from_slice(&metrics.bounds.0.to_be_bytes());
    out.extend_from_slice(&metrics.bounds.1.to_be_bytes());
    out.extend_from_slice(&metrics.bounds.2.to_be_bytes());
    out.extend_from_slice(&metrics.bounds.3.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // macStyle
    out.extend_from_slice(&8u16.to_be_bytes()); // lowestRecPPEM
    out.extend_from_slice(&2i16.to_be_bytes()); // fontDirectionHint
    out.extend_from_slice(&0i16.to_be_bytes()); // indexToLocFormat
    out.extend_from_slice(&0i16.to_be_bytes()); // glyphDataFormat
    out
}

pub fn hhea(metrics: &Metrics) -> Vec<u8> {
    let mut out = Vec::with_capacity(36);
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    out.extend_from_slice(&metrics.ascent.to_be_bytes());
    out.extend_from_slice(&metrics.descent.to_be_bytes());
    out.extend_from_slice(&0i16.to_be_bytes()); // lineGap
    out.extend_from_slice(&metrics.advance_width.to_be_bytes()); // advanceWidthMax
    out.extend_from_slice(&metrics.bounds.0.to_be_bytes()); // minLeftSideBearing
    out.extend_from_slice(&0i16.to_be_bytes()); // minRightSideBearing
    out.extend_from_slice(&metrics.bounds.2.to_be_bytes()); // xMaxExtent
    out.extend_from_slice(&1i16.to_be_bytes()); // caretSlopeRise
    out.extend_from_slice(&0i16.to_be_bytes()); // caretSlopeRun
    out.extend_from_slice(&0i16.to_be_bytes()); // caretOffset
    out.extend_from_slice(&[0u8; 8]); // reserved
    out.extend_from_slice(&0i16.to_be_bytes()); // metricDataFormat
    out.extend_from_slice(&metrics.glyph_count.to_be_bytes()); // numberOfHMetrics
    out
}

pub fn hmtx(metrics: &Metrics) -> Vec<u8> {
    let mut out = Vec::with_capacity(usize::from(metrics.glyph_count) * 4);
    for _ in 0..metrics.glyph_count {
        out.extend_from_slice(&metrics.advance_width.to_be_bytes());
        out.extend_from_slice(&0i16.to_be_bytes()); // leftSideBearing
    }
    out
}

/// Version 0.5, the CFF-outline flavor.
pub fn maxp(metrics: &Metrics) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    out.extend_from_slice(&metrics.glyph_count.to_be_bytes());
    out
}

pub fn post() -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    out.extend_from_slice(&0x0003_0000u32.to_be_bytes()); // version, no glyph names
    out.extend_from_slice(&0i32.to_be_bytes()); // italicAngle
    out.extend_from_slice(&10i16.to_be_bytes()); // underlinePosition
    out.extend_from_slice(&0i16.to_be_bytes()); // underlineThickness
    out.extend_from_slice(&0u32.to_be_bytes()); // isFixedPitch
    out.extend_from_slice(&[0u8; 16]); // memory hints
    out
}

pub fn os2(metrics: &Metrics) -> Vec<u8> {
    let mut out = Vec::with_capacity(96);
    out.extend_from_slice(&4u16.to_be_bytes()); // version
    out.extend_from_slice(&(metrics.advance_width as i16).to_be_bytes()); // xAvgCharWidth
    out.extend_from_slice(&400u16.to_be_bytes()); // usWeightClass
    out.extend_from_slice(&5u16.to_be_bytes()); // usWidthClass
    out.extend_from_slice(&0u16.to_be_bytes()); // fsType
    out.extend_from_slice(&[0u8; 16]); // subscript and superscript boxes
    out.extend_from_slice(&0i16.to_be_bytes()); // yStrikeoutSize
    out.extend_from_slice(&0i16.to_be_bytes()); // yStrikeoutPosition
    out.extend_from_slice(&0i16.to_be_bytes()); // sFamilyClass
    out.extend_from_slice(&[0u8; 10]); // panose
    out.extend_from_slice(&0u32.to_be_bytes()); // ulUnicodeRange1
    out.extend_from_slice(&0x1000_0000u32.to_be_bytes()); // ulUnicodeRange2, Private Use Area
    out.extend_from_slice(&0u32.to_be_bytes()); // ulUnicodeRange3
    out.extend_from_slice(&0u32.to_be_bytes()); // ulUnicodeRange4
    out.extend_from_slice(b"NONE"); // achVendID
    out.extend_from_slice(&0x0040u16.to_be_bytes()); // fsSelection: REGULAR
    out.extend_from_slice(&metrics.first_char.to_be_bytes());
    out.extend_from_slice(&metrics.last_char.to_be_bytes());
    out.extend_from_slice(&metrics.ascent.to_be_bytes()); // sTypoAscender
    out.extend_from_slice(&metrics.descent.to_be_bytes()); // sTypoDescender
    out.extend_from_slice(&0i16.to_be_bytes()); // sTypoLineGap
    out.extend_from_slice(&(metrics.ascent as u16).to_be_bytes()); // usWinAscent
    out.extend_from_slice(&((-metrics.descent) as u16).to_be_bytes()); // usWinDescent
    out.extend_from_slice(&0u32.to_be_bytes()); // ulCodePageRange1
    out.extend_from_slice(&0u32.to_be_bytes()); // ulCodePageRange2
    out.extend_from_slice(&0i16.to_be_bytes()); // sxHeight
    out.extend_from_slice(&0i16.to_be_bytes()); // sCapHeight
    out.extend_from_slice(&0u16.to_be_bytes()); // usDefaultChar
    out.extend_from_slice(&0u16.to_be_bytes()); // usBreakChar
    out.extend_from_slice(&0u16.to_be_bytes()); // usMaxContext
    out
}

/// Windows (3, 1, en-US) records: family, subfamily, full, version and
/// PostScript names.
pub fn name(family: &str) -> Vec<u8> {
    let subfamily = "Regular";
    let records: Vec<(u16, String)> = vec![
        (1, family.to_string()),
        (2, subfamily.to_string()),
        (4, format!("{family} {subfamily}")),
        (5, "Version 1.000".to_string()),
        (6, format!("{}-{subfamily}", postscript_name(family))),
    ];

    let mut strings = Vec::new();
    let mut out = Vec::new();
    out.extend_from_slice(&0u16.to_be_bytes()); // format
    out.extend_from_slice(&(records.len() as u16).to_be_bytes());
    let string_offset = 6 + records.len() * 12;
    out.extend_from_slice(&(string_offset as u16).to_be_bytes());

    for (name_id, value) in &records {
        let encoded: Vec<u8> = value.encode_utf16().flat_map(u16::to_be_bytes).collect();
        out.extend_from_slice(&3u16.to_be_bytes()); // platformID
        out.extend_from_slice(&1u16.to_be_bytes()); // encodingID, Unicode BMP
        out.extend_from_slice(&0x0409u16.to_be_bytes()); // languageID
        out.extend_from_slice(&name_id.to_be_bytes());
        out.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
        out.extend_from_slice(&(strings.len() as u16).to_be_bytes());
        strings.extend_from_slice(&encoded);
    }

    out.extend_from_slice(&strings);
    out
}

/// Strip a family name down to the PostScript-safe alphabet.
pub fn postscript_name(base: &str) -> String {
    base.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' => c,
            _ => '-',
        })
        .collect()
}

/// A format 4 subtable with one contiguous Private Use Area segment.
///
/// Identifiers map to sequential code points and glyph ids, so a single
/// segment with a constant delta (plus the required sentinel) covers the
/// whole font.
pub fn cmap(metrics: &Metrics) -> Vec<u8> {
    let mut segments: Vec<(u16, u16, u16)> = Vec::new(); // (start, end, idDelta)
    if metrics.glyph_count > 1 {
        // gid = code - first_char + 1, as modular arithmetic.
        let delta = 1u16.wrapping_sub(metrics.first_char);
        segments.push((metrics.first_char, metrics.last_char, delta));
    }
    segments.push((0xFFFF, 0xFFFF, 1)); // sentinel

    let seg_count = segments.len() as u16;
    let seg_count_x2 = seg_count * 2;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let range_shift = seg_count_x2 - search_range;

    let subtable_len = 14 + usize::from(seg_count) * 8 + 2;
    let mut sub = Vec::with_capacity(subtable_len);
    sub.extend_from_slice(&4u16.to_be_bytes()); // format
    sub.extend_from_slice(&(subtable_len as u16).to_be_bytes());
    sub.extend_from_slice(&0u16.to_be_bytes()); // language
    sub.extend_from_slice(&seg_count_x2.to_be_bytes());
    sub.extend_from_slice(&search_range.to_be_bytes());
    sub.extend_from_slice(&entry_selector.to_be_bytes());
    sub.extend_from_slice(&range_shift.to_be_bytes());
    for (_, end, _) in &segments {
        sub.extend_from_slice(&end.to_be_bytes());
    }
    sub.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for (start, _, _) in &segments {
        sub.extend_from_slice(&start.to_be_bytes());
    }
    for (_, _, delta) in &segments {
        sub.extend_from_slice(&delta.to_be_bytes());
    }
    for _ in &segments {
        sub.extend_from_slice(&0u16.to_be_bytes()); // idRangeOffset
    }

    let mut out = Vec::with_capacity(12 + sub.len());
    out.extend_from_slice(&0u16.to_be_bytes()); // version
    out.extend_from_slice(&1u16.to_be_bytes()); // numTables
    out.extend_from_slice(&3u16.to_be_bytes()); // platformID
    out.extend_from_slice(&1u16.to_be_bytes()); // encodingID
    out.extend_from_slice(&12u32.to_be_bytes()); // subtable offset
    out.extend_from_slice(&sub);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u16(data: &[u8], at: usize) -> u16 {
        u16::from_be_bytes([data[at], data[at + 1]])
    }

    #[test]
    fn fixed_table_lengths() {
        let metrics = Metrics::new(3, (0, 0, 900, 1000));
        assert_eq!(head(&metrics).len(), 54);
        assert_eq!(hhea(&metrics).len(), 36);
        assert_eq!(maxp(&metrics).len(), 6);
        assert_eq!(os2(&metrics).len(), 96);
        assert_eq!(post().len(), 32);
        assert_eq!(hmtx(&metrics).len(), 12);
    }

    #[test]
    fn last_char_tracks_glyph_count() {
        assert_eq!(Metrics::new(1, (0, 0, 0, 0)).last_char, 0xE000);
        assert_eq!(Metrics::new(4, (0, 0, 0, 0)).last_char, 0xE002);
    }

    #[test]
    fn cmap_maps_the_pua_run() {
        let metrics = Metrics::new(3, (0, 0, 0, 0)); // two icons
        let table = cmap(&metrics);

        let sub = &table[12..];
        assert_eq!(read_u16(sub, 0), 4); // format
        let seg_count = read_u16(sub, 6) / 2;
        assert_eq!(seg_count, 2);

        // endCode[0], startCode[0] and idDelta[0]
        let end0 = read_u16(sub, 14);
        let start0 = read_u16(sub, 14 + 2 * 2 + 2);
        let delta0 = read_u16(sub, 14 + 2 * 2 + 2 + 2 * 2);
        assert_eq!((start0, end0), (0xE000, 0xE001));
        assert_eq!(start0.wrapping_add(delta0), 1); // first icon is gid 1
    }

    #[test]
    fn empty_font_cmap_is_just_the_sentinel() {
        let metrics = Metrics::new(1, (0, 0, 0, 0));
        let table = cmap(&metrics);
        let sub = &table[12..];
        assert_eq!(read_u16(sub, 6), 2); // segCountX2
        assert_eq!(read_u16(sub, 14), 0xFFFF);
    }

    #[test]
    fn postscript_name_is_sanitized() {
        assert_eq!(postscript_name("My Icons 2"), "My-Icons-2");
    }

    #[test]
    fn name_records_are_ascending_and_in_bounds() {
        let table = name("Demo");
        let count = read_u16(&table, 2) as usize;
        let string_offset = read_u16(&table, 4) as usize;
        let mut prev_id = 0;
        for i in 0..count {
            let at = 6 + i * 12;
            let id = read_u16(&table, at + 6);
            assert!(id > prev_id);
            prev_id = id;
            let len = read_u16(&table, at + 8) as usize;
            let off = read_u16(&table, at + 10) as usize;
            assert!(string_offset + off + len <= table.len());
        }
    }
}
