use thiserror::Error;

/// Errors raised while converting icons or assembling the font.
///
/// An empty glyph outline is not an error: it is reported through
/// `log::warn!` and an empty glyph is emitted in its place.
#[derive(Debug, Error)]
pub enum Error {
    /// The SVG document is not well-formed, or an attribute failed to parse.
    #[error("malformed SVG: {0}")]
    MalformedSvg(String),

    /// A CharString contains an operator outside the supported subset.
    #[error("unsupported CharString operator {0:#04x}")]
    UnsupportedPath(u8),

    /// An offset or length no longer fits its binary field.
    #[error("offset {0} exceeds the encodable range")]
    OffsetOverflow(u64),

    /// Two input files map to the same icon identifier.
    #[error("duplicate icon name '{0}'")]
    DuplicateIconName(String),

    /// CFF2 table bytes violate the format while decoding.
    #[error("malformed CFF2 data: {0}")]
    MalformedCff(&'static str),

    #[error(transparent)]
    Template(#[from] handlebars::RenderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
