use std::str::FromStr;

use kurbo::Affine;

use crate::error::Error;

/// Parse a `transform` attribute into an affine matrix.
///
/// `svgtypes` folds the transform list left to right, so the resulting
/// matrix already reflects SVG source order.
pub(crate) fn parse_transform(value: &str) -> Result<Affine, Error> {
    let ts = svgtypes::Transform::from_str(value)
        .map_err(|e| Error::MalformedSvg(format!("invalid transform '{value}': {e}")))?;
    Ok(Affine::new([ts.a, ts.b, ts.c, ts.d, ts.e, ts.f]))
}
