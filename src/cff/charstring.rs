//! Type-2 CharString bytecode for glyph outlines.
//!
//! Only `rmoveto`, `rlineto` and `rrcurveto` are emitted. Coordinates are
//! rounded to font units up front and the pen is tracked in integers, so
//! the emitted deltas are exact and decoding reproduces the encoder's
//! input bit for bit.

use kurbo::{BezPath, PathEl, Point, QuadBez};

use crate::cff::Operand;
use crate::error::Error;

const RLINETO: u8 = 5;
const RRCURVETO: u8 = 8;
const RMOVETO: u8 = 21;

pub fn encode(outlines: &[BezPath]) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    let mut pen = (0i32, 0i32);

    for path in outlines {
        for el in path.iter() {
            match el {
                PathEl::MoveTo(p) => {
                    let p = round(p)?;
                    push_delta(&mut out, pen, p)?;
                    out.push(RMOVETO);
                    pen = p;
                }
                PathEl::LineTo(p) => {
                    let p = round(p)?;
                    push_delta(&mut out, pen, p)?;
                    out.push(RLINETO);
                    pen = p;
                }
                PathEl::CurveTo(c1, c2, p) => {
                    let (c1, c2, p) = (round(c1)?, round(c2)?, round(p)?);
                    push_delta(&mut out, pen, c1)?;
                    push_delta(&mut out, c1, c2)?;
                    push_delta(&mut out, c2, p)?;
                    out.push(RRCURVETO);
                    pen = p;
                }
                PathEl::QuadTo(c, p) => {
                    // The glyph builder raises quadratics; do the same for
                    // callers that feed raw outlines.
                    let from = Point::new(f64::from(pen.0), f64::from(pen.1));
                    let cubic = QuadBez::new(from, c, p).raise();
                    let (c1, c2, p) = (round(cubic.p1)?, round(cubic.p2)?, round(cubic.p3)?);
                    push_delta(&mut out, pen, c1)?;
                    push_delta(&mut out, c1, c2)?;
                    push_delta(&mut out, c2, p)?;
                    out.push(RRCURVETO);
                    pen = p;
                }
                // Contours close implicitly; the pen stays on the last
                // point, not the contour start.
                PathEl::ClosePath => {}
            }
        }
    }

    Ok(out)
}

/// Decode a CharString into one path per contour.
///
/// Each contour is closed explicitly, matching the canonical command
/// stream the encoder consumes.
pub fn decode(data: &[u8]) -> Result<Vec<BezPath>, Error> {
    let mut contours = Vec::new();
    let mut current = BezPath::new();
    let mut stack: Vec<i32> = Vec::new();
    let mut pen = (0i32, 0i32);
    let mut pos = 0;

    while pos < data.len() {
        let b0 = data[pos];
        match b0 {
            RMOVETO => {
                let args = take_args(&mut stack, 2)?;
                finish_contour(&mut contours, &mut current);
                pen = (pen.0 + args[0], pen.1 + args[1]);
                current.push(PathEl::MoveTo(point(pen)));
                pos += 1;
            }
            RLINETO => {
                let args = take_multiple(&mut stack, 2)?;
                for pair in args.chunks_exact(2) {
                    pen = (pen.0 + pair[0], pen.1 + pair[1]);
                    current.push(PathEl::LineTo(point(pen)));
                }
                pos += 1;
            }
            RRCURVETO => {
                let args = take_multiple(&mut stack, 6)?;
                for hextet in args.chunks_exact(6) {
                    let c1 = (pen.0 + hextet[0], pen.1 + hextet[1]);
                    let c2 = (c1.0 + hextet[2], c1.1 + hextet[3]);
                    pen = (c2.0 + hextet[4], c2.1 + hextet[5]);
                    current.push(PathEl::CurveTo(point(c1), point(c2), point(pen)));
                }
                pos += 1;
            }
            // Remaining operator bytes; 28 and 29 are operand prefixes
            // in the shared integer scheme.
            0..=27 | 30..=31 => {
                return Err(Error::UnsupportedPath(b0));
            }
            _ => {
                let (operand, used) = Operand::decode(&data[pos..])?;
                stack.push(operand.value());
                pos += used;
            }
        }
    }

    if !stack.is_empty() {
        return Err(Error::MalformedCff("dangling CharString operands"));
    }
    finish_contour(&mut contours, &mut current);

    Ok(contours)
}

fn finish_contour(contours: &mut Vec<BezPath>, current: &mut BezPath) {
    if !current.elements().is_empty() {
        current.push(PathEl::ClosePath);
        contours.push(std::mem::take(current));
    }
}

fn take_args(stack: &mut Vec<i32>, n: usize) -> Result<Vec<i32>, Error> {
    if stack.len() != n {
        return Err(Error::MalformedCff("unexpected CharString operand count"));
    }
    Ok(std::mem::take(stack))
}

fn take_multiple(stack: &mut Vec<i32>, n: usize) -> Result<Vec<i32>, Error> {
    if stack.is_empty() || stack.len() % n != 0 {
        return Err(Error::MalformedCff("unexpected CharString operand count"));
    }
    Ok(std::mem::take(stack))
}

fn point(p: (i32, i32)) -> Point {
    Point::new(f64::from(p.0), f64::from(p.1))
}

fn round(p: Point) -> Result<(i32, i32), Error> {
    let x = p.x.round();
    let y = p.y.round();
    if !x.is_finite() || !y.is_finite() || x.abs() > f64::from(i32::MAX) {
        return Err(Error::OffsetOverflow(x.abs() as u64));
    }
    Ok((x as i32, y as i32))
}

fn push_delta(out: &mut Vec<u8>, from: (i32, i32), to: (i32, i32)) -> Result<(), Error> {
    for (a, b) in [(from.0, to.0), (from.1, to.1)] {
        let delta = i64::from(b) - i64::from(a);
        let delta = i32::try_from(delta)
            .map_err(|_| Error::OffsetOverflow(delta.unsigned_abs()))?;
        Operand::new(delta).encode_into(out);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> BezPath {
        let mut path = BezPath::new();
        path.push(PathEl::MoveTo(Point::new(0.0, 0.0)));
        path.push(PathEl::LineTo(Point::new(100.0, 0.0)));
        path.push(PathEl::LineTo(Point::new(100.0, 100.0)));
        path.push(PathEl::LineTo(Point::new(0.0, 100.0)));
        path.push(PathEl::ClosePath);
        path
    }

    #[test]
    fn square_is_a_move_and_three_lines() {
        let bytes = encode(&[square()]).unwrap();
        let lines = bytes.iter().filter(|b| **b == RLINETO).count();
        let moves = bytes.iter().filter(|b| **b == RMOVETO).count();
        assert_eq!((moves, lines), (1, 3));
    }

    #[test]
    fn encode_decode_round_trips_bit_for_bit() {
        let mut path = square();
        path.push(PathEl::MoveTo(Point::new(20.0, 20.0)));
        path.push(PathEl::CurveTo(
            Point::new(40.0, 20.0),
            Point::new(60.0, 40.0),
            Point::new(60.0, 60.0),
        ));
        path.push(PathEl::ClosePath);

        let bytes = encode(&[path]).unwrap();
        let decoded = decode(&bytes).unwrap();
        let reencoded = encode(&decoded).unwrap();
        assert_eq!(bytes, reencoded);
    }

    #[test]
    fn decoded_commands_match_input() {
        let bytes = encode(&[square()]).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].elements(), square().elements());
    }

    #[test]
    fn deltas_are_relative_between_contours() {
        let mut second = BezPath::new();
        second.push(PathEl::MoveTo(Point::new(10.0, 10.0)));
        second.push(PathEl::LineTo(Point::new(20.0, 10.0)));
        second.push(PathEl::ClosePath);

        let bytes = encode(&[square(), second]).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(
            decoded[1].elements()[0],
            PathEl::MoveTo(Point::new(10.0, 10.0))
        );
    }

    #[test]
    fn empty_charstring_decodes_to_no_contours() {
        assert!(decode(&[]).unwrap().is_empty());
    }

    #[test]
    fn unknown_operator_is_rejected() {
        // hstem (1) is outside the supported subset.
        let err = decode(&[139, 139, 1]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedPath(1)));
    }

    #[test]
    fn coordinates_round_before_encoding() {
        let mut path = BezPath::new();
        path.push(PathEl::MoveTo(Point::new(0.4, 0.6)));
        path.push(PathEl::LineTo(Point::new(10.5, 0.6)));
        path.push(PathEl::ClosePath);

        let decoded = decode(&encode(&[path]).unwrap()).unwrap();
        assert_eq!(
            decoded[0].elements()[..2],
            [
                PathEl::MoveTo(Point::new(0.0, 1.0)),
                PathEl::LineTo(Point::new(11.0, 1.0)),
            ]
        );
    }
}
