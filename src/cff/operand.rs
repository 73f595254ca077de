use crate::error::Error;

/// A DICT/CharString integer operand with an explicit byte width.
///
/// The width is part of the value's identity: offset convergence widens
/// operands without ever shrinking them, so an operand may be encoded in
/// a wider form than its magnitude requires. Valid widths are 1, 2, 3
/// (the `28` int16 form) and 5 (the `29` int32 form) bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    value: i32,
    width: u8,
}

impl Operand {
    /// Minimal-width operand for `value`.
    pub fn new(value: i32) -> Self {
        Operand {
            value,
            width: Self::min_width(value),
        }
    }

    /// The narrowest representation that holds `value`.
    pub fn min_width(value: i32) -> u8 {
        match value {
            -107..=107 => 1,
            -1131..=-108 | 108..=1131 => 2,
            _ if i16::try_from(value).is_ok() => 3,
            _ => 5,
        }
    }

    /// Re-encode to `value` without ever narrowing.
    ///
    /// The two-byte form only covers magnitudes 108..=1131, so a kept
    /// width of 2 escapes to the int16 form when the value leaves that
    /// band.
    pub fn widen_to(self, value: i32) -> Self {
        let mut width = Self::min_width(value).max(self.width);
        if width == 2 && !matches!(value.unsigned_abs(), 108..=1131) {
            width = 3;
        }
        Operand { value, width }
    }

    pub fn value(self) -> i32 {
        self.value
    }

    pub fn width(self) -> u8 {
        self.width
    }

    pub fn encode_into(self, out: &mut Vec<u8>) {
        match self.width {
            1 => out.push((self.value + 139) as u8),
            2 => {
                if self.value >= 0 {
                    let v = (self.value - 108) as u16;
                    out.push(247 + (v >> 8) as u8);
                    out.push((v & 0xFF) as u8);
                } else {
                    let v = (-self.value - 108) as u16;
                    out.push(251 + (v >> 8) as u8);
                    out.push((v & 0xFF) as u8);
                }
            }
            3 => {
                out.push(28);
                out.extend_from_slice(&(self.value as i16).to_be_bytes());
            }
            5 => {
                out.push(29);
                out.extend_from_slice(&self.value.to_be_bytes());
            }
            other => unreachable!("invalid operand width {other}"),
        }
    }

    /// Decode one operand, returning it and the number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Operand, usize), Error> {
        let b0 = *data.first().ok_or(Error::MalformedCff("truncated operand"))?;
        match b0 {
            32..=246 => Ok((
                Operand {
                    value: i32::from(b0) - 139,
                    width: 1,
                },
                1,
            )),
            247..=250 => {
                let b1 = byte(data, 1)?;
                Ok((
                    Operand {
                        value: (i32::from(b0) - 247) * 256 + i32::from(b1) + 108,
                        width: 2,
                    },
                    2,
                ))
            }
            251..=254 => {
                let b1 = byte(data, 1)?;
                Ok((
                    Operand {
                        value: -(i32::from(b0) - 251) * 256 - i32::from(b1) - 108,
                        width: 2,
                    },
                    2,
                ))
            }
            28 => {
                let value = i16::from_be_bytes([byte(data, 1)?, byte(data, 2)?]);
                Ok((
                    Operand {
                        value: i32::from(value),
                        width: 3,
                    },
                    3,
                ))
            }
            29 => {
                let value = i32::from_be_bytes([
                    byte(data, 1)?,
                    byte(data, 2)?,
                    byte(data, 3)?,
                    byte(data, 4)?,
                ]);
                Ok((Operand { value, width: 5 }, 5))
            }
            _ => Err(Error::MalformedCff("unsupported operand prefix")),
        }
    }
}

fn byte(data: &[u8], at: usize) -> Result<u8, Error> {
    data.get(at)
        .copied()
        .ok_or(Error::MalformedCff("truncated operand"))
}
