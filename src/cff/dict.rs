use crate::cff::Operand;
use crate::error::Error;

/// DICT operator codes; two-byte operators carry the `0x0C` escape in
/// their high byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    CharStrings,
    VStore,
    FdArray,
    FdSelect,
    Private,
    Subrs,
    Other(u16),
}

impl Op {
    pub fn code(self) -> u16 {
        match self {
            Op::CharStrings => 17,
            Op::VStore => 24,
            Op::FdArray => 0x0C24,
            Op::FdSelect => 0x0C25,
            Op::Private => 18,
            Op::Subrs => 19,
            Op::Other(code) => code,
        }
    }

    pub fn from_code(code: u16) -> Op {
        match code {
            17 => Op::CharStrings,
            24 => Op::VStore,
            0x0C24 => Op::FdArray,
            0x0C25 => Op::FdSelect,
            18 => Op::Private,
            19 => Op::Subrs,
            other => Op::Other(other),
        }
    }

    fn byte_len(self) -> usize {
        if self.code() > 0xFF { 2 } else { 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub operands: Vec<Operand>,
    pub operator: Op,
}

impl DictEntry {
    pub fn new(operator: Op, operands: Vec<Operand>) -> Self {
        DictEntry { operands, operator }
    }

    fn size(&self) -> usize {
        self.operands
            .iter()
            .map(|op| usize::from(op.width()))
            .sum::<usize>()
            + self.operator.byte_len()
    }
}

/// An ordered sequence of operands-then-operator entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dict {
    pub entries: Vec<DictEntry>,
}

impl Dict {
    pub fn new() -> Self {
        Dict::default()
    }

    pub fn push(&mut self, operator: Op, operands: Vec<Operand>) {
        self.entries.push(DictEntry::new(operator, operands));
    }

    pub fn get(&self, operator: Op) -> Option<&DictEntry> {
        self.entries.iter().find(|e| e.operator == operator)
    }

    pub fn entry_mut(&mut self, operator: Op) -> Option<&mut DictEntry> {
        self.entries.iter_mut().find(|e| e.operator == operator)
    }

    /// Encoded byte length with the current operand widths.
    pub fn size(&self) -> usize {
        self.entries.iter().map(DictEntry::size).sum()
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        for entry in &self.entries {
            for operand in &entry.operands {
                operand.encode_into(out);
            }
            let code = entry.operator.code();
            if code > 0xFF {
                out.push((code >> 8) as u8);
            }
            out.push((code & 0xFF) as u8);
        }
    }

    pub fn parse(data: &[u8]) -> Result<Dict, Error> {
        let mut dict = Dict::new();
        let mut operands = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let b0 = data[pos];
            match b0 {
                // 22 (vsindex), 23 (blend) and 24 (vstore) are operators
                // in CFF2 DICTs.
                0..=11 | 13..=24 => {
                    dict.push(Op::from_code(u16::from(b0)), std::mem::take(&mut operands));
                    pos += 1;
                }
                12 => {
                    let b1 = *data
                        .get(pos + 1)
                        .ok_or(Error::MalformedCff("truncated escaped operator"))?;
                    dict.push(
                        Op::from_code(0x0C00 | u16::from(b1)),
                        std::mem::take(&mut operands),
                    );
                    pos += 2;
                }
                25..=27 | 31 | 255 => {
                    return Err(Error::MalformedCff("reserved DICT byte"));
                }
                30 => {
                    return Err(Error::MalformedCff("real number operands are not supported"));
                }
                _ => {
                    let (operand, used) = Operand::decode(&data[pos..])?;
                    operands.push(operand);
                    pos += used;
                }
            }
        }

        if !operands.is_empty() {
            return Err(Error::MalformedCff("operands without an operator"));
        }

        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dict {
        let mut dict = Dict::new();
        dict.push(Op::CharStrings, vec![Operand::new(1234)]);
        dict.push(Op::FdArray, vec![Operand::new(70000)]);
        dict.push(Op::Private, vec![Operand::new(2), Operand::new(42)]);
        dict
    }

    #[test]
    fn size_matches_encoding() {
        let dict = sample();
        let mut buf = Vec::new();
        dict.encode_into(&mut buf);
        assert_eq!(buf.len(), dict.size());
        // 1234 -> 3 bytes + 1, 70000 -> 5 bytes + 2, (2, 42) -> 2 bytes + 1
        assert_eq!(dict.size(), 4 + 7 + 3);
    }

    #[test]
    fn parse_round_trip_preserves_widths() {
        let mut dict = sample();
        // Force a non-minimal width through the widening path.
        dict.entry_mut(Op::CharStrings).unwrap().operands[0] =
            Operand::new(40000).widen_to(1234);

        let mut buf = Vec::new();
        dict.encode_into(&mut buf);
        let parsed = Dict::parse(&buf).unwrap();
        assert_eq!(parsed, dict);
    }

    #[test]
    fn two_byte_operator_escapes() {
        let mut dict = Dict::new();
        dict.push(Op::FdArray, vec![Operand::new(0)]);
        let mut buf = Vec::new();
        dict.encode_into(&mut buf);
        assert_eq!(buf, [139, 12, 36]);
    }

    #[test]
    fn unknown_operators_are_tolerated() {
        let parsed = Dict::parse(&[139, 16]).unwrap();
        assert_eq!(parsed.entries[0].operator, Op::Other(16));
    }

    #[test]
    fn vstore_operator_parses() {
        let parsed = Dict::parse(&[139, 24]).unwrap();
        assert_eq!(parsed.entries[0].operator, Op::VStore);
    }

    #[test]
    fn trailing_operands_are_rejected() {
        assert!(Dict::parse(&[139]).is_err());
    }
}
