use crate::cff::{Dict, Index, Op, Operand};
use crate::error::Error;

/// `{ majorVersion, minorVersion, headerSize, topDictLength }`
const HEADER_SIZE: usize = 5;

/// An in-memory CFF2 table.
///
/// The table is built once, brought to a consistent state by
/// [`Cff2Table::recalculate_offsets`] and then serialized. Offsets stored
/// in the DICTs are themselves variable-width operands, so changing an
/// offset may grow the DICT that contains it and shift everything behind
/// it; convergence runs a fixed-point loop in which operand widths only
/// ever grow, which bounds the iteration count.
#[derive(Debug, Clone)]
pub struct Cff2Table {
    pub top_dict: Dict,
    pub global_subrs: Index,
    /// Raw ItemVariationStore (with its length prefix); decoded inputs
    /// keep it, this writer never produces one.
    pub vstore: Option<Vec<u8>>,
    pub char_strings: Index,
    pub font_dicts: Vec<Dict>,
    pub private_dicts: Vec<Dict>,
    /// Per-FontDICT local subroutines, parallel to `private_dicts`.
    pub local_subrs: Vec<Option<Index>>,
    /// Raw FDSelect from a decoded multi-FontDICT table; never emitted.
    pub fd_select: Option<Vec<u8>>,
    top_dict_length: u16,
}

impl Cff2Table {
    /// A single-FontDICT table with an empty Private DICT.
    pub fn new(char_strings: Index) -> Cff2Table {
        let mut top_dict = Dict::new();
        top_dict.push(Op::CharStrings, vec![Operand::new(0)]);
        top_dict.push(Op::FdArray, vec![Operand::new(0)]);

        let mut font_dict = Dict::new();
        font_dict.push(Op::Private, vec![Operand::new(0), Operand::new(0)]);

        Cff2Table {
            top_dict,
            global_subrs: Index::new(),
            vstore: None,
            char_strings,
            font_dicts: vec![font_dict],
            private_dicts: vec![Dict::new()],
            local_subrs: vec![None],
            fd_select: None,
            top_dict_length: 0,
        }
    }

    pub fn top_dict_length(&self) -> u16 {
        self.top_dict_length
    }

    fn vstore_len(&self) -> usize {
        self.vstore.as_ref().map_or(0, Vec::len)
    }

    fn font_dict_index(&self) -> Index {
        let items = self
            .font_dicts
            .iter()
            .map(|dict| {
                let mut buf = Vec::new();
                dict.encode_into(&mut buf);
                buf
            })
            .collect();
        Index::from_items(items)
    }

    /// Total encoded size with the current operand widths.
    pub fn size(&self) -> usize {
        let mut size = HEADER_SIZE
            + self.top_dict.size()
            + self.global_subrs.size()
            + self.vstore_len()
            + self.char_strings.size()
            + self.font_dict_index().size();
        for dict in &self.private_dicts {
            size += dict.size();
        }
        for subrs in self.local_subrs.iter().flatten() {
            size += subrs.size();
        }
        size
    }

    /// Bring every stored offset in sync with the layout.
    ///
    /// Top DICT offsets converge first, then the Private (size, offset)
    /// pairs inside the Font DICTs together with the local-subr offsets,
    /// which are relative to their Private DICT.
    pub fn recalculate_offsets(&mut self) -> Result<(), Error> {
        if self.font_dicts.len() != self.private_dicts.len()
            || self.font_dicts.len() != self.local_subrs.len()
        {
            return Err(Error::MalformedCff("FontDICT list shape mismatch"));
        }

        // This writer emits a single FontDICT and no FDSelect; a decoded
        // FDSelect entry would otherwise keep a dangling offset alive.
        if self.top_dict.get(Op::FdSelect).is_some() {
            log::warn!("dropping FDSelect on re-encode, glyphs map to FontDICT 0");
            self.top_dict.entries.retain(|e| e.operator != Op::FdSelect);
            self.fd_select = None;
        }

        self.converge_top_dict()?;

        let top_len = self.top_dict.size();
        self.top_dict_length =
            u16::try_from(top_len).map_err(|_| Error::OffsetOverflow(top_len as u64))?;

        self.converge_font_dicts()?;
        Ok(())
    }

    fn converge_top_dict(&mut self) -> Result<usize, Error> {
        let mut passes = 0;
        loop {
            passes += 1;
            let mut changed = false;

            let gsubrs_pos = HEADER_SIZE + self.top_dict.size();
            let vstore_pos = gsubrs_pos + self.global_subrs.size();
            let charstrings_pos = vstore_pos + self.vstore_len();
            let fdarray_pos = charstrings_pos + self.char_strings.size();

            let mut batch = vec![(Op::CharStrings, charstrings_pos)];
            if self.vstore.is_some() {
                batch.push((Op::VStore, vstore_pos));
            }
            batch.push((Op::FdArray, fdarray_pos));

            for i in 0..batch.len() {
                let (op, target) = batch[i];
                let entry = self
                    .top_dict
                    .entry_mut(op)
                    .ok_or(Error::MalformedCff("missing top DICT offset entry"))?;
                let old = entry.operands[0];
                let new = old.widen_to(offset_operand(target)?);
                entry.operands[0] = new;

                if new.width() > old.width() {
                    // The DICT grew: everything behind it moves down.
                    let delta = usize::from(new.width() - old.width());
                    for pair in batch.iter_mut() {
                        pair.1 += delta;
                    }
                    changed = true;
                }
            }

            if !changed {
                return Ok(passes);
            }
        }
    }

    fn converge_font_dicts(&mut self) -> Result<usize, Error> {
        let fdarray_pos = HEADER_SIZE
            + self.top_dict.size()
            + self.global_subrs.size()
            + self.vstore_len()
            + self.char_strings.size();

        let mut passes = 0;
        loop {
            passes += 1;
            let mut changed = false;

            let private_base = fdarray_pos + self.font_dict_index().size();
            let mut private_pos = Vec::with_capacity(self.private_dicts.len());
            let mut pos = private_base;
            for dict in &self.private_dicts {
                private_pos.push(pos);
                pos += dict.size();
            }

            let mut subr_pos = Vec::with_capacity(self.local_subrs.len());
            for subrs in &self.local_subrs {
                subr_pos.push(pos);
                if let Some(index) = subrs {
                    pos += index.size();
                }
            }

            // Local-subr offsets are relative to their Private DICT.
            for i in 0..self.private_dicts.len() {
                if self.local_subrs[i].is_none() {
                    continue;
                }
                let rel = subr_pos[i] - private_pos[i];
                let entry = self.private_dicts[i]
                    .entry_mut(Op::Subrs)
                    .ok_or(Error::MalformedCff("local subrs without a Subrs entry"))?;
                changed |= update_operand(&mut entry.operands[0], rel)?;
            }

            // Private (size, offset) pairs in the owning Font DICTs.
            for i in 0..self.font_dicts.len() {
                let len = self.private_dicts[i].size();
                let entry = self.font_dicts[i]
                    .entry_mut(Op::Private)
                    .ok_or(Error::MalformedCff("FontDICT without a Private entry"))?;
                changed |= update_operand(&mut entry.operands[0], len)?;
                changed |= update_operand(&mut entry.operands[1], private_pos[i])?;
            }

            if !changed {
                return Ok(passes);
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(self.size());

        out.push(2); // majorVersion
        out.push(0); // minorVersion
        out.push(HEADER_SIZE as u8);
        debug_assert_eq!(usize::from(self.top_dict_length), self.top_dict.size());
        out.extend_from_slice(&self.top_dict_length.to_be_bytes());

        self.top_dict.encode_into(&mut out);
        self.global_subrs.encode_into(&mut out)?;
        if let Some(vstore) = &self.vstore {
            out.extend_from_slice(vstore);
        }
        self.char_strings.encode_into(&mut out)?;
        self.font_dict_index().encode_into(&mut out)?;
        for dict in &self.private_dicts {
            dict.encode_into(&mut out);
        }
        for subrs in self.local_subrs.iter().flatten() {
            subrs.encode_into(&mut out)?;
        }

        debug_assert_eq!(out.len(), self.size());
        Ok(out)
    }

    pub fn parse(data: &[u8]) -> Result<Cff2Table, Error> {
        if data.len() < HEADER_SIZE {
            return Err(Error::MalformedCff("truncated header"));
        }
        if data[0] != 2 {
            return Err(Error::MalformedCff("not a CFF2 table"));
        }
        let header_size = usize::from(data[2]);
        let top_dict_length = u16::from_be_bytes([data[3], data[4]]);

        let top_end = header_size + usize::from(top_dict_length);
        let top_slice = data
            .get(header_size..top_end)
            .ok_or(Error::MalformedCff("truncated top DICT"))?;
        let top_dict = Dict::parse(top_slice)?;

        let (global_subrs, _) = Index::parse(data, top_end)?;

        let charstrings_pos = dict_offset(&top_dict, Op::CharStrings)?
            .ok_or(Error::MalformedCff("top DICT has no CharStrings entry"))?;
        let (char_strings, _) = Index::parse(data, charstrings_pos)?;

        let vstore = match dict_offset(&top_dict, Op::VStore)? {
            Some(pos) => {
                let len_bytes = data
                    .get(pos..pos + 2)
                    .ok_or(Error::MalformedCff("truncated variation store"))?;
                let len = usize::from(u16::from_be_bytes(len_bytes.try_into().unwrap()));
                let raw = data
                    .get(pos..pos + 2 + len)
                    .ok_or(Error::MalformedCff("truncated variation store"))?;
                Some(raw.to_vec())
            }
            None => None,
        };

        let fdarray_pos = dict_offset(&top_dict, Op::FdArray)?
            .ok_or(Error::MalformedCff("top DICT has no FDArray entry"))?;
        let (fd_index, _) = Index::parse(data, fdarray_pos)?;
        let mut font_dicts = Vec::with_capacity(fd_index.len());
        for item in &fd_index.items {
            font_dicts.push(Dict::parse(item)?);
        }

        let fd_select = match dict_offset(&top_dict, Op::FdSelect)? {
            Some(pos) => Some(parse_fd_select(data, pos, char_strings.len())?),
            None => None,
        };

        let mut private_dicts = Vec::with_capacity(font_dicts.len());
        let mut local_subrs = Vec::with_capacity(font_dicts.len());
        for font_dict in &font_dicts {
            let entry = font_dict
                .get(Op::Private)
                .ok_or(Error::MalformedCff("FontDICT without a Private entry"))?;
            if entry.operands.len() != 2 {
                return Err(Error::MalformedCff("Private entry needs size and offset"));
            }
            let len = to_usize(entry.operands[0].value())?;
            let pos = to_usize(entry.operands[1].value())?;
            let slice = data
                .get(pos..pos + len)
                .ok_or(Error::MalformedCff("truncated Private DICT"))?;
            let private = Dict::parse(slice)?;

            let subrs = match dict_offset(&private, Op::Subrs)? {
                Some(rel) => Some(Index::parse(data, pos + rel)?.0),
                None => None,
            };

            private_dicts.push(private);
            local_subrs.push(subrs);
        }

        Ok(Cff2Table {
            top_dict,
            global_subrs,
            vstore,
            char_strings,
            font_dicts,
            private_dicts,
            local_subrs,
            fd_select,
            top_dict_length,
        })
    }
}

fn offset_operand(target: usize) -> Result<i32, Error> {
    i32::try_from(target).map_err(|_| Error::OffsetOverflow(target as u64))
}

/// Widen an operand to a new value; reports whether it grew.
fn update_operand(operand: &mut Operand, target: usize) -> Result<bool, Error> {
    let old_width = operand.width();
    *operand = operand.widen_to(offset_operand(target)?);
    Ok(operand.width() > old_width)
}

fn dict_offset(dict: &Dict, op: Op) -> Result<Option<usize>, Error> {
    match dict.get(op) {
        Some(entry) => {
            let operand = entry
                .operands
                .first()
                .ok_or(Error::MalformedCff("offset entry without an operand"))?;
            Ok(Some(to_usize(operand.value())?))
        }
        None => Ok(None),
    }
}

fn to_usize(value: i32) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| Error::MalformedCff("negative offset"))
}

/// Length-check an FDSelect so the raw bytes can be retained.
fn parse_fd_select(data: &[u8], pos: usize, n_glyphs: usize) -> Result<Vec<u8>, Error> {
    let format = *data
        .get(pos)
        .ok_or(Error::MalformedCff("truncated FDSelect"))?;
    let len = match format {
        0 => 1 + n_glyphs,
        3 => {
            let n_ranges = data
                .get(pos + 1..pos + 3)
                .ok_or(Error::MalformedCff("truncated FDSelect"))?;
            let n_ranges = usize::from(u16::from_be_bytes(n_ranges.try_into().unwrap()));
            1 + 2 + n_ranges * 3 + 2
        }
        _ => return Err(Error::MalformedCff("unknown FDSelect format")),
    };
    data.get(pos..pos + len)
        .map(<[u8]>::to_vec)
        .ok_or(Error::MalformedCff("truncated FDSelect"))
}
