mod hash;
mod strings;

pub(crate) use hash::{HASH_MARKER, extract_hash, hex_upper, icon_set_hash};
pub(crate) use strings::const_name;
