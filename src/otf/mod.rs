mod sfnt;
mod tables;

pub use sfnt::{FontBuilder, table_checksum};
pub use tables::{Metrics, cmap, head, hhea, hmtx, maxp, name, os2, post};
