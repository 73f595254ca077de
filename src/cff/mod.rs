pub mod charstring;
mod dict;
mod index;
mod operand;
mod table;

pub use dict::{Dict, DictEntry, Op};
pub use index::Index;
pub use operand::Operand;
pub use table::Cff2Table;
