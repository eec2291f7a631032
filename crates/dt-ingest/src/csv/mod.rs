//! Delimited-text parsing and reading.

mod header;
mod parser;
mod reader;
mod record;

pub use header::Header;
pub use parser::{RawRow, RawRows, RowParser, split_line};
pub use reader::{Chunks, CsvReader, Records};
pub use record::Record;
