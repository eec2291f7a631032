//! Delimited-text ingestion.
//!
//! This crate turns a delimited text file (CSV, TSV, ...) into ordered,
//! string-valued records.
//!
//! # Features
//!
//! - **Eager reading**: [`CsvReader::read_all`], [`read_csv`]
//! - **Streaming**: [`CsvReader::read_iterator`] yields records lazily
//! - **Chunking**: [`CsvReader::read_chunks`] yields bounded batches
//! - **Filtering**: [`CsvReader::filter_rows`] streams and keeps matches
//! - **Parsing**: the `csv` crate over decoded text, quoted fields kept intact
//! - **Encodings**: any WHATWG encoding label via `encoding_rs`
//! - **Row policy**: lenient pad/drop alignment or strict field-count checks
//!
//! # Example
//!
//! ```ignore
//! use dt_ingest::{CsvReader, ReaderOptions, RecordExt};
//!
//! let mut reader = CsvReader::open("people.csv", ReaderOptions::default())?;
//! let headers = reader.get_headers()?;
//! let adults = reader.filter_rows(|r| r.parse::<u32>("age").is_ok_and(|age| age >= 18))?;
//! ```

mod coerce;
mod csv;
mod error;
mod input;
mod options;
mod source;

// === Error Types ===
pub use error::{ErrorKind, IngestError, Result};

// === Configuration ===
pub use options::{ReaderOptions, RowPolicy};

// === Reading ===
pub use crate::csv::{
    Chunks, CsvReader, Header, RawRow, RawRows, Record, Records, RowParser, split_line,
};
pub use source::{FileSource, Lines, ReaderState, SourceLine};

// === Convenience ===
pub use input::{load_csv_file, read_csv, read_csv_chunks, read_csv_rows, read_csv_with};

// === Typed Access ===
pub use coerce::{CoerceError, RecordExt};

pub use encoding_rs::Encoding;
