//! One-shot convenience functions.

use std::path::Path;

use crate::csv::{Chunks, CsvReader, Record, RowParser};
use crate::error::Result;
use crate::options::ReaderOptions;
use crate::source::FileSource;

/// Reads all records of a comma-separated UTF-8 file.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    read_csv_with(path, ReaderOptions::default())
}

/// Reads all records with explicit options.
pub fn read_csv_with(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Vec<Record>> {
    load_csv_file(path, options)?.read_all()
}

/// Builds a configured reader without reading any rows.
pub fn load_csv_file(path: impl AsRef<Path>, options: ReaderOptions) -> Result<CsvReader> {
    CsvReader::open(path, options)
}

/// Reads every row as plain fields, header row included.
///
/// Rows are not aligned to the header, so their lengths may differ.
pub fn read_csv_rows(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Vec<Vec<String>>> {
    let path = path.as_ref();
    let reader = CsvReader::open(path, options)?;
    let source = FileSource::open(reader.path(), options.encoding)?;
    RowParser::new(path, &options)
        .rows(source)
        .map(|raw| raw.map(|row| row.fields))
        .collect()
}

/// Opens a file and returns a cursor over batches of `chunk_size` records.
pub fn read_csv_chunks(
    path: impl AsRef<Path>,
    chunk_size: usize,
    options: ReaderOptions,
) -> Result<Chunks> {
    load_csv_file(path, options)?.read_chunks(chunk_size)
}
