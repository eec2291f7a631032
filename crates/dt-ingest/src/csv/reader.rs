//! Reader facade over a delimited file.

use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{IngestError, Result};
use crate::options::ReaderOptions;
use crate::source::{FileSource, Lifecycle, ReaderState};

use super::header::Header;
use super::parser::{RawRows, RowParser};
use super::record::Record;

/// Upper bound on the capacity reserved up front for one chunk.
const MAX_CHUNK_PREALLOCATION: usize = 1024;

/// Reads records from one delimited file.
///
/// Every access method opens the file on its own and releases it before
/// returning (eager methods) or when the returned cursor is exhausted,
/// closed, or dropped (lazy methods). The header is resolved on the first
/// open and reused afterwards.
///
/// ```ignore
/// use dt_ingest::{CsvReader, ReaderOptions};
///
/// let mut reader = CsvReader::open("orders.tsv", ReaderOptions::tsv())?;
/// for chunk in reader.read_chunks(500)? {
///     let chunk = chunk?;
///     println!("{} records", chunk.len());
/// }
/// ```
#[derive(Debug)]
pub struct CsvReader {
    path: PathBuf,
    options: ReaderOptions,
    header: Option<Arc<Header>>,
    row_count: Option<usize>,
    lifecycle: Arc<Lifecycle>,
}

impl CsvReader {
    /// Creates a reader for `path` without opening it.
    ///
    /// Fails if the options are invalid or the path is not an existing file.
    pub fn open(path: impl AsRef<Path>, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        options.validate()?;
        let metadata = std::fs::metadata(path).map_err(|e| IngestError::from_io(path, e))?;
        if !metadata.is_file() {
            return Err(IngestError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            options,
            header: None,
            row_count: None,
            lifecycle: Arc::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Lifecycle marker: `Open` while any handle of this reader is live.
    pub fn state(&self) -> ReaderState {
        self.lifecycle.state()
    }

    /// Opens the file and consumes the header row.
    fn start(&mut self) -> Result<(RawRows, Arc<Header>)> {
        let source =
            FileSource::open_tracked(&self.path, self.options.encoding, Arc::clone(&self.lifecycle))?;
        let parser = RowParser::new(&self.path, &self.options);
        let mut rows = parser.rows(source);
        let parsed = parser.read_header(&mut rows)?;
        let header = match &self.header {
            Some(cached) => Arc::clone(cached),
            None => {
                tracing::debug!(
                    path = %self.path.display(),
                    columns = parsed.len(),
                    "resolved header"
                );
                let header = Arc::new(parsed);
                self.header = Some(Arc::clone(&header));
                header
            }
        };
        Ok((rows, header))
    }

    /// Reads every record into memory.
    pub fn read_all(&mut self) -> Result<Vec<Record>> {
        let records = self.read_iterator()?.collect::<Result<Vec<_>>>()?;
        self.row_count.get_or_insert(records.len());
        Ok(records)
    }

    /// Returns a lazy cursor over the records.
    ///
    /// Each call reopens the file from the beginning.
    pub fn read_iterator(&mut self) -> Result<Records> {
        let (rows, header) = self.start()?;
        Ok(Records { rows, header })
    }

    /// Returns a lazy cursor over batches of `chunk_size` records.
    ///
    /// Only the final batch may be shorter.
    pub fn read_chunks(&mut self, chunk_size: usize) -> Result<Chunks> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidArgument {
                name: "chunk_size",
                reason: format!(
                    "must be a positive integer (reading {})",
                    self.path.display()
                ),
            });
        }
        Ok(Chunks {
            records: self.read_iterator()?,
            size: chunk_size,
            failure: None,
        })
    }

    /// Returns the records for which `predicate` holds, in file order.
    pub fn filter_rows<F>(&mut self, mut predicate: F) -> Result<Vec<Record>>
    where
        F: FnMut(&Record) -> bool,
    {
        let mut matched = Vec::new();
        for record in self.read_iterator()? {
            let record = record?;
            if predicate(&record) {
                matched.push(record);
            }
        }
        Ok(matched)
    }

    /// Returns the header, opening the file briefly if not yet cached.
    pub fn get_headers(&mut self) -> Result<Arc<Header>> {
        if let Some(header) = &self.header {
            return Ok(Arc::clone(header));
        }
        let (_rows, header) = self.start()?;
        Ok(header)
    }

    /// Number of data records, header excluded. Cached after the first call.
    pub fn get_row_count(&mut self) -> Result<usize> {
        if let Some(count) = self.row_count {
            return Ok(count);
        }
        let mut count = 0;
        for record in self.read_iterator()? {
            record?;
            count += 1;
        }
        tracing::debug!(path = %self.path.display(), rows = count, "counted rows");
        self.row_count = Some(count);
        Ok(count)
    }
}

/// Lazy cursor over the records of one file pass.
///
/// The file handle is released when the cursor is exhausted, hits an error,
/// is closed, or is dropped.
#[derive(Debug)]
pub struct Records {
    rows: RawRows,
    header: Arc<Header>,
}

impl Records {
    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Returns true while the file handle is held.
    pub fn is_open(&self) -> bool {
        self.rows.is_open()
    }

    /// Releases the file handle. The cursor yields nothing afterwards.
    pub fn close(&mut self) {
        self.rows.close();
    }
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match self.rows.next()? {
            Ok(raw) => self.rows.parser().build(&self.header, raw),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.close();
        }
        Some(result)
    }
}

impl FusedIterator for Records {}

/// Lazy cursor over batches of consecutive records.
#[derive(Debug)]
pub struct Chunks {
    records: Records,
    size: usize,
    failure: Option<IngestError>,
}

impl Chunks {
    pub fn header(&self) -> &Arc<Header> {
        self.records.header()
    }

    pub fn chunk_size(&self) -> usize {
        self.size
    }

    pub fn is_open(&self) -> bool {
        self.records.is_open()
    }

    /// Releases the file handle. The cursor yields nothing afterwards.
    pub fn close(&mut self) {
        self.records.close();
        self.failure = None;
    }
}

impl Iterator for Chunks {
    type Item = Result<Vec<Record>>;

    fn next(&mut self) -> Option<Self::Item> {
        // A batch cut short by an error is delivered before the error.
        if let Some(err) = self.failure.take() {
            return Some(Err(err));
        }
        let mut batch = Vec::with_capacity(self.size.min(MAX_CHUNK_PREALLOCATION));
        while batch.len() < self.size {
            match self.records.next() {
                Some(Ok(record)) => batch.push(record),
                Some(Err(err)) if batch.is_empty() => return Some(Err(err)),
                Some(Err(err)) => {
                    self.failure = Some(err);
                    break;
                }
                None => break,
            }
        }
        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

impl FusedIterator for Chunks {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::options::RowPolicy;

    const PEOPLE: &str = "id,name,age\n1,Alice,30\n2,Bob,25\n";

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn reader(file: &NamedTempFile) -> CsvReader {
        CsvReader::open(file.path(), ReaderOptions::default()).unwrap()
    }

    #[test]
    fn test_open_rejects_missing_and_directories() {
        let missing = CsvReader::open("/no/such/file.csv", ReaderOptions::default());
        assert!(matches!(missing, Err(IngestError::FileNotFound { .. })));

        let dir = tempfile::TempDir::new().unwrap();
        let not_file = CsvReader::open(dir.path(), ReaderOptions::default());
        assert!(matches!(not_file, Err(IngestError::NotAFile { .. })));
    }

    #[test]
    fn test_read_all() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        let records = reader.read_all().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Alice"));
        assert_eq!(records[1].get("age"), Some("25"));
        assert_eq!(reader.state(), ReaderState::Closed);
    }

    #[test]
    fn test_state_transitions() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        assert_eq!(reader.state(), ReaderState::Unopened);

        let mut records = reader.read_iterator().unwrap();
        assert_eq!(reader.state(), ReaderState::Open);
        records.next();
        drop(records);
        assert_eq!(reader.state(), ReaderState::Closed);
    }

    #[test]
    fn test_explicit_close_releases_handle() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        let mut records = reader.read_iterator().unwrap();
        assert!(records.next().is_some());
        records.close();
        assert!(!records.is_open());
        assert!(records.next().is_none());
        assert_eq!(reader.state(), ReaderState::Closed);
    }

    #[test]
    fn test_exhaustion_releases_handle() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        let mut records = reader.read_iterator().unwrap();
        while records.next().is_some() {}
        assert_eq!(reader.state(), ReaderState::Closed);
    }

    #[test]
    fn test_chunks_sizes() {
        let mut content = String::from("id,value\n");
        for i in 0..5 {
            content.push_str(&format!("{},{}\n", i, i * 10));
        }
        let file = create_temp_csv(&content);
        let mut reader = reader(&file);
        let chunks: Vec<Vec<Record>> = reader
            .read_chunks(2)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 2);
        assert_eq!(chunks[2].len(), 1);
        assert_eq!(chunks[2][0].get("value"), Some("40"));
    }

    #[test]
    fn test_chunks_rejects_zero() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        let err = reader.read_chunks(0).unwrap_err();
        assert!(matches!(err, IngestError::InvalidArgument { name: "chunk_size", .. }));
        assert_eq!(reader.state(), ReaderState::Unopened);
    }

    #[test]
    fn test_chunks_deliver_partial_batch_before_error() {
        let file = create_temp_csv("a,b\n1,2\n3,4\n5\n7,8\n");
        let mut reader = CsvReader::open(file.path(), ReaderOptions::default().strict()).unwrap();
        let mut chunks = reader.read_chunks(10).unwrap();

        let first = chunks.next().unwrap().unwrap();
        assert_eq!(first.len(), 2);
        let err = chunks.next().unwrap().unwrap_err();
        assert!(matches!(err, IngestError::MalformedRow { line: 4, .. }));
        assert!(chunks.next().is_none());
        assert_eq!(reader.state(), ReaderState::Closed);
    }

    #[test]
    fn test_filter_rows() {
        let file = create_temp_csv("name,age\nAlice,25\nBob,30\nCharlie,25\n");
        let mut reader = reader(&file);
        let filtered = reader.filter_rows(|row| row.get("age") == Some("25")).unwrap();

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].get("name"), Some("Alice"));
        assert_eq!(filtered[1].get("name"), Some("Charlie"));
    }

    #[test]
    fn test_headers_and_row_count() {
        let file = create_temp_csv("name,age,city\nAlice,25,Beijing\nBob,30,Shanghai\n");
        let mut reader = reader(&file);

        let headers = reader.get_headers().unwrap();
        assert_eq!(*headers, ["name", "age", "city"]);
        assert_eq!(reader.get_row_count().unwrap(), 2);
        assert_eq!(reader.state(), ReaderState::Closed);
    }

    #[test]
    fn test_row_count_is_cached() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        assert_eq!(reader.get_row_count().unwrap(), 2);

        std::fs::write(file.path(), "id\n1\n2\n3\n4\n").unwrap();
        assert_eq!(reader.get_row_count().unwrap(), 2);
    }

    #[test]
    fn test_header_is_cached_across_reads() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        let first = reader.get_headers().unwrap();
        let records = reader.read_all().unwrap();
        assert!(Arc::ptr_eq(&first, records[0].header()));
    }

    #[test]
    fn test_empty_file() {
        let file = create_temp_csv("");
        let mut reader = reader(&file);
        assert!(matches!(
            reader.get_headers(),
            Err(IngestError::EmptyFile { .. })
        ));
        assert!(matches!(reader.read_all(), Err(IngestError::EmptyFile { .. })));
        assert_eq!(reader.state(), ReaderState::Closed);
    }

    #[test]
    fn test_header_only_file_has_no_rows() {
        let file = create_temp_csv("id,name\n");
        let mut reader = reader(&file);
        assert!(reader.read_all().unwrap().is_empty());
        assert_eq!(reader.get_row_count().unwrap(), 0);
    }

    #[test]
    fn test_strict_error_terminates_iterator() {
        let file = create_temp_csv("id,name,age\n1,Alice,30\n3,Carol\n4,Dan,40\n");
        let mut reader = CsvReader::open(
            file.path(),
            ReaderOptions::default().with_policy(RowPolicy::Strict),
        )
        .unwrap();
        let results: Vec<Result<Record>> = reader.read_iterator().unwrap().collect();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(IngestError::MalformedRow { line: 3, .. })
        ));
    }

    #[test]
    fn test_chunks_accept_huge_size() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        let chunks: Vec<Vec<Record>> = reader
            .read_chunks(usize::MAX)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 2);
    }

    #[test]
    fn test_chunk_size_error_names_path() {
        let file = create_temp_csv(PEOPLE);
        let mut reader = reader(&file);
        let err = reader.read_chunks(0).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_quoted_crlf_survives() {
        let file = create_temp_csv("id,note\r\n1,\"two\r\nlines\"\r\n2,plain\r\n");
        let mut reader = reader(&file);
        let records = reader.read_all().unwrap();

        assert_eq!(records[0].get("note"), Some("two\r\nlines"));
        assert_eq!(records[1].get("note"), Some("plain"));
        assert_eq!(records[1].line(), 4);
    }
}
