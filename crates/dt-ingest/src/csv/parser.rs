//! Row assembly: decoded text to fields to records.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::csv::{Reader, ReaderBuilder, StringRecord};

use crate::error::{IngestError, Result};
use crate::options::{ReaderOptions, RowPolicy};
use crate::source::FileSource;

use super::header::Header;
use super::record::Record;

/// Fields of one logical row before alignment with the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line where the row starts.
    pub line: usize,
    pub fields: Vec<String>,
}

/// Splits decoded text into rows and aligns them with a header.
///
/// Alignment follows [`RowPolicy`]: lenient rows are padded with empty
/// strings or truncated to the header length, strict rows must match it.
#[derive(Debug, Clone)]
pub struct RowParser {
    path: PathBuf,
    delimiter: u8,
    quote: u8,
    policy: RowPolicy,
}

impl RowParser {
    pub fn new(path: &Path, options: &ReaderOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: options.delimiter,
            quote: options.quote,
            policy: options.policy,
        }
    }

    pub fn policy(&self) -> RowPolicy {
        self.policy
    }

    fn builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote);
        builder
    }

    /// Starts a single pass over the rows of `source`.
    ///
    /// Blank lines are skipped.
    pub fn rows(&self, source: FileSource) -> RawRows {
        let input = RowInput {
            source,
            window: Vec::new(),
            window_start: 0,
            exhausted: false,
        };
        RawRows {
            inner: Some(self.builder().from_reader(input)),
            record: StringRecord::new(),
            parser: self.clone(),
        }
    }

    /// Reads the first row as the header.
    pub fn read_header(&self, rows: &mut RawRows) -> Result<Header> {
        match rows.next() {
            Some(raw) => Header::from_fields(&self.path, raw?.fields),
            None => Err(IngestError::EmptyFile {
                path: self.path.clone(),
            }),
        }
    }

    /// Aligns `raw` with `header`.
    pub fn build(&self, header: &Arc<Header>, raw: RawRow) -> Result<Record> {
        let expected = header.len();
        let found = raw.fields.len();
        let mut values = raw.fields;
        if found != expected {
            match self.policy {
                RowPolicy::Strict => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = raw.line,
                        expected,
                        found,
                        "row does not match header"
                    );
                    return Err(IngestError::MalformedRow {
                        path: self.path.clone(),
                        line: raw.line,
                        expected,
                        found,
                    });
                }
                RowPolicy::Lenient => {
                    tracing::trace!(line = raw.line, expected, found, "aligned row to header");
                    values.resize(expected, String::new());
                }
            }
        }
        Ok(Record::new(Arc::clone(header), values, raw.line))
    }

    fn unterminated(&self, line: usize) -> IngestError {
        tracing::warn!(path = %self.path.display(), line, "quoted field never closed");
        IngestError::UnterminatedQuote {
            path: self.path.clone(),
            line,
        }
    }

    fn convert(&self, input: &mut RowInput, err: ::csv::Error) -> IngestError {
        input
            .source
            .take_failure()
            .unwrap_or_else(|| IngestError::from_io(&self.path, io::Error::from(err)))
    }
}

/// Decoded input fed to the csv reader.
///
/// Keeps the bytes handed out since the start of the current row so that
/// skipped blank lines and an open quote at end of file can be recovered.
#[derive(Debug)]
struct RowInput {
    source: FileSource,
    window: Vec<u8>,
    window_start: u64,
    exhausted: bool,
}

impl RowInput {
    fn emitted(&self) -> u64 {
        self.window_start + self.window.len() as u64
    }

    /// Drops bytes before `start` and returns the bytes in `start..end`.
    fn span(&mut self, start: u64, end: u64) -> &[u8] {
        let skip = (start.saturating_sub(self.window_start) as usize).min(self.window.len());
        self.window.drain(..skip);
        self.window_start += skip as u64;
        let len = (end.saturating_sub(self.window_start) as usize).min(self.window.len());
        &self.window[..len]
    }
}

impl Read for RowInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.source.read(buf)?;
        if n == 0 {
            self.exhausted = true;
        }
        self.window.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

/// Lazy sequence of raw rows from one file pass.
///
/// Ends after the first error. Dropping or closing it releases the file.
#[derive(Debug)]
pub struct RawRows {
    inner: Option<Reader<RowInput>>,
    record: StringRecord,
    parser: RowParser,
}

impl RawRows {
    pub fn parser(&self) -> &RowParser {
        &self.parser
    }

    /// Returns true while the file handle is held.
    pub fn is_open(&self) -> bool {
        self.inner
            .as_ref()
            .is_some_and(|reader| reader.get_ref().source.is_open())
    }

    /// Releases the file handle.
    pub fn close(&mut self) {
        self.inner = None;
    }

    fn read_next(&mut self, reader: &mut Reader<RowInput>) -> Option<Result<RawRow>> {
        match reader.read_record(&mut self.record) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(err) => return Some(Err(self.parser.convert(reader.get_mut(), err))),
        }

        let (start, first_line) = self
            .record
            .position()
            .map_or((0, 1), |pos| (pos.byte(), pos.line()));
        let end = reader.position().byte();
        let input = reader.get_mut();
        let at_eof = input.exhausted && end == input.emitted();
        let raw = input.span(start, end);

        // The recorded position precedes any blank lines csv skipped.
        let skipped = raw
            .iter()
            .take_while(|b| matches!(b, b'\r' | b'\n'))
            .filter(|&&b| b == b'\n')
            .count();
        let line = first_line as usize + skipped;

        if self.parser.policy == RowPolicy::Strict
            && at_eof
            && ends_inside_quotes(raw, self.parser.delimiter, self.parser.quote)
        {
            return Some(Err(self.parser.unterminated(line)));
        }
        Some(Ok(RawRow {
            line,
            fields: self.record.iter().map(str::to_string).collect(),
        }))
    }
}

impl Iterator for RawRows {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut reader = self.inner.take()?;
        let result = self.read_next(&mut reader);
        if matches!(result, Some(Ok(_))) {
            self.inner = Some(reader);
        }
        result
    }
}

impl std::iter::FusedIterator for RawRows {}

/// Returns true if `raw` ends inside a quoted field.
fn ends_inside_quotes(raw: &[u8], delimiter: u8, quote: u8) -> bool {
    let mut field_start = true;
    let mut quoted = false;
    let mut closing = false;
    for &b in raw {
        if quoted {
            if b == quote {
                quoted = false;
                closing = true;
            }
            continue;
        }
        if closing && b == quote {
            // Doubled quote.
            quoted = true;
            closing = false;
            continue;
        }
        closing = false;
        if b == delimiter || b == b'\n' || b == b'\r' {
            field_start = true;
        } else {
            quoted = field_start && b == quote;
            field_start = false;
        }
    }
    quoted
}

/// Splits a single line into fields.
///
/// A quoted field left open at the end of the line keeps the rest of the line.
pub fn split_line(line: &str, delimiter: u8, quote: u8) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .quote(quote)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record.iter().map(str::to_string).collect(),
        _ => vec![String::new()],
    }
}
