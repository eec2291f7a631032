//! Scoped file handle producing decoded lines.
//!
//! A [`FileSource`] owns the open file for exactly one pass. The handle is
//! released once the input is exhausted, when an error is returned, on
//! [`FileSource::close`], or when the source is dropped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use encoding_rs::{Decoder, DecoderResult, Encoding};

use crate::error::{IngestError, Result};

/// Buffer size for the underlying reader.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Lifecycle marker of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// The file has never been opened.
    Unopened,
    /// At least one handle is currently live.
    Open,
    /// Every handle opened so far has been released.
    Closed,
}

/// Shared bookkeeping of live handles for one reader.
#[derive(Debug, Default)]
pub struct Lifecycle {
    opened: AtomicBool,
    live: AtomicUsize,
}

impl Lifecycle {
    /// Current state derived from the handle counters.
    pub fn state(&self) -> ReaderState {
        if self.live_handles() > 0 {
            ReaderState::Open
        } else if self.opened.load(Ordering::Acquire) {
            ReaderState::Closed
        } else {
            ReaderState::Unopened
        }
    }

    /// Number of handles currently open.
    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

/// Decrements the live count when dropped.
#[derive(Debug)]
struct HandleGuard {
    lifecycle: Arc<Lifecycle>,
}

impl HandleGuard {
    fn acquire(lifecycle: Arc<Lifecycle>) -> Self {
        lifecycle.opened.store(true, Ordering::Release);
        lifecycle.live.fetch_add(1, Ordering::AcqRel);
        Self { lifecycle }
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.lifecycle.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[derive(Debug)]
struct OpenHandle {
    reader: BufReader<File>,
    _guard: HandleGuard,
}

/// One decoded physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number.
    pub number: usize,
    /// Line text without the trailing `\n` or `\r\n`.
    pub text: String,
}

/// Lazy, single-pass stream of decoded UTF-8 text from a file.
///
/// The source is read either as bytes through [`Read`] or as lines through
/// [`FileSource::lines`]. A decoding or read failure surfaces as an
/// [`io::Error`] from `read`; the matching [`IngestError`] is kept and can be
/// taken with [`FileSource::take_failure`].
pub struct FileSource {
    path: PathBuf,
    encoding: &'static Encoding,
    handle: Option<OpenHandle>,
    decoder: Decoder,
    pending: String,
    cursor: usize,
    newlines: usize,
    eof: bool,
    done: bool,
    failure: Option<IngestError>,
}

impl FileSource {
    /// Opens `path` for decoding with `encoding`.
    pub fn open(path: impl AsRef<Path>, encoding: &'static Encoding) -> Result<Self> {
        Self::open_tracked(path.as_ref(), encoding, Arc::default())
    }

    /// Opens `path`, registering the handle with `lifecycle`.
    pub(crate) fn open_tracked(
        path: &Path,
        encoding: &'static Encoding,
        lifecycle: Arc<Lifecycle>,
    ) -> Result<Self> {
        let file = File::open(path).map_err(|e| IngestError::from_io(path, e))?;
        tracing::debug!(
            path = %path.display(),
            encoding = encoding.name(),
            "opened file source"
        );
        Ok(Self {
            path: path.to_path_buf(),
            encoding,
            handle: Some(OpenHandle {
                reader: BufReader::with_capacity(READ_BUFFER_SIZE, file),
                _guard: HandleGuard::acquire(lifecycle),
            }),
            decoder: encoding.new_decoder_with_bom_removal(),
            pending: String::new(),
            cursor: 0,
            newlines: 0,
            eof: false,
            done: false,
            failure: None,
        })
    }

    /// Path this source reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true while the file handle is held.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the handle. Further reads return end of input.
    pub fn close(&mut self) {
        self.done = true;
        self.release();
    }

    /// Takes the error behind the last failed `read`, if any.
    pub fn take_failure(&mut self) -> Option<IngestError> {
        self.failure.take()
    }

    /// Consumes the source as decoded lines.
    pub fn lines(self) -> Lines {
        Lines {
            reader: BufReader::new(self),
            buf: String::new(),
            number: 0,
            done: false,
        }
    }

    fn release(&mut self) {
        if self.handle.take().is_some() {
            tracing::debug!(
                path = %self.path.display(),
                lines = self.newlines,
                "released file source"
            );
        }
    }

    /// Decodes the next block of bytes into `pending`.
    fn fill(&mut self) -> Result<()> {
        self.pending.clear();
        self.cursor = 0;
        let Some(handle) = self.handle.as_mut() else {
            self.eof = true;
            return Ok(());
        };
        let buf = handle
            .reader
            .fill_buf()
            .map_err(|e| IngestError::from_io(&self.path, e))?;
        let last = buf.is_empty();
        let (result, read) = decode_into(&mut self.decoder, buf, &mut self.pending, last);
        handle.reader.consume(read);
        self.newlines += self.pending.matches('\n').count();

        // Text decoded before the bad bytes is still handed out first.
        if let DecoderResult::Malformed(..) = result {
            self.failure = Some(IngestError::Decoding {
                path: self.path.clone(),
                encoding: self.encoding.name(),
                line: self.newlines + 1,
            });
        }
        if last {
            self.eof = true;
        }
        Ok(())
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.done {
                return Ok(0);
            }
            let available = &self.pending.as_bytes()[self.cursor..];
            if !available.is_empty() {
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                self.cursor += n;
                return Ok(n);
            }
            if let Some(failure) = &self.failure {
                let err = io::Error::new(io::ErrorKind::InvalidData, failure.to_string());
                self.close();
                return Err(err);
            }
            if self.eof {
                self.close();
                return Ok(0);
            }
            if let Err(err) = self.fill() {
                self.failure = Some(err);
            }
        }
    }
}

impl std::fmt::Debug for FileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSource")
            .field("path", &self.path)
            .field("encoding", &self.encoding.name())
            .field("open", &self.is_open())
            .finish()
    }
}

/// Decoded lines of a [`FileSource`].
///
/// Ends after the first error.
#[derive(Debug)]
pub struct Lines {
    reader: BufReader<FileSource>,
    buf: String,
    number: usize,
    done: bool,
}

impl Lines {
    /// Returns true while the file handle is held.
    pub fn is_open(&self) -> bool {
        self.reader.get_ref().is_open()
    }

    /// Releases the handle. The iterator yields nothing afterwards.
    pub fn close(&mut self) {
        self.done = true;
        self.reader.get_mut().close();
    }
}

impl Iterator for Lines {
    type Item = Result<SourceLine>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.buf.clear();
        match self.reader.read_line(&mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                let text = self.buf.strip_suffix('\n').unwrap_or(&self.buf);
                let text = text.strip_suffix('\r').unwrap_or(text);
                self.number += 1;
                Some(Ok(SourceLine {
                    number: self.number,
                    text: text.to_string(),
                }))
            }
            Err(err) => {
                let source = self.reader.get_mut();
                let failure = source
                    .take_failure()
                    .unwrap_or_else(|| IngestError::from_io(source.path(), err));
                self.close();
                Some(Err(failure))
            }
        }
    }
}

impl FusedIterator for Lines {}

/// Decodes all of `src` into `dst`, growing `dst` as needed.
///
/// Returns the final decoder result and the number of bytes consumed.
fn decode_into(
    decoder: &mut Decoder,
    src: &[u8],
    dst: &mut String,
    last: bool,
) -> (DecoderResult, usize) {
    let mut total = 0;
    loop {
        let remaining = &src[total..];
        let needed = decoder
            .max_utf8_buffer_length_without_replacement(remaining.len())
            .unwrap_or(remaining.len() * 3 + 16);
        dst.reserve(needed);
        let (result, read) = decoder.decode_to_string_without_replacement(remaining, dst, last);
        total += read;
        match result {
            DecoderResult::OutputFull => continue,
            other => return (other, total),
        }
    }
}
