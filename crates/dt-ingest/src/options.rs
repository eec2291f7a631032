//! Reader configuration.

use encoding_rs::{Encoding, UTF_8};

use crate::error::{IngestError, Result};

/// How rows whose field count differs from the header are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowPolicy {
    /// Pad missing trailing fields with `""` and drop extra fields.
    #[default]
    Lenient,
    /// Fail with [`IngestError::MalformedRow`] on any mismatch.
    Strict,
}

/// Options shared by every access strategy of a reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Text encoding of the file. Defaults to UTF-8.
    pub encoding: &'static Encoding,
    /// Field delimiter. Defaults to `,`.
    pub delimiter: u8,
    /// Quote character. Defaults to `"`.
    pub quote: u8,
    /// Field-count mismatch handling.
    pub policy: RowPolicy,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            delimiter: b',',
            quote: b'"',
            policy: RowPolicy::default(),
        }
    }
}

impl ReaderOptions {
    /// Tab-delimited preset.
    #[must_use]
    pub fn tsv() -> Self {
        Self::default().with_delimiter(b'\t')
    }

    /// Set the encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the encoding from a WHATWG label such as `utf-8` or `gbk`.
    pub fn with_encoding_label(self, label: &str) -> Result<Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            IngestError::UnknownEncoding {
                label: label.to_string(),
            }
        })?;
        Ok(self.with_encoding(encoding))
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character.
    #[must_use]
    pub fn with_quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Set the row policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for `with_policy(RowPolicy::Strict)`.
    #[must_use]
    pub fn strict(self) -> Self {
        self.with_policy(RowPolicy::Strict)
    }

    /// Checks that delimiter and quote are usable.
    pub fn validate(&self) -> Result<()> {
        for (name, byte) in [("delimiter", self.delimiter), ("quote", self.quote)] {
            if !byte.is_ascii() || byte == b'\n' || byte == b'\r' {
                return Err(IngestError::InvalidArgument {
                    name,
                    reason: format!("{:?} must be an ASCII character other than a line break", byte as char),
                });
            }
        }
        if self.delimiter == self.quote {
            return Err(IngestError::InvalidArgument {
                name: "quote",
                reason: "quote and delimiter must differ".to_string(),
            });
        }
        Ok(())
    }
}
