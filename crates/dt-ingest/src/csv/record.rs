//! Parsed data rows.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::header::Header;

/// One data row: an ordered mapping from column name to string value.
///
/// The value count always equals the header length.
#[derive(Debug, Clone)]
pub struct Record {
    header: Arc<Header>,
    values: Vec<String>,
    line: usize,
}

impl Record {
    pub(crate) fn new(header: Arc<Header>, values: Vec<String>, line: usize) -> Self {
        debug_assert_eq!(header.len(), values.len());
        Self {
            header,
            values,
            line,
        }
    }

    /// Value of `column`, or `None` if the column does not exist.
    pub fn get(&self, column: &str) -> Option<&str> {
        let idx = self.header.index_of(column)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Value at position `idx`.
    pub fn get_index(&self, idx: usize) -> Option<&str> {
        self.values.get(idx).map(String::as_str)
    }

    /// Header shared by all records of one read.
    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Values in column order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// 1-based line number where the row starts in the file.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .iter()
            .zip(self.values.iter().map(String::as_str))
    }

    pub fn into_values(self) -> Vec<String> {
        self.values
    }
}

/// Records compare by columns and values; the source line is ignored.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
            && (Arc::ptr_eq(&self.header, &other.header) || self.header == other.header)
    }
}

impl Eq for Record {}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}
