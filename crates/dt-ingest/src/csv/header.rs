//! Header row representation.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::error::{IngestError, Result};

/// Ordered, unique column names taken from the first row of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    /// Builds a header, rejecting duplicate column names.
    pub(crate) fn from_fields(path: &Path, columns: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(IngestError::DuplicateColumn {
                    path: path.to_path_buf(),
                    column: column.clone(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Column names in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of `column`, if present.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Returns true if `column` is part of the header.
    pub fn contains(&self, column: &str) -> bool {
        self.index_of(column).is_some()
    }

    /// Iterates over the column names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

impl PartialEq<[&str]> for Header {
    fn eq(&self, other: &[&str]) -> bool {
        self.columns.len() == other.len() && self.iter().zip(other).all(|(a, b)| a == *b)
    }
}

impl<const N: usize> PartialEq<[&str; N]> for Header {
    fn eq(&self, other: &[&str; N]) -> bool {
        self == &other[..]
    }
}
