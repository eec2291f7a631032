//! Typed access to record values.
//!
//! Records hold strings only. These helpers convert individual values on
//! request and are never applied by the reader itself.

use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

use crate::csv::Record;

/// Errors from typed value access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoerceError {
    /// The record has no such column.
    #[error("column '{column}' not found")]
    UnknownColumn { column: String },

    /// The value could not be converted.
    #[error("cannot parse '{value}' in column '{column}' at line {line} as {target}")]
    InvalidValue {
        column: String,
        value: String,
        line: usize,
        target: &'static str,
    },
}

/// Typed accessors layered over [`Record`].
pub trait RecordExt {
    /// Parses the trimmed value of `column` with [`FromStr`].
    fn parse<T: FromStr>(&self, column: &str) -> Result<T, CoerceError>;

    /// Like [`RecordExt::parse`], but an empty value yields `None`.
    fn parse_opt<T: FromStr>(&self, column: &str) -> Result<Option<T>, CoerceError>;

    /// Parses the value of `column` as a date using a `chrono` format string.
    fn parse_date(&self, column: &str, format: &str) -> Result<NaiveDate, CoerceError>;
}

impl RecordExt for Record {
    fn parse<T: FromStr>(&self, column: &str) -> Result<T, CoerceError> {
        let value = field(self, column)?;
        value
            .trim()
            .parse()
            .map_err(|_| invalid(self, column, value, std::any::type_name::<T>()))
    }

    fn parse_opt<T: FromStr>(&self, column: &str) -> Result<Option<T>, CoerceError> {
        if field(self, column)?.trim().is_empty() {
            return Ok(None);
        }
        self.parse(column).map(Some)
    }

    fn parse_date(&self, column: &str, format: &str) -> Result<NaiveDate, CoerceError> {
        let value = field(self, column)?;
        NaiveDate::parse_from_str(value.trim(), format)
            .map_err(|_| invalid(self, column, value, "date"))
    }
}

fn field<'a>(record: &'a Record, column: &str) -> Result<&'a str, CoerceError> {
    record.get(column).ok_or_else(|| CoerceError::UnknownColumn {
        column: column.to_string(),
    })
}

fn invalid(record: &Record, column: &str, value: &str, target: &'static str) -> CoerceError {
    CoerceError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
        line: record.line(),
        target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::input::read_csv;

    fn sample() -> Vec<Record> {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "city,sales,opened\nBeijing, 1200 ,2024-03-01\nShanghai,,2023-11-15\nShenzhen,n/a,15/11/2023\n"
        )
        .unwrap();
        read_csv(file.path()).unwrap()
    }

    #[test]
    fn test_parse_numbers() {
        let rows = sample();
        assert_eq!(rows[0].parse::<u32>("sales"), Ok(1200));
        assert_eq!(rows[0].parse::<f64>("sales"), Ok(1200.0));
    }

    #[test]
    fn test_parse_opt_empty_is_none() {
        let rows = sample();
        assert_eq!(rows[1].parse_opt::<u32>("sales"), Ok(None));
        assert_eq!(rows[0].parse_opt::<u32>("sales"), Ok(Some(1200)));
    }

    #[test]
    fn test_parse_invalid_reports_line() {
        let rows = sample();
        match rows[2].parse::<u32>("sales").unwrap_err() {
            CoerceError::InvalidValue { value, line, .. } => {
                assert_eq!(value, "n/a");
                assert_eq!(line, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_date() {
        let rows = sample();
        assert_eq!(
            rows[0].parse_date("opened", "%Y-%m-%d"),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(rows[2].parse_date("opened", "%Y-%m-%d").is_err());
    }

    #[test]
    fn test_unknown_column() {
        let rows = sample();
        assert_eq!(
            rows[0].parse::<u32>("profit"),
            Err(CoerceError::UnknownColumn {
                column: "profit".to_string()
            })
        );
    }
}
