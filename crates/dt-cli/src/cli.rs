//! CLI argument definitions for data-tools.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "data-tools",
    version,
    about = "Inspect and filter delimited text files",
    long_about = "Inspect and filter delimited text files (CSV, TSV, ...).\n\n\
                  The first row is the header; every other row becomes a record.\n\
                  Short rows are padded and long rows truncated unless --strict is set."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub read: ReadArgs,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

/// Options controlling how input files are parsed.
#[derive(Args)]
pub struct ReadArgs {
    /// Field delimiter: a single ASCII character, or `tab` / `\t`.
    #[arg(
        long,
        short = 'd',
        value_name = "CHAR",
        value_parser = parse_delimiter,
        global = true,
        conflicts_with = "tsv"
    )]
    pub delimiter: Option<u8>,

    /// Shorthand for a tab delimiter.
    #[arg(long, global = true)]
    pub tsv: bool,

    /// Input encoding label (utf-8, gbk, windows-1252, utf-16le, ...).
    #[arg(long, short = 'e', value_name = "LABEL", default_value = "utf-8", global = true)]
    pub encoding: String,

    /// Fail on rows whose field count differs from the header.
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the header columns of a file.
    Headers(FileArgs),

    /// Print the number of data rows (header excluded).
    Count(FileArgs),

    /// Print records as a table or JSON.
    Show(ShowArgs),

    /// Summarize the file split into fixed-size chunks.
    Chunks(ChunksArgs),

    /// Write the records whose column matches a value.
    Filter(FilterArgs),
}

#[derive(Args)]
pub struct FileArgs {
    /// Path to the delimited file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Path to the delimited file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Maximum number of records to print.
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: usize,

    /// Print records as JSON lines instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ChunksArgs {
    /// Path to the delimited file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Records per chunk.
    #[arg(long, short = 's', default_value_t = 1000)]
    pub size: usize,
}

#[derive(Args)]
pub struct FilterArgs {
    /// Path to the delimited file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Column to test.
    #[arg(long, short = 'c')]
    pub column: String,

    /// Keep records whose value equals this text.
    #[arg(long, conflicts_with = "contains", required_unless_present = "contains")]
    pub equals: Option<String>,

    /// Keep records whose value contains this text.
    #[arg(long)]
    pub contains: Option<String>,

    /// Write matches to a file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(format!(
                    "expected a single ASCII character or `tab`, got {value:?}"
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("\\t"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn test_filter_requires_a_condition() {
        assert!(Cli::try_parse_from(["data-tools", "filter", "a.csv", "-c", "city"]).is_err());
        let cli = Cli::try_parse_from([
            "data-tools",
            "--tsv",
            "filter",
            "a.csv",
            "-c",
            "city",
            "--equals",
            "Beijing",
        ])
        .unwrap();
        assert!(cli.read.tsv);
        assert!(matches!(cli.command, Command::Filter(ref args) if args.equals.as_deref() == Some("Beijing")));
    }
}
