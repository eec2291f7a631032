use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use tracing::{info, info_span};

use dt_cli::output::{
    ChunkSummary, chunks_table, headers_table, records_table, write_delimited, write_json_lines,
};
use dt_ingest::{CsvReader, ReaderOptions, RowPolicy};

use crate::cli::{ChunksArgs, FileArgs, FilterArgs, ReadArgs, ShowArgs};

/// Builds reader options from the global read flags.
pub fn reader_options(args: &ReadArgs) -> Result<ReaderOptions> {
    let mut options = ReaderOptions::default()
        .with_encoding_label(&args.encoding)
        .context("resolve --encoding")?;
    if args.tsv {
        options = options.with_delimiter(b'\t');
    } else if let Some(delimiter) = args.delimiter {
        options = options.with_delimiter(delimiter);
    }
    if args.strict {
        options = options.with_policy(RowPolicy::Strict);
    }
    options.validate().context("invalid read options")?;
    Ok(options)
}

fn open_reader(path: &std::path::Path, options: ReaderOptions) -> Result<CsvReader> {
    CsvReader::open(path, options).with_context(|| format!("open {}", path.display()))
}

pub fn run_headers(args: &FileArgs, options: ReaderOptions) -> Result<()> {
    let mut reader = open_reader(&args.file, options)?;
    let header = reader.get_headers().context("read header")?;
    println!("{}", headers_table(&header));
    Ok(())
}

pub fn run_count(args: &FileArgs, options: ReaderOptions) -> Result<()> {
    let mut reader = open_reader(&args.file, options)?;
    let count = reader.get_row_count().context("count rows")?;
    info!(path = %args.file.display(), rows = count, "counted rows");
    println!("{count}");
    Ok(())
}

pub fn run_show(args: &ShowArgs, options: ReaderOptions) -> Result<()> {
    let mut reader = open_reader(&args.file, options)?;
    let mut records = reader.read_iterator().context("read records")?;
    let mut shown = Vec::with_capacity(args.limit.min(1024));
    for record in records.by_ref().take(args.limit) {
        shown.push(record.context("read record")?);
    }
    records.close();

    if args.json {
        write_json_lines(io::stdout().lock(), &shown)?;
    } else {
        println!("{}", records_table(records.header(), &shown));
    }
    info!(shown = shown.len(), "printed records");
    Ok(())
}

pub fn run_chunks(args: &ChunksArgs, options: ReaderOptions) -> Result<()> {
    let span = info_span!("chunks", path = %args.file.display(), size = args.size);
    let _guard = span.enter();
    let mut reader = open_reader(&args.file, options)?;
    let mut summaries = Vec::new();
    for (idx, chunk) in reader.read_chunks(args.size)?.enumerate() {
        let chunk = chunk.with_context(|| format!("read chunk {}", idx + 1))?;
        let summary = ChunkSummary::from_chunk(idx + 1, &chunk);
        info!(chunk = summary.index, records = summary.records, "processed chunk");
        summaries.push(summary);
    }
    println!("{}", chunks_table(&summaries));
    Ok(())
}

pub fn run_filter(args: &FilterArgs, options: ReaderOptions) -> Result<()> {
    let mut reader = open_reader(&args.file, options)?;
    let header = reader.get_headers().context("read header")?;
    if !header.contains(&args.column) {
        anyhow::bail!(
            "column '{}' not found in {} (available: {})",
            args.column,
            args.file.display(),
            header.columns().join(", ")
        );
    }

    let column = args.column.as_str();
    let matched = match (&args.equals, &args.contains) {
        (Some(expected), _) => reader.filter_rows(|r| r.get(column) == Some(expected.as_str())),
        (None, Some(needle)) => {
            reader.filter_rows(|r| r.get(column).is_some_and(|v| v.contains(needle.as_str())))
        }
        (None, None) => anyhow::bail!("either --equals or --contains is required"),
    }
    .context("filter records")?;
    info!(column, matched = matched.len(), "filtered records");

    match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_delimited(BufWriter::new(file), options.delimiter, &header, &matched)
        }
        None => write_delimited(io::stdout().lock(), options.delimiter, &header, &matched),
    }
}
