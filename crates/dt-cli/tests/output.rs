//! Integration tests for the output module.

use std::fs;
use std::path::PathBuf;

use dt_cli::output::{
    ChunkSummary, chunks_table, headers_table, records_table, write_delimited, write_json_lines,
};
use dt_ingest::{CsvReader, ReaderOptions, Record};
use tempfile::TempDir;

fn write_input(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("input.csv");
    fs::write(&path, contents).unwrap();
    path
}

fn load(contents: &str) -> (TempDir, CsvReader, Vec<Record>) {
    let dir = TempDir::new().unwrap();
    let path = write_input(&dir, contents);
    let mut reader = CsvReader::open(&path, ReaderOptions::default()).unwrap();
    let records = reader.read_all().unwrap();
    (dir, reader, records)
}

#[test]
fn test_write_delimited_quotes_when_needed() {
    let (_dir, mut reader, records) = load("id,note\n1,\"a, b\"\n2,plain\n");
    let header = reader.get_headers().unwrap();

    let mut out = Vec::new();
    write_delimited(&mut out, b',', &header, &records).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "id,note\n1,\"a, b\"\n2,plain\n"
    );
}

#[test]
fn test_write_delimited_output_reads_back() {
    let (dir, mut reader, records) = load("city,pop\nBeijing,21\nParis,2\n");
    let header = reader.get_headers().unwrap();
    let out_path = dir.path().join("out.tsv");

    let file = fs::File::create(&out_path).unwrap();
    write_delimited(file, b'\t', &header, &records).unwrap();

    let mut reread = CsvReader::open(&out_path, ReaderOptions::tsv()).unwrap();
    assert_eq!(reread.read_all().unwrap(), records);
}

#[test]
fn test_write_json_lines() {
    let (_dir, _reader, records) = load("id,name\n1,Alice\n2,Bob\n");

    let mut out = Vec::new();
    write_json_lines(&mut out, &records).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "{\"id\":\"1\",\"name\":\"Alice\"}\n{\"id\":\"2\",\"name\":\"Bob\"}\n"
    );
}

#[test]
fn test_chunk_summary_lines() {
    let (_dir, _reader, records) = load("id\n1\n\n2\n3\n");

    let summary = ChunkSummary::from_chunk(1, &records[..2]);
    assert_eq!(
        summary,
        ChunkSummary {
            index: 1,
            records: 2,
            first_line: 2,
            last_line: 4,
        }
    );
    assert_eq!(ChunkSummary::from_chunk(3, &[]).first_line, 0);
}

#[test]
fn test_tables_render_contents() {
    let (_dir, mut reader, records) = load("id,name\n1,Alice\n2,\n");
    let header = reader.get_headers().unwrap();

    let mut columns = headers_table(&header);
    columns.force_no_tty();
    let rendered = columns.to_string();
    assert!(rendered.contains("Column"));
    assert!(rendered.contains("name"));

    let mut rows = records_table(&header, &records);
    rows.force_no_tty();
    let rendered = rows.to_string();
    assert!(rendered.contains("Alice"));
    assert!(rendered.contains("Line"));

    let summaries = vec![
        ChunkSummary::from_chunk(1, &records[..1]),
        ChunkSummary::from_chunk(2, &records[1..]),
    ];
    let mut chunks = chunks_table(&summaries);
    chunks.force_no_tty();
    assert!(chunks.to_string().contains("TOTAL"));
}
