//! Terminal and file rendering of headers, records and chunk summaries.

use std::io::Write;

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dt_ingest::{Header, Record};

/// Per-chunk figures for the `chunks` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSummary {
    /// 1-based chunk number.
    pub index: usize,
    pub records: usize,
    pub first_line: usize,
    pub last_line: usize,
}

impl ChunkSummary {
    /// Summarizes one non-empty chunk.
    pub fn from_chunk(index: usize, chunk: &[Record]) -> Self {
        Self {
            index,
            records: chunk.len(),
            first_line: chunk.first().map_or(0, Record::line),
            last_line: chunk.last().map_or(0, Record::line),
        }
    }
}

pub fn headers_table(header: &Header) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("#"), header_cell("Column")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (idx, column) in header.iter().enumerate() {
        table.add_row(vec![Cell::new(idx + 1), Cell::new(column)]);
    }
    table
}

pub fn records_table(header: &Header, records: &[Record]) -> Table {
    let mut table = Table::new();
    let mut cells = vec![header_cell("Line")];
    cells.extend(header.iter().map(header_cell));
    table.set_header(cells);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for record in records {
        let mut row = vec![dim_cell(record.line())];
        row.extend(record.values().iter().map(|value| value_cell(value)));
        table.add_row(row);
    }
    table
}

pub fn chunks_table(summaries: &[ChunkSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chunk"),
        header_cell("Records"),
        header_cell("First line"),
        header_cell("Last line"),
    ]);
    apply_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut total = 0usize;
    for summary in summaries {
        total += summary.records;
        table.add_row(vec![
            Cell::new(summary.index),
            Cell::new(summary.records),
            Cell::new(summary.first_line),
            Cell::new(summary.last_line),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    table
}

/// Writes records as JSON, one object per line.
pub fn write_json_lines<W: Write>(mut writer: W, records: &[Record]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record).context("serialize record")?;
        writeln!(writer).context("write record")?;
    }
    writer.flush().context("flush output")?;
    Ok(())
}

/// Writes the header and `records` as delimited text.
pub fn write_delimited<W: Write>(
    writer: W,
    delimiter: u8,
    header: &Header,
    records: &[Record],
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    writer
        .write_record(header.columns())
        .context("write header")?;
    for record in records {
        writer
            .write_record(record.values())
            .with_context(|| format!("write record from line {}", record.line()))?;
    }
    writer.flush().context("flush output")?;
    Ok(())
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
