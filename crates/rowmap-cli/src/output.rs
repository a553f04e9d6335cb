//! Rendering of parsed records and the run summary.

use anyhow::Result;
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use rowmap::{ParseReport, render_records};

use crate::commands::ParseOutcome;
use crate::schema::{ColumnKind, DynamicRecord, Value};

/// How parsed records are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Boxed,
    Json,
}

/// Render the records of a parse.
pub fn format_records(outcome: &ParseOutcome, format: OutputFormat) -> Result<String> {
    let records = &outcome.report.records;
    match format {
        OutputFormat::Table => Ok(records_table(&outcome.columns, records).to_string()),
        OutputFormat::Boxed => Ok(render_records(records)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(records)?),
    }
}

pub fn records_table(columns: &[(String, ColumnKind)], records: &[DynamicRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(columns.iter().map(|(name, _)| header_cell(name)));
    apply_table_style(&mut table);
    for (index, (_, kind)) in columns.iter().enumerate() {
        if matches!(kind, ColumnKind::Int | ColumnKind::Float) {
            align_column(&mut table, index, CellAlignment::Right);
        }
    }
    for record in records {
        table.add_row(
            columns
                .iter()
                .map(|(name, _)| value_cell(record.get(name))),
        );
    }
    table
}

/// Row counts for a finished parse.
pub fn summary_table<R>(report: &ParseReport<R>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rows read"),
        header_cell("Parsed"),
        header_cell("Skipped"),
    ]);
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    for index in 0..3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let skipped = if report.rows_skipped > 0 {
        Cell::new(report.rows_skipped)
            .fg(Color::Yellow)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell(report.rows_skipped)
    };
    table.add_row(vec![
        Cell::new(report.rows_read),
        Cell::new(report.rows_parsed()).fg(Color::Green),
        skipped,
    ]);
    table
}

fn apply_table_style(table: &mut Table) {
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

fn value_cell(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => dim_cell("-"),
        Some(value) => Cell::new(value),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
