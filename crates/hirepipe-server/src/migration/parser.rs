//! Headerless CSV exports to table rows

use csv::{ReaderBuilder, StringRecord};
use hirepipe_common::time::parse_iso8601;

use crate::db::{DepartmentRow, HiredEmployeeRow, JobRow, TableRows};
use crate::features::ingestion::TargetEntity;

/// A CSV line that could not become a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub table: TargetEntity,
    /// 1-based line number in the source file
    pub line: u64,
    pub content: String,
    pub reason: String,
}

impl RejectedLine {
    /// Single-line form written to the failed-records log
    pub fn to_log_line(&self) -> String {
        format!("{}:{}: {} ({})", self.table, self.line, self.content, self.reason)
    }
}

#[derive(Debug)]
pub struct ParsedCsv {
    pub rows: TableRows,
    pub rejected: Vec<RejectedLine>,
}

/// Column layout of each export, in file order
pub fn columns(entity: TargetEntity) -> &'static [&'static str] {
    match entity {
        TargetEntity::Departments => &["id", "department"],
        TargetEntity::Jobs => &["id", "job"],
        TargetEntity::HiredEmployees => &["id", "name", "hire_datetime", "department_id", "job_id"],
    }
}

/// Parse one export.
///
/// Lines with a missing or empty cell, or a cell of the wrong type, are
/// returned in `rejected` instead of failing the file.
pub fn parse_csv(entity: TargetEntity, data: &[u8]) -> Result<ParsedCsv, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = TableRows::empty(entity);
    let mut rejected = Vec::new();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match parse_record(entity, &record, &mut rows) {
            Ok(()) => {},
            Err(reason) => rejected.push(RejectedLine {
                table: entity,
                line,
                content: record.iter().collect::<Vec<_>>().join(","),
                reason,
            }),
        }
    }

    Ok(ParsedCsv { rows, rejected })
}

fn parse_record(
    entity: TargetEntity,
    record: &StringRecord,
    rows: &mut TableRows,
) -> Result<(), String> {
    let names = columns(entity);
    let mut cells = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        match record.get(idx).map(str::trim) {
            Some(cell) if !cell.is_empty() => cells.push(cell),
            _ => return Err(format!("missing {name}")),
        }
    }

    match rows {
        TableRows::Departments(rows) => rows.push(DepartmentRow {
            id: int_cell(cells[0], "id")?,
            department: cells[1].to_string(),
        }),
        TableRows::Jobs(rows) => rows.push(JobRow {
            id: int_cell(cells[0], "id")?,
            job: cells[1].to_string(),
        }),
        TableRows::HiredEmployees(rows) => rows.push(HiredEmployeeRow {
            id: int_cell(cells[0], "id")?,
            name: cells[1].to_string(),
            hire_datetime: parse_iso8601(cells[2]).map_err(|e| e.to_string())?,
            department_id: int_cell(cells[3], "department_id")?,
            job_id: int_cell(cells[4], "job_id")?,
        }),
    }

    Ok(())
}

fn int_cell(cell: &str, name: &str) -> Result<i32, String> {
    cell.parse()
        .map_err(|_| format!("{name} is not an integer: '{cell}'"))
}
