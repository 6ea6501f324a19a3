// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

//! The intermediate mutation table: one header row, one row per codon change.

use std::path::Path;

use calamine::{open_workbook, Data, Reader, Xlsx};
use log::debug;
use rust_xlsxwriter::{Format, Workbook};

use crate::errors::MutscanError;
use crate::mutation::{MutationRecord, MutationType};

pub const COLUMNS: [&str; 10] = [
    "sample",
    "orientation",
    "nucleotide_position",
    "original_codon",
    "mutated_codon",
    "aa_position",
    "original_aa",
    "mutated_aa",
    "is_silent",
    "mutation_type",
];

static EMPTY_CELL: Data = Data::Empty;

pub fn write_mutation_table<P: AsRef<Path>>(
    path: P,
    records: &[MutationRecord],
) -> Result<(), MutscanError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();
    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }
    for (i, rec) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &rec.sample)?;
        sheet.write_string(row, 1, rec.orientation.to_string())?;
        sheet.write_number(row, 2, rec.nucleotide_position as f64)?;
        sheet.write_string(row, 3, &rec.original_codon)?;
        sheet.write_string(row, 4, &rec.mutated_codon)?;
        sheet.write_number(row, 5, rec.aa_position as f64)?;
        sheet.write_string(row, 6, &rec.original_aa)?;
        sheet.write_string(row, 7, &rec.mutated_aa)?;
        sheet.write_boolean(row, 8, rec.is_silent)?;
        sheet.write_string(row, 9, rec.mutation_type.to_string())?;
    }
    workbook.save(path.as_ref())?;
    debug!(
        "wrote {} rows to {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(())
}

pub fn read_mutation_table<P: AsRef<Path>>(path: P) -> Result<Vec<MutationRecord>, MutscanError> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range_at(0).ok_or_else(|| {
        MutscanError::Format(format!("{} contains no worksheet", path.display()))
    })??;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| MutscanError::Format(format!("{} is empty", path.display())))?;
    let index = column_index(header)?;

    let mut records = Vec::new();
    // Row numbers in messages are 1-based, as shown by spreadsheet programs.
    for (i, row) in rows.enumerate() {
        let row_num = i + 2;
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let cell = |col: usize| row.get(index[col]).unwrap_or(&EMPTY_CELL);
        let mutation_type = text(cell(9), row_num, COLUMNS[9])?;
        let orientation = text(cell(1), row_num, COLUMNS[1])?;
        records.push(MutationRecord {
            sample: text(cell(0), row_num, COLUMNS[0])?,
            orientation: orientation
                .parse()
                .map_err(|e| MutscanError::Format(format!("row {}: {}", row_num, e)))?,
            nucleotide_position: integer(cell(2), row_num, COLUMNS[2])?,
            original_codon: text(cell(3), row_num, COLUMNS[3])?,
            mutated_codon: text(cell(4), row_num, COLUMNS[4])?,
            aa_position: integer(cell(5), row_num, COLUMNS[5])?,
            original_aa: text(cell(6), row_num, COLUMNS[6])?,
            mutated_aa: text(cell(7), row_num, COLUMNS[7])?,
            is_silent: boolean(cell(8), row_num, COLUMNS[8])?,
            mutation_type: mutation_type
                .parse::<MutationType>()
                .map_err(|e| MutscanError::Format(format!("row {}: {}", row_num, e)))?,
        });
    }
    debug!("read {} rows from {}", records.len(), path.display());
    Ok(records)
}

// Maps each expected column to its position in the sheet.
fn column_index(header: &[Data]) -> Result<[usize; 10], MutscanError> {
    let mut index = [0; 10];
    for (slot, name) in index.iter_mut().zip(COLUMNS) {
        *slot = header
            .iter()
            .position(|cell| matches!(cell, Data::String(s) if s.trim() == name))
            .ok_or_else(|| MutscanError::Format(format!("missing column '{}'", name)))?;
    }
    Ok(index)
}

fn cell_error(row: usize, column: &str, what: &str, cell: &Data) -> MutscanError {
    MutscanError::Format(format!(
        "row {}, column '{}': expected {}, found {:?}",
        row, column, what, cell
    ))
}

fn text(cell: &Data, row: usize, column: &str) -> Result<String, MutscanError> {
    match cell {
        Data::String(s) => Ok(s.clone()),
        Data::Int(i) => Ok(i.to_string()),
        _ => Err(cell_error(row, column, "text", cell)),
    }
}

fn integer(cell: &Data, row: usize, column: &str) -> Result<usize, MutscanError> {
    match cell {
        Data::Int(i) if *i >= 0 => Ok(*i as usize),
        Data::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Ok(*f as usize),
        Data::String(s) => s
            .trim()
            .parse()
            .map_err(|_| cell_error(row, column, "a position", cell)),
        _ => Err(cell_error(row, column, "a position", cell)),
    }
}

fn boolean(cell: &Data, row: usize, column: &str) -> Result<bool, MutscanError> {
    match cell {
        Data::Bool(b) => Ok(*b),
        Data::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Data::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(cell_error(row, column, "TRUE or FALSE", cell)),
    }
}
