// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{collections::BTreeMap, path::Path};

use log::debug;
use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet};

use crate::config::{rgb_u32, ReportColors};
use crate::errors::MutscanError;
use crate::mutation::{MutationRecord, MutationType};
use crate::report::summary::{codon_groups, summary_stats, variants};

pub const MUTATION_SUMMARY: &str = "Mutation Summary";
pub const SUMMARY_STATISTICS: &str = "Summary Statistics";
pub const CODON_ANALYSIS: &str = "Codon Analysis";
pub const VARIANT_ANALYSIS: &str = "Variant Analysis";

const MUTATION_HEADERS: [&str; 10] = [
    "Sample",
    "Orientation",
    "Nucleotide Pos",
    "Original Codon",
    "Mutated Codon",
    "AA Pos",
    "Original AA",
    "Mutated AA",
    "Silent?",
    "Mutation Type",
];

const CODON_HEADERS: [&str; 9] = [
    "Position",
    "Original Codon",
    "Mutated Codon",
    "Occurrence Count",
    "AA Pos",
    "Original AA",
    "Mutated AA",
    "Silent",
    "Samples",
];

const VARIANT_HEADERS: [&str; 5] = ["Variant", "Frequency", "Mutation Count", "Mutations", "Samples"];

// Width of the Samples column on the variant sheet is computed from at most this many characters.
const VARIANT_SAMPLES_WIDTH_CAP: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(usize),
    Bool(bool),
}

impl CellValue {
    // Blank cells (empty text, zero, false) do not widen their column.
    fn width(&self) -> Option<usize> {
        match self {
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(s.chars().count()),
            CellValue::Int(0) => None,
            CellValue::Int(n) => Some(n.to_string().len()),
            CellValue::Bool(false) => None,
            CellValue::Bool(true) => Some("True".len()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<usize> for CellValue {
    fn from(n: usize) -> Self {
        CellValue::Int(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

/// Writes cells to one worksheet and keeps track of the widest value in each column.
pub struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    widths: BTreeMap<u16, usize>,
    width_caps: BTreeMap<u16, usize>,
}

impl<'a> SheetWriter<'a> {
    pub fn new(sheet: &'a mut Worksheet) -> Self {
        SheetWriter {
            sheet,
            widths: BTreeMap::new(),
            width_caps: BTreeMap::new(),
        }
    }

    pub fn cap_width(&mut self, col: u16, max: usize) {
        self.width_caps.insert(col, max);
    }

    pub fn write(
        &mut self,
        row: u32,
        col: u16,
        value: impl Into<CellValue>,
        format: Option<&Format>,
    ) -> Result<(), MutscanError> {
        let value = value.into();
        if let Some(mut w) = value.width() {
            if let Some(&cap) = self.width_caps.get(&col) {
                w = w.min(cap);
            }
            let current = self.widths.entry(col).or_default();
            *current = (*current).max(w);
        }
        match (&value, format) {
            (CellValue::Text(s), Some(f)) => self.sheet.write_string_with_format(row, col, s, f)?,
            (CellValue::Text(s), None) => self.sheet.write_string(row, col, s)?,
            (CellValue::Int(n), Some(f)) => {
                self.sheet.write_number_with_format(row, col, *n as f64, f)?
            }
            (CellValue::Int(n), None) => self.sheet.write_number(row, col, *n as f64)?,
            (CellValue::Bool(b), Some(f)) => {
                self.sheet.write_boolean_with_format(row, col, *b, f)?
            }
            (CellValue::Bool(b), None) => self.sheet.write_boolean(row, col, *b)?,
        };
        Ok(())
    }

    pub fn write_headers(
        &mut self,
        row: u32,
        headers: &[&str],
        format: &Format,
    ) -> Result<(), MutscanError> {
        for (col, header) in headers.iter().enumerate() {
            self.write(row, col as u16, *header, Some(format))?;
        }
        Ok(())
    }

    /// Sets every touched column to its widest value plus two characters.
    pub fn finish(mut self) -> Result<BTreeMap<u16, usize>, MutscanError> {
        for (&col, &width) in &self.widths {
            self.sheet.set_column_width(col, (width + 2) as f64)?;
        }
        Ok(self.widths)
    }
}

struct Formats {
    header: Format,
    bold: Format,
    silent: Format,
    missense: Format,
}

impl Formats {
    fn new(colors: &ReportColors) -> Self {
        Formats {
            header: Format::new()
                .set_bold()
                .set_background_color(Color::RGB(rgb_u32(colors.header)))
                .set_border_bottom(FormatBorder::Medium),
            bold: Format::new().set_bold(),
            silent: Format::new().set_background_color(Color::RGB(rgb_u32(colors.silent))),
            missense: Format::new().set_background_color(Color::RGB(rgb_u32(colors.missense))),
        }
    }
}

fn write_mutation_summary(
    sheet: &mut Worksheet,
    records: &[MutationRecord],
    formats: &Formats,
) -> Result<(), MutscanError> {
    let mut w = SheetWriter::new(sheet);
    // Rows 1 and 2 are left free above the table.
    w.write_headers(2, &MUTATION_HEADERS, &formats.header)?;

    let mut sorted: Vec<&MutationRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.sample
            .cmp(&b.sample)
            .then(a.nucleotide_position.cmp(&b.nucleotide_position))
    });

    let mut row = 3;
    let mut current_sample: Option<&str> = None;
    for rec in sorted {
        if current_sample.is_some_and(|s| s != rec.sample) {
            // Blank row between samples.
            row += 1;
        }
        current_sample = Some(rec.sample.as_str());

        w.write(row, 0, rec.sample.as_str(), None)?;
        w.write(row, 1, rec.orientation.to_string(), None)?;
        w.write(row, 2, rec.nucleotide_position, None)?;
        w.write(row, 3, rec.original_codon.as_str(), None)?;
        w.write(row, 4, rec.mutated_codon.as_str(), None)?;
        w.write(row, 5, rec.aa_position, None)?;
        w.write(row, 6, rec.original_aa.as_str(), None)?;
        w.write(row, 7, rec.mutated_aa.as_str(), None)?;
        w.write(
            row,
            8,
            rec.is_silent,
            rec.is_silent.then_some(&formats.silent),
        )?;
        w.write(
            row,
            9,
            rec.mutation_type.to_string(),
            (rec.mutation_type == MutationType::Missense).then_some(&formats.missense),
        )?;
        row += 1;
    }
    w.finish()?;
    Ok(())
}

fn write_summary_statistics(
    sheet: &mut Worksheet,
    records: &[MutationRecord],
    formats: &Formats,
) -> Result<(), MutscanError> {
    let stats = summary_stats(records);
    let mut w = SheetWriter::new(sheet);
    w.write(0, 0, "Total Samples Analyzed:", None)?;
    w.write(0, 1, stats.sample_count, None)?;

    w.write(2, 0, "Mutation Statistics", Some(&formats.bold))?;
    w.write(3, 0, "Total Mutations:", None)?;
    w.write(3, 1, stats.total, None)?;
    w.write(4, 0, "Silent Mutations:", None)?;
    w.write(4, 1, stats.silent, None)?;
    w.write(5, 0, "Missense Mutations:", None)?;
    w.write(5, 1, stats.missense, None)?;

    w.write(7, 0, "Mutations per Sample", Some(&formats.bold))?;
    w.write(8, 0, "Sample", None)?;
    w.write(8, 1, "Mutation Count", None)?;
    for (i, (sample, count)) in stats.per_sample.into_iter().enumerate() {
        let row = 9 + i as u32;
        w.write(row, 0, sample, None)?;
        w.write(row, 1, count, None)?;
    }
    w.finish()?;
    Ok(())
}

fn write_codon_analysis(
    sheet: &mut Worksheet,
    records: &[MutationRecord],
    formats: &Formats,
) -> Result<(), MutscanError> {
    let mut w = SheetWriter::new(sheet);
    w.write_headers(0, &CODON_HEADERS, &formats.header)?;
    for (i, group) in codon_groups(records).into_iter().enumerate() {
        let row = 1 + i as u32;
        w.write(row, 0, group.position, None)?;
        w.write(row, 1, group.original_codon, None)?;
        w.write(row, 2, group.mutated_codon, None)?;
        w.write(row, 3, group.count, None)?;
        w.write(row, 4, group.aa_position, None)?;
        w.write(row, 5, group.original_aa, None)?;
        w.write(row, 6, group.mutated_aa, None)?;
        w.write(row, 7, group.silent, group.silent.then_some(&formats.silent))?;
        w.write(row, 8, group.samples, None)?;
    }
    w.finish()?;
    Ok(())
}

fn write_variant_analysis(
    sheet: &mut Worksheet,
    records: &[MutationRecord],
    formats: &Formats,
) -> Result<(), MutscanError> {
    let mut w = SheetWriter::new(sheet);
    w.cap_width(4, VARIANT_SAMPLES_WIDTH_CAP);
    w.write_headers(0, &VARIANT_HEADERS, &formats.header)?;
    for (i, variant) in variants(records).into_iter().enumerate() {
        let row = 1 + i as u32;
        w.write(row, 0, variant.name, None)?;
        w.write(row, 1, variant.frequency, None)?;
        w.write(row, 2, variant.mutation_count, None)?;
        w.write(row, 3, variant.mutations, None)?;
        w.write(row, 4, variant.samples, None)?;
    }
    w.finish()?;
    Ok(())
}

/// Writes the four-sheet report and returns the sheet names.
pub fn write_report_workbook(
    path: &Path,
    records: &[MutationRecord],
    colors: &ReportColors,
) -> Result<Vec<String>, MutscanError> {
    let formats = Formats::new(colors);
    let mut workbook = Workbook::new();

    write_mutation_summary(
        workbook.add_worksheet().set_name(MUTATION_SUMMARY)?,
        records,
        &formats,
    )?;
    write_summary_statistics(
        workbook.add_worksheet().set_name(SUMMARY_STATISTICS)?,
        records,
        &formats,
    )?;
    debug!("Creating {} sheet", CODON_ANALYSIS);
    write_codon_analysis(
        workbook.add_worksheet().set_name(CODON_ANALYSIS)?,
        records,
        &formats,
    )?;
    debug!("Creating {} sheet", VARIANT_ANALYSIS);
    write_variant_analysis(
        workbook.add_worksheet().set_name(VARIANT_ANALYSIS)?,
        records,
        &formats,
    )?;

    workbook.save(path)?;
    Ok([
        MUTATION_SUMMARY,
        SUMMARY_STATISTICS,
        CODON_ANALYSIS,
        VARIANT_ANALYSIS,
    ]
    .map(String::from)
    .to_vec())
}
