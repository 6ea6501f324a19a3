// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

//! The report stage: mutation table in, formatted workbook and plots out.

pub mod plots;
pub mod summary;
pub mod workbook;


use std::path::PathBuf;

use log::info;

use crate::config::ReportColors;
use crate::errors::MutscanError;
use crate::table::read_mutation_table;

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub plots: PathBuf,
    pub colors: ReportColors,
}

#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub sheets: Vec<String>,
    pub plots: Vec<PathBuf>,
}

pub fn run_report(opts: &ReportOptions) -> Result<ReportOutput, MutscanError> {
    let records = read_mutation_table(&opts.input)?;
    info!("{} mutation rows from {}", records.len(), opts.input.display());

    let sheets = workbook::write_report_workbook(&opts.output, &records, &opts.colors)?;
    println!("Workbook has {} sheets: {:?}", sheets.len(), sheets);
    println!("Excel report generated: {}", opts.output.display());

    let plots = plots::write_plots(&opts.plots, &records, &opts.colors)?;
    println!("Plots generated in directory: {}", opts.plots.display());

    Ok(ReportOutput { sheets, plots })
}
