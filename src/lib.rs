// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

pub mod align;
pub mod codon;
pub mod config;
pub mod errors;
pub mod mutation;
pub mod report;
mod runner;
pub mod scan;
pub mod seq;
pub mod sequencer;
pub mod table;

use crate::errors::MutscanError;

pub use crate::runner::{
    run_align, run_report_stage, AlignArgs, AlignCommand, ReportArgs, ReportCommand,
};

pub fn run() -> Result<(), MutscanError> {
    runner::run()
}
