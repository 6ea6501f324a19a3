// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

//! The alignment stage: every AB1 read in a directory against one reference.

use std::{
    fs,
    io::{stdout, Write},
    path::{Path, PathBuf},
};

use log::{debug, info};
use regex::Regex;

use crate::align::{ReadAligner, ScoringConfig};
use crate::codon::analyze_codon_changes;
use crate::errors::MutscanError;
use crate::mutation::{sort_records, MutationRecord};
use crate::seq::abif::read_abif_file;
use crate::seq::fasta::read_reference;
use crate::table::write_mutation_table;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub reference: PathBuf,
    pub input_dir: PathBuf,
    pub output: PathBuf,
    pub trim: usize,
    pub min_length: usize,
    pub scoring: ScoringConfig,
    pub ab1_pattern: Regex,
}

/// Why a read contributed no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unreadable(String),
    EmptyAfterTrim,
    ShortAlignment(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Aligned { mutations: usize },
    Skipped(SkipReason),
}

/// Sample name: the file name up to its first dot.
pub fn sample_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.split('.').next().unwrap_or("");
    stem.to_string()
}

/// AB1 files in `dir`, sorted by path.
pub fn list_ab1_files(dir: &Path, pattern: &Regex) -> Result<Vec<PathBuf>, MutscanError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        if path.is_file() && pattern.is_match(&name.to_string_lossy()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Aligns one read and appends its codon changes to `records`.
pub fn scan_read(
    path: &Path,
    reference: &[u8],
    aligner: &mut ReadAligner,
    opts: &ScanOptions,
    records: &mut Vec<MutationRecord>,
) -> ReadOutcome {
    let sample = sample_name(path);
    let abif = match read_abif_file(path) {
        Ok(abif) => abif,
        Err(e) => return ReadOutcome::Skipped(SkipReason::Unreadable(e.to_string())),
    };
    if let Some(q) = abif.mean_quality() {
        debug!("{}: {} bases, mean quality {:.1}", sample, abif.sequence.len(), q);
    }
    let read = abif.sequence.as_bytes();
    let Some(trimmed) = read.get(opts.trim..).filter(|r| !r.is_empty()) else {
        return ReadOutcome::Skipped(SkipReason::EmptyAfterTrim);
    };

    let aligned = aligner.align(trimmed, reference);
    let aligned_len = aligned.aligned_len();
    if aligned_len < opts.min_length {
        return ReadOutcome::Skipped(SkipReason::ShortAlignment(aligned_len));
    }
    let substitutions = aligned.substitutions(reference);
    let changes = analyze_codon_changes(&substitutions, reference);
    info!(
        "{}: {} orientation, score {}, {} substitutions in {} codons",
        sample,
        aligned.orientation,
        aligned.score(),
        substitutions.len(),
        changes.len()
    );
    let mutations = changes.len();
    records.extend(
        changes
            .into_iter()
            .map(|c| MutationRecord::from_codon_change(&sample, aligned.orientation, c)),
    );
    ReadOutcome::Aligned { mutations }
}

/// Scans every read and returns the sorted mutation rows.
pub fn scan_directory(opts: &ScanOptions) -> Result<Vec<MutationRecord>, MutscanError> {
    let reference = read_reference(&opts.reference)?;
    let files = list_ab1_files(&opts.input_dir, &opts.ab1_pattern)?;
    if files.is_empty() {
        return Err(MutscanError::Format(format!(
            "No AB1 files found in {}",
            opts.input_dir.display()
        )));
    }

    let mut aligner = ReadAligner::new(&opts.scoring);
    let mut records = Vec::new();
    for path in &files {
        println!("Processing {}...", sample_name(path));
        stdout().flush().ok();
        match scan_read(
            path,
            reference.sequence.as_bytes(),
            &mut aligner,
            opts,
            &mut records,
        ) {
            ReadOutcome::Aligned { .. } => {}
            ReadOutcome::Skipped(SkipReason::Unreadable(e)) => {
                eprintln!("Error parsing {}: {}", path.display(), e);
            }
            ReadOutcome::Skipped(SkipReason::EmptyAfterTrim) => {
                eprintln!(
                    "Skipping {}: no bases left after trimming {}",
                    path.display(),
                    opts.trim
                );
            }
            ReadOutcome::Skipped(SkipReason::ShortAlignment(len)) => {
                eprintln!(
                    "Skipping {}: only {} bases aligned (minimum {})",
                    path.display(),
                    len,
                    opts.min_length
                );
            }
        }
    }
    sort_records(&mut records);
    Ok(records)
}

/// Runs the whole stage and writes the table. The table is written even when empty, so the report
/// stage always has an input.
pub fn run_scan(opts: &ScanOptions) -> Result<Vec<MutationRecord>, MutscanError> {
    let records = scan_directory(opts)?;
    write_mutation_table(&opts.output, &records)?;
    if records.is_empty() {
        println!("No mutations found.");
    } else {
        println!("Results exported to {}", opts.output.display());
    }
    Ok(records)
}
