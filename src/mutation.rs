// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{fmt, str::FromStr};

use crate::align::Orientation;
use crate::codon::CodonChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MutationType {
    Silent,
    Missense,
}

impl MutationType {
    pub fn from_silent(is_silent: bool) -> Self {
        if is_silent {
            MutationType::Silent
        } else {
            MutationType::Missense
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MutationType::Silent => "Silent",
            MutationType::Missense => "Missense",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MutationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Silent" => Ok(MutationType::Silent),
            "Missense" => Ok(MutationType::Missense),
            other => Err(format!("unknown mutation type '{}'", other)),
        }
    }
}

/// One row of the mutation table: a codon change observed in one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub sample: String,
    pub orientation: Orientation,
    pub nucleotide_position: usize,
    pub original_codon: String,
    pub mutated_codon: String,
    pub aa_position: usize,
    pub original_aa: String,
    pub mutated_aa: String,
    pub is_silent: bool,
    pub mutation_type: MutationType,
}

impl MutationRecord {
    pub fn from_codon_change(sample: &str, orientation: Orientation, change: CodonChange) -> Self {
        MutationRecord {
            sample: sample.to_string(),
            orientation,
            nucleotide_position: change.nucleotide_position,
            original_codon: change.original_codon,
            mutated_codon: change.mutated_codon,
            aa_position: change.codon_position,
            original_aa: change.original_aa.to_string(),
            mutated_aa: change.mutated_aa.to_string(),
            is_silent: change.is_silent,
            mutation_type: change.mutation_type,
        }
    }
}

/// Sorts rows by sample, then position. The sort is stable.
pub fn sort_records(records: &mut [MutationRecord]) {
    records.sort_by(|a, b| {
        a.sample
            .cmp(&b.sample)
            .then(a.nucleotide_position.cmp(&b.nucleotide_position))
    });
}
