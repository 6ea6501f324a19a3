// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::fmt;

use bio::alignment::pairwise::{Aligner, MatchParams};
use bio::alignment::{Alignment, AlignmentOperation};
use bio::alphabets::dna;
use log::debug;
use serde::{Deserialize, Serialize};

/// Pairwise scores. These are the "medium stringency" settings (match 2, mismatch -1, gap open
/// -2, gap extend -0.5) doubled so they fit integer scoring; a gap of length n costs
/// `gap_open + n * gap_extend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    #[serde(rename = "match")]
    pub match_score: i32,
    #[serde(rename = "mismatch")]
    pub mismatch_score: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            match_score: 4,
            mismatch_score: -2,
            gap_open: -3,
            gap_extend: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::Forward => "forward",
            Orientation::Reverse => "reverse",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Orientation::Forward),
            "reverse" => Ok(Orientation::Reverse),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}

/// A base that differs between read and reference at an aligned (non-gap) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Substitution {
    /// 1-based position in the reference.
    pub ref_pos: usize,
    pub ref_base: u8,
    pub seq_base: u8,
}

#[derive(Debug, Clone)]
pub struct AlignedRead {
    pub orientation: Orientation,
    /// The read as aligned, i.e. reverse-complemented if `orientation` is `Reverse`.
    pub read: Vec<u8>,
    pub alignment: Alignment,
}

impl AlignedRead {
    pub fn score(&self) -> i32 {
        self.alignment.score
    }

    /// Number of read bases paired with a reference base.
    pub fn aligned_len(&self) -> usize {
        self.alignment
            .operations
            .iter()
            .filter(|op| matches!(op, AlignmentOperation::Match | AlignmentOperation::Subst))
            .count()
    }

    pub fn substitutions(&self, reference: &[u8]) -> Vec<Substitution> {
        find_substitutions(&self.alignment, &self.read, reference)
    }
}

/// Global aligner for reads against a single reference.
pub struct ReadAligner {
    aligner: Aligner<MatchParams>,
}

impl ReadAligner {
    pub fn new(scoring: &ScoringConfig) -> Self {
        let match_params = MatchParams::new(scoring.match_score, scoring.mismatch_score);
        ReadAligner {
            aligner: Aligner::new(scoring.gap_open, scoring.gap_extend, match_params),
        }
    }

    /// Aligns `read` and its reverse complement to `reference`, keeping the reverse complement
    /// only if it scores strictly better.
    pub fn align(&mut self, read: &[u8], reference: &[u8]) -> AlignedRead {
        let forward = self.aligner.global(read, reference);
        let revcomp = dna::revcomp(read);
        let reverse = self.aligner.global(&revcomp, reference);
        debug!(
            "orientation scores: forward {}, reverse {}",
            forward.score, reverse.score
        );
        if reverse.score > forward.score {
            AlignedRead {
                orientation: Orientation::Reverse,
                read: revcomp,
                alignment: reverse,
            }
        } else {
            AlignedRead {
                orientation: Orientation::Forward,
                read: read.to_vec(),
                alignment: forward,
            }
        }
    }
}

/// Walks the alignment of `x` (read) against `y` (reference) and collects mismatches. Gapped
/// columns are not substitutions.
pub fn find_substitutions(alignment: &Alignment, x: &[u8], y: &[u8]) -> Vec<Substitution> {
    let mut x_i = alignment.xstart;
    let mut y_i = alignment.ystart;
    let mut result = Vec::new();
    for op in &alignment.operations {
        match *op {
            AlignmentOperation::Match | AlignmentOperation::Subst => {
                let (seq_base, ref_base) = (x[x_i], y[y_i]);
                if !seq_base.eq_ignore_ascii_case(&ref_base) {
                    result.push(Substitution {
                        ref_pos: y_i + 1,
                        ref_base: ref_base.to_ascii_uppercase(),
                        seq_base: seq_base.to_ascii_uppercase(),
                    });
                }
                x_i += 1;
                y_i += 1;
            }
            AlignmentOperation::Del => y_i += 1,
            AlignmentOperation::Ins => x_i += 1,
            AlignmentOperation::Xclip(n) => x_i += n,
            AlignmentOperation::Yclip(n) => y_i += n,
        }
    }
    result
}
