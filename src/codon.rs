// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::collections::BTreeMap;

use crate::align::Substitution;
use crate::mutation::MutationType;

const BASES: &[u8; 4] = b"TCAG";

// Standard genetic code (NCBI table 1), codons enumerated in TCAG order for each position.
// Stop codons (TAA, TAG, TGA) encode no residue and read as X, the same as unknown codons.
const AMINO_ACIDS: &[u8; 64] =
    b"FFLLSSSSYYXXCCXWLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

fn base_index(b: u8) -> Option<usize> {
    BASES.iter().position(|&x| x == b.to_ascii_uppercase())
}

/// Translates one codon with the standard code. Stops and codons with anything other than A, C, G
/// or T are `X`.
pub fn translate_codon(codon: &[u8]) -> char {
    if codon.len() != 3 {
        return 'X';
    }
    match (
        base_index(codon[0]),
        base_index(codon[1]),
        base_index(codon[2]),
    ) {
        (Some(i), Some(j), Some(k)) => AMINO_ACIDS[16 * i + 4 * j + k] as char,
        _ => 'X',
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodonChange {
    /// 1-based codon number, which is also the residue number.
    pub codon_position: usize,
    /// 1-based reference position of the codon's first base.
    pub nucleotide_position: usize,
    pub original_codon: String,
    pub mutated_codon: String,
    pub original_aa: char,
    pub mutated_aa: char,
    pub is_silent: bool,
    pub mutation_type: MutationType,
}

/// Groups substitutions by the codon they fall into and classifies the net effect of each group.
/// Codons running past the end of the reference are skipped.
pub fn analyze_codon_changes(subs: &[Substitution], reference: &[u8]) -> Vec<CodonChange> {
    let mut by_codon: BTreeMap<usize, Vec<&Substitution>> = BTreeMap::new();
    for sub in subs {
        by_codon.entry((sub.ref_pos - 1) / 3).or_default().push(sub);
    }

    let mut result = Vec::with_capacity(by_codon.len());
    for (codon_idx, group) in by_codon {
        let start = codon_idx * 3;
        let Some(orig) = reference.get(start..start + 3) else {
            continue;
        };
        let mut mutated = orig.to_vec();
        for sub in group {
            mutated[(sub.ref_pos - 1) % 3] = sub.seq_base;
        }
        let original_aa = translate_codon(orig);
        let mutated_aa = translate_codon(&mutated);
        let is_silent = original_aa == mutated_aa;
        result.push(CodonChange {
            codon_position: codon_idx + 1,
            nucleotide_position: start + 1,
            original_codon: String::from_utf8_lossy(orig).into_owned(),
            mutated_codon: String::from_utf8_lossy(&mutated).into_owned(),
            original_aa,
            mutated_aa,
            is_silent,
            mutation_type: MutationType::from_silent(is_silent),
        });
    }
    result
}
