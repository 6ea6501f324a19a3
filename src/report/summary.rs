// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;

use crate::mutation::{MutationRecord, MutationType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryStats {
    pub sample_count: usize,
    pub total: usize,
    pub silent: usize,
    pub missense: usize,
    /// (sample, rows), sorted by sample.
    pub per_sample: Vec<(String, usize)>,
}

pub fn summary_stats(records: &[MutationRecord]) -> SummaryStats {
    let mut per_sample: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in records {
        *per_sample.entry(rec.sample.as_str()).or_default() += 1;
    }
    let silent = records.iter().filter(|r| r.is_silent).count();
    SummaryStats {
        sample_count: per_sample.len(),
        total: records.len(),
        silent,
        missense: records.len() - silent,
        per_sample: per_sample
            .into_iter()
            .map(|(s, n)| (s.to_string(), n))
            .collect(),
    }
}

/// Counts per mutation type, most frequent first (ties in type order).
pub fn type_counts(records: &[MutationRecord]) -> Vec<(MutationType, usize)> {
    records
        .iter()
        .map(|r| r.mutation_type)
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
        .collect()
}

/// Rows per sample, most mutated first (ties by sample name).
pub fn sample_counts_desc(records: &[MutationRecord]) -> Vec<(String, usize)> {
    let mut counts = summary_stats(records).per_sample;
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts
}

/// Rows per nucleotide position, by position.
pub fn position_counts(records: &[MutationRecord]) -> Vec<(usize, usize)> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for rec in records {
        *counts.entry(rec.nucleotide_position).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// One distinct codon change and the samples carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodonGroup {
    pub position: usize,
    pub original_codon: String,
    pub mutated_codon: String,
    pub count: usize,
    pub aa_position: usize,
    pub original_aa: String,
    pub mutated_aa: String,
    pub silent: bool,
    /// Distinct samples, sorted, joined by ", ".
    pub samples: String,
}

type MutationKey<'a> = (usize, &'a str, &'a str);

fn key(rec: &MutationRecord) -> MutationKey<'_> {
    (
        rec.nucleotide_position,
        rec.original_codon.as_str(),
        rec.mutated_codon.as_str(),
    )
}

pub fn codon_groups(records: &[MutationRecord]) -> Vec<CodonGroup> {
    // Amino acids, silence and residue number come from the first row of each group.
    let mut groups: BTreeMap<MutationKey, (&MutationRecord, usize, BTreeSet<&str>)> =
        BTreeMap::new();
    for rec in records {
        let entry = groups
            .entry(key(rec))
            .or_insert_with(|| (rec, 0, BTreeSet::new()));
        entry.1 += 1;
        entry.2.insert(rec.sample.as_str());
    }

    let mut result: Vec<CodonGroup> = groups
        .into_iter()
        .map(|((position, orig, mutated), (first, count, samples))| CodonGroup {
            position,
            original_codon: orig.to_string(),
            mutated_codon: mutated.to_string(),
            count,
            aa_position: first.aa_position,
            original_aa: first.original_aa.clone(),
            mutated_aa: first.mutated_aa.clone(),
            silent: first.is_silent,
            samples: samples.into_iter().join(", "),
        })
        .collect();
    // Keys already sort codons within a position; the stable sort keeps that.
    result.sort_by(|a, b| a.position.cmp(&b.position).then(b.count.cmp(&a.count)));
    result
}

/// Samples that share exactly the same set of codon changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// Named after its first sample.
    pub name: String,
    pub frequency: usize,
    pub mutation_count: usize,
    /// "POS: ORIG->MUT (AA->AA)" entries by position, joined by "; ".
    pub mutations: String,
    /// Sorted, joined by ", ".
    pub samples: String,
}

pub fn variants(records: &[MutationRecord]) -> Vec<Variant> {
    // First row for each distinct change, for its amino acids.
    let mut first_row: HashMap<MutationKey, &MutationRecord> = HashMap::new();
    for rec in records {
        first_row.entry(key(rec)).or_insert(rec);
    }

    let mut signatures: BTreeMap<&str, BTreeSet<MutationKey>> = BTreeMap::new();
    for rec in records {
        signatures
            .entry(rec.sample.as_str())
            .or_default()
            .insert(key(rec));
    }

    // Samples come out of the map sorted, so groups are in order of their first sample.
    let mut groups: Vec<(BTreeSet<MutationKey>, Vec<&str>)> = Vec::new();
    for (sample, signature) in signatures {
        match groups.iter_mut().find(|(sig, _)| *sig == signature) {
            Some((_, samples)) => samples.push(sample),
            None => groups.push((signature, vec![sample])),
        }
    }

    let mut result: Vec<Variant> = groups
        .into_iter()
        .map(|(signature, samples)| {
            let mutations = signature
                .iter()
                .map(|k| {
                    let (pos, orig, mutated) = *k;
                    match first_row.get(k) {
                        Some(rec) => format!(
                            "{}: {}->{} ({}->{})",
                            pos, orig, mutated, rec.original_aa, rec.mutated_aa
                        ),
                        None => format!("{}: {}->{}", pos, orig, mutated),
                    }
                })
                .join("; ");
            Variant {
                name: samples[0].to_string(),
                frequency: samples.len(),
                mutation_count: signature.len(),
                mutations,
                samples: samples.iter().sorted().join(", "),
            }
        })
        .collect();
    result.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    result
}
