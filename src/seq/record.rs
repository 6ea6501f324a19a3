// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

// A FastA record: the header line (without '>') and the concatenated sequence lines.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub header: String,
    pub sequence: String,
}

/// All records of one FASTA file, in file order.
pub type SeqFile = Vec<SeqRecord>;
