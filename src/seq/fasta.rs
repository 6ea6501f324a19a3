// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;

use crate::errors::MutscanError;
use crate::seq::record::{SeqFile, SeqRecord};

pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<SeqFile, std::io::Error> {
    let file = File::open(path)?;
    let mut result: SeqFile = Vec::new();
    let mut current_record: Option<SeqRecord> = None;

    for line in BufReader::new(file).lines() {
        let l: String = line?;
        let l = l.trim();
        if let Some(hdr) = l.strip_prefix('>') {
            if let Some(record) = current_record.take() {
                result.push(record);
            }
            current_record = Some(SeqRecord {
                header: hdr.to_string(),
                sequence: String::new(),
            });
        } else if !l.is_empty() {
            // Sequence lines before the first header are kept under an empty header.
            current_record
                .get_or_insert_with(|| SeqRecord {
                    header: String::new(),
                    sequence: String::new(),
                })
                .sequence
                .push_str(l);
        }
    }
    if let Some(record) = current_record {
        result.push(record);
    }
    Ok(result)
}

/// Reads a reference sequence. The file must hold exactly one record; its sequence is returned
/// upper-cased.
pub fn read_reference<P: AsRef<Path>>(path: P) -> Result<SeqRecord, MutscanError> {
    let path = path.as_ref();
    let mut records = read_fasta_file(path)?;
    match records.len() {
        0 => {
            return Err(MutscanError::Format(format!(
                "no sequence found in {}",
                path.display()
            )))
        }
        1 => {}
        n => {
            return Err(MutscanError::Format(format!(
                "expected one reference sequence in {}, found {}",
                path.display(),
                n
            )))
        }
    }
    let mut record = records.remove(0);
    if record.sequence.is_empty() {
        return Err(MutscanError::Format(format!(
            "reference sequence in {} is empty",
            path.display()
        )));
    }
    record.sequence.make_ascii_uppercase();
    debug!(
        "reference '{}': {} nt",
        record.header,
        record.sequence.len()
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fasta_file_1() {
        let path = "tests/data/reference.fasta";
        let fasta: SeqFile = read_fasta_file(path).expect("Test file not found");
        assert_eq!(fasta.len(), 1);
        assert_eq!(fasta[0].header, "test_orf synthetic 60 nt reading frame");
        assert_eq!(
            fasta[0].sequence,
            "ATGAAAGATTTCGGCCTGCACTGGAGCATCCGTACCGAGAACGTTCAGTATGCCAAATGA"
        );
    }

    #[test]
    fn test_read_fasta_file_2() {
        let path = "tests/data/two_records.fas";
        let fasta: SeqFile = read_fasta_file(path).expect("Test file not found");
        assert_eq!(fasta.len(), 2);
        assert_eq!(fasta[0].header, "seq1");
        assert_eq!(fasta[0].sequence, "TTGCCGCGA");
        assert_eq!(fasta[1].header, "seq2");
        assert_eq!(fasta[1].sequence, "ttcccggcga");
    }

    #[test]
    fn test_read_reference_uppercases() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ref.fa");
        std::fs::write(&path, ">r\nacgt\n\nACGT\n").expect("write");
        let reference = read_reference(&path).expect("reference");
        assert_eq!(reference.sequence, "ACGTACGT");
    }

    #[test]
    fn test_read_reference_rejects_several_records() {
        let err = read_reference("tests/data/two_records.fas").unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_read_reference_rejects_empty_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.fa");
        std::fs::write(&path, "").expect("write");
        assert!(matches!(
            read_reference(&path),
            Err(MutscanError::Format(_))
        ));
    }

    #[test]
    fn test_read_reference_missing_file() {
        assert!(matches!(
            read_reference("tests/data/no-such-file.fa"),
            Err(MutscanError::Io(_))
        ));
    }
}
