// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{fs, path::Path};

// 40 codons, ending in a stop.
pub const REFERENCE: &str = concat!(
    "ATGGCTAAAGATTTCGGCCTGCACTGGAGC",
    "ATCCGTACCGAGAACGTTCAGTATGCCAAA",
    "CCGGTATCTCATGGTACGTTGCCAGACATT",
    "ACTGGATACAGGCTCGAATTTCAAGCGTGA",
);

// Stands in for the noisy start of a trace; dropped by the default trim of 50.
pub const JUNK: &str = "NNACGTTGCANNGTCAGTCANNTTGACCAGTNNCAGTGACTGNNAGTCAG";

pub fn write_reference(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("reference.fasta");
    fs::write(&path, format!(">synthetic_orf\n{}\n{}\n", &REFERENCE[..60], &REFERENCE[60..]))
        .expect("write reference");
    path
}

/// `REFERENCE` with 1-based `(position, base)` substitutions applied.
pub fn mutate(subs: &[(usize, u8)]) -> String {
    let mut seq = REFERENCE.as_bytes().to_vec();
    for &(pos, base) in subs {
        seq[pos - 1] = base;
    }
    String::from_utf8(seq).expect("ascii")
}

pub fn revcomp(seq: &str) -> String {
    seq.bytes()
        .rev()
        .map(|b| match b {
            b'A' => 'T',
            b'C' => 'G',
            b'G' => 'C',
            b'T' => 'A',
            _ => 'N',
        })
        .collect()
}

/// Minimal ABIF image with base calls (PBAS2), qualities (PCON2) and a sample name (SMPL1).
pub fn abif_bytes(sample: &str, bases: &str) -> Vec<u8> {
    let mut smpl = vec![sample.len() as u8];
    smpl.extend_from_slice(sample.as_bytes());
    let tags: Vec<(&[u8; 4], i32, i16, Vec<u8>)> = vec![
        (b"SMPL", 1, 18, smpl),
        (b"PBAS", 2, 2, bases.as_bytes().to_vec()),
        (b"PCON", 2, 2, vec![35; bases.len()]),
    ];

    let data_start = 6 + 28;
    let mut payload = Vec::new();
    let mut dir = Vec::new();
    for (name, number, etype, data) in &tags {
        dir.extend_from_slice(&name[..]);
        dir.extend_from_slice(&number.to_be_bytes());
        dir.extend_from_slice(&etype.to_be_bytes());
        dir.extend_from_slice(&1i16.to_be_bytes());
        dir.extend_from_slice(&(data.len() as i32).to_be_bytes());
        dir.extend_from_slice(&(data.len() as i32).to_be_bytes());
        if data.len() <= 4 {
            let mut inline = data.clone();
            inline.resize(4, 0);
            dir.extend_from_slice(&inline);
        } else {
            dir.extend_from_slice(&((data_start + payload.len()) as i32).to_be_bytes());
            payload.extend_from_slice(data);
        }
        dir.extend_from_slice(&0i32.to_be_bytes());
    }

    let mut buf = Vec::new();
    buf.extend_from_slice(b"ABIF");
    buf.extend_from_slice(&101u16.to_be_bytes());
    buf.extend_from_slice(b"tdir");
    buf.extend_from_slice(&1i32.to_be_bytes());
    buf.extend_from_slice(&1023i16.to_be_bytes());
    buf.extend_from_slice(&28i16.to_be_bytes());
    buf.extend_from_slice(&(tags.len() as i32).to_be_bytes());
    buf.extend_from_slice(&(dir.len() as i32).to_be_bytes());
    buf.extend_from_slice(&((data_start + payload.len()) as i32).to_be_bytes());
    buf.extend_from_slice(&0i32.to_be_bytes());
    buf.extend_from_slice(&payload);
    buf.extend_from_slice(&dir);
    buf
}

pub fn write_ab1(dir: &Path, file_name: &str, bases: &str) {
    let sample = file_name.split('.').next().unwrap_or(file_name);
    fs::write(dir.join(file_name), abif_bytes(sample, bases)).expect("write ab1");
}

/// A directory of reads:
/// - clone01: forward, AAA->AAG at codon 3 (silent) and TTC->CTC at codon 5 (missense)
/// - clone02: reverse complement, AGC->AGA at codon 10 (missense)
/// - clone03: wild type
/// - short: too few bases left after trimming to pass the length filter
/// - broken: not an ABIF file
/// - bad_dir: an ABIF header claiming far more directory entries than the file holds
pub fn write_reads(dir: &Path) {
    fs::create_dir_all(dir).expect("mkdir");
    let clone01 = mutate(&[(9, b'G'), (13, b'C')]);
    write_ab1(dir, "clone01.F.ab1", &format!("{}{}", JUNK, clone01));
    let clone02 = revcomp(&mutate(&[(30, b'A')]));
    write_ab1(dir, "clone02.R.ab1", &format!("{}{}", JUNK, clone02));
    write_ab1(dir, "clone03.ab1", &format!("{}{}", JUNK, REFERENCE));
    write_ab1(dir, "short.ab1", &format!("{}{}", JUNK, &REFERENCE[..30]));
    fs::write(dir.join("broken.ab1"), b"not a trace").expect("write");
    let mut bad_dir = abif_bytes("bad_dir", REFERENCE);
    bad_dir[18..22].copy_from_slice(&i32::MAX.to_be_bytes());
    fs::write(dir.join("bad_dir.ab1"), bad_dir).expect("write");
    fs::write(dir.join("README.txt"), b"run 42").expect("write");
}
