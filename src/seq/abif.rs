// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

//! Reader for ABIF (`.ab1`) files as written by capillary sequencers.
//!
//! An ABIF file starts with the magic `ABIF` and a version number, followed by a 28-byte
//! directory entry that points to the tag directory. Every tag is itself a 28-byte big-endian
//! entry; payloads of four bytes or less live in the entry's offset field.

use std::{fs, path::Path};

use log::debug;

use crate::errors::MutscanError;

const MAGIC: &[u8; 4] = b"ABIF";
const ROOT_ENTRY_OFFSET: usize = 6;
const DIR_ENTRY_LEN: usize = 28;

#[derive(Debug, Clone)]
pub struct AbifEntry {
    pub name: [u8; 4],
    pub number: i32,
    pub element_type: i16,
    pub element_size: i16,
    pub num_elements: i32,
    pub data_size: i32,
    pub data_offset: i32,
    // Absolute position of this entry in the file; needed for inline data.
    entry_pos: usize,
}

impl AbifEntry {
    fn parse(buf: &[u8], pos: usize) -> Result<Self, MutscanError> {
        let raw = slice(buf, pos, DIR_ENTRY_LEN)?;
        Ok(AbifEntry {
            name: [raw[0], raw[1], raw[2], raw[3]],
            number: i32::from_be_bytes([raw[4], raw[5], raw[6], raw[7]]),
            element_type: i16::from_be_bytes([raw[8], raw[9]]),
            element_size: i16::from_be_bytes([raw[10], raw[11]]),
            num_elements: i32::from_be_bytes([raw[12], raw[13], raw[14], raw[15]]),
            data_size: i32::from_be_bytes([raw[16], raw[17], raw[18], raw[19]]),
            data_offset: i32::from_be_bytes([raw[20], raw[21], raw[22], raw[23]]),
            entry_pos: pos,
        })
    }

    pub fn tag(&self) -> String {
        format!("{}{}", String::from_utf8_lossy(&self.name), self.number)
    }

    /// Raw payload of this entry.
    pub fn data<'a>(&self, buf: &'a [u8]) -> Result<&'a [u8], MutscanError> {
        let size = usize::try_from(self.data_size)
            .map_err(|_| MutscanError::Format(format!("negative data size in {}", self.tag())))?;
        if size <= 4 {
            // Offset field sits 20 bytes into the entry.
            let inline = slice(buf, self.entry_pos + 20, 4)?;
            Ok(&inline[..size])
        } else {
            let offset = usize::try_from(self.data_offset).map_err(|_| {
                MutscanError::Format(format!("negative data offset in {}", self.tag()))
            })?;
            slice(buf, offset, size)
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbifFile {
    pub version: u16,
    pub entries: Vec<AbifEntry>,
    buf: Vec<u8>,
}

impl AbifFile {
    pub fn from_bytes(buf: Vec<u8>) -> Result<Self, MutscanError> {
        if buf.len() < ROOT_ENTRY_OFFSET + DIR_ENTRY_LEN {
            return Err(MutscanError::Format(format!(
                "ABIF file too short ({} bytes)",
                buf.len()
            )));
        }
        if &buf[..4] != MAGIC {
            return Err(MutscanError::Format(String::from(
                "not an ABIF file (missing 'ABIF' magic)",
            )));
        }
        let version = u16::from_be_bytes([buf[4], buf[5]]);
        let root = AbifEntry::parse(&buf, ROOT_ENTRY_OFFSET)?;
        let num_entries = usize::try_from(root.num_elements)
            .map_err(|_| MutscanError::Format(String::from("negative directory size")))?;
        let dir_offset = usize::try_from(root.data_offset)
            .map_err(|_| MutscanError::Format(String::from("negative directory offset")))?;

        num_entries
            .checked_mul(DIR_ENTRY_LEN)
            .and_then(|len| dir_offset.checked_add(len))
            .filter(|&end| end <= buf.len())
            .ok_or_else(|| {
                MutscanError::Format(format!(
                    "ABIF file truncated: directory of {} entries at offset {} does not fit in {} bytes",
                    num_entries,
                    dir_offset,
                    buf.len()
                ))
            })?;

        let mut entries = Vec::with_capacity(num_entries);
        for i in 0..num_entries {
            entries.push(AbifEntry::parse(&buf, dir_offset + i * DIR_ENTRY_LEN)?);
        }
        debug!("ABIF v{}: {} directory entries", version, entries.len());
        Ok(AbifFile {
            version,
            entries,
            buf,
        })
    }

    pub fn entry(&self, name: &[u8; 4], number: i32) -> Option<&AbifEntry> {
        self.entries
            .iter()
            .find(|e| &e.name == name && e.number == number)
    }

    pub fn data(&self, name: &[u8; 4], number: i32) -> Result<Option<&[u8]>, MutscanError> {
        match self.entry(name, number) {
            Some(entry) => entry.data(&self.buf).map(Some),
            None => Ok(None),
        }
    }

    // Pascal string: one length byte, then the characters.
    fn pstring(&self, name: &[u8; 4], number: i32) -> Result<Option<String>, MutscanError> {
        let Some(data) = self.data(name, number)? else {
            return Ok(None);
        };
        let Some((&len, rest)) = data.split_first() else {
            return Ok(None);
        };
        let len = usize::from(len).min(rest.len());
        Ok(Some(String::from_utf8_lossy(&rest[..len]).into_owned()))
    }
}

/// Base calls, qualities and sample name of one sequencing read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbifRecord {
    pub sample_name: Option<String>,
    pub sequence: String,
    pub qualities: Vec<u8>,
}

impl AbifRecord {
    pub fn mean_quality(&self) -> Option<f64> {
        if self.qualities.is_empty() {
            return None;
        }
        let total: u64 = self.qualities.iter().map(|&q| u64::from(q)).sum();
        Some(total as f64 / self.qualities.len() as f64)
    }
}

pub fn parse_abif(buf: Vec<u8>) -> Result<AbifRecord, MutscanError> {
    let abif = AbifFile::from_bytes(buf)?;
    // PBAS2/PCON2 hold the (possibly edited) calls the instrument software settled on; PBAS1 and
    // PCON1 are the originals.
    let bases = match abif.data(b"PBAS", 2)? {
        Some(data) => data,
        None => abif.data(b"PBAS", 1)?.ok_or_else(|| {
            MutscanError::Format(String::from("no base calls (PBAS) in ABIF file"))
        })?,
    };
    let qualities = match abif.data(b"PCON", 2)? {
        Some(data) => data.to_vec(),
        None => abif.data(b"PCON", 1)?.map(<[u8]>::to_vec).unwrap_or_default(),
    };
    let sequence = String::from_utf8_lossy(bases).to_ascii_uppercase();
    Ok(AbifRecord {
        sample_name: abif.pstring(b"SMPL", 1)?,
        sequence,
        qualities,
    })
}

pub fn read_abif_file<P: AsRef<Path>>(path: P) -> Result<AbifRecord, MutscanError> {
    let buf = fs::read(path)?;
    parse_abif(buf)
}

fn slice(buf: &[u8], start: usize, len: usize) -> Result<&[u8], MutscanError> {
    start
        .checked_add(len)
        .and_then(|end| buf.get(start..end))
        .ok_or_else(|| {
            MutscanError::Format(format!(
                "ABIF file truncated: need bytes {}..{}, have {}",
                start,
                start.saturating_add(len),
                buf.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lays out a minimal ABIF file: header, root entry, payloads, then the directory.
    fn build_abif(tags: &[(&[u8; 4], i32, i16, Vec<u8>)]) -> Vec<u8> {
        let mut payload = Vec::new();
        let data_start = ROOT_ENTRY_OFFSET + DIR_ENTRY_LEN;
        let mut dir = Vec::new();
        for (name, number, etype, data) in tags {
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
        let dir_offset = data_start + payload.len();

        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&101u16.to_be_bytes());
        buf.extend_from_slice(b"tdir");
        buf.extend_from_slice(&1i32.to_be_bytes());
        buf.extend_from_slice(&1023i16.to_be_bytes());
        buf.extend_from_slice(&28i16.to_be_bytes());
        buf.extend_from_slice(&(tags.len() as i32).to_be_bytes());
        buf.extend_from_slice(&((tags.len() * DIR_ENTRY_LEN) as i32).to_be_bytes());
        buf.extend_from_slice(&(dir_offset as i32).to_be_bytes());
        buf.extend_from_slice(&0i32.to_be_bytes());
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&dir);
        buf
    }

    #[test]
    fn test_parse_basecalls_and_qualities() {
        let mut smpl = vec![5u8];
        smpl.extend_from_slice(b"clone");
        let buf = build_abif(&[
            (b"SMPL", 1, 18, smpl),
            (b"PBAS", 2, 2, b"acgtacgtNN".to_vec()),
            (b"PCON", 2, 2, vec![40, 40, 30, 30, 20, 20, 10, 10, 2, 2]),
        ]);
        let rec = parse_abif(buf).expect("parse");
        assert_eq!(rec.sequence, "ACGTACGTNN");
        assert_eq!(rec.qualities.len(), 10);
        assert_eq!(rec.sample_name.as_deref(), Some("clone"));
        assert_eq!(rec.mean_quality(), Some(20.4));
    }

    #[test]
    fn test_short_payload_is_inline() {
        let buf = build_abif(&[(b"PBAS", 2, 2, b"ACG".to_vec())]);
        let rec = parse_abif(buf).expect("parse");
        assert_eq!(rec.sequence, "ACG");
        assert!(rec.qualities.is_empty());
        assert_eq!(rec.sample_name, None);
        assert_eq!(rec.mean_quality(), None);
    }

    #[test]
    fn test_falls_back_to_pbas1() {
        let buf = build_abif(&[
            (b"PBAS", 1, 2, b"GATTACA".to_vec()),
            (b"PCON", 1, 2, vec![30; 7]),
        ]);
        let rec = parse_abif(buf).expect("parse");
        assert_eq!(rec.sequence, "GATTACA");
        assert_eq!(rec.qualities, vec![30; 7]);
    }

    #[test]
    fn test_pbas2_wins_over_pbas1() {
        let buf = build_abif(&[
            (b"PBAS", 1, 2, b"AAAAAAA".to_vec()),
            (b"PBAS", 2, 2, b"CCCCCCC".to_vec()),
        ]);
        assert_eq!(parse_abif(buf).expect("parse").sequence, "CCCCCCC");
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut buf = build_abif(&[(b"PBAS", 2, 2, b"ACGTACGT".to_vec())]);
        buf[0] = b'X';
        let err = parse_abif(buf).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let mut buf = build_abif(&[(b"PBAS", 2, 2, b"ACGTACGTACGT".to_vec())]);
        buf.truncate(buf.len() - 10);
        let err = parse_abif(buf).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_rejects_oversized_directory() {
        let mut buf = build_abif(&[(b"PBAS", 2, 2, b"ACGTACGT".to_vec())]);
        // Root entry element count, 12 bytes into the root entry.
        let count = ROOT_ENTRY_OFFSET + 12;
        buf[count..count + 4].copy_from_slice(&i32::MAX.to_be_bytes());
        let err = parse_abif(buf).unwrap_err();
        assert!(err.to_string().contains("truncated"));

        let mut header = Vec::new();
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&101u16.to_be_bytes());
        header.extend_from_slice(b"tdir");
        header.extend_from_slice(&1i32.to_be_bytes());
        header.extend_from_slice(&1023i16.to_be_bytes());
        header.extend_from_slice(&28i16.to_be_bytes());
        header.extend_from_slice(&i32::MAX.to_be_bytes());
        header.extend_from_slice(&0i32.to_be_bytes());
        header.extend_from_slice(&(i32::MAX - 1).to_be_bytes());
        header.extend_from_slice(&0i32.to_be_bytes());
        assert!(parse_abif(header).is_err());
    }

    #[test]
    fn test_missing_basecalls() {
        let buf = build_abif(&[(b"PCON", 2, 2, vec![30; 8])]);
        let err = parse_abif(buf).unwrap_err();
        assert!(err.to_string().contains("PBAS"));
    }

    #[test]
    fn test_tag_name() {
        let buf = build_abif(&[(b"PBAS", 2, 2, b"ACGTACGT".to_vec())]);
        let abif = AbifFile::from_bytes(buf).expect("parse");
        assert_eq!(abif.version, 101);
        assert_eq!(abif.entries[0].tag(), "PBAS2");
        assert!(abif.entry(b"PBAS", 1).is_none());
    }
}
