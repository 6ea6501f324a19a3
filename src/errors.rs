// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{error, fmt, io};

#[derive(Debug)]
pub enum MutscanError {
    Io(io::Error),
    Format(String),
    Xlsx(rust_xlsxwriter::XlsxError),
    Sheet(calamine::XlsxError),
    Config(String),
}

// These allow conversion to MutscanError, required for main() to return Result<()> and for '?' to
// work.

impl From<io::Error> for MutscanError {
    fn from(e: io::Error) -> Self {
        MutscanError::Io(e)
    }
}

impl From<String> for MutscanError {
    fn from(s: String) -> Self {
        MutscanError::Format(s)
    }
}

impl From<rust_xlsxwriter::XlsxError> for MutscanError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        MutscanError::Xlsx(e)
    }
}

impl From<calamine::XlsxError> for MutscanError {
    fn from(e: calamine::XlsxError) -> Self {
        MutscanError::Sheet(e)
    }
}

impl From<serde_json::Error> for MutscanError {
    fn from(e: serde_json::Error) -> Self {
        MutscanError::Config(e.to_string())
    }
}

impl From<regex::Error> for MutscanError {
    fn from(e: regex::Error) -> Self {
        MutscanError::Config(format!("bad AB1 file pattern: {}", e))
    }
}

impl From<hex_color::ParseHexColorError> for MutscanError {
    fn from(e: hex_color::ParseHexColorError) -> Self {
        MutscanError::Config(format!("bad color: {}", e))
    }
}

impl fmt::Display for MutscanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutscanError::Io(e) => write!(f, "I/O error: {}", e),
            MutscanError::Format(msg) => write!(f, "Format error: {}", msg),
            MutscanError::Xlsx(e) => write!(f, "Workbook write error: {}", e),
            MutscanError::Sheet(e) => write!(f, "Workbook read error: {}", e),
            MutscanError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl error::Error for MutscanError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            MutscanError::Io(e) => Some(e),
            MutscanError::Xlsx(e) => Some(e),
            MutscanError::Sheet(e) => Some(e),
            MutscanError::Format(_) | MutscanError::Config(_) => None,
        }
    }
}
