// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::{
    fs,
    path::{Path, PathBuf},
};

use hex_color::HexColor;
use log::{info, warn};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::align::ScoringConfig;
use crate::errors::MutscanError;

pub const CONFIG_FILE_NAME: &str = ".mutscanconfig";

pub const DEFAULT_TRIM: usize = 50;
pub const DEFAULT_MIN_LENGTH: usize = 50;
pub const DEFAULT_AB1_PATTERN: &str = r"(?i)\.ab1$";

/// Settings read from `.mutscanconfig` (JSON). Every key is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MutscanConfig {
    /// Bases dropped from the start of every read.
    pub trim: usize,
    /// Reads with fewer aligned bases are skipped.
    pub min_length: usize,
    /// Regex matched against file names in the input directory.
    pub ab1_pattern: String,
    pub scoring: ScoringConfig,
    pub colors: ColorConfig,
    pub tools: ToolsConfig,
}

impl Default for MutscanConfig {
    fn default() -> Self {
        MutscanConfig {
            trim: DEFAULT_TRIM,
            min_length: DEFAULT_MIN_LENGTH,
            ab1_pattern: String::from(DEFAULT_AB1_PATTERN),
            scoring: ScoringConfig::default(),
            colors: ColorConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub header: String,
    pub silent: String,
    pub missense: String,
    pub positions: String,
    pub bars: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        ColorConfig {
            header: String::from("#DDEBF7"),
            silent: String::from("#E2EFDA"),
            missense: String::from("#FCE4D6"),
            positions: String::from("#6699CC"),
            bars: String::from("#4C72B0"),
        }
    }
}

/// External commands for the pipeline stages. A stage without a command runs in-process.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub align_command: Option<Vec<String>>,
    pub report_command: Option<Vec<String>>,
}

/// Parsed report colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportColors {
    pub header: HexColor,
    pub silent: HexColor,
    pub missense: HexColor,
    pub positions: HexColor,
    /// Per-sample bar chart.
    pub bars: HexColor,
}

impl Default for ReportColors {
    fn default() -> Self {
        ReportColors {
            header: HexColor::rgb(0xDD, 0xEB, 0xF7),
            silent: HexColor::rgb(0xE2, 0xEF, 0xDA),
            missense: HexColor::rgb(0xFC, 0xE4, 0xD6),
            positions: HexColor::rgb(0x66, 0x99, 0xCC),
            bars: HexColor::rgb(0x4C, 0x72, 0xB0),
        }
    }
}

impl MutscanConfig {
    pub fn from_value(value: &Value) -> Result<Self, MutscanError> {
        let config: MutscanConfig = serde_json::from_value(value.clone())?;
        // Fail early on values that are only used later in the run.
        config.ab1_regex()?;
        config.report_colors()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, MutscanError> {
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;
        Self::from_value(&value)
    }

    pub fn ab1_regex(&self) -> Result<Regex, MutscanError> {
        Ok(Regex::new(&self.ab1_pattern)?)
    }

    pub fn report_colors(&self) -> Result<ReportColors, MutscanError> {
        Ok(ReportColors {
            header: HexColor::parse(&self.colors.header)?,
            silent: HexColor::parse(&self.colors.silent)?,
            missense: HexColor::parse(&self.colors.missense)?,
            positions: HexColor::parse(&self.colors.positions)?,
            bars: HexColor::parse(&self.colors.bars)?,
        })
    }
}

/// Looks for the config file in $HOME, then in the current directory.
pub fn find_config() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        let path = PathBuf::from(home).join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join(CONFIG_FILE_NAME);
        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Loads the config file if there is one. A broken file is reported and defaults are used.
pub fn load_config() -> MutscanConfig {
    let Some(path) = find_config() else {
        return MutscanConfig::default();
    };
    match MutscanConfig::from_file(&path) {
        Ok(config) => {
            info!("Using config {}", path.display());
            config
        }
        Err(e) => {
            warn!("ignoring config {}", path.display());
            eprintln!("Error reading {}: {}", path.display(), e);
            MutscanConfig::default()
        }
    }
}

/// Converts a colour to the `0xRRGGBB` form spreadsheet formats expect.
pub fn rgb_u32(color: HexColor) -> u32 {
    (u32::from(color.r) << 16) | (u32::from(color.g) << 8) | u32::from(color.b)
}

/// CSS form, without alpha.
pub fn css_color(color: HexColor) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
}
