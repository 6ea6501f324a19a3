// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::info;

use crate::config::{load_config, MutscanConfig};
use crate::errors::MutscanError;
use crate::report::{run_report, ReportOptions};
use crate::scan::{run_scan, ScanOptions};

pub const DEFAULT_MUTATIONS_FILE: &str = "mutations.xlsx";
pub const DEFAULT_REPORT_FILE: &str = "mutation_report.xlsx";
pub const DEFAULT_PLOTS_DIR: &str = "plots";

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Align AB1 reads to a reference and tabulate codon mutations
    Align(AlignArgs),
    /// Build the formatted report and plots from a mutation table
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AlignArgs {
    /// Reference sequence file (FASTA)
    #[arg(long = "ref")]
    pub reference: PathBuf,

    /// Directory containing AB1 files
    #[arg(long)]
    pub input: PathBuf,

    /// Output Excel file
    #[arg(long, default_value = DEFAULT_MUTATIONS_FILE)]
    pub output: PathBuf,

    /// Number of nucleotides to trim from the start of each read [default: 50]
    #[arg(long)]
    pub trim: Option<usize>,

    /// Minimum aligned read length [default: 50]
    #[arg(long = "min-length", alias = "min_length")]
    pub min_length: Option<usize>,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Input Excel file with mutation data
    #[arg(long)]
    pub input: PathBuf,

    /// Output Excel report file
    #[arg(long, default_value = DEFAULT_REPORT_FILE)]
    pub output: PathBuf,

    /// Directory for output plots
    #[arg(long, default_value = DEFAULT_PLOTS_DIR)]
    pub plots: PathBuf,
}

// Standalone parsers, used when a stage is run from a flag list rather than from the command line.

#[derive(Debug, Parser)]
#[command(name = "align")]
pub struct AlignCommand {
    #[command(flatten)]
    pub args: AlignArgs,
}

#[derive(Debug, Parser)]
#[command(name = "report")]
pub struct ReportCommand {
    #[command(flatten)]
    pub args: ReportArgs,
}

impl AlignArgs {
    pub fn to_options(&self, config: &MutscanConfig) -> Result<ScanOptions, MutscanError> {
        Ok(ScanOptions {
            reference: self.reference.clone(),
            input_dir: self.input.clone(),
            output: self.output.clone(),
            trim: self.trim.unwrap_or(config.trim),
            min_length: self.min_length.unwrap_or(config.min_length),
            scoring: config.scoring,
            ab1_pattern: config.ab1_regex()?,
        })
    }
}

impl ReportArgs {
    pub fn to_options(&self, config: &MutscanConfig) -> Result<ReportOptions, MutscanError> {
        Ok(ReportOptions {
            input: self.input.clone(),
            output: self.output.clone(),
            plots: self.plots.clone(),
            colors: config.report_colors()?,
        })
    }
}

pub fn run_align(args: &AlignArgs, config: &MutscanConfig) -> Result<(), MutscanError> {
    let opts = args.to_options(config)?;
    info!(
        "align: ref {}, input {}, trim {}, min length {}",
        opts.reference.display(),
        opts.input_dir.display(),
        opts.trim,
        opts.min_length
    );
    run_scan(&opts)?;
    Ok(())
}

pub fn run_report_stage(args: &ReportArgs, config: &MutscanConfig) -> Result<(), MutscanError> {
    let opts = args.to_options(config)?;
    info!(
        "report: input {}, output {}, plots {}",
        opts.input.display(),
        opts.output.display(),
        opts.plots.display()
    );
    run_report(&opts)?;
    Ok(())
}

pub fn run() -> Result<(), MutscanError> {
    env_logger::init();
    info!("Starting log");

    let cli = Cli::parse();
    let config = load_config();
    match &cli.command {
        Command::Align(args) => run_align(args, &config),
        Command::Report(args) => run_report_stage(args, &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_flags() {
        let cmd = AlignCommand::try_parse_from([
            "align",
            "--ref",
            "ref.fasta",
            "--input",
            "reads",
            "--min_length",
            "30",
        ])
        .expect("parse");
        assert_eq!(cmd.args.reference, PathBuf::from("ref.fasta"));
        assert_eq!(cmd.args.input, PathBuf::from("reads"));
        assert_eq!(cmd.args.output, PathBuf::from("mutations.xlsx"));
        assert_eq!(cmd.args.trim, None);
        assert_eq!(cmd.args.min_length, Some(30));

        let opts = cmd
            .args
            .to_options(&MutscanConfig::default())
            .expect("options");
        assert_eq!(opts.trim, 50);
        assert_eq!(opts.min_length, 30);
    }

    #[test]
    fn test_align_requires_ref() {
        assert!(AlignCommand::try_parse_from(["align", "--input", "reads"]).is_err());
    }

    #[test]
    fn test_config_supplies_defaults() {
        let cmd = AlignCommand::try_parse_from(["align", "--ref", "r.fa", "--input", "d"])
            .expect("parse");
        let config = MutscanConfig {
            trim: 10,
            ..MutscanConfig::default()
        };
        assert_eq!(cmd.args.to_options(&config).expect("options").trim, 10);
    }

    #[test]
    fn test_report_flags() {
        let cmd = ReportCommand::try_parse_from(["report", "--input", "mutations.xlsx"])
            .expect("parse");
        assert_eq!(cmd.args.output, PathBuf::from("mutation_report.xlsx"));
        assert_eq!(cmd.args.plots, PathBuf::from("plots"));
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from([
            "mutscan",
            "report",
            "--input",
            "m.xlsx",
            "--plots",
            "mutation_plots",
        ])
        .expect("parse");
        match cli.command {
            Command::Report(args) => assert_eq!(args.plots, PathBuf::from("mutation_plots")),
            Command::Align(_) => panic!("expected report"),
        }
    }
}
