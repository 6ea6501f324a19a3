// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Thomas Junier

//! Drives the two pipeline stages: alignment, then report.

use std::{
    fmt,
    io::{stdout, Write},
    process::Command,
};

use clap::Parser;
use log::{debug, info};

use crate::config::{MutscanConfig, ToolsConfig};
use crate::errors::MutscanError;
use crate::runner::{run_align, run_report_stage, AlignCommand, ReportCommand};

pub const MUTATIONS_FILE: &str = "mutations.xlsx";
pub const REPORT_FILE: &str = "mutation_report.xlsx";
pub const PLOTS_DIR: &str = "mutation_plots";

pub const USAGE: &str = "Usage: run_analysis [reference.fasta] [ab1_directory]
Example: run_analysis reference.fasta ab1_files";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Align,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Align => "align",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// One stage run: which stage, and the flags it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: Stage,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn align(reference: &str, input_dir: &str) -> Self {
        Invocation {
            stage: Stage::Align,
            args: [
                "--ref",
                reference,
                "--input",
                input_dir,
                "--output",
                MUTATIONS_FILE,
            ]
            .map(String::from)
            .to_vec(),
        }
    }

    pub fn report() -> Self {
        Invocation {
            stage: Stage::Report,
            args: [
                "--input",
                MUTATIONS_FILE,
                "--output",
                REPORT_FILE,
                "--plots",
                PLOTS_DIR,
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Runs a stage. Implementations decide whether that happens in-process or in a child process.
pub trait StageInvoker {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), MutscanError>;
}

/// Runs stages in-process, unless the config names an external command for the stage.
pub struct StageRunner {
    config: MutscanConfig,
}

impl StageRunner {
    pub fn new(config: MutscanConfig) -> Self {
        StageRunner { config }
    }

    fn external_command<'a>(tools: &'a ToolsConfig, stage: Stage) -> Option<&'a [String]> {
        let cmd = match stage {
            Stage::Align => tools.align_command.as_deref(),
            Stage::Report => tools.report_command.as_deref(),
        };
        cmd.filter(|c| !c.is_empty())
    }

    fn run_in_process(&self, invocation: &Invocation) -> Result<(), MutscanError> {
        let argv = std::iter::once(invocation.stage.to_string())
            .chain(invocation.args.iter().cloned());
        match invocation.stage {
            Stage::Align => {
                let cmd = AlignCommand::try_parse_from(argv)
                    .map_err(|e| MutscanError::Format(e.to_string()))?;
                run_align(&cmd.args, &self.config)
            }
            Stage::Report => {
                let cmd = ReportCommand::try_parse_from(argv)
                    .map_err(|e| MutscanError::Format(e.to_string()))?;
                run_report_stage(&cmd.args, &self.config)
            }
        }
    }
}

impl StageInvoker for StageRunner {
    fn invoke(&mut self, invocation: &Invocation) -> Result<(), MutscanError> {
        match Self::external_command(&self.config.tools, invocation.stage) {
            Some(cmd) => run_external(cmd, invocation),
            None => self.run_in_process(invocation),
        }
    }
}

/// Spawns `cmd` with the invocation's flags appended and waits for it.
pub fn run_external(cmd: &[String], invocation: &Invocation) -> Result<(), MutscanError> {
    let (program, prefix) = cmd
        .split_first()
        .ok_or_else(|| MutscanError::Config(format!("empty {} command", invocation.stage)))?;
    debug!("spawning {} {:?} {:?}", program, prefix, invocation.args);
    let status = Command::new(program)
        .args(prefix)
        .args(&invocation.args)
        .status()
        .map_err(|e| MutscanError::Format(format!("Failed to run {}: {}", program, e)))?;
    if !status.success() {
        return Err(MutscanError::Format(format!(
            "{} stage failed ({})",
            invocation.stage, status
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An argument was missing; usage was printed and nothing ran.
    Usage,
    Completed,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Usage => 1,
            Outcome::Completed => 0,
        }
    }
}

pub struct Sequencer<I: StageInvoker> {
    invoker: I,
}

impl<I: StageInvoker> Sequencer<I> {
    pub fn new(invoker: I) -> Self {
        Sequencer { invoker }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Runs alignment then report for `args` = [reference, ab1 directory, ...]. Arguments past
    /// the second are ignored. A failing stage stops the sequence.
    pub fn run<W: Write>(&mut self, args: &[String], out: &mut W) -> Result<Outcome, MutscanError> {
        let (Some(reference), Some(input_dir)) = (args.first(), args.get(1)) else {
            writeln!(out, "{}", USAGE)?;
            return Ok(Outcome::Usage);
        };
        info!("reference {}, AB1 directory {}", reference, input_dir);

        writeln!(out, "Running sequence alignment...")?;
        out.flush()?;
        self.invoker.invoke(&Invocation::align(reference, input_dir))?;

        writeln!(out, "Generating report...")?;
        out.flush()?;
        self.invoker.invoke(&Invocation::report())?;

        writeln!(out, "Analysis complete!")?;
        writeln!(out, "Mutation data: {}", MUTATIONS_FILE)?;
        writeln!(out, "Report: {}", REPORT_FILE)?;
        writeln!(out, "Plots: {}/", PLOTS_DIR)?;
        Ok(Outcome::Completed)
    }
}

/// Entry point of the `run_analysis` binary. Returns the process exit code.
pub fn run_analysis(args: &[String], config: MutscanConfig) -> i32 {
    let mut sequencer = Sequencer::new(StageRunner::new(config));
    match sequencer.run(args, &mut stdout()) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Invocation>,
        fail_on: Option<Stage>,
    }

    impl StageInvoker for Recorder {
        fn invoke(&mut self, invocation: &Invocation) -> Result<(), MutscanError> {
            self.calls.push(invocation.clone());
            if self.fail_on == Some(invocation.stage) {
                return Err(MutscanError::Format(format!("{} broke", invocation.stage)));
            }
            Ok(())
        }
    }

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_prints_usage() {
        let mut seq = Sequencer::new(Recorder::default());
        let mut out = Vec::new();
        let outcome = seq.run(&[], &mut out).expect("run");
        assert_eq!(outcome, Outcome::Usage);
        assert_ne!(outcome.exit_code(), 0);
        assert!(String::from_utf8(out).expect("utf8").starts_with("Usage: run_analysis"));
        assert!(seq.invoker().calls.is_empty());
    }

    #[test]
    fn test_one_argument_prints_usage() {
        let mut seq = Sequencer::new(Recorder::default());
        let mut out = Vec::new();
        let outcome = seq.run(&args(&["reference.fasta"]), &mut out).expect("run");
        assert_eq!(outcome.exit_code(), 1);
        assert!(String::from_utf8(out).expect("utf8").contains("[ab1_directory]"));
        assert!(seq.invoker().calls.is_empty());
    }

    #[test]
    fn test_two_arguments_run_both_stages() {
        let mut seq = Sequencer::new(Recorder::default());
        let mut out = Vec::new();
        let outcome = seq
            .run(&args(&["ref.fasta", "ab1_files", "ignored"]), &mut out)
            .expect("run");
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            seq.invoker().calls,
            vec![
                Invocation {
                    stage: Stage::Align,
                    args: args(&[
                        "--ref",
                        "ref.fasta",
                        "--input",
                        "ab1_files",
                        "--output",
                        "mutations.xlsx"
                    ]),
                },
                Invocation {
                    stage: Stage::Report,
                    args: args(&[
                        "--input",
                        "mutations.xlsx",
                        "--output",
                        "mutation_report.xlsx",
                        "--plots",
                        "mutation_plots"
                    ]),
                },
            ]
        );
        let printed = String::from_utf8(out).expect("utf8");
        assert!(printed.contains("Running sequence alignment..."));
        assert!(printed.contains("Analysis complete!"));
    }

    #[test]
    fn test_failed_alignment_stops_sequence() {
        let mut seq = Sequencer::new(Recorder {
            fail_on: Some(Stage::Align),
            ..Recorder::default()
        });
        let mut out = Vec::new();
        let err = seq
            .run(&args(&["ref.fasta", "ab1_files"]), &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("align broke"));
        assert_eq!(seq.invoker().calls.len(), 1);
    }

    #[test]
    fn test_invocations_parse_as_stage_flags() {
        let align = Invocation::align("r.fa", "reads");
        let argv = std::iter::once(String::from("align")).chain(align.args);
        let cmd = AlignCommand::try_parse_from(argv).expect("align flags");
        assert_eq!(cmd.args.output.to_str(), Some(MUTATIONS_FILE));

        let report = Invocation::report();
        let argv = std::iter::once(String::from("report")).chain(report.args);
        let cmd = ReportCommand::try_parse_from(argv).expect("report flags");
        assert_eq!(cmd.args.plots.to_str(), Some(PLOTS_DIR));
    }

    #[test]
    fn test_external_command_selection() {
        let tools = ToolsConfig {
            align_command: Some(vec![String::from("python3"), String::from("aligner.py")]),
            report_command: Some(Vec::new()),
        };
        assert_eq!(
            StageRunner::external_command(&tools, Stage::Align).map(|c| c.len()),
            Some(2)
        );
        assert!(StageRunner::external_command(&tools, Stage::Report).is_none());
    }

    #[test]
    fn test_external_failure_is_reported() {
        let err = run_external(&[String::from("false")], &Invocation::report()).unwrap_err();
        assert!(err.to_string().contains("report stage failed"));
    }
}
