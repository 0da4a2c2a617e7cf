// src/cli.rs

use crate::data_structures::KillSignal;
use crate::name_match::NameComparison;
use crate::process_handler::{self, ProcessHandler, ProcessTable};
use crate::volume_handler::{self, VolumeHandler, VolumeSource};
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};
use tracing::debug;

pub const KILL_SUCCESS: &str = "Process killed successfully.";

#[derive(Parser, Debug)]
#[command(name = "procvol")]
#[command(about = "Kill processes by id or name and list mounted volumes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Kill processes by process id or process name
    Kill {
        /// Kill the process with this id
        #[arg(long)]
        id: Option<u32>,

        /// Kill every process with this name
        #[arg(long)]
        name: Option<String>,

        /// Signal to send
        #[arg(short, long, value_enum, default_value_t)]
        signal: KillSignal,

        /// Rejected; selection is by flags only
        #[arg(hide = true)]
        args: Vec<String>,
    },

    /// List mounted file system volumes
    Volumes,
}

pub fn run_cli(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Kill {
            id,
            name,
            signal,
            args,
        } => {
            let selection = KillFlags {
                args: &args,
                id,
                name: name.as_deref(),
            };
            let mut handler = ProcessHandler::new();
            kill_command(
                &mut handler,
                &selection,
                NameComparison::for_current_platform(),
                signal,
                &mut out,
            )
        }
        Commands::Volumes => {
            let mut handler = VolumeHandler::new();
            volumes_command(&mut handler, &mut out)
        }
    }
}

/// Raw `kill` flags as parsed, before validation.
pub struct KillFlags<'a> {
    pub args: &'a [String],
    pub id: Option<u32>,
    pub name: Option<&'a str>,
}

pub fn kill_command<T: ProcessTable + ?Sized, W: Write>(
    table: &mut T,
    flags: &KillFlags<'_>,
    comparison: NameComparison,
    signal: KillSignal,
    out: &mut W,
) -> Result<()> {
    let criteria = process_handler::resolve_criteria(flags.args, flags.id, flags.name)?;
    let outcomes = process_handler::kill_process(table, &criteria, comparison, signal)?;
    debug!(count = outcomes.len(), "kill finished");
    writeln!(out, "{}", KILL_SUCCESS)?;
    Ok(())
}

pub fn volumes_command<S: VolumeSource + ?Sized, W: Write>(source: &mut S, out: &mut W) -> Result<()> {
    let volumes = volume_handler::list_volumes(source)?;
    writeln!(out, "{}", volume_handler::render_volumes(&volumes)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcError;
    use crate::process_handler::tests::FakeTable;
    use crate::volume_handler::tests::FakeVolumes;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn parses_kill_flags() {
        let cli = parse(&["procvol", "kill", "--id", "42"]);
        match cli.command {
            Commands::Kill { id, name, signal, args } => {
                assert_eq!(id, Some(42));
                assert_eq!(name, None);
                assert_eq!(signal, KillSignal::Kill);
                assert!(args.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_signal_and_positionals() {
        let cli = parse(&["procvol", "-vv", "kill", "--name", "sleep", "--signal", "term", "extra"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Kill { name, signal, args, .. } => {
                assert_eq!(name.as_deref(), Some("sleep"));
                assert_eq!(signal, KillSignal::Term);
                assert_eq!(args, vec!["extra".to_string()]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_non_numeric_id() {
        assert!(Cli::try_parse_from(["procvol", "kill", "--id", "abc"]).is_err());
        assert!(Cli::try_parse_from(["procvol", "kill", "--id", "-1"]).is_err());
    }

    #[test]
    fn volumes_takes_no_flags() {
        assert!(matches!(parse(&["procvol", "volumes"]).command, Commands::Volumes));
        assert!(Cli::try_parse_from(["procvol", "volumes", "--all"]).is_err());
    }

    fn by_name(name: &str) -> KillFlags<'_> {
        KillFlags {
            args: &[],
            id: None,
            name: Some(name),
        }
    }

    #[test]
    fn invalid_selection_never_reaches_the_process_table() {
        let mut table = FakeTable::with(&[(1, Some("sleep"))]);
        let positional = vec!["x".to_string()];
        let cases = [
            KillFlags {
                args: &positional,
                id: None,
                name: Some("sleep"),
            },
            KillFlags {
                args: &[],
                id: Some(1),
                name: Some("sleep"),
            },
            KillFlags {
                args: &[],
                id: None,
                name: None,
            },
            KillFlags {
                args: &[],
                id: None,
                name: Some(""),
            },
        ];
        for flags in &cases {
            let mut out = Vec::new();
            let err = kill_command(&mut table, flags, NameComparison::Exact, KillSignal::Kill, &mut out).unwrap_err();
            assert!(err.downcast_ref::<ProcError>().is_some());
            assert!(out.is_empty());
        }
        assert_eq!(table.calls, 0);
    }

    #[test]
    fn successful_kill_prints_confirmation_once() {
        let mut table = FakeTable::with(&[(5, Some("sleep")), (6, Some("bash"))]);
        let mut out = Vec::new();
        kill_command(
            &mut table,
            &by_name("sleep"),
            NameComparison::Exact,
            KillSignal::Kill,
            &mut out,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Process killed successfully.\n");
    }

    #[test]
    fn failed_kill_prints_nothing() {
        let mut table = FakeTable::with(&[(5, Some("sleep"))]);
        let mut out = Vec::new();
        let err = kill_command(
            &mut table,
            &by_name("vim"),
            NameComparison::Exact,
            KillSignal::Kill,
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<ProcError>(), Some(ProcError::NameNotFound)));
        assert!(out.is_empty());
    }

    #[test]
    fn volumes_prints_listing() {
        let mut source = FakeVolumes::with(&[("/dev/sda1", "/")]);
        let mut out = Vec::new();
        volumes_command(&mut source, &mut out).unwrap();
        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed[0]["Name"], "/dev/sda1");
        assert_eq!(printed.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn volumes_listing_failure_prints_nothing() {
        let mut source = FakeVolumes {
            fail_listing: true,
            ..Default::default()
        };
        let mut out = Vec::new();
        assert!(volumes_command(&mut source, &mut out).is_err());
        assert!(out.is_empty());
    }
}
