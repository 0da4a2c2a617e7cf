// src/process_handler.rs

use crate::data_structures::{KillCriteria, KillOutcome, KillSignal, KillStatus, ProcessEntry};
use crate::error::ProcError;
use crate::name_match::NameComparison;
use sysinfo::{Pid, PidExt, Process, ProcessExt, System, SystemExt};
use tracing::{debug, info};

/// Read and signal access to the OS process table.
pub trait ProcessTable {
    /// Resolves a single process by id.
    fn find(&mut self, pid: u32) -> Result<ProcessEntry, ProcError>;
    /// Snapshot of every running process, ordered by pid.
    fn processes(&mut self) -> Result<Vec<ProcessEntry>, ProcError>;
    fn terminate(&mut self, pid: u32, signal: KillSignal) -> Result<(), String>;
}

pub struct ProcessHandler {
    system: System,
}

impl ProcessHandler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

fn entry(pid: u32, process: &Process) -> ProcessEntry {
    let name = process.name();
    #[cfg(target_os = "linux")]
    let name = extend_name(name, process.cmd());
    ProcessEntry {
        pid,
        name: (!name.is_empty()).then(|| name.to_string()),
    }
}

/// The kernel cuts process names to 15 bytes. For names that may have been
/// cut, the full name is recovered from `argv[0]`: its basename when that
/// extends the short name, otherwise `argv[0]` as is.
#[cfg(target_os = "linux")]
fn extend_name<'a>(name: &'a str, cmd: &'a [String]) -> &'a str {
    const COMM_LEN: usize = 15;

    let Some(argv0) = cmd.first().filter(|argv0| !argv0.is_empty() && name.len() >= COMM_LEN) else {
        return name;
    };
    let base = std::path::Path::new(argv0)
        .file_name()
        .and_then(|base| base.to_str())
        .unwrap_or(argv0);
    if base.starts_with(name) {
        base
    } else {
        argv0
    }
}

impl ProcessTable for ProcessHandler {
    fn find(&mut self, pid: u32) -> Result<ProcessEntry, ProcError> {
        let sys_pid = Pid::from_u32(pid);
        if !self.system.refresh_process(sys_pid) {
            return Err(ProcError::PidNotFound(pid));
        }
        self.system
            .process(sys_pid)
            .map(|process| entry(pid, process))
            .ok_or(ProcError::PidNotFound(pid))
    }

    fn processes(&mut self) -> Result<Vec<ProcessEntry>, ProcError> {
        self.system.refresh_processes();
        let mut entries: Vec<ProcessEntry> = self
            .system
            .processes()
            .iter()
            .map(|(pid, process)| entry(pid.as_u32(), process))
            .collect();
        debug!(count = entries.len(), "refreshed process table");

        // We are running, so an empty table means it could not be read.
        if entries.is_empty() {
            return Err(ProcError::ProcessTable("no processes visible".into()));
        }
        entries.sort_by_key(|e| e.pid);
        Ok(entries)
    }

    #[cfg(unix)]
    fn terminate(&mut self, pid: u32, signal: KillSignal) -> Result<(), String> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid as NixPid;

        let sig = match signal {
            KillSignal::Kill => Signal::SIGKILL,
            KillSignal::Term => Signal::SIGTERM,
            KillSignal::Hup => Signal::SIGHUP,
        };
        // Non-positive pids address process groups.
        let raw = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or_else(|| format!("pid {} is out of range", pid))?;

        kill(NixPid::from_raw(raw), sig).map_err(|e| e.to_string())
    }

    #[cfg(not(unix))]
    fn terminate(&mut self, pid: u32, signal: KillSignal) -> Result<(), String> {
        let sig = match signal {
            KillSignal::Kill => sysinfo::Signal::Kill,
            KillSignal::Term => sysinfo::Signal::Term,
            KillSignal::Hup => sysinfo::Signal::Hangup,
        };
        let process = self
            .system
            .process(Pid::from_u32(pid))
            .ok_or_else(|| "process no longer exists".to_string())?;

        match process.kill_with(sig) {
            Some(true) => Ok(()),
            Some(false) => Err("termination request was rejected".into()),
            None => Err(format!("{} is not supported on this platform", signal.as_str())),
        }
    }
}

/// Turns the raw `kill` flags into a selection, rejecting bad combinations
/// before anything touches the process table.
pub fn resolve_criteria(
    args: &[String],
    id: Option<u32>,
    name: Option<&str>,
) -> Result<KillCriteria, ProcError> {
    if !args.is_empty() {
        return Err(ProcError::UnexpectedArguments);
    }
    match (id, name) {
        (Some(_), Some(_)) => Err(ProcError::ConflictingSelectors),
        (Some(pid), None) => Ok(KillCriteria::Pid(pid)),
        (None, Some(name)) if !name.is_empty() => Ok(KillCriteria::Name(name.to_string())),
        (None, _) => Err(ProcError::MissingSelector),
    }
}

/// Terminates whatever `criteria` selects.
///
/// By pid, the first failure is returned as is. By name, every match is
/// signalled even if an earlier one fails; failures are then reported
/// together as [`ProcError::PartialFailure`].
pub fn kill_process<T: ProcessTable + ?Sized>(
    table: &mut T,
    criteria: &KillCriteria,
    comparison: NameComparison,
    signal: KillSignal,
) -> Result<Vec<KillOutcome>, ProcError> {
    match criteria {
        KillCriteria::Pid(pid) => {
            let target = table.find(*pid)?;
            table
                .terminate(target.pid, signal)
                .map_err(|reason| ProcError::Signal {
                    pid: target.pid,
                    signal: signal.as_str(),
                    reason,
                })?;
            info!(pid = target.pid, signal = signal.as_str(), "signalled process");
            Ok(vec![KillOutcome {
                pid: target.pid,
                name: target.name.unwrap_or_default(),
                status: KillStatus::Killed,
            }])
        }
        KillCriteria::Name(target) => kill_by_name(table, target, comparison, signal),
    }
}

fn kill_by_name<T: ProcessTable + ?Sized>(
    table: &mut T,
    target: &str,
    comparison: NameComparison,
    signal: KillSignal,
) -> Result<Vec<KillOutcome>, ProcError> {
    let mut outcomes = Vec::new();

    for process in table.processes()? {
        let Some(name) = process.name else {
            continue;
        };
        if !comparison.names_equal(&name, target) {
            continue;
        }

        let status = match table.terminate(process.pid, signal) {
            Ok(()) => {
                info!(pid = process.pid, %name, signal = signal.as_str(), "signalled process");
                KillStatus::Killed
            }
            Err(reason) => {
                debug!(pid = process.pid, %name, %reason, "failed to signal process");
                KillStatus::Failed(reason)
            }
        };
        outcomes.push(KillOutcome {
            pid: process.pid,
            name,
            status,
        });
    }

    if outcomes.is_empty() {
        return Err(ProcError::NameNotFound);
    }
    let failures: Vec<_> = outcomes.iter().filter_map(KillOutcome::failure).collect();
    if !failures.is_empty() {
        return Err(ProcError::PartialFailure(failures));
    }
    Ok(outcomes)
}
