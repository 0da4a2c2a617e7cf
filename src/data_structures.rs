// src/data_structures.rs

use clap::ValueEnum;
use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// One mounted filesystem with its usage figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Volume {
    pub name: String,
    pub total: u64,
    pub used: u64,
    pub available: u64,
    #[serde(serialize_with = "whole_as_integer")]
    pub use_percent: f64,
    /// Left empty; the device name identifies the volume.
    pub mount: String,
}

/// Percentages with no fractional part are written as integers (`25`, not `25.0`).
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// A partition as reported by the mount table, before usage is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub device: String,
    pub mount_point: PathBuf,
    pub fs_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Usage {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub used_percent: f64,
}

impl Usage {
    /// Builds usage from raw block counts the way `df` reports it.
    pub fn from_blocks(blocks: u64, blocks_free: u64, blocks_available: u64, fragment_size: u64) -> Self {
        let total = blocks.saturating_mul(fragment_size);
        let available = blocks_available.saturating_mul(fragment_size);
        let used = blocks.saturating_sub(blocks_free).saturating_mul(fragment_size);
        Self::from_bytes(total, used, available)
    }

    pub fn from_bytes(total: u64, used: u64, available: u64) -> Self {
        let denominator = used as f64 + available as f64;
        let used_percent = if denominator > 0.0 {
            used as f64 / denominator * 100.0
        } else {
            0.0
        };
        Self {
            total,
            used,
            available,
            used_percent,
        }
    }
}

/// Which processes a kill request targets. Exactly one selector is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillCriteria {
    Pid(u32),
    Name(String),
}

/// A row of the live process table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    /// `None` when the name could not be read.
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum KillSignal {
    #[default]
    Kill,
    Term,
    Hup,
}

impl KillSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            KillSignal::Kill => "SIGKILL",
            KillSignal::Term => "SIGTERM",
            KillSignal::Hup => "SIGHUP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillFailure {
    pub pid: u32,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillStatus {
    Killed,
    Failed(String),
}

/// Outcome for one process a by-name kill matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillOutcome {
    pub pid: u32,
    pub name: String,
    pub status: KillStatus,
}

impl KillOutcome {
    pub fn failure(&self) -> Option<KillFailure> {
        match &self.status {
            KillStatus::Killed => None,
            KillStatus::Failed(reason) => Some(KillFailure {
                pid: self.pid,
                name: self.name.clone(),
                reason: reason.clone(),
            }),
        }
    }
}
