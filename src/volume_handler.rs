// src/volume_handler.rs

use crate::data_structures::{Partition, Usage, Volume};
use crate::error::ProcError;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
#[cfg(not(target_os = "linux"))]
use sysinfo::{DiskExt, System, SystemExt};
use tracing::{debug, trace};

/// Source of mounted partitions and their usage figures.
pub trait VolumeSource {
    fn partitions(&mut self) -> Result<Vec<Partition>, ProcError>;
    fn usage(&mut self, partition: &Partition) -> Result<Usage, ProcError>;
}

pub struct VolumeHandler {
    #[cfg(not(target_os = "linux"))]
    system: System,
}

impl VolumeHandler {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "linux"))]
            system: System::new(),
        }
    }
}

impl VolumeSource for VolumeHandler {
    /// Reads `/proc/mounts`, which unlike sysinfo's disk list keeps pseudo
    /// filesystems such as `proc` and `tmpfs`.
    #[cfg(target_os = "linux")]
    fn partitions(&mut self) -> Result<Vec<Partition>, ProcError> {
        let mounts = procfs::mounts().map_err(|e| ProcError::Partitions(e.to_string()))?;
        Ok(mounts
            .into_iter()
            .map(|mount| Partition {
                device: mount.fs_spec,
                mount_point: mount.fs_file.into(),
                fs_type: mount.fs_vfstype,
            })
            .collect())
    }

    #[cfg(not(target_os = "linux"))]
    fn partitions(&mut self) -> Result<Vec<Partition>, ProcError> {
        self.system.refresh_disks_list();
        Ok(self
            .system
            .disks()
            .iter()
            .map(|disk| Partition {
                device: disk.name().to_string_lossy().to_string(),
                mount_point: disk.mount_point().to_path_buf(),
                fs_type: String::from_utf8_lossy(disk.file_system()).to_string(),
            })
            .collect())
    }

    #[cfg(unix)]
    fn usage(&mut self, partition: &Partition) -> Result<Usage, ProcError> {
        use nix::sys::statvfs::statvfs;

        let stat = statvfs(partition.mount_point.as_path()).map_err(|e| ProcError::Usage {
            mount: partition.mount_point.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Usage::from_blocks(
            stat.blocks() as u64,
            stat.blocks_free() as u64,
            stat.blocks_available() as u64,
            stat.fragment_size() as u64,
        ))
    }

    #[cfg(not(unix))]
    fn usage(&mut self, partition: &Partition) -> Result<Usage, ProcError> {
        let disk = self
            .system
            .disks()
            .iter()
            .find(|disk| disk.mount_point() == partition.mount_point)
            .ok_or_else(|| ProcError::Usage {
                mount: partition.mount_point.display().to_string(),
                reason: "volume is no longer mounted".into(),
            })?;
        let total = disk.total_space();
        let available = disk.available_space();
        Ok(Usage::from_bytes(total, total.saturating_sub(available), available))
    }
}

/// Collects a [`Volume`] for every partition whose usage can be read.
///
/// Only a failure to list partitions is an error. A partition whose usage
/// query fails is left out of the result without any report.
pub fn list_volumes<S: VolumeSource + ?Sized>(source: &mut S) -> Result<Vec<Volume>, ProcError> {
    let partitions = source.partitions()?;
    debug!(count = partitions.len(), "listed partitions");

    let volumes = partitions
        .iter()
        .filter_map(|partition| {
            let usage = source.usage(partition).ok()?;
            trace!(device = %partition.device, mount = %partition.mount_point.display(), fs = %partition.fs_type, "read usage");
            Some(Volume {
                name: partition.device.clone(),
                total: usage.total,
                used: usage.used,
                available: usage.available,
                use_percent: usage.used_percent,
                mount: String::new(),
            })
        })
        .collect();
    Ok(volumes)
}

/// Renders volumes as tab-indented JSON.
pub fn render_volumes(volumes: &[Volume]) -> Result<String, ProcError> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    volumes.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
