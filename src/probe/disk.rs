//! 通过 sysinfo 获取挂载点的磁盘空间

use std::path::Path;

use sysinfo::{DiskExt, System, SystemExt};

use crate::error::ProbeError;

use super::{gib, percent, required, Probe, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskMetric {
    Free,
    Percent,
    Total,
    Used,
}

/// 某个挂载点的空间(单位: 字节)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskSpace {
    pub total_space: u64,
    pub available_space: u64,
}

impl DiskSpace {
    pub fn used_space(&self) -> u64 {
        self.total_space.saturating_sub(self.available_space)
    }

    pub fn render(&self, metric: DiskMetric) -> Sample {
        let value = match metric {
            DiskMetric::Free => gib(self.available_space),
            DiskMetric::Percent => percent(self.used_space(), self.total_space)?.to_string(),
            DiskMetric::Total => gib(self.total_space),
            DiskMetric::Used => gib(self.used_space()),
        };
        Ok(value)
    }
}

pub struct Disk {
    sys: System,
    metric: DiskMetric,
}

impl std::fmt::Debug for Disk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disk").field("metric", &self.metric).finish()
    }
}

impl Disk {
    pub fn new(metric: DiskMetric) -> Self {
        Self { sys: System::new(), metric }
    }

    /// 挂载点可能在两次采样之间变化, 每次都刷新磁盘列表
    fn space_of(&mut self, path: &Path) -> Result<DiskSpace, ProbeError> {
        let path = path.canonicalize().map_err(|err| ProbeError::io(path, err))?;
        self.sys.refresh_disks_list();
        let mounts = self.sys.disks().iter().map(|disk| {
            let space = DiskSpace {
                total_space: disk.total_space(),
                available_space: disk.available_space(),
            };
            (disk.mount_point(), space)
        });
        containing_mount(mounts, &path)
            .ok_or_else(|| ProbeError::NotFound(format!("filesystem containing {}", path.display())))
    }
}

/// 找到包含 `path` 的文件系统: 挂载点是 `path` 前缀中最长的那个
fn containing_mount<'a>(mounts: impl Iterator<Item = (&'a Path, DiskSpace)>, path: &Path) -> Option<DiskSpace> {
    mounts
        .filter(|(mount_point, _)| path.starts_with(mount_point))
        .max_by_key(|(mount_point, _)| mount_point.components().count())
        .map(|(_, space)| space)
}

impl Probe for Disk {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let path = Path::new(required(argument)?);
        self.space_of(path)?.render(self.metric)
    }
}
