//! 内存 / 交换分区, 通过 procfs 读取 `/proc/meminfo`

use procfs::{Current, Meminfo};

use super::{gib, percent, Probe, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemMetric {
    RamFree,
    RamPerc,
    RamTotal,
    RamUsed,
    SwapFree,
    SwapPerc,
    SwapTotal,
    SwapUsed,
}

/// `/proc/meminfo` 中用到的字段(单位: 字节)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemSnapshot {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
    pub swap_cached: u64,
}

impl From<&Meminfo> for MemSnapshot {
    fn from(info: &Meminfo) -> Self {
        Self {
            mem_total: info.mem_total,
            mem_free: info.mem_free,
            mem_available: info.mem_available.unwrap_or(info.mem_free),
            buffers: info.buffers,
            cached: info.cached,
            swap_total: info.swap_total,
            swap_free: info.swap_free,
            swap_cached: info.swap_cached,
        }
    }
}

impl MemSnapshot {
    /// 已使用 = total - free - buffers - cached
    pub fn ram_used(&self) -> u64 {
        self.mem_total
            .saturating_sub(self.mem_free)
            .saturating_sub(self.buffers)
            .saturating_sub(self.cached)
    }

    pub fn swap_used(&self) -> u64 {
        self.swap_total.saturating_sub(self.swap_free).saturating_sub(self.swap_cached)
    }

    pub fn render(&self, metric: MemMetric) -> Sample {
        let value = match metric {
            MemMetric::RamFree => gib(self.mem_available),
            MemMetric::RamPerc => percent(self.ram_used(), self.mem_total)?.to_string(),
            MemMetric::RamTotal => gib(self.mem_total),
            MemMetric::RamUsed => gib(self.ram_used()),
            MemMetric::SwapFree => gib(self.swap_free),
            MemMetric::SwapPerc => percent(self.swap_used(), self.swap_total)?.to_string(),
            MemMetric::SwapTotal => gib(self.swap_total),
            MemMetric::SwapUsed => gib(self.swap_used()),
        };
        Ok(value)
    }
}

#[derive(Debug)]
pub struct Memory {
    metric: MemMetric,
}

impl Memory {
    pub fn new(metric: MemMetric) -> Self {
        Self { metric }
    }
}

impl Probe for Memory {
    fn sample(&mut self, _argument: Option<&str>) -> Sample {
        let info = Meminfo::current()?;
        MemSnapshot::from(&info).render(self.metric)
    }
}
