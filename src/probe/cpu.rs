//! 读取 linux 下的 `/proc/stat` 文件, 计算 cpu 使用率
//!
//! 只看行首以 cpu 开头的行, 每列字段含义为:
//!   * name: 设备名(`cpu` 为汇总, `cpuN` 为单个核心)
//!   * user: 从系统启动开始累计到当前时刻, 处于用户态的运行时间
//!   * nice: nice 值为负的进程所占用的 CPU 时间
//!   * system: 处于核心态的运行时间
//!   * idle: 除 IO 等待时间以外的其它等待时间
//!   * iowait: IO 等待时间
//!   * irq: 硬中断时间
//!   * softirq: 软中断时间
//!   * steal: 在虚拟环境运行时花费在其他操作系统的时间
//!   * guest / guest_nice: 已经包含在 user / nice 中, 不参与计算
//!
//! 计算方式:
//!   1. 保存上一次采样的快照, 本次采样与之相减得到增量
//!   2. 总时间增量 = total_2 - total_1
//!   3. 使用时间增量 = 总时间增量 - (idle + iowait 增量)
//!   4. CPU 使用率 = 使用时间增量 * 100 / 总时间增量
//!
//! 第一次采样没有快照, 返回 `NotReady`; 不在探针内部 sleep。

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::ProbeError;

use super::{percent, read_number, Probe, Sample};

const PROC_STAT: &str = "/proc/stat";
const CPU0_FREQ: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_cur_freq";

/// 一行 `/proc/stat` cpu 统计(单位: jiffies)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    user: u64,
    nice: u64,
    system: u64,
    idle: u64,
    io_wait: u64,
    irq: u64,
    soft_irq: u64,
    steal: u64,
}

impl CpuTimes {
    pub(crate) fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle + self.io_wait + self.irq + self.soft_irq + self.steal
    }

    fn waiting(&self) -> u64 {
        self.idle + self.io_wait
    }

    /// 解析 `cpu  4705 356 584 3699 23 23 0 0 0 0` 这样的一行
    pub(crate) fn parse_line(line: &str) -> Result<(String, CpuTimes), ProbeError> {
        let mut fields = line.split_whitespace();
        let name = fields
            .next()
            .filter(|name| name.starts_with("cpu"))
            .ok_or_else(|| ProbeError::parse("cpu line", line))?;

        let values = fields
            .map(|field| field.parse::<u64>().map_err(|_| ProbeError::parse("cpu counter", field)))
            .collect::<Result<Vec<u64>, ProbeError>>()?;
        if values.len() < 4 {
            return Err(ProbeError::parse("cpu line", line));
        }

        // 老内核没有 iowait 之后的列
        let at = |index: usize| values.get(index).copied().unwrap_or(0);
        let times = CpuTimes {
            user: at(0),
            nice: at(1),
            system: at(2),
            idle: at(3),
            io_wait: at(4),
            irq: at(5),
            soft_irq: at(6),
            steal: at(7),
        };

        // 保证之后 total() / waiting() 的加法不会溢出
        values
            .iter()
            .take(8)
            .try_fold(0u64, |sum, value| sum.checked_add(*value))
            .ok_or_else(|| ProbeError::parse("cpu counters", line))?;
        Ok((name.to_string(), times))
    }
}

/// 读取 `/proc/stat`, 返回汇总行和各核心行(按文件顺序)
pub(crate) fn read_proc_stat(path: &Path) -> Result<(CpuTimes, Vec<CpuTimes>), ProbeError> {
    let contents = std::fs::read_to_string(path).map_err(|err| ProbeError::io(path, err))?;

    let mut total = None;
    let mut cores = Vec::new();
    for line in contents.lines().filter(|line| line.starts_with("cpu")) {
        let (name, times) = CpuTimes::parse_line(line)?;
        if name == "cpu" {
            total = Some(times);
        } else {
            cores.push(times);
        }
    }

    let total = total.ok_or_else(|| ProbeError::NotFound(format!("aggregate cpu line in {}", path.display())))?;
    Ok((total, cores))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuUsageMode {
    /// 非空闲时间占比
    Busy,
    /// iowait 占比
    IoWait,
}

/// 计算两次快照之间的使用率, 计数器回退时按 0 处理
pub(crate) fn usage_between(prev: &CpuTimes, current: &CpuTimes, mode: CpuUsageMode) -> Result<u64, ProbeError> {
    let total = current.total().saturating_sub(prev.total());
    let part = match mode {
        CpuUsageMode::Busy => total.saturating_sub(current.waiting().saturating_sub(prev.waiting())),
        CpuUsageMode::IoWait => current.io_wait.saturating_sub(prev.io_wait),
    };
    Ok(percent(part, total)?.min(100))
}

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    times: CpuTimes,
    taken_at: Instant,
}

/// `cpu_perc` / `cpu_iowait`
#[derive(Debug)]
pub struct CpuUsage {
    stat_path: PathBuf,
    mode: CpuUsageMode,
    previous: Option<Snapshot>,
}

impl CpuUsage {
    pub fn new(mode: CpuUsageMode) -> Self {
        Self::with_stat_path(PROC_STAT, mode)
    }

    pub fn with_stat_path(stat_path: impl Into<PathBuf>, mode: CpuUsageMode) -> Self {
        Self { stat_path: stat_path.into(), mode, previous: None }
    }

    fn sample_at(&mut self, now: Instant) -> Sample {
        let (times, _) = read_proc_stat(&self.stat_path)?;
        let previous = self.previous.replace(Snapshot { times, taken_at: now });
        let previous = previous.ok_or(ProbeError::NotReady)?;

        if now.saturating_duration_since(previous.taken_at).is_zero() {
            return Err(ProbeError::ZeroDenominator);
        }
        usage_between(&previous.times, &times, self.mode).map(|perc| perc.to_string())
    }
}

impl Probe for CpuUsage {
    fn sample(&mut self, _argument: Option<&str>) -> Sample {
        self.sample_at(Instant::now())
    }
}

/// `cpucore_perc`: 参数是每个核心的模板, 其中 `%d` 替换为该核心的使用率
#[derive(Debug)]
pub struct CpuCores {
    stat_path: PathBuf,
    previous: Option<(Vec<CpuTimes>, Instant)>,
}

impl Default for CpuCores {
    fn default() -> Self {
        Self::with_stat_path(PROC_STAT)
    }
}

impl CpuCores {
    pub fn with_stat_path(stat_path: impl Into<PathBuf>) -> Self {
        Self { stat_path: stat_path.into(), previous: None }
    }

    fn sample_at(&mut self, core_format: &str, now: Instant) -> Sample {
        let (_, cores) = read_proc_stat(&self.stat_path)?;
        let previous = self.previous.replace((cores.clone(), now));
        let (previous, taken_at) = previous.ok_or(ProbeError::NotReady)?;

        // 核心数变化(热插拔)时重新开始
        if previous.len() != cores.len() {
            return Err(ProbeError::NotReady);
        }
        if now.saturating_duration_since(taken_at).is_zero() {
            return Err(ProbeError::ZeroDenominator);
        }

        let mut out = String::new();
        for (prev, current) in previous.iter().zip(&cores) {
            let perc = usage_between(prev, current, CpuUsageMode::Busy)?;
            out.push_str(&core_format.replacen("%d", &perc.to_string(), 1));
        }
        Ok(out)
    }
}

impl Probe for CpuCores {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        self.sample_at(argument.unwrap_or("%d "), Instant::now())
    }
}

/// `cpu_freq`: cpu0 当前频率, kHz 转 MHz
#[derive(Debug)]
pub struct CpuFreq {
    path: PathBuf,
}

impl Default for CpuFreq {
    fn default() -> Self {
        Self { path: PathBuf::from(CPU0_FREQ) }
    }
}

impl Probe for CpuFreq {
    fn sample(&mut self, _argument: Option<&str>) -> Sample {
        let khz: u64 = read_number(&self.path, "cpu frequency")?;
        Ok((khz / 1000).to_string())
    }
}
