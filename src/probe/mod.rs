//! 探针: 每种指标一个实现, 统一为 `Probe` 接口
//!
//! 一个探针只负责读取外部状态并返回一段短文本, 失败时返回 `ProbeError`,
//! 由渲染器替换成占位符。需要前后两次采样的探针(cpu)自己保存上一次的快照。

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, ProbeError};

pub mod battery;
pub mod command;
pub mod cpu;
pub mod disk;
pub mod host;
pub mod identity;
pub mod memory;
pub mod network;
pub mod sensor;
pub mod time;

pub type Sample = Result<String, ProbeError>;

/// 单个指标的采样接口
pub trait Probe {
    fn sample(&mut self, argument: Option<&str>) -> Sample;
}

impl<F> Probe for F
where
    F: FnMut(Option<&str>) -> Sample,
{
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        self(argument)
    }
}

/// 探针种类, 与配置文件中的名称一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    BatteryPerc,
    BatteryPower,
    BatteryState,
    CpuPerc,
    CpuIowait,
    CpuFreq,
    CpucorePerc,
    Datetime,
    DiskFree,
    DiskPerc,
    DiskTotal,
    DiskUsed,
    Entropy,
    Gid,
    Hostname,
    Ipv4,
    Ipv6,
    KernelRelease,
    LoadAvg,
    Literal,
    NumFiles,
    RamFree,
    RamPerc,
    RamTotal,
    RamUsed,
    RunCommand,
    SwapFree,
    SwapPerc,
    SwapTotal,
    SwapUsed,
    Temp,
    Uid,
    Uptime,
    Username,
    WifiPerc,
    WifiEssid,
}

const NAMES: &[(&str, ProbeKind)] = &[
    ("battery_perc", ProbeKind::BatteryPerc),
    ("battery_power", ProbeKind::BatteryPower),
    ("battery_state", ProbeKind::BatteryState),
    ("cpu_perc", ProbeKind::CpuPerc),
    ("cpu_iowait", ProbeKind::CpuIowait),
    ("cpu_freq", ProbeKind::CpuFreq),
    ("cpucore_perc", ProbeKind::CpucorePerc),
    ("datetime", ProbeKind::Datetime),
    ("disk_free", ProbeKind::DiskFree),
    ("disk_perc", ProbeKind::DiskPerc),
    ("disk_total", ProbeKind::DiskTotal),
    ("disk_used", ProbeKind::DiskUsed),
    ("entropy", ProbeKind::Entropy),
    ("gid", ProbeKind::Gid),
    ("hostname", ProbeKind::Hostname),
    ("ipv4", ProbeKind::Ipv4),
    ("ipv6", ProbeKind::Ipv6),
    ("kernel_release", ProbeKind::KernelRelease),
    ("load_avg", ProbeKind::LoadAvg),
    ("literal", ProbeKind::Literal),
    ("num_files", ProbeKind::NumFiles),
    ("ram_free", ProbeKind::RamFree),
    ("ram_perc", ProbeKind::RamPerc),
    ("ram_total", ProbeKind::RamTotal),
    ("ram_used", ProbeKind::RamUsed),
    ("run_command", ProbeKind::RunCommand),
    ("swap_free", ProbeKind::SwapFree),
    ("swap_perc", ProbeKind::SwapPerc),
    ("swap_total", ProbeKind::SwapTotal),
    ("swap_used", ProbeKind::SwapUsed),
    ("temp", ProbeKind::Temp),
    ("uid", ProbeKind::Uid),
    ("uptime", ProbeKind::Uptime),
    ("username", ProbeKind::Username),
    ("wifi_perc", ProbeKind::WifiPerc),
    ("wifi_essid", ProbeKind::WifiEssid),
];

impl ProbeKind {
    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }

    /// 创建一个新的探针实例, 每个 provider 拥有自己的实例(状态互不共享)
    pub fn build(self) -> Box<dyn Probe> {
        use self::battery::{Battery, BatteryField};
        use self::cpu::{CpuCores, CpuFreq, CpuUsage, CpuUsageMode};
        use self::disk::{Disk, DiskMetric};
        use self::host::{Host, HostMetric};
        use self::identity::Identity;
        use self::memory::{MemMetric, Memory};
        use self::network::{IpAddress, WifiEssid, WifiPerc};
        use self::sensor::{Entropy, NumFiles, Temperature};

        match self {
            Self::BatteryPerc => Box::new(Battery::new(BatteryField::Capacity)),
            Self::BatteryPower => Box::new(Battery::new(BatteryField::Power)),
            Self::BatteryState => Box::new(Battery::new(BatteryField::State)),
            Self::CpuPerc => Box::new(CpuUsage::new(CpuUsageMode::Busy)),
            Self::CpuIowait => Box::new(CpuUsage::new(CpuUsageMode::IoWait)),
            Self::CpuFreq => Box::new(CpuFreq::default()),
            Self::CpucorePerc => Box::new(CpuCores::default()),
            Self::Datetime => Box::new(time::Datetime),
            Self::DiskFree => Box::new(Disk::new(DiskMetric::Free)),
            Self::DiskPerc => Box::new(Disk::new(DiskMetric::Percent)),
            Self::DiskTotal => Box::new(Disk::new(DiskMetric::Total)),
            Self::DiskUsed => Box::new(Disk::new(DiskMetric::Used)),
            Self::Entropy => Box::new(Entropy::default()),
            Self::Gid => Box::new(Identity::Gid),
            Self::Hostname => Box::new(Host::new(HostMetric::Hostname)),
            Self::Ipv4 => Box::new(IpAddress::V4),
            Self::Ipv6 => Box::new(IpAddress::V6),
            Self::KernelRelease => Box::new(Host::new(HostMetric::KernelRelease)),
            Self::LoadAvg => Box::new(Host::new(HostMetric::LoadAvg)),
            Self::Literal => Box::new(Literal),
            Self::NumFiles => Box::new(NumFiles),
            Self::RamFree => Box::new(Memory::new(MemMetric::RamFree)),
            Self::RamPerc => Box::new(Memory::new(MemMetric::RamPerc)),
            Self::RamTotal => Box::new(Memory::new(MemMetric::RamTotal)),
            Self::RamUsed => Box::new(Memory::new(MemMetric::RamUsed)),
            Self::RunCommand => Box::new(command::RunCommand),
            Self::SwapFree => Box::new(Memory::new(MemMetric::SwapFree)),
            Self::SwapPerc => Box::new(Memory::new(MemMetric::SwapPerc)),
            Self::SwapTotal => Box::new(Memory::new(MemMetric::SwapTotal)),
            Self::SwapUsed => Box::new(Memory::new(MemMetric::SwapUsed)),
            Self::Temp => Box::new(Temperature),
            Self::Uid => Box::new(Identity::Uid),
            Self::Uptime => Box::new(Host::new(HostMetric::Uptime)),
            Self::Username => Box::new(Identity::Username),
            Self::WifiPerc => Box::new(WifiPerc::default()),
            Self::WifiEssid => Box::new(WifiEssid),
        }
    }
}

impl FromStr for ProbeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| Error::UnknownProbe(s.to_string()))
    }
}

/// 原样输出参数, 用于分隔符或图标
#[derive(Debug)]
pub struct Literal;

impl Probe for Literal {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        required(argument).map(str::to_string)
    }
}

pub(crate) fn required(argument: Option<&str>) -> Result<&str, ProbeError> {
    argument.filter(|arg| !arg.is_empty()).ok_or(ProbeError::MissingArgument)
}

/// 读取文件并去掉首尾空白
pub(crate) fn read_trimmed(path: &Path) -> Result<String, ProbeError> {
    fs::read_to_string(path)
        .map(|content| content.trim().to_string())
        .map_err(|err| ProbeError::io(path, err))
}

/// 读取只包含一个数字的文件(sysfs 风格)
pub(crate) fn read_number<T: FromStr>(path: &Path, what: &'static str) -> Result<T, ProbeError> {
    let content = read_trimmed(path)?;
    content.parse::<T>().map_err(|_| ProbeError::parse(what, content))
}

/// 整数百分比, 分母为 0 时返回错误
pub(crate) fn percent(part: u64, whole: u64) -> Result<u64, ProbeError> {
    if whole == 0 {
        return Err(ProbeError::ZeroDenominator);
    }
    Ok((100 * u128::from(part) / u128::from(whole)) as u64)
}

/// 字节转 GiB, 保留一位小数
pub(crate) fn gib(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn names_round_trip_through_from_str() {
        for (name, kind) in NAMES {
            assert_eq!(name.parse::<ProbeKind>().unwrap(), *kind);
            assert_eq!(kind.name(), *name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "vol_perc".parse::<ProbeKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownProbe(name) if name == "vol_perc"));
    }

    #[test]
    fn percent_guards_zero_denominator() {
        assert!(matches!(percent(1, 0), Err(ProbeError::ZeroDenominator)));
        assert_eq!(percent(1, 3).unwrap(), 33);
        assert_eq!(percent(50, 50).unwrap(), 100);
    }

    #[test]
    fn gib_has_one_decimal() {
        assert_eq!(gib(0), "0.0");
        assert_eq!(gib(3 * 1024 * 1024 * 1024 / 2), "1.5");
    }

    #[test]
    fn read_number_reports_path_and_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  42").unwrap();
        assert_eq!(read_number::<u32>(file.path(), "value").unwrap(), 42);

        let missing = file.path().with_extension("missing");
        assert!(matches!(read_number::<u32>(&missing, "value"), Err(ProbeError::Io { .. })));

        let mut garbage = tempfile::NamedTempFile::new().unwrap();
        writeln!(garbage, "abc").unwrap();
        assert!(matches!(read_number::<u32>(garbage.path(), "value"), Err(ProbeError::Parse { .. })));
    }

    #[test]
    fn literal_requires_argument() {
        assert_eq!(Literal.sample(Some(" | ")).unwrap(), " | ");
        assert!(matches!(Literal.sample(None), Err(ProbeError::MissingArgument)));
    }

    #[test]
    fn closures_are_probes() {
        let mut calls = 0;
        let mut probe = |arg: Option<&str>| -> Sample {
            calls += 1;
            Ok(arg.unwrap_or("none").to_string())
        };
        assert_eq!(probe.sample(Some("x")).unwrap(), "x");
        assert_eq!(probe.sample(None).unwrap(), "none");
        assert_eq!(calls, 2);
    }
}
