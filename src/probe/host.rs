//! 主机信息: 主机名、内核版本、运行时间、负载, 通过 sysinfo 获取

use sysinfo::{System, SystemExt};

use crate::error::ProbeError;

use super::{Probe, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMetric {
    Hostname,
    KernelRelease,
    Uptime,
    LoadAvg,
}

pub struct Host {
    sys: System,
    metric: HostMetric,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").field("metric", &self.metric).finish()
    }
}

impl Host {
    pub fn new(metric: HostMetric) -> Self {
        Self { sys: System::new(), metric }
    }
}

impl Probe for Host {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        match self.metric {
            HostMetric::Hostname => self
                .sys
                .host_name()
                .ok_or_else(|| ProbeError::NotFound("host name".to_string())),
            HostMetric::KernelRelease => self
                .sys
                .kernel_version()
                .ok_or_else(|| ProbeError::NotFound("kernel release".to_string())),
            HostMetric::Uptime => Ok(format_uptime(self.sys.uptime())),
            HostMetric::LoadAvg => {
                let precision = load_precision(argument)?;
                let load = self.sys.load_average();
                Ok(format!(
                    "{:.p$} {:.p$} {:.p$}",
                    load.one,
                    load.five,
                    load.fifteen,
                    p = precision
                ))
            }
        }
    }
}

/// `<h>h <m>m`
pub(crate) fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

/// 负载的小数位数, 默认两位
fn load_precision(argument: Option<&str>) -> Result<usize, ProbeError> {
    match argument {
        None | Some("") => Ok(2),
        Some(arg) => arg
            .parse::<usize>()
            .ok()
            .filter(|precision| *precision <= 6)
            .ok_or_else(|| ProbeError::parse("load average precision", arg)),
    }
}
