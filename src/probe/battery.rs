//! 电池: 读取 `/sys/class/power_supply/<name>/*`

use std::path::PathBuf;

use super::{read_number, read_trimmed, required, Probe, Sample};

const POWER_SUPPLY: &str = "/sys/class/power_supply";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryField {
    /// 电量百分比
    Capacity,
    /// 当前功率(W)
    Power,
    /// 充放电状态符号
    State,
}

#[derive(Debug)]
pub struct Battery {
    root: PathBuf,
    field: BatteryField,
}

impl Battery {
    pub fn new(field: BatteryField) -> Self {
        Self::with_root(POWER_SUPPLY, field)
    }

    pub fn with_root(root: impl Into<PathBuf>, field: BatteryField) -> Self {
        Self { root: root.into(), field }
    }
}

impl Probe for Battery {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let dir = self.root.join(required(argument)?);
        match self.field {
            BatteryField::Capacity => {
                let perc: u32 = read_number(&dir.join("capacity"), "battery capacity")?;
                Ok(perc.to_string())
            }
            BatteryField::Power => {
                let micro_watts: u64 = read_number(&dir.join("power_now"), "battery power")?;
                Ok((micro_watts.saturating_add(500_000) / 1_000_000).to_string())
            }
            BatteryField::State => {
                let status = read_trimmed(&dir.join("status"))?;
                Ok(state_symbol(&status).to_string())
            }
        }
    }
}

fn state_symbol(status: &str) -> &'static str {
    match status {
        "Charging" => "+",
        "Discharging" => "-",
        "Full" => "=",
        "Unknown" | "Not charging" => "/",
        _ => "?",
    }
}
