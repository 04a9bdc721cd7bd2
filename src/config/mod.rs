//! 状态栏配置
//!
//! 可以通过 `--config` 指定 JSON 文件, 否则使用内置的默认表。
//! 配置只在启动时读取一次, 之后 provider 表不再变化。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bar::{Provider, ProviderTable, Renderer, Template};
use crate::error::{Error, Result};
use crate::probe::ProbeKind;

/// 没有值时显示的文字
pub const UNKNOWN_TEXT: &str = "n/a";
/// 输出缓冲区大小(包括结尾)
pub const MAX_LEN: usize = 2048;
/// 刷新间隔(毫秒)
pub const INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BarConfig {
    pub interval_ms: u64,
    pub unknown: String,
    pub max_len: usize,
    pub providers: Vec<ProviderConfig>,
}

/// 一列: 探针名、模板、参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub probe: String,
    pub format: String,
    #[serde(default)]
    pub argument: Option<String>,
}

impl ProviderConfig {
    fn new(probe: &str, format: &str, argument: Option<&str>) -> Self {
        Self {
            probe: probe.to_string(),
            format: format.to_string(),
            argument: argument.map(str::to_string),
        }
    }
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            interval_ms: INTERVAL_MS,
            unknown: UNKNOWN_TEXT.to_string(),
            max_len: MAX_LEN,
            providers: vec![
                ProviderConfig::new("cpu_perc", "cpu %3s%% | ", None),
                ProviderConfig::new("ram_perc", "ram %3s%% | ", None),
                ProviderConfig::new("disk_perc", "/ %3s%% | ", Some("/")),
                ProviderConfig::new("battery_perc", "bat %3s%% | ", Some("BAT0")),
                ProviderConfig::new("datetime", "%s", Some("%F %T")),
            ],
        }
    }
}

impl BarConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let to_config_error = |reason: String| Error::Config {
            path: path.to_path_buf(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|err| to_config_error(err.to_string()))?;
        serde_json::from_str(&content).map_err(|err| to_config_error(err.to_string()))
    }

    pub fn interval(&self) -> Result<Duration> {
        if self.interval_ms == 0 {
            return Err(Error::Setting("interval_ms must be at least 1".to_string()));
        }
        Ok(Duration::from_millis(self.interval_ms))
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.unknown.clone(), self.max_len)
    }

    /// 解析探针名和模板, 任何一项无效都是启动错误
    pub fn build_table(&self) -> Result<ProviderTable> {
        let providers = self
            .providers
            .iter()
            .map(|entry| -> Result<Provider> {
                let kind: ProbeKind = entry.probe.parse()?;
                let template = Template::parse(&entry.format)?;
                Ok(Provider::new(kind.name(), kind.build(), template, entry.argument.clone()))
            })
            .collect::<Result<Vec<Provider>>>()?;
        Ok(ProviderTable::new(providers))
    }
}

impl std::str::FromStr for BarConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_table_is_valid() {
        let config = BarConfig::default();
        let table = config.build_table().unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.entries()[0].name(), "cpu_perc");
        assert_eq!(table.entries()[2].argument(), Some("/"));
        assert_eq!(config.interval().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn sample_config_is_valid() {
        let config: BarConfig = include_str!("../../statbar.json").parse().unwrap();
        assert_eq!(config.interval().unwrap(), Duration::from_millis(1500));
        assert_eq!(config.build_table().unwrap().len(), 8);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: BarConfig = r#"{ "unknown": "<?>" }"#.parse().unwrap();
        assert_eq!(config.unknown, "<?>");
        assert_eq!(config.max_len, MAX_LEN);
        assert_eq!(config.providers, BarConfig::default().providers);
    }

    #[test]
    fn literal_table_renders() {
        let config: BarConfig = r#"{
            "max_len": 64,
            "unknown": "<?>",
            "providers": [
                { "probe": "literal", "format": "[%s]", "argument": "a" },
                { "probe": "literal", "format": " %s" }
            ]
        }"#
        .parse()
        .unwrap();
        let mut table = config.build_table().unwrap();
        assert_eq!(config.renderer().render(&mut table), "[a] <?>");
    }

    #[test]
    fn unknown_probe_is_rejected() {
        let config: BarConfig = r#"{ "providers": [ { "probe": "vol_perc", "format": "%s" } ] }"#.parse().unwrap();
        assert!(matches!(config.build_table(), Err(Error::UnknownProbe(_))));
    }

    #[test]
    fn bad_template_is_rejected() {
        let config: BarConfig = r#"{ "providers": [ { "probe": "uid", "format": "%d" } ] }"#.parse().unwrap();
        assert!(matches!(config.build_table(), Err(Error::Template { .. })));
    }

    #[test]
    fn unknown_keys_and_zero_interval_are_rejected() {
        assert!(matches!("{ \"colour\": 1 }".parse::<BarConfig>(), Err(Error::Json(_))));
        let config: BarConfig = "{ \"interval_ms\": 0 }".parse().unwrap();
        assert!(matches!(config.interval(), Err(Error::Setting(_))));
    }

    #[test]
    fn load_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        match BarConfig::load(file.path()) {
            Err(Error::Config { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("unexpected {:?}", other),
        }

        let missing = file.path().with_extension("absent");
        assert!(matches!(BarConfig::load(&missing), Err(Error::Config { .. })));
    }
}
