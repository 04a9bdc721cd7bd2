//! 单文件传感器: 温度、熵池、目录文件数

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;

use super::{read_number, required, Probe, Sample};

const ENTROPY_AVAIL: &str = "/proc/sys/kernel/random/entropy_avail";

/// `temp`: 参数为传感器文件, 单位为千分之一摄氏度
#[derive(Debug)]
pub struct Temperature;

impl Probe for Temperature {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let file = Path::new(required(argument)?);
        let millidegrees: i64 = read_number(file, "temperature")?;
        Ok((millidegrees / 1000).to_string())
    }
}

#[derive(Debug)]
pub struct Entropy {
    path: PathBuf,
}

impl Default for Entropy {
    fn default() -> Self {
        Self { path: PathBuf::from(ENTROPY_AVAIL) }
    }
}

impl Probe for Entropy {
    fn sample(&mut self, _argument: Option<&str>) -> Sample {
        let available: u64 = read_number(&self.path, "entropy")?;
        Ok(available.to_string())
    }
}

/// `num_files`: 目录下不以 `.` 开头的条目数
#[derive(Debug)]
pub struct NumFiles;

impl Probe for NumFiles {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let dir = Path::new(required(argument)?);
        let entries = fs::read_dir(dir).map_err(|err| ProbeError::io(dir, err))?;

        let mut count = 0usize;
        for entry in entries {
            let entry = entry.map_err(|err| ProbeError::io(dir, err))?;
            if !entry.file_name().to_string_lossy().starts_with('.') {
                count += 1;
            }
        }
        Ok(count.to_string())
    }
}
