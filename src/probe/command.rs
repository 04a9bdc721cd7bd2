//! `run_command`: 执行 shell 命令, 取标准输出的第一行

use std::process::{Command, Stdio};

use crate::error::ProbeError;

use super::{required, Probe, Sample};

#[derive(Debug)]
pub struct RunCommand;

impl Probe for RunCommand {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let command = required(argument)?;
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(ProbeError::Command(format!("`{}` exited with {}", command, output.status)));
        }

        let content = String::from_utf8_lossy(&output.stdout);
        Ok(content.lines().next().unwrap_or_default().to_string())
    }
}
