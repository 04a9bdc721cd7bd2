use std::path::PathBuf;

use clap::Parser;

use crate::error::{Error, Result};

#[derive(Debug, Parser)]
#[command(name = "statbar")]
#[command(version)]
#[command(about = "Status line for the X root window or stdout")]
pub struct Cli {
    /// Write the status line to stdout instead of the X root window
    #[arg(short = 's', long)]
    pub stdout: bool,

    /// X display to publish to (defaults to $DISPLAY)
    #[arg(short = 'd', long, value_name = "NAME")]
    pub display: Option<String>,

    /// Render and publish a single line, then exit
    #[arg(short = '1', long)]
    pub once: bool,

    /// JSON bar configuration (built-in table when omitted)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Update interval in milliseconds, overrides the config file
    #[arg(short = 'i', long, value_name = "MS")]
    pub interval: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Stdout,
    Display(Option<String>),
}

impl Cli {
    /// `--stdout` 与 `--display` 互斥
    pub fn output_mode(&self) -> Result<OutputMode> {
        match (self.stdout, &self.display) {
            (true, Some(_)) => Err(Error::ConflictingOutputs),
            (true, None) => Ok(OutputMode::Stdout),
            (false, display) => Ok(OutputMode::Display(display.clone())),
        }
    }
}
