use std::io;

use clap::Parser;
use tracing::{debug, info};

use crate::cli::{Cli, OutputMode};
use crate::config::BarConfig;
use crate::error::Result;
use crate::publish::{Publisher, StreamPublisher, X11Publisher};
use crate::scheduler::{Scheduler, Shutdown};

mod bar;
mod cli;
mod config;
mod error;
mod logging;
mod probe;
mod publish;
mod scheduler;

fn main() {
    let cli = Cli::parse();
    logging::init();

    if let Err(err) = run(cli) {
        eprintln!("statbar: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mode = cli.output_mode()?;

    let mut config = match &cli.config {
        Some(path) => BarConfig::load(path)?,
        None => BarConfig::default(),
    };
    if let Some(interval_ms) = cli.interval {
        config.interval_ms = interval_ms;
    }

    let interval = config.interval()?;
    let table = config.build_table()?;
    debug!(providers = ?table.entries(), "provider table ready");

    let publisher: Box<dyn Publisher> = match mode {
        OutputMode::Stdout => Box::new(StreamPublisher::new(io::stdout())),
        OutputMode::Display(display) => Box::new(X11Publisher::connect(display.as_deref())?),
    };

    let shutdown = Shutdown::new();
    let mut scheduler = Scheduler::new(table, config.renderer(), publisher, interval, shutdown.clone());

    if cli.once {
        scheduler.tick()?;
        return Ok(());
    }

    shutdown.install_signal_handler()?;
    let ticks = scheduler.run()?;
    info!(ticks, "exiting");
    Ok(())
}
