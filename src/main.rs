mod cli;
mod datasource;
mod model;
mod utils;

use std::process;

use anyhow::Result;
use clap::{CommandFactory, Parser, error::ErrorKind};
use log::{error, info};

use crate::{
    cli::Cli,
    datasource::{
        config_parser::{RawConfig, config_read},
        nvml::{NvmlGpu, device_count, nvml_init, nvml_shutdown},
    },
    model::{
        controller_config::ControllerConfig,
        scheduler::{Scheduler, probe_devices},
    },
    utils::{
        constants::{NOTES, VERSION},
        logger::init_logger,
        shutdown::ShutdownToken,
    },
};

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                e.print()?;
                return Ok(());
            }
            _ => {
                let _ = e.print();
                process::exit(1);
            }
        },
    };

    init_logger(cli.verbose)?;

    let file_config = match &cli.config {
        Some(path) => config_read(path)?,
        None => RawConfig::default(),
    };

    let config = match ControllerConfig::try_from(cli.overrides().merge(file_config)) {
        Ok(config) => config,
        Err(e) => {
            println!("Error: {}", e);
            Cli::command().print_help()?;
            process::exit(1);
        }
    };

    info!("{} {} starting", NOTES, VERSION);

    if let Err(e) = run(config) {
        error!("{:#}", e);
        process::exit(1);
    }

    Ok(())
}

fn run(config: ControllerConfig) -> Result<()> {
    let shutdown = ShutdownToken::new();
    shutdown.install_signal_handler()?;

    let nvml = nvml_init()?;

    let count = device_count(&nvml)?;
    info!("Found {} GPU(s)", count);

    info!("Initializing GPU(s)");
    let candidates = (0..count).map(|index| (index, NvmlGpu::open(&nvml, index)));
    let controllers = probe_devices(candidates, &config);

    Scheduler::new(controllers, &config, shutdown)?.run();

    nvml_shutdown(nvml)
}
