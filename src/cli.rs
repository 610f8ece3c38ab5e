use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::datasource::config_parser::RawConfig;

#[derive(Debug, Parser)]
#[command(name = "powermizer")]
#[command(version, about = "Utilization-driven memory clock governor for NVIDIA GPUs")]
pub struct Cli {
    /// Set the utilization threshold to boost power state
    #[arg(short = 'b', long = "boost", value_name = "UTIL")]
    pub boost: Option<u32>,

    /// Set the utilization threshold to lower power state
    #[arg(short = 'l', long = "low-power", value_name = "UTIL")]
    pub low_power: Option<u32>,

    /// Set the time to boost power state
    #[arg(short = 'B', long = "boost-time", value_name = "MS")]
    pub boost_time: Option<u64>,

    /// Set the time to lower power state
    #[arg(short = 'L', long = "low-power-time", value_name = "MS")]
    pub low_power_time: Option<u64>,

    /// Enable encoder and decoder utilization
    #[arg(short = 'c', long = "coder")]
    pub coder: bool,

    /// Increase verbosity
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Read settings from a TOML file; command-line values take precedence
    #[arg(short = 'C', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Settings given on the command line, to be merged over the config file.
    pub fn overrides(&self) -> RawConfig {
        RawConfig {
            boost: self.boost,
            low_power: self.low_power,
            boost_time: self.boost_time,
            low_power_time: self.low_power_time,
            coder: self.coder.then_some(true),
        }
    }
}
