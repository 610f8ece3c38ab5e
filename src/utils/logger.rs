use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;

// Console logger: debug/info on stdout, warnings and errors on stderr
struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        match record.level() {
            Level::Error | Level::Warn => {
                eprintln!("[{}][{}]: {}", timestamp, record.level(), record.args())
            }
            _ => println!("[{}][{}]: {}", timestamp, record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

// Global logger instance
static LOGGER: Lazy<ConsoleLogger> = Lazy::new(|| ConsoleLogger);

/// Maps the repeatable `-v` count to a max level.
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init_logger(verbosity: u8) -> Result<()> {
    let log_level = level_for_verbosity(verbosity);

    log::set_logger(&*LOGGER)
        .map(|()| log::set_max_level(log_level))
        .with_context(|| "Failed to set logger")?;

    log::debug!("Logger initialized with level: {}", log_level);

    Ok(())
}
