//! Minimal stderr logger for the `log` facade.

use log::{Level, Log, Metadata, Record};

struct StderrLogger {
    level: Level,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the logger. `verbose` lowers the threshold from info to debug.
pub fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
    let level = if verbose { Level::Debug } else { Level::Info };
    log::set_boxed_logger(Box::new(StderrLogger { level }))?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}
