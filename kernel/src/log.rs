use log::{Level, LevelFilter, Metadata, Record};

use crate::serial_println;
use crate::time::uptime_ms;

/// Install the serial logger. Later calls keep the first logger.
pub(crate) fn init() {
    if log::set_logger(&SerialLogger).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

pub struct SerialLogger;

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() < Level::Trace || metadata.target().starts_with("kernel")
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let color = match record.level() {
                Level::Error => "\x1b[1;31m",
                Level::Warn => "\x1b[1;33m",
                Level::Info => "\x1b[1;94m",
                Level::Debug => "\x1b[1;30m",
                Level::Trace => "\x1b[1;90m",
            };

            let ms = uptime_ms();
            serial_println!(
                "{}{:5}\x1b[0m {:>5}.{:03} [{}] {}",
                color,
                record.level(),
                ms / 1000,
                ms % 1000,
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        // Polled console, nothing buffered
    }
}
