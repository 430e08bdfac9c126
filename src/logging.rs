//! `log` backend for the browser console.
//!
//! Engine code only talks to the `log` facade. In the browser build,
//! [`init`] routes records to `console.log` / `console.warn` / `console.error`;
//! native hosts install whatever `log` implementation they like instead.

use log::{Level, LevelFilter, Log, Metadata, Record};

/// Forwards log records to the browser console.
pub struct ConsoleLogger {
    level: Level,
}

impl ConsoleLogger {
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Console line for a record, e.g. `"[WARN bakery_idle::bakery::save] slot is corrupt"`.
    pub fn format_record(record: &Record) -> String {
        format!("[{} {}] {}", record.level(), record.target(), record.args())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format_record(record);
        #[cfg(target_arch = "wasm32")]
        match record.level() {
            Level::Error => web_sys::console::error_1(&line.as_str().into()),
            Level::Warn => web_sys::console::warn_1(&line.as_str().into()),
            _ => web_sys::console::log_1(&line.as_str().into()),
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            // Native hosts normally install their own logger; keep the record visible anyway.
            eprintln!("{line}");
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger::new(Level::Info);

/// Install the console logger. Safe to call more than once; later calls are ignored.
pub fn init() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}
