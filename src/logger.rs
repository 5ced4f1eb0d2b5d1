use colored::Colorize;
use log::{Level, Metadata, Record};

pub struct Logger;

pub static LOGGER: Logger = Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => eprintln!("{} {}", "❌ Error:".red().bold(), record.args()),
            Level::Warn => eprintln!("{} {}", "⚠️ Warning:".yellow().bold(), record.args()),
            Level::Info => println!("{}", record.args()),
            Level::Debug => eprintln!("{} {}", "Debug:".blue().bold(), record.args()),
            Level::Trace => eprintln!("{} {}", "Trace:".purple().bold(), record.args()),
        }
    }

    fn flush(&self) {}
}
