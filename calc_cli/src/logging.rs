use std::io::Write;

use log::{Level, Metadata, Record};

/// Writes `[LEVEL] message` lines to stderr so stdout stays clean for
/// results and `--json` output.
struct StderrLogger {
    level: Level,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = writeln!(
                std::io::stderr().lock(),
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Map `-v` occurrences to a level: warn, info, debug, then trace.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::Warn,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    }
}

pub fn init_logger(verbosity: u8) {
    let level = level_for(verbosity);
    // Keep the first logger if one is already installed.
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), Level::Warn);
        assert_eq!(level_for(1), Level::Info);
        assert_eq!(level_for(2), Level::Debug);
        assert_eq!(level_for(7), Level::Trace);
    }
}
