use colored::Colorize;
use log::{Level, LevelFilter};
use std::sync::OnceLock;

/// Environment variable holding the maximum level, e.g. `CREWDECK_LOG=debug`.
pub const LOG_LEVEL_ENV: &str = "CREWDECK_LOG";

#[derive(Clone)]
pub struct Logger {
  level: Level,
}

impl Logger {
  pub fn new(level: Level) -> Self {
    Logger { level }
  }
}

impl log::Log for Logger {
  fn enabled(&self, metadata: &log::Metadata) -> bool {
    metadata.level() <= self.level
  }

  fn log(&self, record: &log::Record) {
    if !self.enabled(record.metadata()) {
      return;
    }

    let time = chrono::Local::now()
      .format("%Y-%m-%d %H:%M:%S%.3f")
      .to_string()
      .magenta();

    let level = match record.level() {
      Level::Error => "ERROR".red(),
      Level::Warn => "WARN".yellow(),
      Level::Info => "INFO".green(),
      Level::Debug => "DEBUG".blue(),
      Level::Trace => "TRACE".dimmed(),
    };

    let target = record.target().cyan();

    println!("{} {} {} {}", time, level, target, record.args());
  }

  fn flush(&self) {}
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Installs the logger with the level from `CREWDECK_LOG`, falling back to `info`.
pub fn init_logger() {
  let level = std::env::var(LOG_LEVEL_ENV)
    .ok()
    .and_then(|value| parse_level(&value))
    .unwrap_or(Level::Info);

  init_logger_with_level(level);
}

/// Installs the logger once per process. Later calls are ignored.
pub fn init_logger_with_level(level: Level) {
  if LOGGER.get().is_some() {
    return;
  }

  let logger = LOGGER.get_or_init(|| Logger::new(level));

  // Another logger may already be installed by the host application.
  if log::set_logger(logger).is_ok() {
    log::set_max_level(level.to_level_filter());
  }
}

fn parse_level(value: &str) -> Option<Level> {
  match value.parse::<LevelFilter>().ok()? {
    LevelFilter::Off => None,
    filter => filter.to_level(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_known_levels() {
    assert_eq!(parse_level("debug"), Some(Level::Debug));
    assert_eq!(parse_level("WARN"), Some(Level::Warn));
    assert_eq!(parse_level("off"), None);
    assert_eq!(parse_level("loud"), None);
  }

  #[test]
  fn init_twice_is_noop() {
    init_logger_with_level(Level::Trace);
    init_logger_with_level(Level::Error);

    log::trace!("logger installed");
    assert!(LOGGER.get().is_some());
  }
}
