//! Logger minimal pour la CLI : une ligne par record sur stderr.
//!
//! Niveau lu dans `FAT12_LOG` (`error`, `warn`, `info`, `debug`, `trace`),
//! `warn` par défaut.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record};

/// Variable d’environnement qui fixe le niveau de log.
pub const LOG_ENV: &str = "FAT12_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{:5} [{}] {}", record.level(), record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Niveau demandé via l’environnement, `verbose` forçant au moins `debug`.
fn level_from_env(value: Option<&str>, verbose: bool) -> LevelFilter {
    let level = value
        .and_then(|v| v.trim().parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    if verbose {
        level.max(LevelFilter::Debug)
    } else {
        level
    }
}

pub fn init(verbose: bool) -> Result<(), log::SetLoggerError> {
    let env = std::env::var(LOG_ENV).ok();
    log::set_max_level(level_from_env(env.as_deref(), verbose));
    log::set_logger(&LOGGER)
}
