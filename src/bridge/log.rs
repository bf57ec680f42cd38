// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bridges to and from the [`log`] crate.
//!
//! * [`LogCrate`] lets a [`BridgeAppender`](super::BridgeAppender) hand hierlog records to the
//!   logger installed in the `log` crate.
//! * [`setup_log_crate`] installs a `log` crate logger that turns `log` records into hierlog
//!   messages.
//!
//! Both directions can be active at once. A `log` record produced while a bridge appender is
//! forwarding on the same thread is written to stderr with a `(fallback)` marker instead of
//! going round in circles.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::Error;
use crate::Level;
use crate::LocationInfo;
use crate::Log;
use crate::bridge::BridgeAppender;
use crate::bridge::ForeignLogging;
use crate::bridge::ForeignRecord;
use crate::bridge::is_forwarding;
use crate::repository::ROOT_LOGGER_NAME;
use crate::trap;

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Level::ERROR,
            log::Level::Warn => Level::WARN,
            log::Level::Info => Level::INFO,
            log::Level::Debug => Level::DEBUG,
            log::Level::Trace => Level::TRACE,
        }
    }
}

/// Map a level in the coarse numbering of [`Level::to_foreign_level`] onto a `log` crate level.
pub fn to_log_level(level: i32) -> log::Level {
    match level {
        i32::MIN..10 => log::Level::Trace,
        10..20 => log::Level::Debug,
        20..30 => log::Level::Info,
        30..40 => log::Level::Warn,
        _ => log::Level::Error,
    }
}

/// The [`ForeignLogging`] port of the `log` crate.
///
/// Logger names become targets with `.` replaced by `::`. The `log` crate has no global lock of
/// its own, so calls are serialized on a lock held by this value.
#[derive(Debug, Default)]
pub struct LogCrate {
    lock: Mutex<()>,
}

impl ForeignLogging for LogCrate {
    type Logger = Arc<str>;
    type Guard<'a> = MutexGuard<'a, ()>;

    fn acquire(&self) -> Self::Guard<'_> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_logger(&self, _guard: &Self::Guard<'_>, name: &str) -> Result<Arc<str>, Error> {
        Ok(Arc::from(name.replace('.', "::")))
    }

    fn is_enabled(
        &self,
        _guard: &Self::Guard<'_>,
        target: &Arc<str>,
        level: i32,
    ) -> Result<bool, Error> {
        let level = to_log_level(level);
        if level > log::max_level() {
            return Ok(false);
        }
        let metadata = log::Metadata::builder().level(level).target(target).build();
        Ok(log::logger().enabled(&metadata))
    }

    fn emit(
        &self,
        _guard: &Self::Guard<'_>,
        target: &Arc<str>,
        record: &ForeignRecord<'_>,
    ) -> Result<(), Error> {
        let attributes: &[(&str, &str)] = record.attributes();
        log::logger().log(
            &log::Record::builder()
                .args(format_args!("{}", record.message()))
                .level(to_log_level(record.level()))
                .target(target)
                .module_path(Some(record.function()))
                .file(Some(record.file()))
                .line(Some(record.line()))
                .key_values(&attributes)
                .build(),
        );
        Ok(())
    }
}

/// A [`BridgeAppender`] forwarding into the `log` crate.
pub type LogCrateAppender = BridgeAppender<LogCrate>;

/// Create a [`LogCrateAppender`].
pub fn log_crate_appender() -> Result<LogCrateAppender, Error> {
    BridgeAppender::new(LogCrate::default())
}

struct LogCrateLogger(());

fn logger_name(target: &str) -> String {
    target.replace("::", ".")
}

fn resolve(target: &str) -> Log {
    if target == ROOT_LOGGER_NAME {
        Log::root()
    } else {
        Log::get(&logger_name(target))
    }
}

impl log::Log for LogCrateLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        resolve(metadata.target()).is_enabled_for(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        if is_forwarding() {
            eprintln!(
                "{} {} (fallback): {}",
                record.target(),
                record.level(),
                record.args()
            );
            return;
        }

        let logger = resolve(record.target());
        let location = LocationInfo::new(
            record.file().unwrap_or_default(),
            record.module_path().unwrap_or_default(),
            record.line().unwrap_or_default(),
        );
        if let Err(err) = logger.log(record.level().into(), location, *record.args()) {
            trap::report(&err);
        }
    }

    fn flush(&self) {
        if let Err(err) = crate::default_logger().repository().flush() {
            trap::report(&err);
        }
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_logger`] to set up a `LogCrateLogger` and all logs from log
/// crate will be forwarded to hierlog. The record target names the logger, with `::` read as
/// the hierarchy separator; an empty target means the default logger.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    static LOGGER: LogCrateLogger = LogCrateLogger(());
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// Same as [`try_setup_log_crate`], but panics instead of returning an error.
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// hierlog::bridge::log::setup_log_crate();
/// log::info!(target: "app::db", "connected");
/// ```
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "hierlog::bridge::log::setup_log_crate must be called before the log crate global logger initialized",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_translation() {
        assert_eq!(to_log_level(Level::TRACE.to_foreign_level()), log::Level::Trace);
        assert_eq!(to_log_level(Level::DEBUG.to_foreign_level()), log::Level::Debug);
        assert_eq!(to_log_level(Level::INFO.to_foreign_level()), log::Level::Info);
        assert_eq!(to_log_level(Level::WARN.to_foreign_level()), log::Level::Warn);
        assert_eq!(to_log_level(Level::ERROR.to_foreign_level()), log::Level::Error);
        assert_eq!(to_log_level(Level::FATAL.to_foreign_level()), log::Level::Error);
        assert_eq!(Level::from(log::Level::Warn), Level::WARN);
    }

    #[test]
    fn test_logger_names() {
        assert_eq!(logger_name("app::db"), "app.db");
        assert_eq!(logger_name(""), "");
    }
}
