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

//! Levels, source locations and the log record handed to appenders.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;
use std::time::Instant;

use jiff::Timestamp;

use crate::Error;
use crate::diagnostic::Mdc;

static PROCESS_START: LazyLock<Instant> = LazyLock::new(Instant::now);

/// A numeric logging severity.
///
/// Named levels use the fixed values `TRACE=5000`, `DEBUG=10000`, `INFO=20000`, `WARN=30000`,
/// `ERROR=40000` and `FATAL=50000`. Any other integer is a valid level too and orders numerically
/// among the named ones.
///
/// A logger that has no level of its own reports `None` from [`Log::level`](crate::Log::level)
/// and inherits its threshold from the closest ancestor that has one.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(i32);

impl Level {
    /// Threshold enabling every level.
    pub const ALL: Level = Level(i32::MIN);
    /// The "trace" level.
    pub const TRACE: Level = Level(5000);
    /// The "debug" level.
    pub const DEBUG: Level = Level(10000);
    /// The "info" level.
    pub const INFO: Level = Level(20000);
    /// The "warn" level.
    pub const WARN: Level = Level(30000);
    /// The "error" level.
    pub const ERROR: Level = Level(40000);
    /// The "fatal" level.
    pub const FATAL: Level = Level(50000);
    /// Threshold disabling every level.
    pub const OFF: Level = Level(i32::MAX);

    /// Convert an integer to a level.
    pub const fn from_int(value: i32) -> Level {
        Level(value)
    }

    /// The integer value of this level.
    pub const fn to_int(self) -> i32 {
        self.0
    }

    /// The canonical name of a named level.
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            i32::MIN => Some("ALL"),
            5000 => Some("TRACE"),
            10000 => Some("DEBUG"),
            20000 => Some("INFO"),
            30000 => Some("WARN"),
            40000 => Some("ERROR"),
            50000 => Some("FATAL"),
            i32::MAX => Some("OFF"),
            _ => None,
        }
    }

    /// Translate into the coarser numbering of the `log`/Python style ecosystems, where a level
    /// is this level divided by 1000 (`INFO` becomes 20).
    pub const fn to_foreign_level(self) -> i32 {
        self.0 / 1000
    }

    /// The inverse of [`Level::to_foreign_level`].
    pub const fn from_foreign_level(value: i32) -> Level {
        Level(value.saturating_mul(1000))
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Level({})", self.0),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.pad(name),
            None => f.pad(&self.0.to_string()),
        }
    }
}

impl From<i32> for Level {
    fn from(value: i32) -> Self {
        Level(value)
    }
}

impl From<Level> for i32 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        for level in [
            Level::ALL,
            Level::TRACE,
            Level::DEBUG,
            Level::INFO,
            Level::WARN,
            Level::ERROR,
            Level::FATAL,
            Level::OFF,
        ] {
            if let Some(name) = level.name() {
                if s.eq_ignore_ascii_case(name) {
                    return Ok(level);
                }
            }
        }
        if s.eq_ignore_ascii_case("WARNING") {
            return Ok(Level::WARN);
        }

        s.parse::<i32>()
            .map(Level)
            .map_err(|err| Error::config(format!("malformed level: {s}")).with_source(err))
    }
}

/// The source location of a log call.
///
/// Captured at the call site by [`location!`](crate::location) and never mutated afterwards.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationInfo<'a> {
    file: &'a str,
    function: &'a str,
    line: u32,
}

impl<'a> LocationInfo<'a> {
    /// Create a location from its parts.
    pub const fn new(file: &'a str, function: &'a str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }

    /// The source file, as given at the call site.
    pub const fn file(&self) -> &'a str {
        self.file
    }

    /// The final path component of [`file`](LocationInfo::file).
    pub fn filename(&self) -> &'a str {
        let file = self.file;
        match file.rfind(['/', '\\']) {
            Some(idx) => &file[idx + 1..],
            None => file,
        }
    }

    /// The function, or for Rust call sites the module path, that emitted the message.
    pub const fn function(&self) -> &'a str {
        self.function
    }

    /// The qualifier of [`function`](LocationInfo::function): everything before its last `::`.
    pub fn qualifier(&self) -> &'a str {
        let function = self.function;
        match function.rfind("::") {
            Some(idx) => &function[..idx],
            None => "",
        }
    }

    /// The line number.
    pub const fn line(&self) -> u32 {
        self.line
    }
}

/// A log event as seen by appenders and layouts.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    // the observed time
    now: Timestamp,
    uptime: Duration,

    // the metadata
    logger: &'a str,
    level: Level,
    location: LocationInfo<'a>,

    // the payload
    payload: Cow<'a, str>,

    // snapshot of the emitting thread's MDC
    mdc: BTreeMap<String, String>,
}

impl<'a> Record<'a> {
    /// Create a record observed now, snapshotting the calling thread's MDC.
    pub fn new(
        logger: &'a str,
        level: Level,
        payload: impl Into<Cow<'a, str>>,
        location: LocationInfo<'a>,
    ) -> Self {
        Self {
            now: Timestamp::now(),
            uptime: PROCESS_START.elapsed(),
            logger,
            level,
            location,
            payload: payload.into(),
            mdc: Mdc::snapshot(),
        }
    }

    /// Replace the MDC snapshot.
    pub fn with_mdc(mut self, mdc: BTreeMap<String, String>) -> Self {
        self.mdc = mdc;
        self
    }

    /// The observed time.
    pub fn time(&self) -> Timestamp {
        self.now
    }

    /// Time elapsed between the first record of the process and this one.
    pub fn uptime(&self) -> Duration {
        self.uptime
    }

    /// The name of the logger that emitted this record; `"root"` for the root logger.
    pub fn logger(&self) -> &'a str {
        self.logger
    }

    /// The severity of the message.
    pub fn level(&self) -> Level {
        self.level
    }

    /// The call site location.
    pub fn location(&self) -> &LocationInfo<'a> {
        &self.location
    }

    /// The message body.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The MDC entries of the emitting thread at the time of the call, ordered by key.
    pub fn mdc(&self) -> &BTreeMap<String, String> {
        &self.mdc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert!(Level::ALL < Level::TRACE);
        assert!(Level::TRACE < Level::DEBUG);
        assert!(Level::DEBUG < Level::INFO);
        assert!(Level::INFO < Level::WARN);
        assert!(Level::WARN < Level::ERROR);
        assert!(Level::ERROR < Level::FATAL);
        assert!(Level::FATAL < Level::OFF);
        assert!(Level::from(15000) > Level::DEBUG);
        assert!(Level::from(15000) < Level::INFO);
    }

    #[test]
    fn test_level_parse_and_display() {
        assert_eq!("info".parse::<Level>().unwrap(), Level::INFO);
        assert_eq!(" Warning ".parse::<Level>().unwrap(), Level::WARN);
        assert_eq!("12345".parse::<Level>().unwrap(), Level::from_int(12345));
        assert!("loud".parse::<Level>().is_err());

        assert_eq!(Level::FATAL.to_string(), "FATAL");
        assert_eq!(format!("{:<5}|", Level::INFO), "INFO |");
        assert_eq!(Level::from(12345).to_string(), "12345");
    }

    #[test]
    fn test_foreign_level_translation() {
        assert_eq!(Level::TRACE.to_foreign_level(), 5);
        assert_eq!(Level::WARN.to_foreign_level(), 30);
        assert_eq!(Level::from_foreign_level(40), Level::ERROR);
    }

    #[test]
    fn test_location_parts() {
        let loc = LocationInfo::new("src/app/main.rs", "app::server::run", 42);
        assert_eq!(loc.filename(), "main.rs");
        assert_eq!(loc.qualifier(), "app::server");
        assert_eq!(loc.line(), 42);

        let loc = LocationInfo::new("main.rs", "main", 1);
        assert_eq!(loc.filename(), "main.rs");
        assert_eq!(loc.qualifier(), "");
    }
}
