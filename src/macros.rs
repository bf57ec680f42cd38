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

//! Logging macros.
//!
//! Two call styles are offered. The format-string macros (`log!`, `info!`, ...) take `format!`
//! arguments. The stream macros (`logs!`, `infos!`, ...) concatenate the `Display` output of
//! each argument in order.
//!
//! A logger is given as a [`Log`](crate::Log) or as a logger name. The level macros use the
//! default logger unless a `logger: <expr>,` prefix selects one. Arguments are only evaluated
//! when the level is enabled. Errors returned by appenders, and `Display` implementations that
//! fail, are handed to the [trap](crate::trap), since a macro has no caller to return them to.

use std::borrow::Cow;

use crate::Log;

/// Anything a macro accepts as a logger: a [`Log`] or a logger name.
///
/// An empty name selects the default logger.
pub trait AsLog {
    /// Resolve to a logger.
    fn as_log(&self) -> Cow<'_, Log>;
}

impl AsLog for Log {
    fn as_log(&self) -> Cow<'_, Log> {
        Cow::Borrowed(self)
    }
}

impl AsLog for str {
    fn as_log(&self) -> Cow<'_, Log> {
        Cow::Owned(Log::get(self))
    }
}

impl AsLog for String {
    fn as_log(&self) -> Cow<'_, Log> {
        Cow::Owned(Log::get(self))
    }
}

impl<T: AsLog + ?Sized> AsLog for &T {
    fn as_log(&self) -> Cow<'_, Log> {
        (**self).as_log()
    }
}

/// The [`LocationInfo`](crate::LocationInfo) of the call site.
#[macro_export]
macro_rules! location {
    () => {
        $crate::LocationInfo::new(::std::file!(), ::std::module_path!(), ::std::line!())
    };
}

/// Log a formatted message at `level`.
///
/// # Examples
///
/// ```
/// use hierlog::Level;
/// use hierlog::Log;
///
/// hierlog::log!("app.db", Level::INFO, "connected to {}", "primary");
/// hierlog::log!(Log::root(), Level::from_int(25000), "between info and warn");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let selected = &$logger;
        let logger = $crate::AsLog::as_log(selected);
        let level: $crate::Level = $level;
        if logger.is_enabled_for(level) {
            if let ::std::result::Result::Err(err) =
                logger.log(level, $crate::location!(), ::std::format_args!($($arg)+))
            {
                $crate::trap::report(&err);
            }
        }
    }};
}

/// Log a message composed of `Display` parts at `level`.
///
/// # Examples
///
/// ```
/// use hierlog::Level;
///
/// let retries = 3;
/// hierlog::logs!("app.db", Level::WARN, "retrying ", retries, " times");
/// ```
#[macro_export]
macro_rules! logs {
    ($logger:expr, $level:expr, $($part:expr),+ $(,)?) => {{
        let selected = &$logger;
        let logger = $crate::AsLog::as_log(selected);
        let level: $crate::Level = $level;
        if logger.is_enabled_for(level) {
            let mut message = ::std::string::String::new();
            let mut written: ::std::fmt::Result = ::std::result::Result::Ok(());
            $(
                if written.is_ok() {
                    written = ::std::fmt::Write::write_fmt(
                        &mut message,
                        ::std::format_args!("{}", $part),
                    );
                }
            )+
            let result = match written {
                ::std::result::Result::Ok(()) => {
                    logger.log_msg(level, $crate::location!(), &message)
                }
                ::std::result::Result::Err(err) => {
                    ::std::result::Result::Err($crate::Error::from_fmt_error(err))
                }
            };
            if let ::std::result::Result::Err(err) = result {
                $crate::trap::report(&err);
            }
        }
    }};
}

macro_rules! define_level_macros {
    ($d:tt $level:ident, $format:ident, $stream:ident) => {
        #[doc = concat!("Log a formatted message at [`Level::", stringify!($level), "`](crate::Level::", stringify!($level), ").")]
        ///
        /// Uses the default logger unless a `logger: <expr>,` prefix is given.
        #[macro_export]
        macro_rules! $format {
            (logger: $d logger:expr, $d ($d arg:tt)+) => {
                $crate::log!($d logger, $crate::Level::$level, $d ($d arg)+)
            };
            ($d ($d arg:tt)+) => {
                $crate::log!($crate::default_logger(), $crate::Level::$level, $d ($d arg)+)
            };
        }

        #[doc = concat!("Log a message composed of `Display` parts at [`Level::", stringify!($level), "`](crate::Level::", stringify!($level), ").")]
        ///
        /// Uses the default logger unless a `logger: <expr>,` prefix is given.
        #[macro_export]
        macro_rules! $stream {
            (logger: $d logger:expr, $d ($d part:expr),+ $d (,)?) => {
                $crate::logs!($d logger, $crate::Level::$level, $d ($d part),+)
            };
            ($d ($d part:expr),+ $d (,)?) => {
                $crate::logs!($crate::default_logger(), $crate::Level::$level, $d ($d part),+)
            };
        }
    };
}

define_level_macros!($ TRACE, trace, traces);
define_level_macros!($ DEBUG, debug, debugs);
define_level_macros!($ INFO, info, infos);
define_level_macros!($ WARN, warn, warns);
define_level_macros!($ ERROR, error, errors);
define_level_macros!($ FATAL, fatal, fatals);
