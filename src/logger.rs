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

//! The logger facade.

use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::Level;
use crate::LocationInfo;
use crate::context::SEPARATOR;
use crate::init::default_context;
use crate::mdc_init::ensure_thread_initialized;
use crate::record::Record;
use crate::repository::LoggerNode;
use crate::repository::Repository;

/// A cheap handle to a named logger.
///
/// The logger tree owns the node; a `Log` only references it, so two handles for the same
/// name always observe the same level and appenders.
#[derive(Clone)]
pub struct Log {
    repository: Repository,
    node: Arc<LoggerNode>,
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Log").field(&self.node.name()).finish()
    }
}

impl PartialEq for Log {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl Eq for Log {}

impl Log {
    pub(crate) fn from_node(repository: Repository, node: Arc<LoggerNode>) -> Self {
        Self { repository, node }
    }

    /// The logger called `name` in the process-wide repository.
    ///
    /// The empty name designates the current default logger, see [`default_logger`].
    pub fn get(name: &str) -> Log {
        let context = default_context();
        if name.is_empty() {
            return context.current();
        }
        let repository = context.repository();
        Log::from_node(repository.clone(), repository.logger(name))
    }

    /// The root logger of the process-wide repository.
    pub fn root() -> Log {
        let repository = default_context().repository();
        Log::from_node(repository.clone(), repository.root())
    }

    /// The logger called `name` in `repository`; the empty name designates its root logger.
    pub fn in_repository(repository: &Repository, name: &str) -> Log {
        Log::from_node(repository.clone(), repository.logger(name))
    }

    /// The logger name; empty for the root logger.
    pub fn name(&self) -> &str {
        if self.node.is_root() {
            ""
        } else {
            self.node.name()
        }
    }

    /// The name records carry, which is `"root"` for the root logger.
    pub fn full_name(&self) -> &str {
        self.node.name()
    }

    /// Whether this is the root logger.
    pub fn is_root(&self) -> bool {
        self.node.is_root()
    }

    /// The underlying node of the logger tree.
    pub fn node(&self) -> &Arc<LoggerNode> {
        &self.node
    }

    /// The repository this logger lives in.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// The parent logger, `None` for the root logger.
    pub fn parent(&self) -> Option<Log> {
        self.repository
            .parent(&self.node)
            .map(|node| Log::from_node(self.repository.clone(), node))
    }

    /// A descendant of this logger.
    ///
    /// `suffix` is appended with a separator; an empty suffix returns this logger.
    ///
    /// # Examples
    ///
    /// ```
    /// use hierlog::Log;
    ///
    /// let child = Log::get("a").child("b.c");
    /// assert_eq!(child.name(), "a.b.c");
    /// assert_eq!(Log::root().child("b").name(), "b");
    /// ```
    pub fn child(&self, suffix: &str) -> Log {
        if suffix.is_empty() {
            return self.clone();
        }
        let name = if self.is_root() {
            suffix.to_string()
        } else {
            format!("{}{SEPARATOR}{suffix}", self.name())
        };
        Log::in_repository(&self.repository, &name)
    }

    /// The level assigned to this logger, `None` if it inherits from its ancestors.
    pub fn level(&self) -> Option<Level> {
        self.node.level()
    }

    /// Assign a level, or clear it with `None` so that it is inherited again.
    ///
    /// The root logger always keeps a level; clearing it is ignored.
    pub fn set_level(&self, level: impl Into<Option<Level>>) {
        self.node.set_level(level.into());
    }

    /// The level this logger filters with, inherited if it has none of its own.
    pub fn effective_level(&self) -> Level {
        self.node.effective_level()
    }

    /// Whether a message at `level` would be forwarded to the appenders.
    #[inline]
    pub fn is_enabled_for(&self, level: Level) -> bool {
        self.repository.is_enabled_for(&self.node, level)
    }

    /// Whether [`Level::TRACE`] messages are enabled.
    pub fn is_trace_enabled(&self) -> bool {
        self.is_enabled_for(Level::TRACE)
    }

    /// Whether [`Level::DEBUG`] messages are enabled.
    pub fn is_debug_enabled(&self) -> bool {
        self.is_enabled_for(Level::DEBUG)
    }

    /// Whether [`Level::INFO`] messages are enabled.
    pub fn is_info_enabled(&self) -> bool {
        self.is_enabled_for(Level::INFO)
    }

    /// Whether [`Level::WARN`] messages are enabled.
    pub fn is_warn_enabled(&self) -> bool {
        self.is_enabled_for(Level::WARN)
    }

    /// Whether [`Level::ERROR`] messages are enabled.
    pub fn is_error_enabled(&self) -> bool {
        self.is_enabled_for(Level::ERROR)
    }

    /// Whether [`Level::FATAL`] messages are enabled.
    pub fn is_fatal_enabled(&self) -> bool {
        self.is_enabled_for(Level::FATAL)
    }

    /// Format `args` and log the result at `level`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an appender, e.g. a failure to forward the message to a
    /// bridged logging runtime.
    pub fn log(
        &self,
        level: Level,
        location: LocationInfo<'_>,
        args: fmt::Arguments<'_>,
    ) -> Result<(), Error> {
        if !self.is_enabled_for(level) {
            return Ok(());
        }
        match args.as_str() {
            Some(message) => self.forward(level, location, message),
            None => self.forward(level, location, &args.to_string()),
        }
    }

    /// Log an already composed message at `level`.
    ///
    /// # Errors
    ///
    /// Same as [`Log::log`].
    pub fn log_msg(
        &self,
        level: Level,
        location: LocationInfo<'_>,
        message: &str,
    ) -> Result<(), Error> {
        if !self.is_enabled_for(level) {
            return Ok(());
        }
        self.forward(level, location, message)
    }

    fn forward(&self, level: Level, location: LocationInfo<'_>, message: &str) -> Result<(), Error> {
        ensure_thread_initialized();
        let record = Record::new(self.node.name(), level, message, location);
        self.repository.forced_log(&self.node, &record)
    }
}

/// The logger used when a call site names none.
///
/// The first call configures the process, see [`configure`](crate::configure).
pub fn default_logger() -> Log {
    default_context().current()
}

/// The name of the current default logger; empty for the root logger.
pub fn default_logger_name() -> String {
    default_context().current_name()
}

/// Append `name` to the default logger name.
///
/// # Errors
///
/// Returns an [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) error if `name`
/// is empty or contains a `.`; the default logger is unchanged then.
pub fn push_context(name: &str) -> Result<(), Error> {
    default_context().push(name).map(|_| ())
}

/// Move the default logger to its parent. Does nothing at the root logger.
pub fn pop_context() {
    default_context().pop()
}

/// Sets a logger level and restores the previous one when dropped.
///
/// # Examples
///
/// ```
/// use hierlog::Level;
/// use hierlog::Log;
/// use hierlog::TemporaryLevel;
///
/// let log = Log::get("noisy.component");
/// {
///     let _quiet = TemporaryLevel::new(&log, Level::ERROR);
///     assert_eq!(log.level(), Some(Level::ERROR));
/// }
/// assert_eq!(log.level(), None);
/// ```
#[derive(Debug)]
#[must_use = "the previous level is restored as soon as the guard is dropped"]
pub struct TemporaryLevel {
    log: Log,
    previous: Option<Level>,
}

impl TemporaryLevel {
    /// Set the level of `log` until the guard is dropped.
    pub fn new(log: &Log, level: Level) -> Self {
        let previous = log.level();
        log.set_level(level);
        Self {
            log: log.clone(),
            previous,
        }
    }
}

impl Drop for TemporaryLevel {
    fn drop(&mut self) {
        self.log.set_level(self.previous);
    }
}

/// Enable trace loggers `TRACE0.<name>` through `TRACE<number>.<name>`.
///
/// Loggers `TRACE{i}.<name>` for `i` in `0..6` are set to [`Level::DEBUG`] when `i <= number`
/// and to [`Level::INFO`] otherwise.
pub fn trace_set_at(name: &str, number: i32) {
    for i in 0..6 {
        let level = if i > number { Level::INFO } else { Level::DEBUG };
        Log::get(&format!("TRACE{i}{SEPARATOR}{name}")).set_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::append::Memory;

    #[test]
    fn test_level_checks() {
        let repository = Repository::new();
        let log = Log::in_repository(&repository, "svc");
        log.set_level(Level::INFO);

        assert!(!log.is_trace_enabled());
        assert!(!log.is_debug_enabled());
        assert!(log.is_info_enabled());
        assert!(log.is_warn_enabled());
        assert!(log.is_error_enabled());
        assert!(log.is_fatal_enabled());

        log.set_level(None);
        assert_eq!(log.level(), None);
        assert_eq!(log.effective_level(), Level::DEBUG);
    }

    #[test]
    fn test_messages_below_threshold_are_not_forwarded() {
        let repository = Repository::new();
        let memory = Memory::default();
        repository.root().add_appender(memory.clone());
        let log = Log::in_repository(&repository, "svc");
        log.set_level(Level::INFO);

        let location = LocationInfo::new(file!(), module_path!(), line!());
        log.log_msg(Level::DEBUG, location, "hidden").unwrap();
        log.log(Level::WARN, location, format_args!("shown {}", 1)).unwrap();
        log.log_msg(Level::INFO, location, "shown 2").unwrap();

        assert_eq!(memory.lines(), vec!["WARN - shown 1\n", "INFO - shown 2\n"]);
    }

    #[test]
    fn test_names_and_children() {
        let repository = Repository::new();
        let root = Log::in_repository(&repository, "");
        assert!(root.is_root());
        assert_eq!(root.name(), "");
        assert_eq!(root.full_name(), "root");

        let child = root.child("a").child("b");
        assert_eq!(child.name(), "a.b");
        assert_eq!(child.child(""), child);
        assert_eq!(child.parent().unwrap().name(), "a");
        assert_eq!(child, Log::in_repository(&repository, "a.b"));
    }
}
