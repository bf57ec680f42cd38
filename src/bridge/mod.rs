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

//! Forwarding between hierlog and other logging runtimes.
//!
//! [`BridgeAppender`] hands records to a foreign runtime through the narrow [`ForeignLogging`]
//! port. With the `bridge-log` feature, [`log`] provides the port for the `log` crate and the
//! reverse direction, turning `log` crate records into hierlog messages.

use std::cell::Cell;
use std::fmt;

use crate::Error;

mod appender;
mod cache;
#[cfg(feature = "bridge-log")]
pub mod log;

pub use self::appender::BridgeAppender;
pub use self::cache::DEFAULT_CAPACITY;
pub use self::cache::LruCache;

/// Record attributes a foreign runtime owns. MDC entries with these keys are not forwarded.
pub const RESERVED_ATTRIBUTES: &[&str] = &[
    "args",
    "asctime",
    "created",
    "exc_info",
    "exc_text",
    "file",
    "filename",
    "funcName",
    "function",
    "level",
    "levelname",
    "levelno",
    "line",
    "lineno",
    "message",
    "module",
    "module_path",
    "msecs",
    "msg",
    "name",
    "pathname",
    "process",
    "processName",
    "relativeCreated",
    "stack_info",
    "target",
    "taskName",
    "thread",
    "threadName",
];

/// The port a foreign logging runtime is driven through.
///
/// Every call receives the guard returned by [`acquire`](ForeignLogging::acquire) as proof that
/// the runtime's global lock is held.
pub trait ForeignLogging: fmt::Debug + Send + Sync + 'static {
    /// A native logger object.
    type Logger: Clone + fmt::Debug + Send + Sync + 'static;

    /// Proof of holding the runtime's global lock.
    type Guard<'a>
    where
        Self: 'a;

    /// Acquire the runtime's global lock.
    fn acquire(&self) -> Self::Guard<'_>;

    /// Check that the logging facilities of the runtime are available.
    ///
    /// Called once when a [`BridgeAppender`] is created; an error prevents the creation.
    fn prepare(&self, _guard: &Self::Guard<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Look up or create the native logger for a hierlog logger name. The root logger arrives as
    /// [`ROOT_LOGGER_NAME`](crate::repository::ROOT_LOGGER_NAME).
    fn resolve_logger(&self, guard: &Self::Guard<'_>, name: &str) -> Result<Self::Logger, Error>;

    /// Whether `logger` accepts records at `level`, in the runtime's own numbering.
    fn is_enabled(
        &self,
        guard: &Self::Guard<'_>,
        logger: &Self::Logger,
        level: i32,
    ) -> Result<bool, Error>;

    /// Hand a record to `logger`.
    fn emit(
        &self,
        guard: &Self::Guard<'_>,
        logger: &Self::Logger,
        record: &ForeignRecord<'_>,
    ) -> Result<(), Error>;

    /// Attribute names MDC entries must not overwrite.
    fn reserved_attributes(&self) -> &[&str] {
        RESERVED_ATTRIBUTES
    }
}

/// A record as handed to a foreign runtime.
#[derive(Debug, Clone)]
pub struct ForeignRecord<'a> {
    pub(crate) name: &'a str,
    pub(crate) level: i32,
    pub(crate) message: &'a str,
    pub(crate) file: &'a str,
    pub(crate) function: &'a str,
    pub(crate) line: u32,
    pub(crate) attributes: Vec<(&'a str, &'a str)>,
}

impl<'a> ForeignRecord<'a> {
    /// The hierlog logger name.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The level in the runtime's numbering, see [`Level::to_foreign_level`](crate::Level).
    pub fn level(&self) -> i32 {
        self.level
    }

    /// The message, rendered by the appender layout if it has one.
    pub fn message(&self) -> &'a str {
        self.message
    }

    /// The source file of the call site.
    pub fn file(&self) -> &'a str {
        self.file
    }

    /// The function or module path of the call site.
    pub fn function(&self) -> &'a str {
        self.function
    }

    /// The line of the call site.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// MDC entries to attach to the native record, ordered by key.
    pub fn attributes(&self) -> &[(&'a str, &'a str)] {
        &self.attributes
    }
}

thread_local! {
    static FORWARDING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a [`BridgeAppender`] handing a record to a foreign
/// runtime.
///
/// A bridge in the opposite direction checks this to avoid sending the record back.
pub fn is_forwarding() -> bool {
    FORWARDING.get()
}

pub(crate) struct ForwardingScope {
    previous: bool,
}

impl ForwardingScope {
    pub(crate) fn enter() -> Self {
        let previous = FORWARDING.replace(true);
        Self { previous }
    }
}

impl Drop for ForwardingScope {
    fn drop(&mut self) {
        FORWARDING.set(self.previous);
    }
}
