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

use std::fmt;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Error;
use crate::Layout;
use crate::append::Append;
use crate::bridge::DEFAULT_CAPACITY;
use crate::bridge::ForeignLogging;
use crate::bridge::ForeignRecord;
use crate::bridge::ForwardingScope;
use crate::bridge::LruCache;
use crate::record::Record;

/// An appender forwarding records into a foreign logging runtime.
///
/// Native loggers are cached by name, at most [`DEFAULT_CAPACITY`] of them. The cache has its
/// own lock; the runtime lock is only taken around calls into the runtime.
///
/// Forwarding failures are returned from [`Append::append`], so they surface from
/// [`Log::log`](crate::Log::log) as errors.
pub struct BridgeAppender<F: ForeignLogging> {
    runtime: F,
    layout: Option<Box<dyn Layout>>,
    cache: Mutex<LruCache<F::Logger>>,
}

impl<F: ForeignLogging> fmt::Debug for BridgeAppender<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeAppender")
            .field("runtime", &self.runtime)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl<F: ForeignLogging> BridgeAppender<F> {
    /// Create an appender forwarding into `runtime`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime reports its logging facilities unavailable.
    pub fn new(runtime: F) -> Result<Self, Error> {
        {
            let guard = runtime.acquire();
            runtime.prepare(&guard)?;
        }
        Ok(Self {
            runtime,
            layout: None,
            cache: Mutex::new(LruCache::new(DEFAULT_CAPACITY)),
        })
    }

    /// Render messages with `layout` instead of forwarding the bare payload.
    ///
    /// A trailing newline produced by the layout is dropped.
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    /// The runtime this appender forwards into.
    pub fn runtime(&self) -> &F {
        &self.runtime
    }

    /// The number of native loggers currently cached.
    pub fn cached_loggers(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn message<'a>(&self, record: &'a Record<'_>) -> Result<std::borrow::Cow<'a, str>, Error> {
        match self.layout {
            Some(ref layout) => {
                let mut text = layout.format(record)?;
                if text.ends_with('\n') {
                    text.pop();
                }
                Ok(text.into())
            }
            None => Ok(record.payload().into()),
        }
    }
}

impl<F: ForeignLogging> Append for BridgeAppender<F> {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let name = record.logger();
        let level = record.level().to_foreign_level();

        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name);

        let guard = self.runtime.acquire();
        let logger = match cached {
            Some(logger) => logger,
            None => {
                let logger = self.runtime.resolve_logger(&guard, name).map_err(|err| {
                    Error::forwarding("failed to retrieve foreign logger")
                        .with_context("logger", name)
                        .with_source(err)
                })?;
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(name, logger.clone());
                logger
            }
        };

        if !self.runtime.is_enabled(&guard, &logger, level)? {
            return Ok(());
        }

        let message = self.message(record)?;
        let reserved = self.runtime.reserved_attributes();
        let attributes = record
            .mdc()
            .iter()
            .filter(|(key, _)| !reserved.contains(&key.as_str()))
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        let location = record.location();
        let foreign = ForeignRecord {
            name,
            level,
            message: &message,
            file: location.file(),
            function: location.function(),
            line: location.line(),
            attributes,
        };

        let _scope = ForwardingScope::enter();
        self.runtime.emit(&guard, &logger, &foreign)
    }
}
