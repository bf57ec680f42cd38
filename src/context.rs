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

//! The default-logger context stack.

use std::fmt;
use std::ops::Deref;
use std::sync::Mutex;
use std::sync::PoisonError;

use arc_swap::ArcSwap;

use crate::Error;
use crate::Level;
use crate::Log;
use crate::repository::Repository;

/// Separator between the segments of a hierarchical logger name.
pub const SEPARATOR: char = '.';

/// A stack of single-segment names whose dotted join names the current default logger.
///
/// The process-wide instance backs [`push_context`](crate::push_context) and friends; other
/// instances can be created over any [`Repository`].
///
/// Pushes and pops are expected to be strictly nested. The stack is shared by every thread, so
/// interleaving pushes and pops from several threads produces names nobody pushed in that order.
pub struct ContextStack {
    repository: Repository,
    segments: Mutex<Vec<String>>,
    current: ArcSwap<Log>,
}

impl fmt::Debug for ContextStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStack")
            .field("current", &self.current_name())
            .finish_non_exhaustive()
    }
}

impl ContextStack {
    /// Create a stack whose default logger is the root of `repository`.
    pub fn new(repository: Repository) -> Self {
        let root = Log::from_node(repository.clone(), repository.root());
        Self {
            repository,
            segments: Mutex::new(vec![]),
            current: ArcSwap::from_pointee(root),
        }
    }

    /// The repository loggers are resolved in.
    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Append `name` to the default logger name and switch the default logger to it.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidArgument`](crate::ErrorKind::InvalidArgument) error,
    /// leaving the stack untouched, if `name` is empty or contains [`SEPARATOR`].
    pub fn push(&self, name: &str) -> Result<Log, Error> {
        if name.is_empty() {
            return Err(Error::invalid_argument("empty context name is not allowed"));
        }
        if name.contains(SEPARATOR) {
            return Err(
                Error::invalid_argument("multi-level contexts are not allowed")
                    .with_context("name", name),
            );
        }

        let mut segments = self.segments.lock().unwrap_or_else(PoisonError::into_inner);
        segments.push(name.to_string());
        Ok(self.switch_to(&segments))
    }

    /// Drop the last pushed segment, moving the default logger to its parent.
    ///
    /// At the root this does nothing.
    pub fn pop(&self) {
        let mut segments = self.segments.lock().unwrap_or_else(PoisonError::into_inner);
        if segments.pop().is_some() {
            self.switch_to(&segments);
        }
    }

    /// Drop every segment, making the root logger the default logger again.
    pub fn reset(&self) {
        let mut segments = self.segments.lock().unwrap_or_else(PoisonError::into_inner);
        segments.clear();
        self.switch_to(&segments);
    }

    /// The current default logger.
    pub fn current(&self) -> Log {
        Log::clone(&self.current.load())
    }

    /// The dotted name of the current default logger; empty at the root.
    pub fn current_name(&self) -> String {
        self.current.load().name().to_string()
    }

    /// The number of segments currently pushed.
    pub fn depth(&self) -> usize {
        self.segments
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn switch_to(&self, segments: &[String]) -> Log {
        let name = segments.join(&SEPARATOR.to_string());
        let log = Log::from_node(self.repository.clone(), self.repository.logger(&name));
        self.current.store(log.clone().into());
        log
    }
}

/// Pushes a context on creation and pops it when dropped.
///
/// Dereferences to the logger it pushed.
///
/// # Examples
///
/// ```
/// use hierlog::LogContext;
///
/// {
///     let ctx = LogContext::new("component").unwrap();
///     assert_eq!(hierlog::default_logger_name(), "component");
///     assert_eq!(ctx.name(), "component");
/// }
/// assert_eq!(hierlog::default_logger_name(), "");
/// ```
#[derive(Debug)]
#[must_use = "the context is popped as soon as the guard is dropped"]
pub struct LogContext<'a> {
    stack: &'a ContextStack,
    log: Log,
}

impl LogContext<'static> {
    /// Push `name` on the process-wide context stack.
    pub fn new(name: &str) -> Result<Self, Error> {
        crate::init::default_context().enter(name)
    }

    /// Push `name` on the process-wide context stack and set the level of the pushed logger.
    ///
    /// The level is left in place when the context is popped.
    pub fn with_level(name: &str, level: Level) -> Result<Self, Error> {
        let context = Self::new(name)?;
        context.log.set_level(level);
        Ok(context)
    }
}

impl ContextStack {
    /// Push `name` and return a guard popping it on drop.
    pub fn enter(&self, name: &str) -> Result<LogContext<'_>, Error> {
        let log = self.push(name)?;
        Ok(LogContext { stack: self, log })
    }
}

impl Deref for LogContext<'_> {
    type Target = Log;

    fn deref(&self) -> &Self::Target {
        &self.log
    }
}

impl Drop for LogContext<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_push_and_pop() {
        let stack = ContextStack::new(Repository::new());
        assert_eq!(stack.current_name(), "");

        stack.push("component1").unwrap();
        assert_eq!(stack.current_name(), "component1");
        stack.push("component2").unwrap();
        assert_eq!(stack.current_name(), "component1.component2");
        assert_eq!(stack.current().full_name(), "component1.component2");

        stack.pop();
        assert_eq!(stack.current_name(), "component1");
        stack.pop();
        assert_eq!(stack.current_name(), "");
        assert!(stack.current().is_root());

        stack.pop();
        assert_eq!(stack.current_name(), "");
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_invalid_names_leave_stack_untouched() {
        let stack = ContextStack::new(Repository::new());
        stack.push("a").unwrap();

        let err = stack.push("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = stack.push("x.y").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        assert_eq!(stack.current_name(), "a");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_guard_pops_on_unwind() {
        let stack = ContextStack::new(Repository::new());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = stack.enter("outer").unwrap();
            let _inner = stack.enter("inner").unwrap();
            assert_eq!(stack.current_name(), "outer.inner");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(stack.current_name(), "");
    }

    #[test]
    fn test_pop_follows_pushed_segments() {
        let repository = Repository::new();
        let stack = ContextStack::new(repository.clone());
        // a logger created beforehand does not change what pop returns to
        repository.logger("a.b.c");
        stack.push("a").unwrap();
        stack.push("b").unwrap();
        stack.pop();
        assert_eq!(stack.current_name(), "a");
    }
}
