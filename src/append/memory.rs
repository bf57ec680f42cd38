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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Error;
use crate::Layout;
use crate::append::Append;
use crate::layout::SimpleLayout;
use crate::record::Record;

/// An appender that keeps rendered records in memory.
///
/// Clones share the same buffer, so a test can keep one handle and attach the other.
///
/// # Examples
///
/// ```
/// use hierlog::append::Memory;
///
/// let memory = Memory::default();
/// assert!(memory.lines().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Memory {
    layout: Arc<dyn Layout>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            layout: Arc::new(SimpleLayout::default()),
            lines: Arc::new(Mutex::new(vec![])),
        }
    }
}

impl Memory {
    /// Set the layout for the [`Memory`] appender.
    ///
    /// Default to [`SimpleLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = Arc::from(layout.into());
        self
    }

    /// Every rendered record so far, in arrival order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The concatenation of [`lines`](Memory::lines).
    pub fn contents(&self) -> String {
        self.lines().concat()
    }

    /// Drop everything captured so far.
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Append for Memory {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let text = self.layout.format(record)?;
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text);
        Ok(())
    }
}
