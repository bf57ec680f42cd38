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

use crate::Error;
use crate::Level;
use crate::append::Append;
use crate::record::Record;

/// Wraps an appender so that records below `threshold` never reach it.
///
/// # Examples
///
/// ```
/// use hierlog::Level;
/// use hierlog::append::Stderr;
/// use hierlog::append::Threshold;
///
/// let only_errors = Threshold::new(Level::ERROR, Stderr::default());
/// ```
#[derive(Debug)]
pub struct Threshold {
    threshold: Level,
    inner: Box<dyn Append>,
}

impl Threshold {
    /// Create a wrapper passing records at `threshold` or above to `inner`.
    pub fn new(threshold: Level, inner: impl Into<Box<dyn Append>>) -> Self {
        Self {
            threshold,
            inner: inner.into(),
        }
    }

    /// The minimum level forwarded to the inner appender.
    pub fn threshold(&self) -> Level {
        self.threshold
    }
}

impl Append for Threshold {
    fn append(&self, record: &Record) -> Result<(), Error> {
        if record.level() < self.threshold {
            return Ok(());
        }
        self.inner.append(record)
    }

    fn flush(&self) -> Result<(), Error> {
        self.inner.flush()
    }

    fn close(&self) {
        self.inner.close()
    }
}
