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

//! Dispatch log records to various targets.

use std::fmt;
use std::sync::Arc;

use crate::Error;
use crate::record::Record;

mod file;
mod memory;
mod stdio;
mod testing;
mod threshold;

pub use self::file::File;
pub use self::memory::Memory;
pub use self::stdio::Stderr;
pub use self::stdio::Stdout;
pub use self::testing::Testing;
pub use self::threshold::Threshold;

/// An appender that can process log records.
pub trait Append: fmt::Debug + Send + Sync + 'static {
    /// Dispatch a log record to the append target.
    fn append(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Release resources held by the appender. Called when a configuration reset detaches it.
    ///
    /// Default to a no-op.
    fn close(&self) {}
}

impl<T: Append> From<T> for Box<dyn Append> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Conversion into an appender that can be attached to several loggers.
pub trait IntoAppender {
    /// Convert into a shared appender.
    fn into_appender(self) -> Arc<dyn Append>;
}

impl<T: Append> IntoAppender for T {
    fn into_appender(self) -> Arc<dyn Append> {
        Arc::new(self)
    }
}

impl IntoAppender for Arc<dyn Append> {
    fn into_appender(self) -> Arc<dyn Append> {
        self
    }
}
