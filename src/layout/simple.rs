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
use crate::layout::Layout;
use crate::record::Record;

/// A layout that formats a record as its level and message.
///
/// Output format:
///
/// ```text
/// INFO - Hello info!
/// WARN - Hello warn!
/// ```
///
/// # Examples
///
/// ```
/// use hierlog::layout::SimpleLayout;
///
/// let layout = SimpleLayout::default();
/// ```
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct SimpleLayout {}

impl Layout for SimpleLayout {
    fn format(&self, record: &Record) -> Result<String, Error> {
        Ok(format!("{} - {}\n", record.level(), record.payload()))
    }
}
