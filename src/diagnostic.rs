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

//! Mapped Diagnostic Context (MDC).

use std::cell::RefCell;
use std::collections::BTreeMap;

thread_local! {
    static CONTEXT: RefCell<BTreeMap<String, String>> = const { RefCell::new(BTreeMap::new()) };
}

/// A thread-local key-value map attached to every record the thread emits.
///
/// Entries live until they are explicitly removed or the thread exits; logging never clears them.
///
/// ## Example
///
/// ```rust
/// use hierlog::diagnostic::Mdc;
///
/// Mdc::insert("request", "42");
/// assert_eq!(Mdc::get("request").as_deref(), Some("42"));
/// Mdc::remove("request");
/// ```
#[derive(Default, Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Mdc {}

impl Mdc {
    /// Inserts a key-value pair into the current thread's MDC, replacing any previous value.
    pub fn insert<K, V>(key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        CONTEXT.with(|map| {
            map.borrow_mut().insert(key.into(), value.into());
        });
    }

    /// Removes a key from the current thread's MDC.
    pub fn remove(key: &str) {
        CONTEXT.with(|map| {
            map.borrow_mut().remove(key);
        });
    }

    /// Looks up a key in the current thread's MDC.
    pub fn get(key: &str) -> Option<String> {
        CONTEXT.with(|map| map.borrow().get(key).cloned())
    }

    /// The keys currently set on this thread, in order.
    pub fn keys() -> Vec<String> {
        CONTEXT.with(|map| map.borrow().keys().cloned().collect())
    }

    /// Removes every entry of the current thread's MDC.
    pub fn clear() {
        CONTEXT.with(|map| map.borrow_mut().clear());
    }

    /// Copies the current thread's MDC.
    pub fn snapshot() -> BTreeMap<String, String> {
        CONTEXT.with(|map| map.borrow().clone())
    }
}
