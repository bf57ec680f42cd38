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

//! Callbacks run once on every thread before its first message.

use std::cell::Cell;
use std::sync::Mutex;
use std::sync::PoisonError;

type InitFn = Box<dyn Fn() + Send + Sync + 'static>;

static REGISTRY: Mutex<Vec<InitFn>> = Mutex::new(Vec::new());

thread_local! {
    static INITIALIZED: Cell<bool> = const { Cell::new(false) };
}

/// Register a callback that initializes the MDC of a thread.
///
/// The callback runs right away on the calling thread, and then once on every other thread
/// before that thread emits its first message. Threads that already logged before the
/// registration do not run it.
///
/// Callbacks run while the registry is locked. They may use [`Mdc`](crate::diagnostic::Mdc)
/// freely but must not register further callbacks.
///
/// Returns the number of callbacks registered so far, which makes it convenient to register from
/// a lazily initialized static.
///
/// # Examples
///
/// ```
/// use hierlog::diagnostic::Mdc;
///
/// hierlog::register_mdc_init(|| Mdc::insert("PID", std::process::id().to_string()));
/// assert!(Mdc::get("PID").is_some());
/// ```
pub fn register_mdc_init<F>(callback: F) -> usize
where
    F: Fn() + Send + Sync + 'static,
{
    let mut callbacks = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    callbacks.push(Box::new(callback));

    if INITIALIZED.get() {
        if let Some(callback) = callbacks.last() {
            callback();
        }
    } else {
        // this thread has not logged yet, so it owes every earlier callback too
        INITIALIZED.set(true);
        for callback in callbacks.iter() {
            callback();
        }
    }

    callbacks.len()
}

/// Run the registered callbacks if this thread has not done so yet.
#[inline]
pub(crate) fn ensure_thread_initialized() {
    if !INITIALIZED.get() {
        initialize_thread();
    }
}

#[cold]
fn initialize_thread() {
    let callbacks = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
    // set first so a callback that logs does not come back here
    INITIALIZED.set(true);
    for callback in callbacks.iter() {
        callback();
    }
}

/// Whether the current thread has run the registered callbacks.
pub fn is_thread_initialized() -> bool {
    INITIALIZED.get()
}
