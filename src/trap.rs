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

//! Traps for errors that cannot be returned to a caller.
//!
//! Configuration problems and failures raised while logging through the macros end up here.

use std::fmt;
use std::io;
use std::io::Write;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::Error;

static TRAP: RwLock<Option<Box<dyn Trap>>> = RwLock::new(None);

/// A sink for internal errors.
pub trait Trap: fmt::Debug + Send + Sync + 'static {
    /// Handle an error.
    fn trap(&self, err: &Error);
}

impl<T: Trap> From<T> for Box<dyn Trap> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// A default trap that sends errors to standard error if possible.
///
/// If standard error is not available, it does nothing.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct DefaultTrap {}

impl Trap for DefaultTrap {
    fn trap(&self, err: &Error) {
        let _ = writeln!(io::stderr(), "hierlog: {err}");
    }
}

/// Replace the process-wide trap. [`DefaultTrap`] is used until this is called.
pub fn set_trap(trap: impl Into<Box<dyn Trap>>) {
    let mut slot = TRAP.write().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(trap.into());
}

/// Restore [`DefaultTrap`].
pub fn reset_trap() {
    let mut slot = TRAP.write().unwrap_or_else(PoisonError::into_inner);
    *slot = None;
}

/// Hand an error to the installed trap.
pub fn report(err: &Error) {
    let slot = TRAP.read().unwrap_or_else(PoisonError::into_inner);
    match slot.as_ref() {
        Some(trap) => trap.trap(err),
        None => DefaultTrap::default().trap(err),
    }
}
