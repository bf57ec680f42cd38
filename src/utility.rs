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

/// An identifier of the calling thread, stable for the lifetime of the thread.
///
/// On Linux this is the kernel thread id. Elsewhere threads are numbered from 1 in the order
/// they first call this function.
pub fn lwp_id() -> u32 {
    imp::lwp_id()
}

#[cfg(target_os = "linux")]
mod imp {
    pub(super) fn lwp_id() -> u32 {
        // SAFETY: gettid takes no arguments and cannot fail.
        unsafe { libc::syscall(libc::SYS_gettid) as u32 }
    }
}

#[cfg(not(target_os = "linux"))]
mod imp {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    static NEXT_ID: AtomicU32 = AtomicU32::new(1);

    thread_local! {
        static LWP_ID: u32 = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn lwp_id() -> u32 {
        LWP_ID.with(|id| *id)
    }
}
