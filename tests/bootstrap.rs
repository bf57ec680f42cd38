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
use std::sync::Barrier;
use std::thread;

use hierlog::Level;
use hierlog::Log;

const THREADS: usize = 16;

// The only test of this binary, so the threads below race on the very first use.
#[test]
fn test_racing_first_use_configures_once() {
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles = (0..THREADS)
        .map(|i| {
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                hierlog::info!("thread {i} starting");
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let root = Log::root();
    assert_eq!(root.node().appender_count(), 1);
    assert_eq!(root.level(), Some(Level::INFO));
    assert_eq!(hierlog::default_logger_name(), "");
}
