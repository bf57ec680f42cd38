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

use std::cell::Cell;
use std::sync::mpsc;
use std::thread;

use hierlog::Log;
use hierlog::append::Memory;
use hierlog::diagnostic::Mdc;
use hierlog::layout::PatternLayout;
use serial_test::serial;

thread_local! {
    static INIT_COUNT: Cell<u32> = const { Cell::new(0) };
    static LATE_COUNT: Cell<u32> = const { Cell::new(0) };
}

#[test]
#[serial]
fn test_init_runs_once_per_thread() {
    hierlog::configure_prop("log4j.rootLogger=INFO");
    hierlog::register_mdc_init(|| INIT_COUNT.set(INIT_COUNT.get() + 1));

    // the registering thread is covered right away
    assert_eq!(INIT_COUNT.get(), 1);
    for i in 0..10 {
        hierlog::info!("message {i}");
    }
    assert_eq!(INIT_COUNT.get(), 1);

    let handles = (0..4)
        .map(|_| {
            thread::spawn(|| {
                assert!(!hierlog::is_thread_initialized());
                assert_eq!(INIT_COUNT.get(), 0);
                for _ in 0..5 {
                    hierlog::info!("from a spawned thread");
                }
                assert!(hierlog::is_thread_initialized());
                INIT_COUNT.get()
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}

#[test]
#[serial]
fn test_disabled_messages_do_not_initialize() {
    hierlog::configure_prop("log4j.rootLogger=ERROR");
    let initialized = thread::spawn(|| {
        hierlog::info!("suppressed");
        hierlog::is_thread_initialized()
    })
    .join()
    .unwrap();
    assert!(!initialized);
}

#[test]
#[serial]
fn test_late_registration_skips_initialized_threads() {
    hierlog::configure_prop("log4j.rootLogger=INFO");

    let (ready_tx, ready_rx) = mpsc::channel();
    let (go_tx, go_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        hierlog::info!("first message");
        ready_tx.send(()).unwrap();
        go_rx.recv().unwrap();
        hierlog::info!("second message");
        LATE_COUNT.get()
    });

    ready_rx.recv().unwrap();
    hierlog::register_mdc_init(|| LATE_COUNT.set(LATE_COUNT.get() + 1));
    assert_eq!(LATE_COUNT.get(), 1);
    go_tx.send(()).unwrap();

    assert_eq!(handle.join().unwrap(), 0);
    let fresh = thread::spawn(|| {
        hierlog::info!("fresh thread");
        LATE_COUNT.get()
    });
    assert_eq!(fresh.join().unwrap(), 1);
}

#[test]
#[serial]
fn test_mdc_from_init_reaches_every_thread() {
    hierlog::configure_prop("log4j.rootLogger=INFO");
    let memory = Memory::default().with_layout(PatternLayout::new("%X{PID}|%m").unwrap());
    Log::root().node().add_appender(memory.clone());

    hierlog::register_mdc_init(|| Mdc::insert("PID", "12345"));
    hierlog::info!("main thread");

    let handles = (0..2)
        .map(|i| thread::spawn(move || hierlog::info!("thread {i}")))
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut lines = memory.lines();
    lines.sort();
    assert_eq!(lines, vec!["12345|main thread", "12345|thread 0", "12345|thread 1"]);
    // logging never clears the MDC
    assert_eq!(Mdc::get("PID").as_deref(), Some("12345"));

    Mdc::remove("PID");
    hierlog::configure();
}
