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
use std::sync::MutexGuard;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use hierlog::Append;
use hierlog::Error;
use hierlog::ErrorKind;
use hierlog::Layout;
use hierlog::Level;
use hierlog::LocationInfo;
use hierlog::Log;
use hierlog::bridge::BridgeAppender;
use hierlog::bridge::ForeignLogging;
use hierlog::bridge::ForeignRecord;
use hierlog::diagnostic::Mdc;
use hierlog::layout::PatternLayout;
use hierlog::record::Record;
use hierlog::repository::Repository;
use hierlog::trap::Trap;
use serial_test::serial;

#[derive(Debug, Clone, PartialEq)]
struct Emitted {
    logger: String,
    level: i32,
    message: String,
    file: String,
    line: u32,
    attributes: Vec<(String, String)>,
    forwarding: bool,
}

#[derive(Debug, Default)]
struct State {
    resolved: Vec<String>,
    emitted: Vec<Emitted>,
    locks: usize,
}

#[derive(Debug, Clone)]
struct MockLogger {
    name: String,
}

// A stand-in for an interpreter style runtime with a global lock.
#[derive(Debug, Default)]
struct MockRuntime {
    lock: Mutex<()>,
    state: Arc<Mutex<State>>,
    threshold: i32,
    unavailable: bool,
    fail_resolve: bool,
    fail_emit: bool,
}

impl ForeignLogging for MockRuntime {
    type Logger = MockLogger;
    type Guard<'a> = MutexGuard<'a, ()>;

    fn acquire(&self) -> Self::Guard<'_> {
        let guard = self.lock.lock().unwrap();
        self.state.lock().unwrap().locks += 1;
        guard
    }

    fn prepare(&self, _guard: &Self::Guard<'_>) -> Result<(), Error> {
        if self.unavailable {
            return Err(Error::forwarding("logging module is not importable"));
        }
        Ok(())
    }

    fn resolve_logger(&self, _guard: &Self::Guard<'_>, name: &str) -> Result<MockLogger, Error> {
        if self.fail_resolve {
            return Err(Error::forwarding("no such logger"));
        }
        self.state.lock().unwrap().resolved.push(name.to_string());
        Ok(MockLogger {
            name: name.to_string(),
        })
    }

    fn is_enabled(
        &self,
        _guard: &Self::Guard<'_>,
        _logger: &MockLogger,
        level: i32,
    ) -> Result<bool, Error> {
        Ok(level >= self.threshold)
    }

    fn emit(
        &self,
        _guard: &Self::Guard<'_>,
        logger: &MockLogger,
        record: &ForeignRecord<'_>,
    ) -> Result<(), Error> {
        if self.fail_emit {
            return Err(Error::forwarding("handler raised"));
        }
        self.state.lock().unwrap().emitted.push(Emitted {
            logger: logger.name.clone(),
            level: record.level(),
            message: record.message().to_string(),
            file: record.file().to_string(),
            line: record.line(),
            attributes: record
                .attributes()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            forwarding: hierlog::bridge::is_forwarding(),
        });
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CountingLayout(Arc<AtomicUsize>);

impl Layout for CountingLayout {
    fn format(&self, record: &Record) -> Result<String, Error> {
        self.0.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{}\n", record.payload()))
    }
}

#[derive(Debug, Default, Clone)]
struct CollectingTrap(Arc<Mutex<Vec<String>>>);

impl Trap for CollectingTrap {
    fn trap(&self, err: &Error) {
        self.0.lock().unwrap().push(err.to_string());
    }
}

fn bridged(runtime: MockRuntime) -> (Repository, Arc<BridgeAppender<MockRuntime>>, Arc<Mutex<State>>) {
    let state = runtime.state.clone();
    let appender = Arc::new(BridgeAppender::new(runtime).unwrap());
    let repository = Repository::new();
    repository.root().add_appender(appender.clone() as Arc<dyn Append>);
    (repository, appender, state)
}

fn location() -> LocationInfo<'static> {
    LocationInfo::new("src/db.rs", "app::db", 7)
}

#[test]
fn test_forwarded_record_keeps_metadata() {
    let (repository, _appender, state) = bridged(MockRuntime::default());
    let log = Log::in_repository(&repository, "app.db");

    Mdc::insert("request", "42");
    Mdc::insert("name", "clash");
    log.log_msg(Level::WARN, location(), "slow query").unwrap();
    Mdc::clear();

    let state = state.lock().unwrap();
    assert_eq!(
        state.emitted,
        vec![Emitted {
            logger: "app.db".to_string(),
            level: 30,
            message: "slow query".to_string(),
            file: "src/db.rs".to_string(),
            line: 7,
            attributes: vec![("request".to_string(), "42".to_string())],
            forwarding: true,
        }]
    );
    assert!(!hierlog::bridge::is_forwarding());
    // one for construction, one for the event
    assert_eq!(state.locks, 2);
}

#[test]
fn test_root_logger_and_layout() {
    let runtime = MockRuntime::default();
    let state = runtime.state.clone();
    let appender = BridgeAppender::new(runtime)
        .unwrap()
        .with_layout(PatternLayout::new("%p %c: %m%n").unwrap());
    let repository = Repository::new();
    repository.root().add_appender(appender);

    let root = Log::in_repository(&repository, "");
    root.log(Level::INFO, location(), format_args!("hello {}", "there"))
        .unwrap();

    let state = state.lock().unwrap();
    assert_eq!(state.resolved, vec!["root"]);
    assert_eq!(state.emitted[0].message, "INFO root: hello there");
}

#[test]
fn test_disabled_destination_skips_formatting() {
    let formatted = Arc::new(AtomicUsize::new(0));
    let runtime = MockRuntime {
        threshold: Level::WARN.to_foreign_level(),
        ..MockRuntime::default()
    };
    let state = runtime.state.clone();
    let appender = BridgeAppender::new(runtime)
        .unwrap()
        .with_layout(CountingLayout(formatted.clone()));
    let repository = Repository::new();
    repository.root().add_appender(appender);

    let log = Log::in_repository(&repository, "svc");
    log.log_msg(Level::INFO, location(), "not for them").unwrap();
    log.log_msg(Level::INFO, location(), "still not").unwrap();
    assert_eq!(formatted.load(Ordering::Relaxed), 0);

    log.log_msg(Level::ERROR, location(), "for them").unwrap();
    assert_eq!(formatted.load(Ordering::Relaxed), 1);

    let state = state.lock().unwrap();
    // resolved once, then served from the cache
    assert_eq!(state.resolved, vec!["svc"]);
    assert_eq!(state.emitted.len(), 1);
    assert_eq!(state.emitted[0].message, "for them");
}

#[test]
fn test_logger_cache_is_bounded() {
    let (repository, appender, state) = bridged(MockRuntime::default());

    for i in 0..=hierlog::bridge::DEFAULT_CAPACITY {
        let log = Log::in_repository(&repository, &format!("logger{i}"));
        log.log_msg(Level::INFO, location(), "hello").unwrap();
    }
    assert_eq!(appender.cached_loggers(), 32);
    assert_eq!(state.lock().unwrap().resolved.len(), 33);

    // the newest one is still cached, the oldest one was evicted
    Log::in_repository(&repository, "logger32")
        .log_msg(Level::INFO, location(), "again")
        .unwrap();
    assert_eq!(state.lock().unwrap().resolved.len(), 33);
    Log::in_repository(&repository, "logger0")
        .log_msg(Level::INFO, location(), "again")
        .unwrap();
    assert_eq!(state.lock().unwrap().resolved.len(), 34);
    assert_eq!(appender.cached_loggers(), 32);
}

#[test]
fn test_unavailable_runtime_fails_construction() {
    let err = BridgeAppender::new(MockRuntime {
        unavailable: true,
        ..MockRuntime::default()
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forwarding);
}

#[test]
fn test_resolve_failure_propagates() {
    let (repository, appender, _state) = bridged(MockRuntime {
        fail_resolve: true,
        ..MockRuntime::default()
    });

    let err = Log::in_repository(&repository, "svc")
        .log_msg(Level::INFO, location(), "lost")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forwarding);
    assert!(err.to_string().contains("logger: svc"), "{err}");
    assert_eq!(appender.cached_loggers(), 0);
}

#[test]
#[serial]
fn test_emit_failure_reaches_caller_or_trap() {
    let (repository, _appender, _state) = bridged(MockRuntime {
        fail_emit: true,
        ..MockRuntime::default()
    });
    let log = Log::in_repository(&repository, "svc");

    let err = log.log_msg(Level::INFO, location(), "lost").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forwarding);

    let trap = CollectingTrap::default();
    hierlog::trap::set_trap(trap.clone());
    hierlog::error!(logger: log, "lost through a macro");
    hierlog::trap::reset_trap();

    let errors = trap.0.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("handler raised"), "{}", errors[0]);
}
