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

//! The hierarchical logger registry records are dispatched through.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use crate::Error;
use crate::Level;
use crate::append::Append;
use crate::append::IntoAppender;
use crate::record::Record;

/// The name reported by the root logger.
pub const ROOT_LOGGER_NAME: &str = "root";

const UNSET: i64 = i64::MAX;

fn encode(level: Option<Level>) -> i64 {
    level.map_or(UNSET, |level| i64::from(level.to_int()))
}

fn decode(value: i64) -> Option<Level> {
    if value == UNSET {
        None
    } else {
        // values are only ever stored through `encode`
        Some(Level::from_int(value as i32))
    }
}

/// A node of the logger tree.
///
/// Nodes are created by [`Repository::logger`] and live as long as the repository. The parent
/// of a node is fixed by its dotted name when it is created.
pub struct LoggerNode {
    name: String,
    parent: Option<Arc<LoggerNode>>,
    level: AtomicI64,
    additive: AtomicBool,
    appenders: RwLock<Vec<Arc<dyn Append>>>,
}

impl fmt::Debug for LoggerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerNode")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("additive", &self.additive())
            .finish_non_exhaustive()
    }
}

impl LoggerNode {
    fn new(name: String, parent: Option<Arc<LoggerNode>>, level: Option<Level>) -> Self {
        Self {
            name,
            parent,
            level: AtomicI64::new(encode(level)),
            additive: AtomicBool::new(true),
            appenders: RwLock::new(vec![]),
        }
    }

    /// The full dotted name; [`ROOT_LOGGER_NAME`] for the root logger.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this node is the root of its repository.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The parent node, `None` for the root logger.
    pub fn parent(&self) -> Option<&Arc<LoggerNode>> {
        self.parent.as_ref()
    }

    /// The level assigned to this node, `None` if it inherits.
    pub fn level(&self) -> Option<Level> {
        decode(self.level.load(Ordering::Relaxed))
    }

    /// Assign or clear the level. Clearing the level of the root logger is ignored.
    pub fn set_level(&self, level: Option<Level>) {
        if level.is_none() && self.is_root() {
            return;
        }
        self.level.store(encode(level), Ordering::Relaxed);
    }

    /// The level of the closest node, starting from this one, that has a level.
    pub fn effective_level(&self) -> Level {
        let mut node = self;
        loop {
            if let Some(level) = node.level() {
                return level;
            }
            match node.parent.as_deref() {
                Some(parent) => node = parent,
                None => return Level::DEBUG,
            }
        }
    }

    /// Whether events reaching this node are passed on to the appenders of its ancestors.
    pub fn additive(&self) -> bool {
        self.additive.load(Ordering::Relaxed)
    }

    /// Set the additivity flag.
    pub fn set_additive(&self, additive: bool) {
        self.additive.store(additive, Ordering::Relaxed);
    }

    /// Attach an appender to this node.
    pub fn add_appender(&self, appender: impl IntoAppender) {
        self.appenders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(appender.into_appender());
    }

    /// The number of appenders attached directly to this node.
    pub fn appender_count(&self) -> usize {
        self.appenders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn detach_appenders(&self) -> Vec<Arc<dyn Append>> {
        std::mem::take(&mut *self.appenders.write().unwrap_or_else(PoisonError::into_inner))
    }

    fn reset(&self) {
        self.set_level(None);
        self.set_additive(true);
    }
}

struct State {
    root: Arc<LoggerNode>,
    threshold: AtomicI64,
    loggers: RwLock<HashMap<String, Arc<LoggerNode>>>,
}

/// A hierarchical logger registry.
///
/// Cloning a repository yields another handle to the same registry. Use [`Repository::global`]
/// for the process-wide instance the facade works with.
#[derive(Clone)]
pub struct Repository {
    state: Arc<State>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("threshold", &self.threshold())
            .field("loggers", &self.logger_names())
            .finish()
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository {
    /// Create an empty repository whose root logger is at [`Level::DEBUG`].
    pub fn new() -> Self {
        let root = LoggerNode::new(ROOT_LOGGER_NAME.to_string(), None, Some(Level::DEBUG));
        Self {
            state: Arc::new(State {
                root: Arc::new(root),
                threshold: AtomicI64::new(encode(Some(Level::ALL))),
                loggers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide repository.
    ///
    /// The first access applies the default configuration, see [`configure`](crate::configure).
    pub fn global() -> &'static Repository {
        crate::init::default_context().repository()
    }

    /// The root logger.
    pub fn root(&self) -> Arc<LoggerNode> {
        self.state.root.clone()
    }

    /// Look up or create the logger called `name`, creating missing ancestors too.
    ///
    /// The empty name designates the root logger.
    pub fn logger(&self, name: &str) -> Arc<LoggerNode> {
        if name.is_empty() {
            return self.root();
        }

        {
            let loggers = self
                .state
                .loggers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(node) = loggers.get(name) {
                return node.clone();
            }
        }

        let mut loggers = self
            .state
            .loggers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut parent = self.root();
        let mut end = 0;
        for segment in name.split('.') {
            end += segment.len();
            let prefix = &name[..end];
            let node = loggers
                .entry(prefix.to_string())
                .or_insert_with(|| {
                    Arc::new(LoggerNode::new(prefix.to_string(), Some(parent.clone()), None))
                })
                .clone();
            parent = node;
            // skip the separator
            end += 1;
        }
        parent
    }

    /// The parent of `node`, `None` for the root logger.
    pub fn parent(&self, node: &LoggerNode) -> Option<Arc<LoggerNode>> {
        node.parent().cloned()
    }

    /// The names of every logger created so far, root excluded, sorted.
    pub fn logger_names(&self) -> Vec<String> {
        let loggers = self
            .state
            .loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names = loggers.keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// The repository-wide threshold; events below it are dropped whatever their logger says.
    pub fn threshold(&self) -> Level {
        decode(self.state.threshold.load(Ordering::Relaxed)).unwrap_or(Level::ALL)
    }

    /// Set the repository-wide threshold.
    pub fn set_threshold(&self, level: Level) {
        self.state.threshold.store(encode(Some(level)), Ordering::Relaxed);
    }

    /// Whether `node` would pass an event at `level` to its appenders.
    pub fn is_enabled_for(&self, node: &LoggerNode, level: Level) -> bool {
        level >= self.threshold() && level >= node.effective_level()
    }

    /// Hand `record` to the appenders of `node` and of its ancestors, without checking levels.
    ///
    /// Walking up stops after the first node that is not additive. Every appender is called even
    /// if an earlier one fails; the first failure is returned.
    pub fn forced_log(&self, node: &LoggerNode, record: &Record) -> Result<(), Error> {
        if record.level() < self.threshold() {
            return Ok(());
        }

        let mut result = Ok(());
        let mut current = Some(node);
        while let Some(node) = current {
            let appenders = node.appenders.read().unwrap_or_else(PoisonError::into_inner);
            for appender in appenders.iter() {
                if let Err(err) = appender.append(record) {
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
            if !node.additive() {
                break;
            }
            current = node.parent.as_deref();
        }
        result
    }

    /// Flush every attached appender.
    pub fn flush(&self) -> Result<(), Error> {
        let mut result = Ok(());
        for node in self.nodes() {
            let appenders = node.appenders.read().unwrap_or_else(PoisonError::into_inner);
            for appender in appenders.iter() {
                if let Err(err) = appender.flush() {
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
        }
        result
    }

    /// Restore the pristine state: root at [`Level::DEBUG`], every other level unset, every
    /// appender closed and detached, additivity on and no repository threshold.
    ///
    /// Loggers themselves survive so handles held elsewhere stay valid.
    pub fn reset_configuration(&self) {
        self.set_threshold(Level::ALL);
        for node in self.nodes() {
            node.reset();
            for appender in node.detach_appenders() {
                let _ = appender.flush();
                appender.close();
            }
        }
        self.state.root.set_level(Some(Level::DEBUG));
    }

    fn nodes(&self) -> Vec<Arc<LoggerNode>> {
        let loggers = self
            .state
            .loggers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut nodes = Vec::with_capacity(loggers.len() + 1);
        nodes.push(self.root());
        nodes.extend(loggers.values().cloned());
        nodes
    }
}
