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

//! Configuration of a [`Repository`] from log4j style properties or XML.
//!
//! Both dialects are read into the same model, then applied to the repository. Problems with
//! single entries do not stop the rest from being applied; they are collected as the sources of
//! the returned error.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::Error;
use crate::Level;
use crate::append::Append;
use crate::append::File;
use crate::append::Stderr;
use crate::append::Stdout;
use crate::append::Testing;
use crate::append::Threshold;
use crate::layout::Layout;
use crate::layout::PatternLayout;
use crate::layout::SimpleLayout;
use crate::repository::Repository;

mod properties;
mod xml;

pub use self::properties::parse_properties;

/// Configure `repository` from a file, as XML if the name ends in `.xml` and as properties
/// otherwise.
///
/// The repository is not reset first.
pub fn configure_file(repository: &Repository, path: &Path) -> Result<(), Error> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        Error::config("failed to read configuration file")
            .with_context("path", path.display())
            .with_source(err)
    })?;

    let is_xml = path.extension().is_some_and(|ext| ext == "xml");
    let result = if is_xml {
        configure_xml(repository, &text)
    } else {
        configure_properties(repository, &text)
    };
    result.map_err(|err| err.with_context("path", path.display()))
}

/// Configure `repository` from properties text.
pub fn configure_properties(repository: &Repository, text: &str) -> Result<(), Error> {
    let mut problems = Problems::default();
    let config = properties::read(text, &mut problems);
    config.apply(repository, &mut problems);
    problems.into_result()
}

/// Configure `repository` from an XML document.
pub fn configure_xml(repository: &Repository, text: &str) -> Result<(), Error> {
    let mut problems = Problems::default();
    let config = xml::read(text, &mut problems);
    config.apply(repository, &mut problems);
    problems.into_result()
}

#[derive(Debug, Default)]
pub(crate) struct Problems(Vec<Error>);

impl Problems {
    pub(crate) fn push(&mut self, err: Error) {
        self.0.push(err);
    }

    fn into_result(self) -> Result<(), Error> {
        if self.0.is_empty() {
            return Ok(());
        }
        let mut err = Error::config("configuration applied partially")
            .with_context("problems", self.0.len());
        for problem in self.0 {
            err = err.with_source(problem);
        }
        Err(err)
    }
}

/// The level setting of a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelSetting {
    Unset,
    Set(Level),
}

pub(crate) fn parse_level_setting(value: &str) -> Result<LevelSetting, Error> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("INHERITED") || value.eq_ignore_ascii_case("NULL") {
        return Ok(LevelSetting::Unset);
    }
    value.parse().map(LevelSetting::Set)
}

pub(crate) fn parse_bool(value: &str) -> Result<bool, Error> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(Error::config("malformed boolean").with_context("value", value))
    }
}

/// The last dotted segment, so that `org.apache.log4j.ConsoleAppender` reads as `ConsoleAppender`.
fn class_name(class: &str) -> &str {
    let class = class.trim();
    match class.rfind('.') {
        Some(idx) => &class[idx + 1..],
        None => class,
    }
}

#[derive(Debug, Default)]
pub(crate) struct LayoutConfig {
    pub(crate) class: String,
    pub(crate) options: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub(crate) struct AppenderConfig {
    pub(crate) class: String,
    pub(crate) layout: Option<LayoutConfig>,
    pub(crate) options: Vec<(String, String)>,
}

#[derive(Debug, Default)]
pub(crate) struct LoggerConfig {
    pub(crate) level: Option<LevelSetting>,
    pub(crate) appenders: Vec<String>,
    pub(crate) additivity: Option<bool>,
}

#[derive(Debug, Default)]
pub(crate) struct Configuration {
    pub(crate) threshold: Option<Level>,
    pub(crate) root: Option<LoggerConfig>,
    pub(crate) loggers: Vec<(String, LoggerConfig)>,
    pub(crate) appenders: BTreeMap<String, AppenderConfig>,
}

impl Configuration {
    fn apply(self, repository: &Repository, problems: &mut Problems) {
        if let Some(threshold) = self.threshold {
            repository.set_threshold(threshold);
        }

        // appenders referenced by several loggers are shared
        let mut built: BTreeMap<String, Option<Arc<dyn Append>>> = BTreeMap::new();
        let mut lookup = |name: &str, problems: &mut Problems| -> Option<Arc<dyn Append>> {
            if let Some(appender) = built.get(name) {
                return appender.clone();
            }
            let appender = match self.appenders.get(name) {
                Some(config) => match build_appender(config) {
                    Ok(appender) => Some(appender),
                    Err(err) => {
                        problems.push(err.with_context("appender", name));
                        None
                    }
                },
                None => {
                    problems.push(
                        Error::config("reference to undefined appender")
                            .with_context("appender", name),
                    );
                    None
                }
            };
            built.insert(name.to_string(), appender.clone());
            appender
        };

        let loggers = self
            .root
            .into_iter()
            .map(|config| (repository.root(), config))
            .chain(
                self.loggers
                    .into_iter()
                    .map(|(name, config)| (repository.logger(&name), config)),
            );
        for (node, config) in loggers {
            match config.level {
                Some(LevelSetting::Set(level)) => node.set_level(Some(level)),
                Some(LevelSetting::Unset) => node.set_level(None),
                None => {}
            }
            if let Some(additive) = config.additivity {
                node.set_additive(additive);
            }
            for name in config.appenders.iter() {
                if let Some(appender) = lookup(name, problems) {
                    node.add_appender(appender);
                }
            }
        }
    }
}

fn build_layout(config: &LayoutConfig) -> Result<Box<dyn Layout>, Error> {
    match class_name(&config.class) {
        "SimpleLayout" => Ok(Box::new(SimpleLayout::default())),
        "PatternLayout" => {
            let pattern = config
                .options
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("ConversionPattern"))
                .map(|(_, value)| value.as_str());
            match pattern {
                Some(pattern) => Ok(Box::new(PatternLayout::new(pattern)?)),
                None => Ok(Box::new(PatternLayout::default())),
            }
        }
        _ => Err(Error::config("unknown layout class").with_context("class", &config.class)),
    }
}

fn build_appender(config: &AppenderConfig) -> Result<Arc<dyn Append>, Error> {
    let layout = config.layout.as_ref().map(build_layout).transpose()?;
    let option = |name: &str| {
        config
            .options
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.trim())
    };

    let appender: Box<dyn Append> = match class_name(&config.class) {
        "ConsoleAppender" => {
            let target = option("Target").unwrap_or("System.out");
            if target.eq_ignore_ascii_case("System.err") {
                let appender = Stderr::default();
                match layout {
                    Some(layout) => Box::new(appender.with_layout(layout)),
                    None => Box::new(appender),
                }
            } else if target.eq_ignore_ascii_case("System.out") {
                let appender = Stdout::default();
                match layout {
                    Some(layout) => Box::new(appender.with_layout(layout)),
                    None => Box::new(appender),
                }
            } else {
                return Err(Error::config("unknown console target").with_context("target", target));
            }
        }
        "FileAppender" => {
            let path = option("File")
                .ok_or_else(|| Error::config("file appender requires a File option"))?;
            let append = option("Append").map(parse_bool).transpose()?.unwrap_or(true);
            let appender = File::new(path, append)?;
            match layout {
                Some(layout) => Box::new(appender.with_layout(layout)),
                None => Box::new(appender),
            }
        }
        "TestingAppender" => {
            let appender = Testing::default();
            match layout {
                Some(layout) => Box::new(appender.with_layout(layout)),
                None => Box::new(appender),
            }
        }
        #[cfg(feature = "bridge-log")]
        "LogCrateAppender" => {
            let mut appender = crate::bridge::log::log_crate_appender()?;
            if let Some(pattern) = option("MessagePattern") {
                appender = appender.with_layout(PatternLayout::new(pattern)?);
            } else if let Some(layout) = layout {
                appender = appender.with_layout(layout);
            }
            Box::new(appender)
        }
        _ => {
            return Err(
                Error::config("unknown appender class").with_context("class", &config.class)
            );
        }
    };

    match option("Threshold") {
        Some(threshold) => Ok(Arc::new(Threshold::new(threshold.parse()?, appender))),
        None => Ok(Arc::from(appender)),
    }
}
