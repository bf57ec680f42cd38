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

use std::collections::BTreeMap;

use crate::Error;
use crate::config::AppenderConfig;
use crate::config::Configuration;
use crate::config::LayoutConfig;
use crate::config::LoggerConfig;
use crate::config::Problems;
use crate::config::parse_bool;
use crate::config::parse_level_setting;

const MAX_SUBSTITUTION_DEPTH: usize = 8;

/// Split properties text into key-value pairs, in order of appearance.
///
/// Follows the Java properties format: `#` and `!` start comment lines, the key ends at the
/// first unescaped `=`, `:` or whitespace, a line ending in an odd number of backslashes
/// continues on the next line, and `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are decoded.
///
/// # Examples
///
/// ```
/// use hierlog::config::parse_properties;
///
/// let pairs = parse_properties("# comment\nkey = value \\\n    continued\nother:1");
/// assert_eq!(pairs[0], ("key".to_string(), "value continued".to_string()));
/// assert_eq!(pairs[1], ("other".to_string(), "1".to_string()));
/// ```
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut pairs = vec![];
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let line = line.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }
        pairs.push(split_pair(&logical));
    }
    pairs
}

fn ends_with_continuation(line: &str) -> bool {
    let backslashes = line.chars().rev().take_while(|c| *c == '\\').count();
    backslashes % 2 == 1
}

fn split_pair(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_escaped(&mut key, escaped, &mut chars);
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                // whitespace may be followed by one separator
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                chars.next_if(|c| *c == '=' || *c == ':');
                break;
            }
            c => key.push(c),
        }
    }

    while chars.next_if(|c| c.is_whitespace()).is_some() {}
    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_escaped(&mut value, escaped, &mut chars);
                }
            }
            c => value.push(c),
        }
    }
    (key, value.trim_end().to_string())
}

fn push_escaped(out: &mut String, escaped: char, chars: &mut impl Iterator<Item = char>) {
    match escaped {
        't' => out.push('\t'),
        'n' => out.push('\n'),
        'r' => out.push('\r'),
        'f' => out.push('\u{c}'),
        'u' => {
            let hex = chars.take(4).collect::<String>();
            match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                Some(c) => out.push(c),
                None => {
                    out.push('u');
                    out.push_str(&hex);
                }
            }
        }
        c => out.push(c),
    }
}

/// Expand `${name}` references from other properties, then from the environment.
fn substitute(value: &str, properties: &BTreeMap<String, String>, depth: usize) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + len];
        let replacement = match properties.get(name) {
            Some(value) if depth < MAX_SUBSTITUTION_DEPTH => {
                substitute(value, properties, depth + 1)
            }
            Some(value) => value.clone(),
            None => std::env::var(name).unwrap_or_default(),
        };
        out.push_str(&replacement);
        rest = &rest[start + 3 + len..];
    }
    out.push_str(rest);
    out
}

fn read_logger(value: &str, problems: &mut Problems) -> LoggerConfig {
    let mut parts = value.split(',');
    let mut config = LoggerConfig::default();
    if let Some(level) = parts.next() {
        let level = level.trim();
        if !level.is_empty() {
            match parse_level_setting(level) {
                Ok(level) => config.level = Some(level),
                Err(err) => problems.push(err),
            }
        }
    }
    config.appenders = parts
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    config
}

pub(crate) fn read(text: &str, problems: &mut Problems) -> Configuration {
    let raw = parse_properties(text).into_iter().collect::<BTreeMap<_, _>>();

    let mut config = Configuration::default();
    let mut additivity = BTreeMap::new();
    for (key, value) in raw.iter() {
        let value = substitute(value, &raw, 0);

        if key == "log4j.threshold" {
            match value.trim().parse() {
                Ok(level) => config.threshold = Some(level),
                Err(err) => problems.push(err),
            }
        } else if key == "log4j.rootLogger" || key == "log4j.rootCategory" {
            config.root = Some(read_logger(&value, problems));
        } else if let Some(name) = key
            .strip_prefix("log4j.logger.")
            .or_else(|| key.strip_prefix("log4j.category."))
        {
            config
                .loggers
                .push((name.to_string(), read_logger(&value, problems)));
        } else if let Some(name) = key.strip_prefix("log4j.additivity.") {
            match parse_bool(&value) {
                Ok(additive) => {
                    additivity.insert(name.to_string(), additive);
                }
                Err(err) => problems.push(err.with_context("logger", name)),
            }
        } else if let Some(rest) = key.strip_prefix("log4j.appender.") {
            read_appender_entry(&mut config, rest, value);
        }
    }

    for (name, additive) in additivity {
        match config.loggers.iter_mut().find(|(logger, _)| *logger == name) {
            Some((_, logger)) => logger.additivity = Some(additive),
            None => config.loggers.push((
                name,
                LoggerConfig {
                    additivity: Some(additive),
                    ..LoggerConfig::default()
                },
            )),
        }
    }

    for (name, appender) in config.appenders.iter() {
        if appender.class.is_empty() {
            problems.push(
                Error::config("appender options given without a class")
                    .with_context("appender", name),
            );
        }
    }
    config
}

fn read_appender_entry(config: &mut Configuration, rest: &str, value: String) {
    let (name, option) = match rest.split_once('.') {
        Some((name, option)) => (name, Some(option)),
        None => (rest, None),
    };
    let appender: &mut AppenderConfig = config.appenders.entry(name.to_string()).or_default();

    match option {
        None => appender.class = value.trim().to_string(),
        Some("layout") => {
            appender.layout.get_or_insert_with(LayoutConfig::default).class = value.trim().to_string()
        }
        Some(option) => match option.strip_prefix("layout.") {
            Some(layout_option) => appender
                .layout
                .get_or_insert_with(LayoutConfig::default)
                .options
                .push((layout_option.to_string(), value)),
            None => appender.options.push((option.to_string(), value)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use crate::config::LevelSetting;

    #[test]
    fn test_separators_and_escapes() {
        let pairs = parse_properties(
            "a=1\n\
             b : 2\n\
             c 3\n\
             ! bang comment\n\
             d\\ e=tab\\there\n\
             f=\\u0041\n\
             empty=\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
                ("d e".to_string(), "tab\there".to_string()),
                ("f".to_string(), "A".to_string()),
                ("empty".to_string(), "".to_string()),
            ]
        );
    }

    #[test]
    fn test_substitution() {
        let mut properties = BTreeMap::new();
        properties.insert("dir".to_string(), "/var/log".to_string());
        properties.insert("file".to_string(), "${dir}/app.log".to_string());

        assert_eq!(substitute("${file}", &properties, 0), "/var/log/app.log");
        assert_eq!(substitute("x${nope_not_set_anywhere}y", &properties, 0), "xy");
        assert_eq!(substitute("${unterminated", &properties, 0), "${unterminated");
    }

    #[test]
    fn test_read_configuration() {
        let mut problems = Problems::default();
        let config = read(
            "log4j.rootLogger=DEBUG, CA\n\
             log4j.logger.a.b=WARN\n\
             log4j.category.c=, CA\n\
             log4j.additivity.a.b=false\n\
             log4j.additivity.d=false\n\
             log4j.threshold=INFO\n\
             log4j.appender.CA=org.apache.log4j.ConsoleAppender\n\
             log4j.appender.CA.Target=System.err\n\
             log4j.appender.CA.layout=PatternLayout\n\
             log4j.appender.CA.layout.ConversionPattern=%-5p %c - %m%n\n",
            &mut problems,
        );
        assert!(problems.0.is_empty());

        assert_eq!(config.threshold, Some(Level::INFO));
        let root = config.root.unwrap();
        assert_eq!(root.level, Some(LevelSetting::Set(Level::DEBUG)));
        assert_eq!(root.appenders, vec!["CA"]);

        let (_, ab) = config.loggers.iter().find(|(name, _)| name == "a.b").unwrap();
        assert_eq!(ab.level, Some(LevelSetting::Set(Level::WARN)));
        assert_eq!(ab.additivity, Some(false));
        let (_, c) = config.loggers.iter().find(|(name, _)| name == "c").unwrap();
        assert_eq!(c.level, None);
        assert_eq!(c.appenders, vec!["CA"]);
        assert!(config.loggers.iter().any(|(name, _)| name == "d"));

        let appender = &config.appenders["CA"];
        assert_eq!(appender.class, "org.apache.log4j.ConsoleAppender");
        assert_eq!(appender.options, vec![("Target".to_string(), "System.err".to_string())]);
        let layout = appender.layout.as_ref().unwrap();
        assert_eq!(layout.class, "PatternLayout");
        assert_eq!(layout.options[0].1, "%-5p %c - %m%n");
    }

    #[test]
    fn test_malformed_level_is_a_problem() {
        let mut problems = Problems::default();
        let config = read("log4j.rootLogger=LOUD, CA\nlog4j.appender.CA.Target=x\n", &mut problems);
        assert_eq!(problems.0.len(), 2);
        assert_eq!(config.root.unwrap().appenders, vec!["CA"]);
    }
}
