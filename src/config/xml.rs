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

use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

use crate::Error;
use crate::config::AppenderConfig;
use crate::config::Configuration;
use crate::config::LayoutConfig;
use crate::config::LoggerConfig;
use crate::config::Problems;
use crate::config::parse_bool;
use crate::config::parse_level_setting;

// Elements whose end tag completes a part of the configuration.
enum Scope {
    Appender(String, AppenderConfig),
    Layout(LayoutConfig),
    // `None` names the root logger
    Logger(Option<String>, LoggerConfig),
    Other,
}

pub(crate) fn read(text: &str, problems: &mut Problems) -> Configuration {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut config = Configuration::default();
    let mut scopes = vec![];
    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let scope = open(&element, &mut scopes, &mut config, problems);
                scopes.push(scope);
            }
            Ok(Event::Empty(element)) => {
                let scope = open(&element, &mut scopes, &mut config, problems);
                close(scope, &mut scopes, &mut config);
            }
            Ok(Event::End(_)) => {
                if let Some(scope) = scopes.pop() {
                    close(scope, &mut scopes, &mut config);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                problems.push(
                    Error::config("malformed XML configuration")
                        .with_context("position", reader.error_position())
                        .with_source(err),
                );
                break;
            }
        }
    }
    config
}

fn attributes(element: &BytesStart, problems: &mut Problems) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    for attribute in element.attributes() {
        let attribute = match attribute {
            Ok(attribute) => attribute,
            Err(err) => {
                problems.push(Error::config("malformed XML attribute").with_source(err));
                continue;
            }
        };
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        match attribute.unescape_value() {
            Ok(value) => {
                attributes.insert(key, value.into_owned());
            }
            Err(err) => problems.push(
                Error::config("malformed XML attribute")
                    .with_context("attribute", key)
                    .with_source(err),
            ),
        }
    }
    attributes
}

fn required(
    attributes: &mut BTreeMap<String, String>,
    element: &'static str,
    name: &'static str,
) -> Result<String, Error> {
    attributes.remove(name).ok_or_else(|| {
        Error::config("missing XML attribute")
            .with_context("element", element)
            .with_context("attribute", name)
    })
}

fn open(
    element: &BytesStart,
    scopes: &mut [Scope],
    config: &mut Configuration,
    problems: &mut Problems,
) -> Scope {
    let mut attrs = attributes(element, problems);
    let result = match element.local_name().as_ref() {
        b"configuration" => {
            if let Some(threshold) = attrs.remove("threshold") {
                match threshold.parse() {
                    Ok(threshold) => config.threshold = Some(threshold),
                    Err(err) => problems.push(err),
                }
            }
            Ok(Scope::Other)
        }
        b"appender" => required(&mut attrs, "appender", "name").and_then(|name| {
            let class = required(&mut attrs, "appender", "class")?;
            Ok(Scope::Appender(
                name,
                AppenderConfig {
                    class,
                    ..AppenderConfig::default()
                },
            ))
        }),
        b"layout" => required(&mut attrs, "layout", "class").map(|class| {
            Scope::Layout(LayoutConfig {
                class,
                options: vec![],
            })
        }),
        b"param" => required(&mut attrs, "param", "name").and_then(|name| {
            let value = required(&mut attrs, "param", "value")?;
            match scopes.last_mut() {
                Some(Scope::Layout(layout)) => layout.options.push((name, value)),
                Some(Scope::Appender(_, appender)) => appender.options.push((name, value)),
                _ => {}
            }
            Ok(Scope::Other)
        }),
        b"logger" | b"category" => {
            let element = if element.local_name().as_ref() == b"logger" {
                "logger"
            } else {
                "category"
            };
            required(&mut attrs, element, "name").and_then(|name| {
                let additivity = attrs.remove("additivity").map(|v| parse_bool(&v)).transpose()?;
                Ok(Scope::Logger(
                    Some(name),
                    LoggerConfig {
                        additivity,
                        ..LoggerConfig::default()
                    },
                ))
            })
        }
        b"root" => Ok(Scope::Logger(None, LoggerConfig::default())),
        b"level" | b"priority" => required(&mut attrs, "level", "value").and_then(|value| {
            let level = parse_level_setting(&value)?;
            if let Some(Scope::Logger(_, logger)) = scopes.last_mut() {
                logger.level = Some(level);
            }
            Ok(Scope::Other)
        }),
        b"appender-ref" => required(&mut attrs, "appender-ref", "ref").map(|name| {
            if let Some(Scope::Logger(_, logger)) = scopes.last_mut() {
                logger.appenders.push(name);
            }
            Scope::Other
        }),
        _ => Ok(Scope::Other),
    };

    result.unwrap_or_else(|err| {
        problems.push(err);
        Scope::Other
    })
}

fn close(scope: Scope, scopes: &mut [Scope], config: &mut Configuration) {
    match scope {
        Scope::Appender(name, appender) => {
            config.appenders.insert(name, appender);
        }
        Scope::Layout(layout) => {
            if let Some(Scope::Appender(_, appender)) = scopes.last_mut() {
                appender.layout = Some(layout);
            }
        }
        Scope::Logger(None, logger) => config.root = Some(logger),
        Scope::Logger(Some(name), logger) => config.loggers.push((name, logger)),
        Scope::Other => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use crate::config::LevelSetting;

    const CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<!DOCTYPE log4j:configuration SYSTEM "log4j.dtd">
<log4j:configuration xmlns:log4j="http://jakarta.apache.org/log4j/" threshold="debug">
  <appender name="CA" class="org.apache.log4j.ConsoleAppender">
    <param name="Target" value="System.err"/>
    <layout class="org.apache.log4j.PatternLayout">
      <param name="ConversionPattern" value="%-5p &lt;%c&gt; %m%n"/>
    </layout>
  </appender>
  <logger name="a.b" additivity="false">
    <level value="WARN"/>
    <appender-ref ref="CA"/>
  </logger>
  <root>
    <priority value="info"/>
    <appender-ref ref="CA"/>
  </root>
</log4j:configuration>
"#;

    #[test]
    fn test_read_configuration() {
        let mut problems = Problems::default();
        let config = read(CONFIG, &mut problems);
        assert!(problems.0.is_empty(), "{problems:?}");

        assert_eq!(config.threshold, Some(Level::DEBUG));
        let root = config.root.unwrap();
        assert_eq!(root.level, Some(LevelSetting::Set(Level::INFO)));
        assert_eq!(root.appenders, vec!["CA"]);

        let (name, logger) = &config.loggers[0];
        assert_eq!(name, "a.b");
        assert_eq!(logger.level, Some(LevelSetting::Set(Level::WARN)));
        assert_eq!(logger.additivity, Some(false));

        let appender = &config.appenders["CA"];
        assert_eq!(appender.class, "org.apache.log4j.ConsoleAppender");
        assert_eq!(appender.options, vec![("Target".to_string(), "System.err".to_string())]);
        let layout = appender.layout.as_ref().unwrap();
        assert_eq!(layout.options[0].1, "%-5p <%c> %m%n");
    }

    #[test]
    fn test_problems_are_collected() {
        let mut problems = Problems::default();
        let config = read(
            r#"<configuration>
                 <appender class="ConsoleAppender"/>
                 <root><level value="LOUD"/></root>
               </configuration>"#,
            &mut problems,
        );
        assert_eq!(problems.0.len(), 2);
        assert!(config.appenders.is_empty());
        assert_eq!(config.root.unwrap().level, None);
    }

    #[test]
    fn test_malformed_document() {
        let mut problems = Problems::default();
        read("<configuration><root></configuration>", &mut problems);
        assert_eq!(problems.0.len(), 1);
    }
}
