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

//! Process-wide bootstrap and reconfiguration.

use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use crate::Level;
use crate::append::Stdout;
use crate::config;
use crate::context::ContextStack;
use crate::layout::PatternLayout;
use crate::repository::Repository;
use crate::trap;

/// The environment variable naming the default configuration file.
pub const CONFIG_ENV: &str = "HIERLOG_CONFIG";

/// The pattern of the console appender installed when no configuration file is available.
pub const FALLBACK_PATTERN: &str = "%c %p: %m%n";

static DEFAULT_CONTEXT: LazyLock<ContextStack> = LazyLock::new(|| {
    let repository = Repository::new();
    apply_default_configuration(&repository);
    ContextStack::new(repository)
});

/// The process-wide context stack. The first call configures the global repository.
pub(crate) fn default_context() -> &'static ContextStack {
    &DEFAULT_CONTEXT
}

fn config_from_env() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os(CONFIG_ENV)?);
    if path.as_os_str().is_empty() {
        return None;
    }
    // readable, not merely present
    std::fs::File::open(&path).ok()?;
    Some(path)
}

fn apply_default_configuration(repository: &Repository) {
    if let Some(path) = config_from_env() {
        if let Err(err) = config::configure_file(repository, &path) {
            trap::report(&err);
        }
        return;
    }

    let root = repository.root();
    if root.appender_count() == 0 {
        let layout = match PatternLayout::new(FALLBACK_PATTERN) {
            Ok(layout) => layout,
            Err(err) => {
                trap::report(&err);
                PatternLayout::default()
            }
        };
        root.add_appender(Stdout::default().with_layout(layout));
        root.set_level(Some(Level::INFO));
    }
}

/// Reset the configuration, then configure from the file named by [`CONFIG_ENV`] if it is
/// readable, or with a console appender at [`Level::INFO`] otherwise.
///
/// The default logger goes back to the root logger.
pub fn configure() {
    let context = default_context();
    context.repository().reset_configuration();
    apply_default_configuration(context.repository());
    context.reset();
}

/// Reset the configuration, then configure from `path`.
///
/// Files ending in `.xml` are read as XML configuration, anything else as properties.
/// [`CONFIG_ENV`] is not consulted. Problems are reported to the [trap](crate::trap) and
/// whatever could be applied stays in effect. The default logger goes back to the root logger.
pub fn configure_file(path: impl AsRef<Path>) {
    let context = default_context();
    context.repository().reset_configuration();
    if let Err(err) = config::configure_file(context.repository(), path.as_ref()) {
        trap::report(&err);
    }
    context.reset();
}

/// Reset the configuration, then configure from properties text.
///
/// Behaves like [`configure_file`] on a properties file with the same content.
///
/// # Examples
///
/// ```
/// hierlog::configure_prop(
///     "log4j.rootLogger=DEBUG, CA
///      log4j.appender.CA=ConsoleAppender
///      log4j.appender.CA.layout=SimpleLayout",
/// );
/// assert!(hierlog::default_logger().is_debug_enabled());
/// ```
pub fn configure_prop(properties: &str) {
    let context = default_context();
    context.repository().reset_configuration();
    if let Err(err) = config::configure_properties(context.repository(), properties) {
        trap::report(&err);
    }
    context.reset();
}
