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

//! Hierlog is a hierarchical logging facade with a default-logger context stack, thread-scoped
//! diagnostic context and bridging into other logging runtimes.
//!
//! # Overview
//!
//! Loggers are named by dotted paths (`"app"`, `"app.db"`, ...) and inherit their level from the
//! closest configured ancestor. Messages logged without naming a logger go to the default
//! logger, whose name is built by pushing and popping context segments. Output is configured
//! with log4j style properties or XML; without configuration, INFO and above is printed to
//! stdout.
//!
//! The configuration file named by the `HIERLOG_CONFIG` environment variable is applied the
//! first time the default logger is needed.
//!
//! # Examples
//!
//! ```
//! hierlog::configure_prop(
//!     "log4j.rootLogger=DEBUG, CA
//!      log4j.appender.CA=ConsoleAppender
//!      log4j.appender.CA.layout=PatternLayout
//!      log4j.appender.CA.layout.ConversionPattern=%-5p %c - %m%n",
//! );
//!
//! hierlog::info!("started with {} workers", 4);
//! {
//!     let _ctx = hierlog::LogContext::new("worker").unwrap();
//!     hierlog::debugs!("processing item ", 17);
//! }
//! hierlog::warn!(logger: "app.db", "slow query");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod append;
pub mod bridge;
pub mod config;
pub mod diagnostic;
pub mod layout;
pub mod record;
pub mod repository;
pub mod trap;

mod context;
mod error;
mod init;
mod logger;
mod macros;
mod mdc_init;
mod utility;

pub use append::Append;
pub use context::ContextStack;
pub use context::LogContext;
pub use context::SEPARATOR;
pub use error::Error;
pub use error::ErrorKind;
pub use init::CONFIG_ENV;
pub use init::FALLBACK_PATTERN;
pub use init::configure;
pub use init::configure_file;
pub use init::configure_prop;
pub use layout::Layout;
pub use logger::Log;
pub use logger::TemporaryLevel;
pub use logger::default_logger;
pub use logger::default_logger_name;
pub use logger::pop_context;
pub use logger::push_context;
pub use logger::trace_set_at;
pub use macros::AsLog;
pub use mdc_init::is_thread_initialized;
pub use mdc_init::register_mdc_init;
pub use record::Level;
pub use record::LocationInfo;
pub use utility::lwp_id;
