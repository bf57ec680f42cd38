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

use std::fs::OpenOptions;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::Error;
use crate::Layout;
use crate::append::Append;
use crate::layout::PatternLayout;
use crate::record::Record;

/// An appender that writes log records to a single file.
///
/// Parent directories are created on demand. Every record is flushed as soon as it is written.
#[derive(Debug)]
pub struct File {
    path: PathBuf,
    layout: Box<dyn Layout>,
    writer: Mutex<Option<BufWriter<std::fs::File>>>,
}

impl File {
    /// Open `path` for writing.
    ///
    /// When `append` is `false` an existing file is truncated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its parent directory cannot be created.
    pub fn new(path: impl Into<PathBuf>, append: bool) -> Result<Self, Error> {
        let path = path.into();
        let file = open_file(&path, append)?;
        Ok(Self {
            path,
            layout: Box::new(PatternLayout::default()),
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    /// Set the layout for the [`File`] appender.
    ///
    /// Default to [`PatternLayout`] with the `%m%n` pattern.
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    /// The path this appender writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_file(path: &Path, append: bool) -> Result<std::fs::File, Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| {
                Error::from_io_error(err).with_context("path", parent.display())
            })?;
        }
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options
        .open(path)
        .map_err(|err| Error::from_io_error(err).with_context("path", path.display()))
}

impl Append for File {
    fn append(&self, record: &Record) -> Result<(), Error> {
        let text = self.layout.format(record)?;
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(writer) = writer.as_mut() else {
            return Err(Error::new(crate::ErrorKind::Io, "file appender is closed")
                .with_context("path", self.path.display()));
        };
        writer
            .write_all(text.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(Error::from_io_error)
    }

    fn flush(&self) -> Result<(), Error> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match writer.as_mut() {
            Some(writer) => writer.flush().map_err(Error::from_io_error),
            None => Ok(()),
        }
    }

    fn close(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut writer) = writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;
    use crate::LocationInfo;

    #[test]
    fn test_write_and_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");

        let record = Record::new("root", Level::INFO, "first", LocationInfo::default());
        let file = File::new(&path, true).unwrap();
        file.append(&record).unwrap();
        file.close();
        assert!(file.append(&record).is_err());

        let file = File::new(&path, true).unwrap();
        file.append(&record).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nfirst\n");

        let file = File::new(&path, false).unwrap();
        let record = Record::new("root", Level::INFO, "second", LocationInfo::default());
        file.append(&record).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
    }
}
