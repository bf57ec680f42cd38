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

use std::borrow::Cow;
use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

use jiff::Zoned;
use jiff::tz::TimeZone;

use crate::Error;
use crate::layout::Layout;
use crate::record::Record;

/// The conversion pattern used when none is configured.
pub const DEFAULT_CONVERSION_PATTERN: &str = "%m%n";

/// A layout driven by a log4j style conversion pattern.
///
/// Supported conversions:
///
/// | Conversion | Output |
/// |------------|--------|
/// | `%c`, `%c{n}` | logger name, optionally only its last `n` segments |
/// | `%C` | module qualifier of the call site |
/// | `%d`, `%d{ISO8601}`, `%d{ABSOLUTE}`, `%d{DATE}`, `%d{<strftime>}` | timestamp |
/// | `%F` | source file |
/// | `%L` | line number |
/// | `%l` | `file(line)` |
/// | `%M` | function or module path |
/// | `%m` | message |
/// | `%n` | line separator |
/// | `%p` | level |
/// | `%r` | milliseconds since the first record of the process |
/// | `%t` | thread name, or [`lwp_id`](crate::lwp_id) when unnamed |
/// | `%X` | the whole MDC as `{{key,value}...}` |
/// | `%X{key}` | one MDC value |
/// | `%%` | a literal percent sign |
///
/// Every conversion accepts the `%-min.max` modifiers: `-` left-aligns, `min` pads with spaces and
/// `max` truncates from the beginning.
///
/// # Examples
///
/// ```
/// use hierlog::layout::PatternLayout;
///
/// let layout = PatternLayout::new("%-5p %c - %m%n").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    pieces: Vec<Piece>,
    timezone: TimeZone,
}

impl Default for PatternLayout {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_CONVERSION_PATTERN.to_string(),
            pieces: vec![
                Piece::Convert(Conversion::Message, Spec::default()),
                Piece::Convert(Conversion::Newline, Spec::default()),
            ],
            timezone: TimeZone::system(),
        }
    }
}

impl PatternLayout {
    /// Compile a conversion pattern.
    ///
    /// # Errors
    ///
    /// Return an error if the pattern contains an unknown conversion character, a dangling `%`
    /// or a malformed modifier.
    pub fn new(pattern: impl Into<String>) -> Result<Self, Error> {
        let pattern = pattern.into();
        let pieces = parse(&pattern)
            .map_err(|err| err.with_context("pattern", pattern.as_str()))?;
        Ok(Self {
            pattern,
            pieces,
            timezone: TimeZone::system(),
        })
    }

    /// Set the timezone for `%d`. Defaults to the system timezone.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.timezone = tz;
        self
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn convert<'r>(&self, conversion: &Conversion, record: &'r Record) -> Result<Cow<'r, str>, Error> {
        let location = record.location();
        let text = match conversion {
            Conversion::Logger(precision) => {
                Cow::Borrowed(last_segments(record.logger(), *precision))
            }
            Conversion::Qualifier => Cow::Borrowed(location.qualifier()),
            Conversion::Date(format) => {
                let zoned = record.time().to_zoned(self.timezone.clone());
                Cow::Owned(format_date(&zoned, format)?)
            }
            Conversion::File => Cow::Borrowed(location.file()),
            Conversion::Line => Cow::Owned(location.line().to_string()),
            Conversion::Location => {
                Cow::Owned(format!("{}({})", location.file(), location.line()))
            }
            Conversion::Function => Cow::Borrowed(location.function()),
            Conversion::Message => Cow::Owned(record.payload().to_string()),
            Conversion::Newline => Cow::Borrowed("\n"),
            Conversion::Level => Cow::Owned(record.level().to_string()),
            Conversion::Uptime => Cow::Owned(record.uptime().as_millis().to_string()),
            Conversion::Thread => {
                let thread = std::thread::current();
                match thread.name() {
                    Some(name) => Cow::Owned(name.to_string()),
                    None => Cow::Owned(crate::lwp_id().to_string()),
                }
            }
            Conversion::Mdc(Some(key)) => match record.mdc().get(key) {
                Some(value) => Cow::Owned(value.clone()),
                None => Cow::Borrowed(""),
            },
            Conversion::Mdc(None) => {
                let mut text = String::from("{");
                for (key, value) in record.mdc() {
                    write!(&mut text, "{{{key},{value}}}").map_err(Error::from_fmt_error)?;
                }
                text.push('}');
                Cow::Owned(text)
            }
        };
        Ok(text)
    }
}

impl Layout for PatternLayout {
    fn format(&self, record: &Record) -> Result<String, Error> {
        let mut text = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(literal) => text.push_str(literal),
                Piece::Convert(conversion, spec) => {
                    let value = self.convert(conversion, record)?;
                    spec.write(&mut text, &value);
                }
            }
        }
        Ok(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Convert(Conversion, Spec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Conversion {
    Logger(Option<usize>),
    Qualifier,
    Date(DateFormat),
    File,
    Line,
    Location,
    Function,
    Message,
    Newline,
    Level,
    Uptime,
    Thread,
    Mdc(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateFormat {
    Iso8601,
    Absolute,
    Date,
    Strftime(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Spec {
    left_align: bool,
    min: usize,
    max: Option<usize>,
}

impl Spec {
    fn write(&self, out: &mut String, value: &str) {
        let mut value = value;
        if let Some(max) = self.max {
            let len = value.chars().count();
            if len > max {
                // keep the tail, like log4j does
                let skip = value
                    .char_indices()
                    .nth(len - max)
                    .map(|(idx, _)| idx)
                    .unwrap_or(value.len());
                value = &value[skip..];
            }
        }

        let len = value.chars().count();
        let padding = self.min.saturating_sub(len);
        if !self.left_align {
            out.extend(std::iter::repeat_n(' ', padding));
        }
        out.push_str(value);
        if self.left_align {
            out.extend(std::iter::repeat_n(' ', padding));
        }
    }
}

fn last_segments(name: &str, precision: Option<usize>) -> &str {
    let Some(n) = precision.filter(|n| *n > 0) else {
        return name;
    };
    match name.rmatch_indices('.').nth(n - 1) {
        Some((idx, _)) => &name[idx + 1..],
        None => name,
    }
}

fn format_date(zoned: &Zoned, format: &DateFormat) -> Result<String, Error> {
    let millis = zoned.subsec_nanosecond() / 1_000_000;
    let mut text = String::new();
    match format {
        DateFormat::Iso8601 => write!(
            &mut text,
            "{},{millis:03}",
            zoned.strftime("%Y-%m-%d %H:%M:%S")
        ),
        DateFormat::Absolute => write!(&mut text, "{},{millis:03}", zoned.strftime("%H:%M:%S")),
        DateFormat::Date => write!(
            &mut text,
            "{},{millis:03}",
            zoned.strftime("%d %b %Y %H:%M:%S")
        ),
        DateFormat::Strftime(format) => write!(&mut text, "{}", zoned.strftime(format.as_str())),
    }
    .map_err(Error::from_fmt_error)?;
    Ok(text)
}

fn parse(pattern: &str) -> Result<Vec<Piece>, Error> {
    let mut pieces = vec![];
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }

        match chars.peek() {
            None => return Err(Error::config("dangling '%' at the end of conversion pattern")),
            Some('%') => {
                chars.next();
                literal.push('%');
                continue;
            }
            Some(_) => {}
        }

        let mut spec = Spec::default();
        if chars.peek() == Some(&'-') {
            chars.next();
            spec.left_align = true;
        }
        spec.min = read_number(&mut chars).unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            let max = read_number(&mut chars)
                .ok_or_else(|| Error::config("missing maximum width after '.'"))?;
            spec.max = Some(max);
        }

        let Some(kind) = chars.next() else {
            return Err(Error::config("missing conversion character after '%'"));
        };
        let option = read_option(&mut chars)?;
        let conversion = match kind {
            'c' => {
                let precision = option
                    .map(|option| {
                        option.trim().parse::<usize>().map_err(|err| {
                            Error::config(format!("malformed logger precision: {option}"))
                                .with_source(err)
                        })
                    })
                    .transpose()?;
                Conversion::Logger(precision)
            }
            'C' => Conversion::Qualifier,
            'd' => Conversion::Date(match option.as_deref() {
                None | Some("ISO8601") => DateFormat::Iso8601,
                Some("ABSOLUTE") => DateFormat::Absolute,
                Some("DATE") => DateFormat::Date,
                Some(format) => DateFormat::Strftime(format.to_string()),
            }),
            'F' => Conversion::File,
            'L' => Conversion::Line,
            'l' => Conversion::Location,
            'M' => Conversion::Function,
            'm' => Conversion::Message,
            'n' => Conversion::Newline,
            'p' => Conversion::Level,
            'r' => Conversion::Uptime,
            't' => Conversion::Thread,
            'X' => Conversion::Mdc(option),
            other => {
                return Err(Error::config(format!(
                    "unknown conversion character: '{other}'"
                )));
            }
        };

        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        pieces.push(Piece::Convert(conversion, spec));
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(pieces)
}

fn read_number(chars: &mut Peekable<Chars>) -> Option<usize> {
    let mut value: Option<usize> = None;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        chars.next();
        value = Some(value.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize));
    }
    value
}

fn read_option(chars: &mut Peekable<Chars>) -> Result<Option<String>, Error> {
    if chars.peek() != Some(&'{') {
        return Ok(None);
    }
    chars.next();

    let mut option = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            return Ok(Some(option));
        }
        option.push(c);
    }
    Err(Error::config("unterminated '{' in conversion pattern"))
}
