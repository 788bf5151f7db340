//! Copyright notice patterns and format templates.
//!
//! A notice comes in two forms: a single year (`Copyright (c) 2024`) and a
//! range (`Copyright (c) 2020-2024`). Each form is described by a regular
//! expression that finds it and a template that writes it. The two halves
//! are validated against each other when a [`NoticeConfig`] is built, so a
//! mismatch is reported before any file is touched.

use crate::error::{Error, Result};
use crate::year::Year;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// Default single-year notice pattern.
pub const DEFAULT_ONE_DATE_RE: &str = r"\bCopyright \(c\) (?P<year>[0-9]{4})\b";
/// Default range notice pattern.
pub const DEFAULT_TWO_DATE_RE: &str = r"\bCopyright \(c\) (?P<from>[0-9]{4})-(?P<to>[0-9]{4})\b";
/// Default single-year notice format.
pub const DEFAULT_ONE_DATE_FORMAT: &str = "Copyright (c) {year}";
/// Default range notice format.
pub const DEFAULT_TWO_DATE_FORMAT: &str = "Copyright (c) {from}-{to}";

pub(crate) const YEAR: &str = "year";
pub(crate) const FROM: &str = "from";
pub(crate) const TO: &str = "to";

const SINGLE_FORM: &str = "single-year";
const RANGE_FORM: &str = "range";

// Years tried by the round-trip check after the clock year.
const SAMPLE_YEARS: RangeInclusive<u16> = 1970..=2099;

static DEFAULT_NOTICE: Lazy<NoticeConfig> = Lazy::new(|| {
    NoticeConfig::parse(
        DEFAULT_ONE_DATE_RE,
        DEFAULT_TWO_DATE_RE,
        DEFAULT_ONE_DATE_FORMAT,
        DEFAULT_TWO_DATE_FORMAT,
    )
    .expect("built-in notice configuration is valid")
});

/// A compiled notice regular expression.
#[derive(Debug, Clone)]
pub struct NoticePattern {
    regex: Regex,
}

impl NoticePattern {
    /// Compiles a notice pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if the expression does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
    }

    /// Returns the source expression.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns true if the pattern defines a capture group with this name.
    #[must_use]
    pub fn has_group(&self, name: &str) -> bool {
        self.regex.capture_names().flatten().any(|n| n == name)
    }

    /// Finds the first notice in `haystack`.
    pub(crate) fn find<'h>(&self, haystack: &'h str) -> Option<Captures<'h>> {
        self.regex.captures(haystack)
    }
}

impl FromStr for NoticePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A notice template such as `Copyright (c) {from}-{to}`.
///
/// `{name}` is replaced by the value bound to `name`; `{{` and `}}` stand for
/// literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeFormat {
    source: String,
    segments: Vec<Segment>,
}

impl NoticeFormat {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] on an unclosed or empty placeholder,
    /// a placeholder name that is not an identifier, or an unescaped `}`.
    pub fn new(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) if c.is_alphanumeric() || c == '_' => name.push(c),
                            Some(c) => {
                                return Err(Error::invalid_format(
                                    template,
                                    format!("unexpected '{c}' in placeholder"),
                                ));
                            }
                            None => {
                                return Err(Error::invalid_format(
                                    template,
                                    "unclosed placeholder",
                                ));
                            }
                        }
                    }
                    if name.is_empty() {
                        return Err(Error::invalid_format(template, "empty placeholder '{}'"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(Error::invalid_format(
                        template,
                        "single '}' must be written as '}}'",
                    ));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Returns the template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the distinct placeholder names.
    #[must_use]
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Renders the template. Placeholders without a binding are written back
    /// verbatim; a validated [`NoticeConfig`] never produces any.
    #[must_use]
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    match values.iter().find(|(key, _)| *key == name.as_str()) {
                        Some((_, value)) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(name);
                            out.push('}');
                        }
                    }
                }
            }
        }
        out
    }
}

impl FromStr for NoticeFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for NoticeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Validated patterns and formats for both notice forms.
#[derive(Debug, Clone)]
pub struct NoticeConfig {
    one_pattern: NoticePattern,
    two_pattern: NoticePattern,
    one_format: NoticeFormat,
    two_format: NoticeFormat,
}

impl NoticeConfig {
    /// Pairs patterns with formats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoticeMismatch`] if:
    /// - the single-year pattern lacks a `year` group, or the range pattern
    ///   lacks `from` or `to`
    /// - a format uses a placeholder its form does not provide, or omits one
    ///   it requires
    /// - a rendered sample notice is not found again by its own pattern
    pub fn new(
        one_pattern: NoticePattern,
        two_pattern: NoticePattern,
        one_format: NoticeFormat,
        two_format: NoticeFormat,
    ) -> Result<Self> {
        check_form(SINGLE_FORM, &one_pattern, &one_format, &[YEAR])?;
        check_form(RANGE_FORM, &two_pattern, &two_format, &[FROM, TO])?;

        let config = Self {
            one_pattern,
            two_pattern,
            one_format,
            two_format,
        };
        config.check_round_trip()?;
        Ok(config)
    }

    /// Compiles and validates a configuration from its textual parts.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern or format does not parse, or if they
    /// disagree (see [`NoticeConfig::new`]).
    pub fn parse(
        one_pattern: &str,
        two_pattern: &str,
        one_format: &str,
        two_format: &str,
    ) -> Result<Self> {
        Self::new(
            one_pattern.parse()?,
            two_pattern.parse()?,
            one_format.parse()?,
            two_format.parse()?,
        )
    }

    /// Single-year pattern.
    #[must_use]
    pub const fn one_pattern(&self) -> &NoticePattern {
        &self.one_pattern
    }

    /// Range pattern.
    #[must_use]
    pub const fn two_pattern(&self) -> &NoticePattern {
        &self.two_pattern
    }

    /// Single-year format.
    #[must_use]
    pub const fn one_format(&self) -> &NoticeFormat {
        &self.one_format
    }

    /// Range format.
    #[must_use]
    pub const fn two_format(&self) -> &NoticeFormat {
        &self.two_format
    }

    /// Writes a single-year notice.
    #[must_use]
    pub fn render_single(&self, year: &str) -> String {
        self.one_format.render(&[(YEAR, year)])
    }

    /// Writes a range notice.
    #[must_use]
    pub fn render_range(&self, from: &str, to: &str) -> String {
        self.two_format.render(&[(FROM, from), (TO, to)])
    }

    /// Checks that each format writes a notice its pattern finds again.
    ///
    /// Patterns may restrict the years they accept, so the check passes as
    /// soon as one sample year round-trips.
    fn check_round_trip(&self) -> Result<()> {
        if !sample_years().any(|year| self.single_round_trips(&year.to_string())) {
            let single = self.render_single(&first_sample().to_string());
            return Err(Error::notice_mismatch(
                SINGLE_FORM,
                format!(
                    "'{single}' written by '{}' is not matched by '{}'",
                    self.one_format,
                    self.one_pattern.as_str()
                ),
            ));
        }

        let range_round_trips = sample_years()
            .any(|to| self.range_round_trips(&(to - 1).to_string(), &to.to_string()));
        if !range_round_trips {
            let to = first_sample();
            let range = self.render_range(&(to - 1).to_string(), &to.to_string());
            return Err(Error::notice_mismatch(
                RANGE_FORM,
                format!(
                    "'{range}' written by '{}' is not matched by '{}'",
                    self.two_format,
                    self.two_pattern.as_str()
                ),
            ));
        }

        Ok(())
    }

    fn single_round_trips(&self, year: &str) -> bool {
        let single = self.render_single(year);
        self.one_pattern
            .find(&single)
            .and_then(|caps| caps.name(YEAR).map(|m| m.as_str() == year))
            .unwrap_or(false)
    }

    fn range_round_trips(&self, from: &str, to: &str) -> bool {
        let range = self.render_range(from, to);
        self.two_pattern
            .find(&range)
            .and_then(|caps| {
                let found_from = caps.name(FROM)?.as_str();
                let found_to = caps.name(TO)?.as_str();
                Some(found_from == from && found_to == to)
            })
            .unwrap_or(false)
    }
}

/// Clock year first, then a sweep of plausible notice years.
fn sample_years() -> impl Iterator<Item = u16> {
    Year::current()
        .ok()
        .map(Year::value)
        .into_iter()
        .chain(SAMPLE_YEARS)
}

fn first_sample() -> u16 {
    sample_years().next().unwrap_or(*SAMPLE_YEARS.end())
}

impl Default for NoticeConfig {
    fn default() -> Self {
        DEFAULT_NOTICE.clone()
    }
}

fn check_form(
    form: &'static str,
    pattern: &NoticePattern,
    format: &NoticeFormat,
    groups: &[&str],
) -> Result<()> {
    for group in groups {
        if !pattern.has_group(group) {
            return Err(Error::notice_mismatch(
                form,
                format!("pattern '{}' has no '{group}' group", pattern.as_str()),
            ));
        }
    }

    let placeholders = format.placeholders();
    if let Some(unknown) = placeholders.iter().find(|name| !groups.contains(*name)) {
        return Err(Error::notice_mismatch(
            form,
            format!(
                "format '{format}' uses '{{{unknown}}}', expected only {}",
                groups.join(", ")
            ),
        ));
    }
    if let Some(missing) = groups.iter().find(|group| !placeholders.contains(*group)) {
        return Err(Error::notice_mismatch(
            form,
            format!("format '{format}' never writes '{{{missing}}}'"),
        ));
    }

    Ok(())
}
