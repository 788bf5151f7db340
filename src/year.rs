use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Format of a git `%ci` date, e.g. `2023-05-01 12:34:56 +0200`.
const GIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// A calendar year written with exactly four digits.
///
/// Notices compare years textually, so only values in `1000..=9999`
/// are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct Year(u16);

impl Year {
    /// Creates a year, rejecting values that do not have four digits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidYear`] outside of `1000..=9999`.
    pub fn new(value: i32) -> Result<Self> {
        u16::try_from(value)
            .ok()
            .filter(|v| (1000..=9999).contains(v))
            .map(Self)
            .ok_or_else(|| Error::InvalidYear {
                value: value.to_string(),
            })
    }

    /// Returns the current UTC calendar year.
    ///
    /// # Errors
    ///
    /// Fails only if the system clock is outside four-digit years.
    pub fn current() -> Result<Self> {
        Self::new(Utc::now().year())
    }

    /// Extracts the year of a git `%ci` timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidYear`] when the timestamp cannot be parsed.
    pub fn from_git_date(date: &str) -> Result<Self> {
        let date = date.trim();
        let parsed = DateTime::parse_from_str(date, GIT_DATE_FORMAT).map_err(|_| {
            Error::InvalidYear {
                value: date.to_string(),
            }
        })?;
        Self::new(parsed.year())
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Returns true if `text` spells exactly this year.
    #[must_use]
    pub fn is(self, text: &str) -> bool {
        text.parse::<Self>().is_ok_and(|year| year == self)
    }
}

impl FromStr for Year {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidYear {
                value: s.to_string(),
            });
        }
        s.parse::<i32>()
            .map_err(|_| Error::InvalidYear {
                value: s.to_string(),
            })
            .and_then(Self::new)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Year> for String {
    fn from(year: Year) -> Self {
        year.to_string()
    }
}
