use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the precommit-utl library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// A notice regular expression does not compile.
    #[error("Invalid notice pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// A notice format template cannot be parsed.
    #[error("Invalid notice format '{format}': {reason}")]
    InvalidFormat {
        /// The offending template
        format: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Pattern and format of a notice form disagree.
    #[error("Notice pattern and format do not agree ({form} form): {reason}")]
    NoticeMismatch {
        /// Which notice form, `single-year` or `range`
        form: &'static str,
        /// What disagrees
        reason: String,
    },

    /// Invalid year value.
    #[error("Invalid year '{value}': expected exactly four digits")]
    InvalidYear {
        /// The rejected value
        value: String,
    },

    /// The git executable could not be started.
    #[error("Git is not available: {message}")]
    GitUnavailable {
        /// Error message
        message: String,
    },

    /// A git query failed for a file.
    #[error("Git query failed on '{path}': {message}")]
    Git {
        /// File the query was about
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Invalid UTF-8 encountered in file.
    #[error("Invalid UTF-8 encoding in file '{path}'. File may be binary or use unsupported encoding.")]
    InvalidUtf8 {
        /// Path to file with encoding issues
        path: PathBuf,
    },

    /// YAML parse error.
    #[error("YAML error in '{path}': {message}")]
    Yaml {
        /// File being parsed
        path: PathBuf,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid format error.
    #[must_use]
    pub fn invalid_format(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            format: format.into(),
            reason: reason.into(),
        }
    }

    /// Creates a pattern/format mismatch error.
    #[must_use]
    pub fn notice_mismatch(form: &'static str, reason: impl Into<String>) -> Self {
        Self::NoticeMismatch {
            form,
            reason: reason.into(),
        }
    }

    /// Creates a git error for a file.
    #[must_use]
    pub fn git(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Git {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid UTF-8 error.
    #[must_use]
    pub fn invalid_utf8(path: impl Into<PathBuf>) -> Self {
        Self::InvalidUtf8 { path: path.into() }
    }

    /// Creates a YAML error for a file.
    #[must_use]
    pub fn yaml(path: impl Into<PathBuf>, source: &serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this error comes from loading or validating configuration.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidFormat { .. }
                | Self::NoticeMismatch { .. }
        )
    }
}
