use crate::error::{Error, Result};
use crate::notice::{
    DEFAULT_ONE_DATE_FORMAT, DEFAULT_ONE_DATE_RE, DEFAULT_TWO_DATE_FORMAT, DEFAULT_TWO_DATE_RE,
    NoticeConfig,
};
use crate::year::Year;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings file read by the `copyright` hook unless told otherwise.
pub const DEFAULT_SETTINGS_PATH: &str = ".github/copyright.yaml";

/// File dated by the latest repository commit instead of its own history.
pub const DEFAULT_LICENSE_FILE: &str = "LICENSE";

/// Contents of the copyright settings file.
///
/// Every key is optional; unknown keys are ignored.
///
/// ```yaml
/// one_date_re: '^# Copyright \(c\) (?P<year>[0-9]{4})'
/// two_date_re: '^# Copyright \(c\) (?P<from>[0-9]{4})-(?P<to>[0-9]{4})'
/// one_date_format: '# Copyright (c) {year}'
/// two_date_format: '# Copyright (c) {from}-{to}'
/// license_file: LICENSE.txt
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoticeSettings {
    /// Single-year notice pattern
    pub one_date_re: Option<String>,
    /// Range notice pattern
    pub two_date_re: Option<String>,
    /// Single-year notice format
    pub one_date_format: Option<String>,
    /// Range notice format
    pub two_date_format: Option<String>,
    /// License file path
    pub license_file: Option<PathBuf>,
}

impl NoticeSettings {
    /// Reads the settings file, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(None);
        }
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_yaml(&text, path).map(Some)
    }

    /// Parses settings from YAML text; `origin` is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] if the text is not a valid settings mapping.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str::<Option<Self>>(text)
            .map(Option::unwrap_or_default)
            .map_err(|e| Error::yaml(origin, &e))
    }

    /// Builds the notice configuration, filling gaps with the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting patterns and formats do not agree.
    pub fn notice_config(&self) -> Result<NoticeConfig> {
        NoticeConfig::parse(
            self.one_date_re.as_deref().unwrap_or(DEFAULT_ONE_DATE_RE),
            self.two_date_re.as_deref().unwrap_or(DEFAULT_TWO_DATE_RE),
            self.one_date_format
                .as_deref()
                .unwrap_or(DEFAULT_ONE_DATE_FORMAT),
            self.two_date_format
                .as_deref()
                .unwrap_or(DEFAULT_TWO_DATE_FORMAT),
        )
    }
}

/// Configuration of a copyright update run.
///
/// Use [`CopyrightConfig::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CopyrightConfig {
    /// Files to check, in order
    pub files: Vec<PathBuf>,

    /// Notice patterns and formats
    pub notice: NoticeConfig,

    /// File dated by the latest repository commit
    pub license_file: PathBuf,

    /// A missing notice is a failure
    pub required: bool,

    /// Emit per-file diagnostics
    pub verbose: bool,

    /// Report changes without writing them
    pub dry_run: bool,

    /// Upper bound of rewritten ranges
    pub current_year: Year,
}

impl CopyrightConfig {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use precommit_utl::CopyrightConfig;
    ///
    /// let config = CopyrightConfig::builder()
    ///     .file("src/main.rs")
    ///     .required(true)
    ///     .current_year("2024".parse().unwrap())
    ///     .build()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.current_year.to_string(), "2024");
    /// ```
    #[must_use]
    pub fn builder() -> CopyrightConfigBuilder {
        CopyrightConfigBuilder::default()
    }
}

/// Builder for creating a [`CopyrightConfig`].
#[derive(Debug, Default)]
pub struct CopyrightConfigBuilder {
    files: Vec<PathBuf>,
    settings_path: Option<PathBuf>,
    notice: Option<NoticeConfig>,
    license_file: Option<PathBuf>,
    required: bool,
    verbose: bool,
    dry_run: bool,
    current_year: Option<Year>,
}

impl CopyrightConfigBuilder {
    /// Adds files to check.
    #[must_use]
    pub fn files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    /// Adds one file to check.
    #[must_use]
    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.files.push(file.into());
        self
    }

    /// Reads notice settings from this YAML file if it exists.
    ///
    /// Without it, built-in defaults are used.
    #[must_use]
    pub fn settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Uses this notice configuration instead of the settings file's.
    #[must_use]
    pub fn notice(mut self, notice: NoticeConfig) -> Self {
        self.notice = Some(notice);
        self
    }

    /// Sets the license file, overriding the settings file.
    #[must_use]
    pub fn license_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.license_file = Some(path.into());
        self
    }

    /// Treats a missing notice as a failure.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Enables per-file diagnostics.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Sets the current year instead of reading the clock.
    #[must_use]
    pub fn current_year(mut self, year: Year) -> Self {
        self.current_year = Some(year);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The settings file cannot be read or parsed
    /// - Notice patterns and formats do not agree
    /// - The clock year cannot be represented
    pub fn build(self) -> Result<CopyrightConfig> {
        let settings = match &self.settings_path {
            Some(path) => NoticeSettings::load(path)?.unwrap_or_default(),
            None => NoticeSettings::default(),
        };

        let notice = match self.notice {
            Some(notice) => notice,
            None => settings.notice_config()?,
        };

        let license_file = self
            .license_file
            .or(settings.license_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LICENSE_FILE));

        let current_year = match self.current_year {
            Some(year) => year,
            None => Year::current()?,
        };

        Ok(CopyrightConfig {
            files: self.files,
            notice,
            license_file,
            required: self.required,
            verbose: self.verbose,
            dry_run: self.dry_run,
            current_year,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let config = CopyrightConfig::builder().build().unwrap();

        assert!(config.files.is_empty());
        assert_eq!(config.license_file, PathBuf::from(DEFAULT_LICENSE_FILE));
        assert_eq!(config.notice.one_pattern().as_str(), DEFAULT_ONE_DATE_RE);
        assert!(!config.required);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = CopyrightConfig::builder()
            .settings_path(temp.path().join("copyright.yaml"))
            .build()
            .unwrap();

        assert_eq!(config.notice.two_format().as_str(), DEFAULT_TWO_DATE_FORMAT);
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let temp = assert_fs::TempDir::new().unwrap();
        let settings = temp.child("copyright.yaml");
        settings
            .write_str(
                r#"
one_date_re: '^# Copyright \(c\) (?P<year>[0-9]{4})'
two_date_re: '^# Copyright \(c\) (?P<from>[0-9]{4})-(?P<to>[0-9]{4})'
one_date_format: '# Copyright (c) {year}'
two_date_format: '# Copyright (c) {from}-{to}'
license_file: LICENSE.md
unrelated: true
"#,
            )
            .unwrap();

        let config = CopyrightConfig::builder()
            .settings_path(settings.path())
            .build()
            .unwrap();

        assert_eq!(config.notice.render_range("2020", "2021"), "# Copyright (c) 2020-2021");
        assert_eq!(config.license_file, PathBuf::from("LICENSE.md"));
    }

    #[test]
    fn test_partial_settings_keep_other_defaults() {
        let settings =
            NoticeSettings::from_yaml("license_file: COPYING\n", Path::new("s.yaml")).unwrap();
        let notice = settings.notice_config().unwrap();

        assert_eq!(notice.one_format().as_str(), DEFAULT_ONE_DATE_FORMAT);
        assert_eq!(settings.license_file, Some(PathBuf::from("COPYING")));
    }

    #[test]
    fn test_empty_settings_file() {
        let settings = NoticeSettings::from_yaml("\n", Path::new("s.yaml")).unwrap();
        assert_eq!(settings, NoticeSettings::default());
    }

    #[test]
    fn test_malformed_settings_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let settings = temp.child("copyright.yaml");
        settings.write_str("one_date_re: [unclosed\n").unwrap();

        let err = CopyrightConfig::builder()
            .settings_path(settings.path())
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::Yaml { .. }));
    }

    #[test]
    fn test_inconsistent_settings_fail_fast() {
        let temp = assert_fs::TempDir::new().unwrap();
        let settings = temp.child("copyright.yaml");
        settings
            .write_str("two_date_format: 'Copyright (c) {from}'\n")
            .unwrap();

        let err = CopyrightConfig::builder()
            .settings_path(settings.path())
            .build()
            .unwrap_err();

        assert!(err.is_config());
    }

    #[test]
    fn test_builder_overrides_settings() {
        let temp = assert_fs::TempDir::new().unwrap();
        let settings = temp.child("copyright.yaml");
        settings.write_str("license_file: COPYING\n").unwrap();

        let config = CopyrightConfig::builder()
            .settings_path(settings.path())
            .license_file("LICENSE.txt")
            .files(["a.rs", "b.rs"])
            .file("c.rs")
            .current_year("2030".parse().unwrap())
            .dry_run(true)
            .build()
            .unwrap();

        assert_eq!(config.license_file, PathBuf::from("LICENSE.txt"));
        assert_eq!(config.files.len(), 3);
        assert_eq!(config.current_year.value(), 2030);
        assert!(config.dry_run);
    }
}
