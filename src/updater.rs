use crate::{
    config::CopyrightConfig,
    file::{SourceFile, write_atomic},
    history::{GitHistory, History, ReferenceYear, YearResolver},
    reconcile::{Outcome, reconcile},
    year::Year,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// The notice already reflects the reference year
    UpToDate,
    /// The notice was rewritten
    Updated {
        /// Notice before the update
        before: String,
        /// Notice after the update
        after: String,
        /// False in dry run mode
        written: bool,
    },
    /// No notice found
    Missing,
    /// Not a text file
    Skipped {
        /// Why the file was not inspected
        reason: String,
    },
    /// The file could not be read or written
    Failed {
        /// Error description
        error: String,
    },
}

/// Result for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// File path
    pub path: PathBuf,

    /// Year the notice was expected to reflect
    pub reference: ReferenceYear,

    /// Whether the file was already compliant
    pub ok: bool,

    /// What happened
    pub status: FileStatus,
}

/// Statistics collected during a copyright update run.
#[derive(Debug, Clone, Serialize)]
pub struct CopyrightReport {
    /// Upper bound used for rewritten ranges
    pub current_year: Year,

    /// Number of files checked
    pub checked: usize,

    /// Files whose notice was current
    pub up_to_date: usize,

    /// Files whose notice was rewritten
    pub updated: usize,

    /// Files without a notice
    pub missing: usize,

    /// Binary files skipped
    pub skipped: usize,

    /// Files that could not be processed
    pub failed: usize,

    /// Total execution time
    pub duration: Duration,

    /// Per-file results, in input order
    pub files: Vec<FileReport>,
}

impl CopyrightReport {
    /// Creates a report from per-file results.
    #[must_use]
    pub fn new(current_year: Year, files: Vec<FileReport>, duration: Duration) -> Self {
        let count = |pred: fn(&FileStatus) -> bool| files.iter().filter(|f| pred(&f.status)).count();

        Self {
            current_year,
            checked: files.len(),
            up_to_date: count(|s| matches!(s, FileStatus::UpToDate)),
            updated: count(|s| matches!(s, FileStatus::Updated { .. })),
            missing: count(|s| matches!(s, FileStatus::Missing)),
            skipped: count(|s| matches!(s, FileStatus::Skipped { .. })),
            failed: count(|s| matches!(s, FileStatus::Failed { .. })),
            duration,
            files,
        }
    }

    /// Returns true if every file was already compliant.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.files.iter().all(|f| f.ok)
    }

    /// Paths of the files that were not compliant.
    pub fn offending_files(&self) -> impl Iterator<Item = &Path> {
        self.files
            .iter()
            .filter(|f| !f.ok)
            .map(|f| f.path.as_path())
    }
}

/// Checks and updates the copyright notice of each configured file.
pub struct CopyrightUpdater<H> {
    config: CopyrightConfig,
    resolver: YearResolver<H>,
}

impl CopyrightUpdater<GitHistory> {
    /// Creates an updater that dates files with git.
    #[must_use]
    pub fn new(config: CopyrightConfig) -> Self {
        Self::with_history(config, GitHistory::new())
    }
}

impl<H: History> CopyrightUpdater<H> {
    /// Creates an updater with another source of history.
    pub fn with_history(config: CopyrightConfig, history: H) -> Self {
        let resolver = YearResolver::new(history, config.current_year, &config.license_file)
            .verbose(config.verbose);
        Self { config, resolver }
    }

    /// Processes every file and returns the report.
    ///
    /// A failure on one file is recorded in its [`FileReport`] and does not
    /// stop the run.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use precommit_utl::{CopyrightConfig, CopyrightUpdater};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = CopyrightConfig::builder()
    ///     .settings_path(".github/copyright.yaml")
    ///     .files(["src/lib.rs", "LICENSE"])
    ///     .build()?;
    ///
    /// let report = CopyrightUpdater::new(config).run();
    /// if !report.is_success() {
    ///     std::process::exit(1);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(files = self.config.files.len()))]
    pub fn run(mut self) -> CopyrightReport {
        let start_time = Instant::now();
        let files = std::mem::take(&mut self.config.files);

        let reports: Vec<_> = files.into_iter().map(|path| self.process(path)).collect();

        let report = CopyrightReport::new(self.config.current_year, reports, start_time.elapsed());
        debug!(
            "Checked {} files: {} up to date, {} updated, {} missing, {} skipped, {} failed",
            report.checked,
            report.up_to_date,
            report.updated,
            report.missing,
            report.skipped,
            report.failed
        );
        report
    }

    /// Processes a single file.
    fn process(&mut self, path: PathBuf) -> FileReport {
        let reference = self.resolver.resolve(&path);

        let source = match SourceFile::read(&path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Failed to read '{}': {}", path.display(), e);
                return FileReport {
                    path,
                    reference,
                    ok: false,
                    status: FileStatus::Failed {
                        error: e.to_string(),
                    },
                };
            }
        };

        let Some(text) = source.text() else {
            debug!("Skipping binary file '{}'", path.display());
            return FileReport {
                path,
                reference,
                ok: true,
                status: FileStatus::Skipped {
                    reason: "binary content".to_string(),
                },
            };
        };

        let result = reconcile(
            text,
            reference.year,
            &self.config.notice,
            self.config.required,
            self.config.current_year,
        );
        let ok = result.is_ok();

        let status = match result.outcome() {
            Outcome::UpToDate => FileStatus::UpToDate,
            Outcome::Missing => {
                if self.config.required {
                    warn!("No copyright found on '{}'.", path.display());
                } else if self.config.verbose {
                    info!("No copyright found on '{}'.", path.display());
                }
                FileStatus::Missing
            }
            Outcome::Rewritten { before, after } => {
                let (before, after) = (before.clone(), after.clone());
                self.write_back(&path, result.content(), before, after)
            }
        };

        FileReport {
            path,
            reference,
            ok,
            status,
        }
    }

    /// Persists a rewritten document unless in dry run mode.
    fn write_back(&self, path: &Path, content: &str, before: String, after: String) -> FileStatus {
        if self.config.dry_run {
            info!(
                "Copyright of '{}' is outdated: '{}' -> '{}' (dry run)",
                path.display(),
                before,
                after
            );
            return FileStatus::Updated {
                before,
                after,
                written: false,
            };
        }

        if let Err(e) = write_atomic(path, content) {
            warn!("Failed to write '{}': {}", path.display(), e);
            return FileStatus::Failed {
                error: e.to_string(),
            };
        }

        if self.config.verbose {
            info!("Copyright updated in '{}'.", path.display());
        }
        FileStatus::Updated {
            before,
            after,
            written: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::history::tests::FakeHistory;
    use crate::history::{Provenance, YearSource};
    use crate::notice::NoticeConfig;
    use assert_fs::prelude::*;

    fn year(s: &str) -> Year {
        s.parse().unwrap()
    }

    fn config(files: &[&Path]) -> CopyrightConfig {
        CopyrightConfig::builder()
            .files(files.iter().copied())
            .current_year(year("2024"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_updates_outdated_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("lib.rs");
        file.write_str("// Copyright (c) 2020 ACME\npub fn f() {}\n").unwrap();

        let history =
            FakeHistory::default().with(file.path(), Ok(Provenance::Committed(year("2023"))));
        let report = CopyrightUpdater::with_history(config(&[file.path()]), &history).run();

        file.assert("// Copyright (c) 2020-2024 ACME\npub fn f() {}\n");
        assert!(!report.is_success());
        assert_eq!(report.updated, 1);
        assert_eq!(
            report.files[0].status,
            FileStatus::Updated {
                before: "Copyright (c) 2020".to_string(),
                after: "Copyright (c) 2020-2024".to_string(),
                written: true,
            }
        );
        assert_eq!(report.files[0].reference.year, year("2023"));
    }

    #[test]
    fn test_up_to_date_file_is_untouched() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("lib.rs");
        file.write_str("# Copyright (c) 2019-2023\n").unwrap();

        let history =
            FakeHistory::default().with(file.path(), Ok(Provenance::Committed(year("2023"))));
        let report = CopyrightUpdater::with_history(config(&[file.path()]), &history).run();

        file.assert("# Copyright (c) 2019-2023\n");
        assert!(report.is_success());
        assert_eq!(report.up_to_date, 1);
        assert_eq!(report.offending_files().count(), 0);
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("lib.rs");
        file.write_str("Copyright (c) 2020\n").unwrap();

        let config = CopyrightConfig::builder()
            .file(file.path())
            .current_year(year("2024"))
            .dry_run(true)
            .build()
            .unwrap();
        let report = CopyrightUpdater::with_history(config, FakeHistory::default()).run();

        file.assert("Copyright (c) 2020\n");
        assert!(!report.is_success());
        assert!(matches!(
            report.files[0].status,
            FileStatus::Updated { written: false, .. }
        ));
    }

    #[test]
    fn test_missing_notice_depends_on_required() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("README.md");
        file.write_str("toto").unwrap();

        let lenient = CopyrightUpdater::with_history(config(&[file.path()]), FakeHistory::default())
            .run();
        assert!(lenient.is_success());
        assert_eq!(lenient.missing, 1);

        let strict = CopyrightConfig::builder()
            .file(file.path())
            .current_year(year("2024"))
            .required(true)
            .build()
            .unwrap();
        let strict = CopyrightUpdater::with_history(strict, FakeHistory::default()).run();
        assert!(!strict.is_success());
        file.assert("toto");
    }

    #[test]
    fn test_unreadable_file_does_not_stop_run() {
        let temp = assert_fs::TempDir::new().unwrap();
        let missing = temp.child("gone.rs");
        let file = temp.child("lib.rs");
        file.write_str("Copyright (c) 2024\n").unwrap();

        let report = CopyrightUpdater::with_history(
            config(&[missing.path(), file.path()]),
            FakeHistory::default(),
        )
        .run();

        assert_eq!(report.failed, 1);
        assert_eq!(report.up_to_date, 1);
        assert!(!report.is_success());
        let offending: Vec<_> = report.offending_files().collect();
        assert_eq!(offending, vec![missing.path()]);
    }

    #[test]
    fn test_binary_file_is_skipped() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("logo.png");
        file.write_binary(b"\x89PNG\0\0Copyright (c) 2001").unwrap();

        let report =
            CopyrightUpdater::with_history(config(&[file.path()]), FakeHistory::default()).run();

        assert!(report.is_success());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_git_failure_falls_back_to_current_year() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("lib.rs");
        file.write_str("Copyright (c) 2024\n").unwrap();

        let history = FakeHistory::default().with(
            file.path(),
            Err(Error::GitUnavailable {
                message: "not found".to_string(),
            }),
        );
        let report = CopyrightUpdater::with_history(config(&[file.path()]), &history).run();

        assert!(report.is_success());
        assert_eq!(report.files[0].reference.source, YearSource::GitUnavailable);
        assert_eq!(report.files[0].reference.year, year("2024"));
    }

    #[test]
    fn test_custom_notice_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("setup.py");
        file.write_str("# Copyright (c) 2022\nimport os\n").unwrap();

        let notice = NoticeConfig::parse(
            r"^# Copyright \(c\) (?P<year>[0-9]{4})",
            r"^# Copyright \(c\) (?P<from>[0-9]{4})-(?P<to>[0-9]{4})",
            "# Copyright (c) {year}",
            "# Copyright (c) {from}-{to}",
        )
        .unwrap();
        let config = CopyrightConfig::builder()
            .file(file.path())
            .notice(notice)
            .current_year(year("2023"))
            .build()
            .unwrap();
        let history =
            FakeHistory::default().with(file.path(), Ok(Provenance::Committed(year("2023"))));

        CopyrightUpdater::with_history(config, &history).run();

        file.assert("# Copyright (c) 2022-2023\nimport os\n");
    }

    #[test]
    fn test_second_run_is_clean() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("lib.rs");
        file.write_str("Copyright (c) 2024-2024\n").unwrap();

        let first =
            CopyrightUpdater::with_history(config(&[file.path()]), FakeHistory::default()).run();
        let second =
            CopyrightUpdater::with_history(config(&[file.path()]), FakeHistory::default()).run();

        assert!(!first.is_success());
        assert!(second.is_success());
        file.assert("Copyright (c) 2024\n");
    }

    #[test]
    fn test_report_serializes() {
        let report = CopyrightReport::new(year("2024"), Vec::new(), Duration::from_millis(5));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["current_year"], "2024");
        assert_eq!(json["checked"], 0);
        assert!(report.is_success());
    }
}
