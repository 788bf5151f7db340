//! Version-control history lookups.
//!
//! The reference year of a file is the year of the last commit touching it.
//! [`History`] is the seam to the VCS; [`GitHistory`] shells out to `git`.
//! [`YearResolver`] turns lookups into years and never fails: anything it
//! cannot find out falls back to the current year.

use crate::error::{Error, Result};
use crate::year::Year;
use serde::Serialize;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, trace, warn};

/// Which history a lookup should consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope {
    /// Commits touching the file, following renames
    File,
    /// The latest commit of the whole repository
    Repository,
}

/// What version control knows about a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// The file has uncommitted changes or is untracked
    Uncommitted,
    /// Last committed in this year
    Committed(Year),
    /// No commit touches the file
    NoHistory,
}

/// Source of version-control information.
pub trait History {
    /// Looks up the provenance of `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GitUnavailable`] when the VCS cannot be run at all and
    /// [`Error::Git`] when a query about this file fails.
    fn lookup(&self, path: &Path, scope: HistoryScope) -> Result<Provenance>;
}

impl<H: History + ?Sized> History for &H {
    fn lookup(&self, path: &Path, scope: HistoryScope) -> Result<Provenance> {
        (**self).lookup(path, scope)
    }
}

/// [`History`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitHistory {
    program: OsString,
    work_dir: Option<PathBuf>,
}

impl Default for GitHistory {
    fn default() -> Self {
        Self {
            program: OsString::from("git"),
            work_dir: None,
        }
    }
}

impl GitHistory {
    /// Runs `git` from `PATH` in the current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs git commands from `dir` instead of the current directory.
    #[must_use]
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Uses another git executable.
    #[must_use]
    pub fn program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    fn run(&self, path: &Path, args: &[&str]) -> Result<String> {
        let mut command = Command::new(&self.program);
        command.args(args);
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }
        trace!("Running git {}", args.join(" "));

        let output = command.output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::GitUnavailable {
                    message: e.to_string(),
                }
            } else {
                Error::git(path, e.to_string())
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(
                path,
                format!("git {} exited with {}: {}", args[0], output.status, stderr.trim()),
            ));
        }

        String::from_utf8(output.stdout).map_err(|e| Error::git(path, e.to_string()))
    }
}

impl History for GitHistory {
    fn lookup(&self, path: &Path, scope: HistoryScope) -> Result<Provenance> {
        let path_arg = path.to_string_lossy();

        let status = self.run(path, &["status", "--porcelain", "--", &path_arg])?;
        if !status.trim().is_empty() {
            return Ok(Provenance::Uncommitted);
        }

        let log = match scope {
            HistoryScope::File => self.run(
                path,
                &["log", "--follow", "--pretty=format:%ci", "--", &path_arg],
            )?,
            HistoryScope::Repository => self.run(path, &["log", "--pretty=format:%ci", "-1"])?,
        };

        parse_log(&log)
            .map(|year| year.map_or(Provenance::NoHistory, Provenance::Committed))
            .map_err(|e| Error::git(path, e.to_string()))
    }
}

/// Returns the year of the newest entry of a `--pretty=format:%ci` log.
fn parse_log(log: &str) -> Result<Option<Year>> {
    log.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(Year::from_git_date)
        .transpose()
}

/// How a reference year was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearSource {
    /// Year of the last commit
    Committed,
    /// File has local changes
    Uncommitted,
    /// No commit touches the file
    NoHistory,
    /// Git could not be run
    GitUnavailable,
    /// The git query failed
    GitError,
}

/// A reference year with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceYear {
    /// The year the notice should reflect
    pub year: Year,
    /// Where it came from
    pub source: YearSource,
}

/// Resolves reference years, falling back to the current year on failure.
#[derive(Debug)]
pub struct YearResolver<H> {
    history: H,
    current_year: Year,
    license_file: PathBuf,
    verbose: bool,
    no_log_reported: bool,
    no_git_reported: bool,
}

impl<H: History> YearResolver<H> {
    /// Creates a resolver.
    ///
    /// `license_file` is dated by the latest commit of the repository rather
    /// than by its own history.
    pub fn new(history: H, current_year: Year, license_file: impl Into<PathBuf>) -> Self {
        Self {
            history,
            current_year,
            license_file: license_file.into(),
            verbose: false,
            no_log_reported: false,
            no_git_reported: false,
        }
    }

    /// Enables per-file diagnostics.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Returns the reference year of `path`.
    pub fn resolve(&mut self, path: &Path) -> ReferenceYear {
        let scope = if self.is_license_file(path) {
            HistoryScope::Repository
        } else {
            HistoryScope::File
        };
        debug!("Looking up {:?} history of {}", scope, path.display());

        let current_year = self.current_year;
        let fallback = |source| ReferenceYear {
            year: current_year,
            source,
        };

        match self.history.lookup(path, scope) {
            Ok(Provenance::Committed(year)) => {
                if self.verbose {
                    info!("File '{}' was committed in {}.", path.display(), year);
                }
                ReferenceYear {
                    year,
                    source: YearSource::Committed,
                }
            }
            Ok(Provenance::Uncommitted) => {
                if self.verbose {
                    info!("File '{}' is not committed.", path.display());
                }
                fallback(YearSource::Uncommitted)
            }
            Ok(Provenance::NoHistory) => {
                if self.verbose {
                    info!("No log found with git on '{}'.", path.display());
                } else if !self.no_log_reported {
                    warn!(
                        "No log found with git on '{}' (the next messages will be hidden).",
                        path.display()
                    );
                    self.no_log_reported = true;
                }
                fallback(YearSource::NoHistory)
            }
            Err(Error::GitUnavailable { message }) => {
                if !self.no_git_reported {
                    warn!("No Git found.");
                    debug!("{}", message);
                    self.no_git_reported = true;
                }
                fallback(YearSource::GitUnavailable)
            }
            Err(e) => {
                warn!("Error with Git on '{}' ({}).", path.display(), e);
                fallback(YearSource::GitError)
            }
        }
    }

    fn is_license_file(&self, path: &Path) -> bool {
        fn normalize(path: &Path) -> &Path {
            path.strip_prefix(".").unwrap_or(path)
        }
        normalize(path) == normalize(&self.license_file)
    }
}
