//! # precommit-utl
//!
//! Pre-commit hooks for keeping repositories tidy.
//!
//! ## Features
//!
//! - Copyright notices kept in step with the git history of each file
//! - Configurable notice patterns and formats, validated before any file is touched
//! - Atomic rewrites that leave everything outside the notice byte-identical
//! - CI workflow check requiring `timeout-minutes` on every job
//!
//! ## Quick Start
//!
//! ```no_run
//! use precommit_utl::{CopyrightConfig, run};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = CopyrightConfig::builder()
//!     .settings_path(".github/copyright.yaml")
//!     .files(["src/main.rs", "LICENSE"])
//!     .required(true)
//!     .build()?;
//!
//! let report = run(config);
//! println!("{} file(s) updated", report.updated);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **History**: dates each file from git, falling back to the current year
//! 2. **Reconcile**: compares the notice with that year and rewrites it if needed
//! 3. **Updater**: reads, reconciles and writes back every file, collecting a report

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod file;
mod history;
mod notice;
mod reconcile;
mod updater;
mod year;

pub mod workflow;

pub use config::{
    CopyrightConfig, CopyrightConfigBuilder, DEFAULT_LICENSE_FILE, DEFAULT_SETTINGS_PATH,
    NoticeSettings,
};
pub use error::{Error, Result};
pub use file::{SourceContent, SourceFile, write_atomic};
pub use history::{
    GitHistory, History, HistoryScope, Provenance, ReferenceYear, YearResolver, YearSource,
};
pub use notice::{
    DEFAULT_ONE_DATE_FORMAT, DEFAULT_ONE_DATE_RE, DEFAULT_TWO_DATE_FORMAT, DEFAULT_TWO_DATE_RE,
    NoticeConfig, NoticeFormat, NoticePattern,
};
pub use reconcile::{Outcome, Reconciliation, reconcile};
pub use updater::{CopyrightReport, CopyrightUpdater, FileReport, FileStatus};
pub use workflow::{WorkflowChecker, WorkflowReport};
pub use year::Year;

/// Runs the copyright update over the configured files, dating them with git.
///
/// This is the main entry point for the library.
///
/// # Examples
///
/// ```no_run
/// use precommit_utl::{CopyrightConfig, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = CopyrightConfig::builder()
///     .file("src/lib.rs")
///     .build()?;
///
/// let report = run(config);
/// assert!(report.is_success());
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn run(config: CopyrightConfig) -> CopyrightReport {
    CopyrightUpdater::new(config).run()
}
