//! Checks that every job of a CI workflow declares `timeout-minutes`.
//!
//! Only the `jobs` mapping is inspected; the rest of the workflow is not
//! validated.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use serde_yaml::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

/// Directory holding GitHub workflows, relative to the repository root.
pub const WORKFLOWS_DIR: &str = ".github/workflows";

const WORKFLOW_GLOBS: &[&str] = &["*.yaml", "*.yml"];
const TIMEOUT_KEY: &str = "timeout-minutes";

/// A job without a timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTimeout {
    /// Workflow file
    pub workflow: PathBuf,
    /// Job identifier
    pub job: String,
}

impl fmt::Display for MissingTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The workflow '{}', job '{}' has no timeout",
            self.workflow.display(),
            self.job
        )
    }
}

/// Result of a workflow check.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkflowReport {
    /// Workflow files inspected
    pub checked: Vec<PathBuf>,
    /// Jobs without a timeout
    pub violations: Vec<MissingTimeout>,
}

impl WorkflowReport {
    /// Returns true if every job declares a timeout.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Checks workflow files for job timeouts.
#[derive(Debug, Clone)]
pub struct WorkflowChecker {
    root: PathBuf,
    globs: GlobSet,
}

impl WorkflowChecker {
    /// Creates a checker discovering workflows under `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow globs cannot be compiled.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            globs: build_globset(WORKFLOW_GLOBS)?,
        })
    }

    /// Lists `*.yaml` and `*.yml` files of the workflows directory, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory exists but cannot be listed.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(WORKFLOWS_DIR);
        if !dir.is_dir() {
            debug!("No workflow directory at {}", dir.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&dir).to_path_buf();
                Error::io(path, e.into())
            })?;
            if entry.file_type().is_file() && self.globs.is_match(entry.file_name()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Checks the given workflows, or the discovered ones if `files` is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a workflow cannot be read or is not valid YAML.
    #[instrument(skip(self, files), fields(root = %self.root.display()))]
    pub fn check(&self, files: &[PathBuf]) -> Result<WorkflowReport> {
        let files = if files.is_empty() {
            self.discover()?
        } else {
            files.to_vec()
        };

        let mut report = WorkflowReport::default();
        for file in files {
            report.violations.extend(check_file(&file)?);
            report.checked.push(file);
        }

        debug!(
            "Checked {} workflows, {} jobs without timeout",
            report.checked.len(),
            report.violations.len()
        );
        Ok(report)
    }
}

/// Checks one workflow file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML.
pub fn check_file(path: &Path) -> Result<Vec<MissingTimeout>> {
    trace!("Checking workflow {}", path.display());
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let workflow: Value = serde_yaml::from_str(&text).map_err(|e| Error::yaml(path, &e))?;

    Ok(jobs_without_timeout(&workflow)
        .into_iter()
        .map(|job| MissingTimeout {
            workflow: path.to_path_buf(),
            job,
        })
        .collect())
}

/// Names of the jobs of a parsed workflow that lack `timeout-minutes`.
///
/// A workflow without a `jobs` mapping has no jobs to check.
#[must_use]
pub fn jobs_without_timeout(workflow: &Value) -> Vec<String> {
    let Some(jobs) = workflow.get("jobs").and_then(Value::as_mapping) else {
        return Vec::new();
    };

    jobs.iter()
        .filter(|(_, job)| job.get(TIMEOUT_KEY).is_none_or(Value::is_null))
        .map(|(name, _)| job_name(name))
        .collect()
}

fn job_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| Error::invalid_pattern(*pattern, e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to build workflow globs: {e}")))
}
