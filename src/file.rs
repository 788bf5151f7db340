use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Bytes inspected when sniffing for binary content.
const SNIFF_SIZE: usize = 8192;

/// A file read for notice reconciliation.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path as given on the command line
    pub path: PathBuf,

    /// File content
    pub content: SourceContent,
}

/// Content of a [`SourceFile`].
#[derive(Debug, Clone)]
pub enum SourceContent {
    /// UTF-8 text
    Text(String),

    /// Content with NUL bytes, not inspected further
    Binary {
        /// Size of the file in bytes
        size: u64,
    },
}

impl SourceFile {
    /// Reads a file, classifying it as text or binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if it looks like text
    /// but is not valid UTF-8.
    pub fn read(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;

        let content = if is_binary(&bytes) {
            SourceContent::Binary {
                size: bytes.len() as u64,
            }
        } else {
            let text = String::from_utf8(bytes).map_err(|_| Error::invalid_utf8(&path))?;
            SourceContent::Text(text)
        };

        Ok(Self { path, content })
    }

    /// Returns the text content if this is a text file.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            SourceContent::Text(s) => Some(s),
            SourceContent::Binary { .. } => None,
        }
    }

    /// Returns true if this is a binary file.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self.content, SourceContent::Binary { .. })
    }
}

/// Detects binary content by looking for a NUL byte near the start.
fn is_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_SIZE)];
    memchr::memchr(0, sample).is_some()
}

/// Writes a file atomically.
///
/// # Process
///
/// 1. Resolves a symbolic link to the file it points at
/// 2. Writes content to a temporary sibling of that file
/// 3. Syncs the temporary file to disk
/// 4. Copies the original permissions onto it
/// 5. Renames the temporary file over the target
///
/// # Errors
///
/// Returns an error if any step fails; the target is left untouched and the
/// temporary file is removed.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let target = resolve_link(path)?;
    let file_name = target
        .file_name()
        .ok_or_else(|| Error::config(format!("Invalid file path: {}", path.display())))?
        .to_string_lossy();
    let temp_path = target.with_file_name(format!(".{file_name}.tmp"));

    let result = write_temp(&temp_path, &target, content).and_then(|()| {
        fs::rename(&temp_path, &target).map_err(|e| Error::io(&target, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

/// Follows `path` if it is a symbolic link, so the link survives the rename.
fn resolve_link(path: &Path) -> Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => {
            fs::canonicalize(path).map_err(|e| Error::io(path, e))
        }
        _ => Ok(path.to_path_buf()),
    }
}

fn write_temp(temp_path: &Path, target: &Path, content: &str) -> Result<()> {
    let mut temp_file = fs::File::create(temp_path).map_err(|e| Error::io(temp_path, e))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    drop(temp_file);

    if let Ok(metadata) = fs::metadata(target) {
        fs::set_permissions(temp_path, metadata.permissions())
            .map_err(|e| Error::io(temp_path, e))?;
    }

    Ok(())
}
