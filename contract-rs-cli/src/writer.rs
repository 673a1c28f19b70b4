//! File writer for generated output.
//!
//! Writes generated files under the output directory, leaving files whose
//! content is already current untouched, with support for dry-run mode.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CliResult, WriteError};
use crate::generator::GeneratedOutput;

/// Result of writing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteResult {
    /// File was created or replaced.
    Written { path: PathBuf, bytes: usize },

    /// File already had the generated content.
    Unchanged { path: PathBuf },

    /// Dry run: content was not written.
    DryRun { path: PathBuf, content: String },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path, .. }
            | WriteResult::Unchanged { path }
            | WriteResult::DryRun { path, .. } => path,
        }
    }

    pub fn was_written(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }

    /// Number of bytes written (0 unless written).
    pub fn bytes(&self) -> usize {
        match self {
            WriteResult::Written { bytes, .. } => *bytes,
            _ => 0,
        }
    }
}

/// File writer with dry-run support.
#[derive(Debug)]
pub struct FileWriter {
    dry_run: bool,
}

impl FileWriter {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Write `content` to `path`, creating parent directories.
    pub fn write(&self, path: &Path, content: &str) -> CliResult<WriteResult> {
        if self.dry_run {
            return Ok(WriteResult::DryRun {
                path: path.to_path_buf(),
                content: content.to_string(),
            });
        }

        if std::fs::read_to_string(path).is_ok_and(|existing| existing == content) {
            debug!(path = %path.display(), "Output unchanged");
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| WriteError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        std::fs::write(path, content).map_err(|e| WriteError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        debug!(path = %path.display(), bytes = content.len(), "Wrote output");
        Ok(WriteResult::Written {
            path: path.to_path_buf(),
            bytes: content.len(),
        })
    }

    /// Write every generated file under `dir`.
    pub fn write_all(&self, dir: &Path, output: &GeneratedOutput) -> CliResult<Vec<WriteResult>> {
        output
            .files
            .iter()
            .map(|file| self.write(&dir.join(&file.path), &file.content))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratedFile;
    use tempfile::TempDir;

    const CONTENT: &str = "export const MoneySchema = z.number();\n";

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/billing.zod.ts");

        let result = FileWriter::new(false).write(&path, CONTENT).unwrap();

        assert_eq!(result.bytes(), CONTENT.len());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONTENT);
    }

    #[test]
    fn test_unchanged_file_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("billing.zod.ts");
        let writer = FileWriter::new(false);

        assert!(writer.write(&path, CONTENT).unwrap().was_written());
        let again = writer.write(&path, CONTENT).unwrap();
        assert_eq!(again, WriteResult::Unchanged { path: path.clone() });
        assert!(writer.write(&path, "changed").unwrap().was_written());
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("billing.zod.ts");

        let result = FileWriter::new(true).write(&path, CONTENT).unwrap();

        assert!(!path.exists());
        assert_eq!(result.bytes(), 0);
        assert_eq!(
            result,
            WriteResult::DryRun {
                path,
                content: CONTENT.to_string()
            }
        );
    }

    #[test]
    fn test_write_all() {
        let dir = TempDir::new().unwrap();
        let output = GeneratedOutput {
            files: vec![
                GeneratedFile {
                    path: PathBuf::from("billing.zod.ts"),
                    namespace: "billing".into(),
                    target: "zod".into(),
                    content: CONTENT.into(),
                },
                GeneratedFile {
                    path: PathBuf::from("billing.openapi.json"),
                    namespace: "billing".into(),
                    target: "openapi".into(),
                    content: "{}\n".into(),
                },
            ],
        };

        let results = FileWriter::new(false).write_all(dir.path(), &output).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(WriteResult::was_written));
        assert!(dir.path().join("billing.openapi.json").exists());
    }
}
