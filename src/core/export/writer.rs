//! Output tree layout
//!
//! Maps repository display paths onto the export directory and names the
//! content and metadata files of each revision.

use crate::domain::{BulkExportError, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Suffix of metadata sidecar files
pub const METADATA_SUFFIX: &str = ".metadata.properties.xml";

/// Export directory
#[derive(Debug, Clone)]
pub struct OutputTree {
    base: PathBuf,
    skip_existing: bool,
}

impl OutputTree {
    pub fn new(base: impl Into<PathBuf>, skip_existing: bool) -> Self {
        Self {
            base: base.into(),
            skip_existing,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Location of a repository path under the export directory
    ///
    /// Only normal components are kept, so `..` or a drive prefix in a
    /// repository name cannot escape the export directory.
    pub fn resolve(&self, repository_path: &str) -> PathBuf {
        let mut out = self.base.clone();
        for part in repository_path.split('/') {
            for component in Path::new(part).components() {
                if let Component::Normal(name) = component {
                    out.push(name);
                }
            }
        }
        out
    }

    /// Content file of a node, `<path>[.v<label>]`
    pub fn content_path(&self, repository_path: &str, revision: Option<&str>) -> PathBuf {
        let resolved = self.resolve(repository_path);
        match revision {
            Some(label) => with_suffix(resolved, &format!(".v{label}")),
            None => resolved,
        }
    }

    /// Metadata file of a node, `<path>.metadata.properties.xml[.v<label>]`
    pub fn metadata_path(&self, repository_path: &str, revision: Option<&str>) -> PathBuf {
        let resolved = self.resolve(repository_path);
        let suffix = match revision {
            Some(label) => format!("{METADATA_SUFFIX}.v{label}"),
            None => METADATA_SUFFIX.to_string(),
        };
        with_suffix(resolved, &suffix)
    }

    /// Creates the directory of a folder node
    pub fn create_folder(&self, repository_path: &str) -> Result<PathBuf> {
        let dir = self.resolve(repository_path);
        fs::create_dir_all(&dir).map_err(|e| {
            BulkExportError::Io(format!("Failed to create folder {}: {e}", dir.display()))
        })?;
        Ok(dir)
    }

    /// Creates the parent directory of `file`
    pub fn ensure_parent(&self, file: &Path) -> Result<()> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BulkExportError::Io(format!("Failed to create folder {}: {e}", parent.display()))
            })?;
        }
        Ok(())
    }

    /// Content is left alone when skipping existing files and it exists
    pub fn skip_content(&self, content: &Path) -> bool {
        self.skip_existing && content.exists()
    }

    /// Metadata is left alone when skipping existing files and both the
    /// content (or folder) and its metadata exist
    pub fn skip_metadata(&self, content: &Path, metadata: &Path) -> bool {
        self.skip_existing && content.exists() && metadata.exists()
    }

    pub fn write_metadata(&self, metadata: &Path, text: &str) -> Result<()> {
        self.ensure_parent(metadata)?;
        fs::write(metadata, text).map_err(|e| {
            BulkExportError::Io(format!(
                "Failed to write metadata {}: {e}",
                metadata.display()
            ))
        })
    }

    /// Writes a zero-length placeholder for unreadable content
    pub fn write_placeholder(&self, content: &Path) -> Result<()> {
        self.ensure_parent(content)?;
        fs::write(content, b"").map_err(|e| {
            BulkExportError::Io(format!(
                "Failed to write placeholder {}: {e}",
                content.display()
            ))
        })
    }
}

fn with_suffix(path: PathBuf, suffix: &str) -> PathBuf {
    let mut os: OsString = path.into_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
