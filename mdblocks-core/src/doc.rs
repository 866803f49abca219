//! The document file: one Markdown text loaded from and saved to a path

use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A Markdown file on disk and the text last read from or written to it
#[derive(Clone, Debug)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
    pub loaded_mtime: Option<SystemTime>,
    pub rev: u64,
}

impl Document {
    /// Load a document from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            text,
            loaded_mtime: modified(path),
            rev: 1,
        })
    }

    /// Load the file, or start an empty document if it does not exist yet
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        Ok(Self {
            path: path.to_path_buf(),
            text: String::new(),
            loaded_mtime: None,
            rev: 1,
        })
    }

    /// Reload the document from disk
    pub fn reload(&mut self) -> Result<()> {
        self.text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to reload file: {}", self.path.display()))?;
        self.loaded_mtime = modified(&self.path);
        self.rev += 1;
        Ok(())
    }

    /// Write `text` to the file and remember it as the saved state
    pub fn save(&mut self, text: &str) -> Result<()> {
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write file: {}", self.path.display()))?;
        self.text = text.to_string();
        self.loaded_mtime = modified(&self.path);
        self.rev += 1;
        info!("saved {} ({} bytes)", self.path.display(), text.len());
        Ok(())
    }

    /// The file changed on disk since it was last loaded or saved
    pub fn changed_on_disk(&self) -> bool {
        match (self.loaded_mtime, modified(&self.path)) {
            (Some(loaded), Some(current)) => current > loaded,
            (None, Some(_)) => true,
            _ => false,
        }
    }

    /// File name for display
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_load_empty_file() -> Result<()> {
        let file = NamedTempFile::new()?;

        let doc = Document::load(file.path())?;
        assert_eq!(doc.text, "");
        assert_eq!(doc.rev, 1);
        assert!(doc.loaded_mtime.is_some());

        Ok(())
    }

    #[test]
    fn test_load_simple_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"# Heading\n\nSome text\n")?;

        let doc = Document::load(file.path())?;
        assert_eq!(doc.text, "# Heading\n\nSome text\n");
        assert!(!doc.changed_on_disk());

        Ok(())
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Document::load(Path::new("/nonexistent/mdblocks/file.md"));
        assert!(result.is_err());
    }

    #[test]
    fn test_open_missing_file_starts_empty() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("new.md");

        let doc = Document::open(&path)?;
        assert_eq!(doc.text, "");
        assert_eq!(doc.loaded_mtime, None);
        assert_eq!(doc.display_name(), "new.md");
        assert!(!doc.changed_on_disk());

        Ok(())
    }

    #[test]
    fn test_save_writes_and_tracks_revision() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("notes.md");

        let mut doc = Document::open(&path)?;
        doc.save("# Saved\n- item")?;
        assert_eq!(fs::read_to_string(&path)?, "# Saved\n- item");
        assert_eq!(doc.text, "# Saved\n- item");
        assert_eq!(doc.rev, 2);
        assert!(!doc.changed_on_disk());

        Ok(())
    }

    #[test]
    fn test_reload_increments_revision() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"Initial content\n")?;
        file.flush()?;

        let mut doc = Document::load(file.path())?;
        assert_eq!(doc.rev, 1);

        file.write_all(b"New content\n")?;
        file.flush()?;

        doc.reload()?;
        assert_eq!(doc.rev, 2);
        assert_eq!(doc.text, "Initial content\nNew content\n");

        Ok(())
    }
}
