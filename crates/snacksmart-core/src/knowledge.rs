//! Markdown knowledge base injected into the system prompt.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Concatenated nutrition reference documents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    text: String,
    files: usize,
}

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every `*.md` file of `dir`, ordered by file name.
    ///
    /// A missing directory yields an empty knowledge base.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Knowledge directory not found, continuing without it");
            return Ok(Self::empty());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read knowledge directory: {}", dir.display()))?
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".md") && entry.file_type()?.is_file() {
                names.push(name);
            }
        }
        names.sort();

        let mut documents = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(&name);
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read knowledge file: {}", path.display()))?;
            documents.push((name, content));
        }

        let kb = Self::from_documents(documents);
        info!(files = kb.files, chars = kb.text.len(), "Knowledge base loaded");
        Ok(kb)
    }

    pub fn from_documents<I, N, C>(documents: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: AsRef<str>,
    {
        let mut text = String::new();
        let mut files = 0;
        for (name, content) in documents {
            text.push_str("\n\n---\n\n# File: ");
            text.push_str(name.as_ref());
            text.push_str("\n\n");
            text.push_str(content.as_ref());
            files += 1;
        }
        Self { text, files }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_count(&self) -> usize {
        self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_sorted_markdown_only() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b_zoldseg.md"), "Brokkoli: 34 kcal").unwrap();
        fs::write(dir.path().join("a_feherje.md"), "Csirkemell: 165 kcal").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::create_dir(dir.path().join("nested.md")).unwrap();

        let kb = KnowledgeBase::load(dir.path()).unwrap();
        assert_eq!(kb.file_count(), 2);
        assert_eq!(
            kb.text(),
            "\n\n---\n\n# File: a_feherje.md\n\nCsirkemell: 165 kcal\n\n---\n\n# File: b_zoldseg.md\n\nBrokkoli: 34 kcal"
        );
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::load(&dir.path().join("missing")).unwrap();
        assert!(kb.is_empty());
        assert_eq!(kb.text(), "");
    }
}
