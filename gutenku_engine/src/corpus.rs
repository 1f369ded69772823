// Chapter input for training and verse extraction.
//
// Book ingestion proper happens upstream; the engine only needs chapter
// text. For the CLI this module reads plain-text files: a directory
// contributes one chapter per `.txt` file (in sorted path order, so runs are
// reproducible), and a single file is split on `CHAPTER ...` heading lines.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

static CHAPTER_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*chapter\b[^\n]*$").expect("chapter heading pattern is valid")
});

/// One chapter of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: Option<String>,
    pub content: String,
}

impl Chapter {
    pub fn new(content: impl Into<String>) -> Self {
        Chapter {
            title: None,
            content: content.into(),
        }
    }

    pub fn titled(title: impl Into<String>, content: impl Into<String>) -> Self {
        Chapter {
            title: Some(title.into()),
            content: content.into(),
        }
    }
}

/// Split a whole book into chapters on heading lines. Text before the first
/// heading is dropped when headings exist (front matter); without headings
/// the whole text is one chapter.
pub fn split_book(text: &str) -> Vec<Chapter> {
    let headings: Vec<_> = CHAPTER_HEADING.find_iter(text).collect();
    if headings.is_empty() {
        return if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![Chapter::new(text.trim())]
        };
    }

    let mut chapters = Vec::with_capacity(headings.len());
    for (i, heading) in headings.iter().enumerate() {
        let end = headings.get(i + 1).map_or(text.len(), |next| next.start());
        let body = text[heading.end()..end].trim();
        if !body.is_empty() {
            chapters.push(Chapter::titled(heading.as_str().trim(), body));
        }
    }
    chapters
}

/// Read chapters from files and directories.
pub fn load_chapters(paths: &[PathBuf]) -> Result<Vec<Chapter>> {
    let mut chapters = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files = fs::read_dir(path)?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<Vec<PathBuf>>>()?;
            files.retain(|p| p.extension().is_some_and(|ext| ext == "txt"));
            files.sort();
            for file in files {
                chapters.push(read_chapter_file(&file)?);
            }
        } else {
            chapters.extend(split_book(&fs::read_to_string(path)?));
        }
    }
    info!(chapters = chapters.len(), sources = paths.len(), "loaded corpus");
    Ok(chapters)
}

fn read_chapter_file(path: &Path) -> Result<Chapter> {
    let content = fs::read_to_string(path)?;
    let title = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned());
    Ok(Chapter { title, content })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_on_headings() {
        let book = "Title page\n\nCHAPTER I\nThe pond was old.\n\nChapter II. The Frog\nA frog jumped.\n";
        let chapters = split_book(book);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title.as_deref(), Some("CHAPTER I"));
        assert_eq!(chapters[0].content, "The pond was old.");
        assert_eq!(chapters[1].title.as_deref(), Some("Chapter II. The Frog"));
        assert_eq!(chapters[1].content, "A frog jumped.");
    }

    #[test]
    fn no_headings_is_one_chapter() {
        let chapters = split_book("  Just some prose.  ");
        assert_eq!(chapters, vec![Chapter::new("Just some prose.")]);
        assert!(split_book("   ").is_empty());
    }

    #[test]
    fn load_directory_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "Second chapter.").unwrap();
        fs::write(dir.path().join("a.txt"), "First chapter.").unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        let chapters = load_chapters(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title.as_deref(), Some("a"));
        assert_eq!(chapters[1].content, "Second chapter.");
    }

    #[test]
    fn unreadable_directory_entry_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "First chapter.").unwrap();
        fs::write(dir.path().join("notes.md"), "Not a chapter.").unwrap();
        fs::create_dir(dir.path().join("b.txt")).unwrap();
        let err = load_chapters(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Io(_)), "{err:?}");

        fs::remove_dir(dir.path().join("b.txt")).unwrap();
        let chapters = load_chapters(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(chapters, vec![Chapter::titled("a", "First chapter.")]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_chapters(&[PathBuf::from("/definitely/not/here.txt")]).unwrap_err();
        assert!(matches!(err, crate::error::EngineError::Io(_)));
    }
}
