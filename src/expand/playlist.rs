//! Concat playlist manifest.
//!
//! The playlist achieves repetition through references: one physical
//! source file, N lines naming it. Disk usage of the expansion step is
//! O(1) in the repeat count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A concat-demuxer playlist: ordered file references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcatPlaylist {
    entries: Vec<PathBuf>,
}

impl ConcatPlaylist {
    /// Create an empty playlist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one file reference.
    pub fn push(&mut self, path: &Path) {
        self.entries.push(path.to_path_buf());
    }

    /// Append `count` references to the same file.
    pub fn push_repeated(&mut self, path: &Path, count: u64) {
        for _ in 0..count {
            self.entries.push(path.to_path_buf());
        }
    }

    /// Number of references.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the playlist is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The referenced entries.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Number of distinct files referenced.
    pub fn distinct_files(&self) -> usize {
        let mut paths: Vec<&PathBuf> = self.entries.iter().collect();
        paths.sort();
        paths.dedup();
        paths.len()
    }

    /// Render the manifest text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("file '");
            out.push_str(&escape_path(entry));
            out.push_str("'\n");
        }
        out
    }

    /// Write the manifest to a file.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render())
    }
}

/// Escape a path for a single-quoted concat manifest entry.
///
/// The demuxer's quoting rule: a literal single quote ends the quoted
/// span, is escaped bare, and reopens the quote (`'\''`).
fn escape_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn repeated_entries_reference_one_file() {
        let mut playlist = ConcatPlaylist::new();
        playlist.push_repeated(Path::new("/work/base.mp4"), 1200);

        assert_eq!(playlist.len(), 1200);
        assert_eq!(playlist.distinct_files(), 1);
    }

    #[test]
    fn render_produces_one_line_per_reference() {
        let mut playlist = ConcatPlaylist::new();
        playlist.push(Path::new("/work/intro.mp4"));
        playlist.push_repeated(Path::new("/work/base.mp4"), 3);

        let text = playlist.render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "file '/work/intro.mp4'");
        assert_eq!(lines[1], "file '/work/base.mp4'");
        assert_eq!(lines[3], "file '/work/base.mp4'");
    }

    #[test]
    fn quotes_in_paths_are_escaped() {
        let mut playlist = ConcatPlaylist::new();
        playlist.push(Path::new("/work/it's here.mp4"));

        assert_eq!(playlist.render(), "file '/work/it'\\''s here.mp4'\n");
    }

    #[test]
    fn write_creates_manifest_file() {
        let dir = tempdir().unwrap();
        let list_path = dir.path().join("concat_list.txt");

        let mut playlist = ConcatPlaylist::new();
        playlist.push_repeated(Path::new("/work/base.mp4"), 2);
        playlist.write_to(&list_path).unwrap();

        let content = fs::read_to_string(&list_path).unwrap();
        assert_eq!(content, "file '/work/base.mp4'\nfile '/work/base.mp4'\n");
    }
}
