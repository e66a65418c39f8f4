//! Source location tracking for error reporting and source maps.
//!
//! # Design
//!
//! - `Span` — compact byte range plus file index (12 bytes)
//! - `SourceMap` — owns all source files of a tree, with line lookup
//! - `SourceFile` — one source file with a precomputed line-start index
//!
//! Every tree carries its own `SourceMap`; merging two trees re-bases the
//! absorbed tree's file indices (see `SourceMap::absorb`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compact source location reference.
///
/// Points to a byte range in a file of the owning tree's [`SourceMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Index into `SourceMap` files
    pub file_id: u16,
    /// Byte offset of the start position
    pub start: u32,
    /// Byte offset of the end position (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(file_id: u16, start: u32, end: u32) -> Self {
        Self {
            file_id,
            start,
            end,
        }
    }

    /// Zero-length span at the start of a file.
    pub fn zero(file_id: u16) -> Self {
        Self::new(file_id, 0, 0)
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// True if the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Span covering both `self` and `other`.
    ///
    /// # Panics
    /// Panics if the spans come from different files.
    pub fn merge(&self, other: &Span) -> Span {
        assert_eq!(
            self.file_id, other.file_id,
            "cannot merge spans from different files"
        );
        Span {
            file_id: self.file_id,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// All source files belonging to one schema tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

/// A single source file with line indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path the file was parsed from (display name for anonymous input)
    pub path: PathBuf,
    /// Original source text, retained for snippets and `sourcesContent`
    pub source: String,
    /// Byte offsets of each line start; `[0]` is always 0 and the last
    /// entry is the EOF sentinel
    line_starts: Vec<u32>,
}

impl SourceMap {
    /// Create an empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source file and return its id.
    pub fn add_file(&mut self, path: PathBuf, source: String) -> u16 {
        let file_id = self.files.len();
        assert!(file_id < u16::MAX as usize, "too many source files");
        self.files.push(SourceFile::new(path, source));
        file_id as u16
    }

    /// Number of files in this map.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// The file with the given id, if present.
    pub fn file(&self, file_id: u16) -> Option<&SourceFile> {
        self.files.get(file_id as usize)
    }

    /// Iterate the files in id order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    /// Path of the file a span points into.
    pub fn path(&self, span: &Span) -> Option<&Path> {
        self.file(span.file_id).map(|f| f.path.as_path())
    }

    /// Source snippet covered by a span.
    pub fn snippet(&self, span: &Span) -> Option<&str> {
        self.file(span.file_id)
            .and_then(|f| f.source.get(span.start as usize..span.end as usize))
    }

    /// 1-based (line, column) of a byte offset within a file.
    pub fn line_col(&self, file_id: u16, offset: u32) -> (u32, u32) {
        match self.file(file_id) {
            Some(f) => f.line_col(offset),
            None => (1, 1),
        }
    }

    /// Append all files of `other`, returning the id offset that was
    /// applied to them.
    ///
    /// The caller is responsible for re-basing any spans that still refer
    /// to `other`'s ids (see `SchemaTree::merge`).
    pub fn absorb(&mut self, other: SourceMap) -> u16 {
        let base = self.files.len();
        assert!(
            base + other.files.len() <= u16::MAX as usize,
            "too many source files"
        );
        self.files.extend(other.files);
        base as u16
    }
}

impl SourceFile {
    /// Create a new source file, computing the line-start index.
    pub fn new(path: PathBuf, source: String) -> Self {
        let line_starts = compute_line_starts(&source);
        Self {
            path,
            source,
            line_starts,
        }
    }

    /// 1-based (line, column) for a byte offset.
    ///
    /// Offsets past EOF clamp to the last line.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let offset = offset.min(self.source.len() as u32);
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.max(1) - 1,
        };
        // The EOF sentinel is not a line of its own unless the file ends
        // with a newline-terminated empty tail.
        let line_idx = line_idx.min(self.line_starts.len().saturating_sub(1));
        let line = (line_idx + 1) as u32;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Number of lines in the file.
    pub fn line_count(&self) -> usize {
        self.line_starts.len().saturating_sub(1).max(1)
    }
}

/// Byte offsets of line starts, with a trailing EOF sentinel.
fn compute_line_starts(source: &str) -> Vec<u32> {
    let mut line_starts = vec![0u32];
    for (idx, ch) in source.char_indices() {
        if ch == '\n' {
            line_starts.push((idx + 1) as u32);
        }
    }
    if line_starts.last() != Some(&(source.len() as u32)) {
        line_starts.push(source.len() as u32);
    }
    line_starts
}
