//! Host-side documents: a line buffer with editor line semantics.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};

/// Stable identity of an open document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn for_path(path: &Path) -> Self {
        Self(format!("file://{}", path.display()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A position in a document. `character` is a byte offset into the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// Replace the text between `start` and `end` with `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: Position,
    pub end: Position,
    pub text: String,
}

impl TextEdit {
    pub fn new(start: Position, end: Position, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn insert(at: Position, text: impl Into<String>) -> Self {
        Self::new(at, at, text)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    path: Option<PathBuf>,
    lines: Vec<String>,
}

impl Document {
    pub fn from_text(id: DocumentId, path: Option<PathBuf>, text: &str) -> Self {
        Self {
            id,
            path,
            lines: split_lines(text),
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self::from_text(DocumentId::for_path(&path), Some(path), &text))
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Filesystem path; `None` for scratch buffers, which are never tracked.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Always at least 1: an empty buffer has one empty line, and a trailing
    /// newline opens a final empty line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Byte length of a line, 0 when out of range.
    pub fn line_len(&self, index: usize) -> usize {
        self.lines.get(index).map_or(0, String::len)
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Apply edits one after another; each edit's positions refer to the
    /// document as left by the previous one. Positions are clamped.
    pub fn apply_edits(&mut self, edits: &[TextEdit]) {
        for edit in edits {
            self.apply_edit(edit);
        }
    }

    fn apply_edit(&mut self, edit: &TextEdit) {
        let last = self.lines.len() - 1;
        let (start, end) = if edit.start <= edit.end {
            (edit.start, edit.end)
        } else {
            (edit.end, edit.start)
        };
        let start_line = start.line.min(last);
        let end_line = end.line.min(last);
        let head_at = char_floor(&self.lines[start_line], start.character);
        let tail_at = char_floor(&self.lines[end_line], end.character);

        let mut joined = String::new();
        joined.push_str(&self.lines[start_line][..head_at]);
        joined.push_str(&edit.text);
        joined.push_str(&self.lines[end_line][tail_at..]);

        self.lines
            .splice(start_line..=end_line, split_lines(&joined));
    }

    /// Describe the change from this document's text to `new_text` as one
    /// contiguous edit region, or nothing when the text is unchanged.
    pub fn diff_edits(&self, new_text: &str) -> Vec<TextEdit> {
        let old = &self.lines;
        let new = split_lines(new_text);
        if *old == new {
            return Vec::new();
        }

        let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
        let room = old.len().min(new.len()) - prefix;
        let suffix = old
            .iter()
            .rev()
            .zip(new.iter().rev())
            .take(room)
            .take_while(|(a, b)| a == b)
            .count();
        let old_end = old.len() - suffix;
        let new_end = new.len() - suffix;

        if suffix > 0 {
            // Whole lines [prefix, old_end) become [prefix, new_end).
            let mut text = String::new();
            for line in &new[prefix..new_end] {
                text.push_str(line);
                text.push('\n');
            }
            return vec![TextEdit::new(
                Position::new(prefix, 0),
                Position::new(old_end, 0),
                text,
            )];
        }

        let last = old.len() - 1;
        let end = Position::new(last, old[last].len());
        if prefix < old.len() && prefix < new.len() {
            // Everything from `prefix` on is rewritten.
            return vec![TextEdit::new(
                Position::new(prefix, 0),
                end,
                new[prefix..].join("\n"),
            )];
        }

        // Lines were only appended or only cut from the end: edit from the
        // end of the last shared line.
        let mut text = String::new();
        for line in &new[prefix..] {
            text.push('\n');
            text.push_str(line);
        }
        vec![TextEdit::new(
            Position::new(prefix - 1, old[prefix - 1].len()),
            end,
            text,
        )]
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

fn char_floor(s: &str, index: usize) -> usize {
    let mut i = index.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Number of line breaks in `text`.
pub fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}
