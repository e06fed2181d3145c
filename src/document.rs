use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::error::DocumentError;

/// Priority tags in cycling order. The empty tag means "no priority".
pub const PRIORITY_CYCLE: [Option<char>; 7] = [
    None,
    Some('A'),
    Some('B'),
    Some('C'),
    Some('D'),
    Some('E'),
    Some('F'),
];

const ARCHIVE_SUFFIX: &str = ".archive";

/// The text being written, held as an ordered list of lines, together with
/// the file it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    file_path: PathBuf,
}

/// An immutable copy of a document's on-disk form.
///
/// Taken under the document lock so the write itself can happen without
/// blocking the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    file_path: PathBuf,
    text: String,
}

impl Snapshot {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn write(&self) -> Result<(), DocumentError> {
        fs::write(&self.file_path, self.text.as_bytes()).map_err(|source| {
            DocumentError::Write {
                path: self.file_path.clone(),
                source,
            }
        })?;
        debug!(
            target: "io",
            file = %self.file_path.display(),
            size_bytes = self.text.len(),
            "file_write_ok"
        );
        Ok(())
    }
}

impl Document {
    /// An empty document that will be saved to `file_path`.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            lines: Vec::new(),
            file_path: file_path.into(),
        }
    }

    pub fn from_text(text: &str, file_path: impl Into<PathBuf>) -> Self {
        Self {
            lines: split_lines(text),
            file_path: file_path.into(),
        }
    }

    pub fn load(file_path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let file_path = file_path.into();
        let text = read_text(&file_path)?;
        let document = Self::from_text(&text, file_path);
        debug!(
            target: "io",
            file = %document.file_path.display(),
            line_count = document.lines.len(),
            "file_read_ok"
        );
        Ok(document)
    }

    /// Re-reads the file, dropping every unsaved edit.
    pub fn reload_from_file(&mut self) -> Result<(), DocumentError> {
        let text = read_text(&self.file_path)?;
        self.lines = split_lines(&text);
        Ok(())
    }

    pub fn save(&self) -> Result<(), DocumentError> {
        self.snapshot().write()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            file_path: self.file_path.clone(),
            text: self.to_text(),
        }
    }

    /// The on-disk form: lines joined by `\n`, always ending in exactly one
    /// newline.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| line.split_whitespace().count())
            .sum()
    }

    /// Characters across all lines, not counting line breaks.
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|line| line.chars().count()).sum()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Inserts a line, clamping `index` to the end. Returns where it landed.
    pub fn insert_line(&mut self, index: usize, text: impl Into<String>) -> usize {
        let index = index.min(self.lines.len());
        self.lines.insert(index, text.into());
        index
    }

    pub fn push_line(&mut self, text: impl Into<String>) -> usize {
        self.lines.push(text.into());
        self.lines.len() - 1
    }

    pub fn set_line(&mut self, index: usize, text: impl Into<String>) -> Result<(), DocumentError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(DocumentError::NoSuchLine(index))?;
        *line = text.into();
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<String, DocumentError> {
        if index >= self.lines.len() {
            return Err(DocumentError::NoSuchLine(index));
        }
        Ok(self.lines.remove(index))
    }

    /// Swaps two lines; false if either index is out of range.
    pub fn swap_lines(&mut self, a: usize, b: usize) -> bool {
        if a >= self.lines.len() || b >= self.lines.len() {
            return false;
        }
        self.lines.swap(a, b);
        true
    }

    pub fn priority(&self, index: usize) -> Option<char> {
        self.lines.get(index).and_then(|line| parse_priority(line).0)
    }

    pub fn set_priority(
        &mut self,
        index: usize,
        priority: Option<char>,
    ) -> Result<(), DocumentError> {
        let line = self
            .lines
            .get_mut(index)
            .ok_or(DocumentError::NoSuchLine(index))?;
        *line = with_priority(line, priority);
        Ok(())
    }

    /// Sibling file that archived lines are appended to.
    pub fn archive_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(ARCHIVE_SUFFIX);
        self.file_path.with_file_name(name)
    }

    /// Moves a line into the archive file. The line stays in the document if
    /// the archive cannot be written.
    pub fn archive_line(&mut self, index: usize) -> Result<String, DocumentError> {
        let line = self
            .lines
            .get(index)
            .ok_or(DocumentError::NoSuchLine(index))?;
        let archive_path = self.archive_path();
        let write_result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&archive_path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(source) = write_result {
            warn!(target: "io", file = %archive_path.display(), ?source, "archive_write_failed");
            return Err(DocumentError::Write {
                path: archive_path,
                source,
            });
        }
        Ok(self.lines.remove(index))
    }
}

/// Reads the file as text. Bytes that are not valid UTF-8 are replaced
/// rather than failing the read, so the existing content is never mistaken
/// for an unreadable file.
fn read_text(path: &Path) -> Result<String, DocumentError> {
    let bytes = fs::read(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            warn!(
                target: "io",
                file = %path.display(),
                valid_up_to = err.utf8_error().valid_up_to(),
                "file_not_utf8_decoded_lossily"
            );
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

/// Splits a `(X) ` priority prefix off a line.
pub fn parse_priority(line: &str) -> (Option<char>, &str) {
    let bytes = line.as_bytes();
    if bytes.len() >= 4
        && bytes[0] == b'('
        && bytes[1].is_ascii_uppercase()
        && bytes[2] == b')'
        && bytes[3] == b' '
    {
        (Some(bytes[1] as char), &line[4..])
    } else {
        (None, line)
    }
}

pub fn with_priority(line: &str, priority: Option<char>) -> String {
    let (_, body) = parse_priority(line);
    match priority {
        Some(tag) => format!("({tag}) {body}"),
        None => body.to_string(),
    }
}

/// Next tag in the priority cycle, wrapping at both ends. Tags outside the
/// cycle are treated as untagged.
pub fn cycle_priority(current: Option<char>, up: bool) -> Option<char> {
    let len = PRIORITY_CYCLE.len();
    let position = PRIORITY_CYCLE
        .iter()
        .position(|tag| *tag == current)
        .unwrap_or(0);
    let next = if up {
        (position + 1) % len
    } else {
        (position + len - 1) % len
    };
    PRIORITY_CYCLE[next]
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod document_tests;
