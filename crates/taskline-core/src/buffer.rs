//! Append-only text storage shared between producer threads and the
//! renderer, with a windowed "last N wrapped lines" query over an index of
//! line-start offsets so the window never rescans the whole buffer.

use std::mem;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    text: String,
    /// Byte offset of the start of every physical line. Contains 0 when the
    /// text is non-empty, plus `p + 1` for every line feed at offset `p`,
    /// including a trailing line feed, whose entry equals `text.len()` and
    /// marks a not-yet-started line.
    line_starts: Vec<usize>,
}

impl Inner {
    fn push(&mut self, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let base = self.text.len();
        if base == 0 {
            self.line_starts.push(0);
        }
        for (i, byte) in chunk.bytes().enumerate() {
            if byte == b'\n' {
                self.line_starts.push(base + i + 1);
            }
        }
        self.text.push_str(chunk);
    }
}

/// Thread-safe append-only text store.
///
/// `append` and `take` are mutually atomic: no appended text is lost or
/// duplicated across a clear boundary, and each append lands in program
/// order for its producer.
#[derive(Debug, Default)]
pub struct TextBuffer {
    inner: RwLock<Inner>,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full snapshot of the current contents.
    pub fn get(&self) -> String {
        self.inner.read().unwrap().text.clone()
    }

    /// Atomically replaces the contents.
    pub fn set(&self, text: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.text.clear();
        inner.line_starts.clear();
        inner.push(text);
    }

    /// Atomically appends `text`.
    pub fn append(&self, text: &str) {
        self.inner.write().unwrap().push(text);
    }

    /// Atomically reads the contents and resets the buffer to empty.
    pub fn take(&self) -> String {
        let mut inner = self.inner.write().unwrap();
        inner.line_starts.clear();
        mem::take(&mut inner.text)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the most recent physical lines of the buffer, at most
    /// `max_lines` of them, together with the number of terminal rows they
    /// occupy when hard-wrapped at `width` columns.
    ///
    /// Physical lines are delimited by line feeds; a trailing unterminated
    /// segment counts as a line, a trailing line feed does not open a new
    /// one. A physical line of character length `L` occupies
    /// `max(1, ceil(L / width))` rows. The returned text is the original
    /// byte run of the collected lines, in order, with no wrap markers
    /// inserted. `width` is clamped to at least 1; `max_lines == 0` yields
    /// the empty result.
    pub fn last_lines(&self, max_lines: usize, width: usize) -> (String, usize) {
        if max_lines == 0 {
            return (String::new(), 0);
        }
        let width = width.max(1);

        let inner = self.inner.read().unwrap();
        if inner.text.is_empty() {
            return (String::new(), 0);
        }

        let mut starts = inner.line_starts.as_slice();
        // Drop the sentinel entry a trailing line feed leaves behind.
        if starts.last() == Some(&inner.text.len()) {
            starts = &starts[..starts.len() - 1];
        }
        if starts.is_empty() {
            return (String::new(), 0);
        }

        let take = max_lines.min(starts.len());
        let first = starts[starts.len() - take];
        let window = &inner.text[first..];

        let mut rows = 0;
        let body = window.strip_suffix('\n').unwrap_or(window);
        for line in body.split('\n') {
            let chars = line.chars().count();
            rows += if chars == 0 { 1 } else { chars.div_ceil(width) };
        }

        (window.to_string(), rows)
    }
}
