//! Text buffer abstraction for editor storage.
//!
//! The `TextBuffer` trait provides the storage interface the text model is
//! built on. `EditorRope` is the ropey-backed implementation.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

/// A text buffer that supports efficient editing and offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in bytes (UTF-8).
    fn len_bytes(&self) -> usize;

    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Number of lines. An empty buffer has one line.
    fn len_lines(&self) -> usize;

    /// Line index containing the char offset. Offsets past the end map to the last line.
    fn char_to_line(&self, char_offset: usize) -> usize;

    /// Char offset of the first char of a line. Lines past the end map to `len_chars()`.
    fn line_to_char(&self, line: usize) -> usize;

    /// Length of a line in chars, excluding its line break.
    fn line_len(&self, line: usize) -> usize;

    /// Largest addressable column of a line.
    ///
    /// Equal to `line_len`, except on lines ending in "\r\n" where the offset
    /// between the two break chars is one further.
    fn line_max_column(&self, line: usize) -> usize;
}

/// Ropey-backed text buffer.
///
/// Provides O(log n) editing operations and offset conversions.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from string.
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }

    /// Get a reference to the underlying rope (for advanced operations).
    pub fn rope(&self) -> &ropey::Rope {
        &self.rope
    }
}

impl TextBuffer for EditorRope {
    fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        self.rope.insert(char_offset, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        if char_range.is_empty() {
            return;
        }
        self.rope.remove(char_range);
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn char_to_line(&self, char_offset: usize) -> usize {
        self.rope.char_to_line(char_offset.min(self.rope.len_chars()))
    }

    fn line_to_char(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }

    fn line_len(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let mut len = slice.len_chars();
        // Strip the trailing break, treating "\r\n" as one break.
        if len > 0 && slice.char(len - 1) == '\n' {
            len -= 1;
            if len > 0 && slice.char(len - 1) == '\r' {
                len -= 1;
            }
        }
        len
    }

    fn line_max_column(&self, line: usize) -> usize {
        let len = self.line_len(line);
        if line >= self.rope.len_lines() {
            return len;
        }
        let slice = self.rope.line(line);
        if slice.len_chars() >= len + 2 && slice.char(len) == '\r' && slice.char(len + 1) == '\n' {
            len + 1
        } else {
            len
        }
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut rope = EditorRope::from_str("hello world");
        assert_eq!(rope.len_chars(), 11);
        assert_eq!(rope.to_string(), "hello world");

        rope.insert(5, " beautiful");
        assert_eq!(rope.to_string(), "hello beautiful world");

        // " beautiful" is 10 chars at positions 5..15
        rope.delete(5..15);
        assert_eq!(rope.to_string(), "hello world");
    }

    #[test]
    fn test_slice() {
        let rope = EditorRope::from_str("hello world");
        assert_eq!(rope.slice(0..5).as_deref(), Some("hello"));
        assert_eq!(rope.slice(6..11).as_deref(), Some("world"));
        assert_eq!(rope.slice(0..100), None);
    }

    #[test]
    fn test_replace() {
        let mut rope = EditorRope::from_str("hello world");
        rope.replace(6..11, "rust");
        assert_eq!(rope.to_string(), "hello rust");
    }

    #[test]
    fn test_lines() {
        let rope = EditorRope::from_str("one\ntwo\r\nthree");
        assert_eq!(rope.len_lines(), 3);
        assert_eq!(rope.line_to_char(1), 4);
        assert_eq!(rope.line_to_char(2), 9);
        assert_eq!(rope.line_len(0), 3);
        assert_eq!(rope.line_len(1), 3);
        assert_eq!(rope.line_len(2), 5);
        assert_eq!(rope.char_to_line(5), 1);
        assert_eq!(rope.char_to_line(100), 2);
        assert_eq!(rope.line_to_char(9), 14);
    }

    #[test]
    fn test_line_max_column() {
        let rope = EditorRope::from_str("one\ntwo\r\nthree\r");
        assert_eq!(rope.line_max_column(0), 3);
        assert_eq!(rope.line_max_column(1), 4);
        // A lone "\r" is a break of its own, so the line holds it.
        assert_eq!(rope.line_max_column(2), 6);
        assert_eq!(rope.line_max_column(3), 0);
    }

    #[test]
    fn test_multibyte_offsets() {
        // "héllo 🌍" - é is 2 bytes, the globe is 4, both one char
        let rope = EditorRope::from_str("héllo 🌍");
        assert_eq!(rope.len_chars(), 7);
        assert_eq!(rope.len_bytes(), 11);
        assert_eq!(rope.slice(6..7).as_deref(), Some("🌍"));
    }
}
