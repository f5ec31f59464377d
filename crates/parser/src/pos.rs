//! Byte offset to line/column translation.

use std::fmt;

/// 1-based line and column (column counted in bytes, like `go/token`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Start offsets of every line in a source text.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut starts = vec![0u32];
        starts.extend(
            memchr::memchr_iter(b'\n', src.as_bytes()).map(|i| (i + 1) as u32),
        );
        Self {
            starts,
            len: src.len() as u32,
        }
    }

    #[inline]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Zero-based line containing `offset`.
    #[inline]
    pub fn line_of(&self, offset: u32) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = self.line_of(offset);
        LineCol {
            line: line as u32 + 1,
            col: offset - self.starts[line] + 1,
        }
    }

    /// Offset of the first byte of zero-based `line`.
    #[inline]
    pub fn line_start(&self, line: usize) -> u32 {
        self.starts.get(line).copied().unwrap_or(self.len)
    }

    /// Offset of the line terminator (or EOF) ending zero-based `line`.
    pub fn line_end(&self, line: usize) -> u32 {
        match self.starts.get(line + 1) {
            Some(&next) => next - 1,
            None => self.len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_line_and_column() {
        let idx = LineIndex::new("package p\n\nfunc f() {}\n");
        assert_eq!(idx.line_col(0), LineCol { line: 1, col: 1 });
        assert_eq!(idx.line_col(10), LineCol { line: 2, col: 1 });
        assert_eq!(idx.line_col(16), LineCol { line: 3, col: 6 });
        assert_eq!(idx.line_count(), 4);
    }

    #[test]
    fn line_bounds() {
        let src = "a\nbc\n";
        let idx = LineIndex::new(src);
        assert_eq!(idx.line_start(1), 2);
        assert_eq!(idx.line_end(1), 4);
        assert_eq!(idx.line_end(2), src.len() as u32);
    }
}
