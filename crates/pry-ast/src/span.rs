// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// A byte span in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Join two spans into the smallest span covering both.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Byte-offset to line/column translation for one source text.
///
/// The offsets of all line starts are collected once; a lookup is then a
/// partition point over that sorted table. Injector spans and breakpoint
/// positions both resolve through this.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Offset of the first byte of each line; index 0 is line 1.
    starts: Vec<usize>,
}

impl LineMap {
    /// Scan the source once and record where every line begins.
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        LineMap { starts }
    }

    /// The 1-based (line, col) a byte offset falls on.
    pub fn offset_to_line_col(&self, offset: usize) -> (u32, u32) {
        // Number of line starts at or before the offset; starts[0] == 0
        // guarantees at least one.
        let idx = self
            .starts
            .partition_point(|&s| s <= offset)
            .saturating_sub(1);
        ((idx + 1) as u32, (offset - self.starts[idx] + 1) as u32)
    }

    /// The text of a 1-based line, without its trailing newline.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.starts.get(idx)?;
        let end = match self.starts.get(idx + 1) {
            Some(&next) => next - 1, // drop the newline byte
            None => source.len(),
        };
        source.get(start..end)
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> u32 {
        self.starts.len() as u32
    }
}
