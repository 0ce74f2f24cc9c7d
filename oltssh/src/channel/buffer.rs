//! Pattern buffer with efficient tail-search optimization.
//!
//! Only the last N bytes of the accumulated output are searched for
//! prompt patterns, rather than the entire output. For large outputs
//! (full ONT tables on a fully populated chassis) this is critical.

use bytes::BytesMut;
use regex::bytes::Regex;

/// Buffer for accumulating shell output and searching its tail for patterns.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    ///
    /// Carriage returns are dropped too; line structure is carried by `\n`.
    pub fn extend(&mut self, data: &[u8]) {
        let mut cleaned = strip_ansi_escapes::strip(data);
        cleaned.retain(|&b| b != b'\r');
        self.buffer.extend_from_slice(&cleaned);
    }

    /// Offset where the searched tail begins.
    ///
    /// When the buffer is longer than the search depth, the window is moved
    /// forward to the next line start so that `^` never anchors mid-line.
    fn tail_start(&self) -> usize {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        if start == 0 {
            return 0;
        }
        match memchr::memchr(b'\n', &self.buffer[start..]) {
            Some(pos) => start + pos + 1,
            None => start,
        }
    }

    /// Search only the tail of the buffer for the pattern.
    ///
    /// Returns the match with offsets relative to the start of the
    /// searched region (not the full buffer).
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        pattern.find(&self.buffer[self.tail_start()..])
    }

    /// Check if the tail contains a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Remove the bytes matched by `pattern` in the tail.
    ///
    /// Returns `false` (and leaves the buffer untouched) when there is no match.
    pub fn strip_tail_match(&mut self, pattern: &Regex) -> bool {
        let start = self.tail_start();
        let Some((from, to)) = pattern
            .find(&self.buffer[start..])
            .map(|m| (start + m.start(), start + m.end()))
        else {
            return false;
        };

        let rest = self.buffer.split_off(from);
        self.buffer.extend_from_slice(&rest[to - from..]);
        true
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.buffer.split().to_vec()
    }

    /// Take the buffer contents as a string (lossy UTF-8) and reset.
    pub fn take_string(&mut self) -> String {
        String::from_utf8_lossy(&self.take()).into_owned()
    }

    #[cfg(test)]
    fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
