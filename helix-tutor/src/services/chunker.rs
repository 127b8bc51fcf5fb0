//! Overlapping fixed-size text splitting.
//!
//! Sizes are measured in chars. Every piece is an exact substring of the input
//! and consecutive pieces share exactly `chunk_overlap` chars, so the input can
//! always be rebuilt from the output with [`Chunker::merge`].

use crate::error::{HelixTutorError, Result};

/// Break candidates in priority order: paragraph, line, sentence, word.
/// When none fits, the window is cut at the char limit.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(HelixTutorError::Config(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(HelixTutorError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut pieces = Vec::new();
        if total == 0 {
            return pieces;
        }

        let mut start = 0;
        loop {
            let limit = (start + self.chunk_size).min(total);
            if limit == total {
                pieces.push(chars[start..total].iter().collect());
                break;
            }

            let end = self.find_break(&chars, start, limit);
            pieces.push(chars[start..end].iter().collect());
            start = end - self.chunk_overlap;
        }

        pieces
    }

    /// Rebuilds the original text from pieces produced by [`Chunker::split`].
    pub fn merge(&self, pieces: &[String]) -> String {
        let mut merged = String::new();
        for (i, piece) in pieces.iter().enumerate() {
            if i == 0 {
                merged.push_str(piece);
            } else {
                merged.extend(piece.chars().skip(self.chunk_overlap));
            }
        }
        merged
    }

    /// Picks the end of the window starting at `start`, at most `limit`.
    ///
    /// The end must leave more than `chunk_overlap` chars in the piece so the
    /// next window always advances, and must keep the piece at least half full.
    fn find_break(&self, chars: &[char], start: usize, limit: usize) -> usize {
        let min_end = start + (self.chunk_overlap + 1).max(self.chunk_size / 2);

        for separator in SEPARATORS {
            let sep: Vec<char> = separator.chars().collect();
            if let Some(end) = last_break_after(chars, &sep, min_end, limit) {
                return end;
            }
        }

        limit
    }
}

/// Latest position in `[min_end, limit]` that directly follows `sep`.
fn last_break_after(chars: &[char], sep: &[char], min_end: usize, limit: usize) -> Option<usize> {
    let len = sep.len();
    let mut end = limit;
    while end >= min_end && end >= len {
        if chars[end - len..end] == *sep {
            return Some(end);
        }
        end -= 1;
    }
    None
}
