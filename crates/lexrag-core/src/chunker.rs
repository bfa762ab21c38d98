//! Page-anchored, heading-aware chunking of raw page text.
//!
//! Lines are accumulated into a buffer. A legal heading (`Art.`, `Capitolul`,
//! `Secțiunea`, ...) closes the buffer early once it is at least 70% full, and
//! a line that would overflow `chunk_size` closes it and seeds the next buffer
//! with the last `overlap` characters of the closed one. All lengths count
//! Unicode scalar values.

use crate::config::ChunkingSettings;
use crate::types::PageSpan;

/// Line prefixes that open a new article, chapter, section or law.
pub const HEADING_MARKERS: &[&str] = &[
    "Art.", "ART.", "Art ", "ART ",
    "Capitolul", "CAPITOLUL", "Cap.", "CAP.",
    "Secțiunea", "SECȚIUNEA",
    "Legea", "LEGEA",
];

/// Chunks whose trimmed length does not exceed this are dropped.
pub const MIN_CHUNK_CHARS: usize = 50;
pub const MIN_CHUNK_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from_settings(&ChunkingSettings::default())
    }
}

impl Chunker {
    /// `chunk_size` is raised to at least [`MIN_CHUNK_SIZE`]; `overlap` is capped
    /// at half of it so every overflow flush makes progress.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
        let overlap = overlap.min(chunk_size / 2);
        Self { chunk_size, overlap }
    }

    pub fn from_settings(settings: &ChunkingSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }
    pub fn overlap(&self) -> usize { self.overlap }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buf = LineBuffer::default();
        // Room left for a line after an overflow flush seeded the buffer.
        let max_piece = self.chunk_size - self.overlap - 1;

        for line in text.lines() {
            if is_heading(line) && buf.len * 10 >= self.chunk_size * 7 {
                keep_if_substantial(&mut chunks, &buf.take());
            }
            for piece in split_long_line(line, max_piece) {
                if !buf.is_empty() && buf.len + 1 + char_len(piece) > self.chunk_size {
                    let flushed = buf.take();
                    buf.push_raw(tail_chars(&flushed, self.overlap));
                    keep_if_substantial(&mut chunks, &flushed);
                }
                buf.push_line(piece);
            }
        }
        keep_if_substantial(&mut chunks, &buf.take());
        chunks
    }

    /// Chunk every page of a document, tagging each chunk with its 1-based page.
    pub fn chunk_pages<S: AsRef<str>>(&self, pages: &[S]) -> Vec<(String, PageSpan)> {
        pages
            .iter()
            .enumerate()
            .flat_map(|(i, page)| {
                let span = PageSpan::single(i as u32 + 1);
                self.chunk(page.as_ref()).into_iter().map(move |c| (c, span))
            })
            .collect()
    }
}

/// Convenience wrapper over [`Chunker::new`] + [`Chunker::chunk`].
pub fn chunk(page_text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    Chunker::new(chunk_size, overlap).chunk(page_text)
}

pub fn is_heading(line: &str) -> bool {
    let line = line.trim_start();
    HEADING_MARKERS.iter().any(|m| line.starts_with(m))
}

#[derive(Default)]
struct LineBuffer {
    text: String,
    len: usize,
}

impl LineBuffer {
    fn is_empty(&self) -> bool { self.text.is_empty() }

    fn push_raw(&mut self, s: String) {
        self.len += char_len(&s);
        self.text.push_str(&s);
    }

    fn push_line(&mut self, line: &str) {
        if !self.text.is_empty() {
            self.text.push('\n');
            self.len += 1;
        }
        self.text.push_str(line);
        self.len += char_len(line);
    }

    fn take(&mut self) -> String {
        self.len = 0;
        std::mem::take(&mut self.text)
    }
}

fn keep_if_substantial(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if char_len(trimmed) > MIN_CHUNK_CHARS {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn tail_chars(s: &str, n: usize) -> String {
    let skip = char_len(s).saturating_sub(n);
    s.chars().skip(skip).collect()
}

/// Split a line into pieces of at most `max` chars, preferring whitespace cuts.
fn split_long_line(line: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = line;
    let mut remaining = char_len(line);
    while remaining > max {
        let window_end = rest.char_indices().nth(max).map_or(rest.len(), |(i, _)| i);
        let cut = rest[..window_end]
            .rfind(char::is_whitespace)
            .filter(|&i| i > 0)
            .unwrap_or(window_end);
        pieces.push(&rest[..cut]);
        let next = rest[cut..].trim_start();
        remaining -= char_len(&rest[..rest.len() - next.len()]);
        rest = next;
    }
    if !rest.is_empty() || pieces.is_empty() {
        pieces.push(rest);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_counts_chars_not_bytes() {
        assert_eq!(tail_chars("árvíztűrő", 3), "űrő");
        assert_eq!(tail_chars("ab", 10), "ab");
    }

    #[test]
    fn long_line_is_cut_at_whitespace() {
        let line = "alpha beta gamma delta";
        let pieces = split_long_line(line, 12);
        assert_eq!(pieces, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn very_long_line_keeps_every_word() {
        let words: Vec<String> = (0..5000).map(|i| format!("szó{i}")).collect();
        let line = words.join(" ");
        let pieces = split_long_line(&line, 120);
        assert!(pieces.iter().all(|p| char_len(p) <= 120));
        let rejoined: Vec<&str> = pieces.iter().flat_map(|p| p.split_whitespace()).collect();
        assert_eq!(rejoined.len(), words.len());
        assert_eq!(rejoined.last().copied(), Some("szó4999"));
    }

    #[test]
    fn unbroken_line_is_cut_hard() {
        let line = "x".repeat(25);
        let pieces = split_long_line(&line, 10);
        assert_eq!(pieces.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![10, 10, 5]);
    }
}
