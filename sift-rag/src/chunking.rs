//! Sentence-aware document chunking.
//!
//! This module provides the [`Chunker`] trait and [`SentenceChunker`], which
//! packs whole sentences into chunks of at most `chunk_size` characters and
//! carries the trailing `chunk_overlap` characters of each chunk into the next.
//!
//! All lengths are counted in characters (Unicode scalar values), never bytes.

use std::fmt;
use std::sync::Arc;

use crate::document::Chunk;
use crate::sentence::{SentenceSplitter, UnicodeSentenceSplitter};

/// A strategy for splitting text into chunks.
///
/// Implementations assign `chunk_id`s `0..n` in production order and never
/// produce a chunk with empty text.
pub trait Chunker: Send + Sync {
    /// Split text into chunks.
    ///
    /// Returns an empty `Vec` only if the text contains no non-empty sentence.
    fn chunk(&self, text: &str) -> Vec<Chunk>;
}

/// Packs consecutive sentences into chunks with a character-based overlap.
///
/// Sentences are joined with a single space while the accumulated chunk stays
/// within `chunk_size`. When the next sentence would overflow, the chunk is
/// flushed and the next one is seeded with the last `chunk_overlap` characters
/// of the flushed chunk followed by the sentence. The overlap is cut on
/// character boundaries, so it may start mid-word.
///
/// A sentence that is too long to start a chunk on its own is hard-split: the
/// first `chunk_size` characters become a chunk and the rest, prefixed with the
/// sentence's first `chunk_overlap` characters, seeds the next one. That seed is
/// not split again, so the chunk it grows into may exceed `chunk_size`.
///
/// An overlap greater than or equal to `chunk_size` is accepted. Every sentence
/// is visited exactly once, so chunking always terminates.
///
/// # Example
///
/// ```rust,ignore
/// use sift_rag::{Chunker, SentenceChunker};
///
/// let chunker = SentenceChunker::new(800, 200);
/// let chunks = chunker.chunk(&text);
/// ```
#[derive(Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    splitter: Arc<dyn SentenceSplitter>,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker` using Unicode sentence boundaries.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk; zero is treated as one
    /// * `chunk_overlap` — number of trailing characters carried into the next chunk
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            splitter: Arc::new(UnicodeSentenceSplitter),
        }
    }

    /// Replace the sentence splitter.
    pub fn with_splitter(mut self, splitter: Arc<dyn SentenceSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Run the packing algorithm and return the raw chunk texts.
    fn pack(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for raw in self.splitter.split(text) {
            let sentence = raw.trim();
            if sentence.is_empty() {
                continue;
            }

            let sentence_len = sentence.chars().count();
            let separator_len = usize::from(!current.is_empty());

            if current_len + separator_len + sentence_len <= self.chunk_size {
                if separator_len > 0 {
                    current.push(' ');
                }
                current.push_str(sentence);
                current_len += separator_len + sentence_len;
                continue;
            }

            if current.is_empty() {
                // The sentence alone does not fit: hard-split it.
                let (head, remaining) = split_at_char(sentence, self.chunk_size);
                chunks.push(head.to_string());
                current = if remaining.is_empty() {
                    String::new()
                } else {
                    let (overlap_head, _) = split_at_char(sentence, self.chunk_overlap);
                    join_trimmed(overlap_head, remaining)
                };
            } else {
                let flushed = std::mem::take(&mut current);
                current = join_trimmed(last_chars(&flushed, self.chunk_overlap), sentence);
                chunks.push(flushed);
            }
            current_len = current.chars().count();
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}

impl fmt::Debug for SentenceChunker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SentenceChunker")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish_non_exhaustive()
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        self.pack(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_id, text)| Chunk { chunk_id, text })
            .collect()
    }
}

/// Split `s` after its first `n` characters.
fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, ""),
    }
}

/// The last `n` characters of `s`, or all of `s` when it is shorter.
fn last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

fn join_trimmed(prefix: &str, rest: &str) -> String {
    format!("{prefix} {rest}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_sentences(sentences: &'static [&'static str]) -> Arc<dyn SentenceSplitter> {
        Arc::new(move |_: &str| sentences.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn empty_and_blank_text_produce_no_chunks() {
        let chunker = SentenceChunker::new(100, 10);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn short_single_sentence_is_one_trimmed_chunk() {
        let chunker = SentenceChunker::new(100, 20);
        let chunks = chunker.chunk("  Rust prevents dangling pointers.  ");
        assert_eq!(chunks, vec![Chunk {
            chunk_id: 0,
            text: "Rust prevents dangling pointers.".into()
        }]);
    }

    #[test]
    fn sentences_that_exactly_fit_become_separate_chunks() {
        let chunker =
            SentenceChunker::new(3, 0).with_splitter(fixed_sentences(&["A.", "B.", "C."]));
        let chunks = chunker.chunk("A. B. C.");
        assert_eq!(texts(&chunks), vec!["A.", "B.", "C."]);
        assert_eq!(chunks.iter().map(|c| c.chunk_id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn sentences_are_packed_with_single_spaces() {
        let chunker = SentenceChunker::new(30, 0);
        let chunks = chunker.chunk("One two.   Three four. Five six seven eight nine.");
        assert_eq!(texts(&chunks), vec!["One two. Three four.", "Five six seven eight nine."]);
    }

    #[test]
    fn next_chunk_is_seeded_with_trailing_overlap() {
        let chunker = SentenceChunker::new(12, 4)
            .with_splitter(fixed_sentences(&["alpha beta.", "gamma.", "delta."]));
        let chunks = chunker.chunk("ignored");
        // "alpha beta." (11) + " gamma." overflows; tail "eta." seeds the next chunk.
        assert_eq!(texts(&chunks), vec!["alpha beta.", "eta. gamma.", "mma. delta."]);
    }

    #[test]
    fn overlap_tail_is_trimmed_before_joining() {
        let chunker =
            SentenceChunker::new(8, 3).with_splitter(fixed_sentences(&["ab cd.", "efgh."]));
        let chunks = chunker.chunk("ignored");
        assert_eq!(texts(&chunks), vec!["ab cd.", "cd. efgh."]);

        let chunker =
            SentenceChunker::new(8, 4).with_splitter(fixed_sentences(&["ab cd.", "efgh."]));
        let chunks = chunker.chunk("ignored");
        // The 4-character tail is " cd."; its leading space is trimmed away.
        assert_eq!(texts(&chunks), vec!["ab cd.", "cd. efgh."]);
    }

    #[test]
    fn oversized_first_sentence_is_hard_split_with_leading_overlap() {
        let chunker = SentenceChunker::new(10, 3)
            .with_splitter(fixed_sentences(&["abcdefghijklmnop", "xy."]));
        let chunks = chunker.chunk("ignored");
        assert_eq!(texts(&chunks), vec!["abcdefghij", "abc klmnop", "nop xy."]);
    }

    #[test]
    fn oversized_sentence_without_overlap_carries_only_the_remainder() {
        let chunker =
            SentenceChunker::new(4, 0).with_splitter(fixed_sentences(&["abcdefg", "hi."]));
        let chunks = chunker.chunk("ignored");
        assert_eq!(texts(&chunks), vec!["abcd", "efg", "hi."]);
    }

    #[test]
    fn oversized_sentence_remainder_is_seeded_with_its_own_prefix() {
        let chunker =
            SentenceChunker::new(4, 2).with_splitter(fixed_sentences(&["abcde", "fg."]));
        // "abcde" -> "abcd", remainder "e" seeded with "ab" -> "ab e".
        let chunks = chunker.chunk("ignored");
        assert_eq!(texts(&chunks), vec!["abcd", "ab e", "e fg."]);

        let chunker =
            SentenceChunker::new(4, 2).with_splitter(fixed_sentences(&["abcd!", "xyz"]));
        let chunks = chunker.chunk("ignored");
        assert_eq!(texts(&chunks), vec!["abcd", "ab !", "! xyz"]);
    }

    #[test]
    fn overlap_not_smaller_than_chunk_size_terminates() {
        let chunker = SentenceChunker::new(5, 10)
            .with_splitter(fixed_sentences(&["aaaa.", "bbbb.", "cccc."]));
        let chunks = chunker.chunk("ignored");
        assert_eq!(texts(&chunks), vec!["aaaa.", "aaaa. bbbb.", "aaa. bbbb. cccc."]);
    }

    #[test]
    fn multibyte_text_is_split_on_character_boundaries() {
        let chunker = SentenceChunker::new(4, 1);
        let chunks = chunker.chunk("Привет мир");
        assert_eq!(texts(&chunks), vec!["Прив", "П ет мир"]);
    }

    #[test]
    fn empty_sentences_from_splitter_are_skipped() {
        let chunker = SentenceChunker::new(50, 0)
            .with_splitter(fixed_sentences(&["", "  ", "First.", "\n", "Second."]));
        let chunks = chunker.chunk("ignored");
        assert_eq!(texts(&chunks), vec!["First. Second."]);
    }

    #[test]
    fn zero_chunk_size_is_treated_as_one() {
        let chunker = SentenceChunker::new(0, 0);
        assert_eq!(chunker.chunk_size(), 1);
        let chunks = chunker.chunk("ab");
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "The quick brown fox. Jumps over the lazy dog. Again and again. And once more.";
        let chunker = SentenceChunker::new(25, 8);
        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }

    #[test]
    fn char_helpers_respect_boundaries() {
        assert_eq!(split_at_char("héllo", 2), ("hé", "llo"));
        assert_eq!(split_at_char("hé", 5), ("hé", ""));
        assert_eq!(last_chars("héllo", 4), "éllo");
        assert_eq!(last_chars("hé", 5), "hé");
        assert_eq!(last_chars("hé", 0), "");
    }
}
