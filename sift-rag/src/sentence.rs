//! Sentence segmentation.
//!
//! The chunker consumes sentences through the [`SentenceSplitter`] trait so the
//! segmentation strategy can be swapped without touching the chunking logic.

use unicode_segmentation::UnicodeSegmentation;

/// Splits text into an ordered sequence of sentences covering the input.
///
/// Implementations may return sentences with surrounding whitespace or empty
/// entries; the chunker trims and filters them.
pub trait SentenceSplitter: Send + Sync {
    /// Split `text` into sentences, preserving their original order.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Language-agnostic splitter using the Unicode sentence boundary rules (UAX #29).
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        text.split_sentence_bounds().map(str::to_string).collect()
    }
}

impl<F> SentenceSplitter for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn split(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_splitter_covers_input_in_order() {
        let text = "Hello world. How are you? Fine!";
        let sentences = UnicodeSentenceSplitter.split(text);
        assert_eq!(sentences.concat(), text);

        let trimmed: Vec<&str> = sentences.iter().map(|s| s.trim()).collect();
        assert_eq!(trimmed, vec!["Hello world.", "How are you?", "Fine!"]);
    }

    #[test]
    fn unicode_splitter_handles_cyrillic() {
        let text = "Привет, мир. Как дела?";
        let trimmed: Vec<String> =
            UnicodeSentenceSplitter.split(text).iter().map(|s| s.trim().to_string()).collect();
        assert_eq!(trimmed, vec!["Привет, мир.", "Как дела?"]);
    }

    #[test]
    fn closures_are_splitters() {
        let by_line = |text: &str| text.lines().map(str::to_string).collect::<Vec<_>>();
        assert_eq!(by_line.split("a\nb"), vec!["a", "b"]);
    }
}
