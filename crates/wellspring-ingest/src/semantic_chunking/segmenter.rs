//! Language-aware sentence segmentation, the first stage of chunking.

use unicode_segmentation::UnicodeSegmentation;

/// Splits `text` into sentences using Unicode sentence-boundary rules
/// (UAX #29), trimming surrounding whitespace and dropping empties.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sentence text paired with its byte offset span in the original string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Like [`split_sentences`] but also resolves each sentence's byte offset
/// range within `text`, needed so chunks can carry provenance spans.
pub fn split_sentences_with_offsets(text: &str) -> Vec<Sentence> {
    let mut cursor = 0usize;
    let mut sentences = Vec::new();
    for raw in text.unicode_sentences() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            cursor += raw.len();
            continue;
        }
        let leading = raw.len() - raw.trim_start().len();
        let start = cursor + leading;
        let end = start + trimmed.len();
        sentences.push(Sentence {
            text: trimmed.to_string(),
            start_offset: start,
            end_offset: end,
        });
        cursor += raw.len();
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_sentence_boundaries() {
        let sentences = split_sentences("The sky is blue. Grass is green! Is water wet?");
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "The sky is blue.");
    }

    #[test]
    fn empty_input_yields_no_sentences() {
        assert!(split_sentences("   ").is_empty());
    }
}
