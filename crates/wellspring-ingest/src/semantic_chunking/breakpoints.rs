//! Greedy sentence-packing: determines which sentences belong to which
//! chunk, honoring a max-token budget and an inter-chunk overlap.

use super::segmenter::Sentence;
use super::tokenizer::count_tokens;

/// A half-open range of sentence indices assigned to one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

/// Greedily packs sentences (already split) into chunks of at most
/// `max_tokens`, repeating the trailing `overlap_tokens` worth of sentences
/// at the start of the next chunk for context continuity.
pub fn pack_sentences(sentences: &[Sentence], max_tokens: usize, overlap_tokens: usize) -> Vec<ChunkSpan> {
    if sentences.is_empty() {
        return Vec::new();
    }

    let token_counts: Vec<usize> = sentences.iter().map(|s| count_tokens(&s.text)).collect();
    let mut spans = Vec::new();
    let mut start = 0usize;

    while start < sentences.len() {
        let mut end = start;
        let mut total = 0usize;
        while end < sentences.len() {
            let next = token_counts[end];
            if total > 0 && total + next > max_tokens {
                break;
            }
            total += next;
            end += 1;
        }
        // Always take at least one sentence, even if it alone exceeds max_tokens.
        let end = end.max(start + 1);
        spans.push(ChunkSpan { start, end });

        if end >= sentences.len() {
            break;
        }

        // Back up `start` so the overlap tail is re-included in the next chunk.
        let mut overlap = 0usize;
        let mut new_start = end;
        while new_start > start && overlap < overlap_tokens {
            new_start -= 1;
            overlap += token_counts[new_start];
        }
        start = new_start.max(start + 1);
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(text: &str) -> Sentence {
        Sentence {
            text: text.to_string(),
            start_offset: 0,
            end_offset: text.len(),
        }
    }

    #[test]
    fn single_short_sentence_produces_one_chunk() {
        let sentences = vec![sentence("Hello world.")];
        let spans = pack_sentences(&sentences, 1_000, 100);
        assert_eq!(spans, vec![ChunkSpan { start: 0, end: 1 }]);
    }

    #[test]
    fn oversized_sentence_is_not_dropped() {
        let huge = "word ".repeat(2_000);
        let sentences = vec![sentence(&huge)];
        let spans = pack_sentences(&sentences, 1_000, 100);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0], ChunkSpan { start: 0, end: 1 });
    }

    #[test]
    fn packing_advances_monotonically() {
        let sentences: Vec<Sentence> = (0..50)
            .map(|i| sentence(&format!("Sentence number {i}.")))
            .collect();
        let spans = pack_sentences(&sentences, 20, 5);
        assert!(spans.len() > 1);
        let mut prev_end = 0;
        for span in &spans {
            assert!(span.end > prev_end);
            prev_end = span.end;
        }
        assert_eq!(spans.last().unwrap().end, sentences.len());
    }
}
