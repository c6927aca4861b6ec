//! Turns sentence spans into [`SemanticChunk`] values with provenance.

use super::breakpoints::ChunkSpan;
use super::segmenter::Sentence;
use super::tokenizer::count_tokens;
use super::types::{ChunkMetadata, SemanticChunk};

/// Joins the sentences in each span into one chunk body, discarding spans
/// that trim down to nothing.
pub fn assemble_chunks(
    source_id: &str,
    sentences: &[Sentence],
    spans: &[ChunkSpan],
    heading_hierarchy: &[String],
) -> Vec<SemanticChunk> {
    let mut chunks = Vec::with_capacity(spans.len());
    for (ordinal, span) in spans.iter().enumerate() {
        let slice = &sentences[span.start..span.end];
        let content: String = slice
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        let start_offset = slice.first().map(|s| s.start_offset).unwrap_or(0);
        let end_offset = slice.last().map(|s| s.end_offset).unwrap_or(0);

        chunks.push(SemanticChunk::new(
            content,
            count_tokens(content),
            ChunkMetadata {
                source_id: source_id.to_string(),
                ordinal,
                start_offset,
                end_offset,
                heading_hierarchy: heading_hierarchy.to_vec(),
            },
        ));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembled_chunks_are_contiguous_in_ordinal_order() {
        let sentences = vec![
            Sentence { text: "A.".into(), start_offset: 0, end_offset: 2 },
            Sentence { text: "B.".into(), start_offset: 3, end_offset: 5 },
        ];
        let spans = vec![
            ChunkSpan { start: 0, end: 1 },
            ChunkSpan { start: 1, end: 2 },
        ];
        let chunks = assemble_chunks("src-1", &sentences, &spans, &[]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].metadata.ordinal, 0);
        assert_eq!(chunks[1].metadata.ordinal, 1);
    }

    #[test]
    fn empty_span_content_is_discarded() {
        let sentences = vec![Sentence { text: "   ".into(), start_offset: 0, end_offset: 3 }];
        let spans = vec![ChunkSpan { start: 0, end: 1 }];
        let chunks = assemble_chunks("src-1", &sentences, &spans, &[]);
        assert!(chunks.is_empty());
    }
}
