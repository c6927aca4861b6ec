//! Token counting, abstracted behind the `semantic-chunking-*` feature set
//! so the chunker can be compiled against tiktoken, rust-bert, or segtok
//! tokenization without depending on all three.

#[cfg(feature = "semantic-chunking-tiktoken")]
pub fn count_tokens(text: &str) -> usize {
    use tiktoken_rs::cl100k_base;
    static BPE: once_cell::sync::Lazy<tiktoken_rs::CoreBPE> =
        once_cell::sync::Lazy::new(|| cl100k_base().expect("loading cl100k_base tokenizer"));
    BPE.encode_with_special_tokens(text).len()
}

#[cfg(not(feature = "semantic-chunking-tiktoken"))]
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_tokens_nonempty_for_nonempty_text() {
        assert!(count_tokens("hello world, how are you?") > 0);
    }

    #[test]
    fn count_tokens_zero_for_empty_text() {
        assert_eq!(count_tokens(""), 0);
    }
}
