//! Decodes a [`SourceFile`]'s raw bytes into the [`ChunkSource`] the
//! chunking service expects, dispatching on MIME type.
//!
//! HTML reuses the same cleaning pass the web crawler uses for dedup
//! hashing ([`crate::sources::web::clean_html`]); PDF and CSV get their own
//! decoders; anything else falls back to a lossy UTF-8 read.

use csv::ReaderBuilder;
use thiserror::Error;

use crate::semantic_chunking::types::ChunkSource;
use crate::sources::{web::clean_html, SourceFile};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to decode {mime}: {reason}")]
    Decode { mime: String, reason: String },
}

/// Decodes `bytes` (as staged for `file`) into a [`ChunkSource`], choosing
/// the decoder by `file.mime_type`.
pub fn normalize(file: &SourceFile, bytes: &[u8]) -> Result<ChunkSource, NormalizeError> {
    match file.mime_type.as_str() {
        "text/html" => {
            let html = String::from_utf8_lossy(bytes);
            Ok(ChunkSource::PlainText(clean_html(&html)))
        }
        "application/pdf" => decode_pdf(bytes, &file.mime_type),
        "text/csv" => decode_csv(bytes, &file.mime_type),
        "application/json" => {
            let text = String::from_utf8_lossy(bytes);
            let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| NormalizeError::Decode {
                mime: file.mime_type.clone(),
                reason: e.to_string(),
            })?;
            Ok(ChunkSource::Json(value))
        }
        _ => Ok(ChunkSource::PlainText(String::from_utf8_lossy(bytes).into_owned())),
    }
}

fn decode_pdf(bytes: &[u8], mime: &str) -> Result<ChunkSource, NormalizeError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| NormalizeError::Decode {
        mime: mime.to_string(),
        reason: e.to_string(),
    })?;
    Ok(ChunkSource::PlainText(normalize_whitespace(&text)))
}

fn decode_csv(bytes: &[u8], mime: &str) -> Result<ChunkSource, NormalizeError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| NormalizeError::Decode {
            mime: mime.to_string(),
            reason: e.to_string(),
        })?
        .clone();

    let mut rendered = String::new();
    for record in reader.records() {
        let record = record.map_err(|e| NormalizeError::Decode {
            mime: mime.to_string(),
            reason: e.to_string(),
        })?;
        for (header, value) in headers.iter().zip(record.iter()) {
            rendered.push_str(header);
            rendered.push_str(": ");
            rendered.push_str(value);
            rendered.push('\n');
        }
        rendered.push('\n');
    }
    Ok(ChunkSource::PlainText(rendered))
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(mime: &str) -> SourceFile {
        SourceFile {
            display_name: "doc".into(),
            source_url: "https://example.com/doc".into(),
            local_staging_path: None,
            object_store_path: None,
            mime_type: mime.to_string(),
            content_hash: "hash".into(),
            engine_id: "engine-1".into(),
        }
    }

    #[test]
    fn html_is_cleaned_to_plain_text() {
        let out = normalize(&file("text/html"), b"<html><body><p>Hello <b>world</b></p></body></html>").unwrap();
        match out {
            ChunkSource::PlainText(text) => assert_eq!(text, "Hello world"),
            _ => panic!("expected plain text"),
        }
    }

    #[test]
    fn csv_renders_header_value_pairs() {
        let out = normalize(&file("text/csv"), b"name,age\nAda,30\n").unwrap();
        match out {
            ChunkSource::PlainText(text) => {
                assert!(text.contains("name: Ada"));
                assert!(text.contains("age: 30"));
            }
            _ => panic!("expected plain text"),
        }
    }

    #[test]
    fn unknown_mime_falls_back_to_lossy_text() {
        let out = normalize(&file("application/octet-stream"), b"plain bytes").unwrap();
        match out {
            ChunkSource::PlainText(text) => assert_eq!(text, "plain bytes"),
            _ => panic!("expected plain text"),
        }
    }

    #[test]
    fn json_mime_decodes_as_json_source() {
        let out = normalize(&file("application/json"), br#"{"a":1}"#).unwrap();
        assert!(matches!(out, ChunkSource::Json(_)));
    }
}
