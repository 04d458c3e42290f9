//! Input normalization for markdown sources.
//!
//! Front-matter parsing needs the whole document, so every source shape is
//! drained to completion before decoding. Invalid UTF-8 is decoded with
//! replacement characters rather than failing - one badly encoded file must
//! not abort an entire indexing run.

use std::io::Read;

/// A markdown document in any of the supported input shapes.
///
/// Each variant reduces to a single decoded string via
/// [`read_to_string`](MarkdownSource::read_to_string).
pub enum MarkdownSource {
    /// Already-decoded text, used as-is.
    Text(String),
    /// A byte buffer, decoded as UTF-8.
    Bytes(Vec<u8>),
    /// A pull-style byte stream, drained to completion.
    Reader(Box<dyn Read + Send>),
    /// A push-style sequence of byte chunks, collected in order.
    Chunks(Box<dyn Iterator<Item = std::io::Result<Vec<u8>>> + Send>),
}

impl MarkdownSource {
    /// Drain the source and decode it into a single string.
    ///
    /// Decoding is lossy: malformed UTF-8 sequences become U+FFFD.
    pub fn read_to_string(self) -> std::io::Result<String> {
        match self {
            MarkdownSource::Text(text) => Ok(text),
            MarkdownSource::Bytes(bytes) => Ok(decode(&bytes)),
            MarkdownSource::Reader(mut reader) => {
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes)?;
                Ok(decode(&bytes))
            }
            MarkdownSource::Chunks(chunks) => {
                let mut bytes = Vec::new();
                for chunk in chunks {
                    bytes.extend_from_slice(&chunk?);
                }
                Ok(decode(&bytes))
            }
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl From<String> for MarkdownSource {
    fn from(text: String) -> Self {
        MarkdownSource::Text(text)
    }
}

impl From<&str> for MarkdownSource {
    fn from(text: &str) -> Self {
        MarkdownSource::Text(text.to_string())
    }
}

impl From<Vec<u8>> for MarkdownSource {
    fn from(bytes: Vec<u8>) -> Self {
        MarkdownSource::Bytes(bytes)
    }
}

impl From<&[u8]> for MarkdownSource {
    fn from(bytes: &[u8]) -> Self {
        MarkdownSource::Bytes(bytes.to_vec())
    }
}
