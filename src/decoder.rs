//! Incremental UTF-8 decoding of streamed answer bodies.
//!
//! The answering service sends plain text with no framing, so chunk
//! boundaries can fall anywhere, including inside a multi-byte character.
//! [`Utf8StreamDecoder`] carries the incomplete tail of one chunk over to the
//! next so that every character is decoded exactly once.

use std::borrow::Cow;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::Result;
use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};

const REPLACEMENT: char = '\u{FFFD}';

/// A stateful UTF-8 decoder for byte chunks that arrive over time.
///
/// Invalid sequences decode to U+FFFD rather than failing the stream.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    /// Creates a decoder with no buffered bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the next chunk, holding back an incomplete trailing character.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut out = String::with_capacity(self.pending.len() + chunk.len());
        if self.pending.is_empty() {
            self.decode_into(chunk, &mut out);
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            self.decode_into(&joined, &mut out);
        }
        out
    }

    /// Flushes the decoder at end of stream.
    ///
    /// A character that never completed becomes a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    /// Number of bytes waiting for the rest of their character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn decode_into(&mut self, mut bytes: &[u8], out: &mut String) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(text) => {
                    out.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = bytes.split_at(err.valid_up_to());
                    if let Cow::Borrowed(text) = String::from_utf8_lossy(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            bytes = &rest[len..];
                        }
                        None => {
                            self.pending = rest.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Turns a stream of body chunks into a stream of decoded text increments.
///
/// One increment is yielded per chunk, empty or not, followed by the flushed
/// remainder if the body ended mid-character. The first read error is yielded
/// and ends the stream; text already yielded is unaffected.
pub fn decode_stream<S>(byte_stream: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    stream::unfold(
        Some((byte_stream, Utf8StreamDecoder::new())),
        |state| async move {
            let (mut stream, mut decoder) = state?;
            match stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_CHUNKS.click();
                    STREAM_BYTES.count(bytes.len() as u64);
                    let text = decoder.decode(&bytes);
                    Some((Ok(text), Some((stream, decoder))))
                }
                Some(Err(err)) => {
                    STREAM_ERRORS.click();
                    tracing::warn!(error = %err, "answer stream failed");
                    Some((Err(err), None))
                }
                None => {
                    let tail = decoder.finish();
                    if tail.is_empty() {
                        None
                    } else {
                        Some((Ok(tail), None))
                    }
                }
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn decode_in_pieces(bytes: &[u8], boundaries: &[usize]) -> String {
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        let mut start = 0;
        for &end in boundaries {
            out.push_str(&decoder.decode(&bytes[start..end]));
            start = end;
        }
        out.push_str(&decoder.decode(&bytes[start..]));
        out.push_str(&decoder.finish());
        out
    }

    #[test]
    fn ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"Eating "), "Eating ");
        assert_eq!(decoder.decode(b""), "");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn split_character_is_held_back() {
        let text = "وضوء";
        let bytes = text.as_bytes();
        let mut decoder = Utf8StreamDecoder::new();

        assert_eq!(decoder.decode(&bytes[..1]), "");
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.decode(&bytes[1..]), text);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn every_split_point_decodes_identically() {
        let text = "Wudu (وضوء) — ablution 🕌 before ṣalāh";
        let bytes = text.as_bytes();
        for first in 0..=bytes.len() {
            for second in first..=bytes.len() {
                assert_eq!(decode_in_pieces(bytes, &[first, second]), text);
            }
        }
    }

    #[test]
    fn byte_at_a_time() {
        let text = "ṭahārah 🤲";
        let bytes = text.as_bytes();
        let boundaries: Vec<usize> = (1..bytes.len()).collect();
        assert_eq!(decode_in_pieces(bytes, &boundaries), text);
    }

    #[test]
    fn invalid_bytes_become_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xFFok"), "ok\u{FFFD}ok");
    }

    #[test]
    fn truncated_character_flushes_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        let bytes = "é".as_bytes();
        assert_eq!(decoder.decode(&bytes[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[tokio::test]
    async fn stream_yields_every_increment() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"Eating ")),
            Ok(Bytes::new()),
            Ok(Bytes::from_static(b"camel meat breaks wudu.")),
        ];
        let increments: Vec<_> = decode_stream(stream::iter(chunks)).collect().await;
        let increments: Vec<String> = increments.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(increments, vec!["Eating ", "", "camel meat breaks wudu."]);
    }

    #[tokio::test]
    async fn stream_joins_split_character() {
        let bytes = "سلام".as_bytes();
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::copy_from_slice(&bytes[..3])),
            Ok(Bytes::copy_from_slice(&bytes[3..])),
        ];
        let text: String = decode_stream(stream::iter(chunks))
            .map(|r| r.unwrap())
            .collect::<Vec<_>>()
            .await
            .concat();
        assert_eq!(text, "سلام");
    }

    #[tokio::test]
    async fn stream_stops_after_error() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"Partial answer")),
            Err(Error::stream_read_failed("connection dropped", None)),
            Ok(Bytes::from_static(b"never seen")),
        ];
        let results: Vec<_> = decode_stream(stream::iter(chunks)).collect().await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), "Partial answer");
        assert!(results[1].as_ref().unwrap_err().is_stream_read_failed());
    }
}
