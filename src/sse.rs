//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! `streamGenerateContent?alt=sse` answers with one event per response
//! chunk. Each event's `data:` payload is a complete
//! [`GenerateContentResponse`] or, if the service fails after the stream has
//! started, an `{"error": {...}}` object.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::observability::{STREAM_BYTES, STREAM_CHUNKS, STREAM_ERRORS};
use crate::types::GenerateContentResponse;
use crate::{Error, Result};

/// Error object the service embeds in a stream or an error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub code: Option<u16>,
    pub message: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EventData {
    Error { error: ErrorDetail },
    Chunk(GenerateContentResponse),
}

/// Process a stream of bytes into a stream of response chunks.
///
/// Events may be split across or packed into byte chunks arbitrarily,
/// including in the middle of a multi-byte character.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let buffer = Vec::new();

    stream::unfold(
        (stream, buffer),
        move |(mut stream, mut buffer)| async move {
            loop {
                if let Some((event, remaining)) = extract_event(&buffer) {
                    buffer = remaining;
                    match event {
                        Some(event) => {
                            count_event(&event);
                            return Some((event, (stream, buffer)));
                        }
                        None => continue,
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend(bytes.iter().filter(|b| **b != b'\r'));
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer)));
                    }
                    None => {
                        // A final event may arrive without its trailing blank line.
                        if buffer.iter().any(|b| !b.is_ascii_whitespace()) {
                            buffer.extend_from_slice(b"\n\n");
                            if let Some((Some(event), _)) = extract_event(&buffer) {
                                count_event(&event);
                                return Some((event, (stream, Vec::new())));
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

fn count_event(event: &Result<GenerateContentResponse>) {
    match event {
        Ok(_) => STREAM_CHUNKS.click(),
        Err(_) => STREAM_ERRORS.click(),
    }
}

/// Extract one complete event from the front of `buffer`.
///
/// Returns `None` when no complete event is buffered yet. Otherwise returns
/// the parsed event (or `None` for events without data, such as comments)
/// and the bytes that follow it.
#[allow(clippy::type_complexity)]
fn extract_event(buffer: &[u8]) -> Option<(Option<Result<GenerateContentResponse>>, Vec<u8>)> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    let rest = buffer[end + 2..].to_vec();

    let event_text = match std::str::from_utf8(&buffer[..end]) {
        Ok(text) => text,
        Err(e) => {
            return Some((
                Some(Err(Error::encoding(
                    format!("Invalid UTF-8 in stream: {e}"),
                    Some(Box::new(e)),
                ))),
                rest,
            ));
        }
    };

    let data = event_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect::<Vec<_>>();
    if data.is_empty() {
        return Some((None, rest));
    }

    Some((Some(parse_data(&data.join("\n"))), rest))
}

fn parse_data(data: &str) -> Result<GenerateContentResponse> {
    match serde_json::from_str::<EventData>(data) {
        Ok(EventData::Chunk(chunk)) => Ok(chunk),
        Ok(EventData::Error { error }) => Err(Error::api(
            error.code.unwrap_or(500),
            error.status,
            error
                .message
                .unwrap_or_else(|| "error reported in stream".to_string()),
        )),
        Err(e) => Err(Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::io;

    fn byte_stream(
        chunks: Vec<&'static [u8]>,
    ) -> impl Stream<Item = std::result::Result<Bytes, io::Error>> + Unpin {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    const CHUNK: &[u8] =
        br#"data: {"candidates": [{"content": {"parts": [{"text": "Ahoy"}],"role": "model"}}]}"#;

    #[tokio::test]
    async fn parse_single_event() {
        let data = [CHUNK, b"\r\n\r\n"].concat();
        let stream = stream::once(async move { Ok::<_, io::Error>(Bytes::from(data)) });

        let events: Vec<_> = Box::pin(process_sse(Box::pin(stream))).collect().await;

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text().as_deref(), Some("Ahoy"));
    }

    #[tokio::test]
    async fn handle_split_event() {
        let stream = byte_stream(vec![
            b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"te",
            b"xt\": \"Ahoy\"}]}}]}\n",
            b"\n",
        ]);

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert_eq!(event.unwrap().text().as_deref(), Some("Ahoy"));
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn handle_multibyte_character_split_across_chunks() {
        // "é" is 0xC3 0xA9.
        let stream = byte_stream(vec![
            b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"caf\xC3",
            b"\xA9\"}]}}]}\n\n",
        ]);

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert_eq!(event.unwrap().text().as_deref(), Some("café"));
    }

    #[tokio::test]
    async fn skip_comments_and_keep_order() {
        let stream = byte_stream(vec![
            b": keep-alive\n\n",
            b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"one\"}]}}]}\n\n",
            b"data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"two\"}]}}]}\n\n",
        ]);

        let texts: Vec<String> = Box::pin(process_sse(stream))
            .map(|event| event.unwrap().text().unwrap())
            .collect()
            .await;

        assert_eq!(texts, vec!["one".to_string(), "two".to_string()]);
    }

    #[tokio::test]
    async fn final_event_without_blank_line() {
        let stream = byte_stream(vec![CHUNK]);

        let events: Vec<_> = Box::pin(process_sse(stream)).collect().await;

        assert_eq!(events.len(), 1);
        assert!(events[0].is_ok());
    }

    #[tokio::test]
    async fn error_object_in_stream() {
        let stream = byte_stream(vec![
            b"data: {\"error\": {\"code\": 503, \"message\": \"The model is overloaded.\", \"status\": \"UNAVAILABLE\"}}\n\n",
        ]);

        let mut sse_stream = Box::pin(process_sse(stream));
        let err = sse_stream.next().await.unwrap().unwrap_err();

        assert_eq!(err.status_code(), Some(503));
        assert!(err.to_string().contains("The model is overloaded."));
    }

    #[tokio::test]
    async fn handle_malformed_event() {
        let stream = byte_stream(vec![b"data: not json\n\n"]);

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert!(matches!(event, Err(Error::Serialization { .. })));
    }

    #[tokio::test]
    async fn transport_error_is_streaming_error() {
        let stream = stream::iter(vec![
            Ok(Bytes::from_static(CHUNK)),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ]);

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();

        assert!(event.unwrap_err().is_streaming());
    }
}
