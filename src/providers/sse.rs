//! Server-Sent Events decoding for streamed replies
//!
//! Raw body chunks are buffered until a blank line closes an event; the
//! `data:` lines of each event are joined and yielded in arrival order.

use crate::error::Result;

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;

/// Incremental SSE event decoder
///
/// Chunk boundaries may fall anywhere, including inside a multi-byte
/// character; only complete events are decoded.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: BytesMut,
}

impl SseDecoder {
    /// Creates an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the data payloads of every event it completes
    ///
    /// # Examples
    ///
    /// ```
    /// use ragbot::providers::sse::SseDecoder;
    ///
    /// let mut decoder = SseDecoder::new();
    /// assert!(decoder.push(b"data: hel").is_empty());
    /// assert_eq!(decoder.push(b"lo\n\n"), vec!["hello".to_string()]);
    /// ```
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some((pos, delimiter)) = find_event_end(&self.buffer) {
            let block = self.buffer.split_to(pos);
            self.buffer.advance(delimiter);
            if let Some(data) = event_data(&String::from_utf8_lossy(&block)) {
                events.push(data);
            }
        }
        events
    }

    /// Decode whatever is left once the body ends
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let block = self.buffer.split();
        event_data(&String::from_utf8_lossy(&block))
    }
}

/// Position and length of the first blank-line delimiter
///
/// Lines may end in LF, CRLF or a lone CR.
fn find_event_end(buffer: &[u8]) -> Option<(usize, usize)> {
    (0..buffer.len()).find_map(|i| {
        let rest = &buffer[i..];
        if rest.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else if rest.starts_with(b"\n\n") || rest.starts_with(b"\r\r") {
            Some((i, 2))
        } else {
            None
        }
    })
}

/// Join the `data:` lines of one event block
///
/// Comments and other fields are ignored. Events without data yield `None`.
fn event_data(block: &str) -> Option<String> {
    let data_lines: Vec<&str> = block
        .split(|c| c == '\r' || c == '\n')
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect();

    if data_lines.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    if data.is_empty() {
        None
    } else {
        Some(data)
    }
}

struct DecodeState<S> {
    inner: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Turn a byte stream into a lazy stream of SSE data payloads
///
/// A transport error is yielded once and ends the stream.
pub fn data_events<S, E>(byte_stream: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = DecodeState {
        inner: byte_stream,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.pending.pop_front() {
                return Some((Ok(data), state));
            }
            if state.done {
                return None;
            }

            match state.inner.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(&chunk);
                    state.pending.extend(events);
                }
                Some(Err(e)) => {
                    tracing::error!("Stream interrupted: {}", e);
                    state.done = true;
                    return Some((Err(anyhow::Error::new(e)), state));
                }
                None => {
                    state.done = true;
                    if let Some(rest) = state.decoder.finish() {
                        state.pending.push_back(rest);
                    }
                }
            }
        }
    })
}
