//! Fan-in synthesis stream
//!
//! Spawns one [`Session`](crate::tts::session::Session) per segment and
//! hands the caller a single event stream. All sessions dial before any
//! result is consumed; there is no throttling and no timeout, so a stalled
//! connection stalls its segment until the service hangs up.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SpeechError;
use crate::tts::event::Event;
use crate::tts::message::{escape, max_message_size, sanitize};
use crate::tts::request::SynthesisRequest;
use crate::tts::segment::split_text_by_byte_length;
use crate::tts::session::Session;
use crate::tts::timeline::Timeline;
use crate::tts::READ_ALOUD_ENDPOINT;

/// Entry point for streaming synthesis.
///
/// Holds only the service endpoint; one synthesizer can serve any number
/// of requests.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    endpoint: String,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Synthesizer {
    /// Synthesizer against the public read-aloud endpoint.
    pub fn new() -> Self {
        Self {
            endpoint: READ_ALOUD_ENDPOINT.to_string(),
        }
    }

    /// Synthesizer against a custom endpoint. Useful for proxies and for
    /// tests running a local mock of the service.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Segments the request's text and opens one concurrent session per
    /// segment.
    ///
    /// Sessions are dialed and configured in index order before any of
    /// their receive loops start; a failure on any of them aborts the whole
    /// request here. Once this returns, every session is already producing
    /// into the stream.
    ///
    /// The stream ends when the last session finishes. Consumers that only
    /// care about completion can simply drain until `None`; per-segment
    /// completion is visible through [`Event::SegmentEnd`].
    pub async fn stream(&self, request: &SynthesisRequest) -> Result<SpeechStream, SpeechError> {
        let text = escape(&sanitize(request.text()));
        let max_bytes = max_message_size(
            request.voice(),
            request.rate(),
            request.volume(),
            request.pitch(),
        );
        let segments = split_text_by_byte_length(text.as_bytes(), max_bytes)?;
        let count = segments.len();
        debug!(segments = count, "request segmented");

        let request = Arc::new(request.clone());
        let timeline = Arc::new(Timeline::new(count));
        let (events, stream) = mpsc::unbounded_channel();

        let mut sessions = Vec::with_capacity(count);
        for (index, payload) in segments.into_iter().enumerate() {
            let session = Session::connect(
                &self.endpoint,
                index,
                payload,
                Arc::clone(&request),
                Arc::clone(&timeline),
                events.clone(),
            )
            .await?;
            sessions.push(session);
        }
        // Receive loops hold the only senders from here on; the stream
        // closes itself when the last session finishes.
        drop(events);

        for session in sessions {
            tokio::spawn(session.run());
        }

        Ok(SpeechStream {
            events: stream,
            segments: count,
        })
    }
}

/// Ordered event stream for one synthesis request.
///
/// Ordered per segment; events of different segments interleave. Yields
/// `None` once every session has finished, including failed ones.
#[derive(Debug)]
pub struct SpeechStream {
    events: mpsc::UnboundedReceiver<Event>,
    segments: usize,
}

impl SpeechStream {
    /// Number of segments feeding this stream. Exactly this many
    /// [`Event::SegmentEnd`] events are emitted on a fully successful run.
    pub fn segment_count(&self) -> usize {
        self.segments
    }

    /// Next event, or `None` once all sessions are done.
    pub async fn recv(&mut self) -> Option<Event> {
        self.events.recv().await
    }
}

impl Stream for SpeechStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_recv(cx)
    }
}
