//! Stream events
//!
//! The closed set of values a synthesis stream can emit. Every session
//! writes these into the shared output channel; ownership transfers to the
//! consumer on emission.

use bytes::Bytes;

/// Kind of fault reported on the stream.
///
/// Faults are scoped to the segment that raised them. None of them aborts
/// sibling segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A text frame carried an unknown path or an unknown metadata type.
    UnrecognizedMessage,
    /// A text frame had no header block terminator. Fatal to the session.
    ProtocolParse,
    /// A binary frame was truncated or arrived outside a turn. The session
    /// keeps running.
    MalformedBinaryFrame,
    /// The connection failed or closed abnormally.
    Transport,
    /// The session's receive loop ended without a single audio frame.
    NoAudioReceived,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnrecognizedMessage => "unrecognized message",
            ErrorKind::ProtocolParse => "protocol parse",
            ErrorKind::MalformedBinaryFrame => "malformed binary frame",
            ErrorKind::Transport => "transport",
            ErrorKind::NoAudioReceived => "no audio received",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event on the synthesis stream.
///
/// Events are ordered per segment. Events of different segments interleave
/// arbitrarily; [`Event::WordBoundary`] offsets are already shifted onto
/// the request-wide timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A chunk of synthesized audio for one segment.
    AudioChunk {
        /// Index of the segment this chunk belongs to.
        segment: usize,
        /// Raw audio bytes (24 kHz 48 kbit/s mono MP3).
        data: Bytes,
    },
    /// Timing of one spoken word.
    WordBoundary {
        /// Index of the segment the word belongs to.
        segment: usize,
        /// Offset from the start of the whole request, in 100 ns ticks.
        offset: u64,
        /// Word duration in 100 ns ticks.
        duration: u64,
        /// The spoken word.
        text: String,
    },
    /// The segment's turn finished normally.
    SegmentEnd {
        /// Index of the finished segment.
        segment: usize,
    },
    /// A segment-scoped fault. The stream keeps running.
    Error {
        /// What went wrong.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
    },
}
