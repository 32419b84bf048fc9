//! Crate error types
//!
//! Synchronous failures surface here as [`SpeechError`]. Faults that occur
//! inside a running session are reported on the event stream instead, so a
//! failing segment never aborts its siblings.

use tokio_tungstenite::tungstenite;

/// Error returned by request construction, segmentation, session setup and
/// the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// Voice tag did not look like `en-US-AriaNeural`.
    #[error("invalid voice {0:?}: expected a tag like en-US-AriaNeural")]
    InvalidVoice(String),
    /// Rate was not a signed percentage.
    #[error("invalid rate {0:?}: expected a signed percentage like +0%")]
    InvalidRate(String),
    /// Volume was not a signed percentage.
    #[error("invalid volume {0:?}: expected a signed percentage like +0%")]
    InvalidVolume(String),
    /// The escaped text cannot be cut under the wire frame limit without
    /// splitting a character entity.
    #[error("maximum byte length is too small to split the escaped text")]
    UnsplittableSegment,
    /// Opening or configuring a segment's websocket session failed. Any
    /// segment failing here aborts the whole request before receive loops
    /// are spawned.
    #[error("failed to open session for segment {segment}: {source}")]
    Dial {
        segment: usize,
        #[source]
        source: tungstenite::Error,
    },
    /// Storage backend I/O failure.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    /// The named file is not present in the storage backend.
    #[error("file {0:?} does not exist in storage")]
    NotFound(String),
}
