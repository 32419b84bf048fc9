//! Inbound frame parsing
//!
//! The service answers with text frames (a `Key:Value` header block, a
//! blank line, then a body) and binary frames (a big-endian header length
//! prefix, a header block and the raw audio payload).

use std::collections::HashMap;

use serde::Deserialize;

/// Paths carried in the `Path` header of inbound text frames.
pub(crate) mod path {
    pub const TURN_START: &str = "turn.start";
    pub const TURN_END: &str = "turn.end";
    pub const AUDIO_METADATA: &str = "audio.metadata";
    pub const RESPONSE: &str = "response";
}

/// Splits a text frame into its header map and body.
///
/// Returns `None` when the blank-line terminator is missing, which is an
/// unrecoverable parse fault for the session. Header lines without a colon
/// are skipped.
pub(crate) fn split_headers_and_body(frame: &str) -> Option<(HashMap<String, String>, &str)> {
    let (head, body) = frame.split_once("\r\n\r\n")?;
    let mut headers = HashMap::new();
    for line in head.split("\r\n") {
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    Some((headers, body))
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum BinaryFrameError {
    #[error("binary frame is missing its header length prefix")]
    MissingHeaderLength,
    #[error("binary frame is shorter than its declared header block")]
    MissingAudioPayload,
}

/// Extracts the audio payload of a binary frame. The first two bytes are
/// the big-endian length of a header block this client does not need
/// beyond framing.
pub(crate) fn audio_payload(frame: &[u8]) -> Result<&[u8], BinaryFrameError> {
    if frame.len() < 2 {
        return Err(BinaryFrameError::MissingHeaderLength);
    }
    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    frame
        .get(2 + header_len..)
        .ok_or(BinaryFrameError::MissingAudioPayload)
}

/// Body of an `audio.metadata` frame.
#[derive(Debug, Deserialize)]
pub(crate) struct AudioMetadata {
    #[serde(rename = "Metadata", default)]
    pub entries: Vec<MetadataEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetadataEntry {
    #[serde(rename = "Type")]
    pub kind: String,
    #[serde(rename = "Data", default)]
    pub data: MetadataValues,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetadataValues {
    /// Offset from the start of this segment's audio, in 100 ns ticks.
    #[serde(rename = "Offset", default)]
    pub offset: u64,
    #[serde(rename = "Duration", default)]
    pub duration: u64,
    #[serde(rename = "text", default)]
    pub text: MetadataText,
}

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)] // Length and BoundaryType are deserialized for wire fidelity only
pub(crate) struct MetadataText {
    #[serde(rename = "Text", default)]
    pub text: String,
    #[serde(rename = "Length", default)]
    pub length: u64,
    #[serde(rename = "BoundaryType", default)]
    pub boundary_type: String,
}
