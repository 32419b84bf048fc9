//! Text segmentation
//!
//! Splits escaped input into chunks that fit one speech frame each. Cuts
//! prefer word boundaries and never land inside a character entity
//! reference, since a split `&amp;` would reach the service as a stray
//! ampersand.

use bytes::Bytes;

use crate::error::SpeechError;

/// Splits `text` into trimmed chunks of at most `max_bytes` bytes.
///
/// A `max_bytes` of zero yields no segments rather than an error. The cut
/// point is the last space inside the window when one exists, otherwise
/// exactly `max_bytes`. A cut that would land inside an unterminated entity
/// retreats to just before the entity's `&`; if that retreat runs off the
/// front of the window the text cannot be split and
/// [`SpeechError::UnsplittableSegment`] is returned.
///
/// Empty chunks after trimming are dropped but still consume input, so the
/// loop always makes progress.
pub fn split_text_by_byte_length(
    text: &[u8],
    max_bytes: usize,
) -> Result<Vec<Bytes>, SpeechError> {
    let mut segments = Vec::new();
    if max_bytes == 0 {
        return Ok(segments);
    }

    let mut rest = text;
    while rest.len() > max_bytes {
        let window = &rest[..max_bytes];
        let mut split_at = match window.iter().rposition(|&b| b == b' ') {
            Some(space) => space + 1,
            None => max_bytes,
        };

        // Retreat past any entity the cut would leave unterminated.
        loop {
            let window = &rest[..split_at];
            let Some(ampersand) = window.iter().rposition(|&b| b == b'&') else {
                break;
            };
            if window[ampersand..].contains(&b';') {
                break;
            }
            split_at = ampersand
                .checked_sub(1)
                .ok_or(SpeechError::UnsplittableSegment)?;
            if split_at == 0 {
                break;
            }
        }

        let chunk = trim_ascii(&rest[..split_at]);
        if !chunk.is_empty() {
            segments.push(Bytes::copy_from_slice(chunk));
        }
        if split_at == 0 {
            split_at = 1;
        }
        rest = &rest[split_at..];
    }

    let chunk = trim_ascii(rest);
    if !chunk.is_empty() {
        segments.push(Bytes::copy_from_slice(chunk));
    }

    Ok(segments)
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
