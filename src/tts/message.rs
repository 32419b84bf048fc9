//! Outbound wire messages
//!
//! Pure render functions for the two text frames a session sends: the
//! synthesis configuration and the SSML speech request. Header blocks are
//! `\r\n`-joined `Key:Value` lines terminated by a blank line; the service
//! answers in the same shape.

use chrono::Utc;
use uuid::Uuid;

/// Upper bound for one websocket message accepted by the service.
pub(crate) const WEBSOCKET_MAX_SIZE: usize = 1 << 16;

/// Slack subtracted from the frame limit on top of the rendered header
/// overhead.
pub(crate) const MESSAGE_OVERHEAD_SLACK: usize = 50;

/// Configuration body requesting 24 kHz 48 kbit/s mono MP3 output with word
/// boundary metadata only.
const SPEECH_CONFIG_BODY: &str = r#"{"context":{"synthesis":{"audio":{"metadataoptions":{"sentenceBoundaryEnabled":false,"wordBoundaryEnabled":true},"outputFormat":"audio-24khz-48kbitrate-mono-mp3"}}}}"#;

/// Renders the `speech.config` text frame.
pub(crate) fn speech_config_frame(timestamp: &str) -> String {
    format!(
        "X-Timestamp:{timestamp}\r\nContent-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n{SPEECH_CONFIG_BODY}\r\n"
    )
}

/// Renders the `ssml` text frame. The timestamp gets a trailing `Z` here
/// and only here.
pub(crate) fn ssml_frame(request_id: &str, timestamp: &str, ssml: &str) -> String {
    format!(
        "X-RequestId:{request_id}\r\nContent-Type:application/ssml+xml\r\nX-Timestamp:{timestamp}Z\r\nPath:ssml\r\n\r\n{ssml}"
    )
}

/// Wraps one segment's text in the SSML document the service expects: one
/// voice, one prosody element.
///
/// A forced byte cut can leave a segment that is not valid UTF-8; such
/// bytes are carried over lossily.
pub(crate) fn ssml_document(text: &[u8], voice: &str, rate: &str, volume: &str, pitch: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'><voice name='{voice}'><prosody pitch='{pitch}' rate='{rate}' volume='{volume}'>{}</prosody></voice></speak>",
        String::from_utf8_lossy(text)
    )
}

/// Timestamp in the fixed-zone UTC shape the service expects, for example
/// `Fri Aug 08 2025 10:11:12 GMT+0000 (UTC)`.
pub(crate) fn wire_timestamp() -> String {
    Utc::now().format("%a %b %d %Y %H:%M:%S GMT+0000 (UTC)").to_string()
}

/// Fresh 32-character connection token, regenerated per segment.
pub(crate) fn connection_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Largest segment payload that still fits one speech frame with the given
/// prosody values. Header length varies with them, so this is computed per
/// request.
pub(crate) fn max_message_size(voice: &str, rate: &str, volume: &str, pitch: &str) -> usize {
    let overhead = ssml_frame(
        &connection_id(),
        &wire_timestamp(),
        &ssml_document(b"", voice, rate, volume, pitch),
    )
    .len()
        + MESSAGE_OVERHEAD_SLACK;
    WEBSOCKET_MAX_SIZE.saturating_sub(overhead)
}

/// Replaces characters the service rejects (control characters outside tab,
/// newline and carriage return) with spaces.
pub(crate) fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{00}'..='\u{08}' | '\u{0B}'..='\u{0C}' | '\u{0E}'..='\u{1F}' => ' ',
            other => other,
        })
        .collect()
}

/// XML-escapes text for embedding in the SSML body. Ampersands first.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&#34;"),
            other => escaped.push(other),
        }
    }
    escaped
}
