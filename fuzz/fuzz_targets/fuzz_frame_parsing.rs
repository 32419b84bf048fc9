#![no_main]

use libfuzzer_sys::fuzz_target;

use serde_json::Value;

/// Simulates the inbound frame handling performed by a session's receive
/// loop.
///
/// The real parsers in `src/tts/protocol.rs` are crate-private, so the
/// same extraction is replicated here to fuzz the code path without
/// exporting internal types: split a text frame at the first blank line,
/// split header lines at the first colon, parse a metadata body as JSON,
/// and slice a binary frame at its declared header length.
fn parse_text_frame(data: &str) {
    let Some((head, body)) = data.split_once("\r\n\r\n") else {
        return;
    };
    let mut path = None;
    for line in head.split("\r\n") {
        if let Some((key, value)) = line.split_once(':') {
            if key.trim() == "Path" {
                path = Some(value.trim().to_string());
            }
        }
    }
    if path.as_deref() == Some("audio.metadata") {
        let _: Result<Value, _> = serde_json::from_str(body);
    }
}

fn parse_binary_frame(data: &[u8]) {
    if data.len() < 2 {
        return;
    }
    let header_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    let _ = data.get(2 + header_len..);
}

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        parse_text_frame(text);
    }
    parse_binary_frame(data);
});
