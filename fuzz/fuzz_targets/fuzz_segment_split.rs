#![no_main]

use libfuzzer_sys::fuzz_target;

use readaloud::tts::segment::split_text_by_byte_length;

fuzz_target!(|input: (&[u8], u16)| {
    let (text, max_bytes) = input;
    let max_bytes = max_bytes as usize;

    // The splitter runs on attacker-adjacent input (anything a caller asks
    // to synthesize) and mixes byte arithmetic with entity lookbehind, so
    // the concerns are panics, infinite loops on degenerate cut points and
    // out-of-bounds slices.
    let Ok(segments) = split_text_by_byte_length(text, max_bytes) else {
        return;
    };

    for segment in &segments {
        assert!(!segment.is_empty());
        if max_bytes > 0 {
            assert!(segment.len() <= max_bytes);
        }
    }
    if max_bytes == 0 {
        assert!(segments.is_empty());
    }
});
