//! Protocol stream tests
//!
//! Runs the engine against the mock read-aloud service and checks the
//! event stream a consumer sees: ordering, per-segment fault isolation and
//! the continuous word timeline.

mod common;

use std::time::Duration;

use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

use common::{audio_frame, start_mock, text_frame, two_segment_text, word_boundary_frame, Script};
use readaloud::{ErrorKind, Event, SpeechError, SpeechStream, SynthesisRequest, Synthesizer};

/// Pad the engine adds after a segment's last word when carrying its
/// duration onto the next segment's timeline, in 100 ns ticks.
const TRAILING_WORD_PAD: u64 = 8_750_000;

async fn drain(mut stream: SpeechStream) -> Vec<Event> {
    tokio::time::timeout(Duration::from_secs(10), async {
        let mut events = Vec::new();
        while let Some(event) = stream.recv().await {
            events.push(event);
        }
        events
    })
    .await
    .expect("stream did not complete in time")
}

#[tokio::test]
async fn test_single_segment_event_order() {
    let endpoint = start_mock(vec![Script::new(vec![
        text_frame("turn.start", "{}"),
        audio_frame(b"MP3DATA"),
        word_boundary_frame(0, 5_000_000, "Hello"),
        text_frame("turn.end", "{}"),
    ])])
    .await;

    let request = SynthesisRequest::new("Hello. This is a test.").unwrap();
    let stream = Synthesizer::with_endpoint(endpoint)
        .stream(&request)
        .await
        .unwrap();
    assert_eq!(stream.segment_count(), 1);

    let events = drain(stream).await;
    assert_eq!(events.len(), 3, "unexpected events: {events:?}");
    assert!(matches!(
        &events[0],
        Event::AudioChunk { segment: 0, data } if data.as_ref() == b"MP3DATA"
    ));
    assert!(matches!(
        &events[1],
        Event::WordBoundary { segment: 0, offset: 0, duration: 5_000_000, text } if text == "Hello"
    ));
    assert!(matches!(&events[2], Event::SegmentEnd { segment: 0 }));
}

#[tokio::test]
async fn test_malformed_binary_frame_does_not_kill_the_session() {
    let endpoint = start_mock(vec![Script::new(vec![
        text_frame("turn.start", "{}"),
        Message::binary(vec![0x01]),
        audio_frame(b"AUDIO"),
        text_frame("turn.end", "{}"),
    ])])
    .await;

    let request = SynthesisRequest::new("hello world").unwrap();
    let stream = Synthesizer::with_endpoint(endpoint)
        .stream(&request)
        .await
        .unwrap();
    let events = drain(stream).await;

    assert!(matches!(
        &events[0],
        Event::Error { kind: ErrorKind::MalformedBinaryFrame, .. }
    ));
    // The session kept running and finished its turn.
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::AudioChunk { segment: 0, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::SegmentEnd { segment: 0 })));
}

#[tokio::test]
async fn test_binary_frame_before_turn_start_is_reported() {
    let endpoint = start_mock(vec![Script::new(vec![
        audio_frame(b"EARLY"),
        text_frame("turn.start", "{}"),
        audio_frame(b"AUDIO"),
        text_frame("turn.end", "{}"),
    ])])
    .await;

    let request = SynthesisRequest::new("hello world").unwrap();
    let stream = Synthesizer::with_endpoint(endpoint)
        .stream(&request)
        .await
        .unwrap();
    let events = drain(stream).await;

    assert!(matches!(
        &events[0],
        Event::Error { kind: ErrorKind::MalformedBinaryFrame, message } if message.contains("turn.start")
    ));
    // Only the in-turn chunk made it through.
    let chunks: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::AudioChunk { .. }))
        .collect();
    assert_eq!(chunks.len(), 1);
}

#[tokio::test]
async fn test_unrecognized_path_fails_the_segment_only() {
    let endpoint = start_mock(vec![Script::new(vec![text_frame("bogus.path", "{}")])]).await;

    let request = SynthesisRequest::new("hello world").unwrap();
    let stream = Synthesizer::with_endpoint(endpoint)
        .stream(&request)
        .await
        .unwrap();
    let events = drain(stream).await;

    assert!(events.iter().any(|e| matches!(
        e,
        Event::Error { kind: ErrorKind::UnrecognizedMessage, .. }
    )));
    // The loop never saw audio, which is reported as its own error.
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Error { kind: ErrorKind::NoAudioReceived, .. }
    )));
}

#[tokio::test]
async fn test_two_segments_emit_two_segment_ends() {
    let scripts = (0..2)
        .map(|_| {
            Script::new(vec![
                text_frame("turn.start", "{}"),
                audio_frame(b"AUDIO"),
                text_frame("turn.end", "{}"),
            ])
        })
        .collect();
    let endpoint = start_mock(scripts).await;

    let request = SynthesisRequest::new(two_segment_text()).unwrap();
    let stream = Synthesizer::with_endpoint(endpoint)
        .stream(&request)
        .await
        .unwrap();
    assert_eq!(stream.segment_count(), 2);

    let events = drain(stream).await;
    let ends: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, Event::SegmentEnd { .. }))
        .collect();
    assert_eq!(ends.len(), 2, "events: {events:?}");
}

#[tokio::test]
async fn test_word_offsets_continue_across_segments() {
    let (fire_gate, gate) = oneshot::channel();
    let endpoint = start_mock(vec![
        Script::new(vec![
            text_frame("turn.start", "{}"),
            audio_frame(b"AUDIO0"),
            word_boundary_frame(0, 10_000_000, "first"),
            text_frame("turn.end", "{}"),
        ]),
        Script::gated(
            vec![
                text_frame("turn.start", "{}"),
                audio_frame(b"AUDIO1"),
                word_boundary_frame(0, 5_000_000, "second"),
                text_frame("turn.end", "{}"),
            ],
            gate,
        ),
    ])
    .await;

    let request = SynthesisRequest::new(two_segment_text()).unwrap();
    let mut stream = Synthesizer::with_endpoint(endpoint)
        .stream(&request)
        .await
        .unwrap();

    let mut fire_gate = Some(fire_gate);
    let mut boundaries = Vec::new();
    let mut segment0_end = 0u64;
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = stream.recv().await {
            match &event {
                Event::WordBoundary { segment, offset, duration, .. } => {
                    if *segment == 0 {
                        segment0_end = segment0_end.max(offset + duration + TRAILING_WORD_PAD);
                    }
                    boundaries.push((*segment, *offset));
                }
                Event::SegmentEnd { segment: 0 } => {
                    // Segment 0 is fully recorded; let segment 1 speak.
                    if let Some(gate) = fire_gate.take() {
                        let _ = gate.send(());
                    }
                }
                _ => {}
            }
        }
    })
    .await
    .expect("stream did not complete in time");

    let segment1_offsets: Vec<u64> = boundaries
        .iter()
        .filter(|(segment, _)| *segment == 1)
        .map(|(_, offset)| *offset)
        .collect();
    assert!(!segment1_offsets.is_empty());
    assert_eq!(segment0_end, 18_750_000);
    for offset in segment1_offsets {
        assert!(
            offset >= segment0_end,
            "segment 1 offset {offset} precedes segment 0 end {segment0_end}"
        );
    }
}

#[tokio::test]
async fn test_dial_failure_aborts_the_request() {
    // Nothing listens here; the dial must fail synchronously.
    let request = SynthesisRequest::new("hello").unwrap();
    let result = Synthesizer::with_endpoint("ws://127.0.0.1:9/synthesize")
        .stream(&request)
        .await;
    assert!(matches!(result, Err(SpeechError::Dial { segment: 0, .. })));
}
