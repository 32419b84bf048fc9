//! Mock read-aloud service shared by the integration tests.
//!
//! A local websocket listener that replays scripted frames per connection.
//! Connections are accepted in dial order, which is segment order.

#![allow(dead_code)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// One scripted connection: frames to send after the client's two
/// configuration frames.
pub struct Script {
    pub frames: Vec<Message>,
    /// Hold the frames back until this fires.
    pub gate: Option<oneshot::Receiver<()>>,
    /// Or just wait this long before speaking.
    pub delay: Option<Duration>,
}

impl Script {
    pub fn new(frames: Vec<Message>) -> Self {
        Self {
            frames,
            gate: None,
            delay: None,
        }
    }

    pub fn gated(frames: Vec<Message>, gate: oneshot::Receiver<()>) -> Self {
        Self {
            frames,
            gate: Some(gate),
            delay: None,
        }
    }

    pub fn delayed(frames: Vec<Message>, delay: Duration) -> Self {
        Self {
            frames,
            gate: None,
            delay: Some(delay),
        }
    }
}

/// Starts the mock service and returns its endpoint URL.
pub async fn start_mock(scripts: Vec<Script>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for script in scripts {
            let (stream, _) = listener.accept().await.unwrap();
            let mut conn = accept_async(stream).await.unwrap();
            tokio::spawn(async move {
                // The client always sends speech.config and ssml first.
                let _ = conn.next().await;
                let _ = conn.next().await;
                if let Some(gate) = script.gate {
                    let _ = gate.await;
                }
                if let Some(delay) = script.delay {
                    tokio::time::sleep(delay).await;
                }
                for frame in script.frames {
                    if conn.send(frame).await.is_err() {
                        return;
                    }
                }
                let _ = conn.close(None).await;
            });
        }
    });
    format!("ws://{addr}/synthesize?token=test")
}

pub fn text_frame(path: &str, body: &str) -> Message {
    Message::text(format!(
        "X-RequestId:abc123\r\nContent-Type:application/json; charset=utf-8\r\nPath:{path}\r\n\r\n{body}"
    ))
}

pub fn audio_frame(payload: &[u8]) -> Message {
    let header = b"Content-Type:audio/mpeg\r\nPath:audio\r\n";
    let mut frame = Vec::with_capacity(2 + header.len() + payload.len());
    frame.extend_from_slice(&(header.len() as u16).to_be_bytes());
    frame.extend_from_slice(header);
    frame.extend_from_slice(payload);
    Message::binary(frame)
}

pub fn word_boundary_frame(offset: u64, duration: u64, word: &str) -> Message {
    let body = format!(
        r#"{{"Metadata":[{{"Type":"WordBoundary","Data":{{"Offset":{offset},"Duration":{duration},"text":{{"Text":"{word}","Length":{},"BoundaryType":"WordBoundary"}}}}}}]}}"#,
        word.len()
    );
    text_frame("audio.metadata", &body)
}

/// Text long enough to split into exactly two segments under the default
/// frame size limit.
pub fn two_segment_text() -> String {
    "lorem ipsum dolor sit amet ".repeat(2500)
}
