//! Per-segment protocol session
//!
//! One session owns one websocket connection and synthesizes exactly one
//! segment. After the configuration frames are sent the session runs a
//! receive loop over the service's text/binary frames until the turn ends
//! or the connection dies. Everything the session learns is emitted as
//! [`Event`]s on the shared stream; a failing session never takes its
//! siblings down.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::error::SpeechError;
use crate::tts::event::{ErrorKind, Event};
use crate::tts::message::{
    connection_id, speech_config_frame, ssml_document, ssml_frame, wire_timestamp,
};
use crate::tts::protocol::{audio_payload, path, split_headers_and_body, AudioMetadata};
use crate::tts::request::SynthesisRequest;
use crate::tts::timeline::{Timeline, WORD_BOUNDARY_PAD};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.77 Safari/537.36 Edg/91.0.864.41";
const ORIGIN: &str = "chrome-extension://jdiccldimpdaibmpdkjnbmckianbfold";

type Connection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of one session. Binary audio frames are only accepted while
/// `Streaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Configuring,
    AwaitingTurn,
    Streaming,
    Completed,
    Failed,
}

/// Faults that terminate the receive loop. Reported as stream events by
/// the loop's guard, never propagated out of the task.
#[derive(Debug)]
enum SessionFault {
    Parse(String),
    Unrecognized(String),
    Transport(String),
}

impl SessionFault {
    fn kind(&self) -> ErrorKind {
        match self {
            SessionFault::Parse(_) => ErrorKind::ProtocolParse,
            SessionFault::Unrecognized(_) => ErrorKind::UnrecognizedMessage,
            SessionFault::Transport(_) => ErrorKind::Transport,
        }
    }

    fn into_message(self) -> String {
        match self {
            SessionFault::Parse(m) | SessionFault::Unrecognized(m) | SessionFault::Transport(m) => m,
        }
    }
}

/// One websocket session synthesizing one segment.
pub(crate) struct Session {
    index: usize,
    payload: Bytes,
    request: Arc<SynthesisRequest>,
    timeline: Arc<Timeline>,
    events: mpsc::UnboundedSender<Event>,
    conn: Connection,
    state: SessionState,
    audio_received: bool,
    shift: Option<u64>,
}

impl Session {
    /// Dials the service and sends the two configuration frames. Any
    /// failure here aborts the whole request, so the error is returned
    /// synchronously instead of being reported on the stream.
    pub(crate) async fn connect(
        endpoint: &str,
        index: usize,
        payload: Bytes,
        request: Arc<SynthesisRequest>,
        timeline: Arc<Timeline>,
        events: mpsc::UnboundedSender<Event>,
    ) -> Result<Self, SpeechError> {
        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!("{endpoint}{separator}ConnectionId={}", connection_id());

        let mut ws_request = url
            .into_client_request()
            .map_err(|source| SpeechError::Dial { segment: index, source })?;
        let headers = ws_request.headers_mut();
        headers.insert("Pragma", HeaderValue::from_static("no-cache"));
        headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
        headers.insert("Origin", HeaderValue::from_static(ORIGIN));
        headers.insert("Accept-Encoding", HeaderValue::from_static("gzip, deflate, br"));
        headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));

        let (conn, _) = connect_async(ws_request)
            .await
            .map_err(|source| SpeechError::Dial { segment: index, source })?;
        debug!(segment = index, "session connected");

        let mut session = Self {
            index,
            payload,
            request,
            timeline,
            events,
            conn,
            state: SessionState::Configuring,
            audio_received: false,
            shift: None,
        };
        session.configure().await?;
        Ok(session)
    }

    /// Sends the synthesis configuration and the SSML speech request as two
    /// text frames on the fresh connection.
    async fn configure(&mut self) -> Result<(), SpeechError> {
        let timestamp = wire_timestamp();
        let config = speech_config_frame(&timestamp);
        self.conn
            .send(Message::text(config))
            .await
            .map_err(|source| SpeechError::Dial { segment: self.index, source })?;

        let ssml = ssml_document(
            &self.payload,
            self.request.voice(),
            self.request.rate(),
            self.request.volume(),
            self.request.pitch(),
        );
        let speech = ssml_frame(&connection_id(), &timestamp, &ssml);
        self.conn
            .send(Message::text(speech))
            .await
            .map_err(|source| SpeechError::Dial { segment: self.index, source })?;

        self.state = SessionState::AwaitingTurn;
        Ok(())
    }

    /// Runs the receive loop to completion. The guard here converts every
    /// loop fault into an [`Event::Error`] so a bad segment degrades the
    /// stream instead of crashing the engine.
    pub(crate) async fn run(mut self) {
        debug!(segment = self.index, "receive loop started");
        match self.receive_loop().await {
            Ok(()) => {
                self.state = SessionState::Completed;
            }
            Err(fault) => {
                self.state = SessionState::Failed;
                let kind = fault.kind();
                warn!(segment = self.index, %kind, "session failed");
                self.report(kind, fault.into_message());
            }
        }
        if !self.audio_received {
            self.report(
                ErrorKind::NoAudioReceived,
                "no audio was received; verify that the request parameters are correct",
            );
        }
        debug!(segment = self.index, "session finished");
    }

    async fn receive_loop(&mut self) -> Result<(), SessionFault> {
        while let Some(frame) = self.conn.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if self.handle_text(text.as_str())? {
                        break;
                    }
                }
                Ok(Message::Binary(data)) => self.handle_binary(&data),
                Ok(Message::Close(close)) => match close {
                    Some(frame)
                        if frame.code == CloseCode::Normal || frame.code == CloseCode::Away =>
                    {
                        break;
                    }
                    Some(frame) => {
                        return Err(SessionFault::Transport(format!(
                            "connection closed abnormally: code {} {}",
                            u16::from(frame.code),
                            frame.reason
                        )));
                    }
                    None => {
                        return Err(SessionFault::Transport(
                            "connection closed without a close frame".to_string(),
                        ));
                    }
                },
                // Pings and pongs are answered by the transport.
                Ok(_) => {}
                Err(err) => return Err(SessionFault::Transport(err.to_string())),
            }
        }
        Ok(())
    }

    /// Dispatches one text frame. Returns `true` once the turn has ended.
    fn handle_text(&mut self, frame: &str) -> Result<bool, SessionFault> {
        let (headers, body) = split_headers_and_body(frame).ok_or_else(|| {
            SessionFault::Parse("text frame has no header block terminator".to_string())
        })?;

        match headers.get("Path").map(String::as_str) {
            Some(path::TURN_START) => {
                debug!(segment = self.index, "turn started");
                self.state = SessionState::Streaming;
                Ok(false)
            }
            Some(path::TURN_END) => {
                debug!(segment = self.index, "turn ended");
                self.state = SessionState::Completed;
                self.emit(Event::SegmentEnd { segment: self.index });
                Ok(true)
            }
            Some(path::AUDIO_METADATA) => {
                self.handle_metadata(body)?;
                Ok(false)
            }
            Some(path::RESPONSE) => Ok(false),
            _ => Err(SessionFault::Unrecognized(format!(
                "the response from the service is not recognized\n{frame}"
            ))),
        }
    }

    fn handle_metadata(&mut self, body: &str) -> Result<(), SessionFault> {
        let metadata: AudioMetadata = serde_json::from_str(body).map_err(|err| {
            SessionFault::Unrecognized(format!("bad audio.metadata payload: {err}, body={body}"))
        })?;

        for entry in metadata.entries {
            match entry.kind.as_str() {
                "WordBoundary" => {
                    let shift = self.segment_shift();
                    self.timeline.record(
                        self.index,
                        entry.data.offset + entry.data.duration + WORD_BOUNDARY_PAD,
                    );
                    self.emit(Event::WordBoundary {
                        segment: self.index,
                        offset: entry.data.offset + shift,
                        duration: entry.data.duration,
                        text: entry.data.text.text,
                    });
                }
                "SessionEnd" => continue,
                other => {
                    return Err(SessionFault::Unrecognized(format!(
                        "unknown metadata type: {other}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn handle_binary(&mut self, frame: &[u8]) {
        if self.state != SessionState::Streaming {
            self.report(
                ErrorKind::MalformedBinaryFrame,
                "binary frame received before turn.start",
            );
            return;
        }
        match audio_payload(frame) {
            Ok(payload) => {
                self.audio_received = true;
                self.emit(Event::AudioChunk {
                    segment: self.index,
                    data: Bytes::copy_from_slice(payload),
                });
            }
            Err(err) => self.report(ErrorKind::MalformedBinaryFrame, err.to_string()),
        }
    }

    /// Global shift of this segment, fixed at the first word boundary.
    /// Earlier segments that have not reported yet contribute zero.
    fn segment_shift(&mut self) -> u64 {
        match self.shift {
            Some(shift) => shift,
            None => {
                let shift = self.timeline.shift_before(self.index);
                self.shift = Some(shift);
                shift
            }
        }
    }

    fn emit(&self, event: Event) {
        // The consumer may have dropped the stream; sessions finish their
        // turn regardless.
        let _ = self.events.send(event);
    }

    fn report(&self, kind: ErrorKind, message: impl Into<String>) {
        self.emit(Event::Error {
            kind,
            message: message.into(),
        });
    }
}
