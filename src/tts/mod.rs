//! Text-to-Speech streaming engine
//!
//! Speaks the websocket protocol behind the Edge browser's "read aloud"
//! feature. Input text is escaped and split into byte-bounded segments, one
//! websocket session is opened per segment, and every session's audio and
//! word-timing events fan in to a single [`SpeechStream`]. Word offsets are
//! shifted onto one continuous timeline across segments.

pub mod event;
pub mod message;
pub mod protocol;
pub mod request;
pub mod segment;
pub mod session;
pub mod stream;
pub mod timeline;

pub use event::{ErrorKind, Event};
pub use request::{SynthesisRequest, SynthesisRequestBuilder, DEFAULT_VOICE};
pub use stream::{SpeechStream, Synthesizer};

/// Synthesis service endpoint. A fresh `ConnectionId` is appended for every
/// segment's session.
pub const READ_ALOUD_ENDPOINT: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1?TrustedClientToken=6A5AA1D4EAFF4E9FB37E23D68491D6F4";
