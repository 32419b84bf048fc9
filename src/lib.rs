//! readaloud client library
//!
//! Streaming client for the websocket speech-synthesis service behind the
//! Edge browser's "read aloud" feature. Text goes in, a stream of MP3
//! audio chunks and word-timing events comes out.
//!
//! The [`tts`] module is the protocol engine: segmentation, SSML framing,
//! the per-segment session state machine and the fan-in event stream. The
//! [`speech`] module sits on top and persists a finished synthesis behind
//! pluggable storage.
//!
//! ```no_run
//! use readaloud::{Speech, SynthesisRequest};
//! use readaloud::speech::LocalStorage;
//!
//! # async fn demo() -> Result<(), readaloud::SpeechError> {
//! let request = SynthesisRequest::builder("Hello, world!")
//!     .voice("en-US-AriaNeural")
//!     .rate("-5%")
//!     .build()?;
//! let speech = Speech::new(request, LocalStorage::new("audio"));
//! let name = speech.generate().await?;
//! let url = speech.url(&name).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod speech;
pub mod tts;

pub use error::SpeechError;
pub use speech::Speech;
pub use tts::{ErrorKind, Event, SpeechStream, SynthesisRequest, Synthesizer};
