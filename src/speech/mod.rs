//! Speech generation and persistence
//!
//! Consumes a synthesis stream and persists the result: audio chunks are
//! bucketed per segment, stitched back together in segment order once the
//! stream closes, and written through a [`Storage`] backend under a
//! content-addressed name. The engine itself stays free of storage
//! concerns.

pub mod store;

pub use store::{LocalStorage, MemoryStorage, ReadBroker, Storage, WriteBroker};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::SpeechError;
use crate::tts::{Event, SynthesisRequest, Synthesizer};

/// One synthesis job bound to a storage backend.
pub struct Speech<S: Storage> {
    request: SynthesisRequest,
    synthesizer: Synthesizer,
    storage: S,
}

impl<S: Storage> Speech<S> {
    pub fn new(request: SynthesisRequest, storage: S) -> Self {
        Self {
            request,
            synthesizer: Synthesizer::new(),
            storage,
        }
    }

    /// Same, against a custom synthesizer (proxy or mock endpoint).
    pub fn with_synthesizer(request: SynthesisRequest, synthesizer: Synthesizer, storage: S) -> Self {
        Self {
            request,
            synthesizer,
            storage,
        }
    }

    /// Cache name for this request's audio: the voice tag plus a digest of
    /// the text and prosody parameters. Identical requests map to the same
    /// file.
    pub fn file_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.request.text());
        hasher.update(self.request.rate());
        hasher.update(self.request.volume());
        hasher.update(self.request.pitch());
        format!(
            "{}_{}.mp3",
            self.request.voice_lang_region(),
            hex::encode(hasher.finalize())
        )
    }

    /// Synthesizes the request and stores the audio, returning the stored
    /// file name. A file that already exists under the cache name is
    /// reused without hitting the service.
    pub async fn generate(&self) -> Result<String, SpeechError> {
        let name = self.file_name();
        if self.storage.exists(&name).await {
            debug!(file = %name, "audio already stored");
            return Ok(name);
        }

        let mut stream = self.synthesizer.stream(&self.request).await?;
        let mut buckets: Vec<Vec<Bytes>> = vec![Vec::new(); stream.segment_count()];
        while let Some(event) = stream.recv().await {
            match event {
                Event::AudioChunk { segment, data } => buckets[segment].push(data),
                Event::WordBoundary { offset, duration, ref text, .. } => {
                    debug!(offset, duration, word = %text, "word boundary");
                }
                Event::SegmentEnd { segment } => debug!(segment, "segment finished"),
                Event::Error { kind, message } => {
                    warn!(%kind, %message, "synthesis reported an error");
                }
            }
        }

        let mut broker = self.storage.writer(&name).await?;
        for bucket in &buckets {
            for chunk in bucket {
                broker.write(chunk).await?;
            }
        }
        broker.close().await?;
        info!(file = %name, "audio stored");
        Ok(name)
    }

    /// Retrieval URL for a previously generated file.
    pub async fn url(&self, name: &str) -> Result<String, SpeechError> {
        self.storage.reader(name).await?.url().await
    }
}
