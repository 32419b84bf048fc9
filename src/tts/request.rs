//! Synthesis requests
//!
//! A validated, immutable description of one synthesis job: the text plus
//! the voice and prosody parameters carried into every segment's SSML.

use regex::Regex;

use crate::error::SpeechError;

/// Voice used when the builder is given none.
pub const DEFAULT_VOICE: &str = "en-US-AriaNeural";

const VOICE_PATTERN: &str = r"^([a-z]{2,})-([A-Z]{2,})-(.+Neural)$";
const PERCENTAGE_PATTERN: &str = r"^[+-]\d+%$";

/// One validated synthesis job. Construct through [`SynthesisRequest::builder`];
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    text: String,
    voice: String,
    voice_lang_region: String,
    rate: String,
    volume: String,
    pitch: String,
    proxy: Option<String>,
}

impl SynthesisRequest {
    /// Request with all parameters at their defaults.
    pub fn new(text: impl Into<String>) -> Result<Self, SpeechError> {
        Self::builder(text).build()
    }

    pub fn builder(text: impl Into<String>) -> SynthesisRequestBuilder {
        SynthesisRequestBuilder {
            text: text.into(),
            voice: None,
            rate: None,
            volume: None,
            pitch: None,
            proxy: None,
        }
    }

    /// The input text, unescaped.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Full voice name as sent on the wire, for example
    /// `Microsoft Server Speech Text to Speech Voice (en-US, AriaNeural)`.
    pub fn voice(&self) -> &str {
        &self.voice
    }

    /// The short voice tag the request was built with, for example
    /// `en-US-AriaNeural`. Callers use this for cache naming.
    pub fn voice_lang_region(&self) -> &str {
        &self.voice_lang_region
    }

    pub fn rate(&self) -> &str {
        &self.rate
    }

    pub fn volume(&self) -> &str {
        &self.volume
    }

    pub fn pitch(&self) -> &str {
        &self.pitch
    }

    /// Proxy URL, if one was supplied. Stored for callers that dial through
    /// their own transport; the built-in dialer does not consult it.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}

/// Builder mirroring the service's optional parameters. Unset values fall
/// back to `+0%` rate and volume, `+0Hz` pitch and [`DEFAULT_VOICE`].
#[derive(Debug, Clone)]
pub struct SynthesisRequestBuilder {
    text: String,
    voice: Option<String>,
    rate: Option<String>,
    volume: Option<String>,
    pitch: Option<String>,
    proxy: Option<String>,
}

impl SynthesisRequestBuilder {
    /// Short voice tag like `en-US-AriaNeural`.
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Speaking rate as a signed percentage, like `-15%`.
    pub fn rate(mut self, rate: impl Into<String>) -> Self {
        self.rate = Some(rate.into());
        self
    }

    /// Volume as a signed percentage, like `+10%`.
    pub fn volume(mut self, volume: impl Into<String>) -> Self {
        self.volume = Some(volume.into());
        self
    }

    /// Baseline pitch shift, like `+20Hz`.
    pub fn pitch(mut self, pitch: impl Into<String>) -> Self {
        self.pitch = Some(pitch.into());
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Validates the parameters and freezes the request. Runs before any
    /// network activity.
    pub fn build(self) -> Result<SynthesisRequest, SpeechError> {
        let voice = self.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string());
        let rate = self.rate.unwrap_or_else(|| "+0%".to_string());
        let volume = self.volume.unwrap_or_else(|| "+0%".to_string());
        let pitch = self.pitch.unwrap_or_else(|| "+0Hz".to_string());

        let voice_re = Regex::new(VOICE_PATTERN).expect("voice pattern is valid");
        let captures = voice_re
            .captures(&voice)
            .ok_or_else(|| SpeechError::InvalidVoice(voice.clone()))?;
        let full_voice = format!(
            "Microsoft Server Speech Text to Speech Voice ({}-{}, {})",
            &captures[1], &captures[2], &captures[3]
        );

        let percentage_re = Regex::new(PERCENTAGE_PATTERN).expect("percentage pattern is valid");
        if !percentage_re.is_match(&rate) {
            return Err(SpeechError::InvalidRate(rate));
        }
        if !percentage_re.is_match(&volume) {
            return Err(SpeechError::InvalidVolume(volume));
        }

        Ok(SynthesisRequest {
            text: self.text,
            voice: full_voice,
            voice_lang_region: voice,
            rate,
            volume,
            pitch,
            proxy: self.proxy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters() {
        let request = SynthesisRequest::new("hello").unwrap();
        assert_eq!(request.rate(), "+0%");
        assert_eq!(request.volume(), "+0%");
        assert_eq!(request.pitch(), "+0Hz");
        assert_eq!(request.voice_lang_region(), DEFAULT_VOICE);
        assert!(request.proxy().is_none());
    }

    #[test]
    fn test_voice_is_rewritten_to_full_name() {
        let request = SynthesisRequest::builder("hi")
            .voice("en-US-AriaNeural")
            .build()
            .unwrap();
        assert_eq!(
            request.voice(),
            "Microsoft Server Speech Text to Speech Voice (en-US, AriaNeural)"
        );
        assert_eq!(request.voice_lang_region(), "en-US-AriaNeural");
    }

    #[test]
    fn test_invalid_voice_rejected() {
        let err = SynthesisRequest::builder("hi").voice("en_US_Aria").build();
        assert!(matches!(err, Err(SpeechError::InvalidVoice(_))));
    }

    #[test]
    fn test_hyphenated_voice_name_kept_whole() {
        let request = SynthesisRequest::builder("hi")
            .voice("zh-CN-liaoning-XiaobeiNeural")
            .build()
            .unwrap();
        assert!(request.voice().ends_with("(zh-CN, liaoning-XiaobeiNeural)"));
    }

    #[test]
    fn test_rate_validation() {
        assert!(SynthesisRequest::builder("hi").rate("+0%").build().is_ok());
        assert!(SynthesisRequest::builder("hi").rate("-15%").build().is_ok());
        assert!(matches!(
            SynthesisRequest::builder("hi").rate("fast").build(),
            Err(SpeechError::InvalidRate(_))
        ));
        assert!(matches!(
            SynthesisRequest::builder("hi").rate("+0").build(),
            Err(SpeechError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_volume_validation() {
        assert!(SynthesisRequest::builder("hi").volume("-50%").build().is_ok());
        assert!(matches!(
            SynthesisRequest::builder("hi").volume("loud").build(),
            Err(SpeechError::InvalidVolume(_))
        ));
    }
}
