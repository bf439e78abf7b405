//! ElevenLabs speech synthesis.

use lecture_core::{Error, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

/// Voice used when none is configured.
pub const DEFAULT_VOICE_ID: &str = "nPczCjzI2devNBz1zQrb";

/// Synthesis model used when none is configured.
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

const ELEVENLABS_ENDPOINT: &str = "https://api.elevenlabs.io";
const SERVICE: &str = "ElevenLabs";

/// Turns narration text into encoded audio bytes.
pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// File extension (without dot) of the audio this synthesizer returns.
    fn extension(&self) -> &str {
        "mp3"
    }
}

/// Client for the ElevenLabs text-to-speech REST endpoint.
pub struct ElevenLabsClient {
    http: Client,
    api_key: String,
    voice_id: String,
    model_id: String,
    endpoint: String,
}

impl ElevenLabsClient {
    /// Create a client for the default voice and model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| http_error(e.to_string()))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_ELEVENLABS_MODEL.to_string(),
            endpoint: ELEVENLABS_ENDPOINT.to_string(),
        })
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Send requests to a different base URL (proxies, local mocks).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/v1/text-to-speech/{}", self.endpoint, self.voice_id)
    }
}

impl SpeechSynthesizer for ElevenLabsClient {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            text,
            model_id: &self.model_id,
        };

        let response = self
            .http
            .post(self.url())
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&request)
            .send()
            .map_err(|e| http_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(http_error(format!("{}: {}", status, body.trim())));
        }

        let audio = response.bytes().map_err(|e| http_error(e.to_string()))?;
        if audio.is_empty() {
            return Err(http_error("response contained no audio".to_string()));
        }

        Ok(audio.to_vec())
    }
}

fn http_error(message: String) -> Error {
    Error::HttpError {
        service: SERVICE,
        message,
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}
