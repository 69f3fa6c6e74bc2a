use reqwest::Client;
use serde::Deserialize;

use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Speech-to-text failures, kept distinct so the presentation layer can
/// report each differently. None of these are retried.
#[derive(Debug)]
pub enum SttError {
    /// The service returned no recognizable speech.
    NoSpeech,
    /// The transcription request itself failed (transport or API error).
    Request(String),
    /// Anything else: missing configuration, unparseable response.
    Other(String),
}

impl std::fmt::Display for SttError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SttError::NoSpeech => write!(f, "Could not understand the audio"),
            SttError::Request(detail) => write!(f, "Could not request results; {}", detail),
            SttError::Other(detail) => write!(f, "Speech recognition error: {}", detail),
        }
    }
}

impl std::error::Error for SttError {}

/// Client for the OpenAI Whisper transcription API.
pub struct WhisperClient {
    http: Client,
    api_key: String,
}

impl WhisperClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: config.openai_api_key.clone(),
        }
    }

    /// Transcribe captured WAV audio. An empty transcription maps to
    /// `SttError::NoSpeech` rather than an empty string.
    pub async fn transcribe(&self, audio_wav: Vec<u8>) -> Result<String, SttError> {
        if self.api_key.is_empty() {
            return Err(SttError::Other("OpenAI API key not configured".to_string()));
        }

        let part = reqwest::multipart::Part::bytes(audio_wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| SttError::Other(format!("MIME error: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .text("model", "whisper-1")
            .text("language", "en")
            .text("response_format", "json")
            .part("file", part);

        let response = self
            .http
            .post("https://api.openai.com/v1/audio/transcriptions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SttError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SttError::Request(format!("Whisper API error ({}): {}", status, body)));
        }

        let result: WhisperResponse = response
            .json()
            .await
            .map_err(|e| SttError::Other(format!("Failed to parse Whisper response: {}", e)))?;

        let text = result.text.trim().to_string();
        if text.is_empty() {
            return Err(SttError::NoSpeech);
        }
        Ok(text)
    }
}
