use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::AiReply;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

/// Client for a locally hosted Ollama server. Covers both plain text
/// completion and image captioning via the `/api/generate` endpoint.
pub struct OllamaClient {
    http: Client,
    url: String,
    model: String,
    caption_model: String,
}

impl OllamaClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: Client::new(),
            url: config.ollama_url.clone(),
            model: config.ollama_model.clone(),
            caption_model: config.caption_model.clone(),
        }
    }

    /// One blocking completion round trip. The prompt is sent raw; the
    /// caller decides what context to pack into it.
    pub async fn complete(&self, prompt: &str) -> Result<AiReply, String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            images: None,
            stream: false,
        };
        self.generate(&self.model, request).await
    }

    /// Asks the caption model to describe a base64-encoded image.
    pub async fn caption(&self, image_b64: &str, instruction: &str) -> Result<AiReply, String> {
        let request = GenerateRequest {
            model: self.caption_model.clone(),
            prompt: instruction.to_string(),
            images: Some(vec![image_b64.to_string()]),
            stream: false,
        };
        self.generate(&self.caption_model, request).await
    }

    async fn generate(&self, model: &str, request: GenerateRequest) -> Result<AiReply, String> {
        let url = format!("{}/api/generate", self.url);

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Ollama request failed: {}. Is Ollama running?", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Ollama API error ({}): {}", status, body));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Ollama response: {}", e))?;

        let content = body
            .response
            .unwrap_or_else(|| "No response from Ollama".to_string());

        Ok(AiReply {
            content,
            model: model.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }
}
