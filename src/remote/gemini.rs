//! Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CodeContext, ReasoningClient, prompt};
use crate::config::RemoteConfig;
use crate::tools::executor::strip_code_fences;
use crate::{Error, Result};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()
            .map(|p| p.text)
    }
}

/// Google Gemini REST client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    code_max_tokens: u32,
    code_temperature: f32,
}

impl GeminiClient {
    /// Create a client from remote configuration
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("Gemini API key required".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            code_max_tokens: config.code_max_tokens,
            code_temperature: config.code_temperature,
        })
    }

    /// Send one prompt; `Ok(None)` when the model returned no text
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<Option<String>> {
        tracing::debug!(
            prompt_chars = prompt.len(),
            max_tokens,
            temperature,
            "sending Gemini request"
        );

        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Gemini request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Remote(format!("Gemini API error {status}: {body}")));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Gemini response");
            Error::Remote(format!("malformed response: {e}"))
        })?;

        let text = parsed
            .into_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        tracing::debug!(
            reply_chars = text.as_ref().map_or(0, String::len),
            "Gemini reply received"
        );
        Ok(text)
    }

    async fn generate_text(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        self.generate(prompt, max_tokens, temperature)
            .await?
            .ok_or_else(|| Error::Remote("response had no text".to_string()))
    }
}

#[async_trait]
impl ReasoningClient for GeminiClient {
    async fn complete_intent(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        self.generate_text(prompt, max_tokens, temperature).await
    }

    async fn generate_code(&self, command: &str, context: &CodeContext) -> Result<Option<String>> {
        let prompt = prompt::code_prompt(command, context);
        let reply = self
            .generate(&prompt, self.code_max_tokens, self.code_temperature)
            .await?;

        Ok(reply
            .map(|text| strip_code_fences(&text).trim().to_string())
            .filter(|code| !code.is_empty()))
    }

    async fn complete_chat(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        self.generate_text(prompt, max_tokens, temperature).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_api_key() {
        let config = RemoteConfig::default();
        assert!(matches!(GeminiClient::new(&config), Err(Error::Config(_))));
    }

    #[test]
    fn endpoint_includes_model() {
        let config = RemoteConfig {
            api_key: Some("k".to_string()),
            base_url: "http://localhost:9/".to_string(),
            model: "gemini-test".to_string(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint,
            "http://localhost:9/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn request_body_shape() {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 100,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn response_text_extraction() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"hello"}],"role":"model"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("hello"));

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_text().is_none());
    }
}
