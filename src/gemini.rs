use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};

const MAX_TITLES: usize = 10;

#[async_trait]
pub trait QueryRouter: Send + Sync {
    async fn suggest_titles(&self, query: &str) -> Result<Vec<String>>;
}

#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    api_base: String,
    model: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, client: Client) -> Self {
        Self::with_base_url(
            api_key,
            model,
            client,
            "https://generativelanguage.googleapis.com".to_string(),
        )
    }

    pub fn with_base_url(api_key: String, model: String, client: Client, api_base: String) -> Self {
        Self {
            api_key,
            api_base,
            model,
            client,
        }
    }
}

fn build_prompt(query: &str) -> String {
    format!(
        "You recommend movies. Reply with a JSON array of at most {MAX_TITLES} movie titles \
         (strings only, original release titles, no commentary) that best match this request: {query}"
    )
}

#[async_trait]
impl QueryRouter for GeminiClient {
    async fn suggest_titles(&self, query: &str) -> Result<Vec<String>> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(query) }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::UpstreamStatus {
                service: "gemini",
                status: response.status().as_u16(),
            });
        }

        let data: GenerateResponse = response.json().await?;
        let text: String = data
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .ok_or_else(|| Error::InvalidResponse("gemini returned no candidates".to_string()))?;

        let titles = parse_titles(&text)?;
        tracing::debug!(query, titles = titles.len(), "gemini suggested titles");
        Ok(titles)
    }
}

fn parse_titles(text: &str) -> Result<Vec<String>> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let titles: Vec<String> = serde_json::from_str(unfenced)
        .map_err(|e| Error::InvalidResponse(format!("expected a JSON array of titles: {}", e)))?;

    let mut titles: Vec<String> = titles
        .into_iter()
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty())
        .collect();
    titles.truncate(MAX_TITLES);
    Ok(titles)
}
