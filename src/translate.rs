use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ApiErrorResponse, ApiTranslateRequest, ApiTranslateResponse};
use crate::config::TranslateConfig;

/// Machine translation collaborator. Failures are reported, never retried.
#[async_trait]
pub trait Translator {
    async fn translate(&self, text: &str, source: &str) -> Result<String>;
}

/// Talks to a LibreTranslate-compatible HTTP endpoint.
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    target: String,
}

impl HttpTranslator {
    pub fn new(client: Client, cfg: &TranslateConfig, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: cfg.api_key.clone(),
            target: cfg.target.clone(),
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, source: &str) -> Result<String> {
        let start = std::time::Instant::now();
        debug!("Translation request - source={}, chars={}", source, text.len());

        let body = ApiTranslateRequest {
            q: text,
            source,
            target: &self.target,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Request failed for {}", self.endpoint))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp
                .json::<ApiErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| "no error body".to_string());
            bail!("translation endpoint returned {}: {}", status, detail);
        }

        let parsed: ApiTranslateResponse = resp
            .json()
            .await
            .with_context(|| format!("Decoding JSON for {}", self.endpoint))?;

        info!(
            "Translation completed - duration={:.2}s, response_length={} chars",
            start.elapsed().as_secs_f32(),
            parsed.translated_text.len()
        );
        Ok(parsed.translated_text)
    }
}

/// Used when no endpoint is configured: every call fails so the caller's fallback applies.
pub struct DisabledTranslator;

#[async_trait]
impl Translator for DisabledTranslator {
    async fn translate(&self, _text: &str, source: &str) -> Result<String> {
        Err(anyhow!("no translation endpoint configured (source={source})"))
    }
}

/// Pick the translator implied by the config.
pub fn from_config(client: Client, cfg: &TranslateConfig) -> Box<dyn Translator + Send + Sync> {
    match cfg.endpoint.as_deref() {
        Some(endpoint) => Box::new(HttpTranslator::new(client, cfg, endpoint)),
        None => Box::new(DisabledTranslator),
    }
}
