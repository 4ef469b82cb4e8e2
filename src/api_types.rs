use serde::{Deserialize, Serialize};

/// Request body of a LibreTranslate-compatible `/translate` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiTranslateRequest<'a> {
    pub q: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTranslateResponse {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
