//! OpenAI-compatible chat completions backend.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::prompt::{build_consultation_prompt, SYSTEM_PROMPT};
use super::Advisor;
use crate::config::AdvisorConfig;
use crate::db::QuestionContext;
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Advisor that POSTs to `{base_url}/chat/completions`
pub struct ChatCompletionAdvisor {
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_words: u32,
    http_client: reqwest::Client,
}

impl ChatCompletionAdvisor {
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("advisor.base_url is empty".into()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Advisor(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            max_words: config.max_words,
            http_client,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|_| Error::Config("invalid advisor API key format".into()))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .http_client
            .post(&url)
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Advisor(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Advisor(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(Error::Advisor(format!("HTTP {}: {}", status.as_u16(), message)));
        }

        extract_content(&body)
    }
}

fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| Error::Advisor(format!("failed to parse response: {}", e)))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| Error::Advisor("response has no choices".into()))?;
    if content.trim().is_empty() {
        return Err(Error::Advisor("response content is empty".into()));
    }
    Ok(content)
}

fn message(role: &str, content: impl Into<String>) -> ChatMessage {
    ChatMessage {
        role: role.to_string(),
        content: content.into(),
    }
}

#[async_trait]
impl Advisor for ChatCompletionAdvisor {
    fn name(&self) -> &str {
        &self.model
    }

    async fn advise(&self, query: &str, context: &QuestionContext) -> Result<String> {
        let prompt = build_consultation_prompt(query, context, self.max_words);
        debug!(model = %self.model, query_len = query.len(), "sending consultation request");
        let reply = self
            .complete(vec![message("system", SYSTEM_PROMPT), message("user", prompt)])
            .await?;
        info!(model = %self.model, "advisor answered consultation");
        Ok(reply)
    }

    async fn ping(&self) -> Result<String> {
        self.complete(vec![message("user", "Hello! Answer briefly.")])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Choose A"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "Choose A");

        assert!(extract_content(r#"{"choices":[]}"#).is_err());
        assert!(extract_content(r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#).is_err());
        assert!(extract_content("not json").is_err());
    }

    #[test]
    fn test_from_config_normalizes_url() {
        let config = AdvisorConfig {
            base_url: "http://localhost:9/v1/".into(),
            api_key: Some(String::new()),
            ..Default::default()
        };
        let advisor = ChatCompletionAdvisor::from_config(&config).unwrap();
        assert_eq!(advisor.base_url, "http://localhost:9/v1");
        assert!(advisor.api_key.is_none());
        assert_eq!(advisor.name(), "GigaChat");
        assert!(!advisor.headers().unwrap().contains_key(AUTHORIZATION));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_an_error() {
        let config = AdvisorConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..Default::default()
        };
        let advisor = ChatCompletionAdvisor::from_config(&config).unwrap();
        let err = advisor.advise("q", &QuestionContext::default()).await.unwrap_err();
        assert!(matches!(err, Error::Advisor(_)));
    }
}
