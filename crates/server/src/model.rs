use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Hosted language model that turns a prompt into reading text.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, input: &str) -> Result<String>;
}

/// Client for an OpenAI-style Responses API.
pub struct ResponsesApiModel {
    http: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ResponsesBody {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl ResponsesApiModel {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            http: Client::new(),
            endpoint: format!("{}/responses", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            max_output_tokens,
        }
    }
}

#[async_trait]
impl CompletionModel for ResponsesApiModel {
    async fn complete(&self, input: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ResponsesRequest {
                model: &self.model,
                input,
                max_output_tokens: self.max_output_tokens,
            })
            .send()
            .await
            .context("completion request could not be sent")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("completion endpoint returned {status}: {body}");
        }

        let body: ResponsesBody = response
            .json()
            .await
            .context("completion response was not valid JSON")?;
        Ok(collect_message_text(&body))
    }
}

fn collect_message_text(body: &ResponsesBody) -> String {
    body.output
        .iter()
        .filter(|item| item.kind == "message")
        .flat_map(|item| item.content.iter())
        .filter_map(|part| part.text.as_deref())
        .collect::<String>()
        .trim()
        .to_string()
}
