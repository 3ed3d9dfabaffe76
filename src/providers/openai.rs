use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::{Config, OPENAI_BASE_URL_VAR};
use crate::model::Message;
use crate::providers::chat_completions::{self, ChatCompletionRequest, Target};

pub async fn chat(client: &Client, cfg: &Config, model: &str, messages: &[Message]) -> Result<String> {
    let api_url = chat_completions::chat_url(&cfg.openai_base_url);
    let body = ChatCompletionRequest {
        model: Some(model),
        messages: chat_completions::to_chat_messages(messages),
        max_tokens: None,
    };
    debug!(
        api_url = %api_url,
        model = %model,
        message_count = messages.len(),
        "sending openai chat request"
    );

    let mut request = client
        .post(&api_url)
        .bearer_auth(&cfg.openai_api_key)
        .json(&body);
    if let Some(secs) = cfg.model_timeout_secs {
        request = request.timeout(Duration::from_secs(secs));
    }

    let target = Target {
        provider: "openai",
        api_url: &api_url,
        endpoint_var: OPENAI_BASE_URL_VAR,
        timeout_secs: cfg.model_timeout_secs,
    };
    chat_completions::send(request, &target).await
}
