use anyhow::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::GatewayEndpoint;
use crate::model::Message;
use crate::providers::chat_completions::{self, ChatCompletionRequest, Target};

const API_VERSION: &str = "2024-05-01-preview";

fn completions_url(endpoint: &str) -> String {
    format!(
        "{}?api-version={}",
        chat_completions::chat_url(endpoint),
        API_VERSION
    )
}

pub async fn chat(
    client: &Client,
    endpoint: &GatewayEndpoint,
    messages: &[Message],
    max_tokens: u32,
    timeout_secs: Option<u64>,
) -> Result<String> {
    let api_url = completions_url(&endpoint.endpoint);
    let body = ChatCompletionRequest {
        model: None,
        messages: chat_completions::to_chat_messages(messages),
        max_tokens: Some(max_tokens),
    };
    debug!(
        api_url = %api_url,
        max_tokens,
        message_count = messages.len(),
        "sending azure inference chat request"
    );

    let mut request = client
        .post(&api_url)
        .bearer_auth(&endpoint.api_key)
        .header("api-key", &endpoint.api_key)
        .json(&body);
    if let Some(secs) = timeout_secs {
        request = request.timeout(Duration::from_secs(secs));
    }

    let target = Target {
        provider: "azure",
        api_url: &api_url,
        endpoint_var: endpoint.endpoint_var,
        timeout_secs,
    };
    chat_completions::send(request, &target).await
}
