use anyhow::{Context, Result, anyhow};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Message;
use crate::providers::http_errors::{model_api_request_error, model_api_status_error};

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Where a request is headed, for logging and error messages.
pub(crate) struct Target<'a> {
    pub provider: &'static str,
    pub api_url: &'a str,
    pub endpoint_var: &'a str,
    pub timeout_secs: Option<u64>,
}

pub(crate) fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage<'_>> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str(),
            content: &msg.content,
        })
        .collect()
}

pub(crate) fn chat_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn first_choice_content(parsed: ChatCompletionResponse) -> Result<String> {
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Model response contained no choices"))?;
    Ok(choice.message.content.unwrap_or_default())
}

/// Sends a prepared chat-completion request and returns the first choice's text.
pub(crate) async fn send(request: RequestBuilder, target: &Target<'_>) -> Result<String> {
    let response = request.send().await.map_err(|err| {
        debug!(
            provider = target.provider,
            api_url = %target.api_url,
            error = %err,
            "chat completion request failed"
        );
        model_api_request_error(err, target.api_url, target.endpoint_var, target.timeout_secs)
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        debug!(
            provider = target.provider,
            api_url = %target.api_url,
            status = %status,
            response_body_len = response_body.len(),
            "model API returned non-success status"
        );
        return Err(model_api_status_error(status, &response_body));
    }

    let parsed: ChatCompletionResponse = response
        .json()
        .await
        .context("Failed to parse model chat response")?;
    let content = first_choice_content(parsed)?;
    debug!(
        provider = target.provider,
        response_len = content.len(),
        "received chat completion response"
    );
    Ok(content)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ChatCompletionRequest, ChatCompletionResponse, chat_url, first_choice_content,
        to_chat_messages,
    };
    use crate::model::Message;

    #[test]
    fn chat_url_trims_trailing_slash() {
        assert_eq!(
            chat_url("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn request_omits_unset_fields() {
        let messages = vec![Message::system("sys"), Message::user("line one\nline two\n")];
        let body = ChatCompletionRequest {
            model: None,
            messages: to_chat_messages(&messages),
            max_tokens: Some(4000),
        };

        let value = serde_json::to_value(&body).expect("request should serialize");
        assert_eq!(
            value,
            json!({
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "line one\nline two\n" }
                ],
                "max_tokens": 4000
            })
        );
    }

    #[test]
    fn first_choice_content_takes_first_choice() {
        let parsed: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-test",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "first" } },
                { "index": 1, "message": { "role": "assistant", "content": "second" } }
            ]
        }))
        .expect("response should parse");
        assert_eq!(first_choice_content(parsed).expect("content"), "first");
    }

    #[test]
    fn first_choice_content_treats_null_content_as_empty() {
        let parsed: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [ { "message": { "role": "assistant", "content": null } } ]
        }))
        .expect("response should parse");
        assert_eq!(first_choice_content(parsed).expect("content"), "");
    }

    #[test]
    fn first_choice_content_rejects_empty_choices() {
        let parsed: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).expect("response should parse");
        let err = first_choice_content(parsed).expect_err("empty choices should fail");
        assert!(err.to_string().contains("no choices"));
    }
}
