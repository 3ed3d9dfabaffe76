use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

use crate::config::{Config, GatewayEndpoint};
use crate::model::Message;
use crate::providers;
use crate::selector::{BackendFamily, OpenAiModel, SizeVariant};

pub struct ModelGatewayRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGatewayResponse {
    pub content: String,
}

pub type ModelGatewayFuture<'a> = Pin<Box<dyn Future<Output = Result<ModelGatewayResponse>> + 'a>>;

pub trait ModelGateway {
    /// Backend name used in user-facing status lines.
    fn name(&self) -> &str;

    fn chat<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a>;
}

impl<G: ModelGateway + ?Sized> ModelGateway for &G {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn chat<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a> {
        (**self).chat(request)
    }
}

impl<G: ModelGateway + ?Sized> ModelGateway for Box<G> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn chat<'a>(&'a self, request: ModelGatewayRequest) -> ModelGatewayFuture<'a> {
        (**self).chat(request)
    }
}

/// Self-hosted model behind the Azure AI inference gateway.
pub struct AzureGateway<'a> {
    client: &'a Client,
    endpoint: &'a GatewayEndpoint,
    size: SizeVariant,
    max_tokens: u32,
    timeout_secs: Option<u64>,
}

impl<'a> AzureGateway<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config, size: SizeVariant) -> Self {
        Self {
            client,
            endpoint: cfg.gateway(size),
            size,
            max_tokens: cfg.gateway_max_tokens,
            timeout_secs: cfg.model_timeout_secs,
        }
    }
}

impl ModelGateway for AzureGateway<'_> {
    fn name(&self) -> &str {
        BackendFamily::Azure.as_str()
    }

    fn chat<'b>(&'b self, request: ModelGatewayRequest) -> ModelGatewayFuture<'b> {
        Box::pin(async move {
            debug!(
                provider = "azure",
                size = self.size.label(),
                message_count = request.messages.len(),
                "dispatching model chat request"
            );
            let content = providers::azure::chat(
                self.client,
                self.endpoint,
                &request.messages,
                self.max_tokens,
                self.timeout_secs,
            )
            .await?;
            Ok(ModelGatewayResponse { content })
        })
    }
}

pub struct OpenAiGateway<'a> {
    client: &'a Client,
    cfg: &'a Config,
    model: OpenAiModel,
}

impl<'a> OpenAiGateway<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config, model: OpenAiModel) -> Self {
        Self { client, cfg, model }
    }
}

impl ModelGateway for OpenAiGateway<'_> {
    fn name(&self) -> &str {
        BackendFamily::OpenAi.as_str()
    }

    fn chat<'b>(&'b self, request: ModelGatewayRequest) -> ModelGatewayFuture<'b> {
        Box::pin(async move {
            debug!(
                provider = "openai",
                model = self.model.id(),
                message_count = request.messages.len(),
                "dispatching model chat request"
            );
            let content =
                providers::openai::chat(self.client, self.cfg, self.model.id(), &request.messages)
                    .await?;
            Ok(ModelGatewayResponse { content })
        })
    }
}
