use anyhow::{Result, bail};
use std::env;

use crate::selector::SizeVariant;

pub const LARGE_ENDPOINT_VAR: &str = "AZURE_API_ENDPOINT_405B";
pub const LARGE_KEY_VAR: &str = "AZURE_API_KEY_405B";
pub const SMALL_ENDPOINT_VAR: &str = "AZURE_API_ENDPOINT_70B";
pub const SMALL_KEY_VAR: &str = "AZURE_API_KEY_70B";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_GATEWAY_MAX_TOKENS: u32 = 4000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoint {
    pub endpoint: String,
    pub api_key: String,
    /// Variable the endpoint was read from, quoted back in connection errors.
    pub endpoint_var: &'static str,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gateway_large: GatewayEndpoint,
    pub gateway_small: GatewayEndpoint,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub gateway_max_tokens: u32,
    pub model_timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        let gateway_large = read_gateway(&mut get_var, SizeVariant::Large)?;
        let gateway_small = read_gateway(&mut get_var, SizeVariant::Small)?;

        let Some(openai_api_key) = non_blank(get_var(OPENAI_KEY_VAR)) else {
            bail!("Please set the '{OPENAI_KEY_VAR}' environment variable for the OpenAI models.");
        };

        let openai_base_url = non_blank(get_var(OPENAI_BASE_URL_VAR))
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        let gateway_max_tokens = parse_gateway_max_tokens(get_var("GATEWAY_MAX_TOKENS").as_deref());
        let model_timeout_secs = parse_model_timeout_secs(get_var("MODEL_TIMEOUT_SECS").as_deref());

        Ok(Self {
            gateway_large,
            gateway_small,
            openai_api_key,
            openai_base_url,
            gateway_max_tokens,
            model_timeout_secs,
        })
    }

    pub fn gateway(&self, size: SizeVariant) -> &GatewayEndpoint {
        match size {
            SizeVariant::Large => &self.gateway_large,
            SizeVariant::Small => &self.gateway_small,
        }
    }
}

fn gateway_vars(size: SizeVariant) -> (&'static str, &'static str) {
    match size {
        SizeVariant::Large => (LARGE_ENDPOINT_VAR, LARGE_KEY_VAR),
        SizeVariant::Small => (SMALL_ENDPOINT_VAR, SMALL_KEY_VAR),
    }
}

fn read_gateway(
    get_var: &mut impl FnMut(&str) -> Option<String>,
    size: SizeVariant,
) -> Result<GatewayEndpoint> {
    let (endpoint_var, key_var) = gateway_vars(size);
    let endpoint = non_blank(get_var(endpoint_var));
    let api_key = non_blank(get_var(key_var));

    match (endpoint, api_key) {
        (Some(endpoint), Some(api_key)) => Ok(GatewayEndpoint {
            endpoint,
            api_key,
            endpoint_var,
        }),
        _ => bail!(
            "Please set '{}' and '{}' environment variables for the {} model.",
            endpoint_var,
            key_var,
            size.label()
        ),
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive_u64(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

fn parse_gateway_max_tokens(raw: Option<&str>) -> u32 {
    parse_positive_u64(raw)
        .and_then(|value| u32::try_from(value).ok())
        .unwrap_or(DEFAULT_GATEWAY_MAX_TOKENS)
}

fn parse_model_timeout_secs(raw: Option<&str>) -> Option<u64> {
    parse_positive_u64(raw)
}
