use reqwest::Client;
use std::fmt;
use std::io::{self, Write};

use crate::config::Config;
use crate::model_gateway::{AzureGateway, ModelGateway, OpenAiGateway};

/// Distinguishes the two self-hosted gateway deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeVariant {
    Large,
    Small,
}

impl SizeVariant {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Large => "405B",
            Self::Small => "70B",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiModel {
    O1Preview,
    O1Mini,
    Gpt4o,
    Gpt35Turbo,
}

impl OpenAiModel {
    pub fn id(&self) -> &'static str {
        match self {
            Self::O1Preview => "o1-preview-2024-09-12",
            Self::O1Mini => "o1-mini-2024-09-12",
            Self::Gpt4o => "gpt-4o-2024-08-06",
            Self::Gpt35Turbo => "gpt-3.5-turbo-0125",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFamily {
    Azure,
    OpenAi,
}

impl BackendFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Azure => "Azure",
            Self::OpenAi => "OpenAI",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    Gateway(SizeVariant),
    OpenAi(OpenAiModel),
}

impl ModelChoice {
    pub fn family(&self) -> BackendFamily {
        match self {
            Self::Gateway(_) => BackendFamily::Azure,
            Self::OpenAi(_) => BackendFamily::OpenAi,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Gateway(size) => size.label(),
            Self::OpenAi(model) => model.id(),
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} model ({})", self.label(), self.family().as_str())
    }
}

const MENU: [(&str, ModelChoice); 6] = [
    ("70B Model", ModelChoice::Gateway(SizeVariant::Small)),
    ("405B Model", ModelChoice::Gateway(SizeVariant::Large)),
    (
        "o1-preview-2024-09-12",
        ModelChoice::OpenAi(OpenAiModel::O1Preview),
    ),
    ("o1-mini-2024-09-12", ModelChoice::OpenAi(OpenAiModel::O1Mini)),
    (
        "gpt-4o-2024-08-06  (supports structured response e.g. JSON)",
        ModelChoice::OpenAi(OpenAiModel::Gpt4o),
    ),
    (
        "gpt-3.5-turbo-0125",
        ModelChoice::OpenAi(OpenAiModel::Gpt35Turbo),
    ),
];

pub fn write_menu(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Please select a model:")?;
    for (idx, (label, _)) in MENU.iter().enumerate() {
        writeln!(out, "{}) {}", idx + 1, label)?;
    }
    write!(out, "Enter your choice (1-{}): ", MENU.len())?;
    out.flush()
}

pub fn parse_choice(input: &str) -> Option<ModelChoice> {
    let index = input.trim().parse::<usize>().ok()?;
    MENU.get(index.checked_sub(1)?).map(|(_, choice)| *choice)
}

/// Builds the backend for a menu choice. No network I/O happens here.
pub fn connect<'a>(
    choice: ModelChoice,
    client: &'a Client,
    cfg: &'a Config,
) -> Box<dyn ModelGateway + 'a> {
    match choice {
        ModelChoice::Gateway(size) => Box::new(AzureGateway::new(client, cfg, size)),
        ModelChoice::OpenAi(model) => Box::new(OpenAiGateway::new(client, cfg, model)),
    }
}
