mod grok;
mod openai;

pub use grok::Grok;
pub use openai::OpenAi;

use anyhow::{bail, Context};
use base64::{engine::general_purpose::STANDARD, Engine};
use log::info;
use serde_json::Value;

use crate::config::{Config, Provider};

/// Creates the raw meme image using the configured provider
pub enum Generator {
    OpenAi(OpenAi),
    Grok(Grok),
}

impl Generator {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(match config.provider {
            Provider::OpenAi => Self::OpenAi(OpenAi::new(&config.openai, &config.meme_style)?),
            Provider::Grok => Self::Grok(Grok::new(&config.grok, &config.meme_style)?),
        })
    }

    pub fn generate(&self) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::OpenAi(client) => client.generate(),
            Self::Grok(client) => client.generate(),
        }
    }
}

/// Where an image generation response put the picture
#[derive(Debug, PartialEq, Eq)]
enum ImagePayload {
    Inline(Vec<u8>),
    Url(String),
}

impl TryFrom<&Value> for ImagePayload {
    type Error = anyhow::Error;

    /// Reads the first item of an `images/generations` style response
    fn try_from(response: &Value) -> anyhow::Result<Self> {
        let Some(item) = response.pointer("/data/0") else {
            bail!("Image response contained no data items: {response}");
        };
        if let Some(b64) = item.get("b64_json").and_then(Value::as_str) {
            let bytes = STANDARD
                .decode(b64)
                .context("Image response b64_json was not valid base64")?;
            return Ok(Self::Inline(bytes));
        }
        if let Some(url) = item.get("url").and_then(Value::as_str) {
            return Ok(Self::Url(url.to_string()));
        }
        bail!("Image response had no b64_json or url")
    }
}

impl ImagePayload {
    async fn into_bytes(self, http: &reqwest::Client) -> anyhow::Result<Vec<u8>> {
        match self {
            Self::Inline(bytes) => {
                info!("Image generated (base64), size: {} bytes", bytes.len());
                Ok(bytes)
            }
            Self::Url(url) => {
                info!("Image generated at: {url}");
                let bytes = http
                    .get(&url)
                    .send()
                    .await
                    .and_then(|resp| resp.error_for_status())
                    .with_context(|| format!("Failed to download image from {url}"))?
                    .bytes()
                    .await
                    .context("Failed to read downloaded image")?;
                info!("Downloaded image, size: {} bytes", bytes.len());
                Ok(bytes.to_vec())
            }
        }
    }
}

/// Sends a JSON POST and returns the JSON body, failing on non success status
async fn post_json(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &Value,
) -> anyhow::Result<Value> {
    let resp = http
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await
        .with_context(|| format!("Request to {url} failed"))?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        bail!(
            "{url} returned {status}: {}",
            text.chars().take(200).collect::<String>()
        );
    }
    resp.json()
        .await
        .with_context(|| format!("Failed to parse JSON response from {url}"))
}
