use std::time::Duration;

use anyhow::{bail, Context};
use log::info;
use serde_json::{json, Value};
use tokio::runtime::Runtime;

use super::{post_json, ImagePayload};
use crate::config::GrokConfig;

const IMAGES_URL: &str = "https://api.x.ai/v1/images/generations";

/// Single step generation, the image model writes its own caption
pub struct Grok {
    rt: Runtime,
    http: reqwest::Client,
    api_key: String,
    model: String,
    aspect_ratio: String,
    resolution: String,
    style: String,
}

impl Grok {
    pub fn new(config: &GrokConfig, style: &str) -> anyhow::Result<Self> {
        let Some(api_key) = config.api_key.clone() else {
            bail!("xAI api key is not set");
        };
        let rt = Runtime::new().context("Failed to create async runtime")?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build http client")?;
        Ok(Self {
            rt,
            http,
            api_key,
            model: config.image_model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
            resolution: config.resolution.clone(),
            style: style.to_string(),
        })
    }

    pub fn generate(&self) -> anyhow::Result<Vec<u8>> {
        self.rt
            .block_on(self.do_generate())
            .context("Failed to generate meme image (Grok)")
    }

    async fn do_generate(&self) -> anyhow::Result<Vec<u8>> {
        info!("Generating coffee meme image (Grok)...");
        let body = self.request_body();
        let response = post_json(&self.http, IMAGES_URL, &self.api_key, &body).await?;
        ImagePayload::try_from(&response)?
            .into_bytes(&self.http)
            .await
    }

    fn request_body(&self) -> Value {
        json!({
            "model": self.model,
            "prompt": prompt(&self.style),
            "n": 1,
            "aspect_ratio": self.aspect_ratio,
            "resolution": self.resolution,
            "response_format": "b64_json",
        })
    }
}

fn prompt(style: &str) -> String {
    format!(
        "Create a funny, relatable coffee meme. \
         Style: {style}, like something you would see on Facebook or Twitter. \
         The image should be a complete meme with visible text/caption."
    )
}
