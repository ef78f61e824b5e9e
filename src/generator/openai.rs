use std::time::Duration;

use anyhow::{bail, Context};
use log::{info, warn};
use serde_json::{json, Value};
use tokio::runtime::Runtime;

use super::{post_json, ImagePayload};
use crate::{
    config::OpenAiConfig,
    utils::{make_single_line, strip_quotes},
};

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const IMAGES_URL: &str = "https://api.openai.com/v1/images/generations";

/// gpt-image models only return base64, DALL-E models may return a url
const GPT_IMAGE_MODELS: [&str; 2] = ["gpt-image-1", "gpt-image-1-mini"];

const CAPTION_SYSTEM_PROMPT: &str = "You write short, funny captions for coffee memes. \
    Reply with ONLY the caption text, no quotes, no explanation, no prefix. \
    Keep it to one or two short lines, relatable and suitable for a meme image.";

/// Caption first with a chat model, then an image showing that caption
pub struct OpenAi {
    rt: Runtime,
    http: reqwest::Client,
    api_key: String,
    text_model: String,
    image_model: String,
    image_size: String,
    image_quality: String,
    style: String,
}

impl OpenAi {
    pub fn new(config: &OpenAiConfig, style: &str) -> anyhow::Result<Self> {
        let Some(api_key) = config.api_key.clone() else {
            bail!("OpenAI api key is not set");
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
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
            image_quality: config.image_quality.clone(),
            style: style.to_string(),
        })
    }

    pub fn generate(&self) -> anyhow::Result<Vec<u8>> {
        let caption = self
            .rt
            .block_on(self.generate_caption())
            .context("Failed to generate meme text")?;
        info!("Meme text: {:?}", make_single_line(&caption));
        self.rt
            .block_on(self.generate_image(&caption))
            .context("Failed to generate meme image")
    }

    async fn generate_caption(&self) -> anyhow::Result<String> {
        info!("Generating meme text...");
        let body = caption_request(&self.text_model, &self.style);
        let response = post_json(&self.http, CHAT_URL, &self.api_key, &body).await?;
        let raw = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(strip_quotes(raw).to_string())
    }

    async fn generate_image(&self, caption: &str) -> anyhow::Result<Vec<u8>> {
        info!("Generating coffee meme image with caption...");
        let (size, quality) =
            image_options(&self.image_model, &self.image_size, &self.image_quality);
        let body = json!({
            "model": self.image_model,
            "prompt": image_prompt(caption),
            "size": size,
            "quality": quality,
            "n": 1,
        });
        let response = post_json(&self.http, IMAGES_URL, &self.api_key, &body).await?;
        ImagePayload::try_from(&response)?
            .into_bytes(&self.http)
            .await
    }
}

fn caption_request(model: &str, style: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": CAPTION_SYSTEM_PROMPT},
            {"role": "user", "content": format!("Write a {style} coffee meme caption.")},
        ],
        "max_tokens": 100,
    })
}

fn image_prompt(caption: &str) -> String {
    format!(
        "Create a funny, relatable coffee meme image. \
         The image MUST display this exact text clearly and legibly, in large readable text: \
         \"{caption}\". \
         Style: realistic, like something you would see on Facebook or Instagram. \
         Make the text the main focus of the meme."
    )
}

/// Size and quality the chosen model accepts, falling back when the configured ones are not
fn image_options<'a>(model: &str, size: &'a str, quality: &'a str) -> (&'a str, &'a str) {
    let is_gpt_image = GPT_IMAGE_MODELS.contains(&model.to_lowercase().as_str());
    if is_gpt_image {
        let size = match size {
            "1024x1024" | "1536x1024" | "1024x1536" | "auto" => size,
            _ => "1024x1024",
        };
        let quality = match quality {
            "high" | "medium" | "low" | "auto" => quality,
            "hd" => "high",
            _ => "medium",
        };
        (size, quality)
    } else {
        let size = match size {
            "1024x1024" | "1792x1024" | "1024x1792" => size,
            _ => {
                warn!("Invalid image size {size:?} for {model}, using default: 1024x1024");
                "1024x1024"
            }
        };
        (size, quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("gpt-image-1", "1536x1024", "low", ("1536x1024", "low"))]
    #[case("gpt-image-1", "1792x1024", "hd", ("1024x1024", "high"))]
    #[case("GPT-Image-1-Mini", "auto", "standard", ("auto", "medium"))]
    #[case("dall-e-3", "1792x1024", "hd", ("1792x1024", "hd"))]
    #[case("dall-e-3", "1536x1024", "standard", ("1024x1024", "standard"))]
    fn options_per_model(
        #[case] model: &str,
        #[case] size: &str,
        #[case] quality: &str,
        #[case] expected: (&str, &str),
    ) {
        assert_eq!(image_options(model, size, quality), expected);
    }

    #[test]
    fn prompt_contains_caption() {
        let actual = image_prompt("But first, coffee");
        assert!(actual.contains("\"But first, coffee\""));
    }

    #[test]
    fn caption_request_shape() {
        let actual = caption_request("gpt-4.1-mini", "motivational");
        assert_eq!(actual["model"], "gpt-4.1-mini");
        assert_eq!(actual["max_tokens"], 100);
        assert_eq!(actual["messages"][0]["role"], "system");
        assert_eq!(
            actual["messages"][1]["content"],
            "Write a motivational coffee meme caption."
        );
    }
}
