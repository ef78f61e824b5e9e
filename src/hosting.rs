//! Public image hosting, needed because MMS messages reference media by url.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use base64::{engine::general_purpose::STANDARD, Engine};
use log::{debug, error, info, warn};
use serde_json::Value;

use crate::config::HostingConfig;

const IMGBB_URL: &str = "https://api.imgbb.com/1/upload";
const IMGUR_URL: &str = "https://api.imgur.com/3/image";

/// Uploads to ImgBB, falling back to Imgur when a client id is configured
pub struct ImageHost {
    http: reqwest::Client,
    imgbb_api_key: Option<String>,
    imgur_client_id: Option<String>,
}

impl ImageHost {
    pub fn new(config: &HostingConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build http client")?;
        Ok(Self {
            http,
            imgbb_api_key: config.imgbb_api_key.clone(),
            imgur_client_id: config.imgur_client_id.clone(),
        })
    }

    /// Returns the public url of the uploaded image
    pub async fn upload(&self, image: &[u8]) -> anyhow::Result<String> {
        let encoded = STANDARD.encode(image);
        let imgbb_err = match self.upload_to_imgbb(&encoded).await {
            Ok(url) => return Ok(url),
            Err(e) => e,
        };
        warn!("ImgBB upload failed: {imgbb_err:#}");

        let Some(client_id) = self.imgur_client_id.as_deref() else {
            bail!(
                "ImgBB upload failed and no Imgur client id configured. Error: {imgbb_err:#}. \
                 Consider getting a free ImgBB API key at https://api.imgbb.com/"
            );
        };
        info!("Falling back to Imgur...");
        self.upload_to_imgur(&encoded, client_id)
            .await
            .map_err(|imgur_err| {
                error!("Imgur upload also failed: {imgur_err:#}");
                anyhow!(
                    "Both image hosting services failed. ImgBB error: {imgbb_err:#}. \
                     Imgur error: {imgur_err:#}"
                )
            })
    }

    async fn upload_to_imgbb(&self, encoded: &str) -> anyhow::Result<String> {
        info!("Uploading image to ImgBB...");
        let mut form = vec![("image", encoded)];
        match self.imgbb_api_key.as_deref() {
            Some(key) => {
                debug!("Using ImgBB API key for higher rate limits");
                form.push(("key", key));
            }
            None => info!("Using ImgBB without API key (basic mode)"),
        }
        let resp = self
            .http
            .post(IMGBB_URL)
            .form(&form)
            .send()
            .await
            .context("Network error uploading to ImgBB")?;
        let status = resp.status();
        if status.as_u16() == 429 {
            bail!("ImgBB rate limit exceeded. Consider getting a free API key at https://api.imgbb.com/");
        }
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("ImgBB returned {status} with an unreadable body"))?;
        let url = parse_imgbb(&body)?;
        info!("Image uploaded successfully to ImgBB: {url}");
        Ok(url)
    }

    async fn upload_to_imgur(&self, encoded: &str, client_id: &str) -> anyhow::Result<String> {
        info!("Uploading image to Imgur...");
        let resp = self
            .http
            .post(IMGUR_URL)
            .header("Authorization", format!("Client-ID {client_id}"))
            .form(&[("image", encoded)])
            .send()
            .await
            .context("Network error uploading to Imgur")?;
        let status = resp.status();
        match status.as_u16() {
            401 => bail!("Imgur returned 401 Unauthorized. Check that your client id is valid"),
            403 => bail!("Imgur returned 403 Forbidden. Check that your client id is correct"),
            _ => (),
        }
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("Imgur returned {status} with an unreadable body"))?;
        let url = parse_imgur(&body)?;
        info!("Image uploaded successfully to Imgur: {url}");
        Ok(url)
    }
}

fn parse_imgbb(body: &Value) -> anyhow::Result<String> {
    if body["success"].as_bool() == Some(true) {
        if let Some(url) = body.pointer("/data/url").and_then(Value::as_str) {
            return Ok(url.to_string());
        }
    }
    let msg = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");
    bail!("ImgBB API error: {msg}")
}

fn parse_imgur(body: &Value) -> anyhow::Result<String> {
    if body["success"].as_bool() == Some(true) {
        if let Some(url) = body.pointer("/data/link").and_then(Value::as_str) {
            return Ok(url.to_string());
        }
    }
    let msg = body
        .pointer("/data/error")
        .and_then(Value::as_str)
        .unwrap_or("Unknown error");
    bail!("Imgur API error: {msg}")
}
