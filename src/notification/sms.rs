use std::time::Duration;

use anyhow::{bail, Context};
use log::info;
use serde_json::Value;
use tokio::runtime::Runtime;

use crate::{config::SmsConfig, hosting::ImageHost};

const BODY: &str = "☕ Your daily coffee meme!";

/// Sends the meme as a Twilio MMS after hosting it at a public url
pub struct Sms {
    rt: Runtime,
    http: reqwest::Client,
    host: ImageHost,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

impl Sms {
    pub fn new(config: &SmsConfig, host: ImageHost) -> anyhow::Result<Self> {
        let (Some(account_sid), Some(auth_token), Some(from)) = (
            config.account_sid.clone(),
            config.auth_token.clone(),
            config.from_number.clone(),
        ) else {
            bail!("Twilio configuration is incomplete");
        };
        let Some(to) = config.recipient.clone() else {
            bail!("No recipient phone number provided");
        };
        let rt = Runtime::new().context("Failed to create async runtime")?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build http client")?;
        Ok(Self {
            rt,
            http,
            host,
            account_sid,
            auth_token,
            from,
            to,
        })
    }

    pub fn send(&self, image: &[u8]) -> anyhow::Result<()> {
        info!("Sending image to {}", self.to);
        info!("Image size: {} bytes", image.len());
        self.rt
            .block_on(self.do_send(image))
            .with_context(|| format!("Failed to send MMS to {}", self.to))
    }

    async fn do_send(&self, image: &[u8]) -> anyhow::Result<()> {
        info!("Uploading image to hosting service...");
        let media_url = self.host.upload(image).await?;
        self.send_url(&media_url).await
    }

    async fn send_url(&self, media_url: &str) -> anyhow::Result<()> {
        info!("Sending image from URL to {}", self.to);
        let resp = self
            .http
            .post(messages_url(&self.account_sid))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&message_form(&self.from, &self.to, media_url))
            .send()
            .await
            .context("Twilio request failed")?;
        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .with_context(|| format!("Twilio returned {status} with an unreadable body"))?;
        if !status.is_success() {
            let msg = body["message"].as_str().unwrap_or("Unknown error");
            bail!("Twilio error sending message ({status}): {msg}");
        }
        let sid = body["sid"].as_str().unwrap_or("<none>");
        info!("Message sent successfully. SID: {sid}");
        Ok(())
    }
}

fn messages_url(account_sid: &str) -> String {
    format!("https://api.twilio.com/2010-04-01/Accounts/{account_sid}/Messages.json")
}

fn message_form<'a>(
    from: &'a str,
    to: &'a str,
    media_url: &'a str,
) -> [(&'static str, &'a str); 4] {
    [
        ("From", from),
        ("To", to),
        ("Body", BODY),
        ("MediaUrl", media_url),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostingConfig;

    #[test]
    fn url_includes_account() {
        assert_eq!(
            messages_url("AC123"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn form_fields() {
        let actual = message_form("+15550001", "+15550002", "https://i.ibb.co/x.jpg");
        assert_eq!(actual[0], ("From", "+15550001"));
        assert_eq!(actual[1], ("To", "+15550002"));
        assert_eq!(actual[3], ("MediaUrl", "https://i.ibb.co/x.jpg"));
    }

    #[test]
    fn incomplete_config_rejected() {
        let config = SmsConfig {
            account_sid: Some("AC123".to_string()),
            auth_token: Some("token".to_string()),
            from_number: Some("+15550001".to_string()),
            recipient: None,
        };
        let host = ImageHost::new(&HostingConfig::default()).unwrap();
        assert!(Sms::new(&config, host).is_err());
    }
}
