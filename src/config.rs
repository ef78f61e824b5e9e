use std::{env, fs, path::Path, path::PathBuf};

use anyhow::{bail, Context};
use log::debug;
use serde::{Deserialize, Deserializer};

use crate::{
    normalize::{
        QualityLadder, SizeConstraint, DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY_FLOOR,
        DEFAULT_QUALITY_STEP, DEFAULT_START_QUALITY,
    },
    utils::split_list,
    Megabytes,
};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service used to create the meme
    pub provider: Provider,

    /// Tone requested from the generator (funny, motivational, relatable, ...)
    pub meme_style: String,

    pub openai: OpenAiConfig,
    pub grok: GrokConfig,
    pub images: ImageConfig,

    /// How the finished meme is sent
    pub delivery: Delivery,

    pub email: EmailConfig,
    pub sms: SmsConfig,
    pub hosting: HostingConfig,

    /// Folder each generated meme is saved to
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Grok,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    #[default]
    Email,
    Sms,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GrokConfig {
    pub api_key: Option<String>,
    pub image_model: String,
    /// e.g. 1:1, 16:9, 9:16, 4:3
    pub aspect_ratio: String,
    /// 1k or 2k
    pub resolution: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Largest width or height allowed in pixels
    pub max_dimension: u32,

    /// Attachment size limit
    pub max_size_mb: Megabytes,

    pub quality: QualityConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub start: u8,
    pub step: u8,
    pub floor: u8,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: Option<String>,
    pub smtp_port: u16,

    /// Upgrade a plain connection with STARTTLS, otherwise connect with TLS directly
    pub use_starttls: bool,

    /// Sender address, also used as the SMTP user name
    pub address: Option<String>,
    pub password: Option<String>,

    #[serde(deserialize_with = "list_or_csv")]
    pub recipients: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub recipient: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct HostingConfig {
    /// Optional, ImgBB accepts uploads without a key at lower rate limits
    pub imgbb_api_key: Option<String>,

    /// Enables Imgur as a fallback host
    pub imgur_client_id: Option<String>,
}

impl Config {
    pub fn load_from(config_path: &Path) -> anyhow::Result<Config> {
        debug!("Loading Config from: {config_path:?}");
        let file_contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read contents of {config_path:?}"))?;
        let mut result: Config = serde_json::from_str(&file_contents)
            .with_context(|| format!("Failed to parse contents of {config_path:?}"))?;
        result.fill_secrets(|name| env::var(name).ok());
        Ok(result)
    }

    /// Fills secrets missing from the file using `lookup` (environment variables normally)
    pub fn fill_secrets<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, name: &str| {
            if is_blank(slot) {
                *slot = lookup(name).filter(|s| !s.trim().is_empty());
                if slot.is_some() {
                    debug!("Using {name} from environment");
                }
            }
        };
        fill(&mut self.openai.api_key, "OPENAI_API_KEY");
        fill(&mut self.grok.api_key, "XAI_API_KEY");
        fill(&mut self.email.password, "EMAIL_PASSWORD");
        fill(&mut self.sms.auth_token, "TWILIO_AUTH_TOKEN");
        fill(&mut self.hosting.imgbb_api_key, "IMGBB_API_KEY");
        fill(&mut self.hosting.imgur_client_id, "IMGUR_CLIENT_ID");
    }

    /// Checks everything the selected provider and delivery method need is present
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_for(true, true)
    }

    /// Like [`Config::validate`] but only checks the generator and delivery
    /// settings when those steps will run
    pub fn validate_for(&self, generate: bool, deliver: bool) -> anyhow::Result<()> {
        let mut missing = vec![];
        let mut require = |value: &Option<String>, name: &'static str| {
            if is_blank(value) {
                missing.push(name);
            }
        };

        match self.provider {
            _ if !generate => (),
            Provider::OpenAi => require(&self.openai.api_key, "openai.api_key"),
            Provider::Grok => require(&self.grok.api_key, "grok.api_key"),
        }
        match self.delivery {
            _ if !deliver => (),
            Delivery::Email => {
                require(&self.email.smtp_server, "email.smtp_server");
                require(&self.email.address, "email.address");
                require(&self.email.password, "email.password");
                let recipients = self.email.recipients.first().cloned();
                require(&recipients, "email.recipients");
            }
            Delivery::Sms => {
                require(&self.sms.account_sid, "sms.account_sid");
                require(&self.sms.auth_token, "sms.auth_token");
                require(&self.sms.from_number, "sms.from_number");
                require(&self.sms.recipient, "sms.recipient");
            }
        }

        if !missing.is_empty() {
            bail!(
                "Missing required configuration values: {}. \
                 Secrets may also be supplied through environment variables.",
                missing.join(", ")
            );
        }
        self.size_constraint()?;
        self.quality_ladder()?;
        Ok(())
    }

    pub fn size_constraint(&self) -> anyhow::Result<SizeConstraint> {
        SizeConstraint::new(self.images.max_dimension, self.images.max_size_mb.as_bytes())
            .with_context(|| {
                format!(
                    "Invalid image limits: max_dimension {} px, max_size_mb {}",
                    self.images.max_dimension, self.images.max_size_mb
                )
            })
    }

    pub fn quality_ladder(&self) -> anyhow::Result<QualityLadder> {
        let q = &self.images.quality;
        QualityLadder::new(q.start, q.step, q.floor).context("Invalid images.quality settings")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            meme_style: "funny".to_string(),
            openai: OpenAiConfig::default(),
            grok: GrokConfig::default(),
            images: ImageConfig::default(),
            delivery: Delivery::default(),
            email: EmailConfig::default(),
            sms: SmsConfig::default(),
            hosting: HostingConfig::default(),
            output_dir: PathBuf::from("coffee memes"),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model: "gpt-4.1-mini".to_string(),
            image_model: "gpt-image-1".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "low".to_string(),
        }
    }
}

impl Default for GrokConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            image_model: "grok-imagine-image".to_string(),
            aspect_ratio: "1:1".to_string(),
            resolution: "1k".to_string(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_size_mb: Megabytes::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_QUALITY,
            step: DEFAULT_QUALITY_STEP,
            floor: DEFAULT_QUALITY_FLOOR,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: None,
            smtp_port: 587,
            use_starttls: true,
            address: None,
            password: None,
            recipients: vec![],
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

/// Accepts either `["a@x.com", "b@y.com"]` or `"a@x.com, b@y.com"`
fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(list) => list
            .iter()
            .flat_map(|entry| split_list(entry))
            .collect(),
        ListOrCsv::Csv(csv) => split_list(&csv),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(json: &str) -> Config {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_file_uses_defaults() {
        let actual = parse("{}");
        assert_eq!(actual.provider, Provider::OpenAi);
        assert_eq!(actual.delivery, Delivery::Email);
        assert_eq!(actual.images.max_dimension, 1600);
        assert_eq!(actual.images.max_size_mb.as_bytes(), 5 * 1024 * 1024);
        assert_eq!(actual.email.smtp_port, 587);
        assert!(actual.email.use_starttls);
        assert_eq!(actual.openai.image_model, "gpt-image-1");
        assert_eq!(actual.grok.aspect_ratio, "1:1");
        assert_eq!(actual.quality_ladder().unwrap(), QualityLadder::default());
        assert_eq!(actual.meme_style, "funny");
        assert_eq!(actual.output_dir, PathBuf::from("coffee memes"));
    }

    #[rstest]
    #[case(r#"{"email": {"recipients": "a@x.com, b@y.org"}}"#)]
    #[case(r#"{"email": {"recipients": ["a@x.com", " b@y.org "]}}"#)]
    #[case(r#"{"email": {"recipients": ["a@x.com,b@y.org"]}}"#)]
    fn recipients_forms(#[case] json: &str) {
        let actual = parse(json);
        assert_eq!(actual.email.recipients, vec!["a@x.com", "b@y.org"]);
    }

    #[test]
    fn missing_values_listed_together() {
        let config = parse(r#"{"provider": "grok"}"#);
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("grok.api_key"), "{msg}");
        assert!(msg.contains("email.smtp_server"), "{msg}");
        assert!(msg.contains("email.recipients"), "{msg}");
        assert!(!msg.contains("openai.api_key"), "{msg}");
    }

    #[test]
    fn sms_requirements() {
        let config = parse(
            r#"{"delivery": "sms", "openai": {"api_key": "k"},
                "sms": {"account_sid": "AC1", "from_number": "+1555"}}"#,
        );
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("sms.auth_token"), "{msg}");
        assert!(msg.contains("sms.recipient"), "{msg}");
        assert!(!msg.contains("email."), "{msg}");
    }

    #[test]
    fn secrets_from_lookup() {
        let mut config = parse(
            r#"{"openai": {"api_key": "from-file"},
                "email": {"smtp_server": "smtp.example.com", "address": "me@example.com",
                          "recipients": "you@example.com"}}"#,
        );
        config.fill_secrets(|name| match name {
            "OPENAI_API_KEY" => Some("from-env".to_string()),
            "EMAIL_PASSWORD" => Some("hunter2".to_string()),
            _ => None,
        });
        assert_eq!(config.openai.api_key.as_deref(), Some("from-file"));
        assert_eq!(config.email.password.as_deref(), Some("hunter2"));
        assert!(config.hosting.imgur_client_id.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn skipped_steps_not_validated() {
        let config = parse(r#"{"delivery": "sms"}"#);
        assert!(config.validate_for(true, false).is_err());
        assert!(config.validate_for(false, true).is_err());
        config.validate_for(false, false).unwrap();
    }

    #[test]
    fn invalid_limits_rejected() {
        let mut config = parse(r#"{"images": {"max_dimension": 0}}"#);
        config.fill_secrets(|_| Some("x".to_string()));
        config.email.smtp_server = Some("smtp.example.com".to_string());
        config.email.address = Some("me@example.com".to_string());
        config.email.recipients = vec!["you@example.com".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_dimension_rejected_at_startup() {
        let config = parse(r#"{"images": {"max_dimension": 100000, "max_size_mb": 2.0}}"#);
        let msg = format!("{:#}", config.size_constraint().unwrap_err());
        assert!(msg.contains("max_dimension 100000 px, max_size_mb 2 MB"), "{msg}");
        assert!(msg.contains("JPEG limit"), "{msg}");
    }

    #[test]
    fn example_config_parses() {
        let actual = parse(include_str!("../config.example.json"));
        assert_eq!(actual.email.recipients.len(), 2);
        assert_eq!(actual.sms.recipient.as_deref(), Some("+15551234567"));
        assert!(actual.hosting.imgbb_api_key.is_none());
    }

    #[test]
    fn unknown_provider_rejected() {
        let actual: Result<Config, _> = serde_json::from_str(r#"{"provider": "dalle"}"#);
        assert!(actual.is_err());
    }
}
