use anyhow::{bail, Context};
use chrono::{DateTime, Local};
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use log::{debug, info};

use crate::config::EmailConfig;

const BODY: &str = "Here's your daily mud meme ☕\n\nYou have been blessed by the MudBot";

/// Sends the meme as a JPEG attachment over SMTP
pub struct Email {
    transport: SmtpTransport,
    server: String,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl Email {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let (Some(server), Some(address), Some(password)) = (
            config.smtp_server.as_deref(),
            config.address.as_deref(),
            config.password.as_deref(),
        ) else {
            bail!("Email configuration is incomplete");
        };
        let from: Mailbox = address
            .parse()
            .with_context(|| format!("Invalid sender address {address:?}"))?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| {
                r.parse::<Mailbox>()
                    .with_context(|| format!("Invalid recipient address {r:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        if recipients.is_empty() {
            bail!("No valid recipient email addresses provided");
        }

        let relay = if config.use_starttls {
            SmtpTransport::starttls_relay(server)
        } else {
            SmtpTransport::relay(server)
        };
        let builder =
            relay.with_context(|| format!("Failed to set up SMTP transport for {server}"))?;
        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(address.to_string(), password.to_string()))
            .build();

        Ok(Self {
            transport,
            server: format!("{server}:{}", config.smtp_port),
            from,
            recipients,
        })
    }

    pub fn send(&self, image: &[u8]) -> anyhow::Result<()> {
        let recipients = self.recipient_list();
        info!("Sending image to {recipients}");
        info!("Image size: {} bytes", image.len());
        let message = self.build_message(image, Local::now())?;

        info!("Connecting to SMTP server {}", self.server);
        let response = self
            .transport
            .send(&message)
            .with_context(|| format!("SMTP error sending email via {}", self.server))?;
        debug!("SMTP response: {:?}", response.code());
        info!("Email sent successfully to {recipients}");
        Ok(())
    }

    fn build_message(&self, image: &[u8], now: DateTime<Local>) -> anyhow::Result<Message> {
        let subject = format!("The Daily Mud - {}", now.format("%B %d, %Y"));
        let filename = format!("coffee_meme_{}.jpg", now.format("%Y%m%d_%H%M%S"));
        let content_type =
            ContentType::parse("image/jpeg").context("Failed to parse attachment content type")?;

        let builder = self
            .recipients
            .iter()
            .fold(Message::builder().from(self.from.clone()), |b, to| {
                b.to(to.clone())
            })
            .subject(subject);
        builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(BODY.to_string()))
                    .singlepart(Attachment::new(filename).body(image.to_vec(), content_type)),
            )
            .context("Failed to build email message")
    }

    fn recipient_list(&self) -> String {
        self.recipients
            .iter()
            .map(|m| m.email.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
