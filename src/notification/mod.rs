mod email;
mod sms;

pub use email::Email;
pub use sms::Sms;

use crate::{
    config::{Config, Delivery},
    hosting::ImageHost,
};

/// Delivery channel selected in the config
pub enum Notifier {
    Email(Email),
    Sms(Sms),
}

impl Notifier {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(match config.delivery {
            Delivery::Email => Self::Email(Email::new(&config.email)?),
            Delivery::Sms => Self::Sms(Sms::new(&config.sms, ImageHost::new(&config.hosting)?)?),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Email(_) => "email",
            Self::Sms(_) => "SMS",
        }
    }

    pub fn send(&self, image: &[u8]) -> anyhow::Result<()> {
        match self {
            Self::Email(email) => email.send(image),
            Self::Sms(sms) => sms.send(image),
        }
    }
}
