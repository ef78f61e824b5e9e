use std::fmt::Display;

use serde::Deserialize;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Size limit as written in the config file
#[derive(Debug, PartialEq, PartialOrd, Deserialize, Clone, Copy)]
pub struct Megabytes(f64);

impl Megabytes {
    /// Whole bytes, fractions are truncated and negatives become 0
    pub fn as_bytes(&self) -> u64 {
        (self.0 * BYTES_PER_MEGABYTE) as u64
    }
}

impl Display for Megabytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} MB", self.0)
    }
}

impl From<f64> for Megabytes {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl Default for Megabytes {
    fn default() -> Self {
        Self(5.0)
    }
}
