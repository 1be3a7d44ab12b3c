//! Body rendering for audit records.

use base64::prelude::{Engine as _, BASE64_STANDARD};

use crate::config::BodyEncoding;

impl BodyEncoding {
    /// Render captured bytes as a JSON-safe string.
    pub fn encode(&self, bytes: &[u8]) -> String {
        match self {
            BodyEncoding::Auto => match std::str::from_utf8(bytes) {
                Ok(text) => text.to_string(),
                Err(_) => BASE64_STANDARD.encode(bytes),
            },
            BodyEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            BodyEncoding::Base64 => BASE64_STANDARD.encode(bytes),
        }
    }
}
