//! External quantum random number service
//!
//! Talks to an ANU-style QRNG JSON API:
//!
//! ```text
//! GET <endpoint>?type=hex16&length=3&size=1
//! { "type": "string", "length": 3, "size": 1, "data": ["e4", "1f", "90"], "success": true }
//! ```
//!
//! Each item is one random byte; its top three bits become one draw.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use qs_slot::DRAW_BITS;

use crate::error::{EntropyError, EntropyResult};
use crate::kind::SourceKind;
use crate::retry::{RetryPolicy, retry};
use crate::source::RandomSource;

/// Public ANU QRNG endpoint
pub const DEFAULT_QRNG_ENDPOINT: &str = "https://qrng.anu.edu.au/API/jsonI.php";

/// QRNG client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrngConfig {
    /// Endpoint URL without query string
    pub endpoint: String,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// Retry policy for network failures
    pub retry: RetryPolicy,
}

impl Default for QrngConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_QRNG_ENDPOINT.to_string(),
            timeout_ms: 10_000,
            retry: RetryPolicy::default(),
        }
    }
}

/// JSON body returned by the service
#[derive(Debug, Clone, Deserialize)]
pub struct QrngResponse {
    #[serde(default)]
    pub data: Vec<String>,
    pub success: Option<bool>,
}

/// HTTP-backed random source
pub struct ExternalHttpRng {
    client: reqwest::Client,
    config: QrngConfig,
}

impl ExternalHttpRng {
    pub fn new(config: QrngConfig) -> EntropyResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EntropyError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Settings in use
    pub fn config(&self) -> &QrngConfig {
        &self.config
    }

    /// One request for `count` random bytes, decoded to draws
    pub async fn fetch(&self, count: usize) -> EntropyResult<Vec<u8>> {
        log::debug!("[QRNG] requesting {} bytes from {}", count, self.config.endpoint);
        let body = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("type", "hex16".to_string()),
                ("length", count.to_string()),
                ("size", "1".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let response: QrngResponse = serde_json::from_str(&body)
            .map_err(|e| EntropyError::Decode(format!("invalid QRNG payload: {}", e)))?;
        decode_response(&response, count)
    }
}

#[async_trait]
impl RandomSource for ExternalHttpRng {
    fn kind(&self) -> SourceKind {
        SourceKind::ExternalRng
    }

    async fn draw(&self, count: usize) -> EntropyResult<Vec<u8>> {
        retry(&self.config.retry, "QRNG request", || self.fetch(count)).await
    }
}

/// Check a response and turn its first `count` bytes into draws
pub fn decode_response(response: &QrngResponse, count: usize) -> EntropyResult<Vec<u8>> {
    if response.success == Some(false) {
        return Err(EntropyError::Decode("QRNG service reported failure".into()));
    }
    if response.data.len() < count {
        return Err(EntropyError::Decode(format!(
            "expected {} values, got {}",
            count,
            response.data.len()
        )));
    }
    response.data[..count]
        .iter()
        .map(|hex| decode_hex_byte(hex))
        .collect()
}

/// Top three bits of a two-digit hex byte
pub fn decode_hex_byte(hex: &str) -> EntropyResult<u8> {
    if hex.len() != 2 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(EntropyError::Decode(format!("not a hex byte: '{}'", hex)));
    }
    let byte = u8::from_str_radix(hex, 16)
        .map_err(|e| EntropyError::Decode(format!("not a hex byte: '{}': {}", hex, e)))?;
    Ok(byte >> (u8::BITS - DRAW_BITS))
}
