//! MarketWatch-specific request and response bodies.

use serde::{Deserialize, Serialize};

/// Login response: a validation URL to visit to finish the handshake.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub url: String,
}

/// One line of an order submission. The endpoint takes a JSON array of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    #[serde(rename = "Fuid")]
    pub fuid: String,
    #[serde(rename = "Shares")]
    pub shares: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

/// Order submission response.
#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub succeeded: bool,
    #[serde(default)]
    pub message: Option<String>,
}
