//! HTTP data extractor.
//!
//! `GET {base_url}/extract?nebula=<hex>` answers
//! `{ "value": ..., "type": "int64" | "string" | "bytes" }`. Integers may
//! come as JSON numbers or decimal strings; bytes come as hex.

use crate::domain::{OracleError, OracleResult};
use crate::ports::DataExtractor;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use shared_types::{NebulaId, Value, ValueType};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    value: serde_json::Value,
    #[serde(rename = "type")]
    value_type: ValueType,
}

/// Extractor backed by an HTTP endpoint.
pub struct HttpExtractor {
    client: Client,
    base_url: String,
}

impl HttpExtractor {
    /// Create an extractor for `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> OracleResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| OracleError::Extractor(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint base.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Turn an extractor response body into a typed value.
fn parse_value(value_type: ValueType, raw: &serde_json::Value) -> OracleResult<Value> {
    let bad = |what: &str| OracleError::Extractor(format!("{} is not a valid {}", what, value_type));
    match value_type {
        ValueType::Int64 => match raw {
            serde_json::Value::Number(n) => n.as_i64().map(Value::Int64).ok_or_else(|| bad(&n.to_string())),
            serde_json::Value::String(s) => s.parse().map(Value::Int64).map_err(|_| bad(s)),
            other => Err(bad(&other.to_string())),
        },
        ValueType::String => match raw {
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            other => Err(bad(&other.to_string())),
        },
        ValueType::Bytes => match raw {
            serde_json::Value::String(s) => hex::decode(s.trim_start_matches("0x"))
                .map(Value::Bytes)
                .map_err(|_| bad(s)),
            other => Err(bad(&other.to_string())),
        },
    }
}

#[async_trait]
impl DataExtractor for HttpExtractor {
    async fn extract(&self, nebula: &NebulaId, value_type: ValueType) -> OracleResult<Value> {
        let url = format!("{}/extract", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("nebula", hex::encode(nebula.as_bytes()))])
            .send()
            .await
            .map_err(|e| OracleError::Extractor(format!("{}: {}", url, e)))?
            .error_for_status()
            .map_err(|e| OracleError::Extractor(e.to_string()))?;

        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Extractor(format!("bad response: {}", e)))?;

        if body.value_type != value_type {
            return Err(OracleError::TypeMismatch {
                expected: value_type.to_string(),
                got: body.value_type.to_string(),
            });
        }
        let value = parse_value(body.value_type, &body.value)?;
        debug!("[gc-04] extracted {} from {}", value, url);
        Ok(value)
    }
}
