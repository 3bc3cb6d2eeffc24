// ─────────────────────────────────────────────────────────────────────
// Smart Trolley — HTTP Weight Transport
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! [`WeightSource`] backed by a WiFi scale node.
//!
//! The node answers `GET http://<host>/weight` with a JSON body such as
//! `{"weight": 58.4}`. Each [`WeightSource::read`] is one request.
//!
//! # Transport Safety
//!
//! - Every request carries a hard timeout (default 1 s); a hung node
//!   cannot stall a sampling window past its deadline by more than that.
//! - Connection, status and decode failures map to [`SensorError`];
//!   the core sampler absorbs them and falls back to its last stable
//!   weight.
//! - A missing `weight` field reads as 0 g, matching nodes that omit
//!   the field while the load cell is tared.
//!
//! Usage:
//! ```no_run
//! use std::sync::Arc;
//! use trolley_core::{Catalog, SmartTrolley};
//! use trolley_sensor::{HttpSensorConfig, HttpWeightSource};
//! use trolley_types::TrolleyConfig;
//!
//! let source = HttpWeightSource::new(HttpSensorConfig::for_host("172.17.42.125")).unwrap();
//! let trolley =
//!     SmartTrolley::new(TrolleyConfig::default(), Catalog::default_store(), Arc::new(source))
//!         .unwrap();
//! let _ = trolley.monitor_tick();
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use trolley_core::WeightSource;
use trolley_types::{Grams, SensorError};

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1_000;

/// Where and how to poll the scale node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSensorConfig {
    /// Base URL of the node, e.g. `http://172.17.42.125`.
    pub base_url: String,
    /// Path serving the reading.
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_path() -> String {
    "/weight".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl HttpSensorConfig {
    pub fn for_host(host: &str) -> Self {
        Self {
            base_url: format!("http://{host}"),
            path: default_path(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }
}

pub struct HttpWeightSource {
    client: Client,
    url: String,
}

impl HttpWeightSource {
    pub fn new(config: HttpSensorConfig) -> Result<Self, SensorError> {
        if config.request_timeout_ms == 0 {
            return Err(SensorError::Transport(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SensorError::Transport(format!("client build failed: {e}")))?;
        let url = config.url();
        log::info!("polling weight from {url}");
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl WeightSource for HttpWeightSource {
    fn read(&self) -> Result<Grams, SensorError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| SensorError::Transport(e.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|e| SensorError::Transport(e.to_string()))?;
        let body = response
            .text()
            .map_err(|e| SensorError::Transport(e.to_string()))?;
        parse_reading(&body)
    }
}

/// Decode a node response body into grams.
///
/// Accepts the weight as a JSON number or a numeric string.
pub fn parse_reading(body: &str) -> Result<Grams, SensorError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| SensorError::Malformed(format!("invalid JSON: {e}")))?;
    let weight = match payload.get("weight") {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| SensorError::Malformed(format!("unrepresentable weight {n}")))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| SensorError::Malformed(format!("non-numeric weight {s:?}")))?,
        Some(other) => {
            return Err(SensorError::Malformed(format!("unexpected weight {other}")));
        }
    };
    if !weight.is_finite() {
        return Err(SensorError::Malformed(format!("non-finite weight {weight}")));
    }
    Ok(weight)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use trolley_core::{Catalog, SmartTrolley};
    use trolley_types::{MonitorReport, TrolleyConfig};

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_reading(r#"{"weight": 58.4}"#), Ok(58.4));
    }

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_reading(r#"{"weight": " 12.5 "}"#), Ok(12.5));
    }

    #[test]
    fn test_parse_missing_field_is_zero() {
        assert_eq!(parse_reading(r#"{"status": "tared"}"#), Ok(0.0));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_reading("<html>oops</html>"),
            Err(SensorError::Malformed(_))
        ));
        assert!(matches!(
            parse_reading(r#"{"weight": "heavy"}"#),
            Err(SensorError::Malformed(_))
        ));
        assert!(matches!(
            parse_reading(r#"{"weight": [1, 2]}"#),
            Err(SensorError::Malformed(_))
        ));
        assert!(matches!(
            parse_reading(r#"{"weight": "NaN"}"#),
            Err(SensorError::Malformed(_))
        ));
    }

    #[test]
    fn test_url_joining() {
        let config = HttpSensorConfig {
            base_url: "http://10.0.0.7/".into(),
            path: "weight".into(),
            request_timeout_ms: 500,
        };
        assert_eq!(config.url(), "http://10.0.0.7/weight");
        assert_eq!(
            HttpSensorConfig::for_host("10.0.0.7").url(),
            "http://10.0.0.7/weight"
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = HttpSensorConfig::for_host("10.0.0.7");
        config.request_timeout_ms = 0;
        assert!(HttpWeightSource::new(config).is_err());
    }

    #[test]
    fn test_unreachable_node_is_transport_error() {
        let mut config = HttpSensorConfig::for_host("127.0.0.1:1");
        config.request_timeout_ms = 200;
        let source = HttpWeightSource::new(config).unwrap();
        assert!(matches!(source.read(), Err(SensorError::Transport(_))));
    }

    #[test]
    fn test_unreachable_node_falls_back() {
        let mut config = HttpSensorConfig::for_host("127.0.0.1:1");
        config.request_timeout_ms = 200;
        let source = HttpWeightSource::new(config).unwrap();
        let trolley_config = TrolleyConfig {
            stabilize_timeout_ms: 30,
            stabilize_interval_ms: 5,
            ..Default::default()
        };
        let trolley =
            SmartTrolley::new(trolley_config, Catalog::default_store(), Arc::new(source)).unwrap();
        assert_eq!(
            trolley.monitor_tick(),
            MonitorReport::Ok {
                actual: 0.0,
                expected: 0.0
            }
        );
    }
}
