/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::ota
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Query the OTA update service and walk each device's build
    history backwards through the incremental chain.

  Security / Safety Notes:
    Performs read-only HTTPS GET requests. No credentials are
    transmitted. Chain walks are bounded by a visited set and
    a configured depth limit.

  Dependencies:
    reqwest for HTTP, serde for response parsing, urlencoding
    for path segments.

  Operational Scope:
    Supplies the report assembler with the builds still
    hosted for every tracked device.

  Revision History:
    2025-11-12 COD  Implemented update chain client.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Structured response parsing with explicit error paths
    - Iterative traversal with cycle and depth guards
    - Configurable timeouts
============================================================*/

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use urlencoding::encode;

use crate::config::ApiConfig;
use crate::error::{OtaError, Result};
use crate::logger::Logger;
use crate::record::{RawUpdate, UpdateRecord};

/// Anything that can answer "which build precedes `label` for `device`".
#[allow(async_fn_in_trait)]
pub trait UpdateSource {
    /// Return the build the service lists for `label`, or `None` at the end
    /// of the chain.
    async fn next_update(&self, device: &str, label: &str) -> Result<Option<RawUpdate>>;
}

/// Client for the OTA update service.
#[derive(Clone)]
pub struct OtaClient {
    client: reqwest::Client,
    base_url: String,
    channel: String,
    suffix: String,
}

impl OtaClient {
    /// Construct a new client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .user_agent(concat!("Syn-OTA/", env!("CARGO_PKG_VERSION"), " (linux)"))
            .build()
            .map_err(|err| OtaError::Network(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            channel: config.channel.clone(),
            suffix: config.suffix.clone(),
        })
    }

    fn compose_url(&self, device: &str, label: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.base_url,
            encode(device),
            encode(&self.channel),
            encode(label),
            encode(&self.suffix)
        )
    }
}

impl UpdateSource for OtaClient {
    async fn next_update(&self, device: &str, label: &str) -> Result<Option<RawUpdate>> {
        let url = self.compose_url(device, label);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| OtaError::Network(format!("OTA request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OtaError::Network(format!(
                "OTA request {url} failed with status {status}"
            )));
        }

        let payload = response.json::<OtaResponse>().await.map_err(|err| {
            OtaError::Serialization(format!("Failed to decode OTA response from {url}: {err}"))
        })?;

        let Some(first) = payload.response.and_then(|entries| entries.into_iter().next()) else {
            return Ok(None);
        };
        let update = serde_json::from_value::<RawUpdate>(first).map_err(|err| {
            OtaError::Serialization(format!("Malformed update entry from {url}: {err}"))
        })?;
        Ok(Some(update))
    }
}

#[derive(Debug, Deserialize)]
struct OtaResponse {
    #[serde(default)]
    response: Option<Vec<serde_json::Value>>,
}

/// Walk the chain for `device` starting at `start_label` until the source
/// reports no further build. Returns newest first.
pub async fn fetch_chain<S: UpdateSource>(
    source: &S,
    device: &str,
    start_label: &str,
    max_depth: usize,
    logger: &Logger,
) -> Result<Vec<UpdateRecord>> {
    let mut records = Vec::new();
    let mut visited = HashSet::new();
    let mut label = start_label.to_string();
    visited.insert(label.clone());

    while let Some(raw) = source.next_update(device, &label).await? {
        if records.len() >= max_depth {
            return Err(OtaError::ChainTooDeep {
                device: device.to_string(),
                limit: max_depth,
            });
        }

        let record = raw.into_record(device)?;
        logger.progress(
            "CHAIN",
            format!("[{}] Found incremental: {}", record.device, record.incremental),
        );

        label = record.incremental.clone();
        records.push(record);

        if !visited.insert(label.clone()) {
            return Err(OtaError::ChainCycle {
                device: device.to_string(),
                label,
            });
        }
    }

    logger.debug(
        "CHAIN",
        format!("[{device}] chain ended after {} builds", records.len()),
    );
    Ok(records)
}
