/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::record
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Data contracts for firmware builds: builds served by the
    update service and curated builds it no longer serves.

  Security / Safety Notes:
    Pure data containers; no I/O performed in this module.

  Dependencies:
    serde for decoding, base64 for changelog payloads.

  Operational Scope:
    Produced by the fetcher and unlisted loader, consumed by
    the renderer.

  Revision History:
    2025-11-12 COD  Introduced update record types.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Clear data contracts between modules
    - Shared capability trait instead of loose field access
============================================================*/

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{OtaError, Result};

/// Fields every renderable build exposes for its download heading and
/// metadata line.
pub trait DownloadMetadata {
    fn version(&self) -> &str;
    fn url(&self) -> &str;
    fn filename(&self) -> &str;
    /// Download size in bytes.
    fn size(&self) -> f64;
    fn md5sum(&self) -> &str;
    fn api_level(&self) -> &str;
    fn update_type(&self) -> Option<&str>;
}

/// Changelog text decoded from the service's base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogText(String);

impl ChangelogText {
    /// Decode a standard-alphabet base64 payload into UTF-8 text. Line breaks
    /// and other ASCII whitespace inside the payload are ignored.
    pub fn decode(encoded: &str) -> Result<Self> {
        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|err| OtaError::Decode(format!("Changelog is not valid base64: {err}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|err| OtaError::Decode(format!("Changelog is not valid UTF-8: {err}")))?;
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Build entry as the update service sends it, before decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUpdate {
    pub version: String,
    pub incremental: String,
    pub changes: String,
    #[serde(deserialize_with = "de::byte_count")]
    pub size: f64,
    pub url: String,
    pub filename: String,
    pub md5sum: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub api_level: String,
    pub channel: String,
    pub updatetype: String,
}

impl RawUpdate {
    /// Decode the changelog and stamp the originating device.
    pub fn into_record(self, device: &str) -> Result<UpdateRecord> {
        let changes = ChangelogText::decode(&self.changes).map_err(|err| match err {
            OtaError::Decode(msg) => OtaError::Decode(format!(
                "{device} incremental {}: {msg}",
                self.incremental
            )),
            other => other,
        })?;
        Ok(UpdateRecord {
            device: device.to_string(),
            version: self.version,
            incremental: self.incremental,
            changes,
            size: self.size,
            url: self.url,
            filename: self.filename,
            md5sum: self.md5sum,
            api_level: self.api_level,
            channel: self.channel,
            updatetype: self.updatetype,
        })
    }
}

/// A build currently served by the update service.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecord {
    pub device: String,
    pub version: String,
    pub incremental: String,
    pub changes: ChangelogText,
    pub size: f64,
    pub url: String,
    pub filename: String,
    pub md5sum: String,
    pub api_level: String,
    pub channel: String,
    pub updatetype: String,
}

impl DownloadMetadata for UpdateRecord {
    fn version(&self) -> &str {
        &self.version
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn filename(&self) -> &str {
        &self.filename
    }
    fn size(&self) -> f64 {
        self.size
    }
    fn md5sum(&self) -> &str {
        &self.md5sum
    }
    fn api_level(&self) -> &str {
        &self.api_level
    }
    fn update_type(&self) -> Option<&str> {
        Some(&self.updatetype)
    }
}

/// A curated build that the update service no longer lists.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnlistedUpdateRecord {
    #[serde(default)]
    pub device: Option<String>,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub boot_img: Option<String>,
    #[serde(deserialize_with = "de::byte_count")]
    pub size: f64,
    pub md5sum: String,
    #[serde(deserialize_with = "de::lenient_string")]
    pub api_level: String,
    #[serde(default)]
    pub updatetype: Option<String>,
    #[serde(default)]
    pub expanded: bool,
}

impl UnlistedUpdateRecord {
    pub fn belongs_to(&self, device: &str) -> bool {
        self.device.as_deref() == Some(device)
    }

    /// Boot + recovery image link, when one is supplied.
    pub fn boot_image(&self) -> Option<&str> {
        self.boot_img.as_deref().filter(|link| !link.is_empty())
    }
}

impl DownloadMetadata for UnlistedUpdateRecord {
    fn version(&self) -> &str {
        &self.version
    }
    fn url(&self) -> &str {
        &self.url
    }
    fn filename(&self) -> &str {
        &self.filename
    }
    fn size(&self) -> f64 {
        self.size
    }
    fn md5sum(&self) -> &str {
        &self.md5sum
    }
    fn api_level(&self) -> &str {
        &self.api_level
    }
    fn update_type(&self) -> Option<&str> {
        self.updatetype.as_deref()
    }
}

mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        Text(String),
        Int(i64),
        Float(f64),
    }

    /// API levels arrive as `"30"`, `30` or `30.0`; each renders as written.
    pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::Text(text) => text,
            StringOrNumber::Int(value) => value.to_string(),
            StringOrNumber::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                format!("{value:.1}")
            }
            StringOrNumber::Float(value) => value.to_string(),
        })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u64),
        Float(f64),
    }

    /// Sizes are byte counts, sent as integers or floats.
    pub fn byte_count<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = match Number::deserialize(deserializer)? {
            Number::Int(value) => value as f64,
            Number::Float(value) => value,
        };
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(serde::de::Error::custom(format!(
                "size must be a non-negative byte count, got {value}"
            )))
        }
    }
}
