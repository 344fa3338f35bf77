/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::unlisted
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load the curated dataset of builds that the update
    service no longer hosts.

  Security / Safety Notes:
    Reads an operator-maintained JSON file; nothing is written.

  Dependencies:
    serde_json for parsing.

  Operational Scope:
    Called once per run by the entry point before assembly.

  Revision History:
    2025-11-12 COD  Authored unlisted update loader.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Schema violations surface at load time, not render time
    - Missing optional inputs degrade to an empty dataset
    - Read-only access to operator data
============================================================*/

use std::path::Path;

use serde::Deserialize;

use crate::error::{OtaError, Result};
use crate::logger::Logger;
use crate::record::UnlistedUpdateRecord;

#[derive(Debug, Deserialize)]
struct UnlistedDocument {
    #[serde(default)]
    unlisted_updates: Vec<UnlistedUpdateRecord>,
}

/// Read `path` and return its `unlisted_updates` entries. A document without
/// that key yields an empty list.
pub fn load_unlisted(path: &Path) -> Result<Vec<UnlistedUpdateRecord>> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        OtaError::Filesystem(format!(
            "Failed to read unlisted updates {}: {err}",
            path.display()
        ))
    })?;
    parse_unlisted(&content)
        .map_err(|err| OtaError::Serialization(format!("{}: {err}", path.display())))
}

/// Like [`load_unlisted`], but a missing file is logged and treated as empty.
pub fn load_unlisted_optional(path: &Path, logger: &Logger) -> Result<Vec<UnlistedUpdateRecord>> {
    if !path.exists() {
        logger.warn(
            "UNLISTED",
            format!("{} not found; continuing without unlisted builds", path.display()),
        );
        return Ok(Vec::new());
    }
    load_unlisted(path)
}

fn parse_unlisted(content: &str) -> serde_json::Result<Vec<UnlistedUpdateRecord>> {
    serde_json::from_str::<UnlistedDocument>(content).map(|doc| doc.unlisted_updates)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const SAMPLE: &str = r#"{
  "unlisted_updates": [
    {
      "device": "zahedan",
      "version": "DariaOS 1.0.0",
      "description": "<p>نسخه اولیه</p>",
      "url": "https://dl.example/bond1.zip",
      "filename": "bond1.zip",
      "boot_img": "https://dl.example/bond1-boot.img",
      "size": 1610612736,
      "md5sum": "aaa",
      "api_level": 29,
      "expanded": true
    },
    {
      "device": "hormoz",
      "version": "DariaOS 2.0.0",
      "url": "https://dl.example/bond2.zip",
      "filename": "bond2.zip",
      "size": 2147483648,
      "md5sum": "bbb",
      "api_level": "30",
      "updatetype": "full"
    }
  ]
}"#;

    #[test]
    fn loads_records_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unlisted_updates.json");
        fs::write(&path, SAMPLE).unwrap();

        let records = load_unlisted(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].belongs_to("zahedan"));
        assert!(records[0].expanded);
        assert_eq!(records[0].api_level, "29");
        assert_eq!(records[1].updatetype.as_deref(), Some("full"));
    }

    #[test]
    fn missing_key_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unlisted_updates.json");
        fs::write(&path, r#"{"something_else": []}"#).unwrap();

        assert!(load_unlisted(&path).unwrap().is_empty());
    }

    #[test]
    fn record_missing_required_field_is_rejected() {
        let err = parse_unlisted(
            r#"{"unlisted_updates": [{"device": "zahedan", "version": "x", "url": "u"}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_unlisted(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, OtaError::Filesystem(_)));
    }

    #[test]
    fn optional_loader_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let records =
            load_unlisted_optional(&dir.path().join("absent.json"), &Logger::silent()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn invalid_json_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_unlisted(&path),
            Err(OtaError::Serialization(_))
        ));
    }
}
