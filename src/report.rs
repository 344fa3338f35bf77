/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::report
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Assemble the official ROM report by combining live server
    builds with curated unlisted builds for every device.

  Security / Safety Notes:
    The report is written to an operator-controlled path via a
    sibling temporary file; no privileged operations.

  Dependencies:
    sha2 for the report digest.

  Operational Scope:
    Output is published as the project's official ROM page.

  Revision History:
    2025-11-12 COD  Authored report assembler.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic ordering for reproducible reports
    - Explicit per-device failure policy
    - Single write at the end of a successful run
============================================================*/

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::DeviceConfig;
use crate::error::{OtaError, Result};
use crate::logger::Logger;
use crate::ota::{fetch_chain, UpdateSource};
use crate::prettify::prettify;
use crate::record::{UnlistedUpdateRecord, UpdateRecord};
use crate::render::{
    render_device_section, render_server_updates, render_unlisted_updates, ServerSection,
    DOCUMENT_TITLE,
};

/// How a failed chain walk for one device affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole run; the previous report stays in place.
    FailFast,
    /// Log, mark the device's server section unavailable, and continue.
    Continue,
}

impl FailurePolicy {
    pub fn from_fail_fast(fail_fast: bool) -> Self {
        if fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Continue
        }
    }
}

/// Chain walk settings shared by every device.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyOptions {
    pub max_chain_depth: usize,
    pub policy: FailurePolicy,
}

/// Per-device outcome.
#[derive(Debug)]
pub struct DeviceReport {
    pub device: DeviceConfig,
    pub server_updates: Vec<UpdateRecord>,
    pub unlisted_count: usize,
    /// Set when the chain walk failed under [`FailurePolicy::Continue`].
    pub fetch_error: Option<String>,
}

/// Fully assembled report.
#[derive(Debug)]
pub struct ReportDocument {
    pub sections: Vec<DeviceReport>,
    pub body: String,
}

impl ReportDocument {
    pub fn server_update_count(&self) -> usize {
        self.sections.iter().map(|s| s.server_updates.len()).sum()
    }

    pub fn unlisted_update_count(&self) -> usize {
        self.sections.iter().map(|s| s.unlisted_count).sum()
    }

    pub fn failed_devices(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter(|s| s.fetch_error.is_some())
            .map(|s| s.device.codename.as_str())
            .collect()
    }

    /// Hex SHA-256 of the rendered body.
    pub fn digest(&self) -> String {
        format!("{:x}", Sha256::digest(self.body.as_bytes()))
    }
}

/// Walk every device's chain in order and build the normalised report.
pub async fn assemble_report<S: UpdateSource>(
    source: &S,
    devices: &[DeviceConfig],
    unlisted: &[UnlistedUpdateRecord],
    options: AssemblyOptions,
    logger: &Logger,
) -> Result<ReportDocument> {
    let mut body = String::from(DOCUMENT_TITLE);
    let mut sections = Vec::with_capacity(devices.len());

    for device in devices {
        logger.progress(
            "DEVICE",
            format!(
                "=== Fetching updates for {} ({}) ===",
                device.name, device.codename
            ),
        );

        let (server_updates, fetch_error) = match fetch_chain(
            source,
            &device.codename,
            &device.release,
            options.max_chain_depth,
            logger,
        )
        .await
        {
            Ok(records) => (records, None),
            Err(err) if options.policy == FailurePolicy::Continue => {
                logger.warn(
                    "DEVICE",
                    format!("Skipping server builds for {}: {err}", device.codename),
                );
                (Vec::new(), Some(err.to_string()))
            }
            Err(err) => return Err(err),
        };

        let server_html = render_server_updates(&server_updates)?;
        let unlisted_html = render_unlisted_updates(unlisted, &device.codename)?;
        let unlisted_count = unlisted
            .iter()
            .filter(|record| record.belongs_to(&device.codename))
            .count();

        let server = if fetch_error.is_some() {
            ServerSection::Unavailable
        } else {
            ServerSection::Builds(&server_html)
        };
        body.push_str(&render_device_section(device, &unlisted_html, server)?);

        logger.info(
            "DEVICE",
            format!(
                "{} server={} unlisted={}",
                device.codename,
                server_updates.len(),
                unlisted_count
            ),
        );

        sections.push(DeviceReport {
            device: device.clone(),
            server_updates,
            unlisted_count,
            fetch_error,
        });
    }

    Ok(ReportDocument {
        sections,
        body: prettify(&body),
    })
}

/// Replace the report at `path` with the document body.
pub fn write_report(document: &ReportDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            OtaError::Filesystem(format!(
                "Failed to create report directory {}: {err}",
                parent.display()
            ))
        })?;
    }

    let staging = staging_path(path);
    fs::write(&staging, document.body.as_bytes()).map_err(|err| {
        OtaError::Filesystem(format!(
            "Failed to write report {}: {err}",
            staging.display()
        ))
    })?;
    fs::rename(&staging, path).map_err(|err| {
        let _ = fs::remove_file(&staging);
        OtaError::Filesystem(format!(
            "Failed to move report into place at {}: {err}",
            path.display()
        ))
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ota::tests::StaticSource;
    use crate::render::{NO_SERVER_BUILDS, REMOVED_HEADING, SERVER_HEADING, SERVER_UNREACHABLE};

    fn options(policy: FailurePolicy) -> AssemblyOptions {
        AssemblyOptions {
            max_chain_depth: 16,
            policy,
        }
    }

    fn zahedan() -> DeviceConfig {
        DeviceConfig::new("zahedan", "Daria Bond I", "V0.00.0.0.BOND")
    }

    fn hormoz() -> DeviceConfig {
        DeviceConfig::new("hormoz", "Daria Bond II", "V0.00.0.0.BOND2")
    }

    fn unlisted_for(device: &str) -> UnlistedUpdateRecord {
        UnlistedUpdateRecord {
            device: Some(device.into()),
            version: "DariaOS 0.9".into(),
            description: None,
            url: "https://dl.example/old.zip".into(),
            filename: "old.zip".into(),
            boot_img: None,
            size: 1073741824.0,
            md5sum: "beef".into(),
            api_level: "29".into(),
            updatetype: None,
            expanded: false,
        }
    }

    #[tokio::test]
    async fn single_device_single_build() {
        let source = StaticSource::default().link("zahedan", "V0.00.0.0.BOND", "A");
        let document = assemble_report(
            &source,
            &[zahedan()],
            &[],
            options(FailurePolicy::FailFast),
            &Logger::silent(),
        )
        .await
        .unwrap();

        assert_eq!(document.sections.len(), 1);
        assert_eq!(document.server_update_count(), 1);
        assert_eq!(document.sections[0].server_updates[0].incremental, "A");
        assert!(document.body.starts_with("# بارگیری رام رسمی\n\n## Daria Bond I (zahedan)\n"));
        assert_eq!(document.body.matches("## Daria Bond I (zahedan)").count(), 1);
        assert!(document.body.contains(SERVER_HEADING));
        assert!(!document.body.contains(REMOVED_HEADING));
        assert!(document.body.contains("DariaOS 2.A - A"));
        assert!(document.body.contains("File Size: 2.00 GB"));
    }

    #[tokio::test]
    async fn unlisted_and_empty_server_sections() {
        let source = StaticSource::default();
        let document = assemble_report(
            &source,
            &[zahedan(), hormoz()],
            &[unlisted_for("hormoz")],
            options(FailurePolicy::FailFast),
            &Logger::silent(),
        )
        .await
        .unwrap();

        assert_eq!(document.unlisted_update_count(), 1);
        assert_eq!(document.body.matches(NO_SERVER_BUILDS).count(), 2);
        assert_eq!(document.body.matches(REMOVED_HEADING).count(), 1);
        let zahedan_at = document.body.find("(zahedan)").unwrap();
        let hormoz_at = document.body.find("(hormoz)").unwrap();
        let removed_at = document.body.find(REMOVED_HEADING).unwrap();
        assert!(zahedan_at < hormoz_at && hormoz_at < removed_at);
    }

    #[tokio::test]
    async fn fail_fast_aborts_on_first_error() {
        let source = StaticSource::default()
            .link("hormoz", "V0.00.0.0.BOND2", "A")
            .fail("zahedan");
        let err = assemble_report(
            &source,
            &[zahedan(), hormoz()],
            &[],
            options(FailurePolicy::FailFast),
            &Logger::silent(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OtaError::Network(_)));
    }

    #[tokio::test]
    async fn continue_policy_keeps_other_devices() {
        let source = StaticSource::default()
            .link("hormoz", "V0.00.0.0.BOND2", "A")
            .fail("zahedan");
        let document = assemble_report(
            &source,
            &[zahedan(), hormoz()],
            &[],
            options(FailurePolicy::Continue),
            &Logger::silent(),
        )
        .await
        .unwrap();

        assert_eq!(document.failed_devices(), vec!["zahedan"]);
        assert_eq!(document.server_update_count(), 1);
        assert!(document.body.contains(SERVER_UNREACHABLE));
        assert!(document.body.contains("DariaOS 2.A - A"));
    }

    #[tokio::test]
    async fn assembling_twice_is_byte_identical() {
        let source = StaticSource::default()
            .link("zahedan", "V0.00.0.0.BOND", "B")
            .link("zahedan", "B", "A");
        let unlisted = vec![unlisted_for("zahedan")];
        let devices = [zahedan(), hormoz()];

        let logger = Logger::silent();
        let opts = options(FailurePolicy::FailFast);
        let first = assemble_report(&source, &devices, &unlisted, opts, &logger)
            .await
            .unwrap();
        let second = assemble_report(&source, &devices, &unlisted, opts, &logger)
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs").join("official-rom.md");
        write_report(&first, &path).unwrap();
        let first_bytes = fs::read(&path).unwrap();
        write_report(&second, &path).unwrap();
        let second_bytes = fs::read(&path).unwrap();

        assert_eq!(first_bytes, second_bytes);
        assert_eq!(first.digest(), second.digest());
        assert_eq!(first.digest().len(), 64);
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn write_report_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("official-rom.md");
        fs::write(&path, "stale report that is much longer than the new one").unwrap();

        let document = ReportDocument {
            sections: Vec::new(),
            body: "# fresh\n".into(),
        };
        write_report(&document, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# fresh\n");
    }
}
