/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::render
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Turn update records into the Markdown/HTML fragments that
    make up the official ROM report.

  Security / Safety Notes:
    Changelogs and descriptions are trusted HTML fragments and
    are inserted verbatim.

  Dependencies:
    askama for the HTML block templates under templates/.

  Operational Scope:
    Pure functions called by the report assembler.

  Revision History:
    2025-11-12 COD  Authored report templates.
    2025-11-19 COD  Moved blocks onto askama templates.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Markup lives in templates, data shaping lives in Rust
    - Plain fields escaped, trusted fragments marked safe
    - Render failures propagate as typed errors
============================================================*/

use askama::Template;

use crate::config::DeviceConfig;
use crate::error::{OtaError, Result};
use crate::record::{DownloadMetadata, UnlistedUpdateRecord, UpdateRecord};

pub const DOCUMENT_TITLE: &str = "# بارگیری رام رسمی\n\n";
pub const REMOVED_HEADING: &str = "### رام‌های رسمی (حذف شده از سرور داریا)";
pub const SERVER_HEADING: &str = "### رام‌های رسمی (سرور داریا)";
pub const NO_SERVER_BUILDS: &str = "_هیچ رام رسمی در سرور یافت نشد._";
pub const SERVER_UNREACHABLE: &str = "_خطا در دریافت اطلاعات از سرور._";

/// Server half of a device section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerSection<'a> {
    /// Rendered server builds; empty when the service lists none.
    Builds(&'a str),
    /// Fetching failed and the run continued past it.
    Unavailable,
}

#[derive(Template)]
#[template(path = "server_update.html")]
struct ServerUpdateBlock<'a> {
    version: &'a str,
    incremental: &'a str,
    url: &'a str,
    filename: &'a str,
    size_gb: String,
    md5sum: &'a str,
    api_level: &'a str,
    channel: &'a str,
    update_type: &'a str,
    changes: &'a str,
}

#[derive(Template)]
#[template(path = "unlisted_update.html")]
struct UnlistedUpdateBlock<'a> {
    expanded: bool,
    version: &'a str,
    description: Option<&'a str>,
    url: &'a str,
    filename: &'a str,
    boot_image: Option<&'a str>,
    size_gb: String,
    md5sum: &'a str,
    api_level: &'a str,
    update_type: &'a str,
}

#[derive(Template)]
#[template(path = "device_section.html")]
struct DeviceSectionBlock<'a> {
    name: &'a str,
    codename: &'a str,
    has_unlisted: bool,
    removed_heading: &'a str,
    unlisted_html: &'a str,
    server_heading: &'a str,
    server_body: &'a str,
}

/// Bytes to gigabytes with exactly two decimals.
pub fn format_size_gb(bytes: f64) -> String {
    format!("{:.2}", bytes / (1024.0 * 1024.0 * 1024.0))
}

fn render_block<T: Template>(template: &T, what: &str) -> Result<String> {
    template
        .render()
        .map_err(|err| OtaError::Render(format!("Failed to render {what}: {err}")))
}

/// One collapsible block per server build, newest first.
pub fn render_server_updates(records: &[UpdateRecord]) -> Result<String> {
    let blocks = records
        .iter()
        .map(|record| {
            let block = ServerUpdateBlock {
                version: &record.version,
                incremental: &record.incremental,
                url: record.url(),
                filename: record.filename(),
                size_gb: format_size_gb(record.size()),
                md5sum: record.md5sum(),
                api_level: record.api_level(),
                channel: &record.channel,
                update_type: record.update_type().unwrap_or("N/A"),
                changes: record.changes.as_str(),
            };
            render_block(&block, "server update")
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(blocks.join("\n"))
}

/// Blocks for the curated builds that belong to `device`.
pub fn render_unlisted_updates(records: &[UnlistedUpdateRecord], device: &str) -> Result<String> {
    let blocks = records
        .iter()
        .filter(|record| record.belongs_to(device))
        .map(|record| {
            let block = UnlistedUpdateBlock {
                expanded: record.expanded,
                version: record.version(),
                description: record.description.as_deref(),
                url: record.url(),
                filename: record.filename(),
                boot_image: record.boot_image(),
                size_gb: format_size_gb(record.size()),
                md5sum: record.md5sum(),
                api_level: record.api_level(),
                update_type: record.update_type().unwrap_or("N/A"),
            };
            render_block(&block, "unlisted update")
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(blocks.join("\n"))
}

/// Markdown section for one device.
pub fn render_device_section(
    device: &DeviceConfig,
    unlisted_html: &str,
    server: ServerSection<'_>,
) -> Result<String> {
    let server_body = match server {
        ServerSection::Builds("") => NO_SERVER_BUILDS,
        ServerSection::Builds(html) => html,
        ServerSection::Unavailable => SERVER_UNREACHABLE,
    };
    let block = DeviceSectionBlock {
        name: &device.name,
        codename: &device.codename,
        has_unlisted: !unlisted_html.is_empty(),
        removed_heading: REMOVED_HEADING,
        unlisted_html,
        server_heading: SERVER_HEADING,
        server_body,
    };
    render_block(&block, "device section")
}
