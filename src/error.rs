/*============================================================
  Synavera Project: Syn-OTA
  Module: synota_core::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-OTA error types so that fetch, load, render
    and write failures share one taxonomy and exit mapping.

  Security / Safety Notes:
    Error contexts carry URLs and local paths only; response
    bodies are never echoed back into diagnostics.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate failures and consolidate
    exit codes for the binary entry point.

  Revision History:
    2025-11-12 COD  Established report builder error taxonomy.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Stable exit codes for operational tooling
============================================================*/

use std::io;
use std::process::ExitCode;

use thiserror::Error;

/// Result alias for Syn-OTA operations.
pub type Result<T> = std::result::Result<T, OtaError>;

/// Enumerates high-level error domains surfaced by Syn-OTA.
#[derive(Debug, Error)]
pub enum OtaError {
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Network: {0}")]
    Network(String),
    #[error("Serialization: {0}")]
    Serialization(String),
    #[error("Decode: {0}")]
    Decode(String),
    #[error("Update chain for `{device}` revisited incremental `{label}`")]
    ChainCycle { device: String, label: String },
    #[error("Update chain for `{device}` exceeded {limit} builds")]
    ChainTooDeep { device: String, limit: usize },
    #[error("Render: {0}")]
    Render(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl OtaError {
    /// Map error category to a deterministic exit code.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }

    fn code(&self) -> u8 {
        match self {
            OtaError::Config(_) => 20,
            OtaError::Network(_) => 30,
            OtaError::Serialization(_) => 31,
            OtaError::Decode(_) => 32,
            OtaError::ChainCycle { .. } => 33,
            OtaError::ChainTooDeep { .. } => 34,
            OtaError::Render(_) => 35,
            OtaError::Filesystem(_) => 40,
            OtaError::Io(_) => 41,
        }
    }
}
