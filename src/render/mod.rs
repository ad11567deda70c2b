//! Matrix serializers
//!
//! XML is the artifact consumed by the device build; JSON mirrors the data
//! model for tooling. The digest is taken over the RFC 8785 canonical JSON
//! form, so two runs over the same inputs can be compared byte for byte.

mod xml;

pub use xml::{escape, render_xml};

use sha2::{Digest, Sha256};
use vintf_types::AssembledMatrix;

use crate::config::OutputFormat;

/// Serialization errors
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JCS canonicalization error: {0}")]
    Canonical(String),
}

/// Pretty-printed JSON form of the matrix.
pub fn render_json(matrix: &AssembledMatrix) -> Result<String, RenderError> {
    let mut out = serde_json::to_string_pretty(matrix)?;
    out.push('\n');
    Ok(out)
}

/// Render in the requested output format.
pub fn render(matrix: &AssembledMatrix, format: OutputFormat) -> Result<String, RenderError> {
    match format {
        OutputFormat::Xml => Ok(render_xml(matrix)),
        OutputFormat::Json => render_json(matrix),
    }
}

/// SHA-256 hex digest of the JCS (RFC 8785) form of the matrix.
pub fn matrix_digest(matrix: &AssembledMatrix) -> Result<String, RenderError> {
    let jcs_bytes = serde_json_canonicalizer::to_vec(matrix)
        .map_err(|e| RenderError::Canonical(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(&jcs_bytes);
    Ok(hex::encode(hasher.finalize()))
}
