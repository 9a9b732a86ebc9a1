//! Document Extractor — uploaded PDF bytes to plain text.
//!
//! Extraction failures are never fatal to the wizard: the caller downgrades
//! them to a warning and proceeds with no prior-report context.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not extract text from document: {0}")]
    Malformed(#[from] pdf_extract::OutputError),
}

/// Extracts plain text from an uploaded PDF held in memory.
///
/// Returns the empty string when the document parses but contains no
/// extractable text (scans, image-only pages).
pub fn extract_pdf_text(document: &[u8]) -> Result<String, ExtractError> {
    let text = pdf_extract::extract_text_from_mem(document)?;
    Ok(text)
}
