use crate::api::error::AppError;
use axum::http::{HeaderMap, header};
use std::fmt;

/// Longest on-disk name we accept, in bytes.
const MAX_FILENAME_BYTES: usize = 255;

/// A client filename reduced to a single, separator-free path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedFilename(String);

impl SanitizedFilename {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SanitizedFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sanitizes filename to prevent path traversal.
/// Keeps only the final path component; rejects names that end up empty.
pub fn sanitize_filename(raw: &str) -> Result<SanitizedFilename, AppError> {
    // Both separators are stripped so Windows-style names can't smuggle a path either
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();

    if raw.contains("..") || raw.contains('/') || raw.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", raw);
    }

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::MalformedRequest(
            "Filename is required.".to_string(),
        ));
    }

    let sanitized: String = name
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_BYTES {
        let mut end = MAX_FILENAME_BYTES;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    Ok(SanitizedFilename(sanitized))
}

/// Fast-rejects requests whose declared `Content-Length` already exceeds the ceiling.
///
/// Returns `Ok(None)` when the header is absent; the streaming check is the
/// only authoritative limit either way.
pub fn precheck_content_length(headers: &HeaderMap, max_bytes: u64) -> Result<Option<u64>, AppError> {
    let Some(value) = headers.get(header::CONTENT_LENGTH) else {
        return Ok(None);
    };

    let size: u64 = value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| AppError::MalformedRequest("Invalid Content-Length header.".to_string()))?;

    if size > max_bytes {
        tracing::warn!(
            "Rejecting upload early: declared {} bytes exceeds {} bytes",
            size,
            max_bytes
        );
        return Err(AppError::PayloadTooLarge { max_bytes });
    }

    Ok(Some(size))
}
