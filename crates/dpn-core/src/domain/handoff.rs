//! The single-slot file handoff record.
//!
//! The handoff slot holds at most one [`FileRecord`].  It models a two-party
//! exchange: whoever uploaded the record cannot fetch it back, only a
//! *different* identity can.  The slot itself (storage and policy) lives in
//! `dpn-console`; this module defines the record and the reasons a fetch can
//! come back empty.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback MIME type for unknown extensions.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Metadata of the file currently held in the handoff slot.
///
/// Only metadata is handed off; file contents never leave the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub uploader_identity: String,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    /// Builds a record stamped with the current UTC time.
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
        uploader_identity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
            uploader_identity: uploader_identity.into(),
            uploaded_at: Utc::now(),
        }
    }

    /// Returns `true` if `identity` uploaded this record.
    pub fn is_uploaded_by(&self, identity: &str) -> bool {
        self.uploader_identity == identity
    }
}

/// Why a fetch from the handoff slot returned nothing.
///
/// Both cases are benign informational outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotAvailableReason {
    /// The slot holds no record.
    EmptySlot,
    /// The requester is the record's own uploader.
    OwnUpload,
}

/// Guesses a MIME type from the extension of `file_name`.
pub fn guess_mime_type(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",

        // Documents
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",

        // Archives
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",

        _ => DEFAULT_MIME_TYPE,
    }
    .to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_carries_uploader() {
        let record = FileRecord::new("report.pdf", 2048, "application/pdf", "alice@example.com");
        assert!(record.is_uploaded_by("alice@example.com"));
        assert!(!record.is_uploaded_by("bob@example.com"));
        assert_eq!(record.size_bytes, 2048);
    }

    #[test]
    fn test_uploader_comparison_is_exact() {
        let record = FileRecord::new("a.txt", 1, "text/plain", "alice@example.com");
        assert!(!record.is_uploaded_by("Alice@example.com"));
        assert!(!record.is_uploaded_by(""));
    }

    #[test]
    fn test_record_serializes_as_one_json_object() {
        // Arrange
        let record = FileRecord::new("notes.md", 12, "text/markdown", "bob@example.com");

        // Act
        let json = serde_json::to_string(&record).expect("serialize");
        let restored: FileRecord = serde_json::from_str(&json).expect("deserialize");

        // Assert
        assert_eq!(record, restored);
        assert!(json.contains("\"uploader_identity\":\"bob@example.com\""));
    }

    #[test]
    fn test_guess_mime_type_known_extensions() {
        assert_eq!(guess_mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(guess_mime_type("doc.pdf"), "application/pdf");
        assert_eq!(guess_mime_type("/tmp/archive.tar.gz"), "application/gzip");
    }

    #[test]
    fn test_guess_mime_type_unknown_or_missing_extension() {
        assert_eq!(guess_mime_type("binary.xyz"), DEFAULT_MIME_TYPE);
        assert_eq!(guess_mime_type("Makefile"), DEFAULT_MIME_TYPE);
    }
}
