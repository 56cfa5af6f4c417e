//! Uploaded source material
//!
//! The raw document is kept with its workspace so later enrichment stages
//! can send the original material back to the model.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw uploaded content
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Original filename
    pub name: String,
    /// MIME type sent along with the bytes
    pub mime_type: String,
    /// File contents
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Attachment {
    /// Create attachment from raw bytes
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Create attachment, guessing the MIME type from the filename
    #[must_use]
    pub fn with_guessed_mime(name: impl Into<String>, data: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = guess_mime(&name).to_string();
        Self {
            name,
            mime_type,
            data,
        }
    }

    /// Size of the payload in bytes
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Payload as standard base64, the form the model API expects
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// Document kind inferred from the filename
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FileKind {
        FileKind::from_name(&self.name)
    }

    /// Display subject: the filename without its final extension
    #[must_use]
    pub fn subject(&self) -> String {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => self.name[..idx].to_string(),
            _ => self.name.clone(),
        }
    }
}

// Bytes are elided; attachments can be several megabytes.
impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Document kind shown next to the workspace name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// PDF document
    Pdf,
    /// Slide deck
    Ppt,
    /// Anything else, treated as text
    Txt,
}

impl FileKind {
    /// Infer kind from a filename (case-insensitive extension match)
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.ends_with(".ppt") || lower.ends_with(".pptx") {
            FileKind::Ppt
        } else if lower.ends_with(".pdf") {
            FileKind::Pdf
        } else {
            FileKind::Txt
        }
    }

    /// Short lowercase label
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Ppt => "ppt",
            FileKind::Txt => "txt",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// MIME type for a filename, `application/octet-stream` when unknown
#[must_use]
pub fn guess_mime(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => "application/octet-stream",
    }
}

mod base64_bytes {
    use super::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
