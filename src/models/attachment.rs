//! Attachment models: files already on the server, files picked locally,
//! and the per-file status shown by the attachment widget.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An attachment stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "kommentti")]
    pub comment_id: i64,
    /// Server-side file identifier.
    #[serde(rename = "tiedosto")]
    pub file_id: String,
    #[serde(rename = "nimi")]
    pub filename: String,
    #[serde(rename = "koko", default)]
    pub size: u64,
}

/// A file picked by the user, not uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub content: Arc<Vec<u8>>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: Arc::new(content),
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Display status of one file in the attachment widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub filename: String,
    pub size: u64,
    /// Validation error; files with one are never uploaded.
    pub error: Option<String>,
    /// Upload progress in percent.
    pub progress: Option<u8>,
    pub upload_error: Option<String>,
    pub done: bool,
}

/// Progress events of a single upload, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadEvent {
    /// The request was handed to the transport.
    Sent,
    /// Share of the body streamed so far, in percent.
    Progress(u8),
    /// The backend answered with this status.
    HeadersReceived(u16),
    /// The upload was accepted.
    Complete,
}
