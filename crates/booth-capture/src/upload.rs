//! Upload collaborator seam and the metadata sent with each photo.

use booth_core::overlay::AbsoluteText;
use booth_core::{AccessorySelection, BoothState, Filter};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UploadError {
    #[error("upload rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response carried no photo id")]
    MissingId,
}

/// Descriptive fields sent alongside the PNG.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    pub accessories: AccessorySelection,
    pub filter: Filter,
    pub has_drawing: bool,
    pub text_overlays: Vec<AbsoluteText>,
    /// Absolute plus face-relative text.
    pub text_count: usize,
}

impl UploadMetadata {
    pub fn from_state(state: &BoothState) -> Self {
        let overlays = state.overlays();
        Self {
            accessories: state.accessories().clone(),
            filter: state.filter(),
            has_drawing: state.drawing().has_drawing(),
            text_overlays: overlays.absolute_texts().to_vec(),
            text_count: overlays.text_count(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub photo_id: String,
    #[serde(default)]
    pub filename: Option<String>,
}

impl UploadReceipt {
    /// Parse a collaborator response. Only the presence of an id is checked.
    pub fn from_json(body: &str) -> Result<Self, UploadError> {
        let receipt: UploadReceipt =
            serde_json::from_str(body).map_err(|e| UploadError::Transport(format!("bad response: {e}")))?;
        receipt.validated()
    }

    pub(crate) fn validated(self) -> Result<Self, UploadError> {
        if self.photo_id.trim().is_empty() {
            return Err(UploadError::MissingId);
        }
        Ok(self)
    }
}

/// Receives the flattened PNG. Implementations own transport and retries.
pub trait UploadSink {
    fn upload(&mut self, png: &[u8], metadata: &UploadMetadata) -> Result<UploadReceipt, UploadError>;
}
