//! File-backed stand-ins for the hosted collaborators.

use booth_capture::{UploadError, UploadMetadata, UploadReceipt, UploadSink};
use booth_core::filter::{FilterInterpreter, FilterSuggestion};
use booth_core::text_command::{InterpretError, TextInterpreter, TextSuggestion};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// Answers every text command with a canned collaborator reply.
pub struct CannedText(pub String);

impl TextInterpreter for CannedText {
    fn interpret(&self, _command: &str) -> Result<TextSuggestion, InterpretError> {
        TextSuggestion::from_json(&self.0)
    }
}

/// Answers every filter description with a canned collaborator reply.
pub struct CannedFilter(pub String);

impl FilterInterpreter for CannedFilter {
    fn describe(&self, _description: &str) -> Result<FilterSuggestion, InterpretError> {
        serde_json::from_str(&self.0).map_err(|e| InterpretError::Malformed(e.to_string()))
    }
}

/// Stores uploads as `<id>.png` plus `<id>.json` metadata in a directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl UploadSink for DirectorySink {
    fn upload(&mut self, png: &[u8], metadata: &UploadMetadata) -> Result<UploadReceipt, UploadError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let photo_id = format!("photo-{millis}");
        let filename = format!("{photo_id}.png");

        let transport = |e: std::io::Error| UploadError::Transport(e.to_string());
        std::fs::create_dir_all(&self.dir).map_err(transport)?;
        std::fs::write(self.dir.join(&filename), png).map_err(transport)?;
        let json = metadata.to_json().map_err(|e| UploadError::Transport(e.to_string()))?;
        std::fs::write(self.dir.join(format!("{photo_id}.json")), json).map_err(transport)?;

        tracing::info!(dir = %self.dir.display(), %photo_id, "photo stored");
        Ok(UploadReceipt { photo_id, filename: Some(filename) })
    }
}
