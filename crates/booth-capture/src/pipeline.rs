//! Capture: flatten the current booth state over a video frame, encode it,
//! and optionally hand it to the upload collaborator.

use crate::composite::{composite, encode_png, CaptureError, Layers};
use crate::raster::rasterize_strokes;
use crate::upload::{UploadError, UploadMetadata, UploadReceipt, UploadSink};
use booth_core::BoothState;
use image::RgbaImage;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadStatus {
    /// Auto-upload is off or no sink was given.
    Skipped,
    /// Another upload is still in flight; it was not restarted.
    InProgress,
    Uploaded(UploadReceipt),
    /// The composite is kept and can be uploaded again.
    Failed(UploadError),
}

#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub image: RgbaImage,
    pub png: Vec<u8>,
    pub metadata: UploadMetadata,
    pub upload: UploadStatus,
}

/// Holds the most recent capture so a failed upload can be retried.
#[derive(Debug)]
pub struct CapturePipeline {
    auto_upload: bool,
    uploading: bool,
    last: Option<(Vec<u8>, UploadMetadata)>,
    last_receipt: Option<UploadReceipt>,
}

impl CapturePipeline {
    pub fn new(auto_upload: bool) -> Self {
        Self { auto_upload, uploading: false, last: None, last_receipt: None }
    }

    pub fn from_state(state: &BoothState) -> Self {
        Self::new(state.config().auto_upload)
    }

    /// Flatten `video` (filtered), `overlay` and the state's freehand strokes.
    ///
    /// The overlay must already be at the video's resolution. Strokes are
    /// recorded in overlay canvas space and scaled to the video.
    pub fn capture(
        &mut self,
        state: &BoothState,
        video: &RgbaImage,
        overlay: Option<&RgbaImage>,
        sink: Option<&mut dyn UploadSink>,
    ) -> Result<CaptureOutcome, CaptureError> {
        let (width, height) = video.dimensions();
        let canvas = state.canvas();
        let scale = if canvas.width > 0.0 && canvas.height > 0.0 {
            (width as f32 / canvas.width, height as f32 / canvas.height)
        } else {
            (1.0, 1.0)
        };

        let drawing = if state.drawing().has_drawing() {
            Some(rasterize_strokes(state.drawing().strokes(), width, height, scale))
        } else {
            None
        };
        let layers = Layers { video, overlay, drawing: drawing.as_ref() };
        let image = composite(&layers, state.filter())?;
        let png = encode_png(&image)?;
        let metadata = UploadMetadata::from_state(state);
        tracing::info!(width, height, filter = %state.filter(), bytes = png.len(), "capture complete");

        self.last = Some((png.clone(), metadata.clone()));
        let upload = match sink {
            Some(sink) if self.auto_upload => self.upload_last(sink),
            _ => UploadStatus::Skipped,
        };
        Ok(CaptureOutcome { image, png, metadata, upload })
    }

    /// Upload the most recent capture. Used for auto-upload and manual retry.
    pub fn upload_last(&mut self, sink: &mut dyn UploadSink) -> UploadStatus {
        let Some((png, metadata)) = self.begin_upload() else {
            return if self.uploading { UploadStatus::InProgress } else { UploadStatus::Skipped };
        };
        let result = sink.upload(&png, &metadata);
        self.finish_upload(result)
    }

    /// Claim the upload slot and return the payload. `None` while an upload
    /// is in flight or before anything was captured.
    pub fn begin_upload(&mut self) -> Option<(Vec<u8>, UploadMetadata)> {
        if self.uploading {
            tracing::debug!("upload already in progress");
            return None;
        }
        let payload = self.last.clone()?;
        self.uploading = true;
        Some(payload)
    }

    /// Release the slot claimed by [`CapturePipeline::begin_upload`].
    pub fn finish_upload(&mut self, result: Result<UploadReceipt, UploadError>) -> UploadStatus {
        self.uploading = false;
        match result.and_then(UploadReceipt::validated) {
            Ok(receipt) => {
                tracing::info!(photo_id = %receipt.photo_id, "photo uploaded");
                self.last_receipt = Some(receipt.clone());
                UploadStatus::Uploaded(receipt)
            }
            Err(e) => {
                tracing::warn!(error = %e, "upload failed, capture kept for retry");
                UploadStatus::Failed(e)
            }
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn has_capture(&self) -> bool {
        self.last.is_some()
    }

    pub fn last_receipt(&self) -> Option<&UploadReceipt> {
        self.last_receipt.as_ref()
    }
}
