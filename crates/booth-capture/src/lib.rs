//! booth-capture — flatten a booth frame into a photo and hand it off.
//!
//! Bakes the selected colour filter into the video frame, layers the overlay
//! and freehand drawing on top, encodes PNG and drives the upload seam.

pub mod bake;
pub mod composite;
pub mod pipeline;
pub mod raster;
pub mod upload;

pub use bake::bake_filter;
pub use composite::{composite, encode_png, CaptureError, Layers};
pub use pipeline::{CaptureOutcome, CapturePipeline, UploadStatus};
pub use raster::{parse_hex_color, rasterize_strokes, FALLBACK_BRUSH};
pub use upload::{UploadError, UploadMetadata, UploadReceipt, UploadSink};
