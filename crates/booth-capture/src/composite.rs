//! Flatten video, overlay and drawing layers into one raster.

use crate::bake::bake_filter;
use booth_core::Filter;
use image::RgbaImage;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("{layer} layer is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        layer: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("video frame is empty")]
    EmptyFrame,
    #[error("invalid colour: {0}")]
    InvalidColor(String),
    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// The three capture sources. Overlay and drawing must match the video's
/// native resolution; either may be absent.
#[derive(Debug, Clone, Copy)]
pub struct Layers<'a> {
    pub video: &'a RgbaImage,
    pub overlay: Option<&'a RgbaImage>,
    pub drawing: Option<&'a RgbaImage>,
}

impl<'a> Layers<'a> {
    pub fn new(video: &'a RgbaImage) -> Self {
        Self { video, overlay: None, drawing: None }
    }

    fn check(&self) -> Result<(), CaptureError> {
        let expected = self.video.dimensions();
        if expected.0 == 0 || expected.1 == 0 {
            return Err(CaptureError::EmptyFrame);
        }
        for (layer, image) in [("overlay", self.overlay), ("drawing", self.drawing)] {
            if let Some(image) = image {
                if image.dimensions() != expected {
                    return Err(CaptureError::DimensionMismatch { layer, expected, actual: image.dimensions() });
                }
            }
        }
        Ok(())
    }
}

/// Bake `filter` into a copy of the video frame, then alpha-blend the overlay
/// and drawing on top, unfiltered.
pub fn composite(layers: &Layers, filter: Filter) -> Result<RgbaImage, CaptureError> {
    layers.check()?;
    let mut out = layers.video.clone();
    bake_filter(&mut out, filter);
    if let Some(overlay) = layers.overlay {
        image::imageops::overlay(&mut out, overlay, 0, 0);
    }
    if let Some(drawing) = layers.drawing {
        image::imageops::overlay(&mut out, drawing, 0, 0);
    }
    Ok(out)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}
