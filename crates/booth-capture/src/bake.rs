//! Bake a filter chain into pixels.
//!
//! Colour primitives use the Filter Effects 1 matrices and operate on
//! non-premultiplied sRGB channels in `0.0..=1.0`, clamping after every
//! primitive. Alpha is never touched except by blur.

use booth_core::filter::{Filter, FilterOp};
use image::RgbaImage;

/// Row-major 3x3 colour matrix plus a constant added to every channel.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColorTransform {
    m: [[f32; 3]; 3],
    offset: f32,
}

impl ColorTransform {
    fn matrix(m: [[f32; 3]; 3]) -> Self {
        Self { m, offset: 0.0 }
    }

    fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        let mut out = [0.0; 3];
        for (row, value) in self.m.iter().zip(out.iter_mut()) {
            let v = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2] + self.offset;
            *value = v.clamp(0.0, 1.0);
        }
        out
    }
}

fn sepia(amount: f32) -> ColorTransform {
    let inv = 1.0 - amount.clamp(0.0, 1.0);
    ColorTransform::matrix([
        [0.393 + 0.607 * inv, 0.769 - 0.769 * inv, 0.189 - 0.189 * inv],
        [0.349 - 0.349 * inv, 0.686 + 0.314 * inv, 0.168 - 0.168 * inv],
        [0.272 - 0.272 * inv, 0.534 - 0.534 * inv, 0.131 + 0.869 * inv],
    ])
}

fn grayscale(amount: f32) -> ColorTransform {
    let inv = 1.0 - amount.clamp(0.0, 1.0);
    ColorTransform::matrix([
        [0.2126 + 0.7874 * inv, 0.7152 - 0.7152 * inv, 0.0722 - 0.0722 * inv],
        [0.2126 - 0.2126 * inv, 0.7152 + 0.2848 * inv, 0.0722 - 0.0722 * inv],
        [0.2126 - 0.2126 * inv, 0.7152 - 0.7152 * inv, 0.0722 + 0.9278 * inv],
    ])
}

fn saturate(s: f32) -> ColorTransform {
    let s = s.max(0.0);
    ColorTransform::matrix([
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ])
}

fn hue_rotate(degrees: f32) -> ColorTransform {
    let (sin, cos) = degrees.to_radians().sin_cos();
    ColorTransform::matrix([
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ])
}

fn diagonal(slope: f32, offset: f32) -> ColorTransform {
    ColorTransform { m: [[slope, 0.0, 0.0], [0.0, slope, 0.0], [0.0, 0.0, slope]], offset }
}

fn color_transform(op: FilterOp) -> Option<ColorTransform> {
    match op {
        FilterOp::Sepia(a) => Some(sepia(a)),
        FilterOp::Grayscale(a) => Some(grayscale(a)),
        FilterOp::Saturate(s) => Some(saturate(s)),
        FilterOp::HueRotate(deg) => Some(hue_rotate(deg)),
        FilterOp::Brightness(b) => Some(diagonal(b.max(0.0), 0.0)),
        FilterOp::Contrast(c) => {
            let c = c.max(0.0);
            Some(diagonal(c, 0.5 - 0.5 * c))
        }
        FilterOp::Blur(_) => None,
    }
}

fn apply_color(image: &mut RgbaImage, transform: &ColorTransform) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        let rgb = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];
        let out = transform.apply(rgb);
        for (channel, value) in pixel.0.iter_mut().zip(out) {
            *channel = (value * 255.0).round() as u8;
        }
    }
}

/// Apply one primitive.
pub fn apply_op(image: &mut RgbaImage, op: FilterOp) {
    match op {
        FilterOp::Blur(sigma) => {
            if sigma > 0.0 {
                *image = image::imageops::blur(&*image, sigma);
            }
        }
        other => {
            if let Some(transform) = color_transform(other) {
                apply_color(image, &transform);
            }
        }
    }
}

/// Apply a catalogue filter's whole chain in order. `Filter::None` leaves the image untouched.
pub fn bake_filter(image: &mut RgbaImage, filter: Filter) {
    let ops = filter.ops();
    if ops.is_empty() {
        return;
    }
    for op in ops {
        apply_op(image, *op);
    }
    tracing::debug!(filter = filter.name(), primitives = ops.len(), "filter baked");
}
