//! Freehand stroke rasterization with a round brush.

use crate::composite::CaptureError;
use booth_core::drawing::Stroke;
use booth_core::Point;
use image::{Rgba, RgbaImage};

/// Used for strokes whose colour does not parse.
pub const FALLBACK_BRUSH: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>, CaptureError> {
    let invalid = || CaptureError::InvalidColor(value.to_string());
    let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    match hex.len() {
        3 => {
            let mut out = [0u8, 0, 0, 255];
            for (i, c) in hex.chars().enumerate() {
                let nibble = c.to_digit(16).ok_or_else(invalid)? as u8;
                out[i] = nibble * 17;
            }
            Ok(Rgba(out))
        }
        6 => Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => Err(invalid()),
    }
}

/// Fill a disc, clipped to the image.
fn stamp(image: &mut RgbaImage, center: Point, radius: f32, color: Rgba<u8>) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let r = radius.max(0.5);
    let x0 = ((center.x - r).floor() as i64).max(0);
    let x1 = ((center.x + r).ceil() as i64).min(w - 1);
    let y0 = ((center.y - r).floor() as i64).max(0);
    let y1 = ((center.y + r).ceil() as i64).min(h - 1);
    let r2 = r * r;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - center.x;
            let dy = y as f32 + 0.5 - center.y;
            if dx * dx + dy * dy <= r2 {
                image.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Stamp discs along a segment, spaced so consecutive stamps overlap.
fn stamp_segment(image: &mut RgbaImage, from: Point, to: Point, radius: f32, color: Rgba<u8>) {
    let length = from.distance_to(&to);
    let spacing = (radius * 0.5).max(0.5);
    let steps = (length / spacing).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let p = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
        stamp(image, p, radius, color);
    }
}

/// Rasterize strokes onto a transparent layer. Points are scaled by `(sx, sy)`
/// to map overlay canvas space onto the output resolution. A stroke with an
/// unparseable colour is drawn in [`FALLBACK_BRUSH`].
pub fn rasterize_strokes(strokes: &[Stroke], width: u32, height: u32, scale: (f32, f32)) -> RgbaImage {
    let mut layer = RgbaImage::new(width, height);
    let (sx, sy) = scale;
    for stroke in strokes {
        let color = parse_hex_color(&stroke.color).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stroke colour unusable, drawing in black");
            FALLBACK_BRUSH
        });
        let radius = stroke.width * 0.5 * sx.max(sy);
        let mut points = stroke.points.iter().map(|p| Point::new(p.x * sx, p.y * sy));
        let Some(mut prev) = points.next() else {
            continue;
        };
        stamp(&mut layer, prev, radius, color);
        for next in points {
            stamp_segment(&mut layer, prev, next, radius, color);
            prev = next;
        }
    }
    layer
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(color: &str, width: f32, points: &[(f32, f32)]) -> Stroke {
        Stroke { color: color.into(), width, points: points.iter().map(|&(x, y)| Point::new(x, y)).collect() }
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#000000").unwrap(), Rgba([0, 0, 0, 255]));
        assert_eq!(parse_hex_color("#f44336").unwrap(), Rgba([0xf4, 0x43, 0x36, 255]));
        assert_eq!(parse_hex_color("#fff").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_hex_color("#ff000080").unwrap(), Rgba([255, 0, 0, 0x80]));
        assert!(parse_hex_color("red").is_err());
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }

    #[test]
    fn test_single_point_is_dot() {
        let layer = rasterize_strokes(&[stroke("#ff0000", 10.0, &[(20.0, 20.0)])], 40, 40, (1.0, 1.0));
        assert_eq!(layer.get_pixel(20, 20).0, [255, 0, 0, 255]);
        assert_eq!(layer.get_pixel(20, 30).0[3], 0);
        assert_eq!(layer.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_segment_is_continuous() {
        let layer = rasterize_strokes(&[stroke("#000000", 4.0, &[(2.0, 10.0), (38.0, 10.0)])], 40, 20, (1.0, 1.0));
        for x in 2..38 {
            assert_eq!(layer.get_pixel(x, 10).0[3], 255, "gap at x={x}");
        }
        assert_eq!(layer.get_pixel(20, 16).0[3], 0);
    }

    #[test]
    fn test_scale_and_clip() {
        let layer = rasterize_strokes(&[stroke("#00ff00", 4.0, &[(10.0, 5.0), (200.0, 5.0)])], 40, 20, (2.0, 2.0));
        assert_eq!(layer.get_pixel(20, 10).0, [0, 255, 0, 255]);
        assert_eq!(layer.get_pixel(39, 10).0, [0, 255, 0, 255]);
        assert_eq!(layer.get_pixel(10, 10).0[3], 0);
    }

    #[test]
    fn test_named_color_falls_back_to_black() {
        let layer = rasterize_strokes(
            &[stroke("blue", 4.0, &[(4.0, 4.0)]), stroke("#00ff00", 2.0, &[(12.0, 4.0)])],
            16,
            8,
            (1.0, 1.0),
        );
        assert_eq!(layer.get_pixel(4, 4).0, FALLBACK_BRUSH.0);
        assert_eq!(layer.get_pixel(12, 4).0, [0, 255, 0, 255]);
    }
}
