use booth_core::overlay::TextStyle;
use booth_core::{BoothConfig, CanvasSize, TrashMode};

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Booth tunables handed to `BoothState`.
    pub booth: BoothConfig,
    /// Overlay canvas size used when a script does not set one (default 640x480).
    pub canvas: CanvasSize,
}

impl Config {
    /// Load configuration from `BOOTH_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let defaults = BoothConfig::default();
        let text_style = TextStyle {
            color: env_string("BOOTH_TEXT_COLOR", &defaults.text_style.color),
            font_size: env_f32("BOOTH_TEXT_SIZE", defaults.text_style.font_size),
            font_family: env_string("BOOTH_TEXT_FONT", &defaults.text_style.font_family),
        };

        let trash_mode = match std::env::var("BOOTH_TRASH_MODE") {
            Ok(v) => v.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring BOOTH_TRASH_MODE");
                TrashMode::default()
            }),
            Err(_) => defaults.trash_mode,
        };

        let booth = BoothConfig {
            text_style,
            trash_mode,
            show_boxes: env_bool("BOOTH_SHOW_BOXES", defaults.show_boxes),
            min_handle_radius: env_f32("BOOTH_HANDLE_RADIUS", defaults.min_handle_radius),
            evict_after_frames: std::env::var("BOOTH_EVICT_AFTER_FRAMES")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.evict_after_frames),
            auto_upload: env_bool("BOOTH_AUTO_UPLOAD", defaults.auto_upload),
            brush_color: env_string("BOOTH_BRUSH_COLOR", &defaults.brush_color),
            brush_size: env_f32("BOOTH_BRUSH_SIZE", defaults.brush_size),
        };

        Self {
            booth,
            canvas: CanvasSize {
                width: env_f32("BOOTH_CANVAS_WIDTH", 640.0),
                height: env_f32("BOOTH_CANVAS_HEIGHT", 480.0),
            },
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key).map(|v| v != "0" && v != "false").unwrap_or(default)
}
