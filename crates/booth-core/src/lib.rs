//! booth-core — face-anchored overlay layout, compositing and interaction.
//!
//! Detections from an external face detector drive per-face accessory slots
//! and text. The compositor renders the state to draw commands and a layout
//! cache, which pointer handlers hit-test against.

pub mod anchor;
pub mod compositor;
pub mod config;
pub mod drawing;
pub mod error;
pub mod filter;
pub mod frame_loop;
pub mod interaction;
pub mod layout;
pub mod overlay;
pub mod state;
pub mod text_command;
pub mod types;

pub use compositor::{render, DrawCommand, RenderOutput};
pub use config::{BoothConfig, TrashMode};
pub use error::BoothError;
pub use filter::Filter;
pub use frame_loop::{DetectorError, FaceDetector, FrameLoop, Tick};
pub use interaction::{Cursor, Release, TextEdit};
pub use layout::{ApproxTextMeasurer, TextMeasurer};
pub use overlay::{AccessorySelection, ElementKey, TextStyle};
pub use state::BoothState;
pub use types::{AccessoryKind, BoundingBox, CanvasSize, Detection, Keypoint, Point};
