//! Device-mockup compositing.
//!
//! `frameshot` places a screenshot into a device frame (or a frameless,
//! rounded presentation), honoring the frame's screen geometry, and
//! renders a final surface with background, drop shadow, padding and
//! output-aspect presets. Surfaces export to PNG, JPEG or WebP, to the
//! system clipboard, or to a bounded preview.
//!
//! The usual flow: load a [`DeviceCatalog`], look up a [`DeviceFrame`],
//! feed it to a [`RenderSession`] together with a screenshot and an
//! [`AppearanceConfig`], then [`RenderSession::render`] and hand the
//! surface to [`export`].

#![forbid(unsafe_code)]

pub mod appearance;
pub mod catalog;
pub mod clip;
pub mod color;
pub mod content;
pub mod error;
pub mod export;
pub mod geometry;
pub mod output;
pub mod raster;
pub mod session;

mod blur;

/// High-level, standalone documentation for Frameshot's concepts and architecture.
pub mod guide;

pub use appearance::{AppearanceConfig, BackgroundConfig, OutputAspect, RotationDeg, ShadowConfig};
pub use catalog::{DeviceCatalog, DeviceFrame, Orientation};
pub use clip::Clip;
pub use color::Color;
pub use error::{FrameshotError, FrameshotResult};
pub use export::{ClipboardWrite, ExportFormat};
pub use geometry::Bounds;
pub use raster::Raster;
pub use session::{LoadedFrame, Present, RenderSession, RenderTicket};
