//! # Frameshot guide (v0.1.0)
//!
//! This module is a standalone, end-to-end walkthrough of Frameshot's architecture and public
//! API. It is intentionally detailed so integrations (and future features) can build on a shared
//! mental model of what "a mockup" means in this codebase.
//!
//! If you are looking for copy/paste commands, start with the repository `README.md`.
//! If you are implementing new features, start here.
//!
//! ---
//!
//! ## Core concepts
//!
//! - [`DeviceCatalog`](crate::DeviceCatalog): the merged device listing (catalog feed + geometry
//!   database)
//! - [`DeviceFrame`](crate::DeviceFrame): one device entry, frame art filename plus declared
//!   screen geometry
//! - [`Bounds`](crate::Bounds): the resolved screen region, in frame pixels
//! - [`Clip`](crate::Clip): the screen mask (polygon, rounded rect, or plain rect)
//! - [`AppearanceConfig`](crate::AppearanceConfig): user-controlled presentation state
//! - [`RenderSession`](crate::RenderSession): inputs, a generation counter, and the presented
//!   surface
//! - [`Raster`](crate::Raster): pixels (RGBA8, premultiplied alpha)
//! - [`ExportFormat`](crate::ExportFormat): the encoded outputs (PNG, JPEG, WebP)
//!
//! The compose pipeline is explicitly staged:
//!
//! 1. Resolve screen geometry: [`geometry::resolve_bounds`](crate::geometry::resolve_bounds)
//! 2. Select the screen mask: [`clip::select_clip`](crate::clip::select_clip)
//! 3. Build the content layer: [`content::build_framed`](crate::content::build_framed) or
//!    [`content::build_frameless`](crate::content::build_frameless)
//! 4. Compose the output surface: [`output::compose`](crate::output::compose)
//! 5. Export: [`export::encode`](crate::export::encode), [`export::save`](crate::export::save),
//!    [`export::copy_to_clipboard`](crate::export::copy_to_clipboard)
//!
//! Steps (1)+(2) run once per device change, inside
//! [`RenderSession::load_frame`](crate::RenderSession::load_frame). Steps (3)+(4) run on every
//! input change, via [`RenderSession::render`](crate::RenderSession::render).
//!
//! ---
//!
//! ## Premultiplied alpha (Frameshot's pixel contract)
//!
//! Frameshot's internal and output pixel convention is **premultiplied RGBA8**:
//!
//! - decoded images are premultiplied at ingest ([`Raster::decode`](crate::Raster::decode))
//! - every intermediate surface (content layer, shadow plate, output) is premultiplied
//! - the Gaussian shadow blur operates on premultiplied channels
//! - PNG/WebP export unpremultiplies at the encode boundary; JPEG flattens alpha over black,
//!   which premultiplied data already is
//!
//! If you consume [`Raster::data`](crate::Raster::data) directly, treat it as premultiplied
//! unless explicitly stated otherwise by the API.
//!
//! ---
//!
//! ## Where screen geometry comes from
//!
//! A device frame is a PNG with a transparent cutout where the screen goes. The declared
//! geometry in the catalog is optional and sometimes wrong, so resolution is a precedence chain:
//!
//! 1. a declared screen polygon (its bounding box becomes the [`Bounds`](crate::Bounds))
//! 2. a declared screen rect
//! 3. an alpha scan of the frame raster: a coarse stride-2 walk collecting the envelope of
//!    practically-transparent pixels
//! 4. a centered fallback covering 60% of the frame, when nothing transparent is found
//!
//! Degenerate inputs (empty polygon, fully opaque frame art) never error; they fall through to
//! the next source. The scan reads alpha straight off the [`Raster`](crate::Raster), no drawing
//! surface involved.
//!
//! Bezel corner rounding is estimated separately by
//! [`geometry::detect_corner_radius`](crate::geometry::detect_corner_radius): probes walk
//! diagonally inward from each bounds corner at decreasing radii until all four corners read
//! opaque bezel. A rectangular cutout yields 0.
//!
//! ---
//!
//! ## The screen mask
//!
//! [`clip::select_clip`](crate::clip::select_clip) picks the strongest mask the inputs support:
//!
//! - a declared polygon that is *not* an axis-aligned rectangle is used verbatim
//!   ([`Clip::Polygon`](crate::Clip))
//! - otherwise, a detected corner radius upgrades the bounds to
//!   [`Clip::RoundedRect`](crate::Clip)
//! - otherwise, [`Clip::Rect`](crate::Clip)
//!
//! Mask coordinates are frame-surface coordinates; path construction clamps them to the surface.
//! A polygon with fewer than three vertices degenerates to "no mask": the screenshot draws
//! unclipped rather than erroring.
//!
//! ---
//!
//! ## Sessions, tickets and staleness
//!
//! [`RenderSession`](crate::RenderSession) owns the inputs (frame, screenshot, background image,
//! appearance) and a monotonic generation counter. Every input change bumps the generation.
//!
//! A rebuild is three steps:
//!
//! - [`begin`](crate::RenderSession::begin) stamps a [`RenderTicket`](crate::RenderTicket)
//! - [`compose`](crate::RenderSession::compose) builds a fresh surface, pure with respect to
//!   session state
//! - [`present`](crate::RenderSession::present) installs it, unless the generation moved on, in
//!   which case the surface is discarded and [`Present::Stale`](crate::Present) is returned
//!
//! [`render`](crate::RenderSession::render) wraps the three for the common synchronous case. On
//! error the previously presented surface stays current, so a failed rebuild degrades to
//! stale-but-consistent output instead of a blank one.
//!
//! ---
//!
//! ## Building a mockup (no device frame needed)
//!
//! The frameless mode needs no external files at all, which makes it the shortest end-to-end
//! example:
//!
//! ```rust,no_run
//! use frameshot::{AppearanceConfig, ExportFormat, Raster, RenderSession, export};
//!
//! # fn main() -> frameshot::FrameshotResult<()> {
//! // 64x32 opaque blue, already premultiplied (alpha is 255 everywhere).
//! let shot = Raster::from_premul_bytes(64, 32, [30u8, 144, 255, 255].repeat(64 * 32))?;
//!
//! let mut session = RenderSession::new();
//! session.set_screenshot(Some(shot));
//! session.set_appearance(AppearanceConfig {
//!     frameless: true,
//!     corner_radius_px: 8,
//!     padding_px: 32,
//!     ..AppearanceConfig::default()
//! })?;
//!
//! let surface = session.render()?;
//! assert_eq!((surface.width(), surface.height()), (128, 96));
//! assert_eq!(surface.data().len(), 128 * 96 * 4);
//!
//! let png = export::encode(surface, ExportFormat::Png)?;
//! assert!(!png.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! Notes:
//!
//! - [`RenderSession::set_appearance`](crate::RenderSession::set_appearance) validates; a
//!   rejected config leaves the session untouched.
//! - The framed path is the same shape: [`DeviceCatalog::load`](crate::DeviceCatalog::load),
//!   [`lookup`](crate::DeviceCatalog::lookup), [`Raster::open`](crate::Raster::open) the frame
//!   art, then [`RenderSession::load_frame`](crate::RenderSession::load_frame).
//!
//! ---
//!
//! ## Sizing: padding and aspect presets
//!
//! The output envelope is `max(1, content + 2 * padding)` per axis. Padding may be negative, in
//! which case the content overflows and is center-cropped.
//!
//! An [`OutputAspect`](crate::OutputAspect) preset only ever *grows* a dimension: height is
//! pinned to the envelope, width follows the ratio, and if that undershoots the envelope the
//! correction goes the other way. The envelope is never shrunk to meet a ratio.
//!
//! Draw order within the output surface is fixed: background (cover-fit image or flat fill),
//! then the blurred shadow plate, then the content layer centered on top.
//!
//! ---
//!
//! ## Export surface
//!
//! - [`export::encode`](crate::export::encode): PNG and WebP are lossless with alpha; JPEG is
//!   opaque at a fixed quality with no user-facing knob
//! - [`export::save`](crate::export::save): encode plus write, creating parent directories
//! - [`export::export_filename`](crate::export::export_filename):
//!   `{brand}-{model}-{orientation}.{ext}`, or `mockup.{ext}` without a frame
//! - [`export::copy_to_clipboard`](crate::export::copy_to_clipboard): native image write first,
//!   then a base64 `data:` URL as clipboard text; [`ClipboardWrite`](crate::ClipboardWrite)
//!   reports which path was taken. Only when both fail does the call error.
//! - [`export::render_preview`](crate::export::render_preview): contain-fit into a bounded
//!   viewport, never upscaling
