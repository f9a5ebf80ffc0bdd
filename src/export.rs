use std::fs;
use std::path::Path;

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::codecs::{jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder};
use image::{ExtendedColorType, ImageEncoder as _};
use kurbo::Affine;

use crate::catalog::DeviceFrame;
use crate::error::{FrameshotError, FrameshotResult};
use crate::raster::{Raster, affine_to_cpu, render_surface, unpremultiply_rgba8};

/// Fixed encode quality for the lossy path. There is deliberately no
/// user-facing quality knob.
pub const JPEG_QUALITY: u8 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
        }
    }
}

/// Encode a surface.
///
/// PNG and WebP are lossless with alpha. JPEG drops alpha by compositing
/// over black, which premultiplied data already is.
#[tracing::instrument(skip(surface), fields(w = surface.width(), h = surface.height()))]
pub fn encode(surface: &Raster, format: ExportFormat) -> FrameshotResult<Vec<u8>> {
    let w = surface.width();
    let h = surface.height();
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            let rgba = unpremultiply_rgba8(surface.data());
            PngEncoder::new(&mut out)
                .write_image(&rgba, w, h, ExtendedColorType::Rgba8)
                .context("encode png")?;
        }
        ExportFormat::Jpeg => {
            let rgb = premul_rgb(surface.data());
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
                .encode(&rgb, w, h, ExtendedColorType::Rgb8)
                .context("encode jpeg")?;
        }
        ExportFormat::Webp => {
            let rgba = unpremultiply_rgba8(surface.data());
            WebPEncoder::new_lossless(&mut out)
                .encode(&rgba, w, h, ExtendedColorType::Rgba8)
                .context("encode webp")?;
        }
    }
    Ok(out)
}

/// The encoded surface as a `data:` URL, the clipboard text fallback.
pub fn data_url(surface: &Raster, format: ExportFormat) -> FrameshotResult<String> {
    let bytes = encode(surface, format)?;
    Ok(format!(
        "data:{};base64,{}",
        format.mime(),
        BASE64.encode(bytes)
    ))
}

/// `{brand}-{model}-{orientation}.{ext}`, or `mockup.{ext}` for frameless
/// output with no device frame.
pub fn export_filename(frame: Option<&DeviceFrame>, format: ExportFormat) -> String {
    let stem = frame.map_or_else(|| "mockup".to_string(), DeviceFrame::file_stem);
    format!("{stem}.{}", format.extension())
}

/// Encode and write to `path`, creating parent directories as needed.
pub fn save(surface: &Raster, path: &Path, format: ExportFormat) -> FrameshotResult<()> {
    let bytes = encode(surface, format)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory '{}'", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

/// How a clipboard copy ended up on the clipboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardWrite {
    Image,
    TextFallback,
}

/// Copy the surface to the system clipboard.
///
/// Prefers a real image write; falls back to a base64 data URL as plain
/// text. Only when both fail does this error out.
pub fn copy_to_clipboard(
    surface: &Raster,
    format: ExportFormat,
) -> FrameshotResult<ClipboardWrite> {
    match write_clipboard_image(surface) {
        Ok(()) => Ok(ClipboardWrite::Image),
        Err(image_err) => {
            let reason = format!("{image_err:#}");
            tracing::warn!(
                error = %reason,
                "clipboard image write failed, falling back to data URL text"
            );
            let url = data_url(surface, format)?;
            match write_clipboard_text(&url) {
                Ok(()) => Ok(ClipboardWrite::TextFallback),
                Err(text_err) => Err(FrameshotError::export(format!(
                    "clipboard image and text writes both failed: {image_err:#}; {text_err:#}"
                ))),
            }
        }
    }
}

fn write_clipboard_image(surface: &Raster) -> anyhow::Result<()> {
    let rgba = unpremultiply_rgba8(surface.data());
    let mut clipboard = arboard::Clipboard::new().context("open system clipboard")?;
    clipboard
        .set_image(arboard::ImageData {
            width: surface.width() as usize,
            height: surface.height() as usize,
            bytes: rgba.into(),
        })
        .context("write image to clipboard")?;
    Ok(())
}

fn write_clipboard_text(text: &str) -> anyhow::Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("open system clipboard")?;
    clipboard
        .set_text(text)
        .context("write text to clipboard")?;
    Ok(())
}

/// Preview size fitting `max_w`x`max_h` at the true aspect ratio, never
/// upscaled.
pub fn preview_dimensions(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    let scale = (f64::from(max_w) / f64::from(w))
        .min(f64::from(max_h) / f64::from(h))
        .min(1.0);
    let pw = (f64::from(w) * scale).round().max(1.0) as u32;
    let ph = (f64::from(h) * scale).round().max(1.0) as u32;
    (pw, ph)
}

/// Downscaled copy of the surface for viewport display.
pub fn render_preview(surface: &Raster, max_w: u32, max_h: u32) -> FrameshotResult<Raster> {
    let (pw, ph) = preview_dimensions(surface.width(), surface.height(), max_w, max_h);
    if (pw, ph) == (surface.width(), surface.height()) {
        return Ok(surface.clone());
    }
    let paint = surface.image_paint()?;
    let sx = f64::from(pw) / f64::from(surface.width());
    let sy = f64::from(ph) / f64::from(surface.height());
    let sw = f64::from(surface.width());
    let sh = f64::from(surface.height());
    render_surface(pw, ph, move |ctx| {
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(Affine::scale_non_uniform(sx, sy)));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, sw, sh));
        Ok(())
    })
}

fn premul_rgb(premul: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(premul.len() / 4 * 3);
    for px in premul.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}
