use kurbo::{Affine, Rect};

use crate::appearance::{AppearanceConfig, OutputAspect, ShadowConfig};
use crate::blur::gaussian_blur_premul;
use crate::content::cover_fit;
use crate::error::FrameshotResult;
use crate::raster::{Raster, affine_to_cpu, render_surface};

/// Final canvas size for a content layer.
///
/// Padding is applied symmetrically and may be negative; the canvas never
/// collapses below 1x1. An aspect preset only ever grows the short
/// dimension, the content+padding envelope is never violated.
pub(crate) fn final_dimensions(
    content_w: u32,
    content_h: u32,
    padding_px: i32,
    aspect: OutputAspect,
) -> (u32, u32) {
    let pad = i64::from(padding_px);
    let req_w = (i64::from(content_w) + 2 * pad).max(1);
    let req_h = (i64::from(content_h) + 2 * pad).max(1);
    let Some(ar) = aspect.ratio() else {
        return (req_w as u32, req_h as u32);
    };

    let mut final_h = req_h;
    let mut final_w = (ar * final_h as f64).round() as i64;
    if final_w < req_w {
        final_w = req_w;
        final_h = (final_w as f64 / ar).round() as i64;
    }
    (final_w.max(1) as u32, final_h.max(1) as u32)
}

/// Final surface: background, then drop shadow, then the centered content.
///
/// `background` is only consulted while `appearance.background.enabled` is
/// set; without it the enabled background is a flat color fill.
#[tracing::instrument(skip(content, background))]
pub fn compose(
    content: &Raster,
    appearance: &AppearanceConfig,
    background: Option<&Raster>,
) -> FrameshotResult<Raster> {
    appearance.validate()?;

    let (cw, ch) = (content.width(), content.height());
    let (fw, fh) = final_dimensions(cw, ch, appearance.padding_px, appearance.aspect);
    // Floor division keeps the crop symmetric when padding is negative.
    let cx = (i64::from(fw) - i64::from(cw)).div_euclid(2) as f64;
    let cy = (i64::from(fh) - i64::from(ch)).div_euclid(2) as f64;

    let background_image = match background {
        Some(image) if appearance.background.enabled => {
            Some((image.width(), image.height(), image.image_paint()?))
        }
        _ => None,
    };
    let background_fill = appearance.background.enabled.then(|| {
        let c = appearance.background.color;
        vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
    });
    let shadow_layer = if appearance.shadow.enabled && appearance.shadow.strength_px > 0 {
        let plate = shadow_plate(content, &appearance.shadow)?;
        let paint = plate.image_paint()?;
        Some((
            plate.width(),
            plate.height(),
            paint,
            f64::from(appearance.shadow.strength_px),
        ))
    } else {
        None
    };
    let content_paint = content.image_paint()?;

    render_surface(fw, fh, move |ctx| {
        if let Some((bw, bh, paint)) = background_image {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(cover_fit(
                bw,
                bh,
                Rect::new(0.0, 0.0, f64::from(fw), f64::from(fh)),
            )));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(bw),
                f64::from(bh),
            ));
        } else if let Some(fill) = background_fill {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(fill);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(fw),
                f64::from(fh),
            ));
        }

        if let Some((pw, ph, paint, strength)) = shadow_layer {
            // The plate is padded by `strength` on every side; offset the
            // whole thing down by half the strength.
            let px = cx - strength;
            let py = cy - strength + strength / 2.0;
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(Affine::translate((px, py))));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(pw),
                f64::from(ph),
            ));
        }

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(Affine::translate((cx, cy))));
        ctx.set_paint(content_paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(cw),
            f64::from(ch),
        ));
        Ok(())
    })
}

/// Soft shadow plate: the content's alpha silhouette tinted with the
/// shadow color, blurred, padded by the blur radius on every side.
fn shadow_plate(content: &Raster, shadow: &ShadowConfig) -> FrameshotResult<Raster> {
    let pad = shadow.strength_px;
    let w = content.width() + 2 * pad;
    let h = content.height() + 2 * pad;
    let tint = shadow.color.with_opacity_pct(shadow.opacity_pct).premul();

    let mut plate = vec![0u8; w as usize * h as usize * 4];
    for y in 0..content.height() {
        for x in 0..content.width() {
            let a = content.alpha_at(x, y);
            if a == 0 {
                continue;
            }
            let i = ((y + pad) as usize * w as usize + (x + pad) as usize) * 4;
            for (slot, &t) in plate[i..i + 4].iter_mut().zip(tint.iter()) {
                *slot = ((u16::from(t) * u16::from(a) + 127) / 255) as u8;
            }
        }
    }

    let sigma = (shadow.strength_px as f32 / 2.0).max(0.5);
    let blurred = gaussian_blur_premul(&plate, w, h, pad, sigma)?;
    Raster::from_premul_bytes(w, h, blurred)
}
