use kurbo::{Affine, Rect};

use crate::appearance::RotationDeg;
use crate::clip::{self, Clip};
use crate::error::FrameshotResult;
use crate::geometry::Bounds;
use crate::raster::{Raster, affine_to_cpu, render_surface};

/// Uniform scale plus translation that makes a `src_w`x`src_h` image fully
/// cover `target`, center-cropping the overflowing axis.
pub(crate) fn cover_fit(src_w: u32, src_h: u32, target: Rect) -> Affine {
    let sw = f64::from(src_w);
    let sh = f64::from(src_h);
    let scale = if sw / sh > target.width() / target.height() {
        target.height() / sh
    } else {
        target.width() / sw
    };
    let dx = target.x0 + (target.width() - sw * scale) / 2.0;
    let dy = target.y0 + (target.height() - sh * scale) / 2.0;
    Affine::translate((dx, dy)) * Affine::scale(scale)
}

/// Bounding box of a raster rotated by a right angle.
pub(crate) fn rotated_bounds(src_w: u32, src_h: u32, rotation: RotationDeg) -> (u32, u32) {
    let theta = rotation.radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let sw = f64::from(src_w);
    let sh = f64::from(src_h);
    let out_w = (sw * cos + sh * sin).round().max(1.0) as u32;
    let out_h = (sw * sin + sh * cos).round().max(1.0) as u32;
    (out_w, out_h)
}

/// Framed content: screenshot cover-fit into the clipped screen region,
/// frame drawn on top at native size. Without a screenshot this is just
/// the frame.
#[tracing::instrument(skip(frame, clip, screenshot))]
pub fn build_framed(
    frame: &Raster,
    clip: &Clip,
    screenshot: Option<&Raster>,
) -> FrameshotResult<Raster> {
    let (w, h) = (frame.width(), frame.height());
    let frame_paint = frame.image_paint()?;
    let shot = screenshot
        .map(|s| s.image_paint().map(|paint| (s.width(), s.height(), paint)))
        .transpose()?;

    render_surface(w, h, move |ctx| {
        if let Some((sw, sh, paint)) = shot {
            // Clip coordinates are surface coordinates, so the layer is
            // pushed while the transform is still identity.
            let pushed = clip::push_clip(ctx, clip, w, h);
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(cover_fit(sw, sh, clip.bounds().to_rect())));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(sw),
                f64::from(sh),
            ));
            if pushed {
                ctx.pop_layer();
            }
        }

        // The frame's opaque bezel occludes screenshot overdraw that the
        // clip let through near the cutout edge.
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(frame_paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        Ok(())
    })
}

/// Frameless content: the screenshot rotated by a right angle and clipped
/// to a rounded rectangle. Without a screenshot there is nothing to show
/// and a 1x1 transparent placeholder comes back.
#[tracing::instrument(skip(screenshot))]
pub fn build_frameless(
    screenshot: Option<&Raster>,
    rotation: RotationDeg,
    radius_px: u32,
) -> FrameshotResult<Raster> {
    let Some(shot) = screenshot else {
        return Raster::new(1, 1);
    };
    let (out_w, out_h) = rotated_bounds(shot.width(), shot.height(), rotation);
    let clip = Clip::RoundedRect(
        Bounds::new(0.0, 0.0, f64::from(out_w), f64::from(out_h)),
        f64::from(radius_px),
    );
    let paint = shot.image_paint()?;
    let sw = f64::from(shot.width());
    let sh = f64::from(shot.height());

    render_surface(out_w, out_h, move |ctx| {
        let pushed = radius_px > 0 && clip::push_clip(ctx, &clip, out_w, out_h);
        let transform = Affine::translate((f64::from(out_w) / 2.0, f64::from(out_h) / 2.0))
            * Affine::rotate(rotation.radians())
            * Affine::translate((-sw / 2.0, -sh / 2.0));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(transform));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, sw, sh));
        if pushed {
            ctx.pop_layer();
        }
        Ok(())
    })
}
