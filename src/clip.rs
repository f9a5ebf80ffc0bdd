use kurbo::{BezPath, Point, Rect, RoundedRect, Shape};

use crate::catalog::DeviceFrame;
use crate::geometry::{self, Bounds};
use crate::raster::{Raster, bezpath_to_cpu};

/// Clip strategy for the screen region. Exactly one is applied per
/// composition.
#[derive(Clone, Debug, PartialEq)]
pub enum Clip {
    /// Irregular screen outline, straight from catalog geometry.
    Polygon(Vec<[f64; 2]>),
    /// Axis-aligned screen with a (detected or configured) corner radius.
    RoundedRect(Bounds, f64),
    /// Plain axis-aligned screen.
    Rect(Bounds),
}

impl Clip {
    pub fn bounds(&self) -> Bounds {
        match self {
            Clip::Polygon(points) => {
                geometry::polygon_bounds(points).unwrap_or(Bounds::new(0.0, 0.0, 0.0, 0.0))
            }
            Clip::RoundedRect(b, _) | Clip::Rect(b) => *b,
        }
    }

    /// Clip outline on a `width`x`height` surface, with every coordinate
    /// clamped to the surface. `None` for a degenerate polygon (fewer than
    /// 3 vertices), in which case masking is a no-op.
    pub fn to_path(&self, width: u32, height: u32) -> Option<BezPath> {
        let max_x = f64::from(width);
        let max_y = f64::from(height);
        match self {
            Clip::Polygon(points) => {
                if points.len() < 3 {
                    return None;
                }
                let mut path = BezPath::new();
                for (i, p) in points.iter().enumerate() {
                    let pt = Point::new(p[0].clamp(0.0, max_x), p[1].clamp(0.0, max_y));
                    if i == 0 {
                        path.move_to(pt);
                    } else {
                        path.line_to(pt);
                    }
                }
                path.close_path();
                Some(path)
            }
            Clip::RoundedRect(b, radius) => {
                let rect = clamp_rect(b.to_rect(), max_x, max_y);
                Some(RoundedRect::from_rect(rect, *radius).to_path(0.1))
            }
            Clip::Rect(b) => {
                let rect = clamp_rect(b.to_rect(), max_x, max_y);
                Some(rect.to_path(0.1))
            }
        }
    }
}

/// Push this clip onto the render context. Returns whether a layer was
/// pushed; the caller pops it after the masked draws.
pub(crate) fn push_clip(
    ctx: &mut vello_cpu::RenderContext,
    clip: &Clip,
    width: u32,
    height: u32,
) -> bool {
    match clip.to_path(width, height) {
        Some(path) => {
            ctx.push_clip_layer(&bezpath_to_cpu(&path));
            true
        }
        None => false,
    }
}

/// Pick the clip for a frame: irregular polygons clip as-is, everything
/// else gets the rounded-rect shortcut when a bezel radius is detectable.
pub fn select_clip(frame: &DeviceFrame, raster: &Raster, bounds: Bounds) -> Clip {
    if let Some(polygon) = &frame.screen_polygon
        && !polygon.is_empty()
        && !geometry::is_axis_aligned_rect(polygon)
    {
        return Clip::Polygon(polygon.clone());
    }
    let radius = geometry::detect_corner_radius(raster, bounds);
    if radius > 0.0 {
        Clip::RoundedRect(bounds, radius)
    } else {
        Clip::Rect(bounds)
    }
}

fn clamp_rect(rect: Rect, max_x: f64, max_y: f64) -> Rect {
    rect.intersect(Rect::new(0.0, 0.0, max_x, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Orientation;
    use crate::raster::render_surface;

    fn frame_with_polygon(polygon: Option<Vec<[f64; 2]>>) -> DeviceFrame {
        DeviceFrame {
            filename: "clip-test.png".into(),
            brand: "Test".into(),
            model: "Unit".into(),
            orientation: Orientation::Portrait,
            aspect_ratio: None,
            screen_polygon: polygon,
            screen_rect: None,
        }
    }

    fn raster_with_cutout(
        w: u32,
        h: u32,
        transparent: impl Fn(u32, u32) -> bool,
    ) -> Raster {
        let mut data = vec![255u8; (w * h * 4) as usize];
        for y in 0..h {
            for x in 0..w {
                if transparent(x, y) {
                    let i = ((y * w + x) * 4) as usize;
                    data[i..i + 4].copy_from_slice(&[0, 0, 0, 0]);
                }
            }
        }
        Raster::from_premul_bytes(w, h, data).unwrap()
    }

    #[test]
    fn irregular_polygon_selects_polygon_clip() {
        let polygon = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [2.0, 5.0]];
        let frame = frame_with_polygon(Some(polygon.clone()));
        let raster = raster_with_cutout(16, 16, |_, _| false);
        let clip = select_clip(&frame, &raster, Bounds::new(0.0, 0.0, 10.0, 5.0));
        assert_eq!(clip, Clip::Polygon(polygon));
    }

    #[test]
    fn axis_aligned_polygon_falls_through_to_rect() {
        let polygon = vec![[20.0, 20.0], [80.0, 20.0], [80.0, 80.0], [20.0, 80.0]];
        let frame = frame_with_polygon(Some(polygon));
        let raster = raster_with_cutout(100, 100, |x, y| {
            (20..=80).contains(&x) && (20..=80).contains(&y)
        });
        let bounds = Bounds::new(20.0, 20.0, 60.0, 60.0);
        assert_eq!(select_clip(&frame, &raster, bounds), Clip::Rect(bounds));
    }

    #[test]
    fn rounded_cutout_selects_rounded_rect_clip() {
        let raster = raster_with_cutout(100, 100, |x, y| {
            if !(20..=80).contains(&x) || !(20..=80).contains(&y) {
                return false;
            }
            let corner = |cx: i64, cy: i64| {
                let dx = x as i64 - cx;
                let dy = y as i64 - cy;
                dx * dx + dy * dy <= 100
            };
            match (x < 30, x > 70, y < 30, y > 70) {
                (true, _, true, _) => corner(30, 30),
                (_, true, true, _) => corner(70, 30),
                (true, _, _, true) => corner(30, 70),
                (_, true, _, true) => corner(70, 70),
                _ => true,
            }
        });
        let frame = frame_with_polygon(None);
        let bounds = Bounds::new(20.0, 20.0, 60.0, 60.0);
        assert_eq!(
            select_clip(&frame, &raster, bounds),
            Clip::RoundedRect(bounds, 3.0)
        );
    }

    #[test]
    fn degenerate_polygon_has_no_path() {
        let clip = Clip::Polygon(vec![[0.0, 0.0], [4.0, 4.0]]);
        assert!(clip.to_path(8, 8).is_none());
    }

    #[test]
    fn polygon_vertices_clamp_to_surface() {
        let clip = Clip::Polygon(vec![
            [-10.0, -10.0],
            [50.0, -10.0],
            [50.0, 30.0],
            [-10.0, 30.0],
        ]);
        let path = clip.to_path(40, 20).unwrap();
        assert_eq!(path.bounding_box(), Rect::new(0.0, 0.0, 40.0, 20.0));
    }

    #[test]
    fn rect_clip_intersects_surface() {
        let clip = Clip::Rect(Bounds::new(-5.0, 10.0, 100.0, 100.0));
        let path = clip.to_path(32, 32).unwrap();
        assert_eq!(path.bounding_box(), Rect::new(0.0, 10.0, 32.0, 32.0));
    }

    #[test]
    fn pushed_polygon_clip_constrains_draws() {
        let clip = Clip::Polygon(vec![[0.0, 0.0], [8.0, 0.0], [0.0, 8.0]]);
        let out = render_surface(8, 8, |ctx| {
            let pushed = push_clip(ctx, &clip, 8, 8);
            assert!(pushed);
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 0, 0, 255));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 8.0, 8.0));
            ctx.pop_layer();
            Ok(())
        })
        .unwrap();
        assert!(out.alpha_at(1, 1) > 200);
        assert_eq!(out.alpha_at(7, 7), 0);
    }

    #[test]
    fn degenerate_clip_leaves_draws_unmasked() {
        let clip = Clip::Polygon(vec![[0.0, 0.0], [4.0, 4.0]]);
        let out = render_surface(8, 8, |ctx| {
            let pushed = push_clip(ctx, &clip, 8, 8);
            assert!(!pushed);
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 255, 0, 255));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, 8.0, 8.0));
            Ok(())
        })
        .unwrap();
        assert!(out.alpha_at(7, 7) > 200);
    }
}
