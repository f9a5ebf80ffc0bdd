use crate::catalog::DeviceFrame;
use crate::raster::Raster;

/// Alpha at or below this counts as part of the transparent screen cutout.
pub(crate) const CUTOUT_ALPHA_MAX: u8 = 16;

/// Step between sampled pixels when scanning a frame's alpha channel.
const SCAN_STRIDE: u32 = 2;

/// Upper bound for corner-radius probing, as a fraction of the short side.
const CORNER_RADIUS_MAX_FRACTION: f64 = 0.12;

/// Share of the frame covered by the centered fallback region.
const FALLBACK_FRACTION: f64 = 0.6;

/// Axis-aligned envelope of a screen region. Always derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn to_rect(self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.x + self.w, self.y + self.h)
    }
}

/// Envelope of a polygon, or `None` for an empty vertex list.
pub fn polygon_bounds(points: &[[f64; 2]]) -> Option<Bounds> {
    let (first, rest) = points.split_first()?;
    let mut min = *first;
    let mut max = *first;
    for p in rest {
        min[0] = min[0].min(p[0]);
        min[1] = min[1].min(p[1]);
        max[0] = max[0].max(p[0]);
        max[1] = max[1].max(p[1]);
    }
    Some(Bounds::new(
        min[0],
        min[1],
        max[0] - min[0],
        max[1] - min[1],
    ))
}

/// True iff the polygon is exactly its own bounding box: 4 vertices, each
/// coinciding with a distinct bbox corner, in any order.
pub fn is_axis_aligned_rect(points: &[[f64; 2]]) -> bool {
    if points.len() != 4 {
        return false;
    }
    let Some(b) = polygon_bounds(points) else {
        return false;
    };
    let corners = [
        [b.x, b.y],
        [b.x + b.w, b.y],
        [b.x + b.w, b.y + b.h],
        [b.x, b.y + b.h],
    ];
    let mut used = [false; 4];
    'vertices: for p in points {
        for (i, c) in corners.iter().enumerate() {
            if !used[i] && p == c {
                used[i] = true;
                continue 'vertices;
            }
        }
        return false;
    }
    true
}

/// Bounding box of the transparent cutout, sampled at [`SCAN_STRIDE`].
///
/// `None` when the raster has no practically-transparent pixel at all.
pub fn alpha_scan_bounds(raster: &Raster) -> Option<Bounds> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    let mut y = 0;
    while y < raster.height() {
        let mut x = 0;
        while x < raster.width() {
            if raster.alpha_at(x, y) <= CUTOUT_ALPHA_MAX {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                found = true;
            }
            x += SCAN_STRIDE;
        }
        y += SCAN_STRIDE;
    }

    found.then(|| {
        Bounds::new(
            f64::from(min_x),
            f64::from(min_y),
            f64::from(max_x - min_x),
            f64::from(max_y - min_y),
        )
    })
}

/// Centered region covering [`FALLBACK_FRACTION`] of the raster.
pub fn fallback_bounds(raster: &Raster) -> Bounds {
    let w = f64::from(raster.width());
    let h = f64::from(raster.height());
    let inset = (1.0 - FALLBACK_FRACTION) / 2.0;
    Bounds::new(w * inset, h * inset, w * FALLBACK_FRACTION, h * FALLBACK_FRACTION)
}

/// Screen bounds for a frame: polygon envelope, then explicit rect, then
/// alpha scan, then the centered fallback.
#[tracing::instrument(skip(frame, raster), fields(filename = %frame.filename))]
pub fn resolve_bounds(frame: &DeviceFrame, raster: &Raster) -> Bounds {
    if let Some(polygon) = &frame.screen_polygon
        && let Some(bounds) = polygon_bounds(polygon)
    {
        return bounds;
    }
    if let Some(rect) = frame.screen_rect {
        return Bounds::new(rect.x, rect.y, rect.w, rect.h);
    }
    match alpha_scan_bounds(raster) {
        Some(bounds) => bounds,
        None => {
            tracing::debug!(
                filename = %frame.filename,
                "no transparent cutout detected, using centered fallback bounds"
            );
            fallback_bounds(raster)
        }
    }
}

/// Bezel corner radius, estimated by probing the frame's alpha channel.
///
/// Probes sit `r/sqrt(2)` diagonally inward from each bounds corner. Radii
/// shrink from 12% of the short side in 2px steps; the first radius whose
/// probes land on opaque bezel at all four corners wins. A rectangular
/// cutout keeps every probe transparent and yields 0.
pub fn detect_corner_radius(raster: &Raster, bounds: Bounds) -> f64 {
    let mut r = (CORNER_RADIUS_MAX_FRACTION * bounds.w.min(bounds.h)).floor();
    while r >= 2.0 {
        let inset = r / std::f64::consts::SQRT_2;
        let probes = [
            (bounds.x + inset, bounds.y + inset),
            (bounds.x + bounds.w - inset, bounds.y + inset),
            (bounds.x + inset, bounds.y + bounds.h - inset),
            (bounds.x + bounds.w - inset, bounds.y + bounds.h - inset),
        ];
        if probes
            .iter()
            .all(|&(px, py)| alpha_probe(raster, px, py) > CUTOUT_ALPHA_MAX)
        {
            return r;
        }
        r -= 2.0;
    }
    0.0
}

fn alpha_probe(raster: &Raster, x: f64, y: f64) -> u8 {
    if x < 0.0 || y < 0.0 {
        return 0;
    }
    raster.alpha_at(x.round() as u32, y.round() as u32)
}
