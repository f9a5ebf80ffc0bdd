use std::{path::Path, sync::Arc};

use anyhow::Context;

use crate::error::{FrameshotError, FrameshotResult};

/// A decoded image held as premultiplied RGBA8, row-major.
///
/// Every surface in the pipeline (frame, screenshot, background, content
/// layer, output) is one of these; conversion to the renderer's pixmap
/// format happens at the draw boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> FrameshotResult<Self> {
        let len = checked_byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; len],
        })
    }

    pub fn from_premul_bytes(width: u32, height: u32, data: Vec<u8>) -> FrameshotResult<Self> {
        let len = checked_byte_len(width, height)?;
        if data.len() != len {
            return Err(FrameshotError::compose(
                "raster byte length does not match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decode any format the `image` crate understands and premultiply.
    pub fn decode(bytes: &[u8]) -> FrameshotResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut data = rgba.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul_bytes(width, height, data)
    }

    pub fn open(path: &Path) -> FrameshotResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Alpha at a pixel, or 0 outside the raster.
    ///
    /// Geometry probing reads this instead of round-tripping through a
    /// drawing surface.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 4;
        self.data[idx + 3]
    }

    pub fn to_pixmap(&self) -> FrameshotResult<vello_cpu::Pixmap> {
        let (w, h) = surface_dims(self.width, self.height)?;

        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(self.width as usize * self.height as usize);
        for px in self.data.chunks_exact(4) {
            let a = px[3];
            may_have_opacities |= a != 255;
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: px[0],
                g: px[1],
                b: px[2],
                a,
            });
        }

        Ok(vello_cpu::Pixmap::from_parts_with_opacity(
            pixels,
            w,
            h,
            may_have_opacities,
        ))
    }

    pub fn from_pixmap(pixmap: &vello_cpu::Pixmap) -> Self {
        Self {
            width: u32::from(pixmap.width()),
            height: u32::from(pixmap.height()),
            data: pixmap.data_as_u8_slice().to_vec(),
        }
    }

    pub(crate) fn image_paint(&self) -> FrameshotResult<vello_cpu::Image> {
        Ok(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(self.to_pixmap()?)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        })
    }
}

fn checked_byte_len(width: u32, height: u32) -> FrameshotResult<usize> {
    if width == 0 || height == 0 {
        return Err(FrameshotError::compose("raster dimensions must be non-zero"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| FrameshotError::compose("raster byte size overflow"))
}

pub(crate) fn surface_dims(width: u32, height: u32) -> FrameshotResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(FrameshotError::compose(
            "surface dimensions must be non-zero",
        ));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| FrameshotError::compose("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| FrameshotError::compose("surface height exceeds u16"))?;
    Ok((w, h))
}

/// Run one draw pass and read the result back as a [`Raster`].
pub(crate) fn render_surface(
    width: u32,
    height: u32,
    draw: impl FnOnce(&mut vello_cpu::RenderContext) -> FrameshotResult<()>,
) -> FrameshotResult<Raster> {
    let (w, h) = surface_dims(width, height)?;
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    draw(&mut ctx)?;
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Ok(Raster::from_pixmap(&pixmap))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8(premul: &[u8]) -> Vec<u8> {
    let mut out = premul.to_vec();
    for px in out.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in px[..3].iter_mut() {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
    out
}

pub(crate) fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

pub(crate) fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn decode_png_dimensions_and_premul() {
        let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
        let img = image::RgbaImage::from_raw(1, 1, src_rgba).unwrap();

        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();

        let raster = Raster::decode(&buf).unwrap();
        assert_eq!(raster.width(), 1);
        assert_eq!(raster.height(), 1);
        assert_eq!(
            raster.data(),
            &[
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128u8
            ]
        );
    }

    #[test]
    fn alpha_at_reads_pixels_and_zeroes_out_of_bounds() {
        let data = vec![
            0, 0, 0, 10, //
            0, 0, 0, 20, //
            0, 0, 0, 30, //
            0, 0, 0, 40,
        ];
        let raster = Raster::from_premul_bytes(2, 2, data).unwrap();
        assert_eq!(raster.alpha_at(0, 0), 10);
        assert_eq!(raster.alpha_at(1, 0), 20);
        assert_eq!(raster.alpha_at(0, 1), 30);
        assert_eq!(raster.alpha_at(1, 1), 40);
        assert_eq!(raster.alpha_at(2, 0), 0);
        assert_eq!(raster.alpha_at(0, 2), 0);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(Raster::new(0, 4).is_err());
        assert!(Raster::new(4, 0).is_err());
        assert!(Raster::from_premul_bytes(2, 2, vec![0; 8]).is_err());
    }

    #[test]
    fn pixmap_roundtrip_preserves_bytes() {
        let data = vec![
            10, 20, 30, 255, //
            0, 0, 0, 0, //
            5, 5, 5, 128, //
            200, 100, 50, 255,
        ];
        let raster = Raster::from_premul_bytes(2, 2, data.clone()).unwrap();
        let pixmap = raster.to_pixmap().unwrap();
        let back = Raster::from_pixmap(&pixmap);
        assert_eq!(back.width(), 2);
        assert_eq!(back.height(), 2);
        assert_eq!(back.data(), &data[..]);
    }

    #[test]
    fn unpremultiply_inverts_premultiply_for_opaque_and_zero() {
        let mut straight = vec![100, 50, 200, 255, 100, 50, 200, 0];
        let expected = vec![100, 50, 200, 255, 0, 0, 0, 0];
        premultiply_rgba8_in_place(&mut straight);
        assert_eq!(unpremultiply_rgba8(&straight), expected);
    }

    #[test]
    fn unpremultiply_rounds_to_nearest() {
        // 128/255 alpha: straight 100 premultiplies to 50, which returns to 100.
        let mut px = vec![100, 100, 100, 128];
        premultiply_rgba8_in_place(&mut px);
        let back = unpremultiply_rgba8(&px);
        assert_eq!(back[3], 128);
        assert!((i16::from(back[0]) - 100).abs() <= 1);
    }

    #[test]
    fn render_surface_rejects_oversized_canvas() {
        let err = render_surface(u32::from(u16::MAX) + 1, 4, |_| Ok(()));
        assert!(err.is_err());
    }

    #[test]
    fn bezpath_conversion_keeps_element_count() {
        let mut path = kurbo::BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((4.0, 0.0));
        path.quad_to((4.0, 4.0), (0.0, 4.0));
        path.close_path();
        let cpu = bezpath_to_cpu(&path);
        assert_eq!(cpu.elements().len(), path.elements().len());
    }
}
