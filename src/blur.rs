use crate::error::{FrameshotError, FrameshotResult};

/// Separable Gaussian blur over premultiplied RGBA8, clamp-to-edge.
///
/// Weights are fixed-point Q16 so the two passes are integer-only.
pub(crate) fn gaussian_blur_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> FrameshotResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| FrameshotError::compose("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(FrameshotError::compose(
            "blur input must match width*height*4",
        ));
    }
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    blur_axis(src, &mut tmp, width, height, &kernel, Axis::Horizontal);
    blur_axis(&tmp, &mut out, width, height, &kernel, Axis::Vertical);
    Ok(out)
}

fn kernel_q16(radius: u32, sigma: f32) -> FrameshotResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FrameshotError::compose("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(FrameshotError::compose("gaussian kernel sum is zero"));
    }

    // Normalize to 65536 exactly; any rounding remainder lands on the
    // center weight so a constant image stays constant.
    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let mid_val = i64::from(weights[mid]);
        weights[mid] = (mid_val + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

#[derive(Clone, Copy, PartialEq)]
enum Axis {
    Horizontal,
    Vertical,
}

fn blur_axis(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let offset = ki as i32 - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x + offset).clamp(0, w - 1), y),
                    Axis::Vertical => (x, (y + offset).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}
