use image::GrayImage;

/// Stretch contrast via histogram equalization.
///
/// Document photographs vary arbitrarily in exposure; remapping intensities
/// by their cumulative distribution spreads whatever dynamic range is
/// present across the full [0,255] span, unlike a fixed linear stretch
/// which only helps images already near the expected brightness.
///
/// A uniform image (every pixel the same value) is returned unchanged:
/// the remap denominator would be zero, so the stage is an explicit no-op
/// rather than a division error.
pub fn apply(src: &GrayImage) -> GrayImage {
    let mut hist = [0u64; 256];
    for pixel in src.pixels() {
        hist[pixel.0[0] as usize] += 1;
    }

    let mut cdf = [0u64; 256];
    let mut running = 0u64;
    for (i, count) in hist.iter().enumerate() {
        running += count;
        cdf[i] = running;
    }

    let total = u64::from(src.width()) * u64::from(src.height());
    // First nonzero CDF entry: the cumulative count at the darkest
    // occupied bucket.
    let cdf_min = cdf
        .iter()
        .copied()
        .find(|&c| c > 0)
        .unwrap_or(0);

    if total == cdf_min {
        // Single-value image: nothing to stretch.
        return src.clone();
    }

    let denom = (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    for (entry, &c) in lut.iter_mut().zip(cdf.iter()) {
        let scaled = c.saturating_sub(cdf_min) as f64 / denom * 255.0;
        *entry = scaled.round().clamp(0.0, 255.0) as u8;
    }

    let mut out = src.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_equalize_uniform_image_is_noop() {
        let img = GrayImage::from_pixel(10, 10, Luma([128]));
        let out = apply(&img);
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn test_equalize_stretches_two_value_image_to_full_range() {
        let img = GrayImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                Luma([100])
            } else {
                Luma([150])
            }
        });
        let out = apply(&img);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(9, 0).0[0], 255);
    }

    #[test]
    fn test_equalize_maps_darkest_occupied_value_to_zero() {
        let img = GrayImage::from_fn(16, 1, |x, _| Luma([(60 + x * 10) as u8]));
        let out = apply(&img);
        assert_eq!(out.get_pixel(0, 0).0[0], 0);
        assert_eq!(out.get_pixel(15, 0).0[0], 255);
    }

    #[test]
    fn test_equalize_preserves_value_ordering() {
        let img = GrayImage::from_fn(32, 8, |x, y| Luma([((x * 3 + y * 11) % 200 + 20) as u8]));
        let out = apply(&img);
        for y in 0..8 {
            for xa in 0..32 {
                for xb in 0..32 {
                    let (a, b) = (img.get_pixel(xa, y).0[0], img.get_pixel(xb, y).0[0]);
                    let (ea, eb) = (out.get_pixel(xa, y).0[0], out.get_pixel(xb, y).0[0]);
                    if a <= b {
                        assert!(ea <= eb);
                    }
                }
            }
        }
    }

    #[test]
    fn test_equalize_does_not_mutate_input() {
        let img = GrayImage::from_fn(6, 6, |x, y| Luma([((x + y) * 20) as u8]));
        let before = img.clone();
        let _ = apply(&img);
        assert_eq!(img.as_raw(), before.as_raw());
    }
}
