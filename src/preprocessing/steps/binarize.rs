use crate::preprocessing::PrepConfig;
use image::{GrayImage, Luma};

/// Sauvola adaptive binarization.
///
/// For each pixel, a square neighborhood of side `block_size` centered on
/// it (with out-of-range neighbor coordinates clamped to the nearest valid
/// coordinate, so border pixels are fully processed) yields a local mean
/// `m` and population standard deviation `s`, and the threshold is
/// `T = m * (1 + k * (s / r - 1))`. The pixel becomes 255 iff it is
/// strictly above `T`; ties classify as background (0).
///
/// A single global threshold fails on documents with shadows, vignetting,
/// or uneven scan lighting; the local mean+stddev formulation adapts per
/// region and down-weights low-variance background.
///
/// This entry point uses summed-area tables (one for values, one for
/// squares) so each neighborhood's statistics cost O(1) instead of
/// O(block_size^2); `sauvola_naive` is the reference scan the table
/// variant must agree with.
pub fn apply(src: &GrayImage, config: &PrepConfig) -> GrayImage {
    sauvola_integral(src, config)
}

/// Shared threshold formula, so the naive and integral variants agree
/// bit-for-bit: both feed exact integer sums (representable in f64)
/// through the same arithmetic.
fn sauvola_threshold(sum: f64, sum_sq: f64, count: f64, config: &PrepConfig) -> f64 {
    let mean = sum / count;
    let variance = sum_sq / count - mean * mean;
    let std_dev = variance.max(0.0).sqrt();
    mean * (1.0 + f64::from(config.k) * (std_dev / f64::from(config.r) - 1.0))
}

/// Reference implementation: O(block_size^2) neighborhood scan per pixel,
/// clamping each neighbor coordinate into range (replicate-edge).
#[allow(dead_code)]
pub fn sauvola_naive(src: &GrayImage, config: &PrepConfig) -> GrayImage {
    let (width, height) = src.dimensions();
    let half = i64::from(config.block_size / 2);
    let count = f64::from(config.block_size) * f64::from(config.block_size);

    GrayImage::from_fn(width, height, |x, y| {
        let mut sum = 0u64;
        let mut sum_sq = 0u64;
        for dy in -half..=half {
            let sy = (i64::from(y) + dy).clamp(0, i64::from(height) - 1) as u32;
            for dx in -half..=half {
                let sx = (i64::from(x) + dx).clamp(0, i64::from(width) - 1) as u32;
                let v = u64::from(src.get_pixel(sx, sy).0[0]);
                sum += v;
                sum_sq += v * v;
            }
        }
        let threshold = sauvola_threshold(sum as f64, sum_sq as f64, count, config);
        if f64::from(src.get_pixel(x, y).0[0]) > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Summed-area tables of values and squared values, with one row and
/// column of zero padding so rectangle queries need no bounds checks.
struct IntegralImages {
    sums: Vec<f64>,
    sums_sq: Vec<f64>,
    stride: usize,
}

impl IntegralImages {
    fn build(src: &GrayImage) -> Self {
        let (width, height) = src.dimensions();
        let stride = width as usize + 1;
        let mut sums = vec![0.0f64; stride * (height as usize + 1)];
        let mut sums_sq = vec![0.0f64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            for x in 0..width as usize {
                let v = f64::from(src.get_pixel(x as u32, y as u32).0[0]);
                let idx = (y + 1) * stride + x + 1;
                sums[idx] = v + sums[idx - 1] + sums[idx - stride] - sums[idx - stride - 1];
                sums_sq[idx] =
                    v * v + sums_sq[idx - 1] + sums_sq[idx - stride] - sums_sq[idx - stride - 1];
            }
        }

        Self {
            sums,
            sums_sq,
            stride,
        }
    }

    /// Sum and sum-of-squares over the inclusive rectangle [x1,x2]x[y1,y2].
    fn rect(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> (f64, f64) {
        let (x1, y1) = (x1 as usize, y1 as usize);
        let (x2, y2) = (x2 as usize + 1, y2 as usize + 1);
        let s = &self.sums;
        let q = &self.sums_sq;
        let st = self.stride;
        (
            s[y2 * st + x2] - s[y1 * st + x2] - s[y2 * st + x1] + s[y1 * st + x1],
            q[y2 * st + x2] - q[y1 * st + x2] - q[y2 * st + x1] + q[y1 * st + x1],
        )
    }
}

/// O(1)-per-pixel variant of the replicate-edge neighborhood statistics.
///
/// Near the borders the replicate addressing samples the outermost row or
/// column multiple times, so the window sum is the clamped-rectangle sum
/// plus the edge rows/columns (and corner pixels) weighted by how many
/// window offsets clamp onto them. This reproduces the naive scan exactly,
/// including the constant `block_size^2` sample count.
fn sauvola_integral(src: &GrayImage, config: &PrepConfig) -> GrayImage {
    let (width, height) = src.dimensions();
    let half = config.block_size / 2;
    let count = f64::from(config.block_size) * f64::from(config.block_size);
    let integrals = IntegralImages::build(src);

    GrayImage::from_fn(width, height, |x, y| {
        let x1 = x.saturating_sub(half);
        let y1 = y.saturating_sub(half);
        let x2 = (x + half).min(width - 1);
        let y2 = (y + half).min(height - 1);
        // How many window offsets clamp onto each edge, beyond the one
        // in-range sample of that row/column.
        let ex_l = f64::from(half.saturating_sub(x));
        let ex_t = f64::from(half.saturating_sub(y));
        let ex_r = f64::from((x + half).saturating_sub(width - 1));
        let ex_b = f64::from((y + half).saturating_sub(height - 1));

        let (mut sum, mut sum_sq) = integrals.rect(x1, y1, x2, y2);

        if ex_t > 0.0 {
            let (s, q) = integrals.rect(x1, y1, x2, y1);
            sum += ex_t * s;
            sum_sq += ex_t * q;
        }
        if ex_b > 0.0 {
            let (s, q) = integrals.rect(x1, y2, x2, y2);
            sum += ex_b * s;
            sum_sq += ex_b * q;
        }
        if ex_l > 0.0 {
            let (s, q) = column_with_replicated_rows(&integrals, x1, y1, y2, ex_t, ex_b);
            sum += ex_l * s;
            sum_sq += ex_l * q;
        }
        if ex_r > 0.0 {
            let (s, q) = column_with_replicated_rows(&integrals, x2, y1, y2, ex_t, ex_b);
            sum += ex_r * s;
            sum_sq += ex_r * q;
        }

        let threshold = sauvola_threshold(sum, sum_sq, count, config);
        if f64::from(src.get_pixel(x, y).0[0]) > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Sum of one column over the clamped row range, with its end pixels
/// weighted by the vertical replication counts. Used for the replicated
/// left/right columns, whose corner pixels are sampled `ex_l * ex_t`
/// (etc.) additional times.
fn column_with_replicated_rows(
    integrals: &IntegralImages,
    x: u32,
    y1: u32,
    y2: u32,
    ex_t: f64,
    ex_b: f64,
) -> (f64, f64) {
    let (mut s, mut q) = integrals.rect(x, y1, x, y2);
    if ex_t > 0.0 {
        let (ts, tq) = integrals.rect(x, y1, x, y1);
        s += ex_t * ts;
        q += ex_t * tq;
    }
    if ex_b > 0.0 {
        let (bs, bq) = integrals.rect(x, y2, x, y2);
        s += ex_b * bs;
        q += ex_b * bq;
    }
    (s, q)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_binarize_output_is_strictly_binary() {
        let img = GrayImage::from_fn(50, 50, |x, _| Luma([(x as u8).wrapping_mul(5)]));
        let out = apply(&img, &PrepConfig::default());
        for pixel in out.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }

    #[test]
    fn test_binarize_separates_text_from_background() {
        // Dark text stroke on a light page
        let mut img = GrayImage::from_pixel(60, 30, Luma([235]));
        for x in 10..50 {
            img.put_pixel(x, 15, Luma([20]));
        }

        let out = apply(&img, &PrepConfig::default());
        assert_eq!(out.get_pixel(30, 15).0[0], 0);
        assert_eq!(out.get_pixel(30, 5).0[0], 255);
    }

    #[test]
    fn test_binarize_preserves_large_checkerboard() {
        // Blocks of 40 > block_size 25: each block center sees a uniform
        // window and must classify with its source polarity.
        let img = GrayImage::from_fn(160, 160, |x, y| {
            if (x / 40 + y / 40) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        });
        let out = apply(&img, &PrepConfig::default());

        for bx in 0..4u32 {
            for by in 0..4u32 {
                let cx = bx * 40 + 20;
                let cy = by * 40 + 20;
                let expected = if (bx + by) % 2 == 0 { 0 } else { 255 };
                assert_eq!(out.get_pixel(cx, cy).0[0], expected, "block ({bx},{by})");
            }
        }
    }

    #[test]
    fn test_binarize_tie_classifies_as_background() {
        // With k = 0 the threshold equals the local mean; on a uniform
        // image every pixel ties with it and the comparison is strict.
        let config = PrepConfig {
            k: 0.0,
            ..PrepConfig::default()
        };
        let img = GrayImage::from_pixel(10, 10, Luma([180]));
        let out = apply(&img, &config);
        assert!(out.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn test_binarize_processes_border_pixels() {
        // Unlike blur and erosion, every pixel (including the border) is
        // thresholded; a bright page must come out white to the corners.
        let img = GrayImage::from_fn(40, 40, |x, y| {
            if (10..30).contains(&x) && (10..30).contains(&y) {
                Luma([30])
            } else {
                Luma([220])
            }
        });
        let out = apply(&img, &PrepConfig::default());
        assert_eq!(out.get_pixel(0, 0).0[0], 255);
        assert_eq!(out.get_pixel(39, 39).0[0], 255);
        assert_eq!(out.get_pixel(20, 20).0[0], 0);
    }

    #[test]
    fn test_binarize_handles_degenerate_sizes() {
        let config = PrepConfig::default();
        for (w, h) in [(1, 1), (1, 9), (9, 1)] {
            let img = GrayImage::from_fn(w, h, |x, y| Luma([((x + y) * 30 % 256) as u8]));
            let out = apply(&img, &config);
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn test_integral_matches_naive_on_random_images() {
        let mut rng = StdRng::seed_from_u64(0x5a71);
        for &(w, h, block_size) in &[(17u32, 13u32, 5u32), (40, 33, 25), (7, 9, 11)] {
            let config = PrepConfig {
                block_size,
                ..PrepConfig::default()
            };
            let img = GrayImage::from_fn(w, h, |_, _| Luma([rng.gen::<u8>()]));
            let fast = sauvola_integral(&img, &config);
            let slow = sauvola_naive(&img, &config);
            assert_eq!(
                fast.as_raw(),
                slow.as_raw(),
                "mismatch at {w}x{h} block {block_size}"
            );
        }
    }

    #[test]
    fn test_integral_matches_naive_with_window_larger_than_image() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = PrepConfig {
            block_size: 25,
            ..PrepConfig::default()
        };
        let img = GrayImage::from_fn(6, 4, |_, _| Luma([rng.gen::<u8>()]));
        assert_eq!(
            sauvola_integral(&img, &config).as_raw(),
            sauvola_naive(&img, &config).as_raw()
        );
    }
}
