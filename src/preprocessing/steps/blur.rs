use image::GrayImage;

/// 3x3 discrete Gaussian approximation, normalized by 16.
const KERNEL: [[u32; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];

/// Suppress high-frequency grain before thresholding.
///
/// Applies the fixed kernel to interior pixels only; the one-pixel border
/// passes through unmodified. The kernel is small relative to typical
/// character stroke width, so stroke edges survive while isolated grain
/// (which adaptive thresholding would misclassify as foreground) is
/// flattened.
pub fn apply(src: &GrayImage) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut acc = 0u32;
            for (j, row) in KERNEL.iter().enumerate() {
                for (i, weight) in row.iter().enumerate() {
                    let sx = x + i as u32 - 1;
                    let sy = y + j as u32 - 1;
                    acc += weight * u32::from(src.get_pixel(sx, sy).0[0]);
                }
            }
            // Round to nearest rather than truncate
            out.get_pixel_mut(x, y).0[0] = ((acc + 8) / 16) as u8;
        }
    }
    out
}
