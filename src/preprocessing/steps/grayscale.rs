use image::{GrayImage, Luma, RgbaImage};

/// Convert RGBA to single-channel luminance.
///
/// Uses the Rec. 601 perceptual weighting (green dominant) rather than a
/// flat average: downstream thresholding relies on luminance separating
/// text from background. Alpha is ignored — there is no compositing.
pub fn apply(image: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, _a] = image.get_pixel(x, y).0;
        let luma = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}
