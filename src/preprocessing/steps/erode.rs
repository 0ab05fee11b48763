use image::GrayImage;

/// Morphological erosion: 3x3 minimum filter over the binary image.
///
/// Removes any bright pixel not supported by its full 3x3 neighborhood,
/// which strips the isolated single-pixel specks that small-neighborhood
/// binarization leaves behind. Border pixels pass through unmodified,
/// matching the blur stage. No dilation follows.
pub fn apply(src: &GrayImage) -> GrayImage {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    if width < 3 || height < 3 {
        return out;
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut min = u8::MAX;
            for sy in y - 1..=y + 1 {
                for sx in x - 1..=x + 1 {
                    min = min.min(src.get_pixel(sx, sy).0[0]);
                }
            }
            out.get_pixel_mut(x, y).0[0] = min;
        }
    }
    out
}
