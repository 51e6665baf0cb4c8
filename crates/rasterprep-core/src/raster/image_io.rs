//! Conversion from decoded `image` crate images into float rasters.
//!
//! This is the boundary with the upstream sample source: whatever decoded
//! the bytes hands over a `DynamicImage`, and the transforms see an HWC
//! `f32` raster with values in `0.0..=255.0`.

use image::DynamicImage;

use super::Raster;

impl Raster<f32> {
    /// Convert a decoded image into an interleaved `f32` raster.
    ///
    /// Channel Handling
    /// | Input Format          | Channels |
    /// |-----------------------|----------|
    /// | Grayscale (L)         | 1        |
    /// | Any format with alpha | 4 (RGBA) |
    /// | Other                 | 3 (RGB)  |
    pub fn from_dynamic_image(image: &DynamicImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let color = image.color();

        let (channels, bytes) = if color.channel_count() == 1 {
            (1, image.to_luma8().into_raw())
        } else if color.has_alpha() {
            (4, image.to_rgba8().into_raw())
        } else {
            (3, image.to_rgb8().into_raw())
        };

        let data = bytes.into_iter().map(f32::from).collect();
        Raster::owned(data, width, height, channels)
    }
}
