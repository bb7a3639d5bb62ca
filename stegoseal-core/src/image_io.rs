//! Conversion between encoded image files and [`PixelBuffer`].
//!
//! Signed images must be written losslessly or the carrier bit plane is
//! destroyed, so the only output format offered is PNG.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Pixel};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StegoSealError};
use crate::pixels::{BitDepth, ChannelLayout, PixelBuffer};

/// Basic facts about an encoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    /// Container format, e.g. `PNG`.
    pub format: String,
    /// Pixel mode, e.g. `RGB`, `RGBA`, `L`, `I;16`.
    pub mode: String,
    pub size_bytes: u64,
}

impl PixelBuffer {
    /// Convert a decoded image.
    ///
    /// Floating point images are rejected rather than quantized, since
    /// quantizing would already alter the content being signed.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        let (w, h) = (image.width(), image.height());
        let widen = |raw: &[u8]| raw.iter().map(|&s| s as u16).collect::<Vec<u16>>();

        let (layout, depth, samples) = match image {
            DynamicImage::ImageLuma8(img) => (ChannelLayout::Luma, BitDepth::Eight, widen(img.as_raw())),
            DynamicImage::ImageLumaA8(img) => {
                (ChannelLayout::LumaAlpha, BitDepth::Eight, widen(img.as_raw()))
            }
            DynamicImage::ImageRgb8(img) => (ChannelLayout::Rgb, BitDepth::Eight, widen(img.as_raw())),
            DynamicImage::ImageRgba8(img) => (ChannelLayout::Rgba, BitDepth::Eight, widen(img.as_raw())),
            DynamicImage::ImageLuma16(img) => (ChannelLayout::Luma, BitDepth::Sixteen, img.as_raw().clone()),
            DynamicImage::ImageLumaA16(img) => {
                (ChannelLayout::LumaAlpha, BitDepth::Sixteen, img.as_raw().clone())
            }
            DynamicImage::ImageRgb16(img) => (ChannelLayout::Rgb, BitDepth::Sixteen, img.as_raw().clone()),
            DynamicImage::ImageRgba16(img) => {
                (ChannelLayout::Rgba, BitDepth::Sixteen, img.as_raw().clone())
            }
            other => {
                return Err(StegoSealError::UnsupportedFormat(format!(
                    "pixel type {:?} is not supported",
                    other.color()
                )))
            }
        };

        PixelBuffer::new(w, h, layout, depth, samples)
    }

    /// Convert back to a decoded image with the same layout and depth.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width(), self.height());
        let narrow = || self.samples().iter().map(|&s| s as u8).collect::<Vec<u8>>();
        let wide = || self.samples().to_vec();

        let image = match (self.layout(), self.depth()) {
            (ChannelLayout::Luma, BitDepth::Eight) => DynamicImage::ImageLuma8(raw_image(w, h, narrow())?),
            (ChannelLayout::LumaAlpha, BitDepth::Eight) => {
                DynamicImage::ImageLumaA8(raw_image(w, h, narrow())?)
            }
            (ChannelLayout::Rgb, BitDepth::Eight) => DynamicImage::ImageRgb8(raw_image(w, h, narrow())?),
            (ChannelLayout::Rgba, BitDepth::Eight) => DynamicImage::ImageRgba8(raw_image(w, h, narrow())?),
            (ChannelLayout::Luma, BitDepth::Sixteen) => DynamicImage::ImageLuma16(raw_image(w, h, wide())?),
            (ChannelLayout::LumaAlpha, BitDepth::Sixteen) => {
                DynamicImage::ImageLumaA16(raw_image(w, h, wide())?)
            }
            (ChannelLayout::Rgb, BitDepth::Sixteen) => DynamicImage::ImageRgb16(raw_image(w, h, wide())?),
            (ChannelLayout::Rgba, BitDepth::Sixteen) => DynamicImage::ImageRgba16(raw_image(w, h, wide())?),
        };

        Ok(image)
    }
}

fn raw_image<P: Pixel>(
    width: u32,
    height: u32,
    raw: Vec<P::Subpixel>,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>> {
    ImageBuffer::from_raw(width, height, raw).ok_or_else(|| {
        StegoSealError::InvalidPixelBuffer("sample count does not match geometry".into())
    })
}

/// Decode an encoded image (JPEG, PNG, GIF or WebP).
pub fn decode_bytes(data: &[u8]) -> Result<PixelBuffer> {
    let image = image::load_from_memory(data)
        .map_err(|e| StegoSealError::UnsupportedFormat(format!("Failed to decode image: {}", e)))?;
    debug!(
        width = image.width(),
        height = image.height(),
        color = ?image.color(),
        "Decoded image"
    );
    PixelBuffer::from_dynamic(&image)
}

/// Read and decode an image file.
pub fn decode_path(path: impl AsRef<Path>) -> Result<PixelBuffer> {
    let data = std::fs::read(path)?;
    decode_bytes(&data)
}

/// Encode a buffer as PNG.
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    buffer
        .to_dynamic()?
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| StegoSealError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Encode a buffer as PNG and write it to `path`.
pub fn save_png(buffer: &PixelBuffer, path: impl AsRef<Path>) -> Result<()> {
    let bytes = encode_png(buffer)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Check if the provided bytes appear to be a supported image format.
pub fn is_supported_format(data: &[u8]) -> bool {
    image::guess_format(data).is_ok()
}

/// Describe an encoded image without keeping its pixels.
pub fn read_metadata(data: &[u8]) -> Result<ImageMetadata> {
    let buffer = decode_bytes(data)?;
    describe(data, &buffer)
}

/// Describe an encoded image whose pixels were already decoded.
pub fn describe(data: &[u8], buffer: &PixelBuffer) -> Result<ImageMetadata> {
    let format = image::guess_format(data)
        .map_err(|e| StegoSealError::UnsupportedFormat(e.to_string()))?;

    Ok(ImageMetadata {
        width: buffer.width(),
        height: buffer.height(),
        format: format_name(format),
        mode: mode_name(buffer.layout(), buffer.depth()),
        size_bytes: data.len() as u64,
    })
}

fn format_name(format: ImageFormat) -> String {
    format!("{:?}", format).to_uppercase()
}

/// PIL-style mode string. 16-bit grayscale is `I;16`; other 16-bit
/// layouts have no PIL mode and get a `;16` suffix.
fn mode_name(layout: ChannelLayout, depth: BitDepth) -> String {
    let base = match layout {
        ChannelLayout::Luma => "L",
        ChannelLayout::LumaAlpha => "LA",
        ChannelLayout::Rgb => "RGB",
        ChannelLayout::Rgba => "RGBA",
    };
    match (layout, depth) {
        (_, BitDepth::Eight) => base.to_string(),
        (ChannelLayout::Luma, BitDepth::Sixteen) => "I;16".to_string(),
        (_, BitDepth::Sixteen) => format!("{};16", base),
    }
}
