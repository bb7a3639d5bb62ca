//! Owned pixel buffers.
//!
//! A [`PixelBuffer`] is the only image representation the algorithms in this
//! crate operate on. Samples are stored row-major and interleaved by channel,
//! widened to `u16` so that 8-bit and 16-bit images share one code path.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StegoSealError};

/// Channel arrangement of a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelLayout {
    Luma,
    LumaAlpha,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    /// Number of samples per pixel.
    pub fn channels(self) -> usize {
        match self {
            ChannelLayout::Luma => 1,
            ChannelLayout::LumaAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }

    fn tag(self) -> u8 {
        match self {
            ChannelLayout::Luma => 1,
            ChannelLayout::LumaAlpha => 2,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// Bits per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Largest representable sample value.
    pub fn max_value(self) -> u16 {
        match self {
            BitDepth::Eight => u8::MAX as u16,
            BitDepth::Sixteen => u16::MAX,
        }
    }
}

/// An owned, mutable grid of pixel samples.
///
/// Width, height, layout and depth are fixed at construction. Sample values
/// may be changed in place but the number of samples never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    layout: ChannelLayout,
    depth: BitDepth,
    samples: Vec<u16>,
}

impl PixelBuffer {
    /// Create a buffer from raw interleaved samples.
    ///
    /// Fails if the sample count does not match the geometry, or if a sample
    /// exceeds the range of the declared bit depth.
    pub fn new(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        depth: BitDepth,
        samples: Vec<u16>,
    ) -> Result<Self> {
        let expected = sample_count(width, height, layout)?;
        if samples.len() != expected {
            return Err(StegoSealError::InvalidPixelBuffer(format!(
                "{}x{} {:?} needs {} samples, got {}",
                width,
                height,
                layout,
                expected,
                samples.len()
            )));
        }

        let max = depth.max_value();
        if let Some(pos) = samples.iter().position(|&s| s > max) {
            return Err(StegoSealError::InvalidPixelBuffer(format!(
                "sample {} at index {} exceeds {}-bit range",
                samples[pos],
                pos,
                depth.bits()
            )));
        }

        Ok(Self {
            width,
            height,
            layout,
            depth,
            samples,
        })
    }

    /// Create an 8-bit buffer from byte samples.
    pub fn from_u8(width: u32, height: u32, layout: ChannelLayout, samples: &[u8]) -> Result<Self> {
        Self::new(
            width,
            height,
            layout,
            BitDepth::Eight,
            samples.iter().map(|&s| s as u16).collect(),
        )
    }

    /// Create a buffer with every sample set to `value`.
    pub fn filled(
        width: u32,
        height: u32,
        layout: ChannelLayout,
        depth: BitDepth,
        value: u16,
    ) -> Result<Self> {
        let count = sample_count(width, height, layout)?;
        Self::new(width, height, layout, depth, vec![value; count])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    pub fn channels(&self) -> usize {
        self.layout.channels()
    }

    /// All samples, row-major, interleaved by channel.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Mutable access to samples. The slice length is fixed.
    pub fn samples_mut(&mut self) -> &mut [u16] {
        &mut self.samples
    }

    fn index(&self, x: u32, y: u32, channel: usize) -> Option<usize> {
        if x >= self.width || y >= self.height || channel >= self.channels() {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * self.channels() + channel)
    }

    /// Read one sample, or `None` when out of bounds.
    pub fn sample(&self, x: u32, y: u32, channel: usize) -> Option<u16> {
        self.index(x, y, channel).map(|i| self.samples[i])
    }

    /// Overwrite one sample. Values are clamped to the bit depth.
    pub fn set_sample(&mut self, x: u32, y: u32, channel: usize, value: u16) -> Result<()> {
        let idx = self.index(x, y, channel).ok_or_else(|| {
            StegoSealError::InvalidPixelBuffer(format!(
                "({}, {}, channel {}) outside {}x{}x{}",
                x,
                y,
                channel,
                self.width,
                self.height,
                self.channels()
            ))
        })?;
        self.samples[idx] = value.min(self.depth.max_value());
        Ok(())
    }

    /// Copy of this buffer with the least significant bit of the first
    /// `carrier_bits` samples cleared.
    ///
    /// Those LSBs hold an embedded payload; every other bit is content.
    /// Counts past the end of the buffer clear every sample.
    pub fn with_carrier_cleared(&self, carrier_bits: u64) -> Self {
        let carrier = usize::try_from(carrier_bits)
            .unwrap_or(usize::MAX)
            .min(self.samples.len());
        let mut samples = self.samples.clone();
        for sample in &mut samples[..carrier] {
            *sample &= !1;
        }
        Self {
            width: self.width,
            height: self.height,
            layout: self.layout,
            depth: self.depth,
            samples,
        }
    }

    /// Convert to 8-bit grayscale, one byte per pixel.
    ///
    /// Uses ITU-R 601-2 luma weights; alpha is ignored and 16-bit samples
    /// keep their high byte.
    pub fn to_luma8(&self) -> Vec<u8> {
        let shift = self.depth.bits() - 8;
        let channels = self.channels();
        self.samples
            .chunks_exact(channels)
            .map(|px| {
                let v = |i: usize| (px[i] >> shift) as u32;
                match self.layout {
                    ChannelLayout::Luma | ChannelLayout::LumaAlpha => v(0) as u8,
                    ChannelLayout::Rgb | ChannelLayout::Rgba => {
                        ((v(0) * 299 + v(1) * 587 + v(2) * 114 + 500) / 1000) as u8
                    }
                }
            })
            .collect()
    }

    /// Stable byte encoding of geometry, used as digest domain separation.
    pub(crate) fn geometry_bytes(&self) -> [u8; 10] {
        let mut out = [0u8; 10];
        out[0..4].copy_from_slice(&self.width.to_be_bytes());
        out[4..8].copy_from_slice(&self.height.to_be_bytes());
        out[8] = self.layout.tag();
        out[9] = self.depth.bits() as u8;
        out
    }
}

fn sample_count(width: u32, height: u32, layout: ChannelLayout) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(layout.channels()))
        .ok_or_else(|| {
            StegoSealError::InvalidPixelBuffer(format!("{}x{} overflows sample count", width, height))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_sample_count() {
        let result = PixelBuffer::new(2, 2, ChannelLayout::Rgb, BitDepth::Eight, vec![0; 11]);
        assert!(matches!(result, Err(StegoSealError::InvalidPixelBuffer(_))));
    }

    #[test]
    fn test_new_rejects_out_of_range_sample() {
        let result = PixelBuffer::new(1, 1, ChannelLayout::Luma, BitDepth::Eight, vec![256]);
        assert!(matches!(result, Err(StegoSealError::InvalidPixelBuffer(_))));

        let ok = PixelBuffer::new(1, 1, ChannelLayout::Luma, BitDepth::Sixteen, vec![256]);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_sample_indexing_is_row_major() {
        let samples: Vec<u8> = (0..12).collect();
        let buffer = PixelBuffer::from_u8(2, 2, ChannelLayout::Rgb, &samples).unwrap();

        assert_eq!(buffer.sample(0, 0, 0), Some(0));
        assert_eq!(buffer.sample(1, 0, 2), Some(5));
        assert_eq!(buffer.sample(0, 1, 1), Some(7));
        assert_eq!(buffer.sample(2, 0, 0), None);
        assert_eq!(buffer.sample(0, 0, 3), None);
    }

    #[test]
    fn test_set_sample_clamps_to_depth() {
        let mut buffer =
            PixelBuffer::filled(1, 1, ChannelLayout::Luma, BitDepth::Eight, 0).unwrap();
        buffer.set_sample(0, 0, 0, 1000).unwrap();
        assert_eq!(buffer.sample(0, 0, 0), Some(255));
        assert!(buffer.set_sample(1, 0, 0, 1).is_err());
    }

    #[test]
    fn test_with_carrier_cleared_masks_prefix_only() {
        let buffer = PixelBuffer::from_u8(2, 1, ChannelLayout::Rgb, &[255, 129, 7, 3, 5, 9]).unwrap();
        assert_eq!(buffer.with_carrier_cleared(4).samples(), &[254, 128, 6, 2, 5, 9]);
        assert_eq!(buffer.with_carrier_cleared(0), buffer);
        assert_eq!(buffer.with_carrier_cleared(u64::MAX).samples(), &[254, 128, 6, 2, 4, 8]);
    }

    #[test]
    fn test_to_luma8_weights() {
        let buffer =
            PixelBuffer::from_u8(2, 1, ChannelLayout::Rgba, &[255, 255, 255, 0, 255, 0, 0, 255])
                .unwrap();
        assert_eq!(buffer.to_luma8(), vec![255, 76]);

        let wide = PixelBuffer::new(1, 1, ChannelLayout::Luma, BitDepth::Sixteen, vec![0xABCD])
            .unwrap();
        assert_eq!(wide.to_luma8(), vec![0xAB]);
    }
}
