use image::RgbImage;
use rayon::prelude::*;
use std::slice::ChunksExactMut;

use crate::core::math::vector::{Vec2, warp};
use crate::error::ConvertError;

/// Channel count every buffer is forced to on load.
pub const RGB_CHANNELS: usize = 3;

/// An owned, tightly packed, row-major grid of 8-bit pixels.
///
/// The store always holds exactly `width * height * channels` bytes and is
/// never resized after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Reserves a zeroed pixel store.
    ///
    /// Zero dimensions, a size that overflows `usize`, or a failed
    /// reservation are all reported as [`ConvertError::Allocation`].
    pub fn allocate(width: usize, height: usize, channels: usize) -> Result<Self, ConvertError> {
        let err = || ConvertError::Allocation {
            width,
            height,
            channels,
        };

        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(channels))
            .filter(|&n| n > 0)
            .ok_or_else(err)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| err())?;
        data.resize(len, 0);

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Wraps an existing store. Returns `None` if the length does not match
    /// the dimensions or any dimension is zero.
    pub fn from_raw(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Option<Self> {
        let len = width.checked_mul(height)?.checked_mul(channels)?;
        if len == 0 || data.len() != len {
            return None;
        }
        Some(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Takes over a decoded RGB image without copying.
    pub fn from_rgb(img: RgbImage) -> Option<Self> {
        let (w, h) = img.dimensions();
        Self::from_raw(w as usize, h as usize, RGB_CHANNELS, img.into_raw())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Bytes in one row.
    pub fn stride(&self) -> usize {
        self.width * self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline(always)]
    fn offset(&self, col: usize, row: usize) -> usize {
        (row * self.width + col) * self.channels
    }

    /// Pixel at `(col, row)`. Panics when out of bounds.
    #[inline]
    pub fn pixel(&self, col: usize, row: usize) -> &[u8] {
        assert!(col < self.width && row < self.height, "pixel ({col}, {row}) out of bounds");
        let start = self.offset(col, row);
        &self.data[start..start + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, col: usize, row: usize) -> &mut [u8] {
        assert!(col < self.width && row < self.height, "pixel ({col}, {row}) out of bounds");
        let start = self.offset(col, row);
        &mut self.data[start..start + self.channels]
    }

    /// Nearest pixel to a normalized coordinate, with wraparound.
    ///
    /// Each axis is wrapped into `[0, 1)`, scaled to the dimension, rounded,
    /// and reduced modulo the dimension once more. The order matters: moving
    /// the modulo before the rounding shifts boundary lookups by a texel.
    #[inline]
    pub fn sample_index(&self, uv: &Vec2) -> (usize, usize) {
        let col = (warp(uv.x) * self.width as f32).round() as usize % self.width;
        let row = (warp(uv.y) * self.height as f32).round() as usize % self.height;
        (col, row)
    }

    #[inline]
    pub fn sample(&self, uv: &Vec2) -> &[u8] {
        let (col, row) = self.sample_index(uv);
        self.pixel(col, row)
    }

    #[inline]
    pub fn sample_mut(&mut self, uv: &Vec2) -> &mut [u8] {
        let (col, row) = self.sample_index(uv);
        self.pixel_mut(col, row)
    }

    /// Disjoint mutable rows, top to bottom.
    pub fn rows_mut(&mut self) -> ChunksExactMut<'_, u8> {
        let stride = self.stride();
        self.data.chunks_exact_mut(stride)
    }

    /// Disjoint mutable rows for the rayon pool.
    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksExactMut<'_, u8> {
        let stride = self.stride();
        self.data.par_chunks_exact_mut(stride)
    }

    /// Copies out the `width x height` rectangle whose top-left is `(x, y)`.
    pub fn region(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<ImageBuffer, ConvertError> {
        assert!(
            x + width <= self.width && y + height <= self.height,
            "region {width}x{height}+{x}+{y} exceeds {}x{}",
            self.width,
            self.height
        );
        let mut out = ImageBuffer::allocate(width, height, self.channels)?;
        let span = width * self.channels;
        for (row, dst) in out.rows_mut().enumerate() {
            let start = self.offset(x, y + row);
            dst.copy_from_slice(&self.data[start..start + span]);
        }
        Ok(out)
    }

    /// Pastes `src` with its top-left at `(x, y)`.
    pub fn blit(&mut self, src: &ImageBuffer, x: usize, y: usize) {
        assert_eq!(self.channels, src.channels, "channel count mismatch");
        assert!(
            x + src.width <= self.width && y + src.height <= self.height,
            "blit target out of bounds"
        );
        let span = src.stride();
        for (row, line) in src.data.chunks_exact(span).enumerate() {
            let start = self.offset(x, y + row);
            self.data[start..start + span].copy_from_slice(line);
        }
    }

    /// Hands the store to the `image` crate. `None` unless the buffer is RGB.
    ///
    /// For library callers; the CLI encodes straight from [`Self::as_bytes`].
    pub fn into_rgb(self) -> Option<RgbImage> {
        if self.channels != RGB_CHANNELS {
            return None;
        }
        RgbImage::from_raw(self.width as u32, self.height as u32, self.data)
    }
}

/// Copies one pixel channel-for-channel. Both sides must share a channel count.
#[inline(always)]
pub fn copy_pixel(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len(), "channel count mismatch");
    dst.copy_from_slice(src);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x2 RGB image where pixel (c, r) is [c, r, 7].
    fn indexed(width: usize, height: usize) -> ImageBuffer {
        let mut img = ImageBuffer::allocate(width, height, 3).unwrap();
        for r in 0..height {
            for c in 0..width {
                img.pixel_mut(c, r).copy_from_slice(&[c as u8, r as u8, 7]);
            }
        }
        img
    }

    #[test]
    fn test_allocate_is_zeroed_and_sized() {
        let img = ImageBuffer::allocate(5, 4, 3).unwrap();
        assert_eq!(img.as_bytes().len(), 60);
        assert!(img.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(img.pixel_count(), 20);
        assert_eq!(img.stride(), 15);
    }

    #[test]
    fn test_allocate_rejects_impossible_sizes() {
        assert!(matches!(
            ImageBuffer::allocate(0, 4, 3),
            Err(ConvertError::Allocation { .. })
        ));
        assert!(matches!(
            ImageBuffer::allocate(usize::MAX, 2, 3),
            Err(ConvertError::Allocation { .. })
        ));
        assert!(matches!(
            ImageBuffer::allocate(usize::MAX / 4, 1, 3),
            Err(ConvertError::Allocation { .. })
        ));
    }

    #[test]
    fn test_from_raw_checks_length() {
        assert!(ImageBuffer::from_raw(2, 2, 3, vec![0; 12]).is_some());
        assert!(ImageBuffer::from_raw(2, 2, 3, vec![0; 11]).is_none());
        assert!(ImageBuffer::from_raw(0, 2, 3, vec![]).is_none());
    }

    #[test]
    fn test_sample_rounds_to_nearest() {
        let img = indexed(4, 2);
        assert_eq!(img.sample_index(&Vec2::new(0.0, 0.0)), (0, 0));
        assert_eq!(img.sample_index(&Vec2::new(0.3, 0.3)), (1, 1));
        // 0.125 * 4 = 0.5 rounds away from zero
        assert_eq!(img.sample_index(&Vec2::new(0.125, 0.0)), (1, 0));
        assert_eq!(img.sample(&Vec2::new(0.5, 0.5)), &[2, 1, 7]);
    }

    #[test]
    fn test_sample_rounding_past_edge_wraps() {
        let img = indexed(4, 2);
        // 0.9 * 4 = 3.6 rounds to 4, which wraps to column 0
        assert_eq!(img.sample_index(&Vec2::new(0.9, 0.0)), (0, 0));
        assert_eq!(img.sample_index(&Vec2::new(0.0, 0.8)), (0, 0));
    }

    #[test]
    fn test_sample_wraparound_is_periodic() {
        let img = indexed(7, 5);
        for &(x, y) in &[(0.1f32, 0.2f32), (0.55, 0.95), (0.0, 0.5), (0.73, 0.01)] {
            let base = img.sample_index(&Vec2::new(x, y));
            for k in [-3.0f32, -1.0, 1.0, 2.0] {
                assert_eq!(img.sample_index(&Vec2::new(x + k, y)), base, "x {x}+{k}");
                assert_eq!(img.sample_index(&Vec2::new(x, y + k)), base, "y {y}+{k}");
            }
        }
    }

    #[test]
    fn test_sample_negative_coordinates() {
        let img = indexed(4, 2);
        // -0.25 wraps to 0.75 -> column 3
        assert_eq!(img.sample_index(&Vec2::new(-0.25, -0.5)), (3, 1));
    }

    #[test]
    fn test_sample_mut_writes_through() {
        let mut img = indexed(4, 2);
        copy_pixel(img.sample_mut(&Vec2::new(0.25, 0.5)), &[9, 9, 9]);
        assert_eq!(img.pixel(1, 1), &[9, 9, 9]);
    }

    #[test]
    #[should_panic]
    fn test_pixel_out_of_bounds_panics() {
        let img = indexed(4, 2);
        img.pixel(4, 0);
    }

    #[test]
    fn test_rows_are_disjoint() {
        let mut img = indexed(3, 4);
        let rows: Vec<_> = img.rows_mut().map(|r| r.to_vec()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2], vec![0, 2, 7, 1, 2, 7, 2, 2, 7]);

        img.par_rows_mut().for_each(|row| row.fill(1));
        assert!(img.as_bytes().iter().all(|&b| b == 1));
    }

    #[test]
    fn test_region_and_blit() {
        let img = indexed(6, 2);
        let part = img.region(2, 0, 2, 2).unwrap();
        assert_eq!(part.width(), 2);
        assert_eq!(part.pixel(0, 1), &[2, 1, 7]);
        assert_eq!(part.pixel(1, 0), &[3, 0, 7]);

        let mut canvas = ImageBuffer::allocate(6, 2, 3).unwrap();
        canvas.blit(&part, 4, 0);
        assert_eq!(canvas.pixel(4, 1), &[2, 1, 7]);
        assert_eq!(canvas.pixel(0, 0), &[0, 0, 0]);
    }

    #[test]
    fn test_rgb_exchange() {
        let img = indexed(3, 2);
        let rgb = img.clone().into_rgb().unwrap();
        assert_eq!(rgb.get_pixel(2, 1).0, [2, 1, 7]);
        assert_eq!(ImageBuffer::from_rgb(rgb).unwrap(), img);

        let gray = ImageBuffer::allocate(2, 2, 1).unwrap();
        assert!(gray.into_rgb().is_none());
    }
}
