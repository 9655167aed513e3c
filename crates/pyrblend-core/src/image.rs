//! Image buffer types.
//!
//! - [`Image`] - Owned interleaved buffer, generic over the [`Sample`] type
//! - [`AnyImage`] - Runtime-typed wrapper used at I/O boundaries
//!
//! # Memory Layout
//!
//! Images store pixels in **row-major** order, top-to-bottom, with channels
//! interleaved:
//!
//! ```text
//! Memory: [R G B R G B R G B ...]  ← Row 0
//!         [R G B R G B R G B ...]  ← Row 1
//!         ...
//! ```
//!
//! The channel count is a runtime value: blending accepts any count, as long
//! as every source of one blend agrees.
//!
//! # Usage
//!
//! ```rust
//! use pyrblend_core::Image;
//!
//! let mut img: Image<u8> = Image::new(8, 4, 3);
//! img.set_pixel(1, 2, &[10, 20, 30]);
//! assert_eq!(img.pixel(1, 2), &[10, 20, 30]);
//!
//! let float: Image<f32> = img.convert();
//! assert!((float.pixel(1, 2)[0] - 10.0 / 255.0).abs() < 1e-6);
//! ```

use crate::{Error, Rect, Result, Sample, SampleFormat};

/// Owned image buffer with a runtime channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T: Sample> {
    data: Vec<T>,
    width: u32,
    height: u32,
    channels: usize,
}

impl<T: Sample> Image<T> {
    /// Creates a new image filled with zeros.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero.
    pub fn new(width: u32, height: u32, channels: usize) -> Self {
        assert!(channels > 0, "image must have at least one channel");
        let len = width as usize * height as usize * channels;
        Self {
            data: vec![T::zero(); len],
            width,
            height,
            channels,
        }
    }

    /// Creates an image from existing pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if `channels` is zero or the data
    /// length is not `width * height * channels`.
    pub fn from_data(width: u32, height: u32, channels: usize, data: Vec<T>) -> Result<Self> {
        if channels == 0 {
            return Err(Error::invalid_dimensions(width, height, "zero channels"));
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(Error::invalid_dimensions(
                width,
                height,
                format!("expected {} elements, got {}", expected, data.len()),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates an image where every pixel equals `pixel`.
    ///
    /// The channel count is `pixel.len()`.
    ///
    /// # Panics
    ///
    /// Panics if `pixel` is empty.
    pub fn filled(width: u32, height: u32, pixel: &[T]) -> Self {
        assert!(!pixel.is_empty(), "image must have at least one channel");
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * pixel.len());
        for _ in 0..count {
            data.extend_from_slice(pixel);
        }
        Self {
            data,
            width,
            height,
            channels: pixel.len(),
        }
    }

    /// Creates an image by evaluating `f(x, y, channel)` for every sample.
    pub fn from_fn<F>(width: u32, height: u32, channels: usize, mut f: F) -> Self
    where
        F: FnMut(u32, u32, usize) -> T,
    {
        let mut img = Self::new(width, height, channels);
        for y in 0..height {
            let row = img.row_mut(y);
            for x in 0..width {
                for c in 0..channels {
                    row[x as usize * channels + c] = f(x, y, c);
                }
            }
        }
        img
    }

    /// Returns the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the image dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the number of channels per pixel.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the sample format tag.
    #[inline]
    pub fn format(&self) -> SampleFormat {
        T::FORMAT
    }

    /// Returns a rectangle covering the entire image.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Returns `true` if the image has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the raw sample data.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the raw sample data mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the image and returns its sample buffer.
    #[inline]
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels
    }

    /// Returns the samples of the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[T] {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let o = self.offset(x, y);
        &self.data[o..o + self.channels]
    }

    /// Returns the pixel at (x, y), or an error if out of bounds.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<&[T]> {
        if x < self.width && y < self.height {
            Ok(self.pixel(x, y))
        } else {
            Err(Error::out_of_bounds(x, y, self.width, self.height))
        }
    }

    /// Sets the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds or `pixel` has the wrong length.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: &[T]) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let o = self.offset(x, y);
        self.data[o..o + self.channels].copy_from_slice(pixel);
    }

    /// Returns a row of samples.
    #[inline]
    pub fn row(&self, y: u32) -> &[T] {
        let start = self.offset(0, y);
        &self.data[start..start + self.width as usize * self.channels]
    }

    /// Returns a mutable row of samples.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [T] {
        let start = self.offset(0, y);
        let len = self.width as usize * self.channels;
        &mut self.data[start..start + len]
    }

    /// Converts every sample to another sample type through normalized f32.
    pub fn convert<U: Sample>(&self) -> Image<U> {
        Image {
            data: self.data.iter().map(|&v| U::from_f32(v.to_f32())).collect(),
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }
}

/// Image with a sample type chosen at runtime.
///
/// Produced by loaders and returned by the blender, which preserves the
/// sample format of its sources.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyImage {
    /// 8-bit unsigned samples.
    U8(Image<u8>),
    /// 16-bit unsigned samples.
    U16(Image<u16>),
    /// 32-bit float samples.
    F32(Image<f32>),
}

impl AnyImage {
    /// Returns the image width in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    /// Returns the image dimensions as (width, height).
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::U8(img) => img.dimensions(),
            Self::U16(img) => img.dimensions(),
            Self::F32(img) => img.dimensions(),
        }
    }

    /// Returns the number of channels per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::U8(img) => img.channels(),
            Self::U16(img) => img.channels(),
            Self::F32(img) => img.channels(),
        }
    }

    /// Returns the sample format tag.
    pub fn format(&self) -> SampleFormat {
        match self {
            Self::U8(_) => SampleFormat::U8,
            Self::U16(_) => SampleFormat::U16,
            Self::F32(_) => SampleFormat::F32,
        }
    }

    /// Converts to a normalized f32 image.
    pub fn to_f32(&self) -> Image<f32> {
        match self {
            Self::U8(img) => img.convert(),
            Self::U16(img) => img.convert(),
            Self::F32(img) => img.clone(),
        }
    }

    /// Converts to an 8-bit image (floats are clamped to `[0, 1]`).
    pub fn to_u8(&self) -> Image<u8> {
        match self {
            Self::U8(img) => img.clone(),
            Self::U16(img) => img.convert(),
            Self::F32(img) => img.convert(),
        }
    }
}

impl From<Image<u8>> for AnyImage {
    fn from(img: Image<u8>) -> Self {
        Self::U8(img)
    }
}

impl From<Image<u16>> for AnyImage {
    fn from(img: Image<u16>) -> Self {
        Self::U16(img)
    }
}

impl From<Image<f32>> for AnyImage {
    fn from(img: Image<f32>) -> Self {
        Self::F32(img)
    }
}
