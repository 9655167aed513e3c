//! Blend weight masks.
//!
//! A [`Mask`] holds one weight per pixel in `[0, 1]`. Masks supplied by
//! callers describe how strongly each source pixel participates; the mask
//! returned by blending reports coverage (1.0 where any source contributed).
//!
//! Integer masks on a 0..255 scale are accepted through [`Mask::from_u8`].

use crate::{Error, Result};

/// Single-channel weight map with values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    data: Vec<f32>,
    width: u32,
    height: u32,
}

impl Mask {
    /// Mask with every weight set to 1.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            data: vec![1.0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Mask with every weight set to 0.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            data: vec![0.0; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Builds a mask from 8-bit weights, mapping 0..255 to `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the length is not `width * height`.
    pub fn from_u8(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        check_len(width, height, data.len())?;
        Ok(Self {
            data: data.iter().map(|&v| v as f32 / 255.0).collect(),
            width,
            height,
        })
    }

    /// Builds a mask from float weights, clamping each to `[0, 1]`.
    ///
    /// NaN weights become 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the length is not `width * height`.
    pub fn from_weights(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        check_len(width, height, data.len())?;
        let data = data
            .into_iter()
            .map(sanitize)
            .collect();
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Builds a mask by evaluating `f(x, y)`; results are clamped to `[0, 1]`
    /// and NaN becomes 0.
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> f32,
    {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(sanitize(f(x, y)));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Returns the mask width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the mask height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the mask dimensions as (width, height).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the weights in row-major order.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the weight at (x, y).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        debug_assert!(x < self.width && y < self.height, "mask index out of bounds");
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Sets the weight at (x, y), clamped to `[0, 1]`; NaN becomes 0.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, weight: f32) {
        debug_assert!(x < self.width && y < self.height, "mask index out of bounds");
        self.data[y as usize * self.width as usize + x as usize] = sanitize(weight);
    }

    /// Returns `true` if the weight at (x, y) is non-zero.
    #[inline]
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        self.get(x, y) > 0.0
    }

    /// Number of pixels with a non-zero weight.
    pub fn covered_count(&self) -> usize {
        self.data.iter().filter(|&&w| w > 0.0).count()
    }

    /// Converts weights back to the 0..255 scale.
    pub fn to_u8(&self) -> Vec<u8> {
        self.data.iter().map(|&w| (w * 255.0).round() as u8).collect()
    }
}

fn check_len(width: u32, height: u32, len: usize) -> Result<()> {
    let expected = width as usize * height as usize;
    if len != expected {
        return Err(Error::invalid_dimensions(
            width,
            height,
            format!("expected {} weights, got {}", expected, len),
        ));
    }
    Ok(())
}

/// Clamps a weight to `[0, 1]`, mapping NaN to 0.
#[inline]
fn sanitize(w: f32) -> f32 {
    if w.is_nan() { 0.0 } else { w.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_u8_scale() {
        let m = Mask::from_u8(2, 1, &[255, 51]).unwrap();
        assert_relative_eq!(m.get(0, 0), 1.0);
        assert_relative_eq!(m.get(1, 0), 0.2);
        assert_eq!(m.to_u8(), vec![255, 51]);
    }

    #[test]
    fn test_from_weights_clamps() {
        let m = Mask::from_weights(3, 1, vec![-1.0, 0.5, f32::NAN]).unwrap();
        assert_eq!(m.data(), &[0.0, 0.5, 0.0]);
        assert!(Mask::from_weights(2, 2, vec![1.0; 3]).is_err());
    }

    #[test]
    fn test_nan_weights_become_zero() {
        let m = Mask::from_fn(2, 2, |x, _| if x == 0 { f32::NAN } else { 1.5 });
        assert_eq!(m.data(), &[0.0, 1.0, 0.0, 1.0]);

        let mut m = Mask::full(2, 2);
        m.set(1, 1, f32::NAN);
        m.set(0, 1, -2.0);
        assert_eq!(m.data(), &[1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_coverage() {
        let m = Mask::from_fn(4, 2, |x, _| if x < 2 { 1.0 } else { 0.0 });
        assert_eq!(m.covered_count(), 4);
        assert!(m.is_covered(1, 1));
        assert!(!m.is_covered(2, 0));
        assert_eq!(Mask::full(3, 3).covered_count(), 9);
        let mut m = Mask::empty(3, 3);
        assert_eq!(m.covered_count(), 0);
        m.set(1, 2, 0.4);
        assert!(m.is_covered(1, 2));
        assert_eq!(m.covered_count(), 1);
    }
}
