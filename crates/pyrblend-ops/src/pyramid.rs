//! Gaussian and Laplacian image pyramids.
//!
//! A pyramid with `bands` bands has `bands + 1` levels. Level 0 has the
//! source size; each next level is `((w + 1) / 2, (h + 1) / 2)`.
//!
//! - Gaussian: `G[0] = src`, `G[k+1] = pyr_down(G[k])`
//! - Laplacian: `L[k] = G[k] - pyr_up(G[k+1])` for `k < bands`, `L[bands] = G[bands]`
//!
//! [`Pyramid::collapse`] inverts the Laplacian construction exactly (up to
//! float rounding), since each band stores precisely what `pyr_up` loses.
//!
//! # Example
//!
//! ```rust
//! use pyrblend_core::Image;
//! use pyrblend_ops::pyramid::Pyramid;
//!
//! let src = Image::from_fn(13, 7, 1, |x, y, _| (x * y) as f32 / 91.0);
//! let lap = Pyramid::laplacian(&src, 3).unwrap();
//! assert_eq!(lap.num_levels(), 4);
//! assert_eq!(lap.level(3).dimensions(), (2, 1));
//!
//! let back = lap.collapse().unwrap();
//! assert!((back.pixel(6, 3)[0] - src.pixel(6, 3)[0]).abs() < 1e-5);
//! ```

use crate::kernel::{pyr_down, pyr_down_size, pyr_up};
use crate::{BlendError, OpsResult};
use pyrblend_core::{Image, Mask};
use tracing::trace;

/// Effective band count for a `width` x `height` canvas.
///
/// Limited to `ceil(log2(max(width, height)))` so the coarsest level keeps
/// at least one pixel of real content. Returns 0 for 1x1 or empty canvases.
pub fn band_count(width: u32, height: u32, requested: u32) -> u32 {
    let max = width.max(height);
    if max <= 1 {
        return 0;
    }
    let log2_ceil = 32 - (max - 1).leading_zeros();
    requested.min(log2_ceil)
}

/// Sizes of levels `0..num_levels`, starting from `(width, height)`.
pub fn level_sizes(width: u32, height: u32, num_levels: usize) -> Vec<(u32, u32)> {
    let mut sizes = Vec::with_capacity(num_levels);
    let mut size = (width, height);
    for _ in 0..num_levels {
        sizes.push(size);
        size = pyr_down_size(size.0, size.1);
    }
    sizes
}

/// Ordered levels of a Gaussian or Laplacian pyramid, finest first.
#[derive(Debug, Clone)]
pub struct Pyramid {
    levels: Vec<Image<f32>>,
}

impl Pyramid {
    pub(crate) fn from_levels(levels: Vec<Image<f32>>) -> Self {
        Self { levels }
    }

    /// Builds a Gaussian pyramid with `bands + 1` levels.
    pub fn gaussian(src: &Image<f32>, bands: u32) -> Self {
        trace!(width = src.width(), height = src.height(), bands, "gaussian pyramid");
        let mut levels = Vec::with_capacity(bands as usize + 1);
        levels.push(src.clone());
        for _ in 0..bands {
            let next = match levels.last() {
                Some(prev) => pyr_down(prev),
                None => break,
            };
            levels.push(next);
        }
        Self { levels }
    }

    /// Builds a Laplacian pyramid with `bands + 1` levels.
    ///
    /// The last level holds the coarsest Gaussian residual.
    pub fn laplacian(src: &Image<f32>, bands: u32) -> OpsResult<Self> {
        let mut levels = Self::gaussian(src, bands).levels;
        for k in 0..levels.len().saturating_sub(1) {
            let (w, h) = levels[k].dimensions();
            let up = pyr_up(&levels[k + 1], w, h)?;
            for (v, u) in levels[k].data_mut().iter_mut().zip(up.data()) {
                *v -= u;
            }
        }
        Ok(Self { levels })
    }

    /// Builds a single-channel Gaussian pyramid of blend weights.
    pub fn weights(mask: &Mask, bands: u32) -> OpsResult<Self> {
        let (w, h) = mask.dimensions();
        let base = Image::from_data(w, h, 1, mask.data().to_vec())?;
        Ok(Self::gaussian(&base, bands))
    }

    /// Reconstructs the finest level by summing upsampled levels, coarsest first.
    ///
    /// # Errors
    ///
    /// Returns [`BlendError::InvalidParameter`] for an empty pyramid or
    /// levels whose sizes do not halve consistently.
    pub fn collapse(&self) -> OpsResult<Image<f32>> {
        let mut levels = self.levels.iter().rev();
        let mut acc = levels
            .next()
            .cloned()
            .ok_or_else(|| BlendError::InvalidParameter("empty pyramid".into()))?;
        for level in levels {
            let (w, h) = level.dimensions();
            let mut up = pyr_up(&acc, w, h)?;
            for (u, v) in up.data_mut().iter_mut().zip(level.data()) {
                *u += v;
            }
            acc = up;
        }
        Ok(acc)
    }

    /// Number of levels (bands + 1).
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// Level `k`, where 0 is the finest.
    ///
    /// # Panics
    ///
    /// Panics if `k >= num_levels()`.
    #[inline]
    pub fn level(&self, k: usize) -> &Image<f32> {
        &self.levels[k]
    }

    /// All levels, finest first.
    #[inline]
    pub fn levels(&self) -> &[Image<f32>] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_band_count() {
        assert_eq!(band_count(6, 4, 5), 3);
        assert_eq!(band_count(1024, 768, 5), 5);
        assert_eq!(band_count(2, 1, 5), 1);
        assert_eq!(band_count(1, 1, 5), 0);
        assert_eq!(band_count(0, 0, 5), 0);
        assert_eq!(band_count(64, 64, 5), 5);
        assert_eq!(band_count(17, 3, 9), 5);
    }

    #[test]
    fn test_level_sizes() {
        assert_eq!(level_sizes(13, 7, 4), vec![(13, 7), (7, 4), (4, 2), (2, 1)]);
        assert!(level_sizes(8, 8, 0).is_empty());
    }

    #[test]
    fn test_gaussian_levels() {
        let src: Image<f32> = Image::filled(10, 6, &[0.25]);
        let g = Pyramid::gaussian(&src, 2);
        assert_eq!(g.num_levels(), 3);
        assert_eq!(g.level(2).dimensions(), (3, 2));
        for v in g.level(2).data() {
            assert_relative_eq!(*v, 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_laplacian_of_constant_is_flat() {
        let src: Image<f32> = Image::filled(9, 9, &[0.5, 0.1]);
        let lap = Pyramid::laplacian(&src, 3).unwrap();
        for k in 0..3 {
            for v in lap.level(k).data() {
                assert!(v.abs() < 1e-6);
            }
        }
        assert_relative_eq!(lap.level(3).pixel(0, 0)[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_collapse_round_trip() {
        let src = Image::from_fn(21, 11, 3, |x, y, c| ((x * 7 + y * 3 + c as u32) % 17) as f32 / 17.0);
        let back = Pyramid::laplacian(&src, 4).unwrap().collapse().unwrap();
        assert_eq!(back.dimensions(), src.dimensions());
        for (a, b) in back.data().iter().zip(src.data()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_zero_bands_is_identity() {
        let src = Image::from_fn(3, 2, 1, |x, y, _| (x + y) as f32);
        let lap = Pyramid::laplacian(&src, 0).unwrap();
        assert_eq!(lap.num_levels(), 1);
        assert_eq!(lap.collapse().unwrap(), src);
    }

    #[test]
    fn test_weights_single_channel() {
        let mask = Mask::from_fn(8, 4, |x, _| if x < 4 { 1.0 } else { 0.0 });
        let w = Pyramid::weights(&mask, 2).unwrap();
        assert_eq!(w.level(0).channels(), 1);
        assert_eq!(w.level(1).dimensions(), (4, 2));
        assert_relative_eq!(w.level(0).pixel(0, 0)[0], 1.0);
        let mid = w.level(1).pixel(2, 0)[0];
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn test_image_and_mask_pyramids_match() {
        for (w, h) in [(13, 7), (64, 48), (5, 1), (1, 1), (100, 3)] {
            let bands = band_count(w, h, 5);
            let src: Image<f32> = Image::new(w, h, 3);
            let lap = Pyramid::laplacian(&src, bands).unwrap();
            let weights = Pyramid::weights(&Mask::full(w, h), bands).unwrap();

            assert_eq!(lap.num_levels(), bands as usize + 1);
            assert_eq!(lap.num_levels(), weights.num_levels(), "{w}x{h}");
            let sizes = level_sizes(w, h, lap.num_levels());
            for (k, size) in sizes.iter().enumerate() {
                assert_eq!(lap.level(k).dimensions(), *size);
                assert_eq!(weights.level(k).dimensions(), *size);
            }
        }
    }

    #[test]
    fn test_collapse_empty_errors() {
        assert!(Pyramid::from_levels(Vec::new()).collapse().is_err());
    }
}
