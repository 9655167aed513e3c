//! 5-tap binomial pyramid kernels.
//!
//! - [`pyr_down`] - Low-pass with `[1 4 6 4 1] / 16`, then drop every other row/column
//! - [`pyr_up`] - Insert zeros, then convolve with the same kernel scaled by 4
//!
//! Both passes are separable (horizontal then vertical) and use
//! reflect-101 borders (`gfedcb|abcdefgh|gfedcba`), so that
//! `pyr_up(pyr_down(x))` is the designed inverse approximation and a constant
//! image stays constant through either operation.
//!
//! Up-sampling is computed in polyphase form: only the even taps of the
//! zero-stuffed signal are evaluated. Each output row is produced by
//! exactly one worker when the `parallel` feature is enabled.
//!
//! # Example
//!
//! ```rust
//! use pyrblend_core::Image;
//! use pyrblend_ops::kernel::{pyr_down, pyr_up};
//!
//! let src: Image<f32> = Image::filled(9, 6, &[0.5, 0.25, 1.0]);
//! let down = pyr_down(&src);
//! assert_eq!(down.dimensions(), (5, 3));
//!
//! let up = pyr_up(&down, 9, 6).unwrap();
//! assert!((up.pixel(8, 5)[2] - 1.0).abs() < 1e-6);
//! ```

use crate::{BlendError, OpsResult};
use pyrblend_core::Image;
use tracing::trace;

/// Binomial approximation of a Gaussian, normalized to sum to one.
pub const BINOMIAL_5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Up to five (source index, weight) pairs per output coordinate.
type Taps = [(usize, f32); 5];

/// Size of the next coarser level: `((w + 1) / 2, (h + 1) / 2)`.
#[inline]
pub fn pyr_down_size(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(2), height.div_ceil(2))
}

/// Reflect-101 border: `-1 -> 1`, `n -> n - 2`.
#[inline]
fn reflect101(mut i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * (n - 1) - i;
        } else {
            return i as usize;
        }
    }
}

/// Taps for blur-and-decimate along one axis.
fn down_taps(src_len: usize) -> Vec<Taps> {
    let dst_len = src_len.div_ceil(2);
    (0..dst_len)
        .map(|x| {
            let mut taps = [(0usize, 0.0f32); 5];
            for (k, tap) in taps.iter_mut().enumerate() {
                let i = reflect101(2 * x as isize + k as isize - 2, src_len);
                *tap = (i, BINOMIAL_5[k]);
            }
            taps
        })
        .collect()
}

/// Taps for zero-insert-and-blur along one axis.
///
/// The zero-stuffed signal has `dst_len` samples; odd positions are zero and
/// contribute nothing, so their taps keep a zero weight.
fn up_taps(dst_len: usize) -> Vec<Taps> {
    (0..dst_len)
        .map(|x| {
            let mut taps = [(0usize, 0.0f32); 5];
            for (k, tap) in taps.iter_mut().enumerate() {
                let j = reflect101(x as isize + k as isize - 2, dst_len);
                if j % 2 == 0 {
                    *tap = (j / 2, 2.0 * BINOMIAL_5[k]);
                }
            }
            taps
        })
        .collect()
}

/// Runs `f(row_index, row)` over every `row_len` chunk of `dst`.
pub(crate) fn for_each_row<F>(dst: &mut [f32], row_len: usize, f: F)
where
    F: Fn(usize, &mut [f32]) + Send + Sync,
{
    if row_len == 0 {
        return;
    }
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        dst.par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
    #[cfg(not(feature = "parallel"))]
    {
        dst.chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }
}

/// Horizontal pass: resamples every row of `src` through `taps`.
fn filter_rows(src: &Image<f32>, taps: &[Taps]) -> Image<f32> {
    let channels = src.channels();
    let mut dst = Image::new(taps.len() as u32, src.height(), channels);
    let row_len = taps.len() * channels;
    for_each_row(dst.data_mut(), row_len, |y, out| {
        let row = src.row(y as u32);
        for (x, t) in taps.iter().enumerate() {
            for c in 0..channels {
                let mut sum = 0.0f32;
                for &(i, w) in t {
                    sum += row[i * channels + c] * w;
                }
                out[x * channels + c] = sum;
            }
        }
    });
    dst
}

/// Vertical pass: each output row is a weighted sum of source rows.
fn filter_cols(src: &Image<f32>, taps: &[Taps]) -> Image<f32> {
    let channels = src.channels();
    let mut dst = Image::new(src.width(), taps.len() as u32, channels);
    let row_len = src.width() as usize * channels;
    for_each_row(dst.data_mut(), row_len, |y, out| {
        for &(i, w) in &taps[y] {
            if w == 0.0 {
                continue;
            }
            let row = src.row(i as u32);
            for (o, &s) in out.iter_mut().zip(row) {
                *o += s * w;
            }
        }
    });
    dst
}

/// Blurs with the 5-tap binomial kernel and halves both dimensions.
///
/// Output size is `((w + 1) / 2, (h + 1) / 2)`. Empty images stay empty.
pub fn pyr_down(src: &Image<f32>) -> Image<f32> {
    trace!(width = src.width(), height = src.height(), "pyr_down");
    if src.is_empty() {
        let (w, h) = pyr_down_size(src.width(), src.height());
        return Image::new(w, h, src.channels());
    }
    let horizontal = filter_rows(src, &down_taps(src.width() as usize));
    filter_cols(&horizontal, &down_taps(src.height() as usize))
}

/// Doubles both dimensions to exactly `(dst_w, dst_h)`.
///
/// Each target dimension must be `2 * n` or `2 * n - 1` for the source size
/// `n` along that axis, which is what [`pyr_down`] produces in reverse.
///
/// # Errors
///
/// Returns [`BlendError::InvalidParameter`] for any other target size.
pub fn pyr_up(src: &Image<f32>, dst_w: u32, dst_h: u32) -> OpsResult<Image<f32>> {
    trace!(width = src.width(), height = src.height(), dst_w, dst_h, "pyr_up");
    if pyr_down_size(dst_w, dst_h) != src.dimensions() {
        return Err(BlendError::InvalidParameter(format!(
            "cannot upsample {}x{} to {}x{}",
            src.width(),
            src.height(),
            dst_w,
            dst_h
        )));
    }
    if src.is_empty() {
        return Ok(Image::new(dst_w, dst_h, src.channels()));
    }
    let horizontal = filter_rows(src, &up_taps(dst_w as usize));
    Ok(filter_cols(&horizontal, &up_taps(dst_h as usize)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_normalized() {
        let sum: f32 = BINOMIAL_5.iter().sum();
        assert_relative_eq!(sum, 1.0);
    }

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(-3, 2), 1);
        assert_eq!(reflect101(7, 1), 0);
    }

    #[test]
    fn test_down_sizes() {
        assert_eq!(pyr_down_size(9, 6), (5, 3));
        assert_eq!(pyr_down_size(1, 1), (1, 1));
        let img: Image<f32> = Image::new(7, 3, 2);
        assert_eq!(pyr_down(&img).dimensions(), (4, 2));
    }

    #[test]
    fn test_constant_preserved() {
        let src: Image<f32> = Image::filled(11, 5, &[0.3, 0.7]);
        let down = pyr_down(&src);
        for v in down.data() {
            assert!((v - 0.3).abs() < 1e-6 || (v - 0.7).abs() < 1e-6);
        }
        let up = pyr_up(&down, 11, 5).unwrap();
        for y in 0..5 {
            for x in 0..11 {
                assert_relative_eq!(up.pixel(x, y)[0], 0.3, epsilon = 1e-6);
                assert_relative_eq!(up.pixel(x, y)[1], 0.7, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_up_border_taps() {
        // Left edge: (6 * s0 + 2 * s1) / 8, right edge of an even row: s[n-1].
        let src = Image::from_data(3, 1, 1, vec![0.0, 8.0, 16.0]).unwrap();
        let up = pyr_up(&src, 6, 2).unwrap();
        assert_relative_eq!(up.pixel(0, 0)[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(up.pixel(1, 0)[0], 4.0, epsilon = 1e-5);
        assert_relative_eq!(up.pixel(2, 0)[0], 8.0, epsilon = 1e-5);
        assert_relative_eq!(up.pixel(5, 0)[0], 16.0, epsilon = 1e-5);
        assert_relative_eq!(up.pixel(4, 1)[0], 15.0, epsilon = 1e-5);
    }

    #[test]
    fn test_down_impulse() {
        let mut data = vec![0.0f32; 9];
        data[4] = 16.0;
        let src = Image::from_data(9, 1, 1, data).unwrap();
        let down = pyr_down(&src);
        assert_eq!(down.data(), &[0.0, 1.0, 6.0, 1.0, 0.0]);
    }

    #[test]
    fn test_up_rejects_bad_size() {
        let src: Image<f32> = Image::new(4, 4, 1);
        assert!(pyr_up(&src, 7, 8).is_ok());
        assert!(pyr_up(&src, 9, 8).is_err());
        assert!(pyr_up(&src, 6, 8).is_err());
    }

    #[test]
    fn test_ramp_reconstructs_interior() {
        let src = Image::from_fn(16, 4, 1, |x, _, _| x as f32 * 0.5);
        let up = pyr_up(&pyr_down(&src), 16, 4).unwrap();
        // Borders are reflected, so only the interior follows the ramp exactly.
        for x in 3..12 {
            assert_relative_eq!(up.pixel(x, 1)[0], x as f32 * 0.5, epsilon = 1e-4);
        }
    }
}
