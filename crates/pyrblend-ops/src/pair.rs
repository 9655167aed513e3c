//! Side-by-side blending of two equally sized images.
//!
//! The second image is shifted right by a fraction of its width and both
//! are blended with full masks, so the overlap becomes a smooth transition:
//!
//! ```text
//! |<---- a ---->|
//!        |<---- b ---->|
//! 0     pos     a.w   pos + b.w
//! ```
//!
//! `pos = floor(b.width * offset_ratio)`; with the default ratio of 0.5 the
//! result is one and a half images wide.

use pyrblend_core::{AnyImage, Mask, Point, Rect};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::blender::{BlendOptions, BlendOutput, MultiBandBlender};
use crate::{BlendError, OpsResult};

/// Placement and blending parameters for [`blend_pair`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairOptions {
    /// Offset of the second image as a fraction of its width, in `[0, 1]`.
    pub offset_ratio: f32,
    /// Parameters forwarded to the blender.
    pub blend: BlendOptions,
}

impl Default for PairOptions {
    fn default() -> Self {
        Self {
            offset_ratio: 0.5,
            blend: BlendOptions::default(),
        }
    }
}

/// Checks that two images can be blended with each other.
///
/// A sample type or channel mismatch takes precedence over a size mismatch.
pub fn check_compatible(a: &AnyImage, b: &AnyImage) -> OpsResult<()> {
    let (la, lb) = ((a.format(), a.channels()), (b.format(), b.channels()));
    if la != lb {
        return Err(BlendError::format_mismatch(la, lb));
    }
    if a.dimensions() != b.dimensions() {
        return Err(BlendError::dimension_mismatch(a.dimensions(), b.dimensions()));
    }
    Ok(())
}

/// Blends `b` to the right of `a`, overlapping by `1 - offset_ratio` of its width.
///
/// # Errors
///
/// - [`BlendError::FormatMismatch`] if channel count or sample type differ
/// - [`BlendError::DimensionMismatch`] if the sizes differ
/// - [`BlendError::InvalidParameter`] for a ratio outside `[0, 1]`
pub fn blend_pair(a: &AnyImage, b: &AnyImage, options: &PairOptions) -> OpsResult<BlendOutput> {
    check_compatible(a, b)?;
    let ratio = options.offset_ratio;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(BlendError::InvalidParameter(format!(
            "offset ratio must be in [0, 1], got {ratio}"
        )));
    }

    let (width, height) = b.dimensions();
    let pos = (width as f32 * ratio) as u32;
    let canvas = Rect::from_size(pos + width, a.height());
    debug!(pos, width = canvas.width, height, "Blending pair");

    let mask = Mask::full(width, height);
    let mut blender = MultiBandBlender::new(options.blend);
    blender.prepare(canvas)?;
    blender.feed_any(a, &mask, Point::ORIGIN)?;
    blender.feed_any(b, &mask, Point::new(pos as i32, 0))?;
    blender.blend()
}
