//! # pyrblend-core
//!
//! Core types for multi-band image blending.
//!
//! This crate provides the foundational types used throughout pyrblend:
//!
//! - [`Sample`], [`SampleFormat`] - Per-channel sample representation
//! - [`Image`] - Interleaved image buffer with a runtime channel count
//! - [`AnyImage`] - Runtime-typed image passed between I/O and blending
//! - [`Mask`] - Per-pixel blend weights in `[0, 1]`
//! - [`Point`], [`Rect`] - Canvas geometry
//!
//! ## Crate Structure
//!
//! This crate has no internal dependencies. All other pyrblend crates
//! depend on `pyrblend-core`:
//!
//! ```text
//! pyrblend-core (this crate)
//!    ^
//!    |
//!    +-- pyrblend-ops (pyramids, multi-band blender)
//!    +-- pyrblend-io (PNG / JPEG loader and sink)
//!    +-- pyrblend-cli
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use pyrblend_core::{Image, Mask, Rect};
//!
//! let img: Image<u8> = Image::filled(4, 4, &[255, 0, 0]);
//! let mask = Mask::full(4, 4);
//! assert_eq!(img.dimensions(), mask.dimensions());
//! assert_eq!(img.bounds(), Rect::from_size(4, 4));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod image;
pub mod mask;
pub mod rect;
pub mod sample;

// Re-exports for convenience
pub use error::{Error, Result};
pub use image::{AnyImage, Image};
pub use mask::Mask;
pub use rect::{Point, Rect};
pub use sample::{Sample, SampleFormat};

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```
/// use pyrblend_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::image::{AnyImage, Image};
    pub use crate::mask::Mask;
    pub use crate::rect::{Point, Rect};
    pub use crate::sample::{Sample, SampleFormat};
}
