//! Per-channel sample types.
//!
//! Images store one [`Sample`] per channel. Blending works on normalized
//! `f32` values, so every sample type converts to and from `f32`:
//!
//! | Type  | `to_f32` range | `from_f32`                       |
//! |-------|----------------|----------------------------------|
//! | `u8`  | `[0.0, 1.0]`   | clamps to `[0, 1]`, scales, rounds |
//! | `u16` | `[0.0, 1.0]`   | clamps to `[0, 1]`, scales, rounds |
//! | `f32` | unchanged      | unchanged (HDR values survive)   |
//!
//! # Example
//!
//! ```rust
//! use pyrblend_core::{Sample, SampleFormat};
//!
//! assert_eq!(<u8 as Sample>::FORMAT, SampleFormat::U8);
//! assert_eq!(255u8.to_f32(), 1.0);
//! assert_eq!(u8::from_f32(1.7), 255);
//! assert_eq!(f32::from_f32(1.7), 1.7);
//! ```

use std::fmt;

/// Runtime tag for a sample type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 8-bit unsigned integer per channel.
    U8,
    /// 16-bit unsigned integer per channel.
    U16,
    /// 32-bit float per channel.
    F32,
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::F32 => "f32",
        };
        f.write_str(name)
    }
}

/// Trait for channel sample types (u8, u16, f32).
pub trait Sample: Copy + Default + Send + Sync + PartialOrd + fmt::Debug + 'static {
    /// Runtime tag for this type.
    const FORMAT: SampleFormat;

    /// Convert to f32.
    ///
    /// For integers, normalizes to [0.0, 1.0] range.
    /// For floats, returns the value directly.
    fn to_f32(self) -> f32;

    /// Convert from f32.
    ///
    /// For integers, expects [0.0, 1.0] range and clamps.
    fn from_f32(v: f32) -> Self;

    /// Zero value.
    fn zero() -> Self;
}

impl Sample for u8 {
    const FORMAT: SampleFormat = SampleFormat::U8;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / 255.0
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    #[inline]
    fn zero() -> Self {
        0
    }
}

impl Sample for u16 {
    const FORMAT: SampleFormat = SampleFormat::U16;

    #[inline]
    fn to_f32(self) -> f32 {
        self as f32 / 65535.0
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        (v.clamp(0.0, 1.0) * 65535.0).round() as u16
    }

    #[inline]
    fn zero() -> Self {
        0
    }
}

impl Sample for f32 {
    const FORMAT: SampleFormat = SampleFormat::F32;

    #[inline]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline]
    fn from_f32(v: f32) -> Self {
        v
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }
}
