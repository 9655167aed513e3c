//! Error types for pyramid and blending operations.

use pyrblend_core::{Rect, SampleFormat};
use thiserror::Error;

use crate::blender::SessionState;

/// Error type for pyramid and blending operations.
#[derive(Error, Debug)]
pub enum BlendError {
    /// Width or height differ between two operands being merged.
    #[error("dimension mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DimensionMismatch {
        /// First operand width
        a_width: u32,
        /// First operand height
        a_height: u32,
        /// Second operand width
        b_width: u32,
        /// Second operand height
        b_height: u32,
    },

    /// Channel count or sample representation differ between operands.
    #[error(
        "format mismatch: expected {expected_channels} x {expected_format}, got {got_channels} x {got_format}"
    )]
    FormatMismatch {
        /// Sample format of the first operand
        expected_format: SampleFormat,
        /// Channel count of the first operand
        expected_channels: usize,
        /// Sample format of the offending operand
        got_format: SampleFormat,
        /// Channel count of the offending operand
        got_channels: usize,
    },

    /// An operation was called out of order.
    #[error("cannot {op} while blender is {state}")]
    InvalidSessionState {
        /// Operation that was attempted
        op: &'static str,
        /// State the blender was in
        state: SessionState,
    },

    /// Canvas pixels received no contributing weight and full coverage was required.
    #[error("{uncovered} canvas pixels have zero total weight")]
    DegenerateWeights {
        /// Number of uncovered output pixels
        uncovered: usize,
    },

    /// A source does not fit inside the prepared canvas.
    #[error("source at {placed:?} does not fit inside canvas {canvas:?}")]
    OutsideCanvas {
        /// Where the source would be placed
        placed: Rect,
        /// The prepared canvas
        canvas: Rect,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from core buffer handling.
    #[error(transparent)]
    Core(#[from] pyrblend_core::Error),
}

impl BlendError {
    /// Creates a [`BlendError::DimensionMismatch`] error.
    #[inline]
    pub fn dimension_mismatch(a: (u32, u32), b: (u32, u32)) -> Self {
        Self::DimensionMismatch {
            a_width: a.0,
            a_height: a.1,
            b_width: b.0,
            b_height: b.1,
        }
    }

    /// Creates a [`BlendError::FormatMismatch`] error.
    #[inline]
    pub fn format_mismatch(expected: (SampleFormat, usize), got: (SampleFormat, usize)) -> Self {
        Self::FormatMismatch {
            expected_format: expected.0,
            expected_channels: expected.1,
            got_format: got.0,
            got_channels: got.1,
        }
    }
}

/// Result type for pyramid and blending operations.
pub type OpsResult<T> = Result<T, BlendError>;
