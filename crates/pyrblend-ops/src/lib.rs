//! # pyrblend-ops
//!
//! Pyramid operations and multi-band blending.
//!
//! # Modules
//!
//! - [`kernel`] - 5-tap binomial down/up-sampling
//! - [`pyramid`] - Gaussian and Laplacian pyramids
//! - [`blender`] - [`MultiBandBlender`] session: prepare, feed, blend
//! - [`pair`] - Two-image side-by-side blending
//!
//! # Example
//!
//! ```rust
//! use pyrblend_core::{AnyImage, Image};
//! use pyrblend_ops::{blend_pair, PairOptions};
//!
//! let a: AnyImage = Image::<u8>::filled(16, 8, &[40, 80, 120]).into();
//! let b: AnyImage = Image::<u8>::filled(16, 8, &[40, 80, 120]).into();
//!
//! let out = blend_pair(&a, &b, &PairOptions::default()).unwrap();
//! assert_eq!(out.image.dimensions(), (24, 8));
//! ```
//!
//! # Features
//!
//! - `parallel` (default) - Split kernel and accumulation rows across rayon workers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod error;
pub mod blender;
pub mod kernel;
pub mod pair;
pub mod pyramid;

pub use blender::{BlendOptions, BlendOutput, MultiBandBlender, SessionState};
pub use error::{BlendError, OpsResult};
pub use pair::{blend_pair, check_compatible, PairOptions};
pub use pyramid::Pyramid;
