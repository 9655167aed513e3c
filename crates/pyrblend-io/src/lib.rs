//! # pyrblend-io
//!
//! Image loading and saving for the blending pipeline.
//!
//! - **PNG** - Lossless, 8/16 bit, gray/RGB with optional alpha
//! - **JPEG** - Lossy, 8 bit output, used for the default `result.jpg`
//!
//! Images are returned as [`AnyImage`] with their channel count and bit
//! depth unchanged, so two inputs of different layouts can be reported as a
//! type mismatch instead of being silently converted.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pyrblend_io::{read, write};
//!
//! let image = read("left.png")?;
//! write("copy.jpg", &image)?;
//! ```
//!
//! # Feature Flags
//!
//! - `png` - PNG support (default)
//! - `jpeg` - JPEG support (default)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod detect;
mod error;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "jpeg")]
pub mod jpeg;

pub use detect::Format;
pub use error::{IoError, IoResult};

use pyrblend_core::AnyImage;
use std::path::Path;
use tracing::debug;

/// Reads an image from a file, auto-detecting the format.
///
/// Magic bytes take precedence over the file extension.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<AnyImage> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    debug!(path = %path.display(), ?format, "Reading image");

    let image = match format {
        #[cfg(feature = "png")]
        Format::Png => png::read(path)?,

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read(path)?,

        _ => return Err(unsupported(path)),
    };
    debug!(
        width = image.width(),
        height = image.height(),
        channels = image.channels(),
        format = %image.format(),
        "Decoded image"
    );
    Ok(image)
}

/// Decodes an image held in memory, detecting the format from its magic bytes.
pub fn read_from_memory(data: &[u8]) -> IoResult<AnyImage> {
    match Format::from_bytes(data) {
        #[cfg(feature = "png")]
        Format::Png => png::read_from_memory(data),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::read_from_memory(data),

        _ => Err(IoError::UnsupportedFormat("unrecognized image data".into())),
    }
}

/// Writes an image to a file; the format comes from the extension.
pub fn write<P: AsRef<Path>>(path: P, image: &AnyImage) -> IoResult<()> {
    let path = path.as_ref();
    let format = Format::from_extension(path);
    debug!(path = %path.display(), ?format, "Writing image");

    match format {
        #[cfg(feature = "png")]
        Format::Png => png::write(path, image),

        #[cfg(feature = "jpeg")]
        Format::Jpeg => jpeg::write(path, image),

        _ => Err(unsupported(path)),
    }
}

fn unsupported(path: &Path) -> IoError {
    IoError::UnsupportedFormat(
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("unknown")
            .to_string(),
    )
}
