//! JPEG format support.
//!
//! Decoding keeps grayscale images single-channel and RGB images
//! three-channel; CMYK is converted to RGB and 16-bit grayscale stays 16-bit.
//!
//! Encoding is 8-bit only: `u16`/`f32` images are quantized and an alpha
//! channel, if present, is dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use pyrblend_io::jpeg::{JpegWriter, JpegWriterOptions};
//!
//! let writer = JpegWriter::with_options(JpegWriterOptions { quality: 95 });
//! writer.write("result.jpg", &image)?;
//! ```

use crate::{IoError, IoResult};
use pyrblend_core::{AnyImage, Image};
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

/// Options for writing JPEG files.
#[derive(Debug, Clone)]
pub struct JpegWriterOptions {
    /// Quality level 1-100. Higher = better quality, larger files.
    /// Default: 90.
    pub quality: u8,
}

impl Default for JpegWriterOptions {
    fn default() -> Self {
        Self { quality: 90 }
    }
}

/// JPEG file writer.
#[derive(Debug, Clone, Default)]
pub struct JpegWriter {
    options: JpegWriterOptions,
}

impl JpegWriter {
    /// Creates a new writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with the given options.
    pub fn with_options(options: JpegWriterOptions) -> Self {
        Self { options }
    }

    /// Writes a JPEG file to disk.
    pub fn write<P: AsRef<Path>>(&self, path: P, image: &AnyImage) -> IoResult<()> {
        let data = self.write_to_memory(image)?;
        std::fs::write(path.as_ref(), data)?;
        Ok(())
    }

    /// Encodes a JPEG into a byte vector.
    pub fn write_to_memory(&self, image: &AnyImage) -> IoResult<Vec<u8>> {
        use jpeg_encoder::{ColorType, Encoder};

        let (width, height) = image.dimensions();
        let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(IoError::EncodeError(format!(
                    "{width}x{height} exceeds the JPEG size limit"
                )));
            }
        };

        let u8_image = image.to_u8();
        let data = u8_image.data();
        let (color_type, pixels) = match image.channels() {
            1 => (ColorType::Luma, data.to_vec()),
            // Drop alpha
            2 => (ColorType::Luma, data.chunks_exact(2).map(|ga| ga[0]).collect()),
            3 => (ColorType::Rgb, data.to_vec()),
            4 => (
                ColorType::Rgb,
                data.chunks_exact(4)
                    .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
                    .collect(),
            ),
            n => {
                return Err(IoError::EncodeError(format!(
                    "unsupported channel count: {}",
                    n
                )));
            }
        };

        let mut buffer = Vec::new();
        let encoder = Encoder::new(&mut buffer, self.options.quality);
        encoder
            .encode(&pixels, w, h, color_type)
            .map_err(|e: jpeg_encoder::EncodingError| IoError::EncodeError(e.to_string()))?;
        Ok(buffer)
    }
}

/// Reads a JPEG file.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<AnyImage> {
    let file = std::fs::File::open(path.as_ref())?;
    decode(file)
}

/// Reads a JPEG image from an in-memory buffer.
pub fn read_from_memory(data: &[u8]) -> IoResult<AnyImage> {
    decode(Cursor::new(data))
}

fn decode<R: Read>(reader: R) -> IoResult<AnyImage> {
    let mut decoder = jpeg_decoder::Decoder::new(BufReader::new(reader));
    let pixels = decoder
        .decode()
        .map_err(|e| IoError::DecodeError(e.to_string()))?;
    let info = decoder
        .info()
        .ok_or_else(|| IoError::DecodeError("missing JPEG info".into()))?;

    let width = info.width as u32;
    let height = info.height as u32;

    let image = match info.pixel_format {
        jpeg_decoder::PixelFormat::L8 => AnyImage::U8(Image::from_data(width, height, 1, pixels)?),
        jpeg_decoder::PixelFormat::RGB24 => {
            AnyImage::U8(Image::from_data(width, height, 3, pixels)?)
        }
        jpeg_decoder::PixelFormat::CMYK32 => {
            let rgb: Vec<u8> = pixels.chunks_exact(4).flat_map(cmyk_to_rgb).collect();
            AnyImage::U8(Image::from_data(width, height, 3, rgb)?)
        }
        jpeg_decoder::PixelFormat::L16 => {
            let luma: Vec<u16> = pixels
                .chunks_exact(2)
                .map(|l16| u16::from_be_bytes([l16[0], l16[1]]))
                .collect();
            AnyImage::U16(Image::from_data(width, height, 1, luma)?)
        }
    };
    Ok(image)
}

/// Approximate CMYK to RGB conversion.
fn cmyk_to_rgb(cmyk: &[u8]) -> [u8; 3] {
    let k = 1.0 - cmyk[3] as f32 / 255.0;
    let channel = |v: u8| ((1.0 - v as f32 / 255.0) * k * 255.0).round() as u8;
    [channel(cmyk[0]), channel(cmyk[1]), channel(cmyk[2])]
}

/// Writes a JPEG file with default quality.
pub fn write<P: AsRef<Path>>(path: P, image: &AnyImage) -> IoResult<()> {
    JpegWriter::new().write(path, image)
}

/// Writes a JPEG file with the given quality (1-100).
pub fn write_with_quality<P: AsRef<Path>>(path: P, image: &AnyImage, quality: u8) -> IoResult<()> {
    JpegWriter::with_options(JpegWriterOptions { quality }).write(path, image)
}
