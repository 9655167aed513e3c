//! PNG format support.
//!
//! Reads 8-bit and 16-bit PNG files keeping their channel layout:
//! grayscale (1), grayscale + alpha (2), RGB (3) and RGBA (4). Palette and
//! sub-byte images are expanded to 8-bit on load.
//!
//! Writing stores `u8` images at 8 bits and `u16`/`f32` images at 16 bits.
//!
//! # Example
//!
//! ```rust,ignore
//! use pyrblend_io::png::{read, write};
//!
//! let image = read("input.png")?;
//! write("output.png", &image)?;
//! ```

use crate::{IoError, IoResult};
use pyrblend_core::{AnyImage, Image};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Cursor, Seek, Write};
use std::path::Path;

/// Reads a PNG file from the given path.
pub fn read<P: AsRef<Path>>(path: P) -> IoResult<AnyImage> {
    let file = File::open(path.as_ref())?;
    decode(BufReader::new(file))
}

/// Reads a PNG image from an in-memory buffer.
pub fn read_from_memory(data: &[u8]) -> IoResult<AnyImage> {
    decode(Cursor::new(data))
}

fn decode<R: BufRead + Seek>(reader: R) -> IoResult<AnyImage> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(png::Transformations::EXPAND);
    let mut reader = decoder
        .read_info()
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("cannot determine output buffer size".into()))?;
    let mut buf = vec![0u8; buf_size];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e: png::DecodingError| IoError::DecodeError(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let channels = match info.color_type {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        other => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                other, info.bit_depth
            )));
        }
    };

    let image = match info.bit_depth {
        png::BitDepth::Eight => {
            AnyImage::U8(Image::from_data(info.width, info.height, channels, buf)?)
        }
        png::BitDepth::Sixteen => AnyImage::U16(Image::from_data(
            info.width,
            info.height,
            channels,
            bytes_to_u16(&buf),
        )?),
        depth => {
            return Err(IoError::UnsupportedBitDepth(format!(
                "{:?} {:?}",
                info.color_type, depth
            )));
        }
    };
    Ok(image)
}

/// Writes an image to a PNG file.
pub fn write<P: AsRef<Path>>(path: P, image: &AnyImage) -> IoResult<()> {
    let file = File::create(path.as_ref())?;
    encode(BufWriter::new(file), image)
}

/// Encodes an image as PNG into a byte vector.
pub fn write_to_memory(image: &AnyImage) -> IoResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(&mut buffer, image)?;
    Ok(buffer)
}

fn encode<W: Write>(writer: W, image: &AnyImage) -> IoResult<()> {
    let color_type = match image.channels() {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        n => return Err(IoError::EncodeError(format!("unsupported channel count: {}", n))),
    };

    let (depth, bytes) = match image {
        AnyImage::U8(img) => (png::BitDepth::Eight, img.data().to_vec()),
        AnyImage::U16(img) => (png::BitDepth::Sixteen, u16_to_bytes(img.data())),
        AnyImage::F32(img) => {
            let wide: Image<u16> = img.convert();
            (png::BitDepth::Sixteen, u16_to_bytes(wide.data()))
        }
    };

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(color_type);
    encoder.set_depth(depth);
    encoder.set_compression(png::Compression::default());
    encoder.set_source_srgb(png::SrgbRenderingIntent::Perceptual);

    let mut png_writer = encoder
        .write_header()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .write_image_data(&bytes)
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    png_writer
        .finish()
        .map_err(|e| IoError::EncodeError(e.to_string()))?;
    Ok(())
}

/// Converts big-endian byte slice to u16 vector.
fn bytes_to_u16(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
        .collect()
}

fn u16_to_bytes(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|v| v.to_be_bytes()).collect()
}
