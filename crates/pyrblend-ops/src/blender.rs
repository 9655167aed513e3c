//! Multi-band (Laplacian pyramid) blender.
//!
//! Sources are placed at integer offsets on a shared canvas. Each source is
//! split into frequency bands; every band is blended with a correspondingly
//! blurred copy of the source's weight mask, so low frequencies transition
//! over a wide region while fine detail switches over a narrow one.
//!
//! # Session
//!
//! ```text
//! Unprepared --prepare--> Prepared --feed--> Fed --blend--> Blended
//!                                            ^  |
//!                                            +--+ feed
//! ```
//!
//! `prepare` may be called in any state and always starts a new session.
//!
//! # Example
//!
//! ```rust
//! use pyrblend_core::{Image, Mask, Point, Rect};
//! use pyrblend_ops::{BlendOptions, MultiBandBlender};
//!
//! let a: Image<u8> = Image::filled(4, 4, &[255]);
//! let b: Image<u8> = Image::filled(4, 4, &[255]);
//! let mask = Mask::full(4, 4);
//!
//! let mut blender = MultiBandBlender::new(BlendOptions::default());
//! blender.prepare(Rect::from_size(6, 4)).unwrap();
//! blender.feed(&a, &mask, Point::new(0, 0)).unwrap();
//! blender.feed(&b, &mask, Point::new(2, 0)).unwrap();
//!
//! let out = blender.blend().unwrap();
//! assert_eq!(out.image.dimensions(), (6, 4));
//! assert!(out.image.to_u8().data().iter().all(|&v| v == 255));
//! ```

use std::fmt;

use pyrblend_core::{AnyImage, Image, Mask, Point, Rect, Sample, SampleFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::kernel::for_each_row;
use crate::pyramid::{band_count, level_sizes, Pyramid};
use crate::{BlendError, OpsResult};

/// Blending parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendOptions {
    /// Requested number of bands; reduced for small canvases.
    pub num_bands: u32,
    /// Total full-resolution weight at or below which a pixel counts as uncovered.
    pub weight_eps: f32,
    /// Fail with [`BlendError::DegenerateWeights`] instead of zero-filling uncovered pixels.
    pub require_full_coverage: bool,
}

impl Default for BlendOptions {
    fn default() -> Self {
        Self {
            num_bands: 5,
            weight_eps: 1e-5,
            require_full_coverage: false,
        }
    }
}

/// Lifecycle state of a [`MultiBandBlender`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No canvas configured.
    Unprepared,
    /// Canvas configured, no sources yet.
    Prepared,
    /// At least one source accumulated.
    Fed,
    /// Result produced; the session is finished.
    Blended,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unprepared => "unprepared",
            Self::Prepared => "prepared",
            Self::Fed => "fed",
            Self::Blended => "blended",
        };
        f.write_str(name)
    }
}

/// Blended image plus its coverage.
#[derive(Debug, Clone)]
pub struct BlendOutput {
    /// Composite in the sample format of the fed sources.
    pub image: AnyImage,
    /// 1.0 where at least one source contributed, 0.0 elsewhere.
    pub mask: Mask,
}

/// Accumulates band-weighted sources and collapses them into one image.
#[derive(Debug)]
pub struct MultiBandBlender {
    options: BlendOptions,
    state: SessionState,
    canvas: Rect,
    num_bands: u32,
    /// Canvas size rounded up to a multiple of `2^num_bands`.
    padded: (u32, u32),
    /// Per-level sum of `band * weight`; allocated on the first feed.
    bands: Vec<Image<f32>>,
    /// Per-level sum of weights.
    weights: Vec<Image<f32>>,
    layout: Option<(SampleFormat, usize)>,
    sources: usize,
}

impl Default for MultiBandBlender {
    fn default() -> Self {
        Self::new(BlendOptions::default())
    }
}

impl MultiBandBlender {
    /// Creates an unprepared blender.
    pub fn new(options: BlendOptions) -> Self {
        Self {
            options,
            state: SessionState::Unprepared,
            canvas: Rect::default(),
            num_bands: 0,
            padded: (0, 0),
            bands: Vec::new(),
            weights: Vec::new(),
            layout: None,
            sources: 0,
        }
    }

    /// Blending parameters.
    pub fn options(&self) -> &BlendOptions {
        &self.options
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Effective band count of the current session (0 before `prepare`).
    pub fn num_bands(&self) -> u32 {
        self.num_bands
    }

    /// Canvas configured by the last `prepare`.
    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// Number of sources accumulated in the current session.
    pub fn source_count(&self) -> usize {
        self.sources
    }

    /// Starts a new session on `canvas`, discarding any accumulated state.
    ///
    /// # Errors
    ///
    /// Returns [`BlendError::InvalidParameter`] for an empty canvas or a
    /// negative or non-finite `weight_eps`.
    pub fn prepare(&mut self, canvas: Rect) -> OpsResult<()> {
        if canvas.is_empty() {
            return Err(BlendError::InvalidParameter(format!(
                "empty canvas {}x{}",
                canvas.width, canvas.height
            )));
        }
        let eps = self.options.weight_eps;
        if !eps.is_finite() || eps < 0.0 {
            return Err(BlendError::InvalidParameter(format!(
                "weight_eps must be finite and non-negative, got {eps}"
            )));
        }

        let bands = band_count(canvas.width, canvas.height, self.options.num_bands);
        let padded = (pad_to_bands(canvas.width, bands)?, pad_to_bands(canvas.height, bands)?);

        self.canvas = canvas;
        self.num_bands = bands;
        self.padded = padded;
        self.weights = level_sizes(padded.0, padded.1, bands as usize + 1)
            .into_iter()
            .map(|(w, h)| Image::new(w, h, 1))
            .collect();
        self.bands = Vec::new();
        self.layout = None;
        self.sources = 0;
        self.state = SessionState::Prepared;

        debug!(
            x = canvas.x,
            y = canvas.y,
            width = canvas.width,
            height = canvas.height,
            bands,
            padded_width = padded.0,
            padded_height = padded.1,
            "Prepared blend canvas"
        );
        Ok(())
    }

    /// Prepares a canvas bounding sources of `sizes` placed at `corners`.
    ///
    /// # Errors
    ///
    /// Returns [`BlendError::InvalidParameter`] if the slices differ in
    /// length or describe no area.
    pub fn prepare_from_corners(&mut self, corners: &[Point], sizes: &[(u32, u32)]) -> OpsResult<()> {
        if corners.len() != sizes.len() {
            return Err(BlendError::InvalidParameter(format!(
                "{} corners for {} sizes",
                corners.len(),
                sizes.len()
            )));
        }
        self.prepare(Rect::bounding(corners, sizes))
    }

    /// Adds a source whose top-left corner lands at `tl` in canvas coordinates.
    ///
    /// All validation happens before any pyramid is built; on error the
    /// session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`BlendError::InvalidSessionState`] before `prepare` or after `blend`
    /// - [`BlendError::DimensionMismatch`] if `mask` and `img` sizes differ
    /// - [`BlendError::FormatMismatch`] if channels or sample type differ from earlier sources
    /// - [`BlendError::InvalidParameter`] for an empty image
    /// - [`BlendError::OutsideCanvas`] if the source does not fit inside the canvas
    pub fn feed<T: Sample>(&mut self, img: &Image<T>, mask: &Mask, tl: Point) -> OpsResult<()> {
        let layout = (img.format(), img.channels());
        self.validate(img.dimensions(), layout, mask, tl)?;
        let src: Image<f32> = img.convert();
        self.accumulate(&src, mask, tl, layout)
    }

    /// Runtime-typed variant of [`feed`](Self::feed).
    pub fn feed_any(&mut self, img: &AnyImage, mask: &Mask, tl: Point) -> OpsResult<()> {
        match img {
            AnyImage::U8(img) => self.feed(img, mask, tl),
            AnyImage::U16(img) => self.feed(img, mask, tl),
            AnyImage::F32(img) => self.feed(img, mask, tl),
        }
    }

    fn validate(
        &self,
        size: (u32, u32),
        layout: (SampleFormat, usize),
        mask: &Mask,
        tl: Point,
    ) -> OpsResult<()> {
        match self.state {
            SessionState::Prepared | SessionState::Fed => {}
            state => return Err(BlendError::InvalidSessionState { op: "feed", state }),
        }
        if mask.dimensions() != size {
            return Err(BlendError::dimension_mismatch(size, mask.dimensions()));
        }
        if let Some(expected) = self.layout {
            if expected != layout {
                return Err(BlendError::format_mismatch(expected, layout));
            }
        }
        if size.0 == 0 || size.1 == 0 {
            return Err(BlendError::InvalidParameter(format!(
                "empty source {}x{}",
                size.0, size.1
            )));
        }
        let placed = Rect::at(tl, size.0, size.1);
        if !self.canvas.contains_rect(&placed) {
            return Err(BlendError::OutsideCanvas {
                placed,
                canvas: self.canvas,
            });
        }
        Ok(())
    }

    fn accumulate(
        &mut self,
        src: &Image<f32>,
        mask: &Mask,
        tl: Point,
        layout: (SampleFormat, usize),
    ) -> OpsResult<()> {
        let bands = self.num_bands;
        let channels = src.channels();
        // Source origin relative to the padded canvas; non-negative after validation.
        let origin = (
            (tl.x as i64 - self.canvas.x as i64) as u32,
            (tl.y as i64 - self.canvas.y as i64) as u32,
        );
        let region = feed_region(origin, src.dimensions(), self.padded, bands);
        trace!(?region, "feed region");

        let ext = extend_source(src, region, origin);
        let ext_mask = extend_mask(mask, region, origin);
        let lap = Pyramid::laplacian(&ext, bands)?;
        let gauss = Pyramid::weights(&ext_mask, bands)?;

        if self.bands.is_empty() {
            self.bands = level_sizes(self.padded.0, self.padded.1, bands as usize + 1)
                .into_iter()
                .map(|(w, h)| Image::new(w, h, channels))
                .collect();
        }

        for k in 0..=bands as usize {
            let offset = ((region.x as usize) >> k, (region.y as usize) >> k);
            add_weighted(&mut self.bands[k], lap.level(k), gauss.level(k), offset);
            add_weights(&mut self.weights[k], gauss.level(k), offset);
        }

        self.layout = Some(layout);
        self.sources += 1;
        self.state = SessionState::Fed;
        debug!(
            x = tl.x,
            y = tl.y,
            width = src.width(),
            height = src.height(),
            sources = self.sources,
            "Fed blend source"
        );
        Ok(())
    }

    /// Normalizes every level, collapses the pyramid and crops to the canvas.
    ///
    /// # Errors
    ///
    /// - [`BlendError::InvalidSessionState`] unless at least one source was fed
    /// - [`BlendError::DegenerateWeights`] if `require_full_coverage` is set
    ///   and some canvas pixel received no weight; the session stays `Fed`
    pub fn blend(&mut self) -> OpsResult<BlendOutput> {
        if self.state != SessionState::Fed {
            return Err(BlendError::InvalidSessionState {
                op: "blend",
                state: self.state,
            });
        }
        let (cw, ch) = (self.canvas.width, self.canvas.height);
        let eps = self.options.weight_eps;

        let base = &self.weights[0];
        let mask = Mask::from_fn(cw, ch, |x, y| {
            if base.pixel(x, y)[0] > eps { 1.0 } else { 0.0 }
        });
        let uncovered = (cw as usize * ch as usize) - mask.covered_count();
        if uncovered > 0 && self.options.require_full_coverage {
            return Err(BlendError::DegenerateWeights { uncovered });
        }

        let mut bands = std::mem::take(&mut self.bands);
        let weights = std::mem::take(&mut self.weights);
        for (band, weight) in bands.iter_mut().zip(&weights) {
            normalize(band, weight);
        }
        let full = Pyramid::from_levels(bands).collapse()?;

        let channels = full.channels();
        let mut out = Image::new(cw, ch, channels);
        for y in 0..ch {
            let src = &full.row(y)[..cw as usize * channels];
            let dst = out.row_mut(y);
            for x in 0..cw as usize {
                if mask.is_covered(x as u32, y) {
                    let o = x * channels;
                    dst[o..o + channels].copy_from_slice(&src[o..o + channels]);
                }
            }
        }

        let format = self.layout.map_or(SampleFormat::F32, |(f, _)| f);
        let image = match format {
            SampleFormat::U8 => AnyImage::U8(out.convert()),
            SampleFormat::U16 => AnyImage::U16(out.convert()),
            SampleFormat::F32 => AnyImage::F32(out),
        };

        self.state = SessionState::Blended;
        debug!(width = cw, height = ch, uncovered, "Blended");
        Ok(BlendOutput { image, mask })
    }
}

/// Rounds `len` up to a multiple of `2^bands`.
fn pad_to_bands(len: u32, bands: u32) -> OpsResult<u32> {
    let align = 1u64 << bands;
    let padded = (len as u64).div_ceil(align) * align;
    u32::try_from(padded)
        .map_err(|_| BlendError::InvalidParameter(format!("canvas dimension {len} too large")))
}

/// Padded-canvas region a source at `origin` contributes to.
///
/// The source is widened by `3 * 2^bands` pixels on each side so the coarse
/// levels see its surroundings, clipped to the padded canvas, and aligned to
/// `2^bands` so every level of the region maps onto whole canvas pixels.
fn feed_region(origin: (u32, u32), size: (u32, u32), padded: (u32, u32), bands: u32) -> Rect {
    let (x, width) = axis_region(origin.0, size.0, padded.0, bands);
    let (y, height) = axis_region(origin.1, size.1, padded.1, bands);
    Rect::new(x as i32, y as i32, width, height)
}

fn axis_region(start: u32, len: u32, limit: u32, bands: u32) -> (u32, u32) {
    let gap = 3u64 << bands;
    let align = 1u64 << bands;
    let lo = ((start as u64).saturating_sub(gap) >> bands) << bands;
    let hi = (start as u64 + len as u64 + gap).min(limit as u64);
    // `limit` is aligned, so the rounded span never leaves the canvas.
    let span = (hi - lo).div_ceil(align) * align;
    (lo as u32, span as u32)
}

/// Mirror border repeating the edge pixel: `-1 -> 0`, `n -> n - 1`.
fn reflect(mut i: i64, n: i64) -> usize {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as usize;
        }
    }
}

/// Copies `src` into `region`, mirroring it into the surrounding margin.
fn extend_source(src: &Image<f32>, region: Rect, origin: (u32, u32)) -> Image<f32> {
    let channels = src.channels();
    let xmap: Vec<usize> = (0..region.width as i64)
        .map(|rx| reflect(region.x as i64 + rx - origin.0 as i64, src.width() as i64))
        .collect();
    let ymap: Vec<usize> = (0..region.height as i64)
        .map(|ry| reflect(region.y as i64 + ry - origin.1 as i64, src.height() as i64))
        .collect();

    let mut ext = Image::new(region.width, region.height, channels);
    for_each_row(ext.data_mut(), region.width as usize * channels, |ry, row| {
        let src_row = src.row(ymap[ry] as u32);
        for (dst, &sx) in row.chunks_exact_mut(channels).zip(&xmap) {
            dst.copy_from_slice(&src_row[sx * channels..(sx + 1) * channels]);
        }
    });
    ext
}

/// Copies `mask` into `region`; the margin gets zero weight.
fn extend_mask(mask: &Mask, region: Rect, origin: (u32, u32)) -> Mask {
    let (w, h) = (mask.width() as i64, mask.height() as i64);
    Mask::from_fn(region.width, region.height, |rx, ry| {
        let sx = region.x as i64 + rx as i64 - origin.0 as i64;
        let sy = region.y as i64 + ry as i64 - origin.1 as i64;
        if (0..w).contains(&sx) && (0..h).contains(&sy) {
            mask.get(sx as u32, sy as u32)
        } else {
            0.0
        }
    })
}

/// `acc[offset + p] += band[p] * weight[p]` over the extent of `band`.
fn add_weighted(acc: &mut Image<f32>, band: &Image<f32>, weight: &Image<f32>, offset: (usize, usize)) {
    let channels = acc.channels();
    let row_len = acc.width() as usize * channels;
    let (ox, oy) = offset;
    let span = band.width() as usize * channels;
    let rows = &mut acc.data_mut()[oy * row_len..(oy + band.height() as usize) * row_len];
    for_each_row(rows, row_len, |y, row| {
        let dst = &mut row[ox * channels..ox * channels + span];
        let src = band.row(y as u32);
        for ((d, s), &w) in dst
            .chunks_exact_mut(channels)
            .zip(src.chunks_exact(channels))
            .zip(weight.row(y as u32))
        {
            for (d, s) in d.iter_mut().zip(s) {
                *d += s * w;
            }
        }
    });
}

/// `acc[offset + p] += weight[p]`.
fn add_weights(acc: &mut Image<f32>, weight: &Image<f32>, offset: (usize, usize)) {
    let row_len = acc.width() as usize;
    let (ox, oy) = offset;
    let span = weight.width() as usize;
    let rows = &mut acc.data_mut()[oy * row_len..(oy + weight.height() as usize) * row_len];
    for_each_row(rows, row_len, |y, row| {
        for (d, s) in row[ox..ox + span].iter_mut().zip(weight.row(y as u32)) {
            *d += s;
        }
    });
}

/// Divides accumulated bands by their weight sum; zero-weight pixels become 0.
fn normalize(band: &mut Image<f32>, weight: &Image<f32>) {
    let channels = band.channels();
    let row_len = band.width() as usize * channels;
    for_each_row(band.data_mut(), row_len, |y, row| {
        for (px, &w) in row.chunks_exact_mut(channels).zip(weight.row(y as u32)) {
            if w > 0.0 {
                px.iter_mut().for_each(|v| *v /= w);
            } else {
                px.fill(0.0);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn u8_pattern(w: u32, h: u32, c: usize) -> Image<u8> {
        Image::from_fn(w, h, c, |x, y, ch| ((x * 37 + y * 11 + ch as u32 * 71) % 256) as u8)
    }

    #[test]
    fn test_two_uniform_sources_keep_value() {
        let img: Image<u8> = Image::filled(4, 4, &[255]);
        let mask = Mask::from_u8(4, 4, &[255; 16]).unwrap();

        let mut blender = MultiBandBlender::default();
        blender.prepare(Rect::from_size(6, 4)).unwrap();
        blender.feed(&img, &mask, Point::new(0, 0)).unwrap();
        blender.feed(&img, &mask, Point::new(2, 0)).unwrap();
        let out = blender.blend().unwrap();

        let AnyImage::U8(result) = out.image else {
            panic!("expected u8 output");
        };
        assert_eq!(result.dimensions(), (6, 4));
        assert!(result.data().iter().all(|&v| v == 255));
        assert_eq!(out.mask.covered_count(), 24);
        assert_eq!(blender.state(), SessionState::Blended);
    }

    #[test]
    fn test_single_source_round_trip_u8() {
        let src = u8_pattern(13, 7, 3);
        let mut blender = MultiBandBlender::default();
        blender.prepare(src.bounds()).unwrap();
        blender.feed(&src, &Mask::full(13, 7), Point::ORIGIN).unwrap();
        let out = blender.blend().unwrap().image.to_u8();
        for (a, b) in out.data().iter().zip(src.data()) {
            assert!((*a as i32 - *b as i32).abs() <= 1, "{a} vs {b}");
        }
    }

    #[test]
    fn test_single_source_round_trip_f32() {
        let src = Image::from_fn(21, 9, 2, |x, y, c| ((x * 5 + y * 3 + c as u32) % 11) as f32 / 10.0);
        let mut blender = MultiBandBlender::default();
        blender.prepare(src.bounds()).unwrap();
        blender.feed(&src, &Mask::full(21, 9), Point::ORIGIN).unwrap();
        let AnyImage::F32(out) = blender.blend().unwrap().image else {
            panic!("expected f32 output");
        };
        for (a, b) in out.data().iter().zip(src.data()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_fractional_weights_normalize() {
        let colour: Image<f32> = Image::filled(8, 10, &[0.6]);
        let mask_a = Mask::from_fn(8, 10, |x, y| 0.25 + 0.05 * ((x + y) % 3) as f32);
        let mask_b = Mask::from_fn(8, 10, |_, _| 0.7);

        let mut blender = MultiBandBlender::default();
        blender.prepare(Rect::from_size(20, 10)).unwrap();
        blender.feed(&colour, &mask_a, Point::new(0, 0)).unwrap();
        blender.feed(&colour, &mask_b, Point::new(6, 0)).unwrap();
        let out = blender.blend().unwrap();
        let AnyImage::F32(img) = out.image else {
            panic!("expected f32 output");
        };

        for y in 0..10 {
            for x in 0..20 {
                if x < 14 {
                    assert_relative_eq!(img.pixel(x, y)[0], 0.6, epsilon = 1e-4);
                    assert!(out.mask.is_covered(x, y));
                } else {
                    assert_eq!(img.pixel(x, y)[0], 0.0);
                    assert!(!out.mask.is_covered(x, y));
                }
            }
        }
    }

    #[test]
    fn test_hard_seam_is_smoothed() {
        let dark: Image<u8> = Image::filled(40, 16, &[0]);
        let light: Image<u8> = Image::filled(40, 16, &[200]);
        // Seam at canvas x = 32; the sources overlap on 24..40.
        let mask_a = Mask::from_fn(40, 16, |x, _| if x < 32 { 1.0 } else { 0.0 });
        let mask_b = Mask::from_fn(40, 16, |x, _| if x + 24 >= 32 { 1.0 } else { 0.0 });

        let mut blender = MultiBandBlender::new(BlendOptions {
            num_bands: 3,
            ..Default::default()
        });
        blender.prepare(Rect::from_size(64, 16)).unwrap();
        blender.feed(&dark, &mask_a, Point::new(0, 0)).unwrap();
        blender.feed(&light, &mask_b, Point::new(24, 0)).unwrap();
        let img = blender.blend().unwrap().image.to_u8();

        let row: Vec<i32> = img.row(8).iter().map(|&v| v as i32).collect();
        assert!(row[0] <= 2);
        assert!(row[63] >= 198);
        let steps: Vec<i32> = row.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(steps.iter().all(|&d| d >= -1), "not monotone: {row:?}");
        assert!(steps.iter().all(|&d| d <= 25), "hard edge: {row:?}");
        // The transition spreads over at least 2^bands pixels.
        assert!(steps.iter().filter(|&&d| d > 0).count() >= 8);
        for (top, bottom) in img.row(0).iter().zip(img.row(15)) {
            assert!((*top as i32 - *bottom as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_feed_order_does_not_matter() {
        let a = Image::from_fn(12, 8, 1, |x, y, _| ((x * 3 + y) % 7) as f32 / 7.0);
        let b = Image::from_fn(12, 8, 1, |x, y, _| ((x + y * 5) % 5) as f32 / 5.0);
        let mask_a = Mask::from_fn(12, 8, |x, _| 1.0 - x as f32 / 12.0);
        let mask_b = Mask::from_fn(12, 8, |x, _| x as f32 / 12.0);
        let canvas = Rect::from_size(18, 8);

        let run = |first: (&Image<f32>, &Mask, Point), second: (&Image<f32>, &Mask, Point)| {
            let mut blender = MultiBandBlender::default();
            blender.prepare(canvas).unwrap();
            blender.feed(first.0, first.1, first.2).unwrap();
            blender.feed(second.0, second.1, second.2).unwrap();
            blender.blend().unwrap().image.to_f32()
        };
        let ab = run((&a, &mask_a, Point::new(0, 0)), (&b, &mask_b, Point::new(6, 0)));
        let ba = run((&b, &mask_b, Point::new(6, 0)), (&a, &mask_a, Point::new(0, 0)));
        for (x, y) in ab.data().iter().zip(ba.data()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_negative_canvas_origin() {
        let img: Image<f32> = Image::filled(4, 4, &[0.5]);
        let mask = Mask::full(4, 4);
        let corners = [Point::new(-3, -2), Point::new(1, 0)];

        let mut blender = MultiBandBlender::default();
        blender.prepare_from_corners(&corners, &[(4, 4), (4, 4)]).unwrap();
        assert_eq!(blender.canvas(), Rect::new(-3, -2, 8, 6));
        blender.feed(&img, &mask, corners[0]).unwrap();
        blender.feed(&img, &mask, corners[1]).unwrap();
        let out = blender.blend().unwrap();

        assert_eq!(out.image.dimensions(), (8, 6));
        assert_eq!(out.mask.covered_count(), 32);
        let img = out.image.to_f32();
        assert_relative_eq!(img.pixel(0, 0)[0], 0.5, epsilon = 1e-4);
        assert_relative_eq!(img.pixel(7, 5)[0], 0.5, epsilon = 1e-4);
        assert_eq!(img.pixel(7, 0)[0], 0.0);
        assert!(!out.mask.is_covered(0, 5));
    }

    #[test]
    fn test_corner_count_mismatch() {
        let mut blender = MultiBandBlender::default();
        let err = blender
            .prepare_from_corners(&[Point::ORIGIN], &[(4, 4), (4, 4)])
            .unwrap_err();
        assert!(matches!(err, BlendError::InvalidParameter(_)));
        assert_eq!(blender.state(), SessionState::Unprepared);
    }

    #[test]
    fn test_state_errors() {
        let img: Image<u8> = Image::new(2, 2, 1);
        let mask = Mask::full(2, 2);
        let mut blender = MultiBandBlender::default();

        let err = blender.feed(&img, &mask, Point::ORIGIN).unwrap_err();
        assert!(matches!(
            err,
            BlendError::InvalidSessionState { op: "feed", state: SessionState::Unprepared }
        ));
        assert_eq!(err.to_string(), "cannot feed while blender is unprepared");

        blender.prepare(Rect::from_size(4, 4)).unwrap();
        let err = blender.blend().unwrap_err();
        assert!(matches!(
            err,
            BlendError::InvalidSessionState { op: "blend", state: SessionState::Prepared }
        ));

        blender.feed(&img, &mask, Point::ORIGIN).unwrap();
        blender.blend().unwrap();
        assert!(matches!(
            blender.feed(&img, &mask, Point::ORIGIN),
            Err(BlendError::InvalidSessionState { state: SessionState::Blended, .. })
        ));
        assert!(blender.blend().is_err());

        // A new session starts from scratch.
        blender.prepare(Rect::from_size(2, 2)).unwrap();
        assert_eq!(blender.state(), SessionState::Prepared);
        assert_eq!(blender.source_count(), 0);
        blender.feed(&img, &mask, Point::ORIGIN).unwrap();
        assert_eq!(blender.blend().unwrap().image.dimensions(), (2, 2));
    }

    #[test]
    fn test_mask_size_mismatch_rejected_upfront() {
        let img: Image<u8> = Image::new(4, 4, 3);
        let mut blender = MultiBandBlender::default();
        blender.prepare(Rect::from_size(8, 8)).unwrap();

        let err = blender.feed(&img, &Mask::full(4, 3), Point::ORIGIN).unwrap_err();
        assert!(matches!(
            err,
            BlendError::DimensionMismatch { a_width: 4, a_height: 4, b_width: 4, b_height: 3 }
        ));
        assert_eq!(blender.source_count(), 0);
        assert_eq!(blender.state(), SessionState::Prepared);
    }

    #[test]
    fn test_format_mismatch_rejected_upfront() {
        let mask = Mask::full(4, 4);
        let mut blender = MultiBandBlender::default();
        blender.prepare(Rect::from_size(8, 4)).unwrap();
        blender.feed(&Image::<u8>::new(4, 4, 3), &mask, Point::ORIGIN).unwrap();

        let err = blender
            .feed(&Image::<u8>::new(4, 4, 1), &mask, Point::new(4, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            BlendError::FormatMismatch { expected_channels: 3, got_channels: 1, .. }
        ));
        let err = blender
            .feed_any(&Image::<u16>::new(4, 4, 3).into(), &mask, Point::new(4, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            BlendError::FormatMismatch {
                expected_format: SampleFormat::U8,
                got_format: SampleFormat::U16,
                ..
            }
        ));
        assert_eq!(blender.source_count(), 1);
        assert_eq!(blender.state(), SessionState::Fed);
    }

    #[test]
    fn test_outside_canvas_rejected() {
        let img: Image<u8> = Image::new(4, 4, 1);
        let mask = Mask::full(4, 4);
        let mut blender = MultiBandBlender::default();
        blender.prepare(Rect::from_size(6, 4)).unwrap();

        let err = blender.feed(&img, &mask, Point::new(3, 0)).unwrap_err();
        match err {
            BlendError::OutsideCanvas { placed, canvas } => {
                assert_eq!(placed, Rect::new(3, 0, 4, 4));
                assert_eq!(canvas, Rect::from_size(6, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(blender.feed(&img, &mask, Point::new(-1, 0)).is_err());
        assert_eq!(blender.source_count(), 0);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let mut blender = MultiBandBlender::default();
        assert!(matches!(
            blender.prepare(Rect::from_size(0, 5)),
            Err(BlendError::InvalidParameter(_))
        ));
        blender.prepare(Rect::from_size(5, 5)).unwrap();
        let err = blender
            .feed(&Image::<u8>::new(0, 3, 1), &Mask::empty(0, 3), Point::ORIGIN)
            .unwrap_err();
        assert!(matches!(err, BlendError::InvalidParameter(_)));

        let mut bad = MultiBandBlender::new(BlendOptions {
            weight_eps: f32::NAN,
            ..Default::default()
        });
        assert!(bad.prepare(Rect::from_size(5, 5)).is_err());
    }

    #[test]
    fn test_uncovered_pixels() {
        let img: Image<u16> = Image::filled(4, 4, &[1000, 2000]);
        let mask = Mask::full(4, 4);

        let mut blender = MultiBandBlender::default();
        blender.prepare(Rect::from_size(10, 4)).unwrap();
        blender.feed(&img, &mask, Point::ORIGIN).unwrap();
        let out = blender.blend().unwrap();
        let AnyImage::U16(result) = out.image else {
            panic!("expected u16 output");
        };
        assert_eq!(out.mask.covered_count(), 16);
        assert_eq!(result.pixel(9, 3), &[0, 0]);
        assert_eq!(result.pixel(1, 1), &[1000, 2000]);
    }

    #[test]
    fn test_nan_mask_pixel_only_drops_itself() {
        let img: Image<u8> = Image::filled(16, 16, &[200]);
        let mask = Mask::from_fn(16, 16, |x, y| if (x, y) == (8, 8) { f32::NAN } else { 1.0 });

        let mut blender = MultiBandBlender::default();
        blender.prepare(img.bounds()).unwrap();
        blender.feed(&img, &mask, Point::ORIGIN).unwrap();
        let out = blender.blend().unwrap();
        let result = out.image.to_u8();

        assert_eq!(out.mask.covered_count(), 255);
        assert!(!out.mask.is_covered(8, 8));
        assert_eq!(result.pixel(8, 8), &[0]);
        for y in 0..16 {
            for x in 0..16 {
                if (x, y) != (8, 8) {
                    let v = result.pixel(x, y)[0] as i32;
                    assert!((v - 200).abs() <= 1, "({x}, {y}) = {v}");
                }
            }
        }
    }

    #[test]
    fn test_require_full_coverage() {
        let img: Image<u8> = Image::filled(4, 4, &[128]);
        let mask = Mask::full(4, 4);
        let mut blender = MultiBandBlender::new(BlendOptions {
            require_full_coverage: true,
            ..Default::default()
        });
        blender.prepare(Rect::from_size(10, 4)).unwrap();
        blender.feed(&img, &mask, Point::ORIGIN).unwrap();

        let err = blender.blend().unwrap_err();
        assert!(matches!(err, BlendError::DegenerateWeights { uncovered: 24 }));
        assert_eq!(blender.state(), SessionState::Fed);

        blender.feed(&img, &mask, Point::new(4, 0)).unwrap();
        blender.feed(&img, &mask, Point::new(6, 0)).unwrap();
        let out = blender.blend().unwrap();
        assert_eq!(out.mask.covered_count(), 40);
        assert!(out.image.to_u8().data().iter().all(|&v| v == 128));
    }

    #[test]
    fn test_band_count_follows_canvas() {
        let mut blender = MultiBandBlender::default();
        blender.prepare(Rect::from_size(6, 4)).unwrap();
        assert_eq!(blender.num_bands(), 3);
        blender.prepare(Rect::from_size(1, 1)).unwrap();
        assert_eq!(blender.num_bands(), 0);
        blender.prepare(Rect::from_size(1920, 1080)).unwrap();
        assert_eq!(blender.num_bands(), 5);
    }

    #[test]
    fn test_feed_region_alignment() {
        // 3 bands: gap 24, alignment 8.
        assert_eq!(axis_region(30, 10, 64, 3), (0, 64));
        assert_eq!(axis_region(40, 4, 128, 3), (16, 56));
        assert_eq!(axis_region(0, 4, 8, 3), (0, 8));
        let region = feed_region((40, 0), (4, 4), (128, 8), 3);
        assert_eq!(region, Rect::new(16, 0, 56, 8));
    }

    #[test]
    fn test_reflect_repeats_edge() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(9, 1), 0);
    }
}
