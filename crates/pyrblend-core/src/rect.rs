//! Canvas geometry: integer points and rectangles.
//!
//! Blending places every source at an integer offset inside an output
//! canvas. Offsets may be negative relative to each other (the canvas is
//! usually derived from the sources' bounding box), so origins are signed.
//!
//! # Coordinate System
//!
//! - Origin (0, 0) is at the **top-left** corner
//! - X increases to the right
//! - Y increases downward
//!
//! # Usage
//!
//! ```rust
//! use pyrblend_core::{Point, Rect};
//!
//! let canvas = Rect::bounding(&[Point::new(0, 0), Point::new(2, 0)], &[(4, 4), (4, 4)]);
//! assert_eq!(canvas, Rect::new(0, 0, 6, 4));
//!
//! let placed = Rect::at(Point::new(2, 0), 4, 4);
//! assert!(canvas.contains_rect(&placed));
//! ```

/// An integer 2D point (pixel offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The origin (0, 0).
    pub const ORIGIN: Self = Self::new(0, 0);
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// A rectangle defined by a signed origin and unsigned dimensions.
///
/// # Invariants
///
/// - A rectangle with zero width or height is considered empty
/// - `right()` and `bottom()` are exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle from origin (0, 0) with given dimensions.
    #[inline]
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Creates a rectangle with its top-left corner at `tl`.
    #[inline]
    pub const fn at(tl: Point, width: u32, height: u32) -> Self {
        Self::new(tl.x, tl.y, width, height)
    }

    /// Returns the top-left corner.
    #[inline]
    pub const fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Returns the right edge X coordinate (exclusive).
    #[inline]
    pub const fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Returns the bottom edge Y coordinate (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// Returns the area in pixels.
    #[inline]
    pub const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns `true` if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Returns the intersection of two rectangles, or `None` if they don't overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 as i64 || y1 <= y0 as i64 {
            return None;
        }
        Some(Rect::new(x0, y0, (x1 - x0 as i64) as u32, (y1 - y0 as i64) as u32))
    }

    /// Returns the smallest rectangle containing both rectangles.
    ///
    /// Empty rectangles are ignored.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::new(x0, y0, (x1 - x0 as i64) as u32, (y1 - y0 as i64) as u32)
    }

    /// Bounding rectangle of sources placed at `corners` with the given `(width, height)` sizes.
    ///
    /// Pairs beyond the shorter of the two slices are ignored.
    pub fn bounding(corners: &[Point], sizes: &[(u32, u32)]) -> Rect {
        corners
            .iter()
            .zip(sizes)
            .map(|(tl, &(w, h))| Rect::at(*tl, w, h))
            .fold(Rect::default(), |acc, r| acc.union(&r))
    }
}
