//! Pixel coordinates, patch regions and rectangular windows.

/// Integer pixel coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pixel {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
}

impl Pixel {
    /// Creates a pixel coordinate.
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Applies a signed offset, returning `None` on underflow or overflow.
    ///
    /// The result is not checked against any image extent.
    pub fn offset(self, dx: isize, dy: isize) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add_signed(dx)?,
            y: self.y.checked_add_signed(dy)?,
        })
    }

    /// Signed offset from `other` to `self`.
    pub fn delta_from(self, other: Pixel) -> (isize, isize) {
        (
            self.x as isize - other.x as isize,
            self.y as isize - other.y as isize,
        )
    }

    /// Returns true if the pixel lies inside a `width x height` extent.
    pub fn is_inside(self, width: usize, height: usize) -> bool {
        self.x < width && self.y < height
    }
}

/// Square patch window of side `2 * radius + 1` centered on a pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PatchRegion {
    center: Pixel,
    radius: usize,
}

impl PatchRegion {
    /// Creates the patch of `radius` around `center`.
    pub const fn new(center: Pixel, radius: usize) -> Self {
        Self { center, radius }
    }

    /// Shorthand for `PatchRegion::new(Pixel::new(x, y), radius)`.
    pub const fn around(x: usize, y: usize, radius: usize) -> Self {
        Self::new(Pixel::new(x, y), radius)
    }

    /// Returns the center pixel.
    pub fn center(&self) -> Pixel {
        self.center
    }

    /// Returns the patch radius.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Returns the side length `2 * radius + 1`.
    pub fn side(&self) -> usize {
        2 * self.radius + 1
    }

    /// Left column. Saturates at zero for patches clipped by the left edge.
    pub fn x0(&self) -> usize {
        self.center.x.saturating_sub(self.radius)
    }

    /// Top row. Saturates at zero for patches clipped by the top edge.
    pub fn y0(&self) -> usize {
        self.center.y.saturating_sub(self.radius)
    }

    /// Returns true if the whole window lies inside a `width x height` extent.
    pub fn is_inside(&self, width: usize, height: usize) -> bool {
        self.center.x >= self.radius
            && self.center.y >= self.radius
            && self.center.x + self.radius < width
            && self.center.y + self.radius < height
    }

    /// Moves the center by a signed offset.
    pub fn translated(&self, dx: isize, dy: isize) -> Option<Self> {
        Some(Self::new(self.center.offset(dx, dy)?, self.radius))
    }

    /// Same patch size at another center.
    pub fn recentered(&self, center: Pixel) -> Self {
        Self::new(center, self.radius)
    }

    /// Iterates the pixels of the window in raster order.
    ///
    /// Pixels that would fall left of or above the origin are skipped.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel> + '_ {
        let r = self.radius as isize;
        (-r..=r).flat_map(move |dy| (-r..=r).filter_map(move |dx| self.center.offset(dx, dy)))
    }
}

/// Axis-aligned rectangle of pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    /// Left column.
    pub x: usize,
    /// Top row.
    pub y: usize,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full `width x height` extent.
    pub const fn extent(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Square window of `radius` around `center`, cropped to the extent.
    pub fn around(center: Pixel, radius: usize, width: usize, height: usize) -> Self {
        let x0 = center.x.saturating_sub(radius).min(width);
        let y0 = center.y.saturating_sub(radius).min(height);
        let x1 = center.x.saturating_add(radius).saturating_add(1).min(width);
        let y1 = center.y.saturating_add(radius).saturating_add(1).min(height);
        Self::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }

    /// Returns true if the rectangle covers no pixel.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns true if `pixel` lies inside the rectangle.
    pub fn contains(&self, pixel: Pixel) -> bool {
        pixel.x >= self.x
            && pixel.y >= self.y
            && pixel.x < self.x + self.width
            && pixel.y < self.y + self.height
    }
}
