// THEORY:
// The `Blob` is the single output of the perception half of the loop. It summarizes
// the largest connected region of the segmentation mask for one frame.
//
// Key architectural principles:
// 1.  **Stateless Data Container**: A `Blob` describes one frame only. Nothing about
//     it survives to the next cycle; the arbiter keeps the only cross-frame state.
// 2.  **Summary, not Shape**: The contour the blob was derived from is dropped once
//     the centroid and enclosing circle are known. Downstream stages only ever ask
//     "where" and "how big".

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// The detected object candidate for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    /// Center of pixel mass of the selected contour, rounded to whole pixels.
    pub centroid: Point,
    /// Center of the minimum enclosing circle of the contour.
    pub circle_center: (f32, f32),
    /// Radius of the minimum enclosing circle, in pixels.
    pub radius: f32,
    /// Area enclosed by the contour, in square pixels.
    pub area: f64,
}

impl Blob {
    /// True iff this blob is large enough to drive toward.
    pub fn qualifies(&self, min_radius: f32) -> bool {
        self.radius > min_radius
    }
}
