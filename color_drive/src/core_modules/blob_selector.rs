// THEORY:
// The `BlobSelector` is the spatial analysis stage. It reduces a binary mask to at
// most one `Blob`: the largest connected foreground region.
//
// Algorithm steps:
// 1.  **External Contours**: trace the border of every connected foreground region
//     and keep only the outermost borders. Holes and anything nested inside a hole
//     are ignored; a ring is one blob, not two. The mask is traced inside a one
//     pixel background frame, so a region touching the image border (or filling
//     the whole image) still has an outer border.
// 2.  **Largest by Area**: the area of each contour polygon is its zeroth moment.
//     The first contour found wins a tie.
// 3.  **Centroid**: first-order moments of the same polygon, `(m10/m00, m01/m00)`.
//     A zero-area contour (a single pixel, a one-pixel line) has no centroid and is
//     reported as "no blob" instead of dividing by zero. The centroid is rounded to
//     the nearest pixel rather than truncated.
// 4.  **Enclosing Circle**: the minimum circle containing every contour point
//     supplies the blob's radius, which is what the arbiter compares against.
//
// Like the segmenter, this stage is stateless.

use crate::core_modules::blob::{Blob, Point};

pub mod blob_selector {
    use super::*;
    use crate::core_modules::color_segmenter::Mask;
    use image::imageops;
    use imageproc::contours::{BorderType, find_contours};

    /// Selects the largest external blob in `mask`, or `None` if there is no
    /// region with a non-zero area.
    pub fn select(mask: &Mask) -> Option<Blob> {
        // The tracer only opens an outer border after a background pixel, which a
        // region starting at column 0 never has.
        let mut framed = Mask::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut framed, mask, 1, 1);
        let contours = find_contours::<i32>(&framed);

        // --- 1 & 2. Largest external contour ---
        let mut best: Option<(Vec<(f64, f64)>, ContourMoments)> = None;
        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        {
            let points: Vec<(f64, f64)> = contour
                .points
                .iter()
                .map(|p| ((p.x - 1) as f64, (p.y - 1) as f64))
                .collect();
            let moments = ContourMoments::of_polygon(&points);
            let is_larger = best
                .as_ref()
                .is_none_or(|(_, current)| moments.area() > current.area());
            if is_larger {
                best = Some((points, moments));
            }
        }
        let (points, moments) = best?;

        // --- 3. Centroid ---
        let (cx, cy) = moments.centroid()?;

        // --- 4. Enclosing circle ---
        let circle = min_enclosing_circle(&points)?;

        Some(Blob {
            centroid: Point {
                x: cx.round() as i32,
                y: cy.round() as i32,
            },
            circle_center: (circle.center.0 as f32, circle.center.1 as f32),
            radius: circle.radius as f32,
            area: moments.area(),
        })
    }
}

/// Spatial moments of a closed polygon, up to first order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContourMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl ContourMoments {
    /// Integrates over the polygon interior with Green's theorem. The result does
    /// not depend on the winding direction of `points`.
    pub fn of_polygon(points: &[(f64, f64)]) -> Self {
        let mut m00 = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;

        if points.len() >= 3 {
            for (i, &(x0, y0)) in points.iter().enumerate() {
                let (x1, y1) = points[(i + 1) % points.len()];
                let cross = x0 * y1 - x1 * y0;
                m00 += cross;
                m10 += cross * (x0 + x1);
                m01 += cross * (y0 + y1);
            }
        }

        let sign = if m00 < 0.0 { -1.0 } else { 1.0 };
        Self {
            m00: sign * m00 / 2.0,
            m10: sign * m10 / 6.0,
            m01: sign * m01 / 6.0,
        }
    }

    pub fn area(&self) -> f64 {
        self.m00
    }

    /// `None` for a degenerate (zero-area) polygon.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00.abs() <= f64::EPSILON {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (f64, f64),
    pub radius: f64,
}

impl Circle {
    fn contains(&self, p: (f64, f64)) -> bool {
        distance(self.center, p) <= self.radius * (1.0 + 1e-9) + 1e-9
    }

    fn through_two(a: (f64, f64), b: (f64, f64)) -> Self {
        let center = ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0);
        Self {
            center,
            radius: distance(a, b) / 2.0,
        }
    }

    fn through_three(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Self {
        let (bx, by) = (b.0 - a.0, b.1 - a.1);
        let (cx, cy) = (c.0 - a.0, c.1 - a.1);
        let d = 2.0 * (bx * cy - by * cx);
        if d.abs() < 1e-12 {
            // Collinear: the widest pair spans the other point.
            return [
                Self::through_two(a, b),
                Self::through_two(a, c),
                Self::through_two(b, c),
            ]
            .into_iter()
            .fold(Self::through_two(a, b), |widest, candidate| {
                if candidate.radius > widest.radius {
                    candidate
                } else {
                    widest
                }
            });
        }
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (cy * b2 - by * c2) / d;
        let uy = (bx * c2 - cx * b2) / d;
        Self {
            center: (a.0 + ux, a.1 + uy),
            radius: (ux * ux + uy * uy).sqrt(),
        }
    }
}

fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Minimum enclosing circle (incremental Welzl). `None` for an empty input.
pub fn min_enclosing_circle(points: &[(f64, f64)]) -> Option<Circle> {
    let first = *points.first()?;

    // Contour order is the worst case for the incremental algorithm; visit the
    // points with a stride coprime to their count instead.
    let n = points.len();
    let mut stride = (n as f64 * 0.618) as usize | 1;
    while gcd(stride, n) != 1 {
        stride += 2;
    }
    let order: Vec<(f64, f64)> = (0..n).map(|i| points[(i * stride) % n]).collect();

    let mut circle = Circle {
        center: first,
        radius: 0.0,
    };
    for i in 0..n {
        if circle.contains(order[i]) {
            continue;
        }
        circle = Circle {
            center: order[i],
            radius: 0.0,
        };
        for j in 0..i {
            if circle.contains(order[j]) {
                continue;
            }
            circle = Circle::through_two(order[i], order[j]);
            for k in 0..j {
                if !circle.contains(order[k]) {
                    circle = Circle::through_three(order[i], order[j], order[k]);
                }
            }
        }
    }
    Some(circle)
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}
