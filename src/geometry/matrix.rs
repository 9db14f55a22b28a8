//! Affine transformation matrix for glyph placement.

use serde::{Deserialize, Serialize};

use super::{euclidean_distance, Point};

/// A 2D transformation matrix.
///
/// PDF uses matrices of the form:
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// Where (a,b,c,d) define scaling/rotation/skewing and (e,f) define translation.
/// Points are row vectors, so `p' = p × M`.
///
/// A glyph's matrix maps its local glyph space (one unit = one em) onto the
/// text space it is drawn in. Advancing the pen only touches `e` and `f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// Create a matrix from its six coefficients.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_anonymizer::geometry::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!(m.a, 1.0);
    /// assert_eq!(m.d, 1.0);
    /// assert_eq!(m.e, 0.0);
    /// assert_eq!(m.f, 0.0);
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Create a translation matrix.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Create a scaling matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_anonymizer::geometry::Matrix;
    ///
    /// let m = Matrix::scaling(2.0, 3.0);
    /// assert_eq!(m.a, 2.0);
    /// assert_eq!(m.d, 3.0);
    /// ```
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Concatenate with a parent transform.
    ///
    /// The result applies `self` first, then `parent`; this is how a glyph
    /// matrix in text space is carried into device space by the CTM.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_anonymizer::geometry::Matrix;
    ///
    /// let glyph = Matrix::new(12.0, 0.0, 0.0, 12.0, 100.0, 700.0);
    /// let device = glyph.concat(&Matrix::scaling(2.0, 2.0));
    /// assert_eq!(device.a, 24.0);
    /// assert_eq!(device.e, 200.0);
    /// assert_eq!(device.f, 1400.0);
    /// ```
    pub fn concat(&self, parent: &Matrix) -> Matrix {
        Matrix {
            a: self.a * parent.a + self.b * parent.c,
            b: self.a * parent.b + self.b * parent.d,
            c: self.c * parent.a + self.d * parent.c,
            d: self.c * parent.b + self.d * parent.d,
            e: self.e * parent.a + self.f * parent.c + parent.e,
            f: self.e * parent.b + self.f * parent.d + parent.f,
        }
    }

    /// Move the origin by `(tx, ty)` measured along the local axes.
    ///
    /// Only the translation changes; `a`, `b`, `c` and `d` are copied
    /// verbatim. Equivalent to `Matrix::translation(tx, ty).concat(self)`,
    /// so advancing and concatenating commute.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_anonymizer::geometry::Matrix;
    ///
    /// let m = Matrix::new(10.0, 0.0, 0.0, 10.0, 5.0, 5.0);
    /// let next = m.advance(0.5, 0.0);
    /// assert_eq!(next.e, 10.0);
    /// assert_eq!(next.f, 5.0);
    /// assert_eq!(next.a, m.a);
    /// ```
    pub fn advance(&self, tx: f32, ty: f32) -> Matrix {
        Matrix {
            e: self.e + tx * self.a + ty * self.c,
            f: self.f + tx * self.b + ty * self.d,
            ..*self
        }
    }

    /// The translation component as a point.
    pub fn origin(&self) -> Point {
        Point::new(self.e, self.f)
    }

    /// Euclidean distance between the translation components.
    pub fn distance(&self, other: &Matrix) -> f32 {
        euclidean_distance(&self.origin(), &other.origin())
    }

    /// Whether the linear parts match exactly and the origins lie within
    /// `max_distance` of each other.
    pub fn equals_within(&self, other: &Matrix, max_distance: f32) -> bool {
        self.a == other.a
            && self.b == other.b
            && self.c == other.c
            && self.d == other.d
            && self.distance(other) <= max_distance
    }

    /// Transform a point using this matrix.
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Bit patterns of the six coefficients, with `-0.0` folded onto `0.0`.
    ///
    /// Used to derive hashable glyph identities.
    pub fn to_bits(&self) -> [u32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f].map(|v| (v + 0.0).to_bits())
    }

    /// Get the determinant of this matrix.
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_preserves_linear_part() {
        let m = Matrix::new(2.0, 1.0, -1.0, 3.0, 4.0, 5.0);
        let n = m.advance(1.5, -2.0);
        assert_eq!((n.a, n.b, n.c, n.d), (m.a, m.b, m.c, m.d));
        assert_eq!(n.e, 4.0 + 1.5 * 2.0 + -2.0 * -1.0);
        assert_eq!(n.f, 5.0 + 1.5 * 1.0 + -2.0 * 3.0);
    }

    #[test]
    fn test_advance_matches_translation_concat() {
        let m = Matrix::new(2.0, 0.5, 0.25, 3.0, 7.0, -1.0);
        let a = m.advance(0.75, 0.5);
        let b = Matrix::translation(0.75, 0.5).concat(&m);
        assert!(a.distance(&b) < 1e-5);
        assert_eq!((a.a, a.b, a.c, a.d), (b.a, b.b, b.c, b.d));
    }

    #[test]
    fn test_concat_with_identity() {
        let m = Matrix::new(2.0, 0.5, 0.25, 3.0, 7.0, -1.0);
        assert_eq!(m.concat(&Matrix::identity()), m);
        assert_eq!(Matrix::identity().concat(&m), m);
    }

    #[test]
    fn test_equals_within() {
        let m = Matrix::new(12.0, 0.0, 0.0, 12.0, 100.0, 100.0);
        assert!(m.equals_within(&m.advance(0.05, 0.0), 1.0));
        assert!(!m.equals_within(&m.advance(0.5, 0.0), 1.0));

        let skewed = Matrix { c: 0.1, ..m };
        assert!(!m.equals_within(&skewed, 100.0));
    }

    #[test]
    fn test_vertical_advance() {
        let m = Matrix::new(10.0, 0.0, 0.0, 10.0, 0.0, 0.0);
        let n = m.advance(0.0, -1.0);
        assert_eq!(n.e, 0.0);
        assert_eq!(n.f, -10.0);
    }

    #[test]
    fn test_to_bits_folds_negative_zero() {
        let a = Matrix::new(1.0, 0.0, -0.0, 1.0, 0.0, -0.0);
        let b = Matrix::identity();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_transform_point() {
        let m = Matrix::translation(10.0, 20.0);
        let p = m.transform_point(5.0, 10.0);
        assert_eq!(p.x, 15.0);
        assert_eq!(p.y, 30.0);
    }
}
