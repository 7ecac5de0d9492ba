use crate::FloatImage;
use nalgebra::Point2;

/// Interest point in `(row, col)` image order.
pub type RowCol = [f64; 2];

/// An impression: its image and the interest points detected on it.
///
/// Points are kept in `(row, col)` order, the convention detectors emit.
/// Geometry (mappings, warps) works in `(x, y) = (col, row)`; use
/// [`PointSet::xy`] to cross over.
#[derive(Clone, Debug)]
pub struct PointSet {
    pub points: Vec<RowCol>,
    pub image: FloatImage,
}

impl PointSet {
    /// Build a point set, dropping exact duplicate points.
    ///
    /// First occurrences keep their relative order.
    pub fn new(points: Vec<RowCol>, image: FloatImage) -> Self {
        Self {
            points: unique_points(points),
            image,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points as `(x, y) = (col, row)`.
    pub fn xy(&self) -> Vec<Point2<f64>> {
        rc_to_xy(&self.points)
    }
}

/// Convert `(row, col)` points into `(x, y)` points.
pub fn rc_to_xy(points: &[RowCol]) -> Vec<Point2<f64>> {
    points.iter().map(|p| Point2::new(p[1], p[0])).collect()
}

fn unique_points(points: Vec<RowCol>) -> Vec<RowCol> {
    let mut seen = std::collections::HashSet::with_capacity(points.len());
    points
        .into_iter()
        .filter(|p| seen.insert((p[0].to_bits(), p[1].to_bits())))
        .collect()
}
