//! N-dimensional geometry primitives backing the R-tree index (spec §4.4),
//! grounded on `original_source`'s `geometry.py` (`Point`, `BoundingBox`).

/// A point in N-dimensional space.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub coords: Vec<f64>,
}

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Point { coords }
    }

    pub fn dims(&self) -> usize {
        self.coords.len()
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// An axis-aligned bounding box, stored as per-dimension `(min, max)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BoundingBox {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        assert_eq!(min.len(), max.len(), "bounding box dimension mismatch");
        BoundingBox { min, max }
    }

    pub fn from_point(p: &Point) -> Self {
        BoundingBox {
            min: p.coords.clone(),
            max: p.coords.clone(),
        }
    }

    pub fn dims(&self) -> usize {
        self.min.len()
    }

    /// Volume (area in 2D) of the box; zero for a degenerate point box.
    pub fn area(&self) -> f64 {
        self.min
            .iter()
            .zip(self.max.iter())
            .map(|(lo, hi)| (hi - lo).max(0.0))
            .product()
    }

    /// Sum of the side lengths, used by the R*-tree margin-minimizing axis
    /// selection (spec §4.4).
    pub fn margin(&self) -> f64 {
        self.min
            .iter()
            .zip(self.max.iter())
            .map(|(lo, hi)| (hi - lo).max(0.0))
            .sum()
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min
            .iter()
            .zip(self.max.iter())
            .zip(other.min.iter().zip(other.max.iter()))
            .all(|((a_lo, a_hi), (b_lo, b_hi))| a_lo <= b_hi && b_lo <= a_hi)
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        self.min
            .iter()
            .zip(self.max.iter())
            .zip(p.coords.iter())
            .all(|((lo, hi), c)| lo <= c && c <= hi)
    }

    /// Smallest box covering both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let min = self
            .min
            .iter()
            .zip(other.min.iter())
            .map(|(a, b)| a.min(*b))
            .collect();
        let max = self
            .max
            .iter()
            .zip(other.max.iter())
            .map(|(a, b)| a.max(*b))
            .collect();
        BoundingBox { min, max }
    }

    pub fn union_all<'a>(boxes: impl Iterator<Item = &'a BoundingBox>) -> Option<BoundingBox> {
        boxes.fold(None, |acc, b| match acc {
            None => Some(b.clone()),
            Some(acc) => Some(acc.union(b)),
        })
    }

    /// Area growth incurred by enlarging `self` to also cover `other`; the
    /// R-tree's choose-subtree criterion minimizes this.
    pub fn enlargement(&self, other: &BoundingBox) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Overlap volume between two boxes (zero when disjoint), used by the
    /// R*-tree overlap-minimizing split step.
    pub fn overlap(&self, other: &BoundingBox) -> f64 {
        self.min
            .iter()
            .zip(self.max.iter())
            .zip(other.min.iter().zip(other.max.iter()))
            .map(|((a_lo, a_hi), (b_lo, b_hi))| (a_hi.min(*b_hi) - a_lo.max(*b_lo)).max(0.0))
            .product()
    }

    /// Euclidean distance from `point` to the nearest point on or within the
    /// box; zero when the point is inside.
    pub fn distance_to_point(&self, point: &Point) -> f64 {
        self.min
            .iter()
            .zip(self.max.iter())
            .zip(point.coords.iter())
            .map(|((lo, hi), c)| {
                if c < lo {
                    (lo - c).powi(2)
                } else if c > hi {
                    (c - hi).powi(2)
                } else {
                    0.0
                }
            })
            .sum::<f64>()
            .sqrt()
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.min
                .iter()
                .zip(self.max.iter())
                .map(|(lo, hi)| (lo + hi) / 2.0)
                .collect(),
        )
    }
}

#[cfg(test)]
mod geometry_test;
