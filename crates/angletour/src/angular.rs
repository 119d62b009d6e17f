//! Angular tour construction: order points by the angle of the vector
//! from a reference center, then close the sequence into a tour.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::sort::{AngleEntry, AngleSorter};
use crate::tour::Tour;
use crate::types::{Coord, Point, SolverError};

/// Selects how the reference center for angular ordering is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CenterEstimator {
    /// Unweighted coordinate mean.
    #[default]
    Average,

    /// Midpoint of the axis-aligned bounding box.
    ///
    /// Less sensitive to dense sub-regions pulling the center toward them.
    BoundingBox,
}

impl CenterEstimator {
    /// Estimate the center of `points`, or `None` if empty.
    #[must_use]
    pub fn estimate(self, points: &[Point]) -> Option<Coord> {
        match self {
            Self::Average => crate::geometry::centroid(points),
            Self::BoundingBox => bounding_box_center(points),
        }
    }
}

fn bounding_box_center(points: &[Point]) -> Option<Coord> {
    let first = points.first()?;
    let (min, max) = points.iter().fold(
        (first.coord(), first.coord()),
        |(min, max), p| {
            (
                Coord::new(min.x.min(p.x()), min.y.min(p.y())),
                Coord::new(max.x.max(p.x()), max.y.max(p.y())),
            )
        },
    );
    Some(min.midpoint(max))
}

/// Angle of `coord - center`, normalized into `[0, 1)`.
///
/// Zero points along the positive x axis and values grow
/// counter-clockwise. A coordinate equal to `center` has angle 0.
#[must_use]
pub fn normalized_angle(center: Coord, coord: Coord) -> f64 {
    let mut theta = (coord.y - center.y).atan2(coord.x - center.x);
    if theta < 0.0 {
        theta += TAU;
    }
    if theta >= TAU {
        theta = 0.0;
    }
    let normalized = theta / TAU;
    // Rounding can push tiny negative atan2 results up to exactly 1.
    if normalized >= 1.0 { 0.0 } else { normalized }
}

/// Builds closed tours by sorting points around their center.
#[derive(Debug)]
pub struct AngularTourBuilder {
    sorter: AngleSorter,
    center: CenterEstimator,
}

impl AngularTourBuilder {
    /// Create a builder sorting on `workers` threads.
    ///
    /// # Errors
    ///
    /// Propagates worker pool construction errors from [`AngleSorter::new`].
    pub fn new(workers: usize, center: CenterEstimator) -> Result<Self, SolverError> {
        Ok(Self {
            sorter: AngleSorter::new(workers)?,
            center,
        })
    }

    /// The center estimator in use.
    #[must_use]
    pub const fn center(&self) -> CenterEstimator {
        self.center
    }

    /// Build a tour over `points`, ordered by increasing angle around the
    /// estimated center.
    ///
    /// Points with equal angles keep their input order.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `points` is empty, or
    /// propagates a sort failure.
    pub fn build(&self, points: &[Point]) -> Result<Tour, SolverError> {
        let center = self.center.estimate(points).ok_or_else(|| {
            SolverError::InvalidInput("cannot build an angular tour over zero points".to_string())
        })?;
        self.build_around(points, center)
    }

    /// Build a tour over `points`, ordered by increasing angle around a
    /// caller-supplied `center`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `points` is empty or
    /// `center` is not finite.
    pub fn build_around(&self, points: &[Point], center: Coord) -> Result<Tour, SolverError> {
        if points.is_empty() {
            return Err(SolverError::InvalidInput(
                "cannot build an angular tour over zero points".to_string(),
            ));
        }
        if !center.is_finite() {
            return Err(SolverError::InvalidInput(format!(
                "angular center ({}, {}) is not finite",
                center.x, center.y
            )));
        }

        let entries: Vec<AngleEntry<usize>> = points
            .iter()
            .enumerate()
            .map(|(i, p)| AngleEntry::new(normalized_angle(center, p.coord()), i))
            .collect();
        let buckets = AngleSorter::bucket_count_for(entries.len());
        let sorted = self.sorter.sort(entries, buckets)?;

        let ordered = sorted
            .into_iter()
            .filter_map(|e| points.get(e.value).cloned())
            .collect();
        Ok(Tour::new(ordered))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn builder() -> AngularTourBuilder {
        AngularTourBuilder::new(2, CenterEstimator::Average).unwrap()
    }

    // --- normalized_angle tests ---

    #[test]
    fn angle_of_cardinal_directions() {
        let o = Coord::new(0.0, 0.0);
        assert!(normalized_angle(o, Coord::new(1.0, 0.0)).abs() < 1e-12);
        assert!((normalized_angle(o, Coord::new(0.0, 1.0)) - 0.25).abs() < 1e-12);
        assert!((normalized_angle(o, Coord::new(-1.0, 0.0)) - 0.5).abs() < 1e-12);
        assert!((normalized_angle(o, Coord::new(0.0, -1.0)) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn angle_at_center_is_zero() {
        let c = Coord::new(3.0, -2.0);
        assert!(normalized_angle(c, c).abs() < f64::EPSILON);
    }

    #[test]
    fn angle_stays_below_one() {
        let o = Coord::new(0.0, 0.0);
        let a = normalized_angle(o, Coord::new(1.0, -1e-300));
        assert!((0.0..1.0).contains(&a));
    }

    // --- CenterEstimator tests ---

    #[test]
    fn average_and_bounding_box_centers_differ_for_skewed_input() {
        let points = vec![
            Point::new("a", 0.0, 0.0),
            Point::new("b", 1.0, 0.0),
            Point::new("c", 2.0, 0.0),
            Point::new("d", 9.0, 0.0),
        ];
        assert_eq!(
            CenterEstimator::Average.estimate(&points),
            Some(Coord::new(3.0, 0.0))
        );
        assert_eq!(
            CenterEstimator::BoundingBox.estimate(&points),
            Some(Coord::new(4.5, 0.0))
        );
        assert_eq!(CenterEstimator::BoundingBox.estimate(&[]), None);
    }

    // --- AngularTourBuilder tests ---

    #[test]
    fn tour_orders_square_counter_clockwise() {
        let points = vec![
            Point::new("ne", 1.0, 1.0),
            Point::new("sw", -1.0, -1.0),
            Point::new("se", 1.0, -1.0),
            Point::new("nw", -1.0, 1.0),
        ];
        let tour = builder().build(&points).unwrap();
        let ids: Vec<&str> = tour.points().iter().map(Point::id).collect();
        assert_eq!(ids, vec!["ne", "nw", "sw", "se"]);
        assert!((tour.length() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn tour_contains_every_input_point_once() {
        let points: Vec<Point> = (0..57)
            .map(|i| {
                let t = f64::from(i) * 0.37;
                Point::new(format!("p{i}"), t.cos() * (1.0 + t), t.sin() * 2.0)
            })
            .collect();
        let tour = builder().build(&points).unwrap();
        assert_eq!(tour.len(), points.len());
        let ids: HashSet<&str> = tour.points().iter().map(Point::id).collect();
        assert_eq!(ids.len(), points.len());
    }

    #[test]
    fn point_at_centroid_comes_first() {
        let points = vec![
            Point::new("left", -1.0, 0.0),
            Point::new("mid", 0.0, 0.0),
            Point::new("right", 1.0, 0.0),
        ];
        let tour = builder().build(&points).unwrap();
        // "mid" and "right" both have angle 0; ties keep input order.
        let ids: Vec<&str> = tour.points().iter().map(Point::id).collect();
        assert_eq!(ids, vec!["mid", "right", "left"]);
    }

    #[test]
    fn single_point_tour() {
        let tour = builder().build(&[Point::new("a", 5.0, 5.0)]).unwrap();
        assert_eq!(tour.len(), 1);
        assert!(tour.length().abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            builder().build(&[]),
            Err(SolverError::InvalidInput(_))
        ));
    }

    #[test]
    fn build_around_rejects_non_finite_center() {
        let points = vec![Point::new("a", 0.0, 0.0)];
        assert!(matches!(
            builder().build_around(&points, Coord::new(f64::NAN, 0.0)),
            Err(SolverError::InvalidInput(_))
        ));
    }
}
