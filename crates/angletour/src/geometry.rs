//! Geometry primitives: distances, orientation, segment intersection,
//! centroids and path/tour lengths.
//!
//! Segment predicates go through `geo`'s robust kernel, so points on one
//! line are classified as colinear exactly and touching or overlapping
//! segments count as intersecting.

use geo::kernels::{Kernel, RobustKernel};
use geo::line_measures::Distance;
use geo::{Closest, ClosestPoint, Euclidean, Intersects, Line};

use crate::types::{Coord, Point};

/// Orientation of an ordered triplet of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The three coordinates lie on one line.
    Colinear,
    /// Turning right from `p -> q` to `q -> r`.
    Clockwise,
    /// Turning left from `p -> q` to `q -> r`.
    CounterClockwise,
}

// ---------------------------------------------------------------------------
// Conversions at the module boundary
// ---------------------------------------------------------------------------

const fn to_geo(c: Coord) -> geo::Coord<f64> {
    geo::Coord { x: c.x, y: c.y }
}

const fn from_geo(c: geo::Coord<f64>) -> Coord {
    Coord::new(c.x, c.y)
}

fn line(a: Coord, b: Coord) -> Line<f64> {
    Line::new(to_geo(a), to_geo(b))
}

/// Euclidean distance between two coordinate pairs.
#[must_use]
pub fn distance(a: Coord, b: Coord) -> f64 {
    Euclidean.distance(&geo::Point::from(to_geo(a)), &geo::Point::from(to_geo(b)))
}

/// Classify the ordered triplet `(p, q, r)` with an exact orientation
/// test.
#[must_use]
pub fn orientation(p: Coord, q: Coord, r: Coord) -> Orientation {
    match RobustKernel::orient2d(to_geo(p), to_geo(q), to_geo(r)) {
        geo::kernels::Orientation::Collinear => Orientation::Colinear,
        geo::kernels::Orientation::Clockwise => Orientation::Clockwise,
        geo::kernels::Orientation::CounterClockwise => Orientation::CounterClockwise,
    }
}

/// Returns `true` if segment `p1 -> q1` and segment `p2 -> q2` share at
/// least one point.
///
/// Crossing, touching at an endpoint and colinear overlap all count.
/// A degenerate segment is treated as a single point.
#[must_use]
pub fn segments_intersect(p1: Coord, q1: Coord, p2: Coord, q2: Coord) -> bool {
    line(p1, q1).intersects(&line(p2, q2))
}

/// Closest coordinate to `p` on segment `a -> b`.
///
/// A degenerate segment yields `a`.
#[must_use]
pub fn closest_on_segment(p: Coord, a: Coord, b: Coord) -> Coord {
    let segment = line(a, b);
    match segment.closest_point(&geo::Point::from(to_geo(p))) {
        Closest::Intersection(c) | Closest::SinglePoint(c) => from_geo(c.into()),
        Closest::Indeterminate => a,
    }
}

/// Distance from `p` to the closest point of segment `a -> b`.
///
/// When `a` and `b` coincide, returns the distance from `p` to `a`.
#[must_use]
pub fn point_segment_distance(p: Coord, a: Coord, b: Coord) -> f64 {
    distance(p, closest_on_segment(p, a, b))
}

/// Unweighted coordinate mean of `points`, or `None` if empty.
#[must_use]
pub fn centroid(points: &[Point]) -> Option<Coord> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x(), sy + p.y()));
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    Some(Coord::new(sx / n, sy / n))
}

/// Open path length: the sum of consecutive distances.
#[must_use]
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// Closed tour length: the open path length plus the edge from the last
/// point back to the first.
#[must_use]
pub fn tour_length(points: &[Point]) -> f64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 => path_length(points) + last.distance(first),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn distance_uses_euclidean_metric() {
        assert!((distance(c(0.0, 0.0), c(4.0, 3.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn orientation_classifies_turns() {
        assert_eq!(
            orientation(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)),
            Orientation::CounterClockwise
        );
        assert_eq!(
            orientation(c(0.0, 0.0), c(1.0, 0.0), c(1.0, -1.0)),
            Orientation::Clockwise
        );
        assert_eq!(
            orientation(c(0.0, 0.0), c(1.0, 1.0), c(2.0, 2.0)),
            Orientation::Colinear
        );
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(
            c(0.0, 0.0),
            c(2.0, 2.0),
            c(0.0, 2.0),
            c(2.0, 0.0)
        ));
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(
            c(0.0, 0.0),
            c(2.0, 0.0),
            c(0.0, 1.0),
            c(2.0, 1.0)
        ));
    }

    #[test]
    fn touching_endpoint_counts_as_intersection() {
        // The second segment starts exactly on the first one.
        assert!(segments_intersect(
            c(0.0, 0.0),
            c(4.0, 0.0),
            c(2.0, 0.0),
            c(2.0, 3.0)
        ));
    }

    #[test]
    fn colinear_overlap_intersects() {
        assert!(segments_intersect(
            c(0.0, 0.0),
            c(3.0, 0.0),
            c(2.0, 0.0),
            c(5.0, 0.0)
        ));
    }

    #[test]
    fn orientation_is_exact_on_diagonal_lines() {
        // x == y for every coordinate, so each triplet is exactly colinear
        // even though 0.1 and 0.3 are not representable.
        let steps = [0.0, 0.1, 0.2, 0.3, 0.7, 1.3, 2.9];
        for &a in &steps {
            for &b in &steps {
                for &r in &steps {
                    assert_eq!(
                        orientation(c(a, a), c(b, b), c(r, r)),
                        Orientation::Colinear,
                        "({a}, {b}, {r})"
                    );
                }
            }
        }
    }

    #[test]
    fn colinear_overlap_on_diagonal_intersects() {
        for i in 0..40 {
            let s = f64::from(i) * 0.1;
            assert!(
                segments_intersect(c(0.0, 0.0), c(s + 0.3, s + 0.3), c(s, s), c(s + 1.7, s + 1.7)),
                "overlap at offset {s}"
            );
        }
    }

    #[test]
    fn colinear_touch_on_diagonal_intersects() {
        assert!(segments_intersect(
            c(0.1, 0.1),
            c(0.3, 0.3),
            c(0.3, 0.3),
            c(0.7, 0.7)
        ));
        assert!(!segments_intersect(
            c(0.1, 0.1),
            c(0.3, 0.3),
            c(0.4, 0.4),
            c(0.7, 0.7)
        ));
    }

    #[test]
    fn colinear_disjoint_does_not_intersect() {
        assert!(!segments_intersect(
            c(0.0, 0.0),
            c(1.0, 0.0),
            c(2.0, 0.0),
            c(3.0, 0.0)
        ));
    }

    #[test]
    fn degenerate_segment_on_other_segment_intersects() {
        assert!(segments_intersect(
            c(1.0, 1.0),
            c(1.0, 1.0),
            c(0.0, 0.0),
            c(2.0, 2.0)
        ));
    }

    #[test]
    fn point_segment_distance_projects_and_clamps() {
        let a = c(0.0, 0.0);
        let b = c(4.0, 0.0);
        assert!((point_segment_distance(c(2.0, 3.0), a, b) - 3.0).abs() < 1e-12);
        assert!((point_segment_distance(c(7.0, 4.0), a, b) - 5.0).abs() < 1e-12);
        assert!((point_segment_distance(c(3.0, 4.0), a, a) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn closest_on_segment_clamps_to_ends() {
        let a = c(0.0, 0.0);
        let b = c(4.0, 0.0);
        assert_eq!(closest_on_segment(c(2.0, 3.0), a, b), c(2.0, 0.0));
        assert_eq!(closest_on_segment(c(-3.0, 1.0), a, b), a);
        assert_eq!(closest_on_segment(c(9.0, -1.0), a, b), b);
    }

    #[test]
    fn centroid_averages_coordinates() {
        let points = vec![
            Point::new("a", 2.0, 1.0),
            Point::new("b", 4.0, 3.0),
            Point::new("c", 6.0, 5.0),
        ];
        assert_eq!(centroid(&points), Some(c(4.0, 3.0)));
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn path_and_tour_length() {
        let points = vec![
            Point::new("a", 0.0, 0.0),
            Point::new("b", 0.0, 1.0),
            Point::new("c", 1.0, 1.0),
            Point::new("d", 1.0, 0.0),
        ];
        assert!((path_length(&points) - 3.0).abs() < 1e-12);
        assert!((tour_length(&points) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn lengths_of_tiny_inputs() {
        let one = vec![Point::new("a", 1.0, 1.0)];
        assert!(path_length(&one).abs() < f64::EPSILON);
        assert!(tour_length(&one).abs() < f64::EPSILON);
        assert!(tour_length(&[]).abs() < f64::EPSILON);

        let two = vec![Point::new("a", 0.0, 0.0), Point::new("b", 3.0, 4.0)];
        assert!((tour_length(&two) - 10.0).abs() < 1e-12);
    }
}
