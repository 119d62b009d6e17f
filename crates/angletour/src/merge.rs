//! Splicing local cluster tours into the global tour.
//!
//! The global tour visits noise points and one representative per
//! cluster. Each representative is replaced in turn by its cluster's
//! local tour, cut open between two adjacent entry points and connected
//! to the representative's former neighbors in the cheaper orientation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::{centroid, point_segment_distance};
use crate::tour::{Direction, Tour};
use crate::types::{Coord, Edge, EntryPointPair, Point, SolverError};

/// What to do when no local tour edge crosses the segment between the
/// global and local centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntryFallback {
    /// Cut the local tour at the edge whose midpoint lies closest to the
    /// centroid segment.
    #[default]
    NearestEdge,

    /// Abort the merge with [`SolverError::StructuralInconsistency`].
    Fail,
}

/// Splices local tours into a global tour in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TourMerger {
    fallback: EntryFallback,
}

impl TourMerger {
    /// Create a merger with the given entry point fallback.
    #[must_use]
    pub const fn new(fallback: EntryFallback) -> Self {
        Self { fallback }
    }

    /// The entry point fallback in use.
    #[must_use]
    pub const fn fallback(&self) -> EntryFallback {
        self.fallback
    }

    /// Replace every representative in `global` by its local tour.
    ///
    /// `local_tours[i]` belongs to `representatives[i]`. `entry_points` is
    /// either empty or holds one optional precomputed pair per cluster;
    /// missing pairs are found with [`find_entry_points`](Self::find_entry_points).
    /// Clusters are processed in slice order, each against the tour left
    /// by the previous splice.
    ///
    /// An empty `global` with exactly one cluster becomes that cluster's
    /// local tour.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for mismatched slice lengths,
    /// an empty local tour, or an empty global tour with more than one
    /// cluster. Returns [`SolverError::StructuralInconsistency`] if a
    /// representative is missing from the tour, entry points are not
    /// adjacent, no entry edge can be found, or the result repeats a
    /// point.
    pub fn merge(
        &self,
        global: &mut Tour,
        global_center: Coord,
        local_tours: &[Tour],
        representatives: &[Point],
        entry_points: &[Option<EntryPointPair>],
    ) -> Result<(), SolverError> {
        if local_tours.len() != representatives.len() {
            return Err(SolverError::InvalidInput(format!(
                "{} local tours for {} representatives",
                local_tours.len(),
                representatives.len()
            )));
        }
        if !entry_points.is_empty() && entry_points.len() != local_tours.len() {
            return Err(SolverError::InvalidInput(format!(
                "{} entry point pairs for {} local tours",
                entry_points.len(),
                local_tours.len()
            )));
        }
        if let Some(empty) = local_tours.iter().position(Tour::is_empty) {
            return Err(SolverError::InvalidInput(format!(
                "local tour for representative {} is empty",
                representatives[empty].id()
            )));
        }
        if global.is_empty() {
            return match local_tours {
                [] => Ok(()),
                [only] => {
                    *global = only.clone();
                    Ok(())
                }
                _ => Err(SolverError::InvalidInput(format!(
                    "cannot merge {} clusters into an empty global tour",
                    local_tours.len()
                ))),
            };
        }

        log::info!(
            "merge: start clusters={} global_points={}",
            local_tours.len(),
            global.len()
        );

        for (i, (local, representative)) in local_tours.iter().zip(representatives).enumerate() {
            let entry = entry_points.get(i).and_then(Option::as_ref);
            self.splice(global, global_center, local, representative, entry)?;
        }

        let mut seen = HashSet::with_capacity(global.len());
        if let Some(dup) = global.points().iter().find(|p| !seen.insert(p.id())) {
            return Err(SolverError::StructuralInconsistency(format!(
                "merged tour visits point {} more than once",
                dup.id()
            )));
        }

        log::info!("merge: done points={} length={:.3}", global.len(), global.length());
        Ok(())
    }

    /// Pick the two adjacent local tour points where `local` is cut open.
    ///
    /// Among the local edges (the closing edge included) crossing the
    /// segment from `global_center` to the local centroid, the one whose
    /// midpoint is closest to `global_center` wins; earlier edges win
    /// ties. If none crosses, the configured [`EntryFallback`] applies.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `local` has fewer than two
    /// points and [`SolverError::StructuralInconsistency`] if no edge
    /// crosses under [`EntryFallback::Fail`].
    pub fn find_entry_points(
        &self,
        local: &Tour,
        global_center: Coord,
    ) -> Result<EntryPointPair, SolverError> {
        let points = local.points();
        if points.len() < 2 {
            return Err(SolverError::InvalidInput(format!(
                "entry points need a local tour of at least 2 points, got {}",
                points.len()
            )));
        }
        let local_center = centroid(points).ok_or_else(|| {
            SolverError::InvalidInput("local tour has no centroid".to_string())
        })?;
        let aux = Edge::new(global_center, local_center);

        let edges = move || {
            points
                .iter()
                .enumerate()
                .map(move |(i, p)| (p, &points[(i + 1) % points.len()]))
        };

        let mut best: Option<(f64, &Point, &Point)> = None;
        for (a, b) in edges() {
            let edge = Edge::between(a, b);
            if !edge.intersects(&aux) {
                continue;
            }
            let d = edge.midpoint().distance(global_center);
            if best.is_none_or(|(best_d, _, _)| d < best_d) {
                best = Some((d, a, b));
            }
        }
        if let Some((_, a, b)) = best {
            return Ok(EntryPointPair::new(a.clone(), b.clone()));
        }

        match self.fallback {
            EntryFallback::Fail => Err(SolverError::StructuralInconsistency(format!(
                "no edge of the {}-point local tour crosses the centroid segment",
                points.len()
            ))),
            EntryFallback::NearestEdge => {
                for (a, b) in edges() {
                    let d = point_segment_distance(Edge::between(a, b).midpoint(), aux.a, aux.b);
                    if best.is_none_or(|(best_d, _, _)| d < best_d) {
                        best = Some((d, a, b));
                    }
                }
                let (_, a, b) = best.ok_or_else(|| {
                    SolverError::StructuralInconsistency("local tour has no edges".to_string())
                })?;
                log::warn!(
                    "merge: no crossing edge points={} fallback=nearest_edge entry=({}, {})",
                    points.len(),
                    a.id(),
                    b.id()
                );
                Ok(EntryPointPair::new(a.clone(), b.clone()))
            }
        }
    }

    fn splice(
        &self,
        global: &mut Tour,
        global_center: Coord,
        local: &Tour,
        representative: &Point,
        entry: Option<&EntryPointPair>,
    ) -> Result<(), SolverError> {
        let index = global.position_of(representative.id()).ok_or_else(|| {
            SolverError::StructuralInconsistency(format!(
                "representative {} is not part of the global tour",
                representative.id()
            ))
        })?;

        // Nothing to connect to: the local tour is taken as it is.
        if local.len() == 1 || global.len() == 1 {
            global.splice_at(index, local.points().to_vec());
            return Ok(());
        }

        let (g1, g2) = match (global.previous_point(index), global.next_point(index)) {
            (Some(g1), Some(g2)) => (g1.coord(), g2.coord()),
            _ => {
                return Err(SolverError::StructuralInconsistency(format!(
                    "representative {} has no neighbors",
                    representative.id()
                )));
            }
        };

        let pair = match entry {
            Some(pair) => pair.clone(),
            None => self.find_entry_points(local, global_center)?,
        };
        let pair = orient(pair, g1, g2);

        let sequence = cut_open(local, &pair)?;
        log::debug!(
            "merge: splice representative={} points={} entry=({}, {})",
            representative.id(),
            sequence.len(),
            pair.first.id(),
            pair.second.id()
        );
        global.splice_at(index, sequence);
        Ok(())
    }
}

/// Relabel `pair` so that connecting `first` to `g1` and `second` to `g2`
/// is the cheaper of the two pairings. Ties keep the given labels.
fn orient(pair: EntryPointPair, g1: Coord, g2: Coord) -> EntryPointPair {
    let e1 = pair.first.coord();
    let e2 = pair.second.coord();
    let kept = e1.distance(g1) + e2.distance(g2);
    let crossed = e1.distance(g2) + e2.distance(g1);
    if crossed < kept { pair.swapped() } else { pair }
}

/// The local tour as an open sequence from `pair.first` to `pair.second`.
fn cut_open(local: &Tour, pair: &EntryPointPair) -> Result<Vec<Point>, SolverError> {
    let locate = |p: &Point| {
        local.position_of(p.id()).ok_or_else(|| {
            SolverError::StructuralInconsistency(format!(
                "entry point {} is not part of its local tour",
                p.id()
            ))
        })
    };
    let first = locate(&pair.first)?;
    let second = locate(&pair.second)?;

    // Walk away from `second` so that it is reached last.
    let direction = if local.next_index(first) == Some(second) {
        Direction::Backward
    } else if local.previous_index(first) == Some(second) {
        Direction::Forward
    } else {
        return Err(SolverError::StructuralInconsistency(format!(
            "entry points {} and {} are not adjacent in their local tour",
            pair.first.id(),
            pair.second.id()
        )));
    };

    Ok(local.iter_from(first, direction)?.cloned().collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(prefix: &str, cx: f64, cy: f64) -> Tour {
        Tour::new(vec![
            Point::new(format!("{prefix}-ne"), cx + 1.0, cy + 1.0),
            Point::new(format!("{prefix}-nw"), cx - 1.0, cy + 1.0),
            Point::new(format!("{prefix}-sw"), cx - 1.0, cy - 1.0),
            Point::new(format!("{prefix}-se"), cx + 1.0, cy - 1.0),
        ])
    }

    fn ids(tour: &Tour) -> Vec<&str> {
        tour.points().iter().map(Point::id).collect()
    }

    fn two_square_setup() -> (Tour, Vec<Tour>, Vec<Point>) {
        let rep_a = Point::new("rep-a", 0.0, 0.0);
        let rep_b = Point::new("rep-b", 10.0, 0.0);
        let global = Tour::new(vec![rep_a.clone(), rep_b.clone()]);
        (global, vec![square("a", 0.0, 0.0), square("b", 10.0, 0.0)], vec![rep_a, rep_b])
    }

    // --- find_entry_points tests ---

    #[test]
    fn entry_points_sit_on_edge_facing_global_center() {
        let merger = TourMerger::default();
        let pair = merger
            .find_entry_points(&square("a", 0.0, 0.0), Coord::new(5.0, 0.0))
            .unwrap();
        // Closing edge from se back to ne crosses x = 1.
        assert_eq!(pair.first.id(), "a-se");
        assert_eq!(pair.second.id(), "a-ne");
    }

    #[test]
    fn closest_crossing_midpoint_wins() {
        // The far-left points pull the centroid to (-2, 0), so the
        // segment from (10, 0) crosses both c-d (x = 1) and a-b (x = 3).
        let local = Tour::new(vec![
            Point::new("c", 1.0, -1.0),
            Point::new("d", 1.0, 1.0),
            Point::new("e", -10.0, 1.0),
            Point::new("f", -10.0, -1.0),
            Point::new("a", 3.0, 1.0),
            Point::new("b", 3.0, -1.0),
        ]);
        let merger = TourMerger::default();
        let pair = merger.find_entry_points(&local, Coord::new(10.0, 0.0)).unwrap();
        assert_eq!((pair.first.id(), pair.second.id()), ("a", "b"));
    }

    #[test]
    fn edge_lying_on_diagonal_segment_counts_as_crossing() {
        // Centroid (0.25, 0.25) and global center (-1, -1) put the
        // auxiliary segment on y = x, where a-b overlaps it. d-a only
        // touches it at a and its midpoint is farther away.
        let local = Tour::new(vec![
            Point::new("a", 0.1, 0.1),
            Point::new("b", 0.3, 0.3),
            Point::new("c", 0.6, 0.0),
            Point::new("d", 0.0, 0.6),
        ]);
        let pair = TourMerger::new(EntryFallback::Fail)
            .find_entry_points(&local, Coord::new(-1.0, -1.0))
            .unwrap();
        assert_eq!((pair.first.id(), pair.second.id()), ("a", "b"));
    }

    #[test]
    fn nearest_edge_fallback_when_nothing_crosses() {
        // Global center equals the local centroid: the segment degenerates
        // to a point inside the square and crosses no edge.
        let local = square("a", 0.0, 0.0);
        let pair = TourMerger::new(EntryFallback::NearestEdge)
            .find_entry_points(&local, Coord::new(0.0, 0.0))
            .unwrap();
        // All midpoints are equidistant; the first edge wins.
        assert_eq!((pair.first.id(), pair.second.id()), ("a-ne", "a-nw"));
    }

    #[test]
    fn fail_fallback_reports_inconsistency() {
        let result = TourMerger::new(EntryFallback::Fail)
            .find_entry_points(&square("a", 0.0, 0.0), Coord::new(0.0, 0.0));
        assert!(matches!(
            result,
            Err(SolverError::StructuralInconsistency(_))
        ));
    }

    // --- merge tests ---

    #[test]
    fn two_squares_splice_into_one_tour() {
        let (mut global, locals, reps) = two_square_setup();
        TourMerger::default()
            .merge(&mut global, Coord::new(5.0, 0.0), &locals, &reps, &[])
            .unwrap();

        assert_eq!(
            ids(&global),
            vec!["a-se", "a-sw", "a-nw", "a-ne", "b-nw", "b-ne", "b-se", "b-sw"]
        );
        // 8 + 8 internal, minus the two cut edges (2 + 2), plus the two
        // connecting edges (8 + 8).
        assert!((global.length() - 28.0).abs() < 1e-9);
    }

    #[test]
    fn precomputed_entry_points_are_used() {
        let rep = Point::new("rep", 0.0, 0.0);
        let mut global = Tour::new(vec![
            Point::new("w", -10.0, 0.0),
            rep.clone(),
            Point::new("e", 10.0, 0.0),
        ]);
        let path = Tour::new(vec![
            Point::new("p0", -1.0, 0.0),
            Point::new("p1", 0.0, 0.5),
            Point::new("p2", 1.0, 0.0),
        ]);
        // Given labels are crossed; orientation swaps them back.
        let pair = EntryPointPair::new(Point::new("p2", 1.0, 0.0), Point::new("p0", -1.0, 0.0));

        TourMerger::default()
            .merge(
                &mut global,
                Coord::new(0.0, 0.0),
                &[path],
                &[rep],
                &[Some(pair)],
            )
            .unwrap();
        assert_eq!(ids(&global), vec!["w", "p0", "p1", "p2", "e"]);
    }

    #[test]
    fn single_point_local_tour_replaces_representative() {
        let rep = Point::new("rep", 1.0, 1.0);
        let mut global = Tour::new(vec![Point::new("n", 0.0, 0.0), rep.clone()]);
        let local = Tour::new(vec![Point::new("only", 1.0, 1.0)]);
        TourMerger::default()
            .merge(&mut global, Coord::new(0.5, 0.5), &[local], &[rep], &[])
            .unwrap();
        assert_eq!(ids(&global), vec!["n", "only"]);
    }

    #[test]
    fn empty_global_with_one_cluster_takes_local_tour() {
        let mut global = Tour::default();
        let local = square("a", 0.0, 0.0);
        TourMerger::default()
            .merge(
                &mut global,
                Coord::new(0.0, 0.0),
                std::slice::from_ref(&local),
                &[Point::new("rep", 0.0, 0.0)],
                &[],
            )
            .unwrap();
        assert_eq!(global, local);
    }

    #[test]
    fn empty_global_with_many_clusters_is_rejected() {
        let (_, locals, reps) = two_square_setup();
        let mut global = Tour::default();
        let result = TourMerger::default().merge(&mut global, Coord::new(5.0, 0.0), &locals, &reps, &[]);
        assert!(matches!(result, Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let (mut global, locals, reps) = two_square_setup();
        let merger = TourMerger::default();
        let result = merger.merge(&mut global, Coord::new(5.0, 0.0), &locals, &reps[..1], &[]);
        assert!(matches!(result, Err(SolverError::InvalidInput(_))));

        let result = merger.merge(&mut global, Coord::new(5.0, 0.0), &locals, &reps, &[None]);
        assert!(matches!(result, Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn missing_representative_is_inconsistent() {
        let (mut global, locals, _) = two_square_setup();
        let reps = vec![Point::new("ghost", 0.0, 0.0), Point::new("rep-b", 10.0, 0.0)];
        let result = TourMerger::default().merge(&mut global, Coord::new(5.0, 0.0), &locals, &reps, &[]);
        assert!(matches!(
            result,
            Err(SolverError::StructuralInconsistency(_))
        ));
    }

    #[test]
    fn non_adjacent_entry_points_are_inconsistent() {
        let (mut global, locals, reps) = two_square_setup();
        let pair = EntryPointPair::new(
            Point::new("a-ne", 1.0, 1.0),
            Point::new("a-sw", -1.0, -1.0),
        );
        let result = TourMerger::default().merge(
            &mut global,
            Coord::new(5.0, 0.0),
            &locals,
            &reps,
            &[Some(pair), None],
        );
        assert!(matches!(
            result,
            Err(SolverError::StructuralInconsistency(_))
        ));
    }

    #[test]
    fn orientation_prefers_cheaper_pairing() {
        let pair = EntryPointPair::new(Point::new("e1", 0.0, 0.0), Point::new("e2", 10.0, 0.0));
        // g1 is next to e2 and g2 next to e1: swapping is cheaper.
        let oriented = orient(pair, Coord::new(11.0, 0.0), Coord::new(-1.0, 0.0));
        assert_eq!(oriented.first.id(), "e2");
        assert_eq!(oriented.second.id(), "e1");
    }
}
