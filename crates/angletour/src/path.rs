//! Hamiltonian paths across elongated clusters.
//!
//! Defines the [`PathFinder`] trait for pluggable path strategies and the
//! [`PathStrategy`] enum for runtime selection. Both strategies start and
//! end at the extreme projections onto the cluster's first principal
//! component.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::pca::{Pca, projection};
use crate::types::{Point, SolverError};

/// Selects how a path across an elongated cluster is built.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PathStrategy {
    /// Sort points by their projection onto the first principal
    /// component.
    ///
    /// Deterministic, `O(n log n)`, no search.
    #[default]
    Projection,

    /// Best-first growth of a single path from start to goal.
    ///
    /// Every unvisited point is a frontier candidate, ranked by
    /// `length so far + step + damping * rest`, where `rest` is a lower
    /// bound on the remaining path. The goal only enters the frontier
    /// once every other point is on the path. `O(n^2 log n)`, not
    /// guaranteed to be minimal.
    BestFirst {
        /// Weight of the remaining-path bound, in `(0, 1]`.
        damping: f64,
        /// Maximum number of path extensions before giving up.
        max_expansions: usize,
    },
}

impl PathStrategy {
    /// Default heuristic weight for [`BestFirst`](Self::BestFirst).
    pub const DEFAULT_DAMPING: f64 = 0.99;
    /// Default expansion budget for [`BestFirst`](Self::BestFirst).
    pub const DEFAULT_MAX_EXPANSIONS: usize = 100_000;

    /// Best-first search with default parameters.
    #[must_use]
    pub const fn best_first() -> Self {
        Self::BestFirst {
            damping: Self::DEFAULT_DAMPING,
            max_expansions: Self::DEFAULT_MAX_EXPANSIONS,
        }
    }

    /// Check the strategy's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `damping` is outside
    /// `(0, 1]` or `max_expansions` is zero.
    pub fn validate(&self) -> Result<(), SolverError> {
        match *self {
            Self::Projection => Ok(()),
            Self::BestFirst {
                damping,
                max_expansions,
            } => {
                if !(damping > 0.0 && damping <= 1.0) {
                    return Err(SolverError::InvalidInput(format!(
                        "search damping must lie in (0, 1], got {damping}"
                    )));
                }
                if max_expansions == 0 {
                    return Err(SolverError::InvalidInput(
                        "search expansion budget must be at least 1".to_string(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Trait for path strategies.
///
/// Input: the points of one cluster. Output: every point exactly once,
/// from start to goal.
pub trait PathFinder {
    /// Build a path visiting every point in `points`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for an empty slice or invalid
    /// parameters and [`SolverError::NoPathFound`] when a search gives up.
    fn find_path(&self, points: &[Point]) -> Result<Vec<Point>, SolverError>;
}

impl PathFinder for PathStrategy {
    fn find_path(&self, points: &[Point]) -> Result<Vec<Point>, SolverError> {
        self.validate()?;
        match *self {
            Self::Projection => projection_path(points),
            Self::BestFirst {
                damping,
                max_expansions,
            } => best_first_path(points, damping, max_expansions),
        }
    }
}

/// Projection of every point onto the first principal component, in
/// input order.
fn projections(points: &[Point]) -> Result<Vec<f64>, SolverError> {
    let axis = Pca::fit(points)?.principal_axis();
    Ok(points.iter().map(|p| projection(p.coord(), axis)).collect())
}

/// Points sorted by their projection; ties keep input order.
fn projection_path(points: &[Point]) -> Result<Vec<Point>, SolverError> {
    let keys = projections(points)?;
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&i, &j| keys[i].total_cmp(&keys[j]));
    Ok(order.into_iter().map(|i| points[i].clone()).collect())
}

/// Indices of the smallest and largest projection.
///
/// `min_by` keeps the first minimum and `max_by` the last maximum, so two
/// or more points always give distinct ends.
fn extremes(keys: &[f64]) -> Option<(usize, usize)> {
    let start = keys
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))?
        .0;
    let goal = keys
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))?
        .0;
    Some((start, goal))
}

/// Frontier entry; the heap pops the lowest priority first, then the
/// lowest input index.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    priority: f64,
    point: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.point.cmp(&self.point))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// The two unvisited non-goal points farthest from the goal.
fn farthest_from_goal(
    to_goal: &[f64],
    on_path: &[bool],
    goal: usize,
) -> (Option<usize>, Option<usize>) {
    let mut first: Option<usize> = None;
    let mut second: Option<usize> = None;
    for i in (0..to_goal.len()).filter(|&i| i != goal && !on_path[i]) {
        if first.is_none_or(|f| to_goal[i] > to_goal[f]) {
            second = first;
            first = Some(i);
        } else if second.is_none_or(|s| to_goal[i] > to_goal[s]) {
            second = Some(i);
        }
    }
    (first, second)
}

fn best_first_path(
    points: &[Point],
    damping: f64,
    max_expansions: usize,
) -> Result<Vec<Point>, SolverError> {
    let n = points.len();
    if n <= 2 {
        return projection_path(points);
    }
    let keys = projections(points)?;
    let Some((start, goal)) = extremes(&keys) else {
        return Err(SolverError::InvalidInput(
            "cannot search a path over zero points".to_string(),
        ));
    };
    let to_goal: Vec<f64> = points.iter().map(|p| p.distance(&points[goal])).collect();

    let mut on_path = vec![false; n];
    on_path[start] = true;
    let mut order = Vec::with_capacity(n);
    order.push(start);
    let mut current = start;
    let mut length = 0.0;
    let mut expansions = 0_usize;

    while order.len() < n {
        if expansions >= max_expansions {
            log::debug!("path: best-first gave up points={n} expansions={expansions}");
            return Err(SolverError::NoPathFound {
                points: n,
                expansions,
            });
        }
        expansions += 1;

        // Everything but the goal is on the path.
        let covered = order.len() == n - 1;
        let (far, runner_up) = farthest_from_goal(&to_goal, &on_path, goal);

        // The rest of the path from `i` still has to pass the farthest
        // unvisited point other than `i` before it can end at the goal.
        let rest = |i: usize| match far.filter(|&f| f != i).or(runner_up) {
            Some(f) => points[i].distance(&points[f]) + to_goal[f],
            None => to_goal[i],
        };

        let mut frontier: BinaryHeap<Candidate> = (0..n)
            .filter(|&i| !on_path[i] && (i != goal || covered))
            .map(|i| Candidate {
                priority: damping.mul_add(rest(i), length + points[current].distance(&points[i])),
                point: i,
            })
            .collect();
        let Some(next) = frontier.pop() else {
            break;
        };

        length += points[current].distance(&points[next.point]);
        on_path[next.point] = true;
        order.push(next.point);
        current = next.point;
    }

    if order.len() < n {
        return Err(SolverError::NoPathFound {
            points: n,
            expansions,
        });
    }
    log::debug!("path: best-first done points={n} expansions={expansions} length={length:.3}");
    Ok(order.into_iter().map(|i| points[i].clone()).collect())
}
