//! Shared types for the angletour engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::angular::CenterEstimator;
use crate::merge::EntryFallback;
use crate::path::PathStrategy;
use crate::solver::ShapePolicy;
use crate::tour::Tour;

/// A bare 2D coordinate pair.
///
/// Used for derived locations that are not part of the input (centroids,
/// edge midpoints, principal axes) and as the common currency of the
/// [`geometry`](crate::geometry) primitives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Coord {
    /// Create a new coordinate pair.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another coordinate.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another coordinate.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Dot product, treating both coordinates as vectors from the origin.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Returns `true` if both components are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// An input point: a unique identifier plus an immutable coordinate pair.
///
/// Equality compares the identifier and both coordinates. Angles used
/// while sorting are never stored on the point; every tour construction
/// keeps its own angle table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: String,
    x: f64,
    y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
        }
    }

    /// Create a point located at `coord`.
    #[must_use]
    pub fn at(id: impl Into<String>, coord: Coord) -> Self {
        Self::new(id, coord.x, coord.y)
    }

    /// The point's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// The point's location as a [`Coord`].
    #[must_use]
    pub const fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        self.coord().distance(other.coord())
    }
}

/// Check that `points` have finite coordinates and pairwise distinct ids.
///
/// # Errors
///
/// Returns [`SolverError::InvalidInput`] naming the first offending point.
pub fn validate_points(points: &[Point]) -> Result<(), SolverError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(points.len());
    for p in points {
        if !p.coord().is_finite() {
            return Err(SolverError::InvalidInput(format!(
                "point {} has non-finite coordinates ({}, {})",
                p.id, p.x, p.y
            )));
        }
        if !seen.insert(p.id()) {
            return Err(SolverError::InvalidInput(format!(
                "duplicate point id {}",
                p.id
            )));
        }
    }
    Ok(())
}

/// An unordered pair of coordinates forming a line segment.
///
/// Only used for intersection tests and midpoint/length calculations;
/// tours never store edges.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    /// One endpoint.
    pub a: Coord,
    /// The other endpoint.
    pub b: Coord,
}

impl Edge {
    /// Create an edge between two coordinates.
    #[must_use]
    pub const fn new(a: Coord, b: Coord) -> Self {
        Self { a, b }
    }

    /// Create an edge between two points.
    #[must_use]
    pub const fn between(a: &Point, b: &Point) -> Self {
        Self::new(a.coord(), b.coord())
    }

    /// Euclidean length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// Midpoint of the segment.
    #[must_use]
    pub fn midpoint(&self) -> Coord {
        self.a.midpoint(self.b)
    }

    /// Returns `true` if this segment and `other` share at least one point.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        crate::geometry::segments_intersect(self.a, self.b, other.a, other.b)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

/// A density-connected set of points, tagged with the parameters that
/// produced it.
///
/// Points are kept in the order they were absorbed during expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    points: Vec<Point>,
    min_pts: usize,
    epsilon: f64,
}

impl Cluster {
    pub(crate) const fn new(min_pts: usize, epsilon: f64) -> Self {
        Self {
            points: Vec::new(),
            min_pts,
            epsilon,
        }
    }

    pub(crate) fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    /// The cluster's points in absorption order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points in the cluster.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the cluster holds no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Core-point threshold used when the cluster was discovered.
    #[must_use]
    pub const fn min_pts(&self) -> usize {
        self.min_pts
    }

    /// Neighborhood radius used when the cluster was discovered.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Consumes the cluster and returns its points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

/// Two tour-adjacent points of a local tour where it is cut open to be
/// attached to the surrounding tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPointPair {
    /// Entry point connected to the representative's previous neighbor.
    pub first: Point,
    /// Entry point connected to the representative's next neighbor.
    pub second: Point,
}

impl EntryPointPair {
    /// Create a new entry point pair.
    #[must_use]
    pub const fn new(first: Point, second: Point) -> Self {
        Self { first, second }
    }

    /// The same pair with its labels exchanged.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }
}

/// Configuration for the clustered tour solvers.
///
/// All parameters have defaults; [`validate`](Self::validate) checks the
/// ranges every solver relies on. Missing JSON fields fall back to their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// DBSCAN core-point threshold: minimum neighborhood size, the point
    /// itself included.
    pub min_pts: usize,

    /// DBSCAN neighborhood radius (inclusive).
    pub epsilon: f64,

    /// How each cluster picks between the angular tour and a path.
    pub shape_policy: ShapePolicy,

    /// Path construction used for elongated clusters.
    pub path_strategy: PathStrategy,

    /// Clusters smaller than this are not solved locally; their points
    /// join the global tour as noise.
    pub min_cluster_size: usize,

    /// Worker count for the parallel angle sort.
    pub sort_workers: usize,

    /// Reference center for angular projection.
    pub center: CenterEstimator,

    /// What the merger does when no local edge crosses the centroid
    /// segment.
    pub entry_fallback: EntryFallback,
}

impl SolverConfig {
    /// Default DBSCAN core-point threshold.
    pub const DEFAULT_MIN_PTS: usize = 3;
    /// Default DBSCAN neighborhood radius.
    pub const DEFAULT_EPSILON: f64 = 1.0;
    /// Default eigenvalue ratio below which a cluster is elongated.
    pub const DEFAULT_ELONGATION_THRESHOLD: f64 = 0.382;
    /// Default minimum size of a locally solved cluster.
    pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 3;

    /// Default sort worker count: the machine's available parallelism.
    #[must_use]
    pub fn default_sort_workers() -> usize {
        std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
    }

    /// Parse a JSON configuration and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::ConfigParse`] for malformed JSON and
    /// [`SolverError::InvalidInput`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, SolverError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter range.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] describing the first invalid
    /// parameter.
    pub fn validate(&self) -> Result<(), SolverError> {
        validate_density_params(self.min_pts, self.epsilon)?;
        self.shape_policy.validate()?;
        self.path_strategy.validate()?;
        if self.min_cluster_size == 0 {
            return Err(SolverError::InvalidInput(
                "min_cluster_size must be at least 1".to_string(),
            ));
        }
        if self.sort_workers == 0 {
            return Err(SolverError::InvalidInput(
                "sort_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_pts: Self::DEFAULT_MIN_PTS,
            epsilon: Self::DEFAULT_EPSILON,
            shape_policy: ShapePolicy::default(),
            path_strategy: PathStrategy::default(),
            min_cluster_size: Self::DEFAULT_MIN_CLUSTER_SIZE,
            sort_workers: Self::default_sort_workers(),
            center: CenterEstimator::default(),
            entry_fallback: EntryFallback::default(),
        }
    }
}

/// Validate the DBSCAN parameter pair.
pub(crate) fn validate_density_params(min_pts: usize, epsilon: f64) -> Result<(), SolverError> {
    if min_pts == 0 {
        return Err(SolverError::InvalidInput(
            "min_pts must be at least 1".to_string(),
        ));
    }
    if !epsilon.is_finite() || epsilon < 0.0 {
        return Err(SolverError::InvalidInput(format!(
            "epsilon must be finite and non-negative, got {epsilon}"
        )));
    }
    Ok(())
}

/// Result of a clustered tour computation.
///
/// Carries the discovered clusters and noise points as diagnostics next
/// to the final tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredSolution {
    /// Closed tour over every input point.
    pub tour: Tour,
    /// Every cluster DBSCAN discovered, in discovery order.
    pub clusters: Vec<Cluster>,
    /// Points that were never absorbed into a cluster, in input order.
    pub noise: Vec<Point>,
}

/// Errors that can occur while constructing a tour.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// A parameter or input collection is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The path search exhausted its frontier or budget before every
    /// point was covered.
    #[error("no covering path found for {points} points after {expansions} expansions")]
    NoPathFound {
        /// Number of points the path had to cover.
        points: usize,
        /// Frontier expansions performed before giving up.
        expansions: usize,
    },

    /// Tour splicing met a state that correct inputs never produce.
    #[error("structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// A numeric decomposition failed.
    #[error("numeric failure: {0}")]
    NumericFailure(String),

    /// The sort worker pool could not be started.
    #[error("failed to start sort workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// A JSON configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// The logger could not be installed.
    #[error("logger init failed: {0}")]
    Logging(String),
}
