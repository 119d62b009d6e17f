//! angletour: Approximate Euclidean TSP tours (sans-IO).
//!
//! Builds closed tours over labelled 2D points through:
//! density clustering -> per-cluster shape test -> local tour or path ->
//! angular tour over noise and cluster representatives -> splicing.
//!
//! The crate operates on in-memory point slices and returns structured
//! data. Reading point files and writing tours is left to the host.

pub mod angular;
pub mod dbscan;
pub mod geometry;
pub mod ids;
pub mod logging;
pub mod merge;
pub mod path;
pub mod pca;
pub mod solver;
pub mod sort;
pub mod tour;
pub mod types;

pub use angular::{AngularTourBuilder, CenterEstimator};
pub use dbscan::{Clustering, DensityClusterer};
pub use ids::RepresentativeIds;
pub use logging::{LogFormat, LogLevel, LogOptions, init_logger};
pub use merge::{EntryFallback, TourMerger};
pub use path::{PathFinder, PathStrategy};
pub use pca::{Pca, Shape, ShapeClassifier};
pub use solver::{ShapePolicy, Solver, SolverKind, TourSolver};
pub use sort::{AngleEntry, AngleSorter};
pub use tour::{Direction, Tour, TourIter};
pub use types::{
    Cluster, ClusteredSolution, Coord, Edge, EntryPointPair, Point, SolverConfig, SolverError,
};

/// Compute a closed tour over `points` with the shape-aware solver.
///
/// # Pipeline steps
///
/// 1. Validate the points (non-empty, unique ids, finite coordinates)
/// 2. DBSCAN clustering with `config.min_pts` and `config.epsilon`
/// 3. Dissolve clusters smaller than `config.min_cluster_size`
/// 4. Local solution per cluster: angular tour, or open path for
///    elongated clusters (per `config.shape_policy`)
/// 5. Angular tour over noise points and cluster representatives
/// 6. Splice each local solution in place of its representative
///
/// # Errors
///
/// Returns [`SolverError::InvalidInput`] for empty or malformed input or
/// an invalid `config`, [`SolverError::WorkerPool`] if the sort workers
/// cannot be started, and [`SolverError::StructuralInconsistency`] if
/// splicing fails.
pub fn solve(points: &[Point], config: &SolverConfig) -> Result<Tour, SolverError> {
    Solver::new(SolverKind::ShapeAware, config.clone())?.calculate_tour(points)
}
