//! Tour solvers: plain angular, clustered, and shape-aware.
//!
//! Defines the [`TourSolver`] trait and the [`SolverKind`] enum for
//! runtime selection. The clustered variants share one pipeline:
//!
//! 1. DBSCAN splits the input into clusters and noise.
//! 2. Clusters below `min_cluster_size` are dissolved into noise.
//! 3. Each remaining cluster gets a local tour (or path) and a
//!    representative point at its center.
//! 4. An angular tour over noise points and representatives is built.
//! 5. Every representative is replaced by its local tour.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::angular::AngularTourBuilder;
use crate::dbscan::DensityClusterer;
use crate::geometry::path_length;
use crate::ids::RepresentativeIds;
use crate::merge::TourMerger;
use crate::path::{PathFinder, PathStrategy};
use crate::pca::{Shape, ShapeClassifier, validate_threshold};
use crate::tour::Tour;
use crate::types::{
    ClusteredSolution, EntryPointPair, Point, SolverConfig, SolverError, validate_density_params,
    validate_points,
};

/// How the shape-aware solver chooses between a closed angular tour and
/// an open path for each cluster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapePolicy {
    /// Use a path when the cluster's PCA eigenvalue ratio is below the
    /// given threshold in `[0, 1)`, otherwise the angular tour.
    Threshold(f64),

    /// Build both the projection path and the angular tour and keep the
    /// shorter one (open path length against closed tour length).
    ///
    /// Ignores the configured path strategy.
    Shortest,
}

impl Default for ShapePolicy {
    fn default() -> Self {
        Self::Threshold(SolverConfig::DEFAULT_ELONGATION_THRESHOLD)
    }
}

impl ShapePolicy {
    /// Check the policy's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if a threshold lies outside
    /// `[0, 1)`.
    pub fn validate(&self) -> Result<(), SolverError> {
        match *self {
            Self::Threshold(threshold) => validate_threshold(threshold),
            Self::Shortest => Ok(()),
        }
    }
}

/// Selects which solver variant to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverKind {
    /// One angular tour over all points, no clustering.
    Angular,

    /// DBSCAN clusters, each solved with an angular tour, spliced into
    /// an angular tour over noise and representatives.
    Clustered,

    /// Like [`Clustered`](Self::Clustered), but elongated clusters are
    /// solved with a path (see [`ShapePolicy`]).
    #[default]
    ShapeAware,
}

/// Common interface of all solver variants.
pub trait TourSolver {
    /// Compute a closed tour over `points` using the configured density
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for empty or malformed input,
    /// or any error raised by a pipeline stage.
    fn calculate_tour(&self, points: &[Point]) -> Result<Tour, SolverError>;

    /// Compute a closed tour over `points` clustering with the given
    /// `min_pts` and `epsilon`, and report the clusters and noise found.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for empty or malformed input
    /// or invalid density parameters, or any error raised by a pipeline
    /// stage.
    fn calculate_clustered_tour(
        &self,
        points: &[Point],
        min_pts: usize,
        epsilon: f64,
    ) -> Result<ClusteredSolution, SolverError>;
}

/// A configured solver of one [`SolverKind`].
#[derive(Debug)]
pub struct Solver {
    kind: SolverKind,
    config: SolverConfig,
    builder: AngularTourBuilder,
}

impl Solver {
    /// Validate `config` and start the sort workers.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for an invalid configuration
    /// and [`SolverError::WorkerPool`] if the workers cannot be started.
    pub fn new(kind: SolverKind, config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        let builder = AngularTourBuilder::new(config.sort_workers, config.center)?;
        Ok(Self {
            kind,
            config,
            builder,
        })
    }

    /// The solver variant.
    #[must_use]
    pub const fn kind(&self) -> SolverKind {
        self.kind
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Local solution for one cluster: a tour, plus its entry points when
    /// the tour is really an open path.
    fn solve_cluster(&self, points: &[Point]) -> Result<(Tour, Option<EntryPointPair>), SolverError> {
        if self.kind != SolverKind::ShapeAware {
            return Ok((self.builder.build(points)?, None));
        }

        match self.config.shape_policy {
            ShapePolicy::Threshold(threshold) => {
                let (shape, pca) = ShapeClassifier::new(threshold)?.classify(points)?;
                log::debug!(
                    "solver: classify points={} ratio={:.4} shape={shape:?}",
                    points.len(),
                    pca.ratio()
                );
                match shape {
                    Shape::Compact => Ok((self.builder.build(points)?, None)),
                    Shape::Elongated => match self.path_or_fallback(points)? {
                        Some(path) => Ok(path_solution(path)),
                        None => Ok((self.builder.build(points)?, None)),
                    },
                }
            }
            ShapePolicy::Shortest => {
                let tour = self.builder.build(points)?;
                let path = PathStrategy::Projection.find_path(points)?;
                if path_length(&path) < tour.length() {
                    Ok(path_solution(path))
                } else {
                    Ok((tour, None))
                }
            }
        }
    }

    /// Run the configured path strategy; a search that gives up yields
    /// `None` so the caller falls back to the angular tour.
    fn path_or_fallback(&self, points: &[Point]) -> Result<Option<Vec<Point>>, SolverError> {
        match self.config.path_strategy.find_path(points) {
            Ok(path) => Ok(Some(path)),
            Err(SolverError::NoPathFound { points, expansions }) => {
                log::warn!(
                    "solver: path search gave up points={points} expansions={expansions} fallback=angular"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn solve_clustered(
        &self,
        points: &[Point],
        min_pts: usize,
        epsilon: f64,
    ) -> Result<ClusteredSolution, SolverError> {
        let clustering = DensityClusterer::new(min_pts, epsilon)?.cluster(points);

        let kept: Vec<usize> = clustering
            .clusters
            .iter()
            .enumerate()
            .filter(|(_, c)| c.len() >= self.config.min_cluster_size)
            .map(|(i, _)| i)
            .collect();
        log::info!(
            "solver: clusters found={} kept={} min_cluster_size={}",
            clustering.clusters.len(),
            kept.len(),
            self.config.min_cluster_size
        );

        let mut ids = RepresentativeIds::for_points(points);
        let mut owner: HashMap<&str, usize> = HashMap::new();
        let mut local_tours = Vec::with_capacity(kept.len());
        let mut representatives = Vec::with_capacity(kept.len());
        let mut entry_points = Vec::with_capacity(kept.len());

        for (slot, &ci) in kept.iter().enumerate() {
            let members = clustering.clusters[ci].points();
            for p in members {
                owner.insert(p.id(), slot);
            }
            let center = self.config.center.estimate(members).ok_or_else(|| {
                SolverError::StructuralInconsistency(format!("cluster {ci} has no points"))
            })?;
            let (tour, entry) = self.solve_cluster(members)?;
            local_tours.push(tour);
            representatives.push(Point::at(ids.next_id(), center));
            entry_points.push(entry);
        }

        // Noise points and one representative per kept cluster, placed
        // where the cluster's first member appears in the input.
        let mut placed = vec![false; kept.len()];
        let mut global_points = Vec::with_capacity(points.len());
        for p in points {
            match owner.get(p.id()) {
                Some(&slot) if !placed[slot] => {
                    placed[slot] = true;
                    global_points.push(representatives[slot].clone());
                }
                Some(_) => {}
                None => global_points.push(p.clone()),
            }
        }

        let global_center = self.config.center.estimate(&global_points).ok_or_else(|| {
            SolverError::InvalidInput("cannot build a tour over zero points".to_string())
        })?;
        let mut tour = self.builder.build_around(&global_points, global_center)?;
        TourMerger::new(self.config.entry_fallback).merge(
            &mut tour,
            global_center,
            &local_tours,
            &representatives,
            &entry_points,
        )?;

        check_covers(points, &tour)?;
        Ok(ClusteredSolution {
            tour,
            clusters: clustering.clusters,
            noise: clustering.noise,
        })
    }
}

impl TourSolver for Solver {
    fn calculate_tour(&self, points: &[Point]) -> Result<Tour, SolverError> {
        match self.kind {
            SolverKind::Angular => {
                validate_input(points)?;
                log::info!("solver: start kind=Angular points={}", points.len());
                self.builder.build(points)
            }
            SolverKind::Clustered | SolverKind::ShapeAware => self
                .calculate_clustered_tour(points, self.config.min_pts, self.config.epsilon)
                .map(|solution| solution.tour),
        }
    }

    fn calculate_clustered_tour(
        &self,
        points: &[Point],
        min_pts: usize,
        epsilon: f64,
    ) -> Result<ClusteredSolution, SolverError> {
        validate_input(points)?;
        log::info!(
            "solver: start kind={:?} points={} min_pts={min_pts} epsilon={epsilon}",
            self.kind,
            points.len()
        );
        let solution = match self.kind {
            SolverKind::Angular => {
                validate_density_params(min_pts, epsilon)?;
                ClusteredSolution {
                    tour: self.builder.build(points)?,
                    clusters: Vec::new(),
                    noise: points.to_vec(),
                }
            }
            SolverKind::Clustered | SolverKind::ShapeAware => {
                self.solve_clustered(points, min_pts, epsilon)?
            }
        };
        log::info!(
            "solver: done points={} length={:.3}",
            solution.tour.len(),
            solution.tour.length()
        );
        Ok(solution)
    }
}

/// Tour over a path's points, entered at its two ends.
fn path_solution(path: Vec<Point>) -> (Tour, Option<EntryPointPair>) {
    let entry = match (path.first(), path.last()) {
        (Some(first), Some(last)) => Some(EntryPointPair::new(first.clone(), last.clone())),
        _ => None,
    };
    (Tour::new(path), entry)
}

fn validate_input(points: &[Point]) -> Result<(), SolverError> {
    if points.is_empty() {
        return Err(SolverError::InvalidInput(
            "cannot build a tour over zero points".to_string(),
        ));
    }
    validate_points(points)
}

/// The finished tour must hold exactly the input ids.
fn check_covers(points: &[Point], tour: &Tour) -> Result<(), SolverError> {
    let expected: HashSet<&str> = points.iter().map(Point::id).collect();
    let actual: HashSet<&str> = tour.points().iter().map(Point::id).collect();
    if tour.len() != points.len() || expected != actual {
        return Err(SolverError::StructuralInconsistency(format!(
            "tour holds {} points ({} distinct) for {} inputs",
            tour.len(),
            actual.len(),
            points.len()
        )));
    }
    Ok(())
}
