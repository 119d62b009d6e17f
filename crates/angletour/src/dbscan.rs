//! Density-based clustering (DBSCAN).
//!
//! Points are visited in input order. A point whose epsilon-neighborhood
//! (itself included, boundary inclusive) holds at least `min_pts` points
//! opens a cluster and absorbs its unclassified and noise neighbors. The
//! cluster then grows through a FIFO seed queue of newly absorbed points:
//! every seed that is itself a core point absorbs its own unclassified and
//! noise neighbors. A point marked noise early can still join a cluster
//! later as a border point. Points never absorbed are reported as noise.
//!
//! Region queries go through an R-tree; the result set is the same as a
//! linear scan with `distance <= epsilon`, compared on squared distances.

use std::collections::VecDeque;

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::types::{Cluster, Point, SolverError, validate_density_params};

/// Input index attached to an R-tree location.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unclassified,
    Noise,
    Clustered,
}

/// Output of [`DensityClusterer::cluster`].
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// Clusters in discovery order.
    pub clusters: Vec<Cluster>,
    /// Points never absorbed into a cluster, in input order.
    pub noise: Vec<Point>,
}

/// DBSCAN clusterer for a fixed `(min_pts, epsilon)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityClusterer {
    min_pts: usize,
    epsilon: f64,
}

impl DensityClusterer {
    /// Create a clusterer.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `min_pts` is zero or
    /// `epsilon` is negative or not finite.
    pub fn new(min_pts: usize, epsilon: f64) -> Result<Self, SolverError> {
        validate_density_params(min_pts, epsilon)?;
        Ok(Self { min_pts, epsilon })
    }

    /// Core-point threshold.
    #[must_use]
    pub const fn min_pts(&self) -> usize {
        self.min_pts
    }

    /// Neighborhood radius.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Partition `points` into clusters and noise.
    ///
    /// Every input point ends up in exactly one cluster or in the noise
    /// list.
    #[must_use]
    pub fn cluster(&self, points: &[Point]) -> Clustering {
        let index = RegionIndex::new(points, self.epsilon);
        let mut labels = vec![Label::Unclassified; points.len()];
        let mut clusters = Vec::new();

        for (i, point) in points.iter().enumerate() {
            if labels[i] != Label::Unclassified {
                continue;
            }
            let region = index.neighbors(point);
            if region.len() < self.min_pts {
                labels[i] = Label::Noise;
                continue;
            }

            let mut cluster = Cluster::new(self.min_pts, self.epsilon);
            labels[i] = Label::Clustered;
            cluster.push(point.clone());

            let mut seeds: VecDeque<usize> = VecDeque::with_capacity(region.len());
            absorb(&region, points, &mut labels, &mut cluster, &mut seeds);
            while let Some(s) = seeds.pop_front() {
                let region = index.neighbors(&points[s]);
                if region.len() >= self.min_pts {
                    absorb(&region, points, &mut labels, &mut cluster, &mut seeds);
                }
            }

            log::debug!(
                "dbscan: cluster id={} opened_by={} size={}",
                clusters.len(),
                point.id(),
                cluster.len()
            );
            clusters.push(cluster);
        }

        let noise: Vec<Point> = points
            .iter()
            .zip(&labels)
            .filter(|(_, label)| **label != Label::Clustered)
            .map(|(p, _)| p.clone())
            .collect();

        log::info!(
            "dbscan: done points={} clusters={} noise={} min_pts={} epsilon={}",
            points.len(),
            clusters.len(),
            noise.len(),
            self.min_pts,
            self.epsilon
        );

        Clustering { clusters, noise }
    }
}

/// Add every unclassified or noise point of a core point's `region` to
/// `cluster`. Unclassified points are also queued as seeds; each point is
/// queued at most once since it is labelled on the spot.
fn absorb(
    region: &[usize],
    points: &[Point],
    labels: &mut [Label],
    cluster: &mut Cluster,
    seeds: &mut VecDeque<usize>,
) {
    for &j in region {
        match labels[j] {
            Label::Unclassified => {
                labels[j] = Label::Clustered;
                cluster.push(points[j].clone());
                seeds.push_back(j);
            }
            Label::Noise => {
                labels[j] = Label::Clustered;
                cluster.push(points[j].clone());
            }
            Label::Clustered => {}
        }
    }
}

/// Epsilon-neighborhood lookups over a fixed point set.
struct RegionIndex {
    tree: RTree<IndexedPoint>,
    epsilon_sq: f64,
}

impl RegionIndex {
    fn new(points: &[Point], epsilon: f64) -> Self {
        let located = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new([p.x(), p.y()], i))
            .collect();
        Self {
            tree: RTree::bulk_load(located),
            epsilon_sq: epsilon * epsilon,
        }
    }

    /// Indices of all points within epsilon of `point`, itself included,
    /// in ascending input order.
    fn neighbors(&self, point: &Point) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_within_distance([point.x(), point.y()], self.epsilon_sq)
            .map(|located| located.data)
            .collect();
        found.sort_unstable();
        found
    }
}
