//! Principal component analysis of 2D point sets and the elongation test
//! built on it.
//!
//! The sample covariance of a point set is a real symmetric 2x2 matrix,
//! so its eigen-decomposition has a closed form.

use crate::types::{Coord, Point, SolverConfig, SolverError};

/// Eigen-decomposition of a point set's covariance matrix.
///
/// Components are ordered by descending eigenvalue, so index 0 is the
/// axis of maximal variance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pca {
    mean: Coord,
    eigenvalues: [f64; 2],
    components: [Coord; 2],
}

impl Pca {
    /// Decompose the covariance matrix of `points`.
    ///
    /// Uses the bias-corrected sample covariance (divisor `n - 1`); a
    /// single point has zero covariance.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] for an empty slice and
    /// [`SolverError::NumericFailure`] if the decomposition does not
    /// produce two real eigenvalues.
    pub fn fit(points: &[Point]) -> Result<Self, SolverError> {
        let mean = crate::geometry::centroid(points).ok_or_else(|| {
            SolverError::InvalidInput("cannot analyse an empty point set".to_string())
        })?;

        let (sxx, sxy, syy) = points.iter().fold((0.0, 0.0, 0.0), |(sxx, sxy, syy), p| {
            let dx = p.x() - mean.x;
            let dy = p.y() - mean.y;
            (dx.mul_add(dx, sxx), dx.mul_add(dy, sxy), dy.mul_add(dy, syy))
        });
        #[allow(clippy::cast_precision_loss)]
        let divisor = points.len().saturating_sub(1).max(1) as f64;
        let (a, b, c) = (sxx / divisor, sxy / divisor, syy / divisor);

        let half_trace = (a + c) / 2.0;
        let half_diff = (a - c) / 2.0;
        let discriminant = half_diff.mul_add(half_diff, b * b);
        if !discriminant.is_finite() || discriminant < 0.0 {
            return Err(SolverError::NumericFailure(format!(
                "covariance [[{a}, {b}], [{b}, {c}]] has no real eigenvalues"
            )));
        }
        let root = discriminant.sqrt();
        let l1 = half_trace + root;
        let l2 = half_trace - root;

        let v1 = if b.abs() > f64::EPSILON * (a.abs() + c.abs()) {
            normalize(Coord::new(l1 - c, b))
        } else if a >= c {
            Coord::new(1.0, 0.0)
        } else {
            Coord::new(0.0, 1.0)
        };
        let v2 = Coord::new(-v1.y, v1.x);

        Ok(Self {
            mean,
            eigenvalues: [l1, l2],
            components: [v1, v2],
        })
    }

    /// Coordinate mean the covariance was centered on.
    #[must_use]
    pub const fn mean(&self) -> Coord {
        self.mean
    }

    /// Eigenvalues in descending order.
    #[must_use]
    pub const fn eigenvalues(&self) -> [f64; 2] {
        self.eigenvalues
    }

    /// Unit eigenvectors matching [`eigenvalues`](Self::eigenvalues).
    #[must_use]
    pub const fn components(&self) -> [Coord; 2] {
        self.components
    }

    /// First principal component: the axis of maximal variance.
    #[must_use]
    pub const fn principal_axis(&self) -> Coord {
        self.components[0]
    }

    /// `min(|l1|, |l2|) / max(|l1|, |l2|)`, clamped to be non-negative.
    ///
    /// Close to 1 for round point sets, close to 0 for colinear ones.
    /// Coincident points (both eigenvalues zero) give 1.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        let [l1, l2] = self.eigenvalues;
        let hi = l1.abs().max(l2.abs());
        if hi == 0.0 {
            return 1.0;
        }
        (l1.abs().min(l2.abs()) / hi).max(0.0)
    }
}

fn normalize(v: Coord) -> Coord {
    let len = v.x.hypot(v.y);
    Coord::new(v.x / len, v.y / len)
}

/// Scalar projection of `v` onto `axis`: `dot(v, axis) / dot(axis, axis)`.
#[must_use]
pub fn projection(v: Coord, axis: Coord) -> f64 {
    v.dot(axis) / axis.dot(axis)
}

/// Shape of a cluster as judged by its eigenvalue ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Roughly round: solved with a closed angular tour.
    Compact,
    /// Stretched along one axis: solved with an open path.
    Elongated,
}

/// Classifies clusters by comparing their PCA ratio to a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeClassifier {
    threshold: f64,
}

impl Default for ShapeClassifier {
    fn default() -> Self {
        Self {
            threshold: SolverConfig::DEFAULT_ELONGATION_THRESHOLD,
        }
    }
}

impl ShapeClassifier {
    /// Create a classifier with elongation threshold `threshold`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] unless `threshold` lies in
    /// `[0, 1)`.
    pub fn new(threshold: f64) -> Result<Self, SolverError> {
        validate_threshold(threshold)?;
        Ok(Self { threshold })
    }

    /// The elongation threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Shape for a given eigenvalue ratio: elongated iff `ratio < threshold`.
    #[must_use]
    pub fn classify_ratio(&self, ratio: f64) -> Shape {
        if ratio < self.threshold {
            Shape::Elongated
        } else {
            Shape::Compact
        }
    }

    /// Run PCA on `points` and classify the result.
    ///
    /// # Errors
    ///
    /// Propagates [`Pca::fit`] errors.
    pub fn classify(&self, points: &[Point]) -> Result<(Shape, Pca), SolverError> {
        let pca = Pca::fit(points)?;
        Ok((self.classify_ratio(pca.ratio()), pca))
    }
}

/// Check that an elongation threshold lies in `[0, 1)`.
pub(crate) fn validate_threshold(threshold: f64) -> Result<(), SolverError> {
    if (0.0..1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(SolverError::InvalidInput(format!(
            "elongation threshold must lie in [0, 1), got {threshold}"
        )))
    }
}
