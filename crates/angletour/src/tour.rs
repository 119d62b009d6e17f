//! Closed tours: array-backed cyclic sequences of distinct points.
//!
//! Neighbor lookups wrap around with modular arithmetic. [`TourIter`]
//! walks the cycle once from any start index in either direction and
//! stops after exactly [`Tour::len`] points.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::types::{Point, SolverError};

/// Walking direction around a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Increasing indices, wrapping from the last point to the first.
    Forward,
    /// Decreasing indices, wrapping from the first point to the last.
    Backward,
}

/// A closed, ordered sequence of distinct points.
///
/// The closing edge from the last point back to the first is implicit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tour(Vec<Point>);

impl Tour {
    /// Create a tour from points already known to be distinct.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Create a tour, rejecting repeated point ids.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if two points share an id.
    pub fn try_new(points: Vec<Point>) -> Result<Self, SolverError> {
        let mut seen = HashSet::with_capacity(points.len());
        if let Some(dup) = points.iter().find(|p| !seen.insert(p.id())) {
            return Err(SolverError::InvalidInput(format!(
                "tour contains point {} more than once",
                dup.id()
            )));
        }
        Ok(Self(points))
    }

    /// Number of points in the tour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the tour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all points in tour order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the tour and returns its points in tour order.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Point at index `i`, if in bounds.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&Point> {
        self.0.get(i)
    }

    /// Index of the point with the given id.
    #[must_use]
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|p| p.id() == id)
    }

    /// Returns `true` if a point with the given id is part of the tour.
    #[must_use]
    pub fn contains_id(&self, id: &str) -> bool {
        self.position_of(id).is_some()
    }

    /// Index following `i`, wrapping from the last index to 0.
    ///
    /// Returns `None` if `i` is out of bounds.
    #[must_use]
    pub const fn next_index(&self, i: usize) -> Option<usize> {
        let n = self.0.len();
        if i < n { Some((i + 1) % n) } else { None }
    }

    /// Index preceding `i`, wrapping from 0 to the last index.
    ///
    /// Returns `None` if `i` is out of bounds.
    #[must_use]
    pub const fn previous_index(&self, i: usize) -> Option<usize> {
        let n = self.0.len();
        if i < n { Some((i + n - 1) % n) } else { None }
    }

    /// Point following index `i` on the cycle.
    #[must_use]
    pub fn next_point(&self, i: usize) -> Option<&Point> {
        self.next_index(i).and_then(|j| self.0.get(j))
    }

    /// Point preceding index `i` on the cycle.
    #[must_use]
    pub fn previous_point(&self, i: usize) -> Option<&Point> {
        self.previous_index(i).and_then(|j| self.0.get(j))
    }

    /// One pass over the tour starting at `start` in `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `start` is out of bounds.
    pub fn iter_from(&self, start: usize, direction: Direction) -> Result<TourIter<'_>, SolverError> {
        if start >= self.0.len() {
            return Err(SolverError::InvalidInput(format!(
                "start index {start} outside tour of {} points",
                self.0.len()
            )));
        }
        Ok(TourIter {
            tour: self,
            current: start,
            remaining: self.0.len(),
            direction,
        })
    }

    /// Closed tour length, including the edge from the last point back to
    /// the first.
    #[must_use]
    pub fn length(&self) -> f64 {
        geometry::tour_length(&self.0)
    }

    /// Replace the point at `index` with `replacement`, shifting the
    /// following points.
    pub(crate) fn splice_at(&mut self, index: usize, replacement: Vec<Point>) {
        self.0.splice(index..=index, replacement);
    }
}

impl From<Tour> for Vec<Point> {
    fn from(tour: Tour) -> Self {
        tour.0
    }
}

/// Single pass around a [`Tour`] from a start index.
///
/// Yields every point exactly once, then ends.
#[derive(Debug, Clone)]
pub struct TourIter<'a> {
    tour: &'a Tour,
    current: usize,
    remaining: usize,
    direction: Direction,
}

impl<'a> Iterator for TourIter<'a> {
    type Item = &'a Point;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let point = self.tour.0.get(self.current)?;
        let n = self.tour.0.len();
        self.current = match self.direction {
            Direction::Forward => (self.current + 1) % n,
            Direction::Backward => (self.current + n - 1) % n,
        };
        self.remaining -= 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for TourIter<'_> {}
