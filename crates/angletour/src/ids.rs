//! Identifiers for synthetic cluster representatives.

use std::collections::HashSet;

use crate::types::Point;

/// Unbounded generator of representative ids that never collide with
/// the ids of the input points.
///
/// Ids are `"{namespace}#{n}"` with `n` counting up from 0; any id that
/// is already taken by an input point is skipped.
#[derive(Debug, Clone)]
pub struct RepresentativeIds {
    namespace: String,
    next: u64,
    reserved: HashSet<String>,
}

impl RepresentativeIds {
    /// Namespace used by [`for_points`](Self::for_points).
    pub const DEFAULT_NAMESPACE: &'static str = "cluster";

    /// Create a generator in `namespace` that avoids every id in
    /// `reserved`.
    #[must_use]
    pub fn new<'a>(namespace: impl Into<String>, reserved: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            namespace: namespace.into(),
            next: 0,
            reserved: reserved.into_iter().map(str::to_owned).collect(),
        }
    }

    /// Create a generator avoiding the ids of `points`.
    #[must_use]
    pub fn for_points(points: &[Point]) -> Self {
        Self::new(Self::DEFAULT_NAMESPACE, points.iter().map(Point::id))
    }

    /// Produce the next free id.
    pub fn next_id(&mut self) -> String {
        loop {
            let candidate = format!("{}#{}", self.namespace, self.next);
            self.next += 1;
            if !self.reserved.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl Iterator for RepresentativeIds {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_id())
    }
}
