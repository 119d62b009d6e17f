//! Parallel bucket sort over normalized angles.
//!
//! Entries carrying an angle in `[0, 1)` are partitioned into `B` buckets
//! by `floor(B * angle)`. Bucket `i` goes to worker `i mod W`. Each worker
//! sorts only its own buckets: small buckets with a stable insertion
//! sort, larger ones with the standard library's stable merge sort.
//! The caller blocks until every worker is done, then concatenates the
//! buckets in ascending index order.

use crate::types::SolverError;

/// A value tagged with its normalized angle in `[0, 1)`.
///
/// Angles live next to the value rather than on it, so one point set can
/// be sorted by several independent calls without shared state.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleEntry<T> {
    /// Sort key, expected in `[0, 1)`.
    pub angle: f64,
    /// Payload carried along with the key.
    pub value: T,
}

impl<T> AngleEntry<T> {
    /// Create a new entry.
    #[must_use]
    pub const fn new(angle: f64, value: T) -> Self {
        Self { angle, value }
    }
}

/// Bucket sorter backed by a fixed-size rayon worker pool.
#[derive(Debug)]
pub struct AngleSorter {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl AngleSorter {
    /// Buckets with fewer entries than this use insertion sort.
    pub const INSERTION_SORT_THRESHOLD: usize = 20;

    /// Start a sorter with `workers` threads.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `workers` is zero and
    /// [`SolverError::WorkerPool`] if the threads cannot be spawned.
    pub fn new(workers: usize) -> Result<Self, SolverError> {
        if workers == 0 {
            return Err(SolverError::InvalidInput(
                "worker count must be at least 1".to_string(),
            ));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("angle-sort-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    /// Number of workers buckets are distributed across.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Default bucket count for `n` entries: `ceil(n / 4)`, at least 1.
    #[must_use]
    pub const fn bucket_count_for(n: usize) -> usize {
        let b = n.div_ceil(4);
        if b == 0 { 1 } else { b }
    }

    /// Sort `entries` by non-decreasing angle using `buckets` buckets.
    ///
    /// Equal angles keep their relative input order.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::InvalidInput`] if `buckets` is zero or any
    /// angle lies outside `[0, 1)`.
    pub fn sort<T: Send>(
        &self,
        entries: Vec<AngleEntry<T>>,
        buckets: usize,
    ) -> Result<Vec<AngleEntry<T>>, SolverError> {
        if buckets == 0 {
            return Err(SolverError::InvalidInput(
                "bucket count must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = entries.iter().find(|e| !(0.0..1.0).contains(&e.angle)) {
            return Err(SolverError::InvalidInput(format!(
                "angle {} outside [0, 1)",
                bad.angle
            )));
        }
        if entries.len() <= 1 {
            return Ok(entries);
        }

        let total = entries.len();
        log::debug!(
            "sort: start entries={total} buckets={buckets} workers={}",
            self.workers
        );

        let mut partitioned: Vec<Vec<AngleEntry<T>>> = (0..buckets).map(|_| Vec::new()).collect();
        for entry in entries {
            partitioned[bucket_index(entry.angle, buckets)].push(entry);
        }

        // lanes[w] holds buckets w, w + W, w + 2W, ... in ascending order.
        let mut lanes: Vec<Vec<Vec<AngleEntry<T>>>> =
            (0..self.workers).map(|_| Vec::new()).collect();
        for (i, bucket) in partitioned.into_iter().enumerate() {
            lanes[i % self.workers].push(bucket);
        }

        self.pool.scope(|s| {
            for lane in lanes.iter_mut().filter(|lane| !lane.is_empty()) {
                s.spawn(move |_| {
                    for bucket in lane.iter_mut() {
                        sort_bucket(bucket);
                    }
                });
            }
        });

        let mut lane_iters: Vec<_> = lanes.into_iter().map(Vec::into_iter).collect();
        let mut sorted = Vec::with_capacity(total);
        for i in 0..buckets {
            if let Some(bucket) = lane_iters[i % self.workers].next() {
                sorted.extend(bucket);
            }
        }

        log::trace!("sort: done entries={}", sorted.len());
        Ok(sorted)
    }
}

/// Bucket for `angle`, clamped so rounding never leaves the last bucket.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bucket_index(angle: f64, buckets: usize) -> usize {
    ((angle * buckets as f64) as usize).min(buckets - 1)
}

fn sort_bucket<T>(bucket: &mut [AngleEntry<T>]) {
    if bucket.len() < AngleSorter::INSERTION_SORT_THRESHOLD {
        insertion_sort(bucket);
    } else {
        bucket.sort_by(|a, b| a.angle.total_cmp(&b.angle));
    }
}

/// Stable in-place insertion sort: only strictly greater keys move.
fn insertion_sort<T>(bucket: &mut [AngleEntry<T>]) {
    for i in 1..bucket.len() {
        let mut j = i;
        while j > 0 && bucket[j - 1].angle > bucket[j].angle {
            bucket.swap(j - 1, j);
            j -= 1;
        }
    }
}
