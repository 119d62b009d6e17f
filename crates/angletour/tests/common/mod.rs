//! Point set generators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::f64::consts::TAU;

use angletour::{Point, Tour};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator so every test run sees the same points.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `n` points uniformly distributed in `[min, max)` on both axes.
pub fn uniform(rng: &mut StdRng, prefix: &str, n: usize, min: f64, max: f64) -> Vec<Point> {
    (0..n)
        .map(|i| Point::new(format!("{prefix}{i}"), rng.gen_range(min..max), rng.gen_range(min..max)))
        .collect()
}

/// `n` points evenly spaced on a circle.
pub fn circle(prefix: &str, cx: f64, cy: f64, radius: f64, n: u32) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let t = TAU * f64::from(i) / f64::from(n);
            Point::new(format!("{prefix}{i}"), t.cos().mul_add(radius, cx), t.sin().mul_add(radius, cy))
        })
        .collect()
}

/// `n` points on the segment from `(x0, y0)` to `(x1, y1)`, shuffled and
/// jittered perpendicular to it by at most `jitter`.
pub fn linear(
    rng: &mut StdRng,
    prefix: &str,
    (x0, y0): (f64, f64),
    (x1, y1): (f64, f64),
    n: u32,
    jitter: f64,
) -> Vec<Point> {
    let len = (x1 - x0).hypot(y1 - y0);
    let (nx, ny) = (-(y1 - y0) / len, (x1 - x0) / len);
    let mut points: Vec<Point> = (0..n)
        .map(|i| {
            let t = f64::from(i) / f64::from(n - 1);
            let off = if jitter > 0.0 { rng.gen_range(-jitter..jitter) } else { 0.0 };
            Point::new(
                format!("{prefix}{i}"),
                nx.mul_add(off, t.mul_add(x1 - x0, x0)),
                ny.mul_add(off, t.mul_add(y1 - y0, y0)),
            )
        })
        .collect();
    for i in (1..points.len()).rev() {
        let j = rng.gen_range(0..=i);
        points.swap(i, j);
    }
    points
}

/// Tour ids as owned strings.
pub fn ids(tour: &Tour) -> Vec<String> {
    tour.points().iter().map(|p| p.id().to_string()).collect()
}

/// The tour visits every input point exactly once.
pub fn assert_covers(points: &[Point], tour: &Tour) {
    assert_eq!(tour.len(), points.len(), "tour size");
    let expected: HashSet<&str> = points.iter().map(Point::id).collect();
    let actual: HashSet<&str> = tour.points().iter().map(Point::id).collect();
    assert_eq!(actual, expected);
}

/// Points whose id starts with `prefix` occupy one contiguous run of the
/// cycle.
pub fn is_contiguous(tour: &Tour, prefix: &str) -> bool {
    let flags: Vec<bool> = tour.points().iter().map(|p| p.id().starts_with(prefix)).collect();
    let n = flags.len();
    let runs = (0..n).filter(|&i| flags[i] && !flags[(i + n - 1) % n]).count();
    runs == 1 || flags.iter().all(|&f| f)
}
