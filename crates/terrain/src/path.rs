use glam::Vec2;

use crate::error::{Error, Result};
use crate::template::Direction;

/// Polyline samples taken per cubic segment when flattening the curve.
const SAMPLES_PER_SEGMENT: usize = 16;

/// Collapses a straight corridor path down to its two endpoints.
///
/// Applies when `generation` and `exit` lie on the same axis and the first and
/// last waypoint share the orthogonal coordinate (same Y for a horizontal run,
/// same X for a vertical one). Comparison is exact: generation only translates
/// and mirrors authored integer tiles, so equal coordinates stay bit-equal.
/// Rotation or scaling in the transform would need a tolerance here.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn collapse_straight(points: &[Vec2], generation: Direction, exit: Direction) -> Vec<Vec2> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return points.to_vec();
    };
    let straight = (generation.is_horizontal() && exit.is_horizontal() && first.y == last.y)
        || (generation.is_vertical() && exit.is_vertical() && first.x == last.x);
    if straight && points.len() > 2 {
        vec![first, last]
    } else {
        points.to_vec()
    }
}

/// A smooth camera path through one exit's waypoints.
///
/// The waypoints are joined with a Catmull-Rom spline expressed as cubic
/// Bézier segments, then flattened into a polyline with a cumulative
/// arc-length table that backs every query.
#[derive(Clone, Debug)]
pub struct PathGeometry {
    control_points: Vec<Vec2>,
    samples: Vec<Vec2>,
    /// `lengths[i]` is the arc length from the start to `samples[i]`.
    lengths: Vec<f32>,
}

impl PathGeometry {
    /// Builds the path for an exit of a chunk generated toward `generation`.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientPathPoints`] if fewer than two waypoints are given.
    pub fn new(waypoints: &[Vec2], generation: Direction, exit: Direction) -> Result<Self> {
        if waypoints.len() < 2 {
            return Err(Error::InsufficientPathPoints {
                count: waypoints.len(),
            });
        }
        let control_points = collapse_straight(waypoints, generation, exit);
        let samples = flatten(&control_points);

        let mut lengths = Vec::with_capacity(samples.len());
        let mut total = 0.0;
        lengths.push(total);
        for pair in samples.windows(2) {
            total += pair[0].distance(pair[1]);
            lengths.push(total);
        }

        Ok(Self {
            control_points,
            samples,
            lengths,
        })
    }

    /// Waypoints the curve passes through, after straight-path collapse.
    #[must_use]
    pub fn control_points(&self) -> &[Vec2] {
        &self.control_points
    }

    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.samples[0]
    }

    #[must_use]
    pub fn end(&self) -> Vec2 {
        self.samples[self.samples.len() - 1]
    }

    /// Total arc length.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.lengths[self.lengths.len() - 1]
    }

    /// Nearest point on the path to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        self.project(point).0
    }

    /// Arc length from the start to the point on the path nearest `point`.
    #[must_use]
    pub fn distance_along(&self, point: Vec2) -> f32 {
        self.project(point).1
    }

    /// Position at `distance` along the path, clamped to its ends.
    #[must_use]
    pub fn point_at_distance(&self, distance: f32) -> Vec2 {
        let distance = distance.clamp(0.0, self.length());
        let upper = self
            .lengths
            .partition_point(|&l| l < distance)
            .clamp(1, self.samples.len() - 1);
        let lower = upper - 1;
        let span = self.lengths[upper] - self.lengths[lower];
        if span <= f32::EPSILON {
            return self.samples[lower];
        }
        let t = (distance - self.lengths[lower]) / span;
        self.samples[lower].lerp(self.samples[upper], t)
    }

    /// Returns the closest point and its arc length.
    fn project(&self, point: Vec2) -> (Vec2, f32) {
        let mut best = (self.samples[0], 0.0);
        let mut best_dist_sq = f32::INFINITY;
        for (i, pair) in self.samples.windows(2).enumerate() {
            let (a, b) = (pair[0], pair[1]);
            let ab = b - a;
            let len_sq = ab.length_squared();
            let t = if len_sq > 0.0 {
                ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let candidate = a + ab * t;
            let dist_sq = candidate.distance_squared(point);
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best = (candidate, self.lengths[i] + len_sq.sqrt() * t);
            }
        }
        best
    }
}

/// Flattens the Catmull-Rom curve through `points` into a polyline.
/// Two points produce the straight segment between them.
#[allow(clippy::cast_precision_loss)]
fn flatten(points: &[Vec2]) -> Vec<Vec2> {
    if points.len() == 2 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut samples = Vec::with_capacity(last * SAMPLES_PER_SEGMENT + 1);
    samples.push(points[0]);
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        // Catmull-Rom tangents as Bézier handles.
        let c1 = p1 + (p2 - p0) / 6.0;
        let c2 = p2 - (p3 - p1) / 6.0;
        for step in 1..=SAMPLES_PER_SEGMENT {
            let t = step as f32 / SAMPLES_PER_SEGMENT as f32;
            samples.push(cubic_bezier(p1, c1, c2, p2, t));
        }
    }
    samples
}

fn cubic_bezier(p0: Vec2, c1: Vec2, c2: Vec2, p1: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
}
