// SPDX-License-Identifier: MIT OR Apache-2.0
//! Curve math shared by every sample type.
//!
//! Camera paths are stored as cubic Bezier segments. A flattened control run
//! keeps anchors at `3k` and the tangents between anchor `k` and `k + 1` at
//! `3k + 1` (outgoing) and `3k + 2` (incoming).

use glam::{Quat, Vec3};

/// Squared length below which a direction is treated as "not set".
pub const DIRECTION_EPSILON_SQ: f32 = 0.0001;

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Cubic Bezier point. `t` is clamped to `[0, 1]`.
    pub fn bezier(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
        let t = t.clamp(0.0, 1.0);
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let t2 = t * t;

        p0 * (mt2 * mt) + p1 * (3.0 * mt2 * t) + p2 * (3.0 * mt * t2) + p3 * (t2 * t)
    }

    /// Point on a piecewise cubic spline given as a flat control run.
    ///
    /// Needs at least 4 points; shorter runs yield `Vec3::ZERO`.
    pub fn spline(points: &[Vec3], t: f32) -> Vec3 {
        if points.len() < 4 {
            return Vec3::ZERO;
        }
        let segments = (points.len() - 1) / 3;
        let (i, local) = if t >= 1.0 {
            (points.len() - 4, 1.0)
        } else {
            let scaled = t.clamp(0.0, 1.0) * segments as f32;
            let seg = scaled as usize;
            (seg * 3, scaled - seg as f32)
        };
        Self::bezier(points[i], points[i + 1], points[i + 2], points[i + 3], local)
    }

    /// Spherical interpolation of two direction vectors.
    ///
    /// Rotates `a` towards `b` and interpolates the length linearly. Opposite
    /// directions rotate around an arbitrary perpendicular axis.
    pub fn slerp_direction(a: Vec3, b: Vec3, t: f32) -> Vec3 {
        let len_a = a.length();
        let len_b = b.length();
        if len_a * len_a < DIRECTION_EPSILON_SQ || len_b * len_b < DIRECTION_EPSILON_SQ {
            return a.lerp(b, t);
        }
        let na = a / len_a;
        let nb = b / len_b;
        let len = Self::lerp(len_a, len_b, t);
        let dot = na.dot(nb).clamp(-1.0, 1.0);

        // Nearly parallel
        if dot > 0.9995 {
            return na.lerp(nb, t).normalize_or_zero() * len;
        }

        // Nearly opposite
        if dot < -0.9995 {
            let axis = na.any_orthonormal_vector();
            return Quat::from_axis_angle(axis, std::f32::consts::PI * t) * na * len;
        }

        let theta = dot.acos() * t;
        let rel = (nb - na * dot).normalize();
        (na * theta.cos() + rel * theta.sin()) * len
    }

    /// Whether a direction is long enough to be used as an explicit facing.
    pub fn has_direction(v: Vec3) -> bool {
        v.length_squared() > DIRECTION_EPSILON_SQ
    }
}

/// Unclamped local time of `t` inside a span starting at `start`.
pub fn local_time(t: f32, start: f32, duration: f32) -> f32 {
    (t - start) / duration
}

/// Normalized time of `current_time` inside a sample.
///
/// Non-looped: `(t - start) / duration` clamped to `[0, 1]`. Looped: the
/// elapsed time is clamped to `[0, duration]`, wrapped by
/// `one_shot_duration` and normalized by it. Degenerate durations never
/// produce NaN.
pub fn clamped_local_time(
    current_time: f32,
    start_time: f32,
    duration: f32,
    looped: bool,
    one_shot_duration: f32,
) -> f32 {
    if looped {
        if one_shot_duration <= 0.0 {
            return 0.0;
        }
        let elapsed = (current_time - start_time).clamp(0.0, duration.max(0.0));
        repeat(elapsed, one_shot_duration) / one_shot_duration
    } else if duration <= 0.0 {
        if current_time >= start_time {
            1.0
        } else {
            0.0
        }
    } else {
        local_time(current_time, start_time, duration).clamp(0.0, 1.0)
    }
}

/// Wraps `t` into `[0, length)`.
fn repeat(t: f32, length: f32) -> f32 {
    (t - (t / length).floor() * length).clamp(0.0, length)
}
