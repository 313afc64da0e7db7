//! `wayguide-types` – shared vocabulary for the Wayguide stack.
//!
//! Geometry primitives ([`Vec3`], [`Quaternion`], [`Pose`]), the destination
//! record handed out by destination providers ([`NavigationTarget`]), and the
//! crate-spanning error type [`GuideError`].
//!
//! # Example
//!
//! ```rust
//! use wayguide_types::{Pose, Quaternion, Vec3};
//!
//! let a = Pose::new(Vec3::zero(), Quaternion::identity());
//! let b = Pose::new(Vec3::new(3.0, 4.0, 0.0), Quaternion::identity());
//! assert!((a.position.distance(b.position) - 5.0).abs() < 1e-5);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Vec3
// ────────────────────────────────────────────────────────────────────────────

/// A 3-D vector in world units (metres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// Create a new vector.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    pub fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Self) -> f32 {
        self.sub(other).length()
    }

    /// Linear interpolation from `self` toward `target`.
    ///
    /// `t` is clamped to `[0, 1]`: `0` returns `self`, `1` returns `target`.
    pub fn lerp(self, target: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        self.add(target.sub(self).scale(t))
    }

    /// Move from `self` toward `target` by at most `max_step`, never
    /// overshooting.
    pub fn move_towards(self, target: Self, max_step: f32) -> Self {
        let delta = target.sub(self);
        let dist = delta.length();
        if dist <= max_step || dist <= f32::EPSILON {
            target
        } else {
            self.add(delta.scale(max_step / dist))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Quaternion
// ────────────────────────────────────────────────────────────────────────────

/// A unit quaternion representing a 3-D rotation (w, x, y, z convention).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Quaternion {
    /// Create a quaternion.  The caller is responsible for providing a unit
    /// quaternion (|q| = 1).
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    /// The identity rotation (no rotation).
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }

    /// Rotation of `angle_rad` radians around the vertical (Y) axis.
    pub fn from_yaw(angle_rad: f32) -> Self {
        let half = angle_rad * 0.5;
        Self::new(half.cos(), 0.0, half.sin(), 0.0)
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.w * rhs.w + self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Return the unit-length version of this quaternion.  A degenerate
    /// (zero-length) quaternion normalises to the identity.
    pub fn normalize(self) -> Self {
        let n = self.dot(self).sqrt();
        if n <= f32::EPSILON {
            return Self::identity();
        }
        Self::new(self.w / n, self.x / n, self.y / n, self.z / n)
    }

    /// Angle in radians between two orientations.
    pub fn angle_to(self, other: Self) -> f32 {
        let d = self.dot(other).abs().min(1.0);
        2.0 * d.acos()
    }

    /// Spherical linear interpolation along the shortest arc.
    ///
    /// `t` is clamped to `[0, 1]`.  Nearly parallel inputs fall back to a
    /// normalised linear blend, which is numerically stable there.
    pub fn slerp(self, target: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut cos = self.dot(target);
        let mut end = target;
        if cos < 0.0 {
            cos = -cos;
            end = Self::new(-end.w, -end.x, -end.y, -end.z);
        }

        let (k0, k1) = if cos > 0.9995 {
            (1.0 - t, t)
        } else {
            let theta = cos.acos();
            let sin = theta.sin();
            (((1.0 - t) * theta).sin() / sin, (t * theta).sin() / sin)
        };

        Self::new(
            k0 * self.w + k1 * end.w,
            k0 * self.x + k1 * end.x,
            k0 * self.y + k1 * end.y,
            k0 * self.z + k1 * end.z,
        )
        .normalize()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose
// ────────────────────────────────────────────────────────────────────────────

/// Position plus orientation of a tracked object at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quaternion,
}

impl Pose {
    pub fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// A pose at `position` with identity orientation.
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Quaternion::identity())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// NavigationTarget
// ────────────────────────────────────────────────────────────────────────────

/// A selectable point of interest the user can be guided to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationTarget {
    /// Human-readable name, e.g. `"Reception"`.
    pub name: String,
    /// World-space position of the point of interest.
    pub position: Vec3,
}

impl NavigationTarget {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type shared by the Wayguide crates.
///
/// None of these are fatal: callers log them and keep the last good state.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GuideError {
    #[error("No destination selected")]
    MissingDestination,

    #[error("Guide agent is inactive")]
    NavigatorInactive,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn vec3_distance_is_euclidean() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-5);
        assert!((b.distance(a) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn vec3_lerp_endpoints_and_clamp() {
        let a = Vec3::zero();
        let b = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert!((a.lerp(b, 0.25).x - 2.5).abs() < 1e-5);
        assert_eq!(a.lerp(b, 3.0), b);
    }

    #[test]
    fn vec3_move_towards_does_not_overshoot() {
        let a = Vec3::zero();
        let b = Vec3::new(0.0, 0.0, 2.0);
        let step = a.move_towards(b, 0.5);
        assert!((step.z - 0.5).abs() < 1e-5);
        assert_eq!(a.move_towards(b, 5.0), b);
    }

    #[test]
    fn slerp_halfway_between_yaws() {
        let a = Quaternion::identity();
        let b = Quaternion::from_yaw(FRAC_PI_2);
        let mid = a.slerp(b, 0.5);
        let expected = Quaternion::from_yaw(FRAC_PI_2 / 2.0);
        assert!(mid.angle_to(expected) < 1e-2, "got {mid:?}");
    }

    #[test]
    fn slerp_endpoints() {
        let a = Quaternion::from_yaw(0.3);
        let b = Quaternion::from_yaw(1.2);
        assert!(a.slerp(b, 0.0).angle_to(a) < 1e-2);
        assert!(a.slerp(b, 1.0).angle_to(b) < 1e-2);
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        // -q represents the same rotation as q; slerp must not spin around.
        let a = Quaternion::from_yaw(0.2);
        let b = Quaternion::from_yaw(0.4);
        let b_neg = Quaternion::new(-b.w, -b.x, -b.y, -b.z);
        let r = a.slerp(b_neg, 0.5);
        assert!(r.angle_to(Quaternion::from_yaw(0.3)) < 1e-2);
    }

    #[test]
    fn angle_to_half_turn() {
        let a = Quaternion::identity();
        let b = Quaternion::from_yaw(PI);
        assert!((a.angle_to(b) - PI).abs() < 1e-2);
    }

    #[test]
    fn normalize_degenerate_is_identity() {
        let q = Quaternion::new(0.0, 0.0, 0.0, 0.0).normalize();
        assert_eq!(q, Quaternion::identity());
    }

    #[test]
    fn navigation_target_roundtrip() {
        let target = NavigationTarget::new("Reception", Vec3::new(1.0, 0.0, -4.5));
        let json = serde_json::to_string(&target).unwrap();
        let back: NavigationTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(target, back);
    }

    #[test]
    fn guide_error_display() {
        assert!(GuideError::MissingDestination
            .to_string()
            .contains("No destination"));
        assert_eq!(GuideError::NavigatorInactive.to_string(), "Guide agent is inactive");
        let err = GuideError::InvalidConfig("outlier > snap".to_string());
        assert!(err.to_string().contains("outlier > snap"));
    }
}
