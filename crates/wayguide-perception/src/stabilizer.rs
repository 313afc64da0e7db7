//! Pose Stabilization Filter.
//!
//! Turns the jittery pose stream coming out of the localization pipeline into
//! a stable pose suitable for rendering the AR camera or map root.
//!
//! Every frame the distance between the raw position and the last stabilized
//! position is classified into one of three bands:
//!
//! | Band                          | Treatment                                          |
//! |-------------------------------|----------------------------------------------------|
//! | `dist > snap`                 | Relocation: adopt the raw pose immediately.        |
//! | `outlier < dist ≤ snap`       | Probable glitch: hold the last pose for up to      |
//! |                               | `max_outlier_frames` frames, then accept it.       |
//! | `dist ≤ outlier`              | Normal motion: exponential smoothing.              |
//!
//! The smoothing blend weight is frame-rate independent:
//! ```text
//! t = 1 − exp(−f · 60 · dt)
//! ```
//! where `f ∈ [0, 1]` is the smoothing factor normalised to a 60 Hz reference
//! rate.  Position is linearly interpolated, orientation spherically.
//!
//! # Example
//!
//! ```rust
//! use wayguide_perception::stabilizer::{PoseStabilizer, StabilizerConfig};
//! use wayguide_types::{Pose, Vec3};
//!
//! let mut stabilizer = PoseStabilizer::new(StabilizerConfig::default());
//!
//! // First frame initialises the filter and passes through unchanged.
//! let first = stabilizer.update(Pose::at(Vec3::zero()), 1.0 / 60.0);
//! assert_eq!(first.position, Vec3::zero());
//!
//! // A 10 m jump is a relocation and is reproduced without lag.
//! let snapped = stabilizer.update(Pose::at(Vec3::new(10.0, 0.0, 0.0)), 1.0 / 60.0);
//! assert_eq!(snapped.position.x, 10.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use wayguide_types::{GuideError, Pose, Quaternion, Vec3};

/// Reference update rate the smoothing factors are normalised to.
const REFERENCE_RATE_HZ: f32 = 60.0;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Tuning parameters for [`PoseStabilizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Position smoothing factor (0 = frozen, 1 = no smoothing).
    pub position_smooth_factor: f32,
    /// Rotation smoothing factor (0 = frozen, 1 = no smoothing).
    pub rotation_smooth_factor: f32,
    /// Jumps larger than this (metres) are treated as relocations.
    pub snap_distance_threshold: f32,
    /// Jumps larger than this but within the snap threshold are treated as
    /// probable outliers.
    pub outlier_distance_threshold: f32,
    /// Consecutive outlier frames to reject before accepting the new pose.
    pub max_outlier_frames: u32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            position_smooth_factor: 0.1,
            rotation_smooth_factor: 0.1,
            snap_distance_threshold: 5.0,
            outlier_distance_threshold: 0.5,
            max_outlier_frames: 5,
        }
    }
}

impl StabilizerConfig {
    /// Check the thresholds for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::InvalidConfig`] when a threshold is negative or
    /// not finite, or when the outlier threshold exceeds the snap threshold.
    pub fn validate(&self) -> Result<(), GuideError> {
        let thresholds = [
            ("snap_distance_threshold", self.snap_distance_threshold),
            ("outlier_distance_threshold", self.outlier_distance_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(GuideError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.outlier_distance_threshold > self.snap_distance_threshold {
            return Err(GuideError::InvalidConfig(format!(
                "outlier_distance_threshold ({}) exceeds snap_distance_threshold ({})",
                self.outlier_distance_threshold, self.snap_distance_threshold
            )));
        }
        Ok(())
    }
}

/// Blend weight for one frame of exponential smoothing.
fn blend_weight(factor: f32, dt: f32) -> f32 {
    1.0 - (-factor * REFERENCE_RATE_HZ * dt).exp()
}

// ────────────────────────────────────────────────────────────────────────────
// PoseStabilizer
// ────────────────────────────────────────────────────────────────────────────

/// Outlier-rejecting exponential filter over a stream of [`Pose`]s.
///
/// Call [`PoseStabilizer::update`] exactly once per rendered frame, after the
/// raw pose for that frame is final.
#[derive(Debug, Clone)]
pub struct PoseStabilizer {
    config: StabilizerConfig,
    last_position: Vec3,
    last_orientation: Quaternion,
    initialized: bool,
    outlier_streak: u32,
    active: bool,
}

impl PoseStabilizer {
    /// Create an active stabilizer.
    ///
    /// The smoothing factors are clamped to `[0, 1]`.
    pub fn new(mut config: StabilizerConfig) -> Self {
        config.position_smooth_factor = config.position_smooth_factor.clamp(0.0, 1.0);
        config.rotation_smooth_factor = config.rotation_smooth_factor.clamp(0.0, 1.0);
        Self {
            config,
            last_position: Vec3::zero(),
            last_orientation: Quaternion::identity(),
            initialized: false,
            outlier_streak: 0,
            active: true,
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    /// Number of consecutive frames currently being rejected as outliers.
    pub fn outlier_streak(&self) -> u32 {
        self.outlier_streak
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The most recent stabilized pose, or `None` before the first update.
    pub fn last_pose(&self) -> Option<Pose> {
        self.initialized
            .then(|| Pose::new(self.last_position, self.last_orientation))
    }

    /// Forget all filter state; the next update re-initialises from the raw
    /// pose.
    pub fn reset(&mut self) {
        self.initialized = false;
        self.outlier_streak = 0;
    }

    /// (Re-)enable stabilization.  Always starts from a clean state.
    pub fn activate(&mut self) {
        self.active = true;
        self.reset();
    }

    /// Disable stabilization.  While inactive, [`update`][Self::update]
    /// passes raw poses through untouched.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Filter one frame.
    ///
    /// - `raw` – the pose reported by the tracking pipeline for this frame.
    /// - `dt` – seconds since the previous frame; negative values are treated
    ///   as zero.
    ///
    /// Returns the pose to render this frame.
    pub fn update(&mut self, raw: Pose, dt: f32) -> Pose {
        if !self.active {
            return raw;
        }

        if !self.initialized {
            self.adopt(raw);
            self.initialized = true;
            debug!(
                x = raw.position.x,
                y = raw.position.y,
                z = raw.position.z,
                "stabilizer initialised"
            );
            return raw;
        }

        let dist = raw.position.distance(self.last_position);

        if dist > self.config.snap_distance_threshold {
            debug!(dist, "relocation detected, snapping to raw pose");
            self.adopt(raw);
            self.outlier_streak = 0;
            return raw;
        }

        if dist > self.config.outlier_distance_threshold {
            if self.outlier_streak < self.config.max_outlier_frames {
                self.outlier_streak += 1;
                trace!(dist, streak = self.outlier_streak, "rejecting outlier frame");
                return Pose::new(self.last_position, self.last_orientation);
            }
            debug!(dist, "sustained deviation accepted as real motion");
            self.outlier_streak = 0;
        } else {
            self.outlier_streak = 0;
        }

        let dt = dt.max(0.0);
        let pos_t = blend_weight(self.config.position_smooth_factor, dt);
        let rot_t = blend_weight(self.config.rotation_smooth_factor, dt);

        self.last_position = self.last_position.lerp(raw.position, pos_t);
        self.last_orientation = self.last_orientation.slerp(raw.orientation, rot_t);

        Pose::new(self.last_position, self.last_orientation)
    }

    fn adopt(&mut self, pose: Pose) {
        self.last_position = pose.position;
        self.last_orientation = pose.orientation;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
