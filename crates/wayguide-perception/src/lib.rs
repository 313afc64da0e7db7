//! `wayguide-perception` – Pose stabilization layer.
//!
//! Turns the noisy, occasionally glitching pose stream produced by the
//! localization pipeline into a steady pose the renderer can anchor the AR
//! camera (or map root) to.
//!
//! # Modules
//!
//! - [`stabilizer`] – [`PoseStabilizer`][stabilizer::PoseStabilizer]: a
//!   three-band outlier filter (snap / reject / smooth) followed by a
//!   frame-rate independent exponential smoother for position and
//!   orientation.

pub mod stabilizer;

pub use stabilizer::{PoseStabilizer, StabilizerConfig};
