//! Generic `PoseSource` trait for the localization pipeline's output.

use wayguide_types::Pose;

/// Produces the raw, unfiltered device pose once per frame.
///
/// Implementations must be cheap and non-blocking: the frame loop calls
/// [`current_pose`][Self::current_pose] exactly once per rendered frame.
pub trait PoseSource {
    /// Return the raw pose for the current frame.
    fn current_pose(&mut self) -> Pose;
}
