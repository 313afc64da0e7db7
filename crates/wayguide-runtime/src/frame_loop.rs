//! [`FrameLoop`] – explicit per-frame driver.
//!
//! Each [`tick`][FrameLoop::tick] runs the three stages in a fixed order:
//!
//! 1. **Sample** – read the raw pose from the [`PoseSource`].
//! 2. **Stabilize** – feed it through the [`PoseStabilizer`].
//! 3. **Navigate** – evaluate the [`ModeCoordinator`] / navigator.
//!
//! The elapsed time handed in by the host is clamped to
//! `[0, max_frame_delta]` first, so a hitch (app backgrounded, debugger
//! pause) never turns into a huge smoothing step or an instantly expired
//! wait timer.
//!
//! # Example
//!
//! ```rust
//! use wayguide_hal::sim::SimRig;
//! use wayguide_perception::{PoseStabilizer, StabilizerConfig};
//! use wayguide_runtime::{
//!     AutonomousNavigator, FrameLoop, FrameLoopConfig, ModeCoordinator, NavigatorConfig,
//! };
//!
//! let parts = SimRig::new().build();
//! let navigator = AutonomousNavigator::new(
//!     NavigatorConfig::default(),
//!     parts.agent,
//!     Box::new(parts.destination.clone()),
//!     Box::new(parts.user.clone()),
//! );
//! let coordinator = ModeCoordinator::new(
//!     navigator,
//!     Box::new(parts.path_line),
//!     Box::new(parts.agent_avatar),
//!     Box::new(parts.destination),
//! );
//! let mut frames = FrameLoop::new(
//!     FrameLoopConfig::default(),
//!     Box::new(parts.pose_source),
//!     PoseStabilizer::new(StabilizerConfig::default()),
//!     coordinator,
//! );
//!
//! let report = frames.tick(1.0 / 60.0);
//! assert_eq!(report.frame, 1);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{instrument, trace, warn};
use wayguide_hal::{PathfindingAgent, PoseSource};
use wayguide_perception::PoseStabilizer;
use wayguide_types::{Pose, Vec3};

use crate::mode::{ModeCoordinator, PresentationMode};
use crate::navigator::AgentState;

/// Upper bound on frames ticked by one [`FrameLoop::run_for`] call: one hour
/// at 240 Hz.
pub const MAX_RUN_FRAMES: u64 = 240 * 60 * 60;

/// Configuration bundle for [`FrameLoop`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLoopConfig {
    /// Upper bound on the per-frame elapsed time, in seconds.
    pub max_frame_delta: f32,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: 0.1,
        }
    }
}

/// Snapshot of one frame's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// 1-based frame counter.
    pub frame: u64,
    /// Clamped elapsed time actually used for this frame.
    pub dt: f32,
    pub raw: Pose,
    pub stabilized: Pose,
    pub agent_state: AgentState,
    pub agent_position: Vec3,
    pub mode: PresentationMode,
}

/// Owns the per-frame pipeline: pose source → stabilizer → navigation.
pub struct FrameLoop<A: PathfindingAgent> {
    config: FrameLoopConfig,
    source: Box<dyn PoseSource>,
    stabilizer: PoseStabilizer,
    coordinator: ModeCoordinator<A>,
    frame: u64,
}

impl<A: PathfindingAgent> FrameLoop<A> {
    pub fn new(
        config: FrameLoopConfig,
        source: Box<dyn PoseSource>,
        stabilizer: PoseStabilizer,
        coordinator: ModeCoordinator<A>,
    ) -> Self {
        Self {
            config,
            source,
            stabilizer,
            coordinator,
            frame: 0,
        }
    }

    /// Number of frames ticked so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn stabilizer(&self) -> &PoseStabilizer {
        &self.stabilizer
    }

    pub fn coordinator(&self) -> &ModeCoordinator<A> {
        &self.coordinator
    }

    pub fn coordinator_mut(&mut self) -> &mut ModeCoordinator<A> {
        &mut self.coordinator
    }

    /// Run one frame with `dt` seconds of elapsed time.
    #[instrument(level = "trace", skip(self))]
    pub fn tick(&mut self, dt: f32) -> FrameReport {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_frame_delta.max(0.0))
        } else {
            0.0
        };
        self.frame += 1;

        let raw = self.source.current_pose();
        let stabilized = self.stabilizer.update(raw, dt);
        let agent_state = self.coordinator.update(dt);

        trace!(
            streak = self.stabilizer.outlier_streak(),
            state = %agent_state,
            "frame complete"
        );

        FrameReport {
            frame: self.frame,
            dt,
            raw,
            stabilized,
            agent_state,
            agent_position: self.coordinator.navigator().agent().position(),
            mode: self.coordinator.mode(),
        }
    }

    /// Tick repeatedly for `seconds` of simulated time at `frame_rate` Hz.
    /// Returns the report of the last frame, or `None` if no frame ran.
    pub fn run_for(&mut self, seconds: f32, frame_rate: f32) -> Option<FrameReport> {
        self.run_while(seconds, frame_rate, || true)
    }

    /// Like [`run_for`][Self::run_for], but `keep_running` is polled before
    /// every frame and a `false` ends the run early.
    pub fn run_while(
        &mut self,
        seconds: f32,
        frame_rate: f32,
        mut keep_running: impl FnMut() -> bool,
    ) -> Option<FrameReport> {
        let frames = frame_budget(seconds, frame_rate)?;
        let dt = 1.0 / frame_rate;
        let mut last = None;
        for _ in 0..frames {
            if !keep_running() {
                break;
            }
            last = Some(self.tick(dt));
        }
        last
    }
}

/// Number of frames covering `seconds` at `frame_rate`, capped at
/// [`MAX_RUN_FRAMES`].  `None` when there is nothing to run.
fn frame_budget(seconds: f32, frame_rate: f32) -> Option<u64> {
    if frame_rate.is_nan() || seconds.is_nan() || frame_rate <= 0.0 || seconds <= 0.0 {
        return None;
    }
    let frames = f64::from(seconds) * f64::from(frame_rate);
    if frames >= MAX_RUN_FRAMES as f64 {
        warn!(seconds, frame_rate, cap = MAX_RUN_FRAMES, "run length capped");
        return Some(MAX_RUN_FRAMES);
    }
    Some(frames.round() as u64)
}
