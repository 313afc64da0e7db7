//! Simulated guidance session driven by the shell.
//!
//! Wires a [`SimRig`] into the full runtime stack (stabilizer, navigator,
//! coordinator, frame loop) and exposes the handful of operations the REPL
//! needs.  Time only advances through [`Session::run`].

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use wayguide_hal::PathfindingAgent;
use wayguide_hal::sim::{SharedDestination, SharedUserPosition, SimPathfindingAgent, SimRig};
use wayguide_perception::PoseStabilizer;
use wayguide_runtime::{
    AutonomousNavigator, FrameLoop, FrameReport, ModeCoordinator, PresentationMode,
};
use wayguide_types::{GuideError, NavigationTarget, Vec3};

use crate::config::Config;

pub struct Session {
    frames: FrameLoop<SimPathfindingAgent>,
    destination: SharedDestination,
    user: SharedUserPosition,
    frame_rate: f32,
    last_report: Option<FrameReport>,
}

impl Session {
    /// Build the simulated stack and apply the configured initial mode.
    pub fn new(cfg: &Config) -> Self {
        let parts = SimRig::new().build();
        let navigator = AutonomousNavigator::new(
            cfg.navigator.clone(),
            parts.agent,
            Box::new(parts.destination.clone()),
            Box::new(parts.user.clone()),
        );
        let mut coordinator = ModeCoordinator::new(
            navigator,
            Box::new(parts.path_line),
            Box::new(parts.agent_avatar),
            Box::new(parts.destination.clone()),
        );
        coordinator.set_mode(cfg.session.initial_mode);

        let frames = FrameLoop::new(
            cfg.session.frame_loop(),
            Box::new(parts.pose_source),
            PoseStabilizer::new(cfg.stabilizer.clone()),
            coordinator,
        );
        info!(mode = %cfg.session.initial_mode, "simulated session ready");

        Self {
            frames,
            destination: parts.destination,
            user: parts.user,
            frame_rate: cfg.session.frame_rate,
            last_report: None,
        }
    }

    pub fn mode(&self) -> PresentationMode {
        self.frames.coordinator().mode()
    }

    pub fn set_mode(&mut self, mode: PresentationMode) {
        self.frames.coordinator_mut().set_mode(mode);
    }

    /// Select a destination and let the coordinator react to it.
    pub fn select_destination(&mut self, target: NavigationTarget) -> Result<(), GuideError> {
        self.destination.select(target);
        self.frames.coordinator_mut().on_destination_changed()
    }

    /// Drop the current destination.  The guide agent keeps whatever errand
    /// it is on.
    pub fn clear_destination(&mut self) {
        self.destination.clear();
    }

    pub fn move_user(&mut self, position: Vec3) {
        self.user.set(position);
    }

    /// Advance simulated time by `seconds` at the configured frame rate.
    /// Stops early once `cancel` is set.
    pub fn run(&mut self, seconds: f32, cancel: &AtomicBool) -> Option<FrameReport> {
        let report = self
            .frames
            .run_while(seconds, self.frame_rate, || !cancel.load(Ordering::SeqCst));
        if report.is_some() {
            self.last_report = report;
        }
        report
    }

    pub fn status(&self) -> Status {
        let coordinator = self.frames.coordinator();
        let navigator = coordinator.navigator();
        Status {
            mode: coordinator.mode(),
            path_line_visible: coordinator.is_static_visualization_active(),
            agent_visible: coordinator.is_agent_active(),
            agent_state: navigator.state(),
            agent_position: navigator.agent().position(),
            target: navigator.current_target().cloned(),
            wait_remaining: navigator.wait_remaining(),
            user_position: self.user.get(),
            frames: self.frames.frame_count(),
            last_report: self.last_report,
        }
    }
}

/// Read-only snapshot for `/status`.
#[derive(Debug, Clone)]
pub struct Status {
    pub mode: PresentationMode,
    pub path_line_visible: bool,
    pub agent_visible: bool,
    pub agent_state: wayguide_runtime::AgentState,
    pub agent_position: Vec3,
    pub target: Option<NavigationTarget>,
    pub wait_remaining: Option<f32>,
    pub user_position: Vec3,
    pub frames: u64,
    pub last_report: Option<FrameReport>,
}
