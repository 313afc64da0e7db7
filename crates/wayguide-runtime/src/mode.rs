//! [`ModeCoordinator`] – single authority over which guidance presentation
//! is live.
//!
//! | Mode                              | Path line | Guide agent                   |
//! |-----------------------------------|-----------|-------------------------------|
//! | [`PresentationMode::Manual`]      | shown     | hidden, stopped, suspended    |
//! | [`PresentationMode::Autonomous`]  | hidden    | shown, started if navigating  |
//!
//! Visibility flags are only ever written by [`ModeCoordinator::set_mode`],
//! so the two presentations can never be active in the same frame.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wayguide_hal::{DestinationProvider, PathfindingAgent, Presentation};
use wayguide_types::GuideError;

use crate::navigator::{AgentState, AutonomousNavigator};

/// Which destination-guidance visualization is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresentationMode {
    /// Static path visualization; the user walks alone.
    #[default]
    Manual,
    /// The guide agent leads the way.
    Autonomous,
}

impl fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentationMode::Manual => write!(f, "manual"),
            PresentationMode::Autonomous => write!(f, "autonomous"),
        }
    }
}

impl FromStr for PresentationMode {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" | "path" => Ok(PresentationMode::Manual),
            "autonomous" | "agent" => Ok(PresentationMode::Autonomous),
            other => Err(GuideError::Config(format!("unknown presentation mode '{other}'"))),
        }
    }
}

/// Arbitrates between the static path visualization and the
/// [`AutonomousNavigator`].
pub struct ModeCoordinator<A: PathfindingAgent> {
    mode: PresentationMode,
    navigator: AutonomousNavigator<A>,
    path_line: Box<dyn Presentation>,
    agent_avatar: Box<dyn Presentation>,
    session: Box<dyn DestinationProvider>,
}

impl<A: PathfindingAgent> ModeCoordinator<A> {
    /// Wire the coordinator and put everything into [`PresentationMode::Manual`].
    ///
    /// `session` reports whether a destination-navigation session is in
    /// progress; it is normally a clone of the navigator's destination
    /// provider.
    pub fn new(
        navigator: AutonomousNavigator<A>,
        path_line: Box<dyn Presentation>,
        agent_avatar: Box<dyn Presentation>,
        session: Box<dyn DestinationProvider>,
    ) -> Self {
        let mut coordinator = Self {
            mode: PresentationMode::Manual,
            navigator,
            path_line,
            agent_avatar,
            session,
        };
        coordinator.enter_manual();
        coordinator
    }

    pub fn mode(&self) -> PresentationMode {
        self.mode
    }

    pub fn navigator(&self) -> &AutonomousNavigator<A> {
        &self.navigator
    }

    pub fn is_static_visualization_active(&self) -> bool {
        self.path_line.is_active()
    }

    pub fn is_agent_active(&self) -> bool {
        self.agent_avatar.is_active() && self.navigator.is_active()
    }

    /// Switch presentation.  Calling it again with the current mode
    /// re-asserts visibility without restarting the agent's errand.
    pub fn set_mode(&mut self, mode: PresentationMode) {
        let previous = self.mode;
        self.mode = mode;
        if previous != mode {
            info!(%previous, %mode, "presentation mode changed");
        }

        match mode {
            PresentationMode::Manual => self.enter_manual(),
            PresentationMode::Autonomous => {
                self.path_line.set_active(false);
                self.agent_avatar.set_active(true);
                self.navigator.activate();

                if previous != PresentationMode::Autonomous && self.session.is_navigating() {
                    if let Err(e) = self.navigator.start() {
                        debug!(error = %e, "autonomous mode entered without a usable destination");
                    }
                }
            }
        }
    }

    /// Map a UI toggle (`true` = guide agent) onto [`set_mode`][Self::set_mode].
    pub fn on_toggle_changed(&mut self, autonomous: bool) {
        self.set_mode(if autonomous {
            PresentationMode::Autonomous
        } else {
            PresentationMode::Manual
        });
    }

    /// React to a newly selected destination.
    ///
    /// In autonomous mode the errand restarts toward the new target whatever
    /// the agent was doing.  In manual mode this is a no-op.
    ///
    /// # Errors
    ///
    /// Propagates [`GuideError::MissingDestination`] from the navigator.
    pub fn on_destination_changed(&mut self) -> Result<(), GuideError> {
        match self.mode {
            PresentationMode::Autonomous => self.navigator.start(),
            PresentationMode::Manual => Ok(()),
        }
    }

    /// Per-frame navigation evaluation.
    pub fn update(&mut self, dt: f32) -> AgentState {
        self.navigator.update(dt)
    }

    fn enter_manual(&mut self) {
        self.path_line.set_active(true);
        self.agent_avatar.set_active(false);
        self.navigator.deactivate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::NavigatorConfig;
    use wayguide_hal::sim::{SharedDestination, SimPresentation, SimRig};
    use wayguide_types::{NavigationTarget, Vec3};

    struct Harness {
        coordinator: ModeCoordinator<wayguide_hal::sim::SimPathfindingAgent>,
        destination: SharedDestination,
        path_line: SimPresentation,
        avatar: SimPresentation,
    }

    fn harness() -> Harness {
        let parts = SimRig::new().with_agent_speed(2.0).build();
        let navigator = AutonomousNavigator::new(
            NavigatorConfig::default(),
            parts.agent,
            Box::new(parts.destination.clone()),
            Box::new(parts.user.clone()),
        );
        let coordinator = ModeCoordinator::new(
            navigator,
            Box::new(parts.path_line.clone()),
            Box::new(parts.agent_avatar.clone()),
            Box::new(parts.destination.clone()),
        );
        Harness {
            coordinator,
            destination: parts.destination,
            path_line: parts.path_line,
            avatar: parts.agent_avatar,
        }
    }

    fn gate() -> NavigationTarget {
        NavigationTarget::new("Gate 12", Vec3::new(0.0, 0.0, 20.0))
    }

    fn assert_exclusive(h: &Harness) {
        assert_ne!(
            h.path_line.is_active(),
            h.avatar.is_active(),
            "exactly one presentation must be active"
        );
        assert_ne!(
            h.coordinator.is_static_visualization_active(),
            h.coordinator.is_agent_active()
        );
    }

    #[test]
    fn starts_in_manual_with_path_line_shown() {
        let h = harness();
        assert_eq!(h.coordinator.mode(), PresentationMode::Manual);
        assert!(h.path_line.is_active());
        assert!(!h.avatar.is_active());
        assert!(!h.coordinator.navigator().is_active());
    }

    #[test]
    fn presentations_never_both_active() {
        let mut h = harness();
        let sequence = [
            PresentationMode::Autonomous,
            PresentationMode::Autonomous,
            PresentationMode::Manual,
            PresentationMode::Autonomous,
            PresentationMode::Manual,
            PresentationMode::Manual,
        ];
        for mode in sequence {
            h.coordinator.set_mode(mode);
            assert_eq!(h.coordinator.mode(), mode);
            assert_exclusive(&h);
            h.coordinator.update(1.0 / 60.0);
            assert_exclusive(&h);
        }
    }

    #[test]
    fn entering_autonomous_while_navigating_starts_agent() {
        let mut h = harness();
        h.destination.select(gate());
        h.coordinator.set_mode(PresentationMode::Autonomous);
        assert_eq!(h.coordinator.navigator().state(), AgentState::ToDestination);
    }

    #[test]
    fn entering_autonomous_without_session_stays_idle() {
        let mut h = harness();
        h.coordinator.set_mode(PresentationMode::Autonomous);
        assert_eq!(h.coordinator.navigator().state(), AgentState::Idle);
        assert!(h.avatar.is_active());
    }

    #[test]
    fn entering_manual_stops_agent() {
        let mut h = harness();
        h.destination.select(gate());
        h.coordinator.set_mode(PresentationMode::Autonomous);
        h.coordinator.set_mode(PresentationMode::Manual);
        assert_eq!(h.coordinator.navigator().state(), AgentState::Idle);
        assert!(h.coordinator.navigator().agent().is_stopped());
    }

    #[test]
    fn destination_change_restarts_from_any_state() {
        let mut h = harness();
        h.destination
            .select(NavigationTarget::new("Near", Vec3::new(1.0, 0.0, 0.0)));
        h.coordinator.set_mode(PresentationMode::Autonomous);

        // Agent spawns 0.5 m from the user, so it is already within the
        // arrival radius of "Near".
        assert_eq!(h.coordinator.update(0.1), AgentState::WaitingAtDestination);

        h.destination.select(gate());
        h.coordinator.on_destination_changed().unwrap();
        let nav = h.coordinator.navigator();
        assert_eq!(nav.state(), AgentState::ToDestination);
        assert_eq!(nav.current_target().unwrap().name, "Gate 12");
        assert_eq!(nav.agent().destination(), Some(Vec3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn destination_change_restarts_while_returning() {
        let mut h = harness();
        h.destination
            .select(NavigationTarget::new("Near", Vec3::new(1.0, 0.0, 0.0)));
        h.coordinator.set_mode(PresentationMode::Autonomous);
        h.coordinator.update(0.1);
        h.coordinator.update(2.5);
        assert_eq!(h.coordinator.navigator().state(), AgentState::ReturningToUser);

        h.destination.select(gate());
        h.coordinator.on_destination_changed().unwrap();
        assert_eq!(h.coordinator.navigator().state(), AgentState::ToDestination);
    }

    #[test]
    fn destination_change_in_manual_is_ignored() {
        let mut h = harness();
        h.destination.select(gate());
        h.coordinator.on_destination_changed().unwrap();
        assert_eq!(h.coordinator.navigator().state(), AgentState::Idle);
        assert_eq!(h.coordinator.navigator().agent().command_count(), 0);
    }

    #[test]
    fn destination_cleared_in_autonomous_reports_missing() {
        let mut h = harness();
        h.coordinator.set_mode(PresentationMode::Autonomous);
        assert_eq!(
            h.coordinator.on_destination_changed(),
            Err(GuideError::MissingDestination)
        );
        assert_eq!(h.coordinator.navigator().state(), AgentState::Idle);
    }

    #[test]
    fn repeated_autonomous_does_not_restart_errand() {
        let mut h = harness();
        h.destination
            .select(NavigationTarget::new("Near", Vec3::new(1.0, 0.0, 0.0)));
        h.coordinator.set_mode(PresentationMode::Autonomous);
        h.coordinator.update(0.1);
        assert_eq!(h.coordinator.navigator().state(), AgentState::WaitingAtDestination);

        h.coordinator.set_mode(PresentationMode::Autonomous);
        assert_eq!(h.coordinator.navigator().state(), AgentState::WaitingAtDestination);
    }

    #[test]
    fn toggle_maps_onto_modes() {
        let mut h = harness();
        h.coordinator.on_toggle_changed(true);
        assert_eq!(h.coordinator.mode(), PresentationMode::Autonomous);
        h.coordinator.on_toggle_changed(false);
        assert_eq!(h.coordinator.mode(), PresentationMode::Manual);
    }

    #[test]
    fn mode_parses_from_str() {
        assert_eq!("Autonomous".parse::<PresentationMode>(), Ok(PresentationMode::Autonomous));
        assert_eq!(" manual ".parse::<PresentationMode>(), Ok(PresentationMode::Manual));
        assert_eq!("agent".parse::<PresentationMode>(), Ok(PresentationMode::Autonomous));
        assert!("robot-dance".parse::<PresentationMode>().is_err());
    }
}
