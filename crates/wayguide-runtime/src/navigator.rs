//! [`AutonomousNavigator`] – "go, wait, come back" guide agent.
//!
//! Drives a [`PathfindingAgent`] through a four-state cycle:
//!
//! ```text
//!            start()                arrived               timer ≤ 0
//!   Idle ───────────► ToDestination ───────► WaitingAtDestination ───────► ReturningToUser
//!    ▲                                                                          │
//!    └──────────────────────────── arrived at user ─────────────────────────────┘
//!
//!   stop() from any state ──► Idle
//! ```
//!
//! The arrival test is the same on both legs:
//! `!path_pending && remaining ≤ stopping_distance + arrival_distance`.
//! While returning, the path command is refreshed every frame so the agent
//! homes in on a user who keeps walking.
//!
//! An unreachable or still-computing path is not an error: the navigator
//! stays in its current state and re-evaluates next frame.
//!
//! # Example
//!
//! ```rust
//! use wayguide_hal::sim::{SharedDestination, SharedUserPosition, SimPathfindingAgent};
//! use wayguide_runtime::navigator::{AgentState, AutonomousNavigator, NavigatorConfig};
//! use wayguide_types::{NavigationTarget, Vec3};
//!
//! let destination = SharedDestination::new();
//! let user = SharedUserPosition::new(Vec3::zero());
//! let mut nav = AutonomousNavigator::new(
//!     NavigatorConfig::default(),
//!     SimPathfindingAgent::new(Vec3::zero()),
//!     Box::new(destination.clone()),
//!     Box::new(user),
//! );
//!
//! // Nothing selected yet: start() is refused and the agent stays idle.
//! assert!(nav.start().is_err());
//! assert_eq!(nav.state(), AgentState::Idle);
//!
//! destination.select(NavigationTarget::new("Cafe", Vec3::new(0.0, 0.0, 6.0)));
//! nav.start().unwrap();
//! assert_eq!(nav.state(), AgentState::ToDestination);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use wayguide_hal::{DestinationProvider, PathfindingAgent, UserPoseProvider};
use wayguide_types::{GuideError, NavigationTarget};

// ─────────────────────────────────────────────────────────────────────────────
// State
// ─────────────────────────────────────────────────────────────────────────────

/// Phase of the guide agent's errand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AgentState {
    #[default]
    Idle,
    ToDestination,
    WaitingAtDestination,
    ReturningToUser,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentState::Idle => write!(f, "idle"),
            AgentState::ToDestination => write!(f, "to-destination"),
            AgentState::WaitingAtDestination => write!(f, "waiting-at-destination"),
            AgentState::ReturningToUser => write!(f, "returning-to-user"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Tuning for [`AutonomousNavigator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Slack added to the agent's stopping distance for the arrival test.
    pub arrival_distance: f32,
    /// Seconds the agent dwells at the destination before returning.
    pub wait_time_at_destination: f32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            arrival_distance: 1.0,
            wait_time_at_destination: 2.0,
        }
    }
}

impl NavigatorConfig {
    /// # Errors
    ///
    /// Returns [`GuideError::InvalidConfig`] for negative or non-finite
    /// values.
    pub fn validate(&self) -> Result<(), GuideError> {
        let fields = [
            ("arrival_distance", self.arrival_distance),
            ("wait_time_at_destination", self.wait_time_at_destination),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(GuideError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AutonomousNavigator
// ─────────────────────────────────────────────────────────────────────────────

/// State machine that sends a guide agent to the selected destination,
/// waits there, then walks back to fetch the user.
///
/// The [`PathfindingAgent`] is owned exclusively by the navigator; the
/// destination and user-position providers are read-only views of host
/// state.
pub struct AutonomousNavigator<A: PathfindingAgent> {
    config: NavigatorConfig,
    agent: A,
    destinations: Box<dyn DestinationProvider>,
    user: Box<dyn UserPoseProvider>,
    state: AgentState,
    wait_timer: f32,
    /// Destination most recently commanded by `start()`.
    target: Option<NavigationTarget>,
    active: bool,
}

impl<A: PathfindingAgent> AutonomousNavigator<A> {
    /// Create an active, idle navigator.
    pub fn new(
        config: NavigatorConfig,
        agent: A,
        destinations: Box<dyn DestinationProvider>,
        user: Box<dyn UserPoseProvider>,
    ) -> Self {
        Self {
            config,
            agent,
            destinations,
            user,
            state: AgentState::Idle,
            wait_timer: 0.0,
            target: None,
            active: true,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Seconds left to dwell, only while waiting at the destination.
    pub fn wait_remaining(&self) -> Option<f32> {
        (self.state == AgentState::WaitingAtDestination).then_some(self.wait_timer)
    }

    /// Destination of the current (or last) errand.
    pub fn current_target(&self) -> Option<&NavigationTarget> {
        self.target.as_ref()
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Begin (or restart) the errand toward the currently selected
    /// destination.
    ///
    /// The destination is re-read from the provider on every call, so a new
    /// selection always wins over an errand already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`GuideError::NavigatorInactive`] while deactivated and
    /// [`GuideError::MissingDestination`] when nothing is selected.  The
    /// navigator's state and the agent are left untouched in both cases.
    pub fn start(&mut self) -> Result<(), GuideError> {
        if !self.active {
            debug!("guide agent is deactivated, ignoring start");
            return Err(GuideError::NavigatorInactive);
        }
        let Some(target) = self.destinations.current_target() else {
            warn!("guide agent cannot start: no destination selected");
            return Err(GuideError::MissingDestination);
        };

        self.agent.set_destination(target.position);
        self.agent.resume();
        self.state = AgentState::ToDestination;
        info!(destination = %target.name, "guide agent heading to destination");
        self.target = Some(target);
        Ok(())
    }

    /// Halt the agent and return to [`AgentState::Idle`].  Safe from any
    /// state.
    pub fn stop(&mut self) {
        if self.agent.is_on_navigable_surface() {
            self.agent.stop();
        }
        if self.state != AgentState::Idle {
            info!(from = %self.state, "guide agent stopped");
        }
        self.state = AgentState::Idle;
        self.wait_timer = 0.0;
    }

    /// Resume per-frame evaluation after [`deactivate`][Self::deactivate].
    /// The navigator comes back idle.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Stop the agent and suspend per-frame evaluation.
    pub fn deactivate(&mut self) {
        self.stop();
        self.active = false;
    }

    /// Advance the agent's locomotion by `dt` seconds and evaluate the state
    /// machine once.  Returns the state after this frame.
    pub fn update(&mut self, dt: f32) -> AgentState {
        if !self.active {
            return self.state;
        }
        let dt = dt.max(0.0);
        self.agent.advance(dt);

        match self.state {
            AgentState::Idle => {}
            AgentState::ToDestination => {
                if self.has_arrived() {
                    self.state = AgentState::WaitingAtDestination;
                    self.wait_timer = self.config.wait_time_at_destination;
                    info!(
                        destination = %self.target_name(),
                        wait_s = self.wait_timer,
                        "guide agent arrived, waiting"
                    );
                }
            }
            AgentState::WaitingAtDestination => {
                self.wait_timer -= dt;
                if self.wait_timer <= 0.0 {
                    self.state = AgentState::ReturningToUser;
                    info!("guide agent returning to user");
                    self.head_to_user();
                }
            }
            AgentState::ReturningToUser => {
                self.head_to_user();
                if self.has_arrived() {
                    self.state = AgentState::Idle;
                    info!("guide agent back with user");
                }
            }
        }

        self.state
    }

    fn has_arrived(&self) -> bool {
        !self.agent.is_path_pending()
            && self.agent.remaining_distance()
                <= self.agent.stopping_distance() + self.config.arrival_distance
    }

    fn head_to_user(&mut self) {
        let user = self.user.current_user_position();
        debug!(x = user.x, y = user.y, z = user.z, "refreshing return path");
        self.agent.set_destination(user);
        self.agent.resume();
    }

    fn target_name(&self) -> &str {
        self.target.as_ref().map_or("<none>", |t| t.name.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use wayguide_hal::sim::{SharedDestination, SharedUserPosition, SimPathfindingAgent};
    use wayguide_types::Vec3;

    /// Observable state of [`ScriptedAgent`], driven directly by the tests.
    #[derive(Debug)]
    struct AgentLog {
        pending: bool,
        remaining: f32,
        stopping: f32,
        on_surface: bool,
        stopped: bool,
        commands: Vec<Vec3>,
    }

    impl Default for AgentLog {
        fn default() -> Self {
            Self {
                pending: false,
                remaining: 100.0,
                stopping: 0.5,
                on_surface: true,
                stopped: false,
                commands: Vec::new(),
            }
        }
    }

    #[derive(Clone, Default)]
    struct ScriptedAgent(Rc<RefCell<AgentLog>>);

    impl PathfindingAgent for ScriptedAgent {
        fn set_destination(&mut self, position: Vec3) {
            self.0.borrow_mut().commands.push(position);
        }

        fn is_path_pending(&self) -> bool {
            self.0.borrow().pending
        }

        fn remaining_distance(&self) -> f32 {
            self.0.borrow().remaining
        }

        fn stopping_distance(&self) -> f32 {
            self.0.borrow().stopping
        }

        fn stop(&mut self) {
            self.0.borrow_mut().stopped = true;
        }

        fn resume(&mut self) {
            self.0.borrow_mut().stopped = false;
        }

        fn is_on_navigable_surface(&self) -> bool {
            self.0.borrow().on_surface
        }

        fn position(&self) -> Vec3 {
            Vec3::zero()
        }
    }

    struct Harness {
        nav: AutonomousNavigator<ScriptedAgent>,
        log: Rc<RefCell<AgentLog>>,
        destination: SharedDestination,
        user: SharedUserPosition,
    }

    fn harness() -> Harness {
        let agent = ScriptedAgent::default();
        let log = Rc::clone(&agent.0);
        let destination = SharedDestination::new();
        let user = SharedUserPosition::new(Vec3::zero());
        let nav = AutonomousNavigator::new(
            NavigatorConfig::default(),
            agent,
            Box::new(destination.clone()),
            Box::new(user.clone()),
        );
        Harness {
            nav,
            log,
            destination,
            user,
        }
    }

    fn cafe() -> NavigationTarget {
        NavigationTarget::new("Cafe", Vec3::new(0.0, 0.0, 10.0))
    }

    /// Drive the harness into `WaitingAtDestination`.
    fn arrive(h: &mut Harness) {
        h.destination.select(cafe());
        h.nav.start().unwrap();
        h.log.borrow_mut().remaining = 1.0;
        assert_eq!(h.nav.update(0.1), AgentState::WaitingAtDestination);
    }

    #[test]
    fn start_without_destination_is_noop() {
        let mut h = harness();
        assert_eq!(h.nav.start(), Err(GuideError::MissingDestination));
        assert_eq!(h.nav.state(), AgentState::Idle);
        assert!(h.log.borrow().commands.is_empty());
        assert!(h.nav.current_target().is_none());
    }

    #[test]
    fn start_commands_agent_toward_target() {
        let mut h = harness();
        h.log.borrow_mut().stopped = true;
        h.destination.select(cafe());

        h.nav.start().unwrap();
        assert_eq!(h.nav.state(), AgentState::ToDestination);
        assert_eq!(h.log.borrow().commands, vec![Vec3::new(0.0, 0.0, 10.0)]);
        assert!(!h.log.borrow().stopped, "start must clear the stop flag");
        assert_eq!(h.nav.current_target().unwrap().name, "Cafe");
    }

    #[test]
    fn idle_update_issues_no_commands() {
        let mut h = harness();
        for _ in 0..10 {
            assert_eq!(h.nav.update(0.1), AgentState::Idle);
        }
        assert!(h.log.borrow().commands.is_empty());
    }

    #[test]
    fn pending_path_blocks_arrival() {
        let mut h = harness();
        h.destination.select(cafe());
        h.nav.start().unwrap();
        {
            let mut log = h.log.borrow_mut();
            log.pending = true;
            log.remaining = 0.0;
        }
        assert_eq!(h.nav.update(0.1), AgentState::ToDestination);
        h.log.borrow_mut().pending = false;
        assert_eq!(h.nav.update(0.1), AgentState::WaitingAtDestination);
    }

    #[test]
    fn arrival_uses_stopping_distance_plus_slack() {
        let mut h = harness();
        h.destination.select(cafe());
        h.nav.start().unwrap();

        // stopping 0.5 + arrival 1.0 = 1.5
        h.log.borrow_mut().remaining = 1.6;
        assert_eq!(h.nav.update(0.1), AgentState::ToDestination);
        h.log.borrow_mut().remaining = 1.5;
        assert_eq!(h.nav.update(0.1), AgentState::WaitingAtDestination);
        assert_eq!(h.nav.wait_remaining(), Some(2.0));
    }

    #[test]
    fn wait_expiry_issues_one_command_toward_user() {
        let mut h = harness();
        arrive(&mut h);
        h.user.set(Vec3::new(3.0, 0.0, -1.0));
        let before = h.log.borrow().commands.len();

        for _ in 0..3 {
            assert_eq!(h.nav.update(0.5), AgentState::WaitingAtDestination);
        }
        assert_eq!(h.log.borrow().commands.len(), before, "no commands while waiting");

        h.log.borrow_mut().remaining = 20.0;
        assert_eq!(h.nav.update(0.5), AgentState::ReturningToUser);
        let log = h.log.borrow();
        assert_eq!(log.commands.len(), before + 1);
        assert_eq!(log.commands.last(), Some(&Vec3::new(3.0, 0.0, -1.0)));
    }

    #[test]
    fn return_leg_follows_moving_user() {
        let mut h = harness();
        arrive(&mut h);
        h.log.borrow_mut().remaining = 20.0;
        h.nav.update(2.0);
        assert_eq!(h.nav.state(), AgentState::ReturningToUser);

        h.user.set(Vec3::new(1.0, 0.0, 1.0));
        h.nav.update(0.1);
        assert_eq!(h.log.borrow().commands.last(), Some(&Vec3::new(1.0, 0.0, 1.0)));

        h.user.set(Vec3::new(2.0, 0.0, 2.0));
        h.nav.update(0.1);
        assert_eq!(h.log.borrow().commands.last(), Some(&Vec3::new(2.0, 0.0, 2.0)));
        assert_eq!(h.nav.state(), AgentState::ReturningToUser);
    }

    #[test]
    fn return_leg_ends_idle_on_arrival() {
        let mut h = harness();
        arrive(&mut h);
        h.log.borrow_mut().remaining = 20.0;
        h.nav.update(2.0);
        h.log.borrow_mut().remaining = 0.4;
        assert_eq!(h.nav.update(0.1), AgentState::Idle);
    }

    #[test]
    fn wait_remaining_only_while_waiting() {
        let mut h = harness();
        assert_eq!(h.nav.wait_remaining(), None);
        arrive(&mut h);
        h.nav.update(0.5);
        let left = h.nav.wait_remaining().unwrap();
        assert!((left - 1.5).abs() < 1e-5);
    }

    #[test]
    fn stop_from_any_state_returns_idle() {
        let mut h = harness();
        h.nav.stop(); // from Idle
        assert_eq!(h.nav.state(), AgentState::Idle);

        arrive(&mut h);
        h.nav.stop();
        assert_eq!(h.nav.state(), AgentState::Idle);
        assert!(h.log.borrow().stopped);
        assert_eq!(h.nav.wait_remaining(), None);
    }

    #[test]
    fn stop_skips_agent_off_navigable_surface() {
        let mut h = harness();
        h.destination.select(cafe());
        h.nav.start().unwrap();
        h.log.borrow_mut().on_surface = false;
        h.nav.stop();
        assert_eq!(h.nav.state(), AgentState::Idle);
        assert!(!h.log.borrow().stopped);
    }

    #[test]
    fn restart_mid_errand_targets_new_destination() {
        let mut h = harness();
        arrive(&mut h);
        h.destination
            .select(NavigationTarget::new("Lift", Vec3::new(-4.0, 0.0, 2.0)));
        h.nav.start().unwrap();
        assert_eq!(h.nav.state(), AgentState::ToDestination);
        assert_eq!(h.log.borrow().commands.last(), Some(&Vec3::new(-4.0, 0.0, 2.0)));
        assert_eq!(h.nav.current_target().unwrap().name, "Lift");
    }

    #[test]
    fn deactivated_navigator_does_not_evaluate() {
        let mut h = harness();
        h.destination.select(cafe());
        h.nav.start().unwrap();
        h.nav.deactivate();
        assert!(!h.nav.is_active());
        assert_eq!(h.nav.state(), AgentState::Idle);

        h.log.borrow_mut().remaining = 0.0;
        assert_eq!(h.nav.update(0.1), AgentState::Idle, "frozen while inactive");
        h.nav.activate();
        assert_eq!(h.nav.update(0.1), AgentState::Idle);
    }

    #[test]
    fn deactivated_navigator_refuses_start() {
        let mut h = harness();
        h.nav.deactivate();
        assert!(h.log.borrow().stopped);
        h.destination.select(cafe());

        assert_eq!(h.nav.start(), Err(GuideError::NavigatorInactive));
        assert_eq!(h.nav.state(), AgentState::Idle);
        assert!(h.log.borrow().commands.is_empty(), "no path command while inactive");
        assert!(h.log.borrow().stopped, "agent must stay stopped");
        assert!(h.nav.current_target().is_none());

        h.nav.activate();
        h.nav.start().unwrap();
        assert_eq!(h.nav.state(), AgentState::ToDestination);
    }

    #[test]
    fn deactivated_sim_agent_stays_put() {
        let destination = SharedDestination::new();
        let mut nav = AutonomousNavigator::new(
            NavigatorConfig::default(),
            SimPathfindingAgent::new(Vec3::zero()),
            Box::new(destination.clone()),
            Box::new(SharedUserPosition::new(Vec3::zero())),
        );
        nav.deactivate();
        destination.select(cafe());

        assert!(nav.start().is_err());
        assert!(nav.agent().is_stopped());
        assert_eq!(nav.agent().destination(), None);
    }

    #[test]
    fn negative_dt_does_not_extend_wait() {
        let mut h = harness();
        arrive(&mut h);
        h.nav.update(-5.0);
        assert_eq!(h.nav.wait_remaining(), Some(2.0));
    }

    #[test]
    fn full_errand_with_simulated_agent() {
        let destination = SharedDestination::new();
        let user = SharedUserPosition::new(Vec3::zero());
        let agent = SimPathfindingAgent::new(Vec3::zero())
            .with_speed(2.0)
            .with_path_latency(3);
        let mut nav = AutonomousNavigator::new(
            NavigatorConfig {
                arrival_distance: 0.5,
                wait_time_at_destination: 1.0,
            },
            agent,
            Box::new(destination.clone()),
            Box::new(user.clone()),
        );

        destination.select(NavigationTarget::new("Kiosk", Vec3::new(0.0, 0.0, 10.0)));
        nav.start().unwrap();

        let dt = 1.0 / 30.0;
        let mut seen = vec![nav.state()];
        for frame in 0..900 {
            // The user strolls sideways while the agent is away.
            user.set(Vec3::new(frame as f32 * 0.002, 0.0, 0.0));
            let state = nav.update(dt);
            if seen.last() != Some(&state) {
                seen.push(state);
            }
            if state == AgentState::Idle {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                AgentState::ToDestination,
                AgentState::WaitingAtDestination,
                AgentState::ReturningToUser,
                AgentState::Idle,
            ]
        );
        // Arrival slack plus stopping distance, plus the user's drift since
        // the last re-plan.
        let gap = nav.agent().position().distance(user.get());
        assert!(gap <= 0.5 + 0.5 + 0.1, "agent ended {gap} m from the user");
    }

    #[test]
    fn config_validation() {
        assert!(NavigatorConfig::default().validate().is_ok());
        let bad = NavigatorConfig {
            wait_time_at_destination: f32::NAN,
            ..NavigatorConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn state_display_is_kebab_case() {
        assert_eq!(AgentState::WaitingAtDestination.to_string(), "waiting-at-destination");
        assert_eq!(AgentState::Idle.to_string(), "idle");
    }
}
