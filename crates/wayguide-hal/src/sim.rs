//! In-process simulation drivers for headless runs and tests.
//!
//! Every collaborator the navigation core talks to has a simulated stand-in
//! here.  Handles that the host must keep mutating after handing them to the
//! core ([`SharedDestination`], [`SharedUserPosition`], [`SimPoseSource`],
//! [`SimPresentation`]) are cheap `Rc` clones over the same state, so the
//! frame loop can own one copy while the shell or test holds another.
//!
//! [`SimRig`] assembles a complete set of drivers in one go.
//!
//! # Example
//!
//! ```rust
//! use wayguide_hal::sim::SimRig;
//! use wayguide_hal::{DestinationProvider, PathfindingAgent};
//! use wayguide_types::{NavigationTarget, Vec3};
//!
//! let rig = SimRig::new().with_user_at(Vec3::zero()).build();
//! rig.destination.select(NavigationTarget::new("Cafe", Vec3::new(0.0, 0.0, 8.0)));
//! assert!(rig.destination.is_navigating());
//! assert_eq!(rig.agent.position(), Vec3::new(0.5, 0.0, 0.0));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;
use wayguide_types::{NavigationTarget, Pose, Vec3};

use crate::agent::PathfindingAgent;
use crate::pose_source::PoseSource;
use crate::presentation::Presentation;
use crate::provider::{DestinationProvider, UserPoseProvider};

/// Destinations closer than this to the current one do not trigger a
/// re-plan (and therefore no path latency).
const REPLAN_EPSILON: f32 = 0.05;

// ────────────────────────────────────────────────────────────────────────────
// Shared providers
// ────────────────────────────────────────────────────────────────────────────

/// Host-owned destination selection.
#[derive(Debug, Clone, Default)]
pub struct SharedDestination {
    target: Rc<RefCell<Option<NavigationTarget>>>,
}

impl SharedDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a new destination, replacing the previous one.
    pub fn select(&self, target: NavigationTarget) {
        *self.target.borrow_mut() = Some(target);
    }

    /// End the navigation session.
    pub fn clear(&self) {
        *self.target.borrow_mut() = None;
    }
}

impl DestinationProvider for SharedDestination {
    fn current_target(&self) -> Option<NavigationTarget> {
        self.target.borrow().clone()
    }
}

/// Host-owned user position (normally the AR camera's position).
#[derive(Debug, Clone, Default)]
pub struct SharedUserPosition {
    position: Rc<Cell<Vec3>>,
}

impl SharedUserPosition {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: Rc::new(Cell::new(position)),
        }
    }

    pub fn set(&self, position: Vec3) {
        self.position.set(position);
    }

    pub fn get(&self) -> Vec3 {
        self.position.get()
    }
}

impl UserPoseProvider for SharedUserPosition {
    fn current_user_position(&self) -> Vec3 {
        self.position.get()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pose source
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct PoseScript {
    scripted: VecDeque<Pose>,
    last: Pose,
}

/// Simulated localization output.
///
/// Scripted poses queued with [`push`][Self::push] are replayed one per
/// frame.  Once the queue is empty the source reports the followed user
/// position (when created with [`following`][Self::following]) or repeats
/// the last pose.
#[derive(Debug, Clone, Default)]
pub struct SimPoseSource {
    script: Rc<RefCell<PoseScript>>,
    user: Option<SharedUserPosition>,
}

impl SimPoseSource {
    /// A source that reports `initial` until scripted otherwise.
    pub fn new(initial: Pose) -> Self {
        Self {
            script: Rc::new(RefCell::new(PoseScript {
                scripted: VecDeque::new(),
                last: initial,
            })),
            user: None,
        }
    }

    /// A source that tracks the user's position with identity orientation.
    pub fn following(user: SharedUserPosition) -> Self {
        let mut source = Self::new(Pose::at(user.get()));
        source.user = Some(user);
        source
    }

    /// Queue a pose to be reported on a future frame.
    pub fn push(&self, pose: Pose) {
        self.script.borrow_mut().scripted.push_back(pose);
    }

    /// Queue `frames` copies of `pose`, e.g. a sustained tracking glitch.
    pub fn push_repeated(&self, pose: Pose, frames: usize) {
        let mut script = self.script.borrow_mut();
        script.scripted.extend(std::iter::repeat_n(pose, frames));
    }

    /// Number of scripted poses not yet replayed.
    pub fn pending(&self) -> usize {
        self.script.borrow().scripted.len()
    }
}

impl PoseSource for SimPoseSource {
    fn current_pose(&mut self) -> Pose {
        let mut script = self.script.borrow_mut();
        let pose = match script.scripted.pop_front() {
            Some(pose) => pose,
            None => match &self.user {
                Some(user) => Pose::new(user.get(), script.last.orientation),
                None => script.last,
            },
        };
        script.last = pose;
        pose
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pathfinding agent
// ────────────────────────────────────────────────────────────────────────────

/// Straight-line kinematic agent on an unobstructed floor.
///
/// Paths are straight segments; a fresh destination takes
/// `path_latency_frames` calls to [`advance`][PathfindingAgent::advance]
/// before it resolves, modelling asynchronous path computation.
#[derive(Debug, Clone)]
pub struct SimPathfindingAgent {
    position: Vec3,
    destination: Option<Vec3>,
    speed: f32,
    stopping_distance: f32,
    path_latency_frames: u32,
    pending_frames: u32,
    stopped: bool,
    on_surface: bool,
    commands: u32,
}

impl SimPathfindingAgent {
    /// Walking-pace agent (1.4 m/s, 0.5 m stopping distance) at `position`.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            destination: None,
            speed: 1.4,
            stopping_distance: 0.5,
            path_latency_frames: 0,
            pending_frames: 0,
            stopped: false,
            on_surface: true,
            commands: 0,
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed.max(0.0);
        self
    }

    pub fn with_stopping_distance(mut self, distance: f32) -> Self {
        self.stopping_distance = distance.max(0.0);
        self
    }

    pub fn with_path_latency(mut self, frames: u32) -> Self {
        self.path_latency_frames = frames;
        self
    }

    /// Place the agent off the navigation mesh; stop requests are ignored.
    pub fn off_navigable_surface(mut self) -> Self {
        self.on_surface = false;
        self
    }

    /// Most recently requested destination.
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Total number of `set_destination` calls received.
    pub fn command_count(&self) -> u32 {
        self.commands
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl PathfindingAgent for SimPathfindingAgent {
    fn set_destination(&mut self, position: Vec3) {
        let replan = self
            .destination
            .is_none_or(|current| current.distance(position) > REPLAN_EPSILON);
        if replan {
            debug!(?position, latency = self.path_latency_frames, "sim agent planning path");
            self.pending_frames = self.path_latency_frames;
        }
        self.destination = Some(position);
        self.commands += 1;
    }

    fn is_path_pending(&self) -> bool {
        self.pending_frames > 0
    }

    fn remaining_distance(&self) -> f32 {
        match self.destination {
            Some(dest) => self.position.distance(dest),
            None => 0.0,
        }
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn stop(&mut self) {
        if self.on_surface {
            self.stopped = true;
        }
    }

    fn resume(&mut self) {
        self.stopped = false;
    }

    fn is_on_navigable_surface(&self) -> bool {
        self.on_surface
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn advance(&mut self, dt: f32) {
        if self.pending_frames > 0 {
            self.pending_frames -= 1;
            return;
        }
        if self.stopped || !self.on_surface {
            return;
        }
        let Some(dest) = self.destination else {
            return;
        };
        let travel = self.position.distance(dest) - self.stopping_distance;
        if travel <= 0.0 {
            return;
        }
        let step = (self.speed * dt.max(0.0)).min(travel);
        self.position = self.position.move_towards(dest, step);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Presentation
// ────────────────────────────────────────────────────────────────────────────

/// A guidance visual whose visibility can be observed through clones.
#[derive(Debug, Clone)]
pub struct SimPresentation {
    id: String,
    active: Rc<Cell<bool>>,
}

impl SimPresentation {
    /// Create a hidden presentation with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active: Rc::new(Cell::new(false)),
        }
    }
}

impl Presentation for SimPresentation {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_active(&mut self, active: bool) {
        self.active.set(active);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimRig builder
// ────────────────────────────────────────────────────────────────────────────

/// A complete set of simulated collaborators.
pub struct SimParts {
    pub pose_source: SimPoseSource,
    pub agent: SimPathfindingAgent,
    pub destination: SharedDestination,
    pub user: SharedUserPosition,
    pub path_line: SimPresentation,
    pub agent_avatar: SimPresentation,
}

/// Builder for [`SimParts`].
///
/// Defaults: user at the origin, agent spawned next to the user, no path
/// latency, nothing selected.
#[derive(Default)]
pub struct SimRig {
    user_position: Vec3,
    agent_offset: Option<Vec3>,
    agent_speed: Option<f32>,
    stopping_distance: Option<f32>,
    path_latency_frames: u32,
    destination: Option<NavigationTarget>,
}

impl SimRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_at(mut self, position: Vec3) -> Self {
        self.user_position = position;
        self
    }

    /// Spawn the agent at `offset` from the user.
    pub fn with_agent_offset(mut self, offset: Vec3) -> Self {
        self.agent_offset = Some(offset);
        self
    }

    pub fn with_agent_speed(mut self, speed: f32) -> Self {
        self.agent_speed = Some(speed);
        self
    }

    pub fn with_stopping_distance(mut self, distance: f32) -> Self {
        self.stopping_distance = Some(distance);
        self
    }

    pub fn with_path_latency(mut self, frames: u32) -> Self {
        self.path_latency_frames = frames;
        self
    }

    pub fn with_destination(mut self, target: NavigationTarget) -> Self {
        self.destination = Some(target);
        self
    }

    /// Consume the builder and return the wired drivers.
    pub fn build(self) -> SimParts {
        let user = SharedUserPosition::new(self.user_position);
        let destination = SharedDestination::new();
        if let Some(target) = self.destination {
            destination.select(target);
        }

        let spawn = self
            .user_position
            .add(self.agent_offset.unwrap_or(Vec3::new(0.5, 0.0, 0.0)));
        let mut agent = SimPathfindingAgent::new(spawn).with_path_latency(self.path_latency_frames);
        if let Some(speed) = self.agent_speed {
            agent = agent.with_speed(speed);
        }
        if let Some(distance) = self.stopping_distance {
            agent = agent.with_stopping_distance(distance);
        }

        SimParts {
            pose_source: SimPoseSource::following(user.clone()),
            agent,
            destination,
            user,
            path_line: SimPresentation::new("path_line"),
            agent_avatar: SimPresentation::new("agent_avatar"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
