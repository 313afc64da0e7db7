//! `wayguide-hal` – collaborator boundary of the navigation core.
//!
//! The core never talks to the engine, the tracking stack, or the UI
//! directly.  Everything it consumes is expressed as a trait here and
//! injected at construction time.
//!
//! # Modules
//!
//! - [`pose_source`] – [`PoseSource`]: raw per-frame device pose.
//! - [`agent`] – [`PathfindingAgent`]: navigation-mesh agent that plans and
//!   follows paths for the autonomous guide.
//! - [`provider`] – [`DestinationProvider`] and [`UserPoseProvider`].
//! - [`presentation`] – [`Presentation`]: on/off guidance visuals.
//! - [`sim`] – in-process simulated drivers for headless runs and tests.

pub mod agent;
pub mod pose_source;
pub mod presentation;
pub mod provider;
pub mod sim;

pub use agent::PathfindingAgent;
pub use pose_source::PoseSource;
pub use presentation::Presentation;
pub use provider::{DestinationProvider, UserPoseProvider};
