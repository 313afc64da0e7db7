//! Generic `PathfindingAgent` trait for the autonomous guide's locomotion.
//!
//! The guide never plans paths itself.  A navigation-mesh agent (engine
//! provided, or [`SimPathfindingAgent`][crate::sim::SimPathfindingAgent] in
//! headless runs) owns path computation and reports how far it still has to
//! go.  The navigator only issues destinations and reads progress back.

use wayguide_types::Vec3;

/// A path-following agent on a navigable surface.
pub trait PathfindingAgent {
    /// Request a path toward `position`.  Replaces any previous destination.
    fn set_destination(&mut self, position: Vec3);

    /// `true` while a requested path is still being computed.
    fn is_path_pending(&self) -> bool;

    /// Distance left along the current path, in metres.
    fn remaining_distance(&self) -> f32;

    /// Distance from the destination at which the agent brakes to a halt.
    fn stopping_distance(&self) -> f32;

    /// Halt path following.  Only meaningful while
    /// [`is_on_navigable_surface`][Self::is_on_navigable_surface] is `true`.
    fn stop(&mut self);

    /// Clear the stop flag so the agent follows its path again.
    fn resume(&mut self);

    /// `true` when the agent is placed on a navigable surface.
    fn is_on_navigable_surface(&self) -> bool;

    /// Current world position of the agent.
    fn position(&self) -> Vec3;

    /// Advance locomotion by `dt` seconds.
    ///
    /// Engines that move their agents themselves leave this as a no-op.
    fn advance(&mut self, _dt: f32) {}
}
