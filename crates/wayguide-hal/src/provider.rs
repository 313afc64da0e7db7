//! Destination and user-position providers.
//!
//! Both are owned by the host application (POI selection UI, AR camera rig)
//! and only read by the navigation core.

use wayguide_types::{NavigationTarget, Vec3};

/// Supplies the currently selected point of interest.
pub trait DestinationProvider {
    /// The selected destination, or `None` when nothing is selected.
    fn current_target(&self) -> Option<NavigationTarget>;

    /// `true` while a destination-navigation session is in progress.
    fn is_navigating(&self) -> bool {
        self.current_target().is_some()
    }
}

/// Supplies the user's live position for the return leg.
pub trait UserPoseProvider {
    fn current_user_position(&self) -> Vec3;
}
