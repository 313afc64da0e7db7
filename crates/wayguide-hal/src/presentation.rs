//! Generic `Presentation` trait for on/off guidance visuals (the static path
//! line, the guide agent's avatar, …).

/// A guidance visual that can be shown or hidden.
pub trait Presentation {
    /// Stable identifier, e.g. `"path_line"`.
    fn id(&self) -> &str;

    /// Show (`true`) or hide (`false`) the visual.
    fn set_active(&mut self, active: bool);

    fn is_active(&self) -> bool;
}
