//! `wayguide-runtime` – Guidance orchestration
//!
//! Everything that runs once per rendered frame after the raw pose has been
//! sampled.
//!
//! # Modules
//!
//! - [`navigator`] – [`AutonomousNavigator`][navigator::AutonomousNavigator]:
//!   the guide agent's errand state machine (walk to the destination, wait
//!   there, come back to the user) on top of a
//!   [`PathfindingAgent`][wayguide_hal::PathfindingAgent].
//! - [`mode`] – [`ModeCoordinator`][mode::ModeCoordinator]:
//!   keeps exactly one of the static path line or the guide agent live and
//!   restarts the errand when the destination changes.
//! - [`frame_loop`] – [`FrameLoop`][frame_loop::FrameLoop]:
//!   samples the pose source, stabilizes it and evaluates navigation in a
//!   fixed order with a clamped frame delta.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export
//!   to Jaeger, Grafana Tempo, or any OTLP-compatible collector.

pub mod frame_loop;
pub mod mode;
pub mod navigator;
pub mod telemetry;

pub use frame_loop::{FrameLoop, FrameLoopConfig, FrameReport};
pub use mode::{ModeCoordinator, PresentationMode};
pub use navigator::{AgentState, AutonomousNavigator, NavigatorConfig};
pub use telemetry::{init_tracing, TracerProviderGuard};
