//! CLI wiring: argument definitions, dispatch, telemetry, and actions.

pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod start;
pub mod telemetry;

pub use start::start;
