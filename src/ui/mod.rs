//! # User Interface
//!
//! Dear ImGui debug panel for live-tuning the showcase.
//!
//! - [`UiManager`] - ImGui context, winit input and wgpu rendering
//! - [`DebugPanel`] - the data model of the panel: labelled controls bound
//!   to [`Param`]s, drawn each frame into [`PanelEvent`]s
//!
//! Input goes to the UI first. While the UI wants the mouse, camera
//! controls ignore it.

pub mod manager;
pub mod panel;

// Re-export main types
pub use manager::UiManager;
pub use panel::{
    Control, ControlId, ControlKind, DebugPanel, Hook, NumberRange, PanelEvent, Param, ParamValue,
};
