// src/lib.rs
//! Helmet Showcase
//!
//! A physically-based 3D scene demo on wgpu and winit: a glTF model lit by
//! a shadow-casting directional light and an environment cubemap, with a
//! Dear ImGui panel for live tuning.

pub mod app;
pub mod assets;
pub mod config;
pub mod gfx;
pub mod prelude;
pub mod showcase;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ShowcaseApp;
pub use config::ShowcaseConfig;
pub use showcase::{Showcase, ShowcaseStats};

/// Creates the application from defaults and environment overrides
pub fn default() -> anyhow::Result<ShowcaseApp> {
    ShowcaseApp::new(ShowcaseConfig::from_env())
}
