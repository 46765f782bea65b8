// src/gfx/rendering/mod.rs
//! Frame rendering
//!
//! [`RenderEngine`] owns the wgpu device and draws a [`Scene`] through four
//! pipelines: shadow depth, skybox, PBR and helper lines. Applications talk
//! to it through the [`FrameRenderer`] trait so they can be driven without a
//! GPU.
//!
//! [`Scene`]: crate::gfx::scene::Scene

pub mod error;
pub mod frame;
pub mod pipeline_manager;
pub mod render_engine;
pub mod settings;

// Re-export main types
pub use error::RenderError;
pub use frame::{FrameInput, FrameRenderer};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use settings::{OutputSurface, RendererSettings, ShadowMapSettings, ShadowMapType, ToneMapping};
