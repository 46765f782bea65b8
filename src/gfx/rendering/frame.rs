//! The seam between the application context and whatever draws its frames

use crate::gfx::{camera::PerspectiveCamera, scene::Scene};

use super::{
    error::RenderError,
    settings::{OutputSurface, RendererSettings},
};

/// Everything a renderer needs to produce one frame
pub struct FrameInput<'a> {
    /// Mutable so the renderer can attach GPU state and consume
    /// `needs_update` flags
    pub scene: &'a mut Scene,
    pub camera: &'a PerspectiveCamera,
    pub settings: &'a RendererSettings,
    pub surface: OutputSurface,
}

/// Draws one frame of a scene
pub trait FrameRenderer {
    fn draw_frame(&mut self, frame: &mut FrameInput<'_>) -> Result<(), RenderError>;
}
