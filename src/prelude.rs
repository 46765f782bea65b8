//! # Prelude
//!
//! Commonly used types in one import:
//!
//! ```no_run
//! use helmet_showcase::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ShowcaseConfig::from_env();
//!     ShowcaseApp::new(config)?.run()
//! }
//! ```

// Application
pub use crate::app::ShowcaseApp;
pub use crate::config::ShowcaseConfig;
pub use crate::showcase::{Showcase, ShowcaseStats};

// Assets
pub use crate::assets::{cube_texture::CubeTexture, AssetLoader, LoadError, LoadEvent};

// Graphics and scene types
pub use crate::gfx::camera::{OrbitControls, PerspectiveCamera};
pub use crate::gfx::rendering::{
    FrameInput, FrameRenderer, OutputSurface, RenderEngine, RenderError, RendererSettings,
    ToneMapping,
};
pub use crate::gfx::resources::{BasicMaterial, Material, StandardMaterial};
pub use crate::gfx::scene::{DirectionalLight, NodeId, NodeKind, Scene, SceneNode, Transform};

// Debug panel
pub use crate::ui::{DebugPanel, PanelEvent, Param, ParamValue};

// Common external types
pub use cgmath::{Point3, Vector3};
