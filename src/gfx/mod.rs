//! # Graphics Module
//!
//! Camera, scene graph, GPU resources and the render engine.
//!
//! - **Camera** ([`camera`]) - perspective camera and damped orbit controls
//! - **Scene** ([`scene`]) - node hierarchy, meshes, the directional light
//! - **Resources** ([`resources`]) - materials, textures, global uniforms
//! - **Rendering** ([`rendering`]) - shadow-mapped PBR with tone mapping and
//!   an environment cubemap
//!
//! Scene data is plain CPU data until the [`RenderEngine`] first draws it;
//! GPU handles are created lazily on the main thread.

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{OrbitControls, PerspectiveCamera};
pub use rendering::RenderEngine;
