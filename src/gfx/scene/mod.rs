//! # Scene Graph
//!
//! Node hierarchy, meshes, lights and vertex formats.
//!
//! - [`Scene`] - root container addressed by [`NodeId`], plus background and
//!   environment cubemaps
//! - [`SceneNode`] - a named node with a [`Transform`], a [`NodeKind`] and
//!   owned children
//! - [`MeshNode`] - geometry and material of a drawable node
//! - [`DirectionalLight`] / [`CameraHelper`] - the shadow-casting light and
//!   the outline of its shadow volume

pub mod light;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use light::{CameraHelper, DirectionalLight, ShadowCamera};
pub use mesh::{DrawMesh, Mesh, MeshNode};
pub use node::{NodeKind, SceneNode, Transform};
pub use scene::{NodeId, Scene};
pub use vertex::{LineVertex, Vertex3D};
