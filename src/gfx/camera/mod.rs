pub mod orbit_controls;
pub mod perspective_camera;

// Re-export main types
pub use orbit_controls::OrbitControls;
pub use perspective_camera::{PerspectiveCamera, OPENGL_TO_WGPU_MATRIX};
