use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Perspective camera looking from `position` at `target`.
///
/// The projection matrix is cached; call [`update_projection_matrix`]
/// after changing `fov_y`, `aspect`, `near` or `far`.
///
/// [`update_projection_matrix`]: PerspectiveCamera::update_projection_matrix
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view
    pub fov_y: Deg<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        let mut camera = Self::new(Deg(75.0), 1.0, 0.1, 100.0);
        camera.position = Point3::new(4.0, 1.0, -4.0);
        camera
    }
}

impl PerspectiveCamera {
    pub fn new(fov_y: Deg<f32>, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Point3::new(0.0, 0.0, 1.0),
            target: Point3::origin(),
            up: Vector3::unit_y(),
            fov_y,
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Inverse view-projection, used to turn clip-space rays into world
    /// directions for the skybox
    pub fn inverse_view_projection_matrix(&self) -> Matrix4<f32> {
        self.view_projection_matrix()
            .invert()
            .unwrap_or_else(Matrix4::identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera() {
        let camera = PerspectiveCamera::default();
        assert_eq!(camera.position, Point3::new(4.0, 1.0, -4.0));
        assert_eq!(camera.fov_y, Deg(75.0));
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 100.0);
    }

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = PerspectiveCamera::default();
        let before = camera.projection_matrix();

        camera.aspect = 2.0;
        assert_eq!(camera.projection_matrix(), before);

        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), before);
        // x scale halves when the aspect doubles
        assert!((camera.projection_matrix().x.x * 2.0 - before.x.x).abs() < 1e-5);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let camera = PerspectiveCamera::default();
        let clip = camera.view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_projection_maps_view_depth_to_zero_one() {
        let camera = PerspectiveCamera::default();
        let projection = camera.projection_matrix();

        let clip = projection * Vector4::new(0.0, 0.0, -5.0, 1.0);
        assert!((clip.w - 5.0).abs() < 1e-5);

        let near = projection * Vector4::new(0.0, 0.0, -camera.near, 1.0);
        let far = projection * Vector4::new(0.0, 0.0, -camera.far, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);

        // 75 degree vertical field of view
        let edge = (Deg(37.5f32)).tan() * 5.0;
        let top = projection * Vector4::new(0.0, edge, -5.0, 1.0);
        assert!((top.y / top.w - 1.0).abs() < 1e-4);
    }
}
