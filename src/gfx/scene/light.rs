//! Directional light, its shadow camera and the shadow camera helper

use cgmath::*;

use crate::gfx::camera::OPENGL_TO_WGPU_MATRIX;

use super::vertex::LineVertex;

/// Converts a `0xRRGGBB` sRGB color to linear RGB
pub fn color_from_hex(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| {
        let c = ((hex >> shift) & 0xff) as f32 / 255.0;
        if c < 0.04045 {
            c * 0.0773993808
        } else {
            (c * 0.9478672986 + 0.0521327014).powf(2.4)
        }
    };
    [channel(16), channel(8), channel(0)]
}

/// Orthographic projection the shadow map is rendered with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowCamera {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
    /// Width and height of the square shadow map
    pub map_size: u32,
    pub bias: f32,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            left: -5.0,
            right: 5.0,
            bottom: -5.0,
            top: 5.0,
            near: 0.5,
            far: 500.0,
            map_size: 512,
            bias: 0.0,
        }
    }
}

impl ShadowCamera {
    pub fn projection(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * ortho(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    /// Light-space view-projection for a light at `position` aimed at `target`
    pub fn view_projection(&self, position: Point3<f32>, target: Point3<f32>) -> Matrix4<f32> {
        self.projection() * light_view(position, target)
    }

    /// World-space corners of the shadow volume, near plane first
    pub fn corners(&self, position: Point3<f32>, target: Point3<f32>) -> [Point3<f32>; 8] {
        let view = light_view(position, target);
        let to_world = view.invert().unwrap_or_else(Matrix4::identity);
        let mut corners = [Point3::origin(); 8];

        // View space looks down -Z
        for (i, depth) in [self.near, self.far].into_iter().enumerate() {
            let ring = [
                (self.left, self.bottom),
                (self.right, self.bottom),
                (self.right, self.top),
                (self.left, self.top),
            ];
            for (j, (x, y)) in ring.into_iter().enumerate() {
                corners[i * 4 + j] = to_world.transform_point(Point3::new(x, y, -depth));
            }
        }
        corners
    }
}

fn light_view(position: Point3<f32>, target: Point3<f32>) -> Matrix4<f32> {
    let forward = (target - position).normalize();
    // Avoid a degenerate basis when the light points straight down
    let up = if forward.y.abs() > 0.999 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    };
    Matrix4::look_at_rh(position, target, up)
}

/// A light shining parallel rays from `position` towards `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Linear RGB
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub cast_shadow: bool,
    pub shadow: ShadowCamera,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        let mut light = Self::new(0xffffff, 3.0);
        light.position = Point3::new(0.25, 3.0, -2.25);
        light.cast_shadow = true;
        light.shadow.far = 15.0;
        light.shadow.map_size = 1024;
        light
    }
}

impl DirectionalLight {
    pub fn new(hex: u32, intensity: f32) -> Self {
        Self {
            color: color_from_hex(hex),
            intensity,
            position: Point3::new(0.0, 1.0, 0.0),
            target: Point3::origin(),
            cast_shadow: false,
            shadow: ShadowCamera::default(),
        }
    }

    /// Unit vector pointing from the target towards the light
    pub fn direction(&self) -> Vector3<f32> {
        let direction = self.position - self.target;
        if direction.magnitude2() == 0.0 {
            Vector3::unit_y()
        } else {
            direction.normalize()
        }
    }
}

/// Line geometry outlining a light's shadow volume
pub struct CameraHelper {
    lines: Vec<LineVertex>,
    pub(crate) buffer: Option<wgpu::Buffer>,
}

impl CameraHelper {
    const FRUSTUM_COLOR: [f32; 3] = [1.0, 0.667, 0.0];
    const TARGET_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
    /// Twelve box edges plus the light-to-target line
    pub const VERTEX_COUNT: usize = 26;

    pub fn new(light: &DirectionalLight) -> Self {
        let mut helper = Self {
            lines: Vec::with_capacity(Self::VERTEX_COUNT),
            buffer: None,
        };
        helper.update(light);
        helper
    }

    /// Rebuilds the outline for the light's current placement
    pub fn update(&mut self, light: &DirectionalLight) {
        const EDGES: [(usize, usize); 12] = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];

        let corners = light.shadow.corners(light.position, light.target);
        self.lines.clear();
        for (a, b) in EDGES {
            for index in [a, b] {
                self.lines.push(LineVertex {
                    position: corners[index].into(),
                    color: Self::FRUSTUM_COLOR,
                });
            }
        }
        for point in [light.position, light.target] {
            self.lines.push(LineVertex {
                position: point.into(),
                color: Self::TARGET_COLOR,
            });
        }
    }

    pub fn lines(&self) -> &[LineVertex] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_light() {
        let light = DirectionalLight::default();
        assert_eq!(light.color, [1.0, 1.0, 1.0]);
        assert_eq!(light.intensity, 3.0);
        assert_eq!(light.position, Point3::new(0.25, 3.0, -2.25));
        assert_eq!(light.shadow.far, 15.0);
        assert_eq!(light.shadow.map_size, 1024);
        assert!(light.cast_shadow);
    }

    #[test]
    fn test_color_from_hex_is_linear() {
        assert_eq!(color_from_hex(0x000000), [0.0, 0.0, 0.0]);
        let [r, g, b] = color_from_hex(0x808080);
        assert!((r - 0.2158605).abs() < 1e-4);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_target_lies_inside_shadow_volume() {
        let light = DirectionalLight::default();
        let clip = light.shadow.view_projection(light.position, light.target)
            * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.w - 1.0).abs() < 1e-6);
        assert!(clip.x.abs() <= 1.0 && clip.y.abs() <= 1.0);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_helper_follows_light() {
        let mut light = DirectionalLight::default();
        let mut helper = CameraHelper::new(&light);
        assert_eq!(helper.lines().len(), CameraHelper::VERTEX_COUNT);

        light.position = Point3::new(-2.0, 4.0, 1.0);
        helper.update(&light);
        assert_eq!(helper.lines()[24].position, [-2.0, 4.0, 1.0]);
        assert_eq!(helper.lines().len(), CameraHelper::VERTEX_COUNT);
    }
}
