//! Orbit controls with damping
//!
//! Rotates the camera around its target on left drag, pans on right drag
//! (or shift + left drag) and dollies on the mouse wheel. With damping on,
//! every `update` applies a fraction of the accumulated motion and decays
//! the rest, so the camera glides to a stop.

use cgmath::*;
use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    keyboard::ModifiersState,
};

use super::PerspectiveCamera;

const EPS: f32 = 0.000001;

/// Spherical coordinates around the target, Y up
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y
    phi: f32,
    /// Azimuth around Y, measured from +Z
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    None,
    Rotate,
    Pan,
}

pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Client area height in logical pixels, used to scale drag input
    pub viewport_height: f32,

    // Accumulated, not yet applied motion
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vector3<f32>,
    scale: f32,

    drag: DragMode,
    modifiers: ModifiersState,
    cursor: Option<PhysicalPosition<f64>>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            viewport_height: 1.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vector3::zero(),
            scale: 1.0,
            drag: DragMode::None,
            modifiers: ModifiersState::empty(),
            cursor: None,
        }
    }
}

impl OrbitControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Dolly towards the target, `scale` < 1 moves closer
    pub fn dolly(&mut self, scale: f32) {
        self.scale *= scale;
    }

    /// Pans by a screen-space pixel delta
    pub fn pan(&mut self, delta_x: f32, delta_y: f32, camera: &PerspectiveCamera) {
        let offset = camera.position - camera.target;
        // Distance covered by half the viewport height at the target
        let target_distance = offset.magnitude() * (Rad::from(camera.fov_y) / 2.0).tan();
        let height = self.viewport_height.max(1.0);

        let view = camera.view_matrix();
        // Camera right and up axes are the first two rows of the view rotation
        let right = Vector3::new(view.x.x, view.y.x, view.z.x);
        let up = Vector3::new(view.x.y, view.y.y, view.z.y);

        let left_amount = 2.0 * delta_x * target_distance / height * self.pan_speed;
        let up_amount = 2.0 * delta_y * target_distance / height * self.pan_speed;
        self.pan_offset += -right * left_amount + up * up_amount;
    }

    /// Rotation still waiting to be applied, as (azimuth, polar)
    pub fn pending_rotation(&self) -> (f32, f32) {
        (self.delta_theta, self.delta_phi)
    }

    /// Advances one step and moves the camera
    pub fn update(&mut self, camera: &mut PerspectiveCamera) {
        let offset = camera.position - camera.target;
        let mut spherical = Spherical::from_offset(offset);

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        spherical.theta += self.delta_theta * step;
        spherical.phi += self.delta_phi * step;
        spherical.phi = spherical.phi.clamp(EPS, std::f32::consts::PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.target += self.pan_offset * step;
        camera.position = camera.target + spherical.to_offset();

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zero();
        }
        self.scale = 1.0;
    }

    /// Tracks buttons, modifiers, cursor and wheel input.
    /// Returns true when the event was used.
    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Released, _) => DragMode::None,
                    (ElementState::Pressed, MouseButton::Left) if self.modifiers.shift_key() => {
                        DragMode::Pan
                    }
                    (ElementState::Pressed, MouseButton::Left) => DragMode::Rotate,
                    (ElementState::Pressed, MouseButton::Right) => DragMode::Pan,
                    _ => self.drag,
                };
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Some(*position);
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 50.0,
                };
                let zoom_scale = 0.95f32.powf(self.zoom_speed);
                if scroll > 0.0 {
                    self.dolly(zoom_scale);
                } else if scroll < 0.0 {
                    self.dolly(1.0 / zoom_scale);
                }
                true
            }
            _ => false,
        }
    }

    /// Raw mouse motion drives rotation and panning while a button is held
    pub fn process_device_event(&mut self, event: &DeviceEvent, camera: &PerspectiveCamera) {
        let DeviceEvent::MouseMotion { delta } = event else {
            return;
        };
        let (dx, dy) = (delta.0 as f32, delta.1 as f32);
        let height = self.viewport_height.max(1.0);

        match self.drag {
            DragMode::Rotate => {
                let full_turn = 2.0 * std::f32::consts::PI;
                self.rotate_left(full_turn * dx / height * self.rotate_speed);
                self.rotate_up(full_turn * dy / height * self.rotate_speed);
            }
            DragMode::Pan => self.pan(dx, dy, camera),
            DragMode::None => {}
        }
    }

    /// Drops any drag in progress, used when the UI takes over the mouse
    pub fn cancel_drag(&mut self) {
        self.drag = DragMode::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(camera: &PerspectiveCamera) -> f32 {
        (camera.position - camera.target).magnitude()
    }

    #[test]
    fn test_damping_decays_geometrically() {
        let mut controls = OrbitControls::new();
        let mut camera = PerspectiveCamera::default();
        controls.rotate_left(1.0);

        controls.update(&mut camera);
        let (after_one, _) = controls.pending_rotation();
        assert!((after_one - (-0.95)).abs() < 1e-6);

        controls.update(&mut camera);
        let (after_two, _) = controls.pending_rotation();
        assert!((after_two - (-0.95 * 0.95)).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_keeps_radius() {
        let mut controls = OrbitControls::new();
        let mut camera = PerspectiveCamera::default();
        let start = distance(&camera);

        controls.rotate_left(0.8);
        controls.rotate_up(0.3);
        for _ in 0..100 {
            controls.update(&mut camera);
        }

        assert!((distance(&camera) - start).abs() < 1e-4);
        assert_ne!(camera.position, PerspectiveCamera::default().position);
    }

    #[test]
    fn test_idle_update_leaves_camera_in_place() {
        let mut controls = OrbitControls::new();
        let mut camera = PerspectiveCamera::default();
        let start = camera.position;

        controls.update(&mut camera);
        assert!((camera.position - start).magnitude() < 1e-5);
    }

    #[test]
    fn test_dolly_applies_immediately() {
        let mut controls = OrbitControls::new();
        let mut camera = PerspectiveCamera::default();
        let start = distance(&camera);

        controls.dolly(0.5);
        controls.update(&mut camera);
        assert!((distance(&camera) - start * 0.5).abs() < 1e-4);

        controls.update(&mut camera);
        assert!((distance(&camera) - start * 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_without_damping_deltas_clear() {
        let mut controls = OrbitControls::new();
        controls.enable_damping = false;
        let mut camera = PerspectiveCamera::default();

        controls.rotate_left(0.5);
        controls.update(&mut camera);
        assert_eq!(controls.pending_rotation(), (0.0, 0.0));
    }
}
