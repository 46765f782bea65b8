//! Global uniform bindings for camera, light and renderer state
//!
//! Group 0 of every lit pipeline: one uniform block with the per-frame
//! globals, the shadow map with its comparison sampler, and the environment
//! cubemap.

use crate::{
    gfx::{
        camera::PerspectiveCamera,
        rendering::settings::RendererSettings,
        scene::light::DirectionalLight,
    },
    wgpu_utils::{
        binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
        UniformBuffer,
    },
};

use super::texture_resource::TextureResource;

/// Per-frame global data.
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// xyz: unit vector towards the light
    pub light_direction: [f32; 4],
    /// rgb: color * intensity, already scaled for the light units in use
    pub light_radiance: [f32; 4],
    pub tone_mapping: u32,
    pub exposure: f32,
    pub shadow_map_size: f32,
    pub shadows_enabled: u32,
    /// Mip levels of the environment map, zero when there is none
    pub env_mip_levels: f32,
    pub output_srgb: u32,
    pub shadow_bias: f32,
    /// PCF kernel radius in texels, zero for a single tap
    pub shadow_kernel_radius: u32,
}
// 3 * 64 + 3 * 16 + 2 * 16 = 272 bytes

impl GlobalUniform {
    /// Gathers the globals for one frame
    pub fn compose(
        camera: &PerspectiveCamera,
        light: &DirectionalLight,
        settings: &RendererSettings,
        env_mip_levels: u32,
    ) -> Self {
        let view_proj = camera.view_projection_matrix();
        let inv_view_proj = camera.inverse_view_projection_matrix();

        // Legacy (non physical) light units fold a factor of PI into the
        // light intensity
        let scale = if settings.physically_correct_lights {
            light.intensity
        } else {
            light.intensity * std::f32::consts::PI
        };
        let direction = light.direction();

        GlobalUniform {
            view_proj: view_proj.into(),
            inv_view_proj: inv_view_proj.into(),
            light_view_proj: light.shadow.view_projection(light.position, light.target).into(),
            camera_position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
            light_direction: [direction.x, direction.y, direction.z, 0.0],
            light_radiance: [
                light.color[0] * scale,
                light.color[1] * scale,
                light.color[2] * scale,
                1.0,
            ],
            tone_mapping: settings.tone_mapping as u32,
            exposure: settings.tone_mapping_exposure,
            shadow_map_size: light.shadow.map_size as f32,
            shadows_enabled: u32::from(settings.shadow_map.enabled && light.cast_shadow),
            env_mip_levels: env_mip_levels as f32,
            output_srgb: u32::from(settings.output_color_space.is_srgb()),
            shadow_bias: light.shadow.bias,
            shadow_kernel_radius: settings.shadow_map.kind.kernel_radius(),
        }
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Manages the bind group layouts and bind groups for group 0.
///
/// The shadow pass renders into the shadow map, so it cannot bind the full
/// group; it gets a uniform-only variant instead.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
    uniform_layout: BindGroupLayoutWithDesc,
    uniform_bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Comparison,
            ))
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Filtering,
            ))
            .create(device, "Globals Bind Group Layout");

        let uniform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Shadow Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
            uniform_layout,
            uniform_bind_group: None,
        }
    }

    /// (Re)creates the bind groups, needed again whenever the environment
    /// cubemap is replaced
    pub fn create_bind_group(
        &mut self,
        device: &wgpu::Device,
        ubo: &GlobalUBO,
        shadow_map: &TextureResource,
        environment: &TextureResource,
    ) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .texture(&shadow_map.view)
                .sampler(&shadow_map.sampler)
                .texture(&environment.view)
                .sampler(&environment.sampler)
                .create(device, "Global Bind Group"),
        );
        self.uniform_bind_group = Some(
            BindGroupBuilder::new(&self.uniform_layout)
                .resource(ubo.binding_resource())
                .create(device, "Shadow Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    pub fn uniform_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout.layout
    }

    pub fn uniform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.uniform_bind_group.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::settings::{ShadowMapType, ToneMapping};

    #[test]
    fn test_global_uniform_size() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 272);
    }

    #[test]
    fn test_compose_carries_tone_mapping() {
        let camera = PerspectiveCamera::default();
        let light = DirectionalLight::default();
        let mut settings = RendererSettings::default();
        settings.tone_mapping = ToneMapping::AcesFilmic;
        settings.tone_mapping_exposure = 1.5;

        let globals = GlobalUniform::compose(&camera, &light, &settings, 9);
        assert_eq!(globals.tone_mapping, 4);
        assert_eq!(globals.exposure, 1.5);
        assert_eq!(globals.env_mip_levels, 9.0);
        assert_eq!(globals.shadow_map_size, 1024.0);
        assert_eq!(globals.shadows_enabled, 1);
        assert_eq!(globals.shadow_kernel_radius, 2);
    }

    #[test]
    fn test_compose_carries_shadow_filter() {
        let camera = PerspectiveCamera::default();
        let light = DirectionalLight::default();
        let mut settings = RendererSettings::default();

        settings.shadow_map.kind = ShadowMapType::Basic;
        let basic = GlobalUniform::compose(&camera, &light, &settings, 0);
        assert_eq!(basic.shadow_kernel_radius, 0);

        settings.shadow_map.kind = ShadowMapType::Pcf;
        let pcf = GlobalUniform::compose(&camera, &light, &settings, 0);
        assert_eq!(pcf.shadow_kernel_radius, 1);
    }

    #[test]
    fn test_physically_correct_lights_use_raw_intensity() {
        let camera = PerspectiveCamera::default();
        let light = DirectionalLight::default();
        let mut settings = RendererSettings::default();

        settings.physically_correct_lights = true;
        let physical = GlobalUniform::compose(&camera, &light, &settings, 0);
        assert!((physical.light_radiance[0] - 3.0).abs() < 1e-6);

        settings.physically_correct_lights = false;
        let legacy = GlobalUniform::compose(&camera, &light, &settings, 0);
        assert!((legacy.light_radiance[0] - 3.0 * std::f32::consts::PI).abs() < 1e-5);
    }
}
