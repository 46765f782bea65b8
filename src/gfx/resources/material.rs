//! Material system for PBR rendering
//!
//! Materials are plain data owned by mesh nodes. GPU resources are created
//! lazily on the render thread the first time a material is drawn, and a
//! standard material's uniform is rewritten whenever its `needs_update`
//! flag is raised.

use std::sync::Arc;

use wgpu::Device;

use crate::wgpu_utils::{
    binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc,
    UniformBuffer,
};

use super::texture_resource::{TextureCache, TextureImage};

const FLAG_UNLIT: u32 = 1;
const FLAG_COLOR_MAP: u32 = 1 << 1;
const FLAG_METALLIC_ROUGHNESS_MAP: u32 = 1 << 2;

/// GPU uniform data for materials, matches `MaterialUniform` in pbr.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub metallic: f32,
    pub roughness: f32,
    pub env_map_intensity: f32,
    pub flags: u32,
    _padding: f32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Bind group layout shared by every material (group 2)
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Filtering,
            ))
            .create(device, "Material Bind Group Layout");

        Self { bind_group_layout }
    }

    pub fn layout(&self) -> &BindGroupLayoutWithDesc {
        &self.bind_group_layout
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

/// Everything needed to create or refresh material GPU state
pub struct MaterialContext<'a> {
    pub device: &'a Device,
    pub queue: &'a wgpu::Queue,
    pub bindings: &'a MaterialBindings,
    pub textures: &'a mut TextureCache,
}

/// Uniform buffer and bind group of a single material
pub struct MaterialGpu {
    ubo: MaterialUBO,
    bind_group: wgpu::BindGroup,
}

impl MaterialGpu {
    fn new(
        ctx: &mut MaterialContext<'_>,
        uniform: &MaterialUniform,
        color_map: Option<&Arc<TextureImage>>,
        metallic_roughness_map: Option<&Arc<TextureImage>>,
        label: &str,
    ) -> Self {
        for image in [color_map, metallic_roughness_map].into_iter().flatten() {
            ctx.textures.upload(ctx.device, ctx.queue, image);
        }

        let ubo = MaterialUBO::new_with_data(ctx.device, uniform);
        let color = ctx.textures.get_or_white(color_map);
        let metallic_roughness = ctx.textures.get_or_white(metallic_roughness_map);
        let bind_group = BindGroupBuilder::new(ctx.bindings.layout())
            .resource(ubo.binding_resource())
            .texture(&color.view)
            .texture(&metallic_roughness.view)
            .sampler(&color.sampler)
            .create(ctx.device, label);

        Self { ubo, bind_group }
    }
}

/// Physically-based metallic/roughness material
pub struct StandardMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    /// Scales the contribution of the scene environment map
    pub env_map_intensity: f32,
    pub base_color_texture: Option<Arc<TextureImage>>,
    /// Roughness in G, metalness in B (glTF convention)
    pub metallic_roughness_texture: Option<Arc<TextureImage>>,
    /// Raised by the application, cleared by the renderer after upload
    pub needs_update: bool,
    gpu: Option<MaterialGpu>,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.0,
            roughness: 1.0,
            emissive: [0.0, 0.0, 0.0],
            env_map_intensity: 1.0,
            base_color_texture: None,
            metallic_roughness_texture: None,
            needs_update: false,
            gpu: None,
        }
    }
}

impl StandardMaterial {
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn with_emission(mut self, r: f32, g: f32, b: f32) -> Self {
        self.emissive = [r, g, b];
        self
    }

    pub fn with_base_color_texture(mut self, texture: Arc<TextureImage>) -> Self {
        self.base_color_texture = Some(texture);
        self
    }

    pub fn with_metallic_roughness_texture(mut self, texture: Arc<TextureImage>) -> Self {
        self.metallic_roughness_texture = Some(texture);
        self
    }

    pub fn uniform(&self) -> MaterialUniform {
        let mut flags = 0;
        if self.base_color_texture.is_some() {
            flags |= FLAG_COLOR_MAP;
        }
        if self.metallic_roughness_texture.is_some() {
            flags |= FLAG_METALLIC_ROUGHNESS_MAP;
        }
        MaterialUniform {
            base_color: self.base_color,
            emissive: self.emissive,
            metallic: self.metallic,
            roughness: self.roughness,
            env_map_intensity: self.env_map_intensity,
            flags,
            _padding: 0.0,
        }
    }
}

/// Unlit material: color times optional texture, unaffected by lights
pub struct BasicMaterial {
    pub name: String,
    pub color: [f32; 4],
    pub texture: Option<Arc<TextureImage>>,
    gpu: Option<MaterialGpu>,
}

impl BasicMaterial {
    pub fn new(name: &str, color: [f32; 4]) -> Self {
        Self {
            name: name.to_string(),
            color,
            texture: None,
            gpu: None,
        }
    }

    pub fn with_texture(mut self, texture: Arc<TextureImage>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn uniform(&self) -> MaterialUniform {
        let mut flags = FLAG_UNLIT;
        if self.texture.is_some() {
            flags |= FLAG_COLOR_MAP;
        }
        MaterialUniform {
            base_color: self.color,
            emissive: [0.0; 3],
            metallic: 0.0,
            roughness: 1.0,
            env_map_intensity: 0.0,
            flags,
            _padding: 0.0,
        }
    }
}

/// Surface description of a mesh
pub enum Material {
    Standard(StandardMaterial),
    Basic(BasicMaterial),
}

impl Material {
    pub fn name(&self) -> &str {
        match self {
            Material::Standard(material) => &material.name,
            Material::Basic(material) => &material.name,
        }
    }

    pub fn uniform(&self) -> MaterialUniform {
        match self {
            Material::Standard(material) => material.uniform(),
            Material::Basic(material) => material.uniform(),
        }
    }

    pub fn as_standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match self {
            Material::Standard(material) => Some(material),
            Material::Basic(_) => None,
        }
    }

    /// Creates GPU state on first use and consumes a pending `needs_update`
    pub fn prepare(&mut self, ctx: &mut MaterialContext<'_>) {
        let uniform = self.uniform();
        match self {
            Material::Standard(material) => match &mut material.gpu {
                Some(gpu) => {
                    if material.needs_update {
                        gpu.ubo.force_update_content(ctx.queue, uniform);
                    }
                }
                None => {
                    material.gpu = Some(MaterialGpu::new(
                        ctx,
                        &uniform,
                        material.base_color_texture.as_ref(),
                        material.metallic_roughness_texture.as_ref(),
                        &material.name,
                    ));
                }
            },
            Material::Basic(material) => {
                if material.gpu.is_none() {
                    material.gpu = Some(MaterialGpu::new(
                        ctx,
                        &uniform,
                        material.texture.as_ref(),
                        None,
                        &material.name,
                    ));
                }
            }
        }

        if let Material::Standard(material) = self {
            material.needs_update = false;
        }
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        let gpu = match self {
            Material::Standard(material) => material.gpu.as_ref(),
            Material::Basic(material) => material.gpu.as_ref(),
        };
        gpu.map(|gpu| &gpu.bind_group)
    }
}

impl From<StandardMaterial> for Material {
    fn from(material: StandardMaterial) -> Self {
        Material::Standard(material)
    }
}

impl From<BasicMaterial> for Material {
    fn from(material: BasicMaterial) -> Self {
        Material::Basic(material)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::resources::texture_resource::ColorSpace;

    #[test]
    fn test_material_uniform_layout() {
        // 3 x vec4 in WGSL
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn test_standard_uniform_flags() {
        let image = Arc::new(TextureImage::new(1, 1, vec![0, 0, 0, 255], ColorSpace::Srgb));
        let mut material = StandardMaterial::new("Helmet", [1.0; 4], 2.0, -1.0)
            .with_base_color_texture(image);
        material.env_map_intensity = 5.0;

        let uniform = material.uniform();
        assert_eq!(uniform.flags, FLAG_COLOR_MAP);
        assert_eq!(uniform.metallic, 1.0);
        assert_eq!(uniform.roughness, 0.0);
        assert_eq!(uniform.env_map_intensity, 5.0);
    }

    #[test]
    fn test_basic_material_is_unlit() {
        let material = Material::from(BasicMaterial::new("Helper", [1.0, 0.5, 0.0, 1.0]));
        assert_eq!(material.uniform().flags & FLAG_UNLIT, FLAG_UNLIT);
        assert_eq!(material.name(), "Helper");
        assert!(material.bind_group().is_none());
    }
}
