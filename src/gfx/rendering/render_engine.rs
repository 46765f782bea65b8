//! wgpu render engine for the showcase scene
//!
//! Owns the surface, device and every GPU-side resource. Each frame it
//! uploads whatever the scene gained since the last frame, renders the light's
//! shadow map, then draws the background, the lit meshes and the helper lines
//! into a multisampled target resolved onto the surface. An optional overlay
//! callback (the debug UI) renders on top before presenting.

use std::{collections::HashMap, sync::Arc};
use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};

use crate::{
    assets::cube_texture::CubeTexture,
    gfx::{
        resources::{
            global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform},
            material::{MaterialBindings, MaterialContext},
            texture_resource::{ColorSpace, TextureCache, TextureResource},
        },
        scene::{
            mesh::ModelBinding, CameraHelper, DirectionalLight, DrawMesh, LineVertex, NodeKind,
            Scene,
        },
    },
    wgpu_utils::{binding_types, BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
};

use super::{
    error::RenderError,
    frame::{FrameInput, FrameRenderer},
    pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager, VertexInput},
    settings::RendererSettings,
};

const SHADOW_PIPELINE: &str = "Shadow";
const PBR_PIPELINE: &str = "PBR";
const SKYBOX_PIPELINE: &str = "Skybox";
const LINES_PIPELINE: &str = "Lines";

/// Environment or background cubemap currently on the GPU
struct CubeBinding {
    generation: u64,
    mip_levels: u32,
    resource: Arc<TextureResource>,
}

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<Device>,
    queue: Arc<Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    sample_count: u32,
    depth_texture: TextureResource,
    msaa_view: Option<TextureView>,
    pub pipeline_manager: PipelineManager,

    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    model_layout: BindGroupLayoutWithDesc,
    material_bindings: MaterialBindings,
    textures: TextureCache,

    shadow_map: TextureResource,
    shadow_map_size: u32,

    // Image-based lighting; the fallback is bound while the scene has none
    fallback_environment: Arc<TextureResource>,
    environment: Option<CubeBinding>,
    skybox_layout: BindGroupLayoutWithDesc,
    background: Option<(CubeBinding, wgpu::BindGroup)>,
    cubes: HashMap<u64, Arc<TextureResource>>,
}

impl RenderEngine {
    /// Opens a device for `window` and builds every pipeline.
    ///
    /// `width` and `height` are the initial surface size in physical pixels.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        settings: &RendererSettings,
    ) -> Result<RenderEngine, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Shaders encode sRGB themselves, so prefer a linear surface format
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface)?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut sample_count = settings.sample_count();
        if sample_count > 1
            && !adapter
                .get_texture_format_features(format)
                .flags
                .sample_count_supported(sample_count)
        {
            log::warn!(
                "{}x MSAA is not supported for {:?}, rendering without antialiasing",
                sample_count,
                format
            );
            sample_count = 1;
        }

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, sample_count, "depth_texture");
        let msaa_view = (sample_count > 1)
            .then(|| TextureResource::create_msaa_target(&device, &config, sample_count));

        let shadow_map_size = DirectionalLight::default().shadow.map_size;
        let shadow_map = TextureResource::create_shadow_map(&device, shadow_map_size);

        let fallback_environment = Arc::new(TextureResource::create_cube(
            &device,
            &queue,
            &CubeTexture::solid([0, 0, 0, 255], ColorSpace::Linear),
        ));

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo, &shadow_map, &fallback_environment);

        let model_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Model Bind Group Layout");
        let material_bindings = MaterialBindings::new(&device);
        let skybox_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(
                wgpu::SamplerBindingType::Filtering,
            ))
            .create(&device, "Skybox Bind Group Layout");
        let textures = TextureCache::new(&device, &queue);

        let device: Arc<Device> = device.into();
        let queue: Arc<Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device.clone());

        pipeline_manager.load_shader(
            "pbr",
            concat!(include_str!("common.wgsl"), include_str!("pbr.wgsl")),
        );
        pipeline_manager.load_shader(
            "skybox",
            concat!(include_str!("common.wgsl"), include_str!("skybox.wgsl")),
        );
        pipeline_manager.load_shader(
            "lines",
            concat!(include_str!("common.wgsl"), include_str!("lines.wgsl")),
        );
        pipeline_manager.load_shader(
            "shadow",
            concat!(include_str!("common.wgsl"), include_str!("shadow_pass.wgsl")),
        );

        let color_target = vec![Some(wgpu::ColorTargetState {
            format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        // Both faces go into the shadow map; slope bias fights acne
        pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default_with_shader("shadow")
                .with_label("SHADOW")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.uniform_bind_group_layout().clone(),
                    model_layout.layout.clone(),
                ])
                .with_depth(DepthConfig {
                    bias: wgpu::DepthBiasState {
                        constant: 2,
                        slope_scale: 2.0,
                        clamp: 0.0,
                    },
                    ..DepthConfig::new(TextureResource::DEPTH_FORMAT)
                }),
        );

        pipeline_manager.register_pipeline(
            PBR_PIPELINE,
            PipelineConfig::default_with_shader("pbr")
                .with_label("PBR")
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    model_layout.layout.clone(),
                    material_bindings.bind_group_layout().clone(),
                ])
                .with_depth(DepthConfig::new(TextureResource::DEPTH_FORMAT))
                .with_color_targets(color_target.clone())
                .with_sample_count(sample_count),
        );

        pipeline_manager.register_pipeline(
            SKYBOX_PIPELINE,
            PipelineConfig::default_with_shader("skybox")
                .with_label("SKYBOX")
                .with_vertex_input(VertexInput::None)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layout().clone(),
                    skybox_layout.layout.clone(),
                ])
                .with_depth(DepthConfig {
                    write: false,
                    compare: wgpu::CompareFunction::LessEqual,
                    ..DepthConfig::new(TextureResource::DEPTH_FORMAT)
                })
                .with_color_targets(color_target.clone())
                .with_sample_count(sample_count),
        );

        pipeline_manager.register_pipeline(
            LINES_PIPELINE,
            PipelineConfig::default_with_shader("lines")
                .with_label("LINES")
                .with_vertex_input(VertexInput::Lines)
                .with_primitive_topology(wgpu::PrimitiveTopology::LineList)
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![global_bindings.bind_group_layout().clone()])
                .with_depth(DepthConfig::new(TextureResource::DEPTH_FORMAT))
                .with_color_targets(color_target)
                .with_sample_count(sample_count),
        );

        pipeline_manager.create_all_pipelines()?;

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            format,
            sample_count,
            depth_texture,
            msaa_view,
            pipeline_manager,
            global_ubo,
            global_bindings,
            model_layout,
            material_bindings,
            textures,
            shadow_map,
            shadow_map_size,
            fallback_environment,
            environment: None,
            skybox_layout,
            background: None,
            cubes: HashMap::new(),
        })
    }

    /// Draws one frame, then lets `overlay` record extra passes onto the
    /// surface view before presenting.
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    pub fn render_frame<F>(
        &mut self,
        frame: &mut FrameInput<'_>,
        overlay: Option<F>,
    ) -> Result<(), RenderError>
    where
        F: FnOnce(&Device, &Queue, &mut CommandEncoder, &TextureView),
    {
        let (width, height) = frame.surface.buffer_size();
        if width > 0 && height > 0 && (width, height) != (self.config.width, self.config.height) {
            self.resize(width, height);
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring the next frame, skipping it");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(e) => return Err(RenderError::Surface(e)),
        };
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let light = frame
            .scene
            .directional_light()
            .copied()
            .unwrap_or_default();
        self.sync_cubes(frame.scene);
        self.sync_shadow_map(&light);
        self.prepare_scene(frame.scene);

        let env_mip_levels = self.environment.as_ref().map_or(0, |env| env.mip_levels);
        self.global_ubo.update_content(
            &self.queue,
            GlobalUniform::compose(frame.camera, &light, frame.settings, env_mip_levels),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if frame.settings.shadow_map.enabled && light.cast_shadow {
            self.shadow_pass(&mut encoder, frame.scene);
        }
        self.main_pass(&mut encoder, frame.scene, &surface_view);

        if let Some(overlay) = overlay {
            overlay(&self.device, &self.queue, &mut encoder, &surface_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    fn shadow_pass(&self, encoder: &mut CommandEncoder, scene: &Scene) {
        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Depth Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let (Some(pipeline), Some(globals)) = (
            self.pipeline_manager.pipeline(SHADOW_PIPELINE),
            self.global_bindings.uniform_bind_group(),
        ) else {
            log::error!("Shadow pipeline is not available");
            return;
        };
        shadow_pass.set_pipeline(pipeline);
        shadow_pass.set_bind_group(0, globals, &[]);

        scene.traverse(&mut |node| {
            let NodeKind::Mesh(mesh) = &node.kind else {
                return;
            };
            if !node.cast_shadow {
                return;
            }
            if let Some(binding) = &mesh.model_binding {
                shadow_pass.set_bind_group(1, binding.bind_group(), &[]);
                shadow_pass.draw_mesh(&mesh.mesh);
            }
        });
    }

    fn main_pass(&self, encoder: &mut CommandEncoder, scene: &Scene, surface_view: &TextureView) {
        let (view, resolve_target) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(surface_view)),
            None => (surface_view, None),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Main Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(globals) = self.global_bindings.bind_group() else {
            log::error!("Global bind group is missing");
            return;
        };
        render_pass.set_bind_group(0, globals, &[]);

        if let (Some((_, sky_bind_group)), Some(pipeline)) = (
            &self.background,
            self.pipeline_manager.pipeline(SKYBOX_PIPELINE),
        ) {
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(1, sky_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        if let Some(pipeline) = self.pipeline_manager.pipeline(PBR_PIPELINE) {
            render_pass.set_pipeline(pipeline);
            scene.traverse(&mut |node| {
                let NodeKind::Mesh(mesh) = &node.kind else {
                    return;
                };
                let (Some(binding), Some(material)) =
                    (&mesh.model_binding, mesh.material.bind_group())
                else {
                    log::debug!("Skipping '{}' - no GPU resources yet", node.name);
                    return;
                };
                render_pass.set_bind_group(1, binding.bind_group(), &[]);
                render_pass.set_bind_group(2, material, &[]);
                render_pass.draw_mesh(&mesh.mesh);
            });
        }

        if let Some(pipeline) = self.pipeline_manager.pipeline(LINES_PIPELINE) {
            render_pass.set_pipeline(pipeline);
            scene.traverse(&mut |node| {
                if let NodeKind::CameraHelper(helper) = &node.kind {
                    if let Some(buffer) = &helper.buffer {
                        render_pass.set_vertex_buffer(0, buffer.slice(..));
                        render_pass.draw(0..helper.lines().len() as u32, 0..1);
                    }
                }
            });
        }
    }

    /// Creates or refreshes GPU state for meshes, materials and helpers
    fn prepare_scene(&mut self, scene: &mut Scene) {
        let Self {
            device,
            queue,
            model_layout,
            material_bindings,
            textures,
            ..
        } = self;
        let device: &Device = device;
        let queue: &Queue = queue;
        let mut material_ctx = MaterialContext {
            device,
            queue,
            bindings: material_bindings,
            textures,
        };

        scene.traverse_world_mut(&mut |node, world| match &mut node.kind {
            NodeKind::Mesh(mesh) => {
                mesh.mesh.init_gpu_resources(device);
                match &mut mesh.model_binding {
                    Some(binding) => binding.update(queue, world, node.receive_shadow),
                    None => {
                        mesh.model_binding = Some(ModelBinding::new(
                            device,
                            model_layout,
                            world,
                            node.receive_shadow,
                        ))
                    }
                }
                mesh.material.prepare(&mut material_ctx);
            }
            NodeKind::CameraHelper(helper) => {
                if helper.buffer.is_none() {
                    helper.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some("Camera Helper Lines"),
                        size: (CameraHelper::VERTEX_COUNT * std::mem::size_of::<LineVertex>())
                            as wgpu::BufferAddress,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    }));
                }
                if let Some(buffer) = &helper.buffer {
                    queue.write_buffer(buffer, 0, bytemuck::cast_slice(helper.lines()));
                }
            }
            NodeKind::Group | NodeKind::DirectionalLight(_) => {}
        });
    }

    /// Uploads replaced background/environment cubemaps
    fn sync_cubes(&mut self, scene: &Scene) {
        let environment_generation = scene.environment.as_ref().map(|cube| cube.generation());
        if environment_generation != self.environment.as_ref().map(|env| env.generation) {
            self.environment = scene
                .environment
                .as_ref()
                .map(|cube| self.cube_binding(cube));
            self.rebuild_global_bind_group();
        }

        let background_generation = scene.background.as_ref().map(|cube| cube.generation());
        if background_generation != self.background.as_ref().map(|(bg, _)| bg.generation) {
            self.background = scene.background.as_ref().map(|cube| {
                let binding = self.cube_binding(cube);
                let bind_group = BindGroupBuilder::new(&self.skybox_layout)
                    .texture(&binding.resource.view)
                    .sampler(&binding.resource.sampler)
                    .create(&self.device, "Skybox Bind Group");
                (binding, bind_group)
            });
        }

        let in_use = [environment_generation, background_generation];
        self.cubes
            .retain(|generation, _| in_use.contains(&Some(*generation)));
    }

    fn cube_binding(&mut self, cube: &CubeTexture) -> CubeBinding {
        let resource = self
            .cubes
            .entry(cube.generation())
            .or_insert_with(|| {
                log::debug!(
                    "Uploading {}x{} cubemap with {} mip levels",
                    cube.size(),
                    cube.size(),
                    cube.mip_level_count()
                );
                Arc::new(TextureResource::create_cube(&self.device, &self.queue, cube))
            })
            .clone();
        CubeBinding {
            generation: cube.generation(),
            mip_levels: cube.mip_level_count(),
            resource,
        }
    }

    fn sync_shadow_map(&mut self, light: &DirectionalLight) {
        let size = light.shadow.map_size.max(1);
        if size != self.shadow_map_size {
            log::info!("Resizing shadow map to {}x{}", size, size);
            self.shadow_map = TextureResource::create_shadow_map(&self.device, size);
            self.shadow_map_size = size;
            self.rebuild_global_bind_group();
        }
    }

    fn rebuild_global_bind_group(&mut self) {
        let environment = self
            .environment
            .as_ref()
            .map_or(&self.fallback_environment, |env| &env.resource);
        self.global_bindings.create_bind_group(
            &self.device,
            &self.global_ubo,
            &self.shadow_map,
            environment,
        );
    }

    /// Reconfigures the surface and its attachments; `width`/`height` in
    /// physical pixels
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            self.sample_count,
            "depth_texture",
        );
        self.msaa_view = (self.sample_count > 1).then(|| {
            TextureResource::create_msaa_target(&self.device, &self.config, self.sample_count)
        });
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.format
    }

    /// Current surface size in physical pixels
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Number of distinct textures uploaded for materials
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

impl FrameRenderer for RenderEngine {
    fn draw_frame(&mut self, frame: &mut FrameInput<'_>) -> Result<(), RenderError> {
        self.render_frame(
            frame,
            None::<fn(&Device, &Queue, &mut CommandEncoder, &TextureView)>,
        )
    }
}
