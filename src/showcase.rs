//! The application context
//!
//! [`Showcase`] owns all mutable state of the demo: scene graph, camera and
//! controls, renderer settings, the asset loader and the debug panel. The
//! window glue feeds it input and calls [`Showcase::tick`] once per redraw.

use std::{f32::consts::PI, sync::Arc};

use cgmath::Vector3;
use winit::event::{DeviceEvent, WindowEvent};

use crate::{
    assets::{
        cube_texture::{face_paths, CubeTexture},
        AssetLoader, LoadEvent,
    },
    config::ShowcaseConfig,
    gfx::{
        camera::{OrbitControls, PerspectiveCamera},
        rendering::{
            FrameInput, FrameRenderer, OutputSurface, RenderError, RendererSettings,
        },
        resources::texture_resource::ColorSpace,
        scene::{CameraHelper, DirectionalLight, NodeId, NodeKind, Scene, SceneNode},
    },
    ui::{Control, ControlKind, DebugPanel, Hook, NumberRange, PanelEvent, Param, ParamValue},
};

const ENV_INTENSITY_RANGE: NumberRange = NumberRange::new(0.0, 10.0, 0.01);
const MODEL_ROTATION_RANGE: NumberRange = NumberRange::new(-PI, PI, 0.001);
const LIGHT_INTENSITY_RANGE: NumberRange = NumberRange::new(0.0, 10.0, 0.001);
const LIGHT_POSITION_RANGE: NumberRange = NumberRange::new(-5.0, 5.0, 0.001);
const EXPOSURE_RANGE: NumberRange = NumberRange::new(0.0, 10.0, 0.001);

/// Counters exposed for diagnostics and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowcaseStats {
    pub material_refreshes: u64,
    pub load_errors: u64,
    pub frames: u64,
}

pub struct Showcase {
    config: ShowcaseConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    settings: RendererSettings,
    loader: AssetLoader,
    panel: DebugPanel,
    env_map_intensity: f32,
    light_id: NodeId,
    model_id: Option<NodeId>,
    surface: OutputSurface,
    stats: ShowcaseStats,
}

impl Showcase {
    /// Builds the scene, camera and panel. Assets are requested separately
    /// with [`Showcase::start_loading`].
    pub fn new(config: ShowcaseConfig) -> Self {
        let (width, height) = config.window_size;
        let mut scene = Scene::new();

        let light = DirectionalLight::default();
        let mut light_node = SceneNode::new("Directional Light", NodeKind::DirectionalLight(light));
        light_node.cast_shadow = light.cast_shadow;
        let light_id = scene.add(light_node);
        scene.add(SceneNode::new(
            "Shadow Camera Helper",
            NodeKind::CameraHelper(CameraHelper::new(&light)),
        ));

        let mut camera = PerspectiveCamera::default();
        camera.aspect = width as f32 / height.max(1) as f32;
        camera.update_projection_matrix();

        let mut controls = OrbitControls::new();
        controls.enable_damping = true;
        controls.viewport_height = height as f32;

        let mut panel = DebugPanel::new("Debug");
        panel.add(
            Control::slider(
                "Env Map Intensity",
                Param::EnvMapIntensity,
                ENV_INTENSITY_RANGE,
            )
            .on_change(Hook::RefreshMaterials),
        );
        panel.add(Control::slider(
            "Light Intensity",
            Param::LightIntensity,
            LIGHT_INTENSITY_RANGE,
        ));
        for (label, param) in [
            ("Light Angle X", Param::LightPositionX),
            ("Light Angle Y", Param::LightPositionY),
            ("Light Angle Z", Param::LightPositionZ),
        ] {
            panel.add(Control::slider(label, param, LIGHT_POSITION_RANGE));
        }
        panel.add(
            Control::select(
                "Tone Mapping",
                Param::ToneMapping,
                ControlKind::tone_mapping_select(),
            )
            .on_settle(Hook::RefreshMaterials),
        );
        panel.add(Control::slider(
            "Tone Map Exposure",
            Param::ToneMappingExposure,
            EXPOSURE_RANGE,
        ));

        Self {
            env_map_intensity: ENV_INTENSITY_RANGE.constrain(config.env_map_intensity),
            settings: config.renderer,
            surface: OutputSurface::new(width, height, 1.0),
            config,
            scene,
            camera,
            controls,
            loader: AssetLoader::new(),
            panel,
            light_id,
            model_id: None,
            stats: ShowcaseStats::default(),
        }
    }

    /// Requests the environment cubemap and the model
    pub fn start_loading(&self) {
        let faces = face_paths(&self.config.env_map_path(), &self.config.env_map_extension);
        log::info!("Loading environment map from {}", self.config.env_map_path().display());
        self.loader.load_cube_texture(faces);

        let model = self.config.model_file();
        log::info!("Loading model {}", model.display());
        self.loader.load_model(model);
    }

    /// Applies every finished load; returns how many events were handled
    pub fn pump_loads(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.loader.try_recv() {
            self.handle_load_event(event);
            handled += 1;
        }
        handled
    }

    fn handle_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::CubeTextureLoaded(cube) => self.set_environment(cube),
            LoadEvent::CubeTextureFailed(e) => {
                log::error!("An error happened while loading the environment map: {}", e);
                self.stats.load_errors += 1;
            }
            LoadEvent::ModelProgress { loaded, total } => {
                let percent = if total == 0 {
                    100.0
                } else {
                    loaded as f64 / total as f64 * 100.0
                };
                log::info!("{}% loaded", percent);
            }
            LoadEvent::ModelLoaded(model) => {
                self.add_model(model);
            }
            LoadEvent::ModelFailed(e) => {
                log::error!("An error happened");
                log::error!("{}", e);
                self.stats.load_errors += 1;
            }
        }
    }

    /// Uses `cube` as both background and environment
    pub fn set_environment(&mut self, cube: CubeTexture) {
        let cube = Arc::new(cube.with_color_space(ColorSpace::Srgb));
        log::info!("Environment map ready ({}px faces)", cube.size());
        self.scene.background = Some(cube.clone());
        self.scene.environment = Some(cube);
    }

    /// Places a loaded model in the scene and binds its rotation control
    pub fn add_model(&mut self, mut model: SceneNode) -> NodeId {
        log::info!("Model has been successfully loaded!");
        model.transform.scale = Vector3::new(10.0, 10.0, 10.0);
        model.transform.position = Vector3::new(0.0, -4.0, 0.0);
        model.transform.rotation.y = PI * 0.5;

        let id = self.scene.add(model);
        self.model_id = Some(id);
        self.panel.add(Control::slider(
            "Model Rotation",
            Param::ModelRotationY(id),
            MODEL_ROTATION_RANGE,
        ));
        self.refresh_materials();
        id
    }

    /// Pushes the current env intensity to every physically-based mesh and
    /// flags it for re-upload. Returns the number of materials touched.
    pub fn refresh_materials(&mut self) -> usize {
        let intensity = self.env_map_intensity;
        let mut touched = 0;
        self.scene.traverse_mut(&mut |node| {
            let refreshed = match node.standard_mesh_mut() {
                Some(material) => {
                    material.env_map_intensity = intensity;
                    material.needs_update = true;
                    true
                }
                None => false,
            };
            if refreshed {
                node.cast_shadow = true;
                node.receive_shadow = true;
                touched += 1;
            }
        });
        self.stats.material_refreshes += 1;
        log::debug!("Refreshed {} materials", touched);
        touched
    }

    /// Current value of a bound parameter
    pub fn param(&self, param: Param) -> ParamValue {
        let light = self.light();
        match param {
            Param::EnvMapIntensity => ParamValue::Number(self.env_map_intensity),
            Param::ModelRotationY(id) => ParamValue::Number(
                self.scene
                    .node(id)
                    .map_or(0.0, |node| node.transform.rotation.y),
            ),
            Param::LightIntensity => ParamValue::Number(light.intensity),
            Param::LightPositionX => ParamValue::Number(light.position.x),
            Param::LightPositionY => ParamValue::Number(light.position.y),
            Param::LightPositionZ => ParamValue::Number(light.position.z),
            Param::ToneMapping => ParamValue::ToneMapping(self.settings.tone_mapping),
            Param::ToneMappingExposure => {
                ParamValue::Number(self.settings.tone_mapping_exposure)
            }
        }
    }

    /// Current values of every panel control, in control order
    pub fn panel_values(&self) -> Vec<ParamValue> {
        self.panel
            .controls()
            .iter()
            .map(|control| self.param(control.param))
            .collect()
    }

    fn set_param(&mut self, param: Param, value: ParamValue) {
        match (param, value) {
            (Param::ToneMapping, ParamValue::ToneMapping(tone_mapping)) => {
                self.settings.tone_mapping = tone_mapping;
            }
            (Param::EnvMapIntensity, ParamValue::Number(v)) => self.env_map_intensity = v,
            (Param::ModelRotationY(id), ParamValue::Number(v)) => {
                if let Some(node) = self.scene.node_mut(id) {
                    node.transform.rotation.y = v;
                }
            }
            (Param::ToneMappingExposure, ParamValue::Number(v)) => {
                self.settings.tone_mapping_exposure = v;
            }
            (Param::LightIntensity, ParamValue::Number(v)) => {
                if let Some(light) = self.light_mut() {
                    light.intensity = v;
                }
            }
            (
                axis @ (Param::LightPositionX | Param::LightPositionY | Param::LightPositionZ),
                ParamValue::Number(v),
            ) => {
                if let Some(light) = self.light_mut() {
                    match axis {
                        Param::LightPositionX => light.position.x = v,
                        Param::LightPositionY => light.position.y = v,
                        _ => light.position.z = v,
                    }
                }
            }
            (param, value) => log::warn!("Ignoring {:?} for {:?}", value, param),
        }
    }

    /// Applies one interaction reported by the debug panel
    pub fn apply_panel_event(&mut self, event: PanelEvent) {
        match event {
            PanelEvent::Changed(id, value) => {
                let Some(control) = self.panel.control(id) else {
                    return;
                };
                let (param, hook) = (control.param, control.on_change);
                let Some(value) = control.constrain(value) else {
                    log::warn!("'{}' rejected {:?}", control.label, value);
                    return;
                };
                self.set_param(param, value);
                self.run_hook(hook);
            }
            PanelEvent::Settled(id) => {
                if let Some(hook) = self.panel.control(id).map(|c| c.on_settle) {
                    self.run_hook(hook);
                }
            }
        }
    }

    fn run_hook(&mut self, hook: Hook) {
        match hook {
            Hook::None => {}
            Hook::RefreshMaterials => {
                self.refresh_materials();
            }
        }
    }

    /// Follows a viewport change; `width`/`height` are logical pixels.
    ///
    /// Returns the new output surface, or `None` for a zero-sized viewport.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> Option<OutputSurface> {
        if width == 0 || height == 0 {
            return None;
        }
        self.camera.aspect = width as f32 / height as f32;
        self.camera.update_projection_matrix();
        self.controls.viewport_height = height as f32;
        self.surface = OutputSurface::new(width, height, device_pixel_ratio);
        Some(self.surface)
    }

    /// One step of the render loop: drain loads, damp the camera, draw once
    pub fn tick(&mut self, renderer: &mut impl FrameRenderer) -> Result<(), RenderError> {
        self.pump_loads();
        self.controls.update(&mut self.camera);
        self.scene.update_helpers();

        let mut frame = FrameInput {
            scene: &mut self.scene,
            camera: &self.camera,
            settings: &self.settings,
            surface: self.surface,
        };
        let result = renderer.draw_frame(&mut frame);
        self.stats.frames += 1;
        result
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        self.controls.process_window_event(event)
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        self.controls.process_device_event(event, &self.camera);
    }

    /// Drops an in-progress drag, e.g. when the UI takes the mouse
    pub fn cancel_drag(&mut self) {
        self.controls.cancel_drag();
    }

    fn light(&self) -> DirectionalLight {
        match self.scene.node(self.light_id).map(|node| &node.kind) {
            Some(NodeKind::DirectionalLight(light)) => *light,
            _ => DirectionalLight::default(),
        }
    }

    fn light_mut(&mut self) -> Option<&mut DirectionalLight> {
        match self.scene.node_mut(self.light_id).map(|node| &mut node.kind) {
            Some(NodeKind::DirectionalLight(light)) => Some(light),
            _ => None,
        }
    }

    pub fn config(&self) -> &ShowcaseConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn panel(&self) -> &DebugPanel {
        &self.panel
    }

    pub fn surface(&self) -> OutputSurface {
        self.surface
    }

    pub fn env_map_intensity(&self) -> f32 {
        self.env_map_intensity
    }

    pub fn model_id(&self) -> Option<NodeId> {
        self.model_id
    }

    pub fn stats(&self) -> ShowcaseStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::LoadError,
        gfx::{
            rendering::ToneMapping,
            resources::{BasicMaterial, StandardMaterial},
            scene::{mesh::MeshNode, Mesh},
        },
    };
    use std::{
        path::PathBuf,
        time::{Duration, Instant},
    };

    #[derive(Default)]
    struct CountingRenderer {
        draws: usize,
        last_tone_mapping: Option<ToneMapping>,
        last_surface: Option<OutputSurface>,
        last_aspect: Option<f32>,
    }

    impl FrameRenderer for CountingRenderer {
        fn draw_frame(&mut self, frame: &mut FrameInput<'_>) -> Result<(), RenderError> {
            self.draws += 1;
            self.last_tone_mapping = Some(frame.settings.tone_mapping);
            self.last_surface = Some(frame.surface);
            self.last_aspect = Some(frame.camera.aspect);
            Ok(())
        }
    }

    fn triangle() -> Mesh {
        Mesh::from_attributes(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[],
            &[],
            vec![0, 1, 2],
        )
    }

    /// Two PBR meshes (one nested) and an unlit one
    fn helmet_like_model() -> SceneNode {
        let mut root = SceneNode::group("FlightHelmet");
        let mut visor = SceneNode::group("Visor");
        visor.add_child(SceneNode::mesh(
            "Glass",
            MeshNode::new(triangle(), StandardMaterial::default().into()),
        ));
        root.add_child(visor);
        root.add_child(SceneNode::mesh(
            "Leather",
            MeshNode::new(triangle(), StandardMaterial::default().into()),
        ));
        root.add_child(SceneNode::mesh(
            "Decal",
            MeshNode::new(triangle(), BasicMaterial::new("Decal", [1.0; 4]).into()),
        ));
        root
    }

    fn standard_materials(scene: &mut Scene) -> Vec<(f32, bool, bool, bool)> {
        let mut found = Vec::new();
        scene.traverse_mut(&mut |node| {
            let (cast, receive) = (node.cast_shadow, node.receive_shadow);
            if let Some(material) = node.standard_mesh_mut() {
                found.push((material.env_map_intensity, material.needs_update, cast, receive));
            }
        });
        found
    }

    fn change(showcase: &mut Showcase, label: &str, value: ParamValue) {
        let id = showcase.panel().find(label).expect("control exists");
        showcase.apply_panel_event(PanelEvent::Changed(id, value));
    }

    #[test]
    fn test_initial_scene() {
        let showcase = Showcase::new(ShowcaseConfig::default());
        assert_eq!(showcase.scene().children().len(), 2);
        assert_eq!(showcase.env_map_intensity(), 5.0);
        assert_eq!(showcase.settings().tone_mapping, ToneMapping::Reinhard);
        assert_eq!(showcase.settings().tone_mapping_exposure, 3.0);

        let light = showcase.scene().directional_light().copied().unwrap();
        assert_eq!(light.intensity, 3.0);
        assert!(light.cast_shadow);
        assert_eq!(light.shadow.map_size, 1024);
        assert_eq!(light.shadow.far, 15.0);

        let labels: Vec<&str> = showcase
            .panel()
            .controls()
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(
            labels,
            [
                "Env Map Intensity",
                "Light Intensity",
                "Light Angle X",
                "Light Angle Y",
                "Light Angle Z",
                "Tone Mapping",
                "Tone Map Exposure"
            ]
        );
        assert_eq!(showcase.panel_values().len(), labels.len());
    }

    #[test]
    fn test_resize_sets_aspect_and_caps_pixel_ratio() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        let mut renderer = CountingRenderer::default();

        for (width, height, dpr) in [(800, 600, 1.0), (1920, 1080, 3.0), (300, 900, 2.0)] {
            let surface = showcase.resize(width, height, dpr).unwrap();
            assert_eq!((surface.width, surface.height), (width, height));
            assert!(surface.pixel_ratio <= 2.0);
            assert_eq!(showcase.camera().aspect, width as f32 / height as f32);

            showcase.tick(&mut renderer).unwrap();
            assert_eq!(renderer.last_surface, Some(surface));
            assert_eq!(renderer.last_aspect, Some(width as f32 / height as f32));
        }

        assert_eq!(showcase.surface().buffer_size(), (600, 1800));
        assert!(showcase.resize(0, 600, 1.0).is_none());
        assert_eq!(showcase.surface().width, 300);
    }

    #[test]
    fn test_env_intensity_reaches_every_standard_material() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        showcase.add_model(helmet_like_model());

        for value in [0.0, 2.5, 7.31, 10.0] {
            change(&mut showcase, "Env Map Intensity", ParamValue::Number(value));
            let materials = standard_materials(&mut showcase.scene);
            assert_eq!(materials.len(), 2);
            for (intensity, needs_update, cast, receive) in materials {
                assert!((intensity - value).abs() < 1e-6);
                assert!(needs_update && cast && receive);
            }
        }
    }

    #[test]
    fn test_env_intensity_is_constrained() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        change(&mut showcase, "Env Map Intensity", ParamValue::Number(42.0));
        assert_eq!(showcase.env_map_intensity(), 10.0);
        change(&mut showcase, "Env Map Intensity", ParamValue::Number(1.234));
        assert!((showcase.env_map_intensity() - 1.23).abs() < 1e-5);
    }

    #[test]
    fn test_tone_mapping_settle_refreshes_once() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        let mut renderer = CountingRenderer::default();
        let id = showcase.panel().find("Tone Mapping").unwrap();

        for tone_mapping in ToneMapping::ALL {
            let before = showcase.stats().material_refreshes;
            showcase.apply_panel_event(PanelEvent::Changed(
                id,
                ParamValue::ToneMapping(tone_mapping),
            ));
            assert_eq!(showcase.stats().material_refreshes, before);
            showcase.apply_panel_event(PanelEvent::Settled(id));
            assert_eq!(showcase.stats().material_refreshes, before + 1);

            showcase.tick(&mut renderer).unwrap();
            assert_eq!(renderer.last_tone_mapping, Some(tone_mapping));
            assert_eq!(showcase.settings().tone_mapping as u32, tone_mapping as u32);
        }
    }

    #[test]
    fn test_light_and_exposure_controls() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        change(&mut showcase, "Light Intensity", ParamValue::Number(7.5));
        change(&mut showcase, "Light Angle X", ParamValue::Number(-9.0));
        change(&mut showcase, "Light Angle Z", ParamValue::Number(1.5));
        change(&mut showcase, "Tone Map Exposure", ParamValue::Number(1.25));

        let close = |a: f32, b: f32| (a - b).abs() < 1e-5;
        let light = showcase.scene().directional_light().copied().unwrap();
        assert!(close(light.intensity, 7.5));
        assert!(close(light.position.x, -5.0));
        assert_eq!(light.position.y, 3.0);
        assert!(close(light.position.z, 1.5));
        assert!(close(showcase.settings().tone_mapping_exposure, 1.25));
        assert_eq!(showcase.stats().material_refreshes, 0);
    }

    #[test]
    fn test_model_load_success() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        let children_before = showcase.scene().children().len();
        let controls_before = showcase.panel().controls().len();

        showcase.handle_load_event(LoadEvent::ModelProgress {
            loaded: 512,
            total: 1024,
        });
        showcase.handle_load_event(LoadEvent::ModelLoaded(helmet_like_model()));

        assert_eq!(showcase.scene().children().len(), children_before + 1);
        let id = showcase.model_id().unwrap();
        let transform = showcase.scene().node(id).unwrap().transform;
        assert_eq!(transform.scale, Vector3::new(10.0, 10.0, 10.0));
        assert_eq!(transform.position, Vector3::new(0.0, -4.0, 0.0));
        assert!((transform.rotation.y - PI / 2.0).abs() < 1e-6);

        assert_eq!(showcase.panel().controls().len(), controls_before + 1);
        let bound: Vec<&Control> = showcase
            .panel()
            .bound_to(Param::ModelRotationY(id))
            .collect();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].label, "Model Rotation");
        assert_eq!(showcase.stats().material_refreshes, 1);

        change(&mut showcase, "Model Rotation", ParamValue::Number(-1.0));
        let rotation = showcase.scene().node(id).unwrap().transform.rotation.y;
        assert!((rotation + 1.0).abs() < 1e-6);
        assert_eq!(showcase.param(Param::ModelRotationY(id)), ParamValue::Number(rotation));
    }

    #[test]
    fn test_model_load_failure_keeps_running() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        let mut renderer = CountingRenderer::default();
        let children_before = showcase.scene().children().len();
        let controls_before = showcase.panel().controls().len();

        showcase.handle_load_event(LoadEvent::ModelFailed(LoadError::UnsupportedFormat(
            PathBuf::from("helmet.fbx"),
        )));

        assert_eq!(showcase.scene().children().len(), children_before);
        assert_eq!(showcase.panel().controls().len(), controls_before);
        assert_eq!(showcase.stats().load_errors, 1);
        assert!(showcase.model_id().is_none());

        for _ in 0..3 {
            showcase.tick(&mut renderer).unwrap();
        }
        assert_eq!(renderer.draws, 3);
    }

    #[test]
    fn test_each_tick_draws_once() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        let mut renderer = CountingRenderer::default();
        for n in 1..=25 {
            showcase.tick(&mut renderer).unwrap();
            assert_eq!(renderer.draws, n);
            assert_eq!(showcase.stats().frames, n as u64);
        }
    }

    #[test]
    fn test_environment_is_shared_and_srgb() {
        let mut showcase = Showcase::new(ShowcaseConfig::default());
        showcase.handle_load_event(LoadEvent::CubeTextureLoaded(CubeTexture::solid(
            [10, 20, 30, 255],
            ColorSpace::Linear,
        )));

        let background = showcase.scene().background.clone().unwrap();
        let environment = showcase.scene().environment.clone().unwrap();
        assert!(Arc::ptr_eq(&background, &environment));
        assert_eq!(background.color_space(), ColorSpace::Srgb);
    }

    #[test]
    fn test_missing_assets_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let config = ShowcaseConfig {
            asset_root: dir.path().to_path_buf(),
            ..ShowcaseConfig::default()
        };
        let mut showcase = Showcase::new(config);
        let mut renderer = CountingRenderer::default();
        showcase.start_loading();

        let deadline = Instant::now() + Duration::from_secs(10);
        while showcase.stats().load_errors < 2 && Instant::now() < deadline {
            showcase.tick(&mut renderer).unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(showcase.stats().load_errors, 2);
        assert!(showcase.scene().background.is_none());
        assert_eq!(showcase.scene().children().len(), 2);
    }
}
