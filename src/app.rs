//! winit window glue
//!
//! Creates the window, the render engine and the UI once the event loop
//! resumes, then routes input to the UI or the camera controls and runs one
//! [`Showcase::tick`] per redraw.

use anyhow::Context as _;
use std::sync::Arc;
use wgpu::{CommandEncoder, Device, Queue, TextureView};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{DeviceEvent, DeviceId, ElementState, Event, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::ShowcaseConfig,
    gfx::rendering::{FrameInput, FrameRenderer, RenderEngine, RenderError},
    showcase::Showcase,
    ui::UiManager,
};

pub struct ShowcaseApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    showcase: Showcase,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    /// Set when the loop had to stop because of an unrecoverable error
    fatal: Option<anyhow::Error>,
}

/// Renders a frame through the engine with the debug UI on top
struct WindowFrame<'a> {
    engine: &'a mut RenderEngine,
    ui: &'a mut UiManager,
}

impl FrameRenderer for WindowFrame<'_> {
    fn draw_frame(&mut self, frame: &mut FrameInput<'_>) -> Result<(), RenderError> {
        let ui = &mut *self.ui;
        self.engine.render_frame(
            frame,
            Some(
                |device: &Device,
                 queue: &Queue,
                 encoder: &mut CommandEncoder,
                 view: &TextureView| {
                    ui.render_display_only(device, queue, encoder, view);
                },
            ),
        )
    }
}

impl ShowcaseApp {
    pub fn new(config: ShowcaseConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("Failed to create event loop")?;
        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                showcase: Showcase::new(config),
                window: None,
                render_engine: None,
                ui_manager: None,
                fatal: None,
            },
        })
    }

    /// Runs until the window is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("Event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("Failed to run event loop")?;

        match self.app_state.fatal.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let config = self.showcase.config();
        let (width, height) = config.window_size;
        let window = event_loop
            .create_window(
                WindowAttributes::default()
                    .with_title(config.window_title.clone())
                    .with_inner_size(LogicalSize::new(width, height)),
            )
            .context("Failed to create window")?;
        let window = Arc::new(window);

        let PhysicalSize { width, height } = window.inner_size();
        let settings = *self.showcase.settings();
        let render_engine = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            &settings,
        ))
        .context("Failed to initialise the renderer")?;

        let ui_manager = UiManager::new(
            render_engine.device(),
            render_engine.queue(),
            render_engine.surface_format(),
            &window,
        );

        self.window = Some(window.clone());
        self.render_engine = Some(render_engine);
        self.ui_manager = Some(ui_manager);
        self.resize(&window, window.inner_size());

        self.showcase.start_loading();
        Ok(())
    }

    /// Converts the physical window size to logical pixels for the showcase
    /// and sizes the surface after the capped pixel ratio
    fn resize(&mut self, window: &Window, size: PhysicalSize<u32>) {
        let scale_factor = window.scale_factor();
        let logical: LogicalSize<f64> = size.to_logical(scale_factor);
        let Some(surface) = self.showcase.resize(
            logical.width.round() as u32,
            logical.height.round() as u32,
            scale_factor,
        ) else {
            return;
        };

        let (width, height) = surface.buffer_size();
        if let Some(render_engine) = self.render_engine.as_mut() {
            render_engine.resize(width, height);
        }
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            ui_manager.update_display_size(width, height);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window: &Window) {
        let (Some(render_engine), Some(ui_manager)) =
            (self.render_engine.as_mut(), self.ui_manager.as_mut())
        else {
            return;
        };

        let values = self.showcase.panel_values();
        let panel = self.showcase.panel();
        let events = ui_manager
            .update_logic(window, |ui| panel.draw(ui, &values))
            .unwrap_or_default();
        for event in events {
            self.showcase.apply_panel_event(event);
        }

        let mut frame = WindowFrame {
            engine: render_engine,
            ui: ui_manager,
        };
        match self.showcase.tick(&mut frame) {
            Ok(()) => {}
            Err(RenderError::OutOfMemory) => {
                log::error!("Out of GPU memory, exiting");
                self.fatal = Some(RenderError::OutOfMemory.into());
                event_loop.exit();
            }
            Err(e) => log::error!("Frame failed: {}", e),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("{:#}", e);
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: Event<()> = Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                if matches!(event, WindowEvent::MouseInput { .. }) {
                    self.showcase.cancel_drag();
                }
                return;
            }
        }

        self.showcase.handle_window_event(&event);

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(&window, size),
            WindowEvent::ScaleFactorChanged { .. } => self.resize(&window, window.inner_size()),
            WindowEvent::RedrawRequested => self.redraw(event_loop, &window),
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        // Camera ignores the mouse while the UI wants it
        if self
            .ui_manager
            .as_ref()
            .is_some_and(|ui_manager| ui_manager.wants_mouse())
        {
            return;
        }

        self.showcase.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
