mod pointer;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use skyfield_frame::{FrameContext, FrameError, FrameLoop, StopReason};
use skyfield_render_wgpu::{GpuContext, SurfaceAction, WgpuRenderer};
use skyfield_scene::{Scene, SceneConfig, preset};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::pointer::Pointer;
use crate::ui::{EguiLayer, Overlay};

#[derive(Parser)]
#[command(name = "skyfield-desktop", about = "Skyfield scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Built-in preset name
    #[arg(long, default_value = "grass")]
    scene: String,

    /// Scene YAML file; overrides --scene
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the field placement seed
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn scene_config(&self) -> Result<SceneConfig> {
        let mut config = match &self.config {
            Some(path) => SceneConfig::from_yaml_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => preset(&self.scene)?,
        };
        if let Some(seed) = self.seed {
            config.reseed(seed);
        }
        Ok(config)
    }
}

/// GPU resources, created once the window exists.
struct Surface {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: WgpuRenderer,
    egui: EguiLayer,
}

struct Viewer {
    frame_loop: FrameLoop,
    ctx: FrameContext,
    overlay: Overlay,
    pointer: Pointer,
    surface: Option<Surface>,
    failure: Option<anyhow::Error>,
}

impl Viewer {
    fn new(scene: Scene, config: &SceneConfig) -> Self {
        Self {
            frame_loop: FrameLoop::monotonic(),
            ctx: FrameContext::new(scene),
            overlay: Overlay::new(config.sky),
            pointer: Pointer::default(),
            surface: None,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.frame_loop.cancel_token().cancel();
        self.failure = Some(err);
        event_loop.exit();
    }

    fn create_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<Surface> {
        let attrs = Window::default_attributes()
            .with_title(format!("Skyfield: {}", self.ctx.scene.name()))
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("creating window")?,
        );

        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new(window.clone(), size.width, size.height))
            .context("initialising GPU")?;
        let (width, height) = gpu.size();
        self.ctx.resize(width, height);

        let renderer = WgpuRenderer::new(&gpu.device, gpu.format(), width, height, &self.ctx.scene);
        let egui = EguiLayer::new(&window, &gpu);

        Ok(Surface {
            window,
            gpu,
            renderer,
            egui,
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(surface) = &mut self.surface else {
            return;
        };

        let output = match surface.gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(err) => {
                match surface.gpu.recover(err.clone()) {
                    SurfaceAction::Fatal => {
                        self.fail(event_loop, anyhow::anyhow!("surface lost: {err}"));
                        return;
                    }
                    action => tracing::debug!(?action, "skipping frame: {err}"),
                }
                surface.window.request_redraw();
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut target = surface
            .renderer
            .target(&surface.gpu.device, &surface.gpu.queue, &view);
        match self.frame_loop.tick(&mut self.ctx, &mut target) {
            Ok(time) => self.overlay.record(time),
            Err(FrameError::Stopped(reason)) => {
                tracing::debug!(%reason, "redraw after stop");
                event_loop.exit();
                return;
            }
            Err(err) => {
                self.fail(event_loop, err.into());
                return;
            }
        }

        let (overlay, ctx) = (&mut self.overlay, &mut self.ctx);
        surface
            .egui
            .paint(&surface.window, &surface.gpu, &view, |ui_ctx| {
                overlay.draw(ui_ctx, ctx)
            });

        output.present();
        // Re-register for the next refresh
        surface.window.request_redraw();
    }

    fn viewport_height(&self) -> f32 {
        self.surface
            .as_ref()
            .map_or(1.0, |s| s.gpu.size().1 as f32)
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => {
                self.frame_loop.cancel_token().cancel();
                event_loop.exit();
            }
            KeyCode::F1 => self.overlay.toggle(),
            _ => {}
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_some() {
            return;
        }
        match self.create_surface(event_loop) {
            Ok(surface) => {
                surface.window.request_redraw();
                self.surface = Some(surface);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(surface) = &mut self.surface {
            if surface.egui.on_window_event(&surface.window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.frame_loop.stop(StopReason::HostTeardown);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(surface) = &mut self.surface {
                    if surface.gpu.resize(size.width, size.height) {
                        surface
                            .renderer
                            .resize(&surface.gpu.device, size.width, size.height);
                        self.ctx.resize(size.width, size.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, key),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.pointer.set_shift(modifiers.state().shift_key());
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.pointer.button(button, state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(action) = self.pointer.moved(position.x as f32, position.y as f32) {
                    let viewport = self.viewport_height();
                    self.ctx.controls.apply(action, &self.ctx.camera, viewport);
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.left(),
            WindowEvent::MouseWheel { delta, .. } => {
                let viewport = self.viewport_height();
                self.ctx
                    .controls
                    .apply(pointer::wheel(delta), &self.ctx.camera, viewport);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.scene_config()?;
    let scene = Scene::build(&config)?;
    tracing::info!(
        scene = scene.name(),
        instances = scene.instance_count(),
        "skyfield-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut viewer = Viewer::new(scene, &config);
    event_loop.run_app(&mut viewer)?;

    if let Some(err) = viewer.failure.take() {
        return Err(err);
    }
    tracing::info!(state = ?viewer.frame_loop.state(), "skyfield-desktop exiting");
    Ok(())
}
