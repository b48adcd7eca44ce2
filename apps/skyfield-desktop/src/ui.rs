use skyfield_common::FrameTime;
use skyfield_frame::FrameContext;
use skyfield_render_wgpu::GpuContext;
use skyfield_scene::SkyConfig;
use winit::event::WindowEvent;
use winit::window::Window;

/// Weight of the newest sample in the smoothed frame rate.
const FPS_SMOOTHING: f32 = 0.1;

/// Debug overlay: timing readout and sky controls.
#[derive(Debug)]
pub struct Overlay {
    visible: bool,
    sky: Option<SkyConfig>,
    last: Option<FrameTime>,
    fps: f32,
}

impl Overlay {
    pub fn new(sky: Option<SkyConfig>) -> Self {
        Self {
            visible: true,
            sky,
            last: None,
            fps: 0.0,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn record(&mut self, time: FrameTime) {
        if time.delta > 0.0 {
            let sample = (1.0 / time.delta) as f32;
            self.fps = if self.fps > 0.0 {
                self.fps + (sample - self.fps) * FPS_SMOOTHING
            } else {
                sample
            };
        }
        self.last = Some(time);
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn draw(&mut self, ui_ctx: &egui::Context, ctx: &mut FrameContext) {
        if !self.visible {
            return;
        }

        egui::Window::new("Skyfield")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ui_ctx, |ui| {
                ui.label(format!("Scene: {}", ctx.scene.name()));
                if let Some(time) = self.last {
                    ui.label(format!(
                        "Frame {}  t={:.2}s  dt={:.1}ms  ({:.0} fps)",
                        time.index,
                        time.elapsed,
                        time.delta * 1000.0,
                        self.fps
                    ));
                }
                ui.label(format!("u_time: {:.3}", ctx.scene.time().value()));
                if ctx.scene.field.is_some() {
                    ui.label(format!("Instances: {}", ctx.scene.instance_count()));
                }
                let eye = ctx.camera.position;
                ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", eye.x, eye.y, eye.z));

                if let Some(sky) = &mut self.sky {
                    ui.separator();
                    ui.heading("Sky");
                    let mut changed = false;
                    changed |= ui
                        .add(egui::Slider::new(&mut sky.elevation, -0.2..=1.5).text("sun elevation"))
                        .changed();
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut sky.azimuth, -std::f32::consts::PI..=std::f32::consts::PI)
                                .text("sun azimuth"),
                        )
                        .changed();
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut sky.fog_fade, 0.0..=0.05)
                                .logarithmic(true)
                                .text("fog fade"),
                        )
                        .changed();
                    if changed {
                        ctx.scene.set_sky(sky);
                    }
                }

                ui.separator();
                ui.small("F1: overlay | LMB: orbit | RMB/Shift: pan | Wheel: zoom | Esc: quit");
            });
    }
}

/// egui input, tessellation and painting for one window.
pub struct EguiLayer {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl EguiLayer {
    pub fn new(window: &Window, gpu: &GpuContext) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.format(), None, 1, false);
        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Feed a window event to egui; returns whether egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Run `build` and paint the result over `view`.
    pub fn paint(
        &mut self,
        window: &Window,
        gpu: &GpuContext,
        view: &wgpu::TextureView,
        build: impl FnMut(&egui::Context),
    ) {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, build);
        self.state
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let (width, height) = gpu.size();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [width, height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}
