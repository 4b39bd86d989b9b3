//! egui on the wgpu backend
//!
//! Owns the egui context, the winit input state and the egui-wgpu renderer.
//! A frame is built with [`EguiIntegration::run`] and painted later with
//! [`EguiIntegration::paint`], once the model pass has been recorded.

use egui::ViewportId;
use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::backend::wgpu_backend::WgpuBackend;
use crate::backend::FrameContext;

pub struct EguiIntegration {
    ctx: egui::Context,
    winit_state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    /// Tessellated output of the last `run`, consumed by `paint`
    paint_jobs: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    /// Surface size over window size, when the surface is clamped
    input_scale: f32,
}

impl EguiIntegration {
    pub fn new(backend: &WgpuBackend, window: &Window) -> Self {
        let ctx = egui::Context::default();
        let winit_state = egui_winit::State::new(
            ctx.clone(),
            ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
        );
        let renderer =
            egui_wgpu::Renderer::new(backend.device(), backend.wgpu_surface_format(), None, 1);

        Self {
            ctx,
            winit_state,
            renderer,
            paint_jobs: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            input_scale: 1.0,
        }
    }

    /// Track a surface smaller than the window so pointer positions line up
    pub fn set_surface_scale(&mut self, window: (u32, u32), surface: (u32, u32)) {
        if window.0 == 0 || window.1 == 0 {
            return;
        }
        let scale_x = surface.0 as f32 / window.0 as f32;
        let scale_y = surface.1 as f32 / window.1 as f32;
        self.input_scale = scale_x.min(scale_y);
    }

    /// Feed a window event to egui. Returns true if egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let scaled = match event {
            WindowEvent::CursorMoved {
                device_id,
                position,
            } if self.input_scale != 1.0 => Some(WindowEvent::CursorMoved {
                device_id: *device_id,
                position: winit::dpi::PhysicalPosition::new(
                    position.x * self.input_scale as f64,
                    position.y * self.input_scale as f64,
                ),
            }),
            _ => None,
        };

        self.winit_state
            .on_window_event(window, scaled.as_ref().unwrap_or(event))
            .consumed
    }

    /// Run one egui pass, building the UI with `build`
    pub fn run(&mut self, window: &Window, build: impl FnMut(&egui::Context)) {
        let mut raw_input = self.winit_state.take_egui_input(window);
        if self.input_scale != 1.0 {
            if let Some(rect) = &mut raw_input.screen_rect {
                rect.max.x *= self.input_scale;
                rect.max.y *= self.input_scale;
            }
        }

        let output = self.ctx.run(raw_input, build);
        self.winit_state
            .handle_platform_output(window, output.platform_output);

        self.paint_jobs = self.ctx.tessellate(output.shapes, output.pixels_per_point);
        self.textures_delta.append(output.textures_delta);
    }

    /// Draw the last pass over the frame's swapchain image
    pub fn paint(&mut self, backend: &mut WgpuBackend, frame: &FrameContext) {
        let screen_descriptor = ScreenDescriptor {
            size_in_pixels: [frame.width, frame.height],
            pixels_per_point: self.ctx.pixels_per_point(),
        };

        let (device, queue, encoder) = backend.device_queue_encoder();
        for (id, delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        if let Some(encoder) = encoder {
            self.renderer.update_buffers(
                device,
                queue,
                encoder,
                &self.paint_jobs,
                &screen_descriptor,
            );
        }

        backend.render_egui(
            &self.renderer,
            &self.paint_jobs,
            &screen_descriptor,
            frame.swapchain_view,
        );

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }
        self.textures_delta = egui::TexturesDelta::default();
    }

    pub fn context(&self) -> &egui::Context {
        &self.ctx
    }

    pub fn wants_pointer_input(&self) -> bool {
        self.ctx.wants_pointer_input()
    }
}
