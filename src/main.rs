//! Model Viewer binary: window, event loop and CLI

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use glam::Vec2;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use model_viewer::backend::GraphicsBackend;
use model_viewer::ui::EguiEditor;
use model_viewer::{
    Command, ImportOptions, LogBuffer, MissingAttributePolicy, Viewer, ViewerConfig, WgpuBackend,
};

/// Pixels per wheel notch reported by touchpads
const PIXELS_PER_NOTCH: f64 = 50.0;

#[derive(Parser, Debug)]
#[command(name = "model-viewer")]
#[command(about = "View textured OBJ, glTF/GLB and STL models")]
struct Args {
    /// Model file to load at startup
    model: Option<PathBuf>,

    /// Initial window width
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Initial window height
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Present without waiting for vertical sync
    #[arg(long)]
    no_vsync: bool,

    /// Import meshes without normals or UVs by filling zeros instead of failing
    #[arg(long)]
    zero_fill_missing: bool,
}

impl Args {
    fn config(&self) -> ViewerConfig {
        let missing_attributes = if self.zero_fill_missing {
            MissingAttributePolicy::ZeroFill
        } else {
            MissingAttributePolicy::Reject
        };
        ViewerConfig {
            width: self.width,
            height: self.height,
            vsync: !self.no_vsync,
            import: ImportOptions { missing_attributes },
            ..Default::default()
        }
    }
}

/// Keys held for panning, as a direction
#[derive(Debug, Default)]
struct PanKeys {
    left: bool,
    right: bool,
    forward: bool,
    back: bool,
}

impl PanKeys {
    fn set(&mut self, code: KeyCode, pressed: bool) {
        match code {
            KeyCode::KeyA | KeyCode::ArrowLeft => self.left = pressed,
            KeyCode::KeyD | KeyCode::ArrowRight => self.right = pressed,
            KeyCode::KeyW | KeyCode::ArrowUp => self.forward = pressed,
            KeyCode::KeyS | KeyCode::ArrowDown => self.back = pressed,
            _ => {}
        }
    }

    fn direction(&self) -> Vec2 {
        let axis = |neg: bool, pos: bool| pos as i32 as f32 - neg as i32 as f32;
        Vec2::new(axis(self.left, self.right), axis(self.back, self.forward))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = args.config();

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .build(&event_loop)?,
    );

    let backend = WgpuBackend::new(window.clone(), config.vsync)?;
    let mut editor = EguiEditor::new(&backend, window.clone());
    let diagnostics = Arc::new(LogBuffer::new());
    let mut viewer = Viewer::new(backend, config, diagnostics);

    if let Some(path) = args.model {
        viewer.queue_mut().push(Command::LoadModel { path });
    }

    let mut cursor: Option<PhysicalPosition<f64>> = None;
    let mut pan_keys = PanKeys::default();

    event_loop.run(move |event, elwt: &EventLoopWindowTarget<()>| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { event, .. } => {
                let consumed = editor.on_window_event(&event);

                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => {
                        viewer.resize(size.width, size.height);
                        editor.set_surface_scale(
                            (size.width, size.height),
                            viewer.backend().surface_size(),
                        );
                    }
                    WindowEvent::RedrawRequested => viewer.frame(&mut editor),
                    WindowEvent::MouseWheel { delta, .. } if !editor.wants_pointer_input() => {
                        let notches = match delta {
                            MouseScrollDelta::LineDelta(_, y) => y,
                            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_NOTCH) as f32,
                        };
                        viewer.camera_input_mut().scroll_delta += notches;
                    }
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Middle,
                        ..
                    } => {
                        let pressed = state == ElementState::Pressed;
                        viewer.camera_input_mut().orbit_active =
                            pressed && !editor.wants_pointer_input();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        if let Some(last) = cursor {
                            let delta =
                                Vec2::new((position.x - last.x) as f32, (position.y - last.y) as f32);
                            viewer.camera_input_mut().mouse_delta += delta;
                        }
                        cursor = Some(position);
                    }
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                physical_key: PhysicalKey::Code(code),
                                state,
                                ..
                            },
                        ..
                    } if !consumed => {
                        pan_keys.set(code, state == ElementState::Pressed);
                        viewer.camera_input_mut().pan = pan_keys.direction();
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => window.request_redraw(),
            _ => {}
        }
    })?;

    Ok(())
}
