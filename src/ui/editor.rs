//! egui editor shell: menu bar, open-model dialog, assets and log panels

use std::path::PathBuf;
use std::sync::Arc;

use winit::event::WindowEvent;
use winit::window::Window;

use super::{EditorMetadata, EditorUi, EguiIntegration, UiState};
use crate::backend::wgpu_backend::WgpuBackend;
use crate::backend::FrameContext;
use crate::command::{Command, CommandQueue};
use crate::diagnostics::{LogBuffer, LogEntry, Severity};

pub struct EguiEditor {
    window: Arc<Window>,
    egui: EguiIntegration,
    /// Contents of the open-model dialog while it is shown
    open_dialog: Option<String>,
    show_log: bool,
}

impl EguiEditor {
    pub fn new(backend: &WgpuBackend, window: Arc<Window>) -> Self {
        let egui = EguiIntegration::new(backend, &window);
        Self {
            window,
            egui,
            open_dialog: None,
            show_log: true,
        }
    }

    /// Returns true if egui consumed the event
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.egui.on_window_event(&self.window, event)
    }

    pub fn set_surface_scale(&mut self, window: (u32, u32), surface: (u32, u32)) {
        self.egui.set_surface_scale(window, surface);
    }

    /// Whether the pointer is over an egui panel
    pub fn wants_pointer_input(&self) -> bool {
        self.egui.wants_pointer_input()
    }
}

impl EditorUi<WgpuBackend> for EguiEditor {
    fn update(&mut self, state: UiState<'_>, commands: &mut CommandQueue) {
        let Self {
            window,
            egui,
            open_dialog,
            show_log,
        } = self;

        egui.run(&**window, |ctx| {
            let dropped: Vec<PathBuf> = ctx.input(|input| {
                input
                    .raw
                    .dropped_files
                    .iter()
                    .filter_map(|file| file.path.clone())
                    .collect()
            });
            for path in dropped {
                commands.push(Command::LoadModel { path });
            }

            draw_menu_bar(ctx, open_dialog, show_log);
            draw_assets_panel(ctx, state.metadata);
            if *show_log {
                draw_log_panel(ctx, state.log);
            }
            if let Some(path) = draw_open_dialog(ctx, open_dialog) {
                commands.push(Command::LoadModel { path });
            }
        });
    }

    fn render(&mut self, backend: &mut WgpuBackend, frame: &FrameContext) {
        self.egui.paint(backend, frame);
    }
}

fn draw_menu_bar(ctx: &egui::Context, open_dialog: &mut Option<String>, show_log: &mut bool) {
    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Model…").clicked() {
                    open_dialog.get_or_insert_with(String::new);
                    ui.close_menu();
                }
            });
            ui.menu_button("View", |ui| {
                if ui.checkbox(show_log, "Log").clicked() {
                    ui.close_menu();
                }
            });
        });
    });
}

fn draw_assets_panel(ctx: &egui::Context, metadata: &EditorMetadata) {
    egui::SidePanel::left("assets")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Assets");
            ui.separator();
            if metadata.assets.is_empty() {
                ui.weak("No model loaded");
            }
            for asset in &metadata.assets {
                ui.label(&asset.name);
            }
        });
}

fn draw_log_panel(ctx: &egui::Context, log: &LogBuffer) {
    let entries = log.snapshot();
    egui::TopBottomPanel::bottom("log")
        .resizable(true)
        .default_height(140.0)
        .show(ctx, |ui| {
            ui.heading("Log");
            ui.separator();

            let row_height = ui.text_style_height(&egui::TextStyle::Monospace) + 2.0;
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .stick_to_bottom(true)
                .show_rows(ui, row_height, entries.len(), |ui, rows| {
                    for entry in &entries[rows] {
                        ui.label(log_line(entry));
                    }
                });
        });
}

fn log_line(entry: &LogEntry) -> egui::RichText {
    let color = match entry.severity {
        Severity::Info => egui::Color32::LIGHT_GRAY,
        Severity::Warning => egui::Color32::from_rgb(230, 180, 60),
        Severity::Error => egui::Color32::from_rgb(230, 80, 80),
    };
    egui::RichText::new(entry.as_line()).color(color).monospace()
}

/// Returns the path to load once the dialog is confirmed
fn draw_open_dialog(ctx: &egui::Context, open_dialog: &mut Option<String>) -> Option<PathBuf> {
    let text = open_dialog.as_mut()?;
    let mut open = true;
    let mut confirmed = false;
    let mut cancelled = false;

    egui::Window::new("Open Model")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label("Path to an .obj, .gltf, .glb or .stl file:");
            let response = ui.text_edit_singleline(text);
            if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                confirmed = true;
            }
            ui.horizontal(|ui| {
                confirmed |= ui.button("Open").clicked();
                cancelled = ui.button("Cancel").clicked();
            });
        });

    let path = text.trim().to_string();
    if confirmed && !path.is_empty() {
        *open_dialog = None;
        return Some(PathBuf::from(path));
    }
    if cancelled || !open {
        *open_dialog = None;
    }
    None
}
