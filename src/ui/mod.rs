//! UI collaborator
//!
//! The viewer talks to its UI through [`EditorUi`]: once per frame the UI
//! reads a [`UiState`] snapshot and queues commands, and after the scene is
//! drawn it paints itself over the frame.

mod editor;
mod egui_integration;

pub use editor::EguiEditor;
pub use egui_integration::EguiIntegration;

use crate::backend::{FrameContext, GraphicsBackend};
use crate::command::CommandQueue;
use crate::diagnostics::LogBuffer;
use crate::resources::Model;

/// One loaded asset as shown in the assets panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    pub name: String,
}

/// Read-only description of the loaded models
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorMetadata {
    pub assets: Vec<AssetMetadata>,
}

impl EditorMetadata {
    pub fn from_models(models: &[Model]) -> Self {
        Self {
            assets: models
                .iter()
                .map(|model| AssetMetadata {
                    name: model.name.clone(),
                })
                .collect(),
        }
    }
}

/// What the UI may read during its update
#[derive(Clone, Copy)]
pub struct UiState<'a> {
    pub metadata: &'a EditorMetadata,
    pub log: &'a LogBuffer,
}

pub trait EditorUi<B: GraphicsBackend> {
    /// Build the UI for this frame. Load intents go into `commands`; they are
    /// applied after this call returns.
    fn update(&mut self, state: UiState<'_>, commands: &mut CommandQueue);

    /// Paint over the scene, after the model pass has ended
    fn render(&mut self, backend: &mut B, frame: &FrameContext);
}

/// UI that draws nothing and issues no commands
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUi;

impl<B: GraphicsBackend> EditorUi<B> for NoUi {
    fn update(&mut self, _state: UiState<'_>, _commands: &mut CommandQueue) {}

    fn render(&mut self, _backend: &mut B, _frame: &FrameContext) {}
}
