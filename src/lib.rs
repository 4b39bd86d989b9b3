//! Model Viewer - a desktop viewer for textured 3D model files
//!
//! The core imports a model file (OBJ, glTF/GLB, STL) into GPU-resident
//! meshes and materials and draws them every frame:
//! - **Scene import**: decode, post-process and validate a scene, then build
//!   materials before meshes
//! - **Texture decode**: embedded PNG/JPEG images, external image files and
//!   DDS containers with block compression, mips, arrays and cube maps
//! - **Frame loop**: camera, UI, deferred command drain, model pass, UI pass
//!   and present
//!
//! Rendering goes through the [`GraphicsBackend`](backend::GraphicsBackend)
//! trait; [`WgpuBackend`] drives a window and [`HeadlessBackend`] records
//! everything without a GPU.

pub mod backend;
pub mod camera;
pub mod command;
pub mod diagnostics;
pub mod error;
pub mod import;
pub mod resources;
pub mod scene;
pub mod ui;
pub mod viewer;

pub use backend::wgpu_backend::WgpuBackend;
pub use backend::HeadlessBackend;
pub use command::{Command, CommandQueue};
pub use diagnostics::{DiagnosticsSink, LogBuffer, LogEntry, Severity};
pub use error::{BackendError, DecodeError, ImportError, MeshError, TextureError};
pub use import::{ImportOptions, MissingAttributePolicy, ModelImporter};
pub use viewer::{FrameState, Viewer};

/// Configuration for the viewer
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Enable vsync
    pub vsync: bool,
    /// Color the model pass clears to
    pub clear_color: [f32; 4],
    pub import: ImportOptions,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Model Viewer".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            clear_color: [0.1, 0.2, 0.6, 1.0],
            import: ImportOptions::default(),
        }
    }
}
