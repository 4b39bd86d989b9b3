//! GPU device abstraction
//!
//! Provides the handle-based [`GraphicsBackend`] trait together with a wgpu
//! implementation for the desktop viewer and a recording implementation for
//! headless runs.

pub mod headless;
pub mod traits;
pub mod types;
pub mod wgpu_backend;

pub use headless::{HeadlessBackend, RecordedCommand};
pub use traits::*;
pub use types::*;
