//! GPU-resident resources
//!
//! Meshes, materials, textures and the models that own them, plus the
//! builder that creates their GPU objects.

mod builder;
pub mod dds;
mod material;
mod mesh;
mod model;
mod texture;

pub use builder::*;
pub use material::*;
pub use mesh::*;
pub use model::*;
pub use texture::*;
