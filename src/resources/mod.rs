//! Resource management
//!
//! Meshes and materials live in a [`ResourceArena`] and are referenced by
//! generation-checked handles. Textures are uploaded through a
//! [`TextureLibrary`] that also owns the placeholder textures.

mod arena;
mod material;
mod mesh;
mod model;
pub mod model_cache;
mod texture;

pub use arena::*;
pub use material::*;
pub use mesh::*;
pub use model::*;
pub use texture::*;
