//! Render Core - frame-synchronous scene renderer over an abstract device
//!
//! The crate turns a scene of transformed meshes, materials and lights into
//! an ordered, culled sequence of device commands.
//!
//! # Features
//! - Frustum culling of world-space bounding boxes
//! - Automatic instanced batching keyed on mesh and shader identity
//! - Front-to-back opaque and back-to-front transparent ordering
//! - Four-cascade directional shadow maps
//! - Per-viewport HDR geometry pass with exposure/gamma tone mapping
//! - Binary model cache and placeholder-backed texture loading
//!
//! All GPU work goes through the [`backend::RenderDevice`] trait. The
//! [`backend::RecordingDevice`] implementation records calls instead of
//! executing them and is what the tests run against.

pub mod backend;
pub mod error;
pub mod frustum;
pub mod math;
pub mod render_target;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod scene_renderer;

pub use backend::{RecordingDevice, RenderDevice};
pub use error::{ModelCacheError, ModelCacheResult, ResourceError, ResourceResult};
pub use frustum::Frustum;
pub use math::{Aabb, Ray};
pub use render_target::{RenderTarget, ShadowMap};
pub use renderer::{Renderer, RendererShaders, RendererState, RenderStats};
pub use scene::{Camera, LightEnvironment, Projection, Scene, SceneSource};
pub use scene_renderer::{SceneRenderer, SceneRendererSettings};

/// Configuration for a [`Renderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Side length of each square shadow cascade layer
    pub shadow_map_size: u32,
    /// Far distance of each shadow cascade, in world units
    pub cascade_splits: [f32; 4],
    /// Depth stretch applied to each cascade's light-space box. Tuned
    /// empirically rather than derived.
    pub cascade_z_multiplier: f32,
    /// Upper bound on instances in one draw call
    pub max_instances: usize,
    /// Clear color for scene targets
    pub clear_color: [f32; 4],
    /// Size of the default framebuffer until the first resize
    pub window_size: (u32, u32),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            shadow_map_size: 4096,
            cascade_splits: [7.0, 25.0, 90.0, 1000.0],
            cascade_z_multiplier: 10.0,
            max_instances: 10_000,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            window_size: (1280, 720),
        }
    }
}
