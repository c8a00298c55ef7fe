//! Core device abstraction
//!
//! The renderer never talks to a graphics API directly. Everything it needs
//! from the GPU goes through [`RenderDevice`], which a windowing layer
//! implements on top of the API of its choice.

use crate::backend::types::*;
use thiserror::Error;

/// Device error type
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create shader: {0}")]
    ShaderCreationFailed(String),
    #[error("Failed to create vertex array: {0}")]
    VertexArrayCreationFailed(String),
    #[error("Failed to create render target: {0}")]
    RenderTargetCreationFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Abstract graphics device
///
/// All calls are made from the thread that owns the graphics context.
/// Draw and state calls are infallible: a device that loses its context
/// reports it on the next creation call.
pub trait RenderDevice {
    // Resource creation

    /// Compile (or look up) a shader program
    fn create_shader(&mut self, desc: &ShaderDescriptor) -> BackendResult<ShaderId>;

    /// Upload interleaved float vertices and 32-bit indices
    fn create_vertex_array(
        &mut self,
        vertices: &[f32],
        indices: &[u32],
        layout: &VertexLayout,
    ) -> BackendResult<VertexArrayId>;

    /// Create a texture; `data` holds tightly packed pixels (all six faces for cube maps)
    fn create_texture(&mut self, desc: &TextureDescriptor, data: &[u8]) -> BackendResult<TextureId>;

    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferId>;

    /// Create an off-screen render target with the given attachments
    fn create_render_target(&mut self, spec: &RenderTargetSpec) -> BackendResult<RenderTargetId>;

    /// Reallocate the attachments of a render target at a new size
    fn resize_render_target(&mut self, target: RenderTargetId, width: u32, height: u32);

    // Render target access

    /// Bind a render target for drawing
    fn bind_render_target(&mut self, target: RenderTargetId);

    /// Bind the default (window) framebuffer
    fn bind_default_target(&mut self);

    /// Read one integer texel from a color attachment
    fn read_pixel(&mut self, target: RenderTargetId, attachment: usize, x: i32, y: i32) -> i32;

    /// Fill a color attachment with an integer value
    fn clear_attachment(&mut self, target: RenderTargetId, attachment: usize, value: i32);

    /// Texture backing a color attachment
    fn color_attachment(&self, target: RenderTargetId, attachment: usize) -> TextureId;

    /// Texture backing the depth attachment
    fn depth_attachment(&self, target: RenderTargetId) -> Option<TextureId>;

    // Fixed-function state

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);
    fn set_clear_color(&mut self, color: [f32; 4]);
    fn clear(&mut self, flags: ClearFlags);
    fn set_depth_test(&mut self, enabled: bool);
    fn set_depth_func(&mut self, func: DepthFunc);
    fn set_cull_face(&mut self, face: CullFace);
    fn set_blending(&mut self, enabled: bool);

    // Binding

    fn bind_shader(&mut self, shader: ShaderId);

    /// Set a named uniform on the currently bound shader
    fn set_uniform(&mut self, name: &str, value: &UniformValue);

    fn bind_texture(&mut self, slot: u32, texture: TextureId);
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId);

    /// Write data to a buffer
    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]);

    /// Attach a uniform buffer to a fixed binding point
    fn bind_uniform_buffer(&mut self, binding: u32, buffer: BufferId);

    // Draws

    fn draw(&mut self, vertex_array: VertexArrayId, vertex_count: u32);
    fn draw_indexed(&mut self, vertex_array: VertexArrayId, index_count: u32);

    /// Indexed draw sourcing one 4x4 model matrix per instance from `instances`
    fn draw_indexed_instanced(
        &mut self,
        vertex_array: VertexArrayId,
        index_count: u32,
        instances: BufferId,
        instance_count: u32,
    );

    /// Draw an immediate line list with the bound shader; every two points form a segment
    fn draw_lines(&mut self, points: &[[f32; 3]]);
}
