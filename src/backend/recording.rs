//! Recording device for tests and headless runs.
//!
//! This device doesn't touch a GPU. Every call is appended to a command log
//! that tests inspect afterwards; buffer writes are kept so uniform data can
//! be read back.

use std::collections::HashMap;

use super::traits::{BackendResult, RenderDevice};
use super::types::*;

/// One call made against a [`RecordingDevice`]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    BindRenderTarget(RenderTargetId),
    BindDefaultTarget,
    ResizeRenderTarget {
        target: RenderTargetId,
        width: u32,
        height: u32,
    },
    ClearAttachment {
        target: RenderTargetId,
        attachment: usize,
        value: i32,
    },
    SetViewport {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    SetClearColor([f32; 4]),
    Clear(ClearFlags),
    SetDepthTest(bool),
    SetDepthFunc(DepthFunc),
    SetCullFace(CullFace),
    SetBlending(bool),
    BindShader(ShaderId),
    SetUniform {
        name: String,
        value: UniformValue,
    },
    BindTexture {
        slot: u32,
        texture: TextureId,
    },
    BindVertexArray(VertexArrayId),
    WriteBuffer {
        buffer: BufferId,
        offset: u64,
        len: usize,
    },
    BindUniformBuffer {
        binding: u32,
        buffer: BufferId,
    },
    Draw {
        vertex_array: VertexArrayId,
        vertex_count: u32,
    },
    DrawIndexed {
        vertex_array: VertexArrayId,
        index_count: u32,
    },
    DrawIndexedInstanced {
        vertex_array: VertexArrayId,
        index_count: u32,
        instances: BufferId,
        instance_count: u32,
    },
    DrawLines {
        vertex_count: u32,
    },
}

impl DeviceCommand {
    /// Whether this command issues geometry
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            DeviceCommand::Draw { .. }
                | DeviceCommand::DrawIndexed { .. }
                | DeviceCommand::DrawIndexedInstanced { .. }
                | DeviceCommand::DrawLines { .. }
        )
    }
}

#[derive(Debug)]
struct TargetRecord {
    spec: RenderTargetSpec,
    color: Vec<TextureId>,
    depth: Option<TextureId>,
    cleared: HashMap<usize, i32>,
}

/// Device that records calls instead of executing them
#[derive(Debug, Default)]
pub struct RecordingDevice {
    next_id: u32,
    commands: Vec<DeviceCommand>,
    shaders: HashMap<ShaderId, String>,
    vertex_arrays: HashMap<VertexArrayId, usize>,
    textures: HashMap<TextureId, TextureDescriptor>,
    buffers: HashMap<BufferId, Vec<u8>>,
    targets: HashMap<RenderTargetId, TargetRecord>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn push(&mut self, command: DeviceCommand) {
        log::trace!("RecordingDevice: {:?}", command);
        self.commands.push(command);
    }

    /// All commands recorded so far
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Current contents of a buffer
    pub fn buffer_contents(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(Vec::as_slice)
    }

    /// Name the shader was created with
    pub fn shader_name(&self, shader: ShaderId) -> Option<&str> {
        self.shaders.get(&shader).map(String::as_str)
    }

    /// Number of indices uploaded with a vertex array
    pub fn index_count(&self, vertex_array: VertexArrayId) -> Option<usize> {
        self.vertex_arrays.get(&vertex_array).copied()
    }

    pub fn texture_descriptor(&self, texture: TextureId) -> Option<&TextureDescriptor> {
        self.textures.get(&texture)
    }

    /// Current specification of a render target, including resizes
    pub fn render_target_spec(&self, target: RenderTargetId) -> Option<&RenderTargetSpec> {
        self.targets.get(&target).map(|t| &t.spec)
    }

    /// Number of draw commands of any kind
    pub fn draw_call_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Instanced draws as `(vertex_array, instance_count)` in submission order
    pub fn instanced_draws(&self) -> Vec<(VertexArrayId, u32)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DeviceCommand::DrawIndexedInstanced {
                    vertex_array,
                    instance_count,
                    ..
                } => Some((*vertex_array, *instance_count)),
                _ => None,
            })
            .collect()
    }

    /// Most recent value written to a named uniform
    pub fn last_uniform(&self, name: &str) -> Option<&UniformValue> {
        self.commands.iter().rev().find_map(|c| match c {
            DeviceCommand::SetUniform { name: n, value } if n == name => Some(value),
            _ => None,
        })
    }
}

impl RenderDevice for RecordingDevice {
    fn create_shader(&mut self, desc: &ShaderDescriptor) -> BackendResult<ShaderId> {
        let id = ShaderId(self.next());
        log::trace!("RecordingDevice: creating shader {} ({:?})", desc.name, id);
        self.shaders.insert(id, desc.name.clone());
        Ok(id)
    }

    fn create_vertex_array(
        &mut self,
        vertices: &[f32],
        indices: &[u32],
        layout: &VertexLayout,
    ) -> BackendResult<VertexArrayId> {
        let id = VertexArrayId(self.next());
        log::trace!(
            "RecordingDevice: creating vertex array {:?} ({} floats, stride {}, {} indices)",
            id,
            vertices.len(),
            layout.stride(),
            indices.len()
        );
        self.vertex_arrays.insert(id, indices.len());
        Ok(id)
    }

    fn create_texture(&mut self, desc: &TextureDescriptor, data: &[u8]) -> BackendResult<TextureId> {
        let id = TextureId(self.next());
        log::trace!(
            "RecordingDevice: creating texture {:?} ({}x{}, {} bytes)",
            desc.label,
            desc.width,
            desc.height,
            data.len()
        );
        self.textures.insert(id, desc.clone());
        Ok(id)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> BackendResult<BufferId> {
        let id = BufferId(self.next());
        log::trace!(
            "RecordingDevice: creating buffer {:?} (size: {})",
            desc.label,
            desc.size
        );
        self.buffers.insert(id, vec![0; desc.size as usize]);
        Ok(id)
    }

    fn create_render_target(&mut self, spec: &RenderTargetSpec) -> BackendResult<RenderTargetId> {
        let id = RenderTargetId(self.next());
        let color = (0..spec.color_attachment_count())
            .map(|_| TextureId(self.next()))
            .collect();
        let depth = spec.depth_attachment().map(|_| TextureId(self.next()));
        self.targets.insert(
            id,
            TargetRecord {
                spec: spec.clone(),
                color,
                depth,
                cleared: HashMap::new(),
            },
        );
        Ok(id)
    }

    fn resize_render_target(&mut self, target: RenderTargetId, width: u32, height: u32) {
        if let Some(record) = self.targets.get_mut(&target) {
            record.spec.width = width as f32;
            record.spec.height = height as f32;
        }
        self.push(DeviceCommand::ResizeRenderTarget {
            target,
            width,
            height,
        });
    }

    fn bind_render_target(&mut self, target: RenderTargetId) {
        self.push(DeviceCommand::BindRenderTarget(target));
    }

    fn bind_default_target(&mut self) {
        self.push(DeviceCommand::BindDefaultTarget);
    }

    fn read_pixel(&mut self, target: RenderTargetId, attachment: usize, _x: i32, _y: i32) -> i32 {
        self.targets
            .get(&target)
            .and_then(|t| t.cleared.get(&attachment).copied())
            .unwrap_or(0)
    }

    fn clear_attachment(&mut self, target: RenderTargetId, attachment: usize, value: i32) {
        if let Some(record) = self.targets.get_mut(&target) {
            record.cleared.insert(attachment, value);
        }
        self.push(DeviceCommand::ClearAttachment {
            target,
            attachment,
            value,
        });
    }

    fn color_attachment(&self, target: RenderTargetId, attachment: usize) -> TextureId {
        self.targets
            .get(&target)
            .and_then(|t| t.color.get(attachment).copied())
            .unwrap_or(TextureId(0))
    }

    fn depth_attachment(&self, target: RenderTargetId) -> Option<TextureId> {
        self.targets.get(&target).and_then(|t| t.depth)
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.push(DeviceCommand::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.push(DeviceCommand::SetClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.push(DeviceCommand::Clear(flags));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.push(DeviceCommand::SetDepthTest(enabled));
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.push(DeviceCommand::SetDepthFunc(func));
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.push(DeviceCommand::SetCullFace(face));
    }

    fn set_blending(&mut self, enabled: bool) {
        self.push(DeviceCommand::SetBlending(enabled));
    }

    fn bind_shader(&mut self, shader: ShaderId) {
        self.push(DeviceCommand::BindShader(shader));
    }

    fn set_uniform(&mut self, name: &str, value: &UniformValue) {
        self.push(DeviceCommand::SetUniform {
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) {
        self.push(DeviceCommand::BindTexture { slot, texture });
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.push(DeviceCommand::BindVertexArray(vertex_array));
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) {
        if let Some(contents) = self.buffers.get_mut(&buffer) {
            let start = offset as usize;
            let end = start + data.len();
            if contents.len() < end {
                contents.resize(end, 0);
            }
            contents[start..end].copy_from_slice(data);
        }
        self.push(DeviceCommand::WriteBuffer {
            buffer,
            offset,
            len: data.len(),
        });
    }

    fn bind_uniform_buffer(&mut self, binding: u32, buffer: BufferId) {
        self.push(DeviceCommand::BindUniformBuffer { binding, buffer });
    }

    fn draw(&mut self, vertex_array: VertexArrayId, vertex_count: u32) {
        self.push(DeviceCommand::Draw {
            vertex_array,
            vertex_count,
        });
    }

    fn draw_indexed(&mut self, vertex_array: VertexArrayId, index_count: u32) {
        self.push(DeviceCommand::DrawIndexed {
            vertex_array,
            index_count,
        });
    }

    fn draw_indexed_instanced(
        &mut self,
        vertex_array: VertexArrayId,
        index_count: u32,
        instances: BufferId,
        instance_count: u32,
    ) {
        self.push(DeviceCommand::DrawIndexedInstanced {
            vertex_array,
            index_count,
            instances,
            instance_count,
        });
    }

    fn draw_lines(&mut self, points: &[[f32; 3]]) {
        self.push(DeviceCommand::DrawLines {
            vertex_count: points.len() as u32,
        });
    }
}
