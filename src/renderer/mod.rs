//! Frame renderer
//!
//! [`Renderer`] drives one frame at a time:
//!
//! 1. [`Renderer::begin_scene`] binds the target, clears it, extracts the
//!    camera frustum and uploads the light block.
//! 2. [`Renderer::submit`] culls each mesh against the frustum and queues a
//!    packet in the opaque or transparent list.
//! 3. [`Renderer::end_scene`] sorts both lists, fits and rasterizes the
//!    shadow cascades, then draws opaque and transparent batches with one
//!    instanced draw per batch.
//!
//! The renderer never owns the device; every call that touches the GPU
//! takes it as a parameter.

mod queue;
pub mod shadow;

pub use queue::*;
pub use shadow::{calculate_shadow_data, GpuShadowData};

use glam::{Mat3, Mat4, Vec3};

use crate::backend::*;
use crate::frustum::Frustum;
use crate::render_target::{RenderTarget, ShadowMap};
use crate::resources::{
    MaterialHandle, Mesh, MeshData, MeshHandle, Model, ResourceArena, MAX_TEXTURE_SLOTS,
};
use crate::scene::{Camera, GpuLightBuffer, LightEnvironment};
use crate::RendererConfig;

/// Texture unit the shadow map array is sampled from
pub const SHADOW_MAP_SLOT: u32 = 31;
/// Texture unit the environment cube map is sampled from
pub const ENVIRONMENT_SLOT: u32 = 30;
/// Uniform buffer binding of the light block
pub const LIGHT_BUFFER_BINDING: u32 = 1;
/// Uniform buffer binding of the shadow block
pub const SHADOW_BUFFER_BINDING: u32 = 2;

const MAT4_SIZE: u64 = std::mem::size_of::<Mat4>() as u64;

/// Lifecycle state of a [`Renderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Idle,
    SceneActive,
    Flushing,
}

/// Pass a batch was drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    Shadow,
    Opaque,
    Transparent,
}

/// One instanced draw issued during the last flush
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchRecord {
    pub pass: RenderPass,
    pub vertex_array: VertexArrayId,
    /// Material shader; the depth shader for shadow batches
    pub shader: ShaderId,
    pub instance_count: u32,
    pub first_distance_sq: f32,
    pub last_distance_sq: f32,
}

/// Counters for the current or last frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub submitted: u32,
    pub culled: u32,
    pub opaque_packets: u32,
    pub transparent_packets: u32,
    pub batches: u32,
    pub draw_calls: u32,
    pub shader_binds: u32,
    pub texture_binds: u32,
}

/// Shaders the renderer uses for its own passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererShaders {
    pub shadow_depth: ShaderId,
    pub skybox: ShaderId,
    /// Flat-color line shader for bounding box overlays
    pub debug_lines: Option<ShaderId>,
}

#[derive(Debug, Clone, Copy)]
struct TargetBinding {
    id: RenderTargetId,
    width: u32,
    height: u32,
}

/// Culls, sorts and batches one frame of draws into device commands
pub struct Renderer {
    config: RendererConfig,
    shaders: RendererShaders,
    state: RendererState,

    camera: Camera,
    view: Mat4,
    view_projection: Mat4,
    frustum: Frustum,
    light_direction: Vec3,
    environment: Option<TextureId>,
    current_target: Option<TargetBinding>,
    window_size: (u32, u32),
    show_bounding_boxes: bool,

    queue: RenderQueue,
    batches: Vec<BatchRecord>,
    stats: RenderStats,

    // Redundant-bind caches, reset every begin_scene
    current_shader: Option<ShaderId>,
    current_vertex_array: Option<VertexArrayId>,
    texture_slots: [Option<TextureId>; MAX_TEXTURE_SLOTS as usize],

    instance_buffer: BufferId,
    instance_scratch: Vec<Mat4>,
    light_buffer: BufferId,
    shadow_buffer: BufferId,
    shadow_map: ShadowMap,
    shadow_data: GpuShadowData,
    skybox_mesh: Mesh,
}

impl Renderer {
    /// Allocate the instance, light and shadow buffers and the shadow map
    pub fn new<D: RenderDevice>(
        device: &mut D,
        config: RendererConfig,
        shaders: RendererShaders,
    ) -> BackendResult<Self> {
        assert!(config.max_instances > 0, "max_instances must be positive");

        let instance_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("instance transforms".into()),
            size: config.max_instances as u64 * MAT4_SIZE,
            usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
        })?;
        let light_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("lights".into()),
            size: std::mem::size_of::<GpuLightBuffer>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })?;
        let shadow_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("shadow cascades".into()),
            size: std::mem::size_of::<GpuShadowData>() as u64,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })?;
        let shadow_map = ShadowMap::init(device, config.shadow_map_size)?;
        let skybox_mesh = Mesh::upload(device, &MeshData::cube())?;

        log::info!(
            "Renderer created (max {} instances per batch, cascades at {:?})",
            config.max_instances,
            config.cascade_splits
        );

        Ok(Self {
            window_size: config.window_size,
            config,
            shaders,
            state: RendererState::Idle,
            camera: Camera::default(),
            view: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            frustum: Frustum::default(),
            light_direction: Vec3::NEG_Y,
            environment: None,
            current_target: None,
            show_bounding_boxes: false,
            queue: RenderQueue::new(),
            batches: Vec::new(),
            stats: RenderStats::default(),
            current_shader: None,
            current_vertex_array: None,
            texture_slots: [None; MAX_TEXTURE_SLOTS as usize],
            instance_buffer,
            instance_scratch: Vec::new(),
            light_buffer,
            shadow_buffer,
            shadow_map,
            shadow_data: GpuShadowData::default(),
            skybox_mesh,
        })
    }

    /// Track the window size and reset the viewport to it
    pub fn on_window_resize<D: RenderDevice>(&mut self, device: &mut D, width: u32, height: u32) {
        self.window_size = (width, height);
        device.set_viewport(0, 0, width, height);
    }

    /// Start a frame.
    ///
    /// Draws into `target`, or the default framebuffer when `None`.
    /// `environment` is a cube map bound for image-based lighting.
    ///
    /// # Panics
    /// If a scene is already active.
    pub fn begin_scene<D: RenderDevice>(
        &mut self,
        device: &mut D,
        camera: &Camera,
        lights: &LightEnvironment,
        environment: Option<TextureId>,
        target: Option<&RenderTarget>,
    ) {
        assert!(
            self.state == RendererState::Idle,
            "begin_scene called while a scene is already active"
        );

        self.current_target = target.map(|t| TargetBinding {
            id: t.id(),
            width: t.width(),
            height: t.height(),
        });
        self.bind_scene_target(device);
        device.set_clear_color(self.config.clear_color);
        device.clear(ClearFlags::COLOR_DEPTH);
        device.set_depth_test(true);
        device.set_depth_func(DepthFunc::Less);

        self.camera = *camera;
        self.view = camera.view_matrix();
        self.view_projection = camera.view_projection_matrix();
        self.frustum.define(&self.view_projection);

        self.light_direction = lights.directional.direction;
        let light_block = lights.to_gpu();
        device.write_buffer(self.light_buffer, 0, bytemuck::bytes_of(&light_block));
        device.bind_uniform_buffer(LIGHT_BUFFER_BINDING, self.light_buffer);
        self.environment = environment;

        self.current_shader = None;
        self.current_vertex_array = None;
        self.texture_slots = [None; MAX_TEXTURE_SLOTS as usize];

        self.queue.clear();
        self.batches.clear();
        self.stats = RenderStats::default();
        self.state = RendererState::SceneActive;
    }

    /// Queue a mesh for this frame unless it is outside the camera frustum.
    ///
    /// # Panics
    /// Outside `begin_scene`/`end_scene`, or on a stale handle.
    pub fn submit(
        &mut self,
        resources: &ResourceArena,
        mesh: MeshHandle,
        material: MaterialHandle,
        transform: Mat4,
    ) {
        assert!(
            self.state == RendererState::SceneActive,
            "submit called outside begin_scene/end_scene"
        );
        self.stats.submitted += 1;

        let mesh_data = resources.mesh(mesh);
        let material_data = resources.material(material);

        let world_aabb = mesh_data.aabb.transformed(&transform);
        if !self.frustum.is_aabb_visible(&world_aabb) {
            self.stats.culled += 1;
            return;
        }

        let packet = RenderCommandPacket {
            mesh,
            material,
            key: BatchKey {
                vertex_array: mesh_data.vertex_array,
                shader: material_data.shader,
            },
            index_count: mesh_data.index_count,
            transform,
            world_aabb,
            distance_sq: self.camera.position().distance_squared(world_aabb.center()),
        };
        self.queue.push(packet, material_data.is_transparent());
    }

    /// Submit every submesh of a model placed at `transform`
    pub fn submit_model(&mut self, resources: &ResourceArena, model: &Model, transform: Mat4) {
        for submesh in &model.submeshes {
            self.submit(
                resources,
                submesh.mesh,
                submesh.material,
                transform * submesh.local_transform,
            );
        }
    }

    /// Draw the environment cube immediately, centered on the camera and
    /// at maximum depth.
    ///
    /// # Panics
    /// Outside `begin_scene`/`end_scene`.
    pub fn draw_skybox<D: RenderDevice>(&mut self, device: &mut D, cube_map: TextureId, intensity: f32) {
        assert!(
            self.state == RendererState::SceneActive,
            "draw_skybox called outside begin_scene/end_scene"
        );

        let rotation_only = Mat4::from_mat3(Mat3::from_mat4(self.view));
        let shader = self.shaders.skybox;

        device.set_depth_func(DepthFunc::LessEqual);
        if self.current_shader != Some(shader) {
            device.bind_shader(shader);
            self.current_shader = Some(shader);
            self.stats.shader_binds += 1;
        }
        device.set_uniform("u_View", &UniformValue::Mat4(rotation_only));
        device.set_uniform("u_Projection", &UniformValue::Mat4(self.camera.projection_matrix()));
        device.set_uniform("u_Intensity", &UniformValue::Float(intensity));
        device.set_uniform("u_Skybox", &UniformValue::Int(0));
        self.bind_texture_cached(device, 0, cube_map);

        let vertex_array = self.skybox_mesh.vertex_array;
        self.bind_vertex_array_cached(device, vertex_array);
        device.draw_indexed(vertex_array, self.skybox_mesh.index_count);
        self.stats.draw_calls += 1;
        device.set_depth_func(DepthFunc::Less);
    }

    /// Flush the frame: shadows, opaque, transparent, then unbind the target.
    ///
    /// Queued packets stay readable until the next `begin_scene`.
    ///
    /// # Panics
    /// If no scene is active.
    pub fn end_scene<D: RenderDevice>(&mut self, device: &mut D, resources: &ResourceArena) {
        assert!(
            self.state == RendererState::SceneActive,
            "end_scene called without begin_scene"
        );
        self.state = RendererState::Flushing;

        let mut queue = std::mem::take(&mut self.queue);
        queue.sort();
        self.stats.opaque_packets = queue.opaque().len() as u32;
        self.stats.transparent_packets = queue.transparent().len() as u32;

        self.shadow_data = calculate_shadow_data(
            &self.camera,
            self.light_direction,
            &self.config.cascade_splits,
            self.config.cascade_z_multiplier,
        );
        device.write_buffer(self.shadow_buffer, 0, bytemuck::bytes_of(&self.shadow_data));
        device.bind_uniform_buffer(SHADOW_BUFFER_BINDING, self.shadow_buffer);

        self.shadow_pass(device, queue.opaque());

        self.bind_scene_target(device);
        self.bind_texture_cached(device, SHADOW_MAP_SLOT, self.shadow_map.depth_texture());
        if let Some(environment) = self.environment {
            self.bind_texture_cached(device, ENVIRONMENT_SLOT, environment);
        }

        self.color_pass(device, resources, queue.opaque(), RenderPass::Opaque);

        device.set_blending(true);
        self.color_pass(device, resources, queue.transparent(), RenderPass::Transparent);
        device.set_blending(false);

        if self.show_bounding_boxes {
            self.draw_bounding_boxes(device, &queue);
        }

        device.bind_default_target();
        self.current_target = None;
        self.queue = queue;
        self.state = RendererState::Idle;

        log::debug!(
            "Frame: {} submitted, {} culled, {} batches, {} draw calls",
            self.stats.submitted,
            self.stats.culled,
            self.stats.batches,
            self.stats.draw_calls
        );
    }

    fn shadow_pass<D: RenderDevice>(&mut self, device: &mut D, opaque: &[RenderCommandPacket]) {
        self.shadow_map.bind_write(device);
        device.clear(ClearFlags::DEPTH);
        device.set_cull_face(CullFace::Front);

        let shader = self.shaders.shadow_depth;
        device.bind_shader(shader);
        self.current_shader = Some(shader);
        self.stats.shader_binds += 1;
        device.set_uniform(
            "u_LightSpaceMatrices",
            &UniformValue::Mat4Array(self.shadow_data.light_space_matrices.to_vec()),
        );

        // Depth only: material is irrelevant, batch on mesh alone
        for range in build_batches(opaque, self.config.max_instances, |p| p.key.vertex_array) {
            self.draw_batch(device, RenderPass::Shadow, shader, &opaque[range]);
        }

        device.set_cull_face(CullFace::Back);
    }

    fn color_pass<D: RenderDevice>(
        &mut self,
        device: &mut D,
        resources: &ResourceArena,
        packets: &[RenderCommandPacket],
        pass: RenderPass,
    ) {
        for range in build_batches(packets, self.config.max_instances, |p| p.key) {
            let batch = &packets[range];
            // The first packet's material stands in for the whole batch
            let material = resources.material(batch[0].material);

            self.bind_scene_shader(device, material.shader);
            for (name, value) in material.uniform_values() {
                device.set_uniform(name, &value);
            }
            for binding in material.textures() {
                if binding.slot >= MAX_TEXTURE_SLOTS {
                    continue;
                }
                self.bind_texture_cached(device, binding.slot, binding.texture);
                device.set_uniform(&binding.uniform, &UniformValue::Int(binding.slot as i32));
            }

            self.draw_batch(device, pass, material.shader, batch);
        }
    }

    fn draw_batch<D: RenderDevice>(
        &mut self,
        device: &mut D,
        pass: RenderPass,
        shader: ShaderId,
        batch: &[RenderCommandPacket],
    ) {
        let first = &batch[0];
        let vertex_array = first.key.vertex_array;
        self.bind_vertex_array_cached(device, vertex_array);

        self.instance_scratch.clear();
        self.instance_scratch.extend(batch.iter().map(|p| p.transform));
        device.write_buffer(self.instance_buffer, 0, bytemuck::cast_slice(&self.instance_scratch));
        device.draw_indexed_instanced(
            vertex_array,
            first.index_count,
            self.instance_buffer,
            batch.len() as u32,
        );

        log::trace!(
            "{:?} batch: {:?} x{} with {:?}",
            pass,
            vertex_array,
            batch.len(),
            shader
        );
        self.stats.batches += 1;
        self.stats.draw_calls += 1;
        self.batches.push(BatchRecord {
            pass,
            vertex_array,
            shader,
            instance_count: batch.len() as u32,
            first_distance_sq: first.distance_sq,
            last_distance_sq: batch[batch.len() - 1].distance_sq,
        });
    }

    fn draw_bounding_boxes<D: RenderDevice>(&mut self, device: &mut D, queue: &RenderQueue) {
        let Some(shader) = self.shaders.debug_lines else {
            return;
        };
        if queue.is_empty() {
            return;
        }

        self.bind_scene_shader(device, shader);
        device.set_uniform("u_Color", &UniformValue::Vec4(glam::Vec4::new(0.0, 1.0, 0.0, 1.0)));

        let points: Vec<[f32; 3]> = queue
            .opaque()
            .iter()
            .chain(queue.transparent())
            .flat_map(|p| p.world_aabb.edge_lines())
            .collect();
        device.draw_lines(&points);
        self.stats.draw_calls += 1;
    }

    /// Bind a material shader and its per-frame uniforms, skipping the
    /// work if it is already current
    fn bind_scene_shader<D: RenderDevice>(&mut self, device: &mut D, shader: ShaderId) {
        if self.current_shader == Some(shader) {
            return;
        }
        device.bind_shader(shader);
        self.current_shader = Some(shader);
        self.stats.shader_binds += 1;

        device.set_uniform("u_ViewProjection", &UniformValue::Mat4(self.view_projection));
        device.set_uniform("u_View", &UniformValue::Mat4(self.view));
        device.set_uniform("u_CameraPosition", &UniformValue::Vec3(self.camera.position()));
        device.set_uniform("u_ShadowMap", &UniformValue::Int(SHADOW_MAP_SLOT as i32));
        device.set_uniform("u_EnvironmentMap", &UniformValue::Int(ENVIRONMENT_SLOT as i32));
    }

    fn bind_texture_cached<D: RenderDevice>(&mut self, device: &mut D, slot: u32, texture: TextureId) {
        let cached = &mut self.texture_slots[slot as usize];
        if *cached == Some(texture) {
            return;
        }
        *cached = Some(texture);
        device.bind_texture(slot, texture);
        self.stats.texture_binds += 1;
    }

    fn bind_vertex_array_cached<D: RenderDevice>(&mut self, device: &mut D, vertex_array: VertexArrayId) {
        if self.current_vertex_array == Some(vertex_array) {
            return;
        }
        self.current_vertex_array = Some(vertex_array);
        device.bind_vertex_array(vertex_array);
    }

    fn bind_scene_target<D: RenderDevice>(&self, device: &mut D) {
        match self.current_target {
            Some(target) => {
                device.bind_render_target(target.id);
                device.set_viewport(0, 0, target.width, target.height);
            }
            None => {
                device.bind_default_target();
                device.set_viewport(0, 0, self.window_size.0, self.window_size.1);
            }
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Counters for the frame in progress, or the last finished frame
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Batches drawn by the last `end_scene`, in draw order
    pub fn batches(&self) -> &[BatchRecord] {
        &self.batches
    }

    pub fn opaque_queue(&self) -> &[RenderCommandPacket] {
        self.queue.opaque()
    }

    pub fn transparent_queue(&self) -> &[RenderCommandPacket] {
        self.queue.transparent()
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn shadow_data(&self) -> &GpuShadowData {
        &self.shadow_data
    }

    pub fn shadow_map(&self) -> &ShadowMap {
        &self.shadow_map
    }

    pub fn light_buffer(&self) -> BufferId {
        self.light_buffer
    }

    pub fn shadow_buffer(&self) -> BufferId {
        self.shadow_buffer
    }

    pub fn set_show_bounding_boxes(&mut self, show: bool) {
        self.show_bounding_boxes = show;
    }
}
