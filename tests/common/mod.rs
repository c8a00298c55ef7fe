//! Common utilities for renderer integration tests.
//!
//! Everything runs against the recording device, so tests inspect the
//! command log and the renderer's batch records instead of pixels.

#![allow(dead_code)]

use glam::{Mat4, Vec3};

use render_core::backend::{DeviceCommand, RecordingDevice, RenderDevice, ShaderDescriptor, ShaderId};
use render_core::resources::{
    Material, MaterialHandle, Mesh, MeshData, MeshHandle, ResourceArena, TextureLibrary,
};
use render_core::scene::{Camera, LightEnvironment, Projection};
use render_core::{Renderer, RendererConfig, RendererShaders};

pub const EPSILON: f32 = 1e-4;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Device, renderer and resources wired together
pub struct TestContext {
    pub device: RecordingDevice,
    pub renderer: Renderer,
    pub resources: ResourceArena,
    pub textures: TextureLibrary,
    pub shaders: RendererShaders,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(RendererConfig::default())
    }

    pub fn with_config(config: RendererConfig) -> Self {
        let mut device = RecordingDevice::new();
        let shaders = RendererShaders {
            shadow_depth: device.create_shader(&ShaderDescriptor::named("shadow_depth")).unwrap(),
            skybox: device.create_shader(&ShaderDescriptor::named("skybox")).unwrap(),
            debug_lines: Some(device.create_shader(&ShaderDescriptor::named("debug_lines")).unwrap()),
        };
        let renderer = Renderer::new(&mut device, config, shaders).unwrap();
        let textures = TextureLibrary::new(&mut device).unwrap();
        device.clear_commands();

        Self {
            device,
            renderer,
            resources: ResourceArena::new(),
            textures,
            shaders,
        }
    }

    pub fn shader(&mut self, name: &str) -> ShaderId {
        self.device.create_shader(&ShaderDescriptor::named(name)).unwrap()
    }

    pub fn mesh(&mut self, data: &MeshData) -> MeshHandle {
        let mesh = Mesh::upload(&mut self.device, data).unwrap();
        self.resources.add_mesh(mesh)
    }

    pub fn material(&mut self, shader: ShaderId, transparent: bool) -> MaterialHandle {
        let material = Material::new("test", shader, &self.textures).with_transparency(transparent);
        self.resources.add_material(material)
    }

    pub fn begin(&mut self, camera: &Camera, lights: &LightEnvironment) {
        self.renderer
            .begin_scene(&mut self.device, camera, lights, None, None);
    }

    pub fn submit(&mut self, mesh: MeshHandle, material: MaterialHandle, position: Vec3) {
        self.renderer
            .submit(&self.resources, mesh, material, Mat4::from_translation(position));
    }

    pub fn end(&mut self) {
        self.renderer.end_scene(&mut self.device, &self.resources);
    }

    /// Commands of one kind, in order
    pub fn commands_matching(&self, f: impl Fn(&DeviceCommand) -> bool) -> Vec<DeviceCommand> {
        self.device.commands().iter().filter(|c| f(c)).cloned().collect()
    }
}

/// Perspective camera on the +Z axis looking at the origin
pub fn camera_at_z(z: f32) -> Camera {
    Camera::look_at(
        Vec3::new(0.0, 0.0, z),
        Vec3::ZERO,
        Projection::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0),
    )
}
