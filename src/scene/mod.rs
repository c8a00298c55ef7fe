//! Scene description consumed by the renderer
//!
//! [`SceneSource`] is the seam between the renderer and whatever owns the
//! world (an ECS, an editor document). [`Scene`] is a plain implementation
//! holding objects, lights, a primary camera and a skybox.

mod camera;
mod light;
mod transform;

pub use camera::*;
pub use light::*;
pub use transform::*;

use glam::Mat4;

use crate::backend::{RenderDevice, TextureId};
use crate::math::Ray;
use crate::render_target::RenderTarget;
use crate::renderer::Renderer;
use crate::resources::{MaterialHandle, MeshHandle, Model, ResourceArena};

/// Everything a scene needs to record one frame
pub struct FrameContext<'a, D: RenderDevice> {
    pub device: &'a mut D,
    pub renderer: &'a mut Renderer,
    pub resources: &'a ResourceArena,
    /// Target to draw into; `None` means the default framebuffer
    pub target: Option<&'a RenderTarget>,
}

/// Something that can draw itself through a [`Renderer`]
pub trait SceneSource {
    /// Camera used for runtime (game view) rendering
    fn primary_camera(&self) -> Option<Camera>;

    /// Run one `begin_scene` / submit / `end_scene` cycle as seen from `camera`
    fn render<D: RenderDevice>(&self, frame: &mut FrameContext<'_, D>, camera: &Camera);
}

/// Geometry attached to a scene object
#[derive(Debug, Clone)]
pub enum Renderable {
    Mesh {
        mesh: MeshHandle,
        material: MaterialHandle,
    },
    Model(Model),
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub renderable: Renderable,
}

/// Environment cube map drawn behind everything
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Skybox {
    pub texture: TextureId,
    pub intensity: f32,
}

impl Skybox {
    pub fn new(texture: TextureId) -> Self {
        Self {
            texture,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub lights: LightEnvironment,
    pub primary_camera: Option<Camera>,
    pub skybox: Option<Skybox>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(
        &mut self,
        name: &str,
        mesh: MeshHandle,
        material: MaterialHandle,
        transform: Transform,
    ) -> usize {
        self.add_object(name, Renderable::Mesh { mesh, material }, transform)
    }

    pub fn add_model(&mut self, name: &str, model: Model, transform: Transform) -> usize {
        self.add_object(name, Renderable::Model(model), transform)
    }

    fn add_object(&mut self, name: &str, renderable: Renderable, transform: Transform) -> usize {
        self.objects.push(SceneObject {
            name: name.to_string(),
            transform,
            renderable,
        });
        self.objects.len() - 1
    }

    pub fn add_point_light(&mut self, light: PointLight) {
        self.lights.point_lights.push(light);
    }

    pub fn set_directional_light(&mut self, light: DirectionalLight) {
        self.lights.directional = light;
    }

    /// Index of the closest object hit by a world-space ray
    pub fn pick(&self, ray: &Ray, resources: &ResourceArena) -> Option<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(i, object)| {
                let world = object.transform.matrix();
                let distance = match &object.renderable {
                    Renderable::Mesh { mesh, .. } => {
                        let local = ray.transformed(&world.inverse());
                        local.intersect_aabb(&resources.mesh(*mesh).aabb)
                    }
                    Renderable::Model(model) => model.pick(ray, &world).map(|hit| hit.distance),
                };
                distance.map(|d| (i, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    fn submit_all(&self, renderer: &mut Renderer, resources: &ResourceArena) {
        for object in &self.objects {
            let transform: Mat4 = object.transform.matrix();
            match &object.renderable {
                Renderable::Mesh { mesh, material } => {
                    renderer.submit(resources, *mesh, *material, transform)
                }
                Renderable::Model(model) => renderer.submit_model(resources, model, transform),
            }
        }
    }
}

impl SceneSource for Scene {
    fn primary_camera(&self) -> Option<Camera> {
        self.primary_camera
    }

    fn render<D: RenderDevice>(&self, frame: &mut FrameContext<'_, D>, camera: &Camera) {
        frame.renderer.begin_scene(
            &mut *frame.device,
            camera,
            &self.lights,
            self.skybox.map(|s| s.texture),
            frame.target,
        );
        self.submit_all(frame.renderer, frame.resources);
        if let Some(skybox) = self.skybox {
            frame
                .renderer
                .draw_skybox(&mut *frame.device, skybox.texture, skybox.intensity);
        }
        frame.renderer.end_scene(&mut *frame.device, frame.resources);
    }
}
