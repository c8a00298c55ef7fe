//! Models: a list of submeshes sharing one world transform

use glam::Mat4;

use super::arena::{MaterialHandle, MeshHandle, ResourceArena};
use crate::math::{Aabb, Ray};

/// One mesh/material pair placed inside a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Submesh {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub local_transform: Mat4,
    pub aabb: Aabb,
}

/// A picking hit against a model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelHit {
    pub submesh: usize,
    /// Distance along the world-space ray
    pub distance: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub submeshes: Vec<Submesh>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            submeshes: Vec::new(),
        }
    }

    /// Add a submesh, taking its bounds from the mesh
    pub fn push(
        &mut self,
        arena: &ResourceArena,
        mesh: MeshHandle,
        material: MaterialHandle,
        local_transform: Mat4,
    ) {
        let aabb = arena.mesh(mesh).aabb;
        self.submeshes.push(Submesh {
            mesh,
            material,
            local_transform,
            aabb,
        });
    }

    /// Closest submesh hit by a world-space ray when the model is placed at `transform`
    pub fn pick(&self, ray: &Ray, transform: &Mat4) -> Option<ModelHit> {
        self.submeshes
            .iter()
            .enumerate()
            .filter_map(|(i, submesh)| {
                let to_local = (*transform * submesh.local_transform).inverse();
                ray.transformed(&to_local)
                    .intersect_aabb(&submesh.aabb)
                    .map(|distance| ModelHit {
                        submesh: i,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
