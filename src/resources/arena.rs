//! Handle-addressed storage for meshes and materials

use slotmap::{new_key_type, SlotMap};

use super::material::Material;
use super::mesh::Mesh;

new_key_type! {
    /// Generation-checked handle to a [`Mesh`]
    pub struct MeshHandle;
    /// Generation-checked handle to a [`Material`]
    pub struct MaterialHandle;
}

/// Owns every mesh and material; frame queues only hold handles
#[derive(Default)]
pub struct ResourceArena {
    meshes: SlotMap<MeshHandle, Mesh>,
    materials: SlotMap<MaterialHandle, Material>,
}

impl ResourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshHandle {
        self.meshes.insert(mesh)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.insert(material)
    }

    /// # Panics
    /// If the handle was removed.
    pub fn mesh(&self, handle: MeshHandle) -> &Mesh {
        match self.meshes.get(handle) {
            Some(mesh) => mesh,
            None => panic!("stale mesh handle {:?}", handle),
        }
    }

    /// # Panics
    /// If the handle was removed.
    pub fn material(&self, handle: MaterialHandle) -> &Material {
        match self.materials.get(handle) {
            Some(material) => material,
            None => panic!("stale material handle {:?}", handle),
        }
    }

    pub fn get_mesh(&self, handle: MeshHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    pub fn get_material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        self.materials.get_mut(handle)
    }

    pub fn remove_mesh(&mut self, handle: MeshHandle) -> Option<Mesh> {
        self.meshes.remove(handle)
    }

    pub fn remove_material(&mut self, handle: MaterialHandle) -> Option<Material> {
        self.materials.remove(handle)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }
}
