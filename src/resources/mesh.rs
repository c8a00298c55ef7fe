//! Mesh data structures and generation

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::backend::{BackendResult, RenderDevice, VertexArrayId, VertexLayout};
use crate::math::Aabb;

/// Interleaved vertex matching [`VertexLayout::standard`]
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coord: tex_coord.to_array(),
        }
    }
}

/// CPU-side geometry before upload
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Bounds of all vertex positions
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| Vec3::from_array(v.position)))
    }

    /// Vertex data as a flat float slice
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Create a unit cube centered at origin
    pub fn cube() -> Self {
        let mut mesh = MeshData::new("cube");

        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (-Vec3::Z, -Vec3::X, Vec3::Y),
            (Vec3::X, -Vec3::Z, Vec3::Y),
            (-Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, -Vec3::Z),
            (-Vec3::Y, Vec3::X, Vec3::Z),
        ];

        for (face, (normal, right, up)) in faces.into_iter().enumerate() {
            let center = normal * 0.5;
            let corners = [
                (center - right * 0.5 - up * 0.5, Vec2::new(0.0, 1.0)),
                (center + right * 0.5 - up * 0.5, Vec2::new(1.0, 1.0)),
                (center + right * 0.5 + up * 0.5, Vec2::new(1.0, 0.0)),
                (center - right * 0.5 + up * 0.5, Vec2::new(0.0, 0.0)),
            ];
            for (position, uv) in corners {
                mesh.vertices.push(Vertex::new(position, normal, uv));
            }

            let base = face as u32 * 4;
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        mesh
    }

    /// Create a unit quad in the XY plane facing +Z
    pub fn quad() -> Self {
        let mut mesh = MeshData::new("quad");
        for (x, y, u, v) in [
            (-0.5, -0.5, 0.0, 1.0),
            (0.5, -0.5, 1.0, 1.0),
            (0.5, 0.5, 1.0, 0.0),
            (-0.5, 0.5, 0.0, 0.0),
        ] {
            mesh.vertices
                .push(Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z, Vec2::new(u, v)));
        }
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh
    }

    /// Full-screen quad in clip space, used by post-processing
    pub fn screen_quad() -> Self {
        let mut mesh = MeshData::new("screen_quad");
        for (x, y, u, v) in [
            (-1.0, -1.0, 0.0, 0.0),
            (1.0, -1.0, 1.0, 0.0),
            (1.0, 1.0, 1.0, 1.0),
            (-1.0, 1.0, 0.0, 1.0),
        ] {
            mesh.vertices
                .push(Vertex::new(Vec3::new(x, y, 0.0), Vec3::Z, Vec2::new(u, v)));
        }
        mesh.indices = vec![0, 1, 2, 0, 2, 3];
        mesh
    }

    /// Create a UV sphere of diameter 1
    pub fn sphere(segments: u32, rings: u32) -> Self {
        let mut mesh = MeshData::new("sphere");

        let segment_angle = 2.0 * std::f32::consts::PI / segments as f32;
        let ring_angle = std::f32::consts::PI / rings as f32;

        for ring in 0..=rings {
            let phi = ring as f32 * ring_angle;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 * segment_angle;
                let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
                let uv = Vec2::new(
                    segment as f32 / segments as f32,
                    ring as f32 / rings as f32,
                );
                mesh.vertices.push(Vertex::new(normal * 0.5, normal, uv));
            }
        }

        for ring in 0..rings {
            for segment in 0..segments {
                let current = ring * (segments + 1) + segment;
                let next = current + segments + 1;
                mesh.indices.extend_from_slice(&[
                    current,
                    next,
                    current + 1,
                    current + 1,
                    next,
                    next + 1,
                ]);
            }
        }

        mesh
    }
}

/// Uploaded geometry
///
/// Keeps the source vertex and index data so the mesh can be written back
/// to a model cache.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub vertex_array: VertexArrayId,
    pub index_count: u32,
    /// Local-space bounds
    pub aabb: Aabb,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Upload generated geometry, computing its bounds
    pub fn upload<D: RenderDevice>(device: &mut D, data: &MeshData) -> BackendResult<Self> {
        Self::from_raw(
            device,
            &data.name,
            data.vertex_floats().to_vec(),
            data.indices.clone(),
            data.bounds(),
        )
    }

    /// Upload interleaved floats in the standard layout with known bounds
    pub fn from_raw<D: RenderDevice>(
        device: &mut D,
        name: &str,
        vertices: Vec<f32>,
        indices: Vec<u32>,
        aabb: Aabb,
    ) -> BackendResult<Self> {
        let vertex_array =
            device.create_vertex_array(&vertices, &indices, &VertexLayout::standard())?;
        log::debug!(
            "Uploaded mesh '{}' ({} indices)",
            name,
            indices.len()
        );
        Ok(Self {
            name: name.to_string(),
            vertex_array,
            index_count: indices.len() as u32,
            aabb,
            vertices,
            indices,
        })
    }
}
