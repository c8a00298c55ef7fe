//! Binary model cache
//!
//! Layout (little endian):
//!
//! ```text
//! "RXN\0"  u32 version (1)  u32 submesh count
//! per submesh:
//!     Aabb (min vec3, max vec3)
//!     local transform (mat4, column major)
//!     u32 vertex float count, u32 index count
//!     f32 * vertex float count, u32 * index count
//!     MaterialParameters (44 bytes)
//!     4 x (u32 length + utf8 bytes) texture paths: albedo, normal, metal/rough, AO
//!     u8 transparent flag
//! ```
//!
//! An empty path means the slot used its placeholder.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use glam::{Mat4, Vec3};

use super::arena::ResourceArena;
use super::material::{Material, MaterialParameters};
use super::mesh::Mesh;
use super::model::Model;
use super::texture::{Placeholder, TextureLibrary};
use crate::backend::{RenderDevice, ShaderId};
use crate::error::{ModelCacheError, ModelCacheResult};
use crate::math::Aabb;

pub const MODEL_CACHE_MAGIC: [u8; 4] = *b"RXN\0";
pub const MODEL_CACHE_VERSION: u32 = 1;

const TEXTURE_UNIFORMS: [(&str, Placeholder); 4] = [
    ("u_AlbedoMap", Placeholder::White),
    ("u_NormalMap", Placeholder::Blue),
    ("u_MetalnessRoughnessMap", Placeholder::White),
    ("u_AOMap", Placeholder::White),
];

/// Serialize a model and the meshes/materials it references
pub fn write_model<W: Write>(out: &mut W, model: &Model, arena: &ResourceArena) -> ModelCacheResult<()> {
    out.write_all(&MODEL_CACHE_MAGIC)?;
    write_u32(out, MODEL_CACHE_VERSION)?;
    write_u32(out, model.submeshes.len() as u32)?;

    for submesh in &model.submeshes {
        let mesh = arena.mesh(submesh.mesh);
        let material = arena.material(submesh.material);

        write_floats(out, &submesh.aabb.min.to_array())?;
        write_floats(out, &submesh.aabb.max.to_array())?;
        write_floats(out, &submesh.local_transform.to_cols_array())?;

        write_u32(out, mesh.vertices.len() as u32)?;
        write_u32(out, mesh.indices.len() as u32)?;
        write_floats(out, &mesh.vertices)?;
        for index in &mesh.indices {
            write_u32(out, *index)?;
        }

        out.write_all(bytemuck::bytes_of(&material.parameters))?;
        for (uniform, _) in TEXTURE_UNIFORMS {
            write_string(out, material.texture_path(uniform).unwrap_or(""))?;
        }
        out.write_all(&[material.is_transparent() as u8])?;
    }
    Ok(())
}

/// Rebuild a model, uploading its meshes and textures.
///
/// Every submesh gets a new material on `shader`. Missing texture files fall
/// back to placeholders; a malformed file is an error.
pub fn read_model<R: Read, D: RenderDevice>(
    input: &mut R,
    name: &str,
    device: &mut D,
    arena: &mut ResourceArena,
    textures: &mut TextureLibrary,
    shader: ShaderId,
) -> ModelCacheResult<Model> {
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if magic != MODEL_CACHE_MAGIC {
        return Err(ModelCacheError::BadMagic(magic));
    }
    let version = read_u32(input)?;
    if version != MODEL_CACHE_VERSION {
        return Err(ModelCacheError::UnsupportedVersion(version));
    }

    let submesh_count = read_u32(input)?;
    let mut model = Model::new(name);

    for i in 0..submesh_count {
        let min = Vec3::from_array(read_floats::<_, 3>(input)?);
        let max = Vec3::from_array(read_floats::<_, 3>(input)?);
        let local_transform = Mat4::from_cols_array(&read_floats::<_, 16>(input)?);

        let vertex_count = read_u32(input)? as usize;
        let index_count = read_u32(input)? as usize;
        let vertices = read_f32_vec(input, vertex_count)?;
        let indices = (0..index_count)
            .map(|_| read_u32(input))
            .collect::<std::io::Result<Vec<_>>>()?;

        let mut parameters = MaterialParameters::default();
        input.read_exact(bytemuck::bytes_of_mut(&mut parameters))?;

        let mut paths = Vec::with_capacity(TEXTURE_UNIFORMS.len());
        for _ in 0..TEXTURE_UNIFORMS.len() {
            paths.push(read_string(input)?);
        }

        let mut flag = [0u8; 1];
        input.read_exact(&mut flag)?;

        let aabb = Aabb::new(min, max);
        let mesh = Mesh::from_raw(device, &format!("{}#{}", name, i), vertices, indices, aabb)?;

        let mut material = Material::new(&format!("{}#{}", name, i), shader, textures);
        material.parameters = parameters;
        material.set_transparent(flag[0] != 0);
        for ((uniform, fallback), path) in TEXTURE_UNIFORMS.iter().zip(&paths) {
            if path.is_empty() {
                continue;
            }
            let texture = textures.load_or_placeholder(device, path, *fallback);
            match *uniform {
                "u_AlbedoMap" => material.set_albedo_map(&texture),
                "u_NormalMap" => material.set_normal_map(&texture),
                "u_MetalnessRoughnessMap" => material.set_metalness_roughness_map(&texture),
                _ => material.set_ao_map(&texture),
            }
        }

        let mesh = arena.add_mesh(mesh);
        let material = arena.add_material(material);
        model.push(arena, mesh, material, local_transform);
    }

    log::info!("Loaded model cache '{}' ({} submeshes)", name, submesh_count);
    Ok(model)
}

/// Write a model cache file
pub fn save_model<P: AsRef<Path>>(path: P, model: &Model, arena: &ResourceArena) -> ModelCacheResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_model(&mut out, model, arena)?;
    out.flush()?;
    Ok(())
}

/// Read a model cache file
pub fn load_model<P: AsRef<Path>, D: RenderDevice>(
    path: P,
    device: &mut D,
    arena: &mut ResourceArena,
    textures: &mut TextureLibrary,
    shader: ShaderId,
) -> ModelCacheResult<Model> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("model")
        .to_string();
    let mut input = BufReader::new(File::open(path)?);
    read_model(&mut input, &name, device, arena, textures, shader)
}

fn write_u32<W: Write>(out: &mut W, value: u32) -> std::io::Result<()> {
    out.write_all(&value.to_le_bytes())
}

fn write_floats<W: Write>(out: &mut W, values: &[f32]) -> std::io::Result<()> {
    for v in values {
        out.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

fn write_string<W: Write>(out: &mut W, value: &str) -> std::io::Result<()> {
    write_u32(out, value.len() as u32)?;
    out.write_all(value.as_bytes())
}

fn read_u32<R: Read>(input: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_floats<R: Read, const N: usize>(input: &mut R) -> std::io::Result<[f32; N]> {
    let mut out = [0.0; N];
    for v in &mut out {
        let mut buf = [0u8; 4];
        input.read_exact(&mut buf)?;
        *v = f32::from_le_bytes(buf);
    }
    Ok(out)
}

/// Read exactly `len` bytes, growing the buffer only as data arrives.
/// A length past the end of the stream is `UnexpectedEof`.
fn read_bytes<R: Read>(input: &mut R, len: u64) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    input.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "model cache ended inside a block",
        ));
    }
    Ok(bytes)
}

fn read_f32_vec<R: Read>(input: &mut R, count: usize) -> std::io::Result<Vec<f32>> {
    let bytes = read_bytes(input, count as u64 * 4)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn read_string<R: Read>(input: &mut R) -> ModelCacheResult<String> {
    let len = read_u32(input)?;
    let bytes = read_bytes(input, len as u64)?;
    String::from_utf8(bytes).map_err(|_| ModelCacheError::InvalidString)
}
