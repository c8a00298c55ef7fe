//! Materials: a shader plus the uniforms and textures it is drawn with

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use super::texture::{Texture, TextureLibrary};
use crate::backend::{ShaderId, TextureId, UniformValue};

/// Texture units available to materials; the renderer reserves the top two
pub const MAX_TEXTURE_SLOTS: u32 = 32;

pub const ALBEDO_SLOT: u32 = 0;
pub const NORMAL_SLOT: u32 = 1;
pub const METAL_ROUGH_SLOT: u32 = 2;
pub const AO_SLOT: u32 = 3;
pub const EMISSIVE_SLOT: u32 = 4;

/// Fixed PBR parameter block, also the on-disk layout in model caches
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialParameters {
    pub albedo_color: [f32; 4],
    pub emissive_color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
    pub ao: f32,
    pub tiling: f32,
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            albedo_color: [1.0; 4],
            emissive_color: [0.0; 3],
            roughness: 0.5,
            metalness: 0.0,
            ao: 1.0,
            tiling: 1.0,
        }
    }
}

impl MaterialParameters {
    /// Named uniforms for this block
    pub fn uniforms(&self) -> [(&'static str, UniformValue); 6] {
        [
            ("u_AlbedoColor", UniformValue::Vec4(Vec4::from_array(self.albedo_color))),
            ("u_EmissiveColor", UniformValue::Vec3(Vec3::from_array(self.emissive_color))),
            ("u_Roughness", UniformValue::Float(self.roughness)),
            ("u_Metalness", UniformValue::Float(self.metalness)),
            ("u_AO", UniformValue::Float(self.ao)),
            ("u_Tiling", UniformValue::Float(self.tiling)),
        ]
    }
}

/// A texture bound to a sampler uniform at a fixed slot
#[derive(Debug, Clone, PartialEq)]
pub struct TextureBinding {
    pub uniform: String,
    pub slot: u32,
    pub texture: TextureId,
    /// Source file of a user-assigned texture; `None` while the placeholder is bound
    pub path: Option<String>,
}

/// Material
///
/// Parameter differences between materials that share a shader do not split
/// instanced batches; a batch is drawn with the material of its first packet.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub shader: ShaderId,
    pub parameters: MaterialParameters,
    uniforms: Vec<(String, UniformValue)>,
    textures: Vec<TextureBinding>,
    transparent: bool,
}

impl Material {
    /// New material with placeholder maps in the five PBR slots
    pub fn new(name: &str, shader: ShaderId, library: &TextureLibrary) -> Self {
        let mut material = Self {
            name: name.to_string(),
            shader,
            parameters: MaterialParameters::default(),
            uniforms: Vec::new(),
            textures: Vec::new(),
            transparent: false,
        };

        let defaults = [
            ("u_AlbedoMap", ALBEDO_SLOT, library.white(), Some("u_UseAlbedoMap")),
            ("u_NormalMap", NORMAL_SLOT, library.blue(), Some("u_UseNormalMap")),
            ("u_MetalnessRoughnessMap", METAL_ROUGH_SLOT, library.white(), None),
            ("u_AOMap", AO_SLOT, library.white(), Some("u_UseAOMap")),
            ("u_EmissiveMap", EMISSIVE_SLOT, library.white(), Some("u_UseEmissiveMap")),
        ];
        for (uniform, slot, texture, flag) in defaults {
            material.textures.push(TextureBinding {
                uniform: uniform.to_string(),
                slot,
                texture: texture.id,
                path: None,
            });
            if let Some(flag) = flag {
                material.set_int(flag, 0);
            }
        }
        material
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_albedo_color(mut self, color: Vec4) -> Self {
        self.parameters.albedo_color = color.to_array();
        self
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.parameters.metalness = metalness;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.parameters.roughness = roughness;
        self
    }

    pub fn with_emissive(mut self, emissive: Vec3) -> Self {
        self.parameters.emissive_color = emissive.to_array();
        self
    }

    /// Set (or replace) a named uniform
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        match self.uniforms.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.set_uniform(name, UniformValue::Vec4(value));
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }

    /// Bind a texture to a sampler uniform. Reuses the uniform's slot if it
    /// already has one, otherwise takes the next free slot.
    pub fn set_texture(&mut self, uniform: &str, texture: &Texture) {
        if let Some(binding) = self.textures.iter_mut().find(|b| b.uniform == uniform) {
            binding.texture = texture.id;
            binding.path = texture.path.clone();
            return;
        }
        let slot = self.textures.iter().map(|b| b.slot + 1).max().unwrap_or(0);
        self.textures.push(TextureBinding {
            uniform: uniform.to_string(),
            slot,
            texture: texture.id,
            path: texture.path.clone(),
        });
    }

    pub fn set_albedo_map(&mut self, texture: &Texture) {
        self.set_texture("u_AlbedoMap", texture);
        self.set_int("u_UseAlbedoMap", 1);
    }

    pub fn set_normal_map(&mut self, texture: &Texture) {
        self.set_texture("u_NormalMap", texture);
        self.set_int("u_UseNormalMap", 1);
    }

    pub fn set_metalness_roughness_map(&mut self, texture: &Texture) {
        self.set_texture("u_MetalnessRoughnessMap", texture);
    }

    pub fn set_ao_map(&mut self, texture: &Texture) {
        self.set_texture("u_AOMap", texture);
        self.set_int("u_UseAOMap", 1);
    }

    pub fn set_emissive_map(&mut self, texture: &Texture) {
        self.set_texture("u_EmissiveMap", texture);
        self.set_int("u_UseEmissiveMap", 1);
    }

    /// Every uniform applied when this material is drawn: the parameter
    /// block first, then user uniforms in insertion order
    pub fn uniform_values(&self) -> impl Iterator<Item = (&str, UniformValue)> + '_ {
        self.parameters
            .uniforms()
            .into_iter()
            .chain(self.uniforms.iter().map(|(n, v)| (n.as_str(), v.clone())))
    }

    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    /// Path of the texture bound to a sampler uniform, if it came from a file
    pub fn texture_path(&self, uniform: &str) -> Option<&str> {
        self.textures
            .iter()
            .find(|b| b.uniform == uniform)
            .and_then(|b| b.path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingDevice;

    fn library() -> (RecordingDevice, TextureLibrary) {
        let mut device = RecordingDevice::new();
        let library = TextureLibrary::new(&mut device).unwrap();
        (device, library)
    }

    #[test]
    fn test_parameter_block_layout() {
        assert_eq!(std::mem::size_of::<MaterialParameters>(), 44);
    }

    #[test]
    fn test_new_material_has_placeholders() {
        let (_, library) = library();
        let material = Material::new("m", ShaderId::from_raw(1), &library);
        let slots: Vec<_> = material.textures().iter().map(|b| (b.slot, b.texture)).collect();
        assert_eq!(
            slots,
            vec![
                (0, library.white().id),
                (1, library.blue().id),
                (2, library.white().id),
                (3, library.white().id),
                (4, library.white().id),
            ]
        );
        assert!(!material.is_transparent());
    }

    #[test]
    fn test_custom_texture_takes_next_slot() {
        let (_, library) = library();
        let mut material = Material::new("m", ShaderId::from_raw(1), &library);
        material.set_texture("u_DetailMap", library.black());
        assert_eq!(material.textures().last().unwrap().slot, 5);

        material.set_albedo_map(library.black());
        assert_eq!(material.textures()[0].texture, library.black().id);
        assert_eq!(material.textures().len(), 6);
    }

    #[test]
    fn test_uniforms_replace_by_name() {
        let (_, library) = library();
        let mut material = Material::new("m", ShaderId::from_raw(1), &library);
        material.set_float("u_Custom", 1.0);
        material.set_float("u_Custom", 2.0);
        let custom: Vec<_> = material
            .uniform_values()
            .filter(|(n, _)| *n == "u_Custom")
            .collect();
        assert_eq!(custom, vec![("u_Custom", UniformValue::Float(2.0))]);
    }
}
