//! Texture loading and placeholder textures

use std::collections::HashMap;
use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::backend::*;
use crate::error::{ResourceError, ResourceResult};

/// Decoded pixel data ready for upload
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Load texture from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ResourceResult<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy().into_owned();
        let bytes = std::fs::read(path).map_err(|source| ResourceError::Io {
            path: name.clone(),
            source,
        })?;
        Self::from_bytes(&bytes, &name)
    }

    /// Decode an in-memory image
    pub fn from_bytes(bytes: &[u8], name: &str) -> ResourceResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|source| ResourceError::Decode {
            path: name.to_string(),
            source,
        })?;
        Ok(Self::from_image(img, name))
    }

    fn from_image(img: DynamicImage, name: &str) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            format: TextureFormat::Rgba8UnormSrgb,
            data: img.to_rgba8().into_raw(),
            name: name.to_string(),
        }
    }

    /// Create a 1x1 texture of one color
    pub fn solid_color(color: [u8; 4], name: &str) -> Self {
        Self {
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
            data: color.to_vec(),
            name: name.to_string(),
        }
    }
}

/// An uploaded texture
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    /// Source file, empty for generated textures
    pub path: Option<String>,
}

impl Texture {
    pub fn create<D: RenderDevice>(
        device: &mut D,
        data: &TextureData,
        path: Option<&str>,
    ) -> BackendResult<Self> {
        let id = device.create_texture(
            &TextureDescriptor {
                label: Some(data.name.clone()),
                width: data.width,
                height: data.height,
                format: data.format,
                dimension: TextureDimension::D2,
            },
            &data.data,
        )?;
        Ok(Self {
            id,
            width: data.width,
            height: data.height,
            path: path.map(str::to_string),
        })
    }
}

/// Fallback used when a texture cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    White,
    /// Flat tangent-space normal (128, 128, 255)
    Blue,
    Black,
}

/// Placeholder textures plus a path-keyed cache of loaded files
pub struct TextureLibrary {
    white: Texture,
    blue: Texture,
    black: Texture,
    cache: HashMap<String, Texture>,
}

impl TextureLibrary {
    pub fn new<D: RenderDevice>(device: &mut D) -> ResourceResult<Self> {
        let white = Texture::create(device, &TextureData::solid_color([255, 255, 255, 255], "white"), None)?;
        let blue = Texture::create(device, &TextureData::solid_color([128, 128, 255, 255], "flat_normal"), None)?;
        let black = Texture::create(device, &TextureData::solid_color([0, 0, 0, 255], "black"), None)?;
        log::info!("Created placeholder textures");
        Ok(Self {
            white,
            blue,
            black,
            cache: HashMap::new(),
        })
    }

    pub fn placeholder(&self, kind: Placeholder) -> &Texture {
        match kind {
            Placeholder::White => &self.white,
            Placeholder::Blue => &self.blue,
            Placeholder::Black => &self.black,
        }
    }

    pub fn white(&self) -> &Texture {
        &self.white
    }

    pub fn blue(&self) -> &Texture {
        &self.blue
    }

    pub fn black(&self) -> &Texture {
        &self.black
    }

    /// Load a texture, reusing an earlier upload of the same path
    pub fn load<D: RenderDevice>(&mut self, device: &mut D, path: &str) -> ResourceResult<Texture> {
        if let Some(texture) = self.cache.get(path) {
            return Ok(texture.clone());
        }
        let data = TextureData::from_file(path)?;
        let texture = Texture::create(device, &data, Some(path))?;
        log::debug!("Loaded texture {} ({}x{})", path, data.width, data.height);
        self.cache.insert(path.to_string(), texture.clone());
        Ok(texture)
    }

    /// Load a texture; on failure log a warning and return a placeholder
    pub fn load_or_placeholder<D: RenderDevice>(
        &mut self,
        device: &mut D,
        path: &str,
        fallback: Placeholder,
    ) -> Texture {
        match self.load(device, path) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("{}; using {:?} placeholder", e, fallback);
                self.placeholder(fallback).clone()
            }
        }
    }

    /// Load six faces (+X, -X, +Y, -Y, +Z, -Z) into a cube map
    pub fn load_cube_map<D: RenderDevice, P: AsRef<Path>>(
        &mut self,
        device: &mut D,
        faces: &[P],
    ) -> ResourceResult<Texture> {
        if faces.len() != 6 {
            return Err(ResourceError::CubeFaceCount(faces.len()));
        }

        let mut size = None;
        let mut pixels = Vec::new();
        for face in faces {
            let data = TextureData::from_file(face)?;
            if data.width != data.height || size.is_some_and(|s| s != data.width) {
                return Err(ResourceError::CubeFaceSize);
            }
            size = Some(data.width);
            pixels.extend_from_slice(&data.data);
        }
        let size = size.unwrap_or(1);

        let id = device.create_texture(
            &TextureDescriptor {
                label: Some("skybox".to_string()),
                width: size,
                height: size,
                format: TextureFormat::Rgba8UnormSrgb,
                dimension: TextureDimension::Cube,
            },
            &pixels,
        )?;
        Ok(Texture {
            id,
            width: size,
            height: size,
            path: None,
        })
    }

    /// Number of cached file textures
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
