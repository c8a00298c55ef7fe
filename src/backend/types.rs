//! Common types shared between backends

use glam::{Mat4, Vec3, Vec4};

/// Handle to a compiled shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(pub(crate) u32);

/// Handle to a vertex array (vertex buffer + index buffer + layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub(crate) u32);

/// Handle to a GPU texture (2D, 2D array or cube)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) u32);

/// Handle to a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub(crate) u32);

/// Handle to an off-screen render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetId(pub(crate) u32);

macro_rules! raw_handle {
    ($($name:ident),*) => {
        $(
            impl $name {
                /// Wrap a backend-native object name.
                pub const fn from_raw(raw: u32) -> Self {
                    Self(raw)
                }

                /// The backend-native object name.
                pub const fn raw(self) -> u32 {
                    self.0
                }
            }
        )*
    };
}

raw_handle!(ShaderId, VertexArrayId, TextureId, BufferId, RenderTargetId);

/// Attachment format of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentFormat {
    // Color
    Rgba8,
    Rgba16Float,
    Rgba32Float,
    RedInteger,
    // Depth/stencil
    Depth24Stencil8,
    Depth32Float,
}

impl AttachmentFormat {
    pub fn is_depth(&self) -> bool {
        matches!(
            self,
            AttachmentFormat::Depth24Stencil8 | AttachmentFormat::Depth32Float
        )
    }
}

/// Sampled texture format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba16Float,
}

/// Texture dimensionality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D2,
    /// Six faces, uploaded in +X, -X, +Y, -Y, +Z, -Z order
    Cube,
}

/// Texture descriptor
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub dimension: TextureDimension,
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
            dimension: TextureDimension::D2,
        }
    }
}

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferUsage(u32);

impl BufferUsage {
    pub const VERTEX: Self = Self(1 << 0);
    pub const UNIFORM: Self = Self(1 << 1);
    pub const COPY_DST: Self = Self(1 << 2);

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn bits(&self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for BufferUsage {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Buffer descriptor
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    pub label: Option<String>,
    pub size: u64,
    pub usage: BufferUsage,
}

/// Which planes of the bound target a clear touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearFlags(u32);

impl ClearFlags {
    pub const COLOR: Self = Self(1 << 0);
    pub const DEPTH: Self = Self(1 << 1);
    pub const COLOR_DEPTH: Self = Self((1 << 0) | (1 << 1));

    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for ClearFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthFunc {
    #[default]
    Less,
    LessEqual,
}

/// Which faces are culled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullFace {
    #[default]
    Back,
    Front,
}

/// Vertex attribute format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
}

impl VertexFormat {
    pub fn components(&self) -> usize {
        match self {
            VertexFormat::Float32x2 => 2,
            VertexFormat::Float32x3 => 3,
            VertexFormat::Float32x4 => 4,
        }
    }
}

/// Interleaved float vertex layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    pub attributes: Vec<(String, VertexFormat)>,
}

impl VertexLayout {
    /// Position(3) + Normal(3) + TexCoord(2)
    pub fn standard() -> Self {
        Self {
            attributes: vec![
                ("a_Position".to_string(), VertexFormat::Float32x3),
                ("a_Normal".to_string(), VertexFormat::Float32x3),
                ("a_TexCoord".to_string(), VertexFormat::Float32x2),
            ],
        }
    }

    /// Number of floats per vertex
    pub fn stride(&self) -> usize {
        self.attributes.iter().map(|(_, f)| f.components()).sum()
    }
}

/// Shader descriptor
#[derive(Debug, Clone)]
pub struct ShaderDescriptor {
    pub name: String,
    /// Path of the combined shader source, if loaded from disk
    pub path: Option<String>,
}

impl ShaderDescriptor {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
        }
    }

    pub fn from_path(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: Some(path.to_string()),
        }
    }
}

/// A value uploaded to a named shader uniform
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Mat4Array(Vec<Mat4>),
}

/// Render target description
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetSpec {
    pub width: f32,
    pub height: f32,
    /// Ordered attachments; color attachments are indexed in the order they appear
    pub attachments: Vec<AttachmentFormat>,
    pub samples: u32,
    /// Array layers per attachment (shadow cascades use one layer per cascade)
    pub layers: u32,
    pub swap_chain_target: bool,
}

impl Default for RenderTargetSpec {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            attachments: Vec::new(),
            samples: 1,
            layers: 1,
            swap_chain_target: false,
        }
    }
}

impl RenderTargetSpec {
    pub fn new(width: f32, height: f32, attachments: &[AttachmentFormat]) -> Self {
        Self {
            width,
            height,
            attachments: attachments.to_vec(),
            ..Default::default()
        }
    }

    /// Number of color attachments
    pub fn color_attachment_count(&self) -> usize {
        self.attachments.iter().filter(|a| !a.is_depth()).count()
    }

    /// The depth attachment format, if any
    pub fn depth_attachment(&self) -> Option<AttachmentFormat> {
        self.attachments.iter().copied().find(|a| a.is_depth())
    }
}
