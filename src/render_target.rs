//! Off-screen render targets and the cascade shadow map

use crate::backend::*;

pub use crate::backend::{AttachmentFormat, RenderTargetSpec};

/// A set of color/depth attachments the renderer draws into
#[derive(Debug, Clone)]
pub struct RenderTarget {
    id: RenderTargetId,
    spec: RenderTargetSpec,
}

impl RenderTarget {
    pub fn create<D: RenderDevice>(device: &mut D, spec: RenderTargetSpec) -> BackendResult<Self> {
        let id = device.create_render_target(&spec)?;
        log::debug!(
            "Created render target {:?} ({}x{}, {} attachments)",
            id,
            spec.width,
            spec.height,
            spec.attachments.len()
        );
        Ok(Self { id, spec })
    }

    pub fn id(&self) -> RenderTargetId {
        self.id
    }

    pub fn specification(&self) -> &RenderTargetSpec {
        &self.spec
    }

    pub fn width(&self) -> u32 {
        self.spec.width as u32
    }

    pub fn height(&self) -> u32 {
        self.spec.height as u32
    }

    /// Bind for drawing and cover the whole target with the viewport
    pub fn bind<D: RenderDevice>(&self, device: &mut D) {
        device.bind_render_target(self.id);
        device.set_viewport(0, 0, self.width(), self.height());
    }

    pub fn unbind<D: RenderDevice>(&self, device: &mut D) {
        device.bind_default_target();
    }

    /// Reallocate attachments. Zero or oversized dimensions are ignored;
    /// returns whether the target was resized.
    pub fn resize<D: RenderDevice>(&mut self, device: &mut D, width: u32, height: u32) -> bool {
        if !Self::is_valid_size(width, height) {
            log::warn!("Ignoring render target resize to {}x{}", width, height);
            return false;
        }
        self.spec.width = width as f32;
        self.spec.height = height as f32;
        device.resize_render_target(self.id, width, height);
        true
    }

    pub fn is_valid_size(width: u32, height: u32) -> bool {
        const MAX_SIZE: u32 = 8192;
        width > 0 && height > 0 && width <= MAX_SIZE && height <= MAX_SIZE
    }

    fn check_color_attachment(&self, index: usize) {
        let count = self.spec.color_attachment_count();
        assert!(
            index < count,
            "color attachment index {} out of range ({} attachments)",
            index,
            count
        );
    }

    /// # Panics
    /// If `attachment` is not a color attachment index.
    pub fn read_pixel<D: RenderDevice>(&self, device: &mut D, attachment: usize, x: i32, y: i32) -> i32 {
        self.check_color_attachment(attachment);
        device.read_pixel(self.id, attachment, x, y)
    }

    /// # Panics
    /// If `attachment` is not a color attachment index.
    pub fn clear_attachment<D: RenderDevice>(&self, device: &mut D, attachment: usize, value: i32) {
        self.check_color_attachment(attachment);
        device.clear_attachment(self.id, attachment, value);
    }

    /// # Panics
    /// If `attachment` is not a color attachment index.
    pub fn color_attachment_id<D: RenderDevice>(&self, device: &D, attachment: usize) -> TextureId {
        self.check_color_attachment(attachment);
        device.color_attachment(self.id, attachment)
    }
}

/// Number of cascade layers in the shadow map
pub const SHADOW_CASCADES: usize = 4;

/// Square depth-only texture array, one layer per cascade
#[derive(Debug, Clone)]
pub struct ShadowMap {
    target: RenderTarget,
    depth: TextureId,
}

impl ShadowMap {
    pub fn init<D: RenderDevice>(device: &mut D, size: u32) -> BackendResult<Self> {
        let spec = RenderTargetSpec {
            layers: SHADOW_CASCADES as u32,
            ..RenderTargetSpec::new(size as f32, size as f32, &[AttachmentFormat::Depth32Float])
        };
        let target = RenderTarget::create(device, spec)?;
        let depth = device.depth_attachment(target.id()).ok_or_else(|| {
            BackendError::RenderTargetCreationFailed("shadow map has no depth attachment".into())
        })?;
        log::info!("Created {}x{} shadow map with {} cascades", size, size, SHADOW_CASCADES);
        Ok(Self { target, depth })
    }

    /// Bind for depth writes with a full-size viewport
    pub fn bind_write<D: RenderDevice>(&self, device: &mut D) {
        self.target.bind(device);
    }

    /// Bind the depth array for sampling
    pub fn bind_read<D: RenderDevice>(&self, device: &mut D, slot: u32) {
        device.bind_texture(slot, self.depth);
    }

    pub fn size(&self) -> u32 {
        self.target.width()
    }

    pub fn renderer_id(&self) -> RenderTargetId {
        self.target.id()
    }

    pub fn depth_texture(&self) -> TextureId {
        self.depth
    }
}
