//! Per-viewport composition: geometry pass into an HDR target, then a
//! tone-mapping pass into the final target.

use crate::backend::*;
use crate::render_target::RenderTarget;
use crate::renderer::Renderer;
use crate::resources::{Mesh, MeshData, ResourceArena};
use crate::scene::{Camera, FrameContext, SceneSource};

/// Settings for the post-process pass and debug overlays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneRendererSettings {
    pub exposure: f32,
    pub gamma: f32,
    pub show_bounding_boxes: bool,
}

impl Default for SceneRendererSettings {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            gamma: 2.2,
            show_bounding_boxes: false,
        }
    }
}

/// Renders a scene for one viewport (editor panel or game view)
pub struct SceneRenderer {
    geometry: RenderTarget,
    final_target: RenderTarget,
    post_process_shader: ShaderId,
    screen_quad: Mesh,
    viewport: (u32, u32),
    pub settings: SceneRendererSettings,
}

impl SceneRenderer {
    pub const DEFAULT_SIZE: (u32, u32) = (1280, 720);

    pub fn new<D: RenderDevice>(
        device: &mut D,
        post_process_shader: ShaderId,
        settings: SceneRendererSettings,
    ) -> BackendResult<Self> {
        let (width, height) = Self::DEFAULT_SIZE;
        let geometry = RenderTarget::create(
            device,
            RenderTargetSpec::new(
                width as f32,
                height as f32,
                &[AttachmentFormat::Rgba16Float, AttachmentFormat::Depth24Stencil8],
            ),
        )?;
        let final_target = RenderTarget::create(
            device,
            RenderTargetSpec::new(width as f32, height as f32, &[AttachmentFormat::Rgba8]),
        )?;
        let screen_quad = Mesh::upload(device, &MeshData::screen_quad())?;

        Ok(Self {
            geometry,
            final_target,
            post_process_shader,
            screen_quad,
            viewport: Self::DEFAULT_SIZE,
            settings,
        })
    }

    /// Resize both targets. Does nothing if the size is unchanged or not a
    /// valid target size (a minimized window reports 0x0).
    pub fn set_viewport_size<D: RenderDevice>(&mut self, device: &mut D, width: u32, height: u32) {
        if self.viewport == (width, height) || !RenderTarget::is_valid_size(width, height) {
            return;
        }
        self.geometry.resize(device, width, height);
        self.final_target.resize(device, width, height);
        self.viewport = (width, height);
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport
    }

    /// Render from an editor camera
    pub fn render_editor<D: RenderDevice, S: SceneSource>(
        &mut self,
        device: &mut D,
        renderer: &mut Renderer,
        resources: &ResourceArena,
        scene: &S,
        camera: &Camera,
    ) {
        self.geometry_pass(device, renderer, resources, scene, camera);
        self.post_process(device);
    }

    /// Render from the scene's primary camera. Returns false, drawing
    /// nothing, if the scene has none.
    pub fn render_runtime<D: RenderDevice, S: SceneSource>(
        &mut self,
        device: &mut D,
        renderer: &mut Renderer,
        resources: &ResourceArena,
        scene: &S,
    ) -> bool {
        let Some(camera) = scene.primary_camera() else {
            return false;
        };
        self.geometry_pass(device, renderer, resources, scene, &camera);
        self.post_process(device);
        true
    }

    fn geometry_pass<D: RenderDevice, S: SceneSource>(
        &mut self,
        device: &mut D,
        renderer: &mut Renderer,
        resources: &ResourceArena,
        scene: &S,
        camera: &Camera,
    ) {
        renderer.set_show_bounding_boxes(self.settings.show_bounding_boxes);
        let mut frame = FrameContext {
            device,
            renderer,
            resources,
            target: Some(&self.geometry),
        };
        scene.render(&mut frame, camera);
    }

    fn post_process<D: RenderDevice>(&mut self, device: &mut D) {
        self.final_target.bind(device);
        device.set_depth_test(false);
        device.set_clear_color([0.0, 0.0, 0.0, 1.0]);
        device.clear(ClearFlags::COLOR);

        device.bind_shader(self.post_process_shader);
        device.set_uniform("u_ScreenTexture", &UniformValue::Int(0));
        device.set_uniform("u_Exposure", &UniformValue::Float(self.settings.exposure));
        device.set_uniform("u_Gamma", &UniformValue::Float(self.settings.gamma));
        let scene_color = self.geometry.color_attachment_id(&*device, 0);
        device.bind_texture(0, scene_color);

        device.bind_vertex_array(self.screen_quad.vertex_array);
        device.draw_indexed(self.screen_quad.vertex_array, self.screen_quad.index_count);

        device.set_depth_test(true);
        self.final_target.unbind(device);
    }

    pub fn geometry_target(&self) -> &RenderTarget {
        &self.geometry
    }

    pub fn final_target(&self) -> &RenderTarget {
        &self.final_target
    }

    /// Tone-mapped color texture for display in a viewport
    pub fn final_image<D: RenderDevice>(&self, device: &D) -> TextureId {
        self.final_target.color_attachment_id(device, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_only_on_change() {
        let mut device = RecordingDevice::new();
        let shader = device.create_shader(&ShaderDescriptor::named("tonemap")).unwrap();
        let mut scene_renderer =
            SceneRenderer::new(&mut device, shader, SceneRendererSettings::default()).unwrap();

        scene_renderer.set_viewport_size(&mut device, 1280, 720);
        assert!(device.commands().is_empty());

        scene_renderer.set_viewport_size(&mut device, 800, 600);
        scene_renderer.set_viewport_size(&mut device, 800, 600);
        let resizes = device
            .commands()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::ResizeRenderTarget { .. }))
            .count();
        assert_eq!(resizes, 2);
        assert_eq!(scene_renderer.geometry_target().width(), 800);
        assert_eq!(scene_renderer.final_target().height(), 600);
    }

    #[test]
    fn test_minimized_viewport_keeps_size() {
        let mut device = RecordingDevice::new();
        let shader = device.create_shader(&ShaderDescriptor::named("tonemap")).unwrap();
        let mut scene_renderer =
            SceneRenderer::new(&mut device, shader, SceneRendererSettings::default()).unwrap();

        scene_renderer.set_viewport_size(&mut device, 0, 0);
        assert_eq!(scene_renderer.viewport_size(), (1280, 720));
        assert_eq!(scene_renderer.geometry_target().width(), 1280);

        // Restoring the old size is a no-op, not a reallocation
        scene_renderer.set_viewport_size(&mut device, 1280, 720);
        assert!(device.commands().is_empty());
    }

    #[test]
    fn test_final_image_is_final_color_attachment() {
        let mut device = RecordingDevice::new();
        let shader = device.create_shader(&ShaderDescriptor::named("tonemap")).unwrap();
        let scene_renderer =
            SceneRenderer::new(&mut device, shader, SceneRendererSettings::default()).unwrap();

        let image = scene_renderer.final_image(&device);
        assert_eq!(image, device.color_attachment(scene_renderer.final_target().id(), 0));
        assert_ne!(image, device.color_attachment(scene_renderer.geometry_target().id(), 0));
    }
}
