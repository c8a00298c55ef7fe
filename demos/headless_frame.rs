//! Headless frame example.
//!
//! Builds a small scene, renders one editor frame through a
//! [`RecordingDevice`] and prints what the renderer did.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --example headless_frame
//! ```

use glam::Vec3;

use render_core::backend::{DeviceCommand, RenderDevice, ShaderDescriptor};
use render_core::resources::{Material, Mesh, MeshData, ResourceArena, TextureLibrary};
use render_core::scene::{Camera, PointLight, Projection, Scene, Transform};
use render_core::{
    RecordingDevice, Renderer, RendererConfig, RendererShaders, SceneRenderer,
    SceneRendererSettings,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut device = RecordingDevice::new();
    let shaders = RendererShaders {
        shadow_depth: device.create_shader(&ShaderDescriptor::from_path("shadow_depth", "shaders/shadow_depth.glsl"))?,
        skybox: device.create_shader(&ShaderDescriptor::from_path("skybox", "shaders/skybox.glsl"))?,
        debug_lines: Some(device.create_shader(&ShaderDescriptor::from_path("lines", "shaders/lines.glsl"))?),
    };
    let pbr = device.create_shader(&ShaderDescriptor::from_path("pbr", "shaders/pbr.glsl"))?;
    let tonemap = device.create_shader(&ShaderDescriptor::from_path("tonemap", "shaders/tonemap.glsl"))?;

    let mut renderer = Renderer::new(&mut device, RendererConfig::default(), shaders)?;
    let textures = TextureLibrary::new(&mut device)?;
    let mut resources = ResourceArena::new();
    let mut scene_renderer = SceneRenderer::new(
        &mut device,
        tonemap,
        SceneRendererSettings {
            show_bounding_boxes: true,
            ..SceneRendererSettings::default()
        },
    )?;

    let cube = resources.add_mesh(Mesh::upload(&mut device, &MeshData::cube())?);
    let sphere = resources.add_mesh(Mesh::upload(&mut device, &MeshData::sphere(32, 16))?);
    let stone = resources.add_material(Material::new("stone", pbr, &textures).with_roughness(0.9));
    let glass = resources.add_material(
        Material::new("glass", pbr, &textures)
            .with_albedo_color(glam::Vec4::new(0.6, 0.8, 1.0, 0.3))
            .with_transparency(true),
    );

    let mut scene = Scene::new();
    scene.add_mesh(
        "ground",
        cube,
        stone,
        Transform::from_position_scale(Vec3::new(0.0, -0.5, 0.0), Vec3::new(40.0, 1.0, 40.0)),
    );
    for x in -5..=5 {
        for z in -5..=5 {
            let position = Vec3::new(x as f32 * 3.0, 0.5, z as f32 * 3.0);
            scene.add_mesh("pillar", cube, stone, Transform::from_position(position));
        }
    }
    for i in 0..8 {
        let position = Vec3::new(i as f32 * 2.0 - 8.0, 3.0, 0.0);
        scene.add_mesh("bubble", sphere, glass, Transform::from_position(position));
    }
    scene.add_point_light(PointLight::new(Vec3::new(0.0, 6.0, 0.0), Vec3::new(1.0, 0.9, 0.7), 20.0));

    scene_renderer.set_viewport_size(&mut device, 1920, 1080);
    let camera = Camera::look_at(
        Vec3::new(0.0, 12.0, 25.0),
        Vec3::ZERO,
        Projection::perspective(45.0, 1920.0 / 1080.0, 0.1, 1000.0),
    );
    device.clear_commands();
    scene_renderer.render_editor(&mut device, &mut renderer, &resources, &scene, &camera);

    let stats = renderer.stats();
    println!(
        "{} submitted, {} culled, {} opaque, {} transparent",
        stats.submitted, stats.culled, stats.opaque_packets, stats.transparent_packets
    );
    println!(
        "{} batches, {} draw calls, {} shader binds, {} texture binds",
        stats.batches, stats.draw_calls, stats.shader_binds, stats.texture_binds
    );
    for batch in renderer.batches() {
        println!(
            "  {:?}: {} instances of {:?} with {:?}",
            batch.pass,
            batch.instance_count,
            batch.vertex_array,
            device.shader_name(batch.shader).unwrap_or("?")
        );
    }
    let uniforms = device
        .commands()
        .iter()
        .filter(|c| matches!(c, DeviceCommand::SetUniform { .. }))
        .count();
    println!("{} device commands ({} uniform writes)", device.commands().len(), uniforms);

    Ok(())
}
