use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::{Mat4, Vec3};

use render_core::backend::{RecordingDevice, RenderDevice, ShaderDescriptor};
use render_core::renderer::{build_batches, BatchKey, RenderCommandPacket, RenderQueue};
use render_core::resources::{Material, Mesh, MeshData, ResourceArena, TextureLibrary};
use render_core::scene::{Camera, LightEnvironment, Projection};
use render_core::{Renderer, RendererConfig, RendererShaders};

const PACKETS: usize = 10_000;

struct Setup {
    device: RecordingDevice,
    resources: ResourceArena,
    packets: Vec<RenderCommandPacket>,
}

/// Four meshes under two shaders, scattered in a grid in front of the camera
fn setup() -> Setup {
    let mut device = RecordingDevice::new();
    let textures = TextureLibrary::new(&mut device).unwrap();
    let mut resources = ResourceArena::new();

    let shaders = [
        device.create_shader(&ShaderDescriptor::named("pbr")).unwrap(),
        device.create_shader(&ShaderDescriptor::named("unlit")).unwrap(),
    ];
    let meshes: Vec<_> = [
        MeshData::cube(),
        MeshData::quad(),
        MeshData::sphere(8, 4),
        MeshData::sphere(16, 8),
    ]
    .iter()
    .map(|data| resources.add_mesh(Mesh::upload(&mut device, data).unwrap()))
    .collect();
    let materials: Vec<_> = shaders
        .iter()
        .map(|&s| resources.add_material(Material::new("bench", s, &textures)))
        .collect();

    let packets = (0..PACKETS)
        .map(|i| {
            let mesh = meshes[i % meshes.len()];
            let material = materials[(i / 3) % materials.len()];
            let position = Vec3::new((i % 100) as f32 - 50.0, 0.0, -((i / 100) as f32));
            let transform = Mat4::from_translation(position);
            let mesh_data = resources.mesh(mesh);
            let world_aabb = mesh_data.aabb.transformed(&transform);
            RenderCommandPacket {
                mesh,
                material,
                key: BatchKey {
                    vertex_array: mesh_data.vertex_array,
                    shader: resources.material(material).shader,
                },
                index_count: mesh_data.index_count,
                transform,
                world_aabb,
                distance_sq: position.length_squared(),
            }
        })
        .collect();

    Setup {
        device,
        resources,
        packets,
    }
}

// ---------------------------------------------------------------------------
// Queue sorting and batching
// ---------------------------------------------------------------------------

fn bench_sort_and_batch(c: &mut Criterion) {
    let Setup { packets, .. } = setup();

    c.bench_function("queue_sort_batch_10k", |b| {
        b.iter_with_setup(
            || {
                let mut queue = RenderQueue::new();
                for (i, packet) in packets.iter().enumerate() {
                    queue.push(*packet, i % 10 == 0);
                }
                queue
            },
            |mut queue| {
                queue.sort();
                let opaque = build_batches(queue.opaque(), 10_000, |p| p.key);
                let transparent = build_batches(queue.transparent(), 10_000, |p| p.key);
                black_box((opaque.len(), transparent.len()));
            },
        );
    });
}

// ---------------------------------------------------------------------------
// Whole frame
// ---------------------------------------------------------------------------

fn bench_frame(c: &mut Criterion) {
    let Setup {
        mut device,
        resources,
        packets,
    } = setup();
    let shaders = RendererShaders {
        shadow_depth: device.create_shader(&ShaderDescriptor::named("shadow")).unwrap(),
        skybox: device.create_shader(&ShaderDescriptor::named("skybox")).unwrap(),
        debug_lines: None,
    };
    let mut renderer = Renderer::new(&mut device, RendererConfig::default(), shaders).unwrap();
    let camera = Camera::look_at(
        Vec3::new(0.0, 20.0, 30.0),
        Vec3::new(0.0, 0.0, -50.0),
        Projection::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0),
    );
    let lights = LightEnvironment::default();

    c.bench_function("frame_submit_flush_10k", |b| {
        b.iter(|| {
            renderer.begin_scene(&mut device, &camera, &lights, None, None);
            for packet in &packets {
                renderer.submit(&resources, packet.mesh, packet.material, packet.transform);
            }
            renderer.end_scene(&mut device, &resources);
            device.clear_commands();
            black_box(renderer.stats());
        });
    });
}

criterion_group!(benches, bench_sort_and_batch, bench_frame);
criterion_main!(benches);
