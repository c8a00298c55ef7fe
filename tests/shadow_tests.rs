//! Cascaded shadow fitting tests
//!
//! Every cascade's light-space matrix must map the corners of its camera
//! slice into the unit clip cube, and fit them tightly in x/y.

use glam::{Mat4, Vec3, Vec4Swizzles};
use rstest::rstest;

use render_core::renderer::shadow::{cascade_ranges, frustum_corners_world, light_space_matrix};
use render_core::renderer::{calculate_shadow_data, GpuShadowData};
use render_core::scene::{Camera, Projection, DEFAULT_LIGHT_DIRECTION};

const SPLITS: [f32; 4] = [7.0, 25.0, 90.0, 1000.0];
const TOLERANCE: f32 = 1e-3;

fn camera() -> Camera {
    Camera::look_at(
        Vec3::new(3.0, 4.0, 10.0),
        Vec3::ZERO,
        Projection::perspective(60.0, 16.0 / 9.0, 0.1, 1000.0),
    )
}

fn slice_corners(camera: &Camera, cascade: usize) -> [Vec3; 8] {
    let (near, far) = cascade_ranges(camera.projection.near(), &SPLITS)[cascade];
    frustum_corners_world(&camera.projection.slice(near, far), &camera.view_matrix())
}

fn to_clip(matrix: &Mat4, point: Vec3) -> Vec3 {
    (*matrix * point.extend(1.0)).xyz()
}

// ============================================================================
// Cascade Fitting
// ============================================================================

#[rstest]
#[case::default_sun(DEFAULT_LIGHT_DIRECTION)]
#[case::straight_down(Vec3::NEG_Y)]
#[case::straight_up(Vec3::Y)]
#[case::grazing(Vec3::new(1.0, -0.05, 0.0))]
fn cascade_corners_land_in_clip_cube(#[case] direction: Vec3) {
    let camera = camera();
    let data = calculate_shadow_data(&camera, direction, &SPLITS, 10.0);

    for cascade in 0..4 {
        let matrix = data.light_space_matrices[cascade];
        assert!(matrix.is_finite(), "cascade {} not finite", cascade);

        let clip: Vec<Vec3> = slice_corners(&camera, cascade)
            .iter()
            .map(|c| to_clip(&matrix, *c))
            .collect();
        for p in &clip {
            assert!(
                p.abs().cmple(Vec3::splat(1.0 + TOLERANCE)).all(),
                "cascade {} corner {:?} outside clip cube",
                cascade,
                p
            );
        }

        // Tight in x and y
        let min_x = clip.iter().map(|p| p.x).fold(f32::MAX, f32::min);
        let max_x = clip.iter().map(|p| p.x).fold(f32::MIN, f32::max);
        let min_y = clip.iter().map(|p| p.y).fold(f32::MAX, f32::min);
        let max_y = clip.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((min_x + 1.0).abs() < TOLERANCE && (max_x - 1.0).abs() < TOLERANCE);
        assert!((min_y + 1.0).abs() < TOLERANCE && (max_y - 1.0).abs() < TOLERANCE);
    }
}

#[test]
fn depth_multiplier_leaves_room_in_front() {
    let camera = camera();
    let corners = slice_corners(&camera, 1);

    let tight = light_space_matrix(&corners, DEFAULT_LIGHT_DIRECTION, 1.0);
    let stretched = light_space_matrix(&corners, DEFAULT_LIGHT_DIRECTION, 10.0);

    let depth_span = |m: &Mat4| {
        let z: Vec<f32> = corners.iter().map(|c| to_clip(m, *c).z).collect();
        let min = z.iter().copied().fold(f32::MAX, f32::min);
        let max = z.iter().copied().fold(f32::MIN, f32::max);
        max - min
    };
    assert!((depth_span(&tight) - 2.0).abs() < TOLERANCE);
    assert!(depth_span(&stretched) < depth_span(&tight));
}

#[test]
fn cascade_distances_match_splits() {
    let data = calculate_shadow_data(&camera(), DEFAULT_LIGHT_DIRECTION, &SPLITS, 10.0);
    let distances: Vec<f32> = data.cascade_distances.iter().map(|d| d.x).collect();
    assert_eq!(distances, SPLITS.to_vec());
}

#[test]
fn zero_direction_falls_back_to_default() {
    let camera = camera();
    let fallback = calculate_shadow_data(&camera, Vec3::ZERO, &SPLITS, 10.0);
    let default = calculate_shadow_data(&camera, DEFAULT_LIGHT_DIRECTION, &SPLITS, 10.0);
    assert_eq!(fallback, default);
}

#[test]
fn near_cascade_is_smaller_than_far() {
    let camera = camera();
    let data = calculate_shadow_data(&camera, DEFAULT_LIGHT_DIRECTION, &SPLITS, 10.0);
    // Orthographic x scale is 2 / width: the nearest slice covers less ground
    let scale = |m: &Mat4| m.x_axis.xyz().length();
    assert!(scale(&data.light_space_matrices[0]) > scale(&data.light_space_matrices[3]));
}

#[test]
fn shadow_block_layout() {
    assert_eq!(std::mem::size_of::<GpuShadowData>(), 4 * 64 + 4 * 16);
}
