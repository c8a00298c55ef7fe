//! Frustum and bounding box tests
//!
//! Tests for:
//! - Plane extraction from perspective and orthographic matrices
//! - Box rejection against each of the six planes
//! - World-space AABB transforms

mod common;

use glam::{Mat4, Quat, Vec3};
use rstest::rstest;

use common::approx;
use render_core::frustum::Frustum;
use render_core::math::Aabb;

fn ortho_frustum() -> Frustum {
    // Box-shaped volume: x,y in [-10, 10], z in [-1, -100] (view looks down -Z)
    Frustum::from_matrix(&Mat4::orthographic_rh_gl(-10.0, 10.0, -10.0, 10.0, 1.0, 100.0))
}

fn perspective_frustum() -> Frustum {
    let proj = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.1, 100.0);
    let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    Frustum::from_matrix(&(proj * view))
}

// ============================================================================
// Plane Extraction
// ============================================================================

#[test]
fn ortho_planes_sit_at_volume_faces() {
    let f = ortho_frustum();
    // Left plane: x = -10, normal +X
    assert!(approx(f.planes[0].normal.x, 1.0));
    assert!(approx(f.planes[0].distance, 10.0));
    // Near plane: z = -1, normal -Z
    assert!(approx(f.planes[4].normal.z, -1.0));
    assert!(approx(f.planes[4].distance, -1.0));
}

#[test]
fn all_planes_unit_length() {
    for plane in perspective_frustum().planes {
        assert!(approx(plane.normal.length(), 1.0));
    }
}

// ============================================================================
// Box Visibility
// ============================================================================

#[rstest]
#[case::left(Vec3::new(-20.0, 0.0, -50.0))]
#[case::right(Vec3::new(20.0, 0.0, -50.0))]
#[case::bottom(Vec3::new(0.0, -20.0, -50.0))]
#[case::top(Vec3::new(0.0, 20.0, -50.0))]
#[case::near(Vec3::new(0.0, 0.0, 5.0))]
#[case::far(Vec3::new(0.0, 0.0, -200.0))]
fn box_outside_one_ortho_plane_is_culled(#[case] center: Vec3) {
    let f = ortho_frustum();
    assert!(!f.is_box_visible(center - Vec3::ONE, center + Vec3::ONE));
}

#[rstest]
#[case::center(Vec3::new(0.0, 0.0, -50.0))]
#[case::touching_left(Vec3::new(-10.5, 0.0, -50.0))]
#[case::straddling_far(Vec3::new(0.0, 0.0, -100.0))]
fn box_inside_or_straddling_ortho_is_visible(#[case] center: Vec3) {
    let f = ortho_frustum();
    assert!(f.is_box_visible(center - Vec3::ONE, center + Vec3::ONE));
}

#[test]
fn unit_cube_at_origin_visible_in_perspective() {
    assert!(perspective_frustum().is_box_visible(Vec3::splat(-0.5), Vec3::splat(0.5)));
}

#[rstest]
#[case::behind(Vec3::new(0.0, 0.0, 20.0))]
#[case::far_left(Vec3::new(-100.0, 0.0, 0.0))]
#[case::beyond_far(Vec3::new(0.0, 0.0, -150.0))]
fn box_outside_perspective_is_culled(#[case] center: Vec3) {
    assert!(!perspective_frustum().is_box_visible(center - Vec3::ONE, center + Vec3::ONE));
}

#[test]
fn redefine_replaces_planes() {
    let mut f = perspective_frustum();
    let far_box = (Vec3::new(-1.0, -1.0, -52.0), Vec3::new(1.0, 1.0, -50.0));
    assert!(f.is_box_visible(far_box.0, far_box.1));

    let short = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.1, 10.0)
        * Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    f.define(&short);
    assert!(!f.is_box_visible(far_box.0, far_box.1));
}

// ============================================================================
// World AABB
// ============================================================================

#[test]
fn scale_then_translate_world_aabb_is_exact() {
    let local = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
    let transform = Mat4::from_scale_rotation_translation(
        Vec3::new(2.0, 1.0, 1.0),
        Quat::IDENTITY,
        Vec3::new(5.0, 0.0, 0.0),
    );
    let world = local.transformed(&transform);
    assert_eq!(world.min, Vec3::new(3.0, -1.0, -1.0));
    assert_eq!(world.max, Vec3::new(7.0, 1.0, 1.0));
}

#[test]
fn world_aabb_contains_all_transformed_corners() {
    let local = Aabb::new(Vec3::new(-1.0, 0.0, -2.0), Vec3::new(3.0, 1.0, 0.5));
    let transform = Mat4::from_scale_rotation_translation(
        Vec3::new(1.5, 0.5, 2.0),
        Quat::from_euler(glam::EulerRot::XYZ, 0.3, 1.1, -0.7),
        Vec3::new(-4.0, 2.0, 9.0),
    );
    let world = local.transformed(&transform);
    for corner in local.corners() {
        let p = transform.transform_point3(corner);
        assert!(p.cmpge(world.min - EPS).all() && p.cmple(world.max + EPS).all());
    }
}

const EPS: Vec3 = Vec3::splat(1e-4);
