//! Cascaded shadow map fitting
//!
//! Each cascade covers one depth slice of the camera frustum. The slice's
//! world-space corners are fitted with an orthographic box in light space.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::render_target::SHADOW_CASCADES;
use crate::scene::{Camera, DEFAULT_LIGHT_DIRECTION};

/// Shadow uniform block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuShadowData {
    pub light_space_matrices: [Mat4; SHADOW_CASCADES],
    /// x = cascade far distance; yzw pad each entry to a std140 vec4
    pub cascade_distances: [Vec4; SHADOW_CASCADES],
}

impl Default for GpuShadowData {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Near/far view distances of each cascade. The first cascade starts at
/// the camera's near plane, each later one at the previous split.
pub fn cascade_ranges(camera_near: f32, splits: &[f32; SHADOW_CASCADES]) -> [(f32, f32); SHADOW_CASCADES] {
    let mut ranges = [(0.0, 0.0); SHADOW_CASCADES];
    let mut near = camera_near;
    for (range, &far) in ranges.iter_mut().zip(splits) {
        // A slice must have some depth to be invertible
        *range = (near, far.max(near + 1e-3));
        near = far;
    }
    ranges
}

/// World-space corners of a projection slice seen through `view`
pub fn frustum_corners_world(projection: &Mat4, view: &Mat4) -> [Vec3; 8] {
    let inverse = (*projection * *view).inverse();
    let mut corners = [Vec3::ZERO; 8];
    let mut i = 0;
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                corners[i] = inverse.project_point3(Vec3::new(x, y, z));
                i += 1;
            }
        }
    }
    corners
}

/// Orthographic light-space matrix enclosing `corners`.
///
/// The depth range is stretched by `z_mult` (negative bounds multiplied,
/// positive divided on the near side and the reverse on the far side) so
/// casters outside the slice still land in the map.
pub fn light_space_matrix(corners: &[Vec3; 8], light_direction: Vec3, z_mult: f32) -> Mat4 {
    let direction = light_direction
        .try_normalize()
        .unwrap_or_else(|| DEFAULT_LIGHT_DIRECTION.normalize());

    let centroid = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
    let up = if direction.dot(Vec3::Y).abs() > 0.999 {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let light_view = Mat4::look_at_rh(centroid - direction, centroid, up);

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for corner in corners {
        let p = light_view.transform_point3(*corner);
        min = min.min(p);
        max = max.max(p);
    }

    let min_z = if min.z < 0.0 { min.z * z_mult } else { min.z / z_mult };
    let max_z = if max.z < 0.0 { max.z / z_mult } else { max.z * z_mult };

    // View-space z runs negative into the screen; near/far are distances
    let projection = Mat4::orthographic_rh_gl(min.x, max.x, min.y, max.y, -max_z, -min_z);
    projection * light_view
}

/// Fit all cascades for this frame's camera and light
pub fn calculate_shadow_data(
    camera: &Camera,
    light_direction: Vec3,
    splits: &[f32; SHADOW_CASCADES],
    z_mult: f32,
) -> GpuShadowData {
    if light_direction.length_squared() == 0.0 {
        log::warn!("Directional light has zero direction; using default for shadows");
    }

    let view = camera.view_matrix();
    let mut data = GpuShadowData::default();
    for (i, (near, far)) in cascade_ranges(camera.projection.near(), splits)
        .into_iter()
        .enumerate()
    {
        let corners = frustum_corners_world(&camera.projection.slice(near, far), &view);
        data.light_space_matrices[i] = light_space_matrix(&corners, light_direction, z_mult);
        data.cascade_distances[i] = Vec4::new(splits[i], 0.0, 0.0, 0.0);
    }
    data
}
