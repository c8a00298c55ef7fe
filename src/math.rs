//! Bounding volumes and rays

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all points. An empty slice gives a zero-size box at the origin.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::new(Vec3::ZERO, Vec3::ZERO);
        };
        iter.fold(Self::new(first, first), |acc, p| {
            Self::new(acc.min.min(p), acc.max.max(p))
        })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size along each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Bounds of this box after an affine transform.
    ///
    /// Transforms the center by the full matrix and rebuilds the half-extents
    /// from the absolute basis axes, which is exact for affine matrices
    /// including non-uniform scale.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point3(self.center());
        let e = self.extents();
        let extents = matrix.x_axis.truncate().abs() * e.x
            + matrix.y_axis.truncate().abs() * e.y
            + matrix.z_axis.truncate().abs() * e.z;
        Self::new(center - extents, center + extents)
    }

    /// The eight corners, bottom face first
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(b.x, b.y, b.z),
            Vec3::new(a.x, b.y, b.z),
        ]
    }

    /// The twelve edges as a line list (24 points)
    pub fn edge_lines(&self) -> [[f32; 3]; 24] {
        const EDGES: [(usize, usize); 12] = [
            (0, 1), (1, 2), (2, 3), (3, 0),
            (4, 5), (5, 6), (6, 7), (7, 4),
            (0, 4), (1, 5), (2, 6), (3, 7),
        ];
        let c = self.corners();
        let mut out = [[0.0; 3]; 24];
        for (i, (a, b)) in EDGES.iter().enumerate() {
            out[i * 2] = c[*a].to_array();
            out[i * 2 + 1] = c[*b].to_array();
        }
        out
    }
}

/// A half-line used for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray through a viewport pixel, in world space
    ///
    /// `ndc` is the pixel in normalized device coordinates (`[-1, 1]` on both axes).
    pub fn from_screen(ndc: glam::Vec2, inverse_view_projection: &Mat4) -> Self {
        let near = inverse_view_projection.project_point3(ndc.extend(-1.0));
        let far = inverse_view_projection.project_point3(ndc.extend(1.0));
        Self::new(near, (far - near).normalize_or_zero())
    }

    /// This ray expressed in another space. The direction is not renormalized,
    /// so hit distances stay comparable with the source space.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Slab test. Returns the entry distance, or the exit distance when the
    /// origin is inside the box; `None` if the box is missed or behind the ray.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let inv = self.direction.recip();
        let t1 = (aabb.min - self.origin) * inv;
        let t2 = (aabb.max - self.origin) * inv;

        let t_min = t1.min(t2).max_element();
        let t_max = t1.max(t2).min_element();

        if t_max < 0.0 || t_min > t_max {
            return None;
        }
        Some(if t_min < 0.0 { t_max } else { t_min })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformed_scale_and_translate() {
        let local = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let m = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0))
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let world = local.transformed(&m);
        assert_eq!(world.min, Vec3::new(3.0, -1.0, -1.0));
        assert_eq!(world.max, Vec3::new(7.0, 1.0, 1.0));
    }

    #[test]
    fn test_transformed_rotation_grows_box() {
        let local = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let m = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let world = local.transformed(&m);
        let expected = std::f32::consts::SQRT_2;
        assert!((world.max.x - expected).abs() < 1e-5);
        assert!((world.max.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_from_points() {
        let aabb = Aabb::from_points([
            Vec3::new(1.0, -2.0, 0.0),
            Vec3::new(-1.0, 3.0, 0.5),
            Vec3::new(0.0, 0.0, -4.0),
        ]);
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, -4.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 3.0, 0.5));
        assert_eq!(Aabb::from_points([]).extents(), Vec3::ZERO);
    }

    #[test]
    fn test_screen_center_ray_follows_view_axis() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(60f32.to_radians(), 1.5, 0.1, 100.0);
        let ray = Ray::from_screen(glam::Vec2::ZERO, &(projection * view).inverse());

        assert!((ray.origin - Vec3::new(0.0, 0.0, 9.9)).length() < 1e-3);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-5);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let hit = ray.intersect_aabb(&aabb).unwrap();
        assert!((hit - 8.9).abs() < 1e-3);
    }

    #[test]
    fn test_screen_corner_ray_misses_centered_box() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh_gl(60f32.to_radians(), 1.5, 0.1, 100.0);
        let ray = Ray::from_screen(glam::Vec2::new(0.9, 0.9), &(projection * view).inverse());
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(ray.intersect_aabb(&aabb), None);
    }

    #[test]
    fn test_ray_hits_box_in_front() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::Z);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(ray.intersect_aabb(&aabb), Some(9.0));
    }

    #[test]
    fn test_ray_misses_box_behind() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(ray.intersect_aabb(&aabb), None);
    }

    #[test]
    fn test_ray_from_inside_reports_exit() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(2.0));
        assert_eq!(ray.intersect_aabb(&aabb), Some(2.0));
    }

    #[test]
    fn test_edge_lines_count() {
        let lines = Aabb::default().edge_lines();
        assert_eq!(lines.len(), 24);
        assert_eq!(lines[0], [-0.5, -0.5, -0.5]);
    }
}
