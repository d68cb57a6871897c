//! Axis-aligned bounding boxes in 2D and 3D, with the operations the shape
//! tree needs: `canon`, `vertices`, `include_point`, `mul_box`.

use crate::vector::{Mat3, Mat4, V2, V3};

/// Axis-aligned box in 2D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box2 {
    pub min: V2,
    pub max: V2,
}

impl Box2 {
    #[must_use]
    pub fn new(min: V2, max: V2) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_center_half_extents(center: V2, half_extents: V2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    #[must_use]
    pub fn cube(half_size: f32) -> Self {
        Self::new(V2::splat(-half_size), V2::splat(half_size))
    }

    /// Reorder `min`/`max` component-wise so `min <= max` everywhere. Needed
    /// after operations (negative scale, mirrored corners) that can flip the
    /// two apart.
    #[must_use]
    pub fn canon(&self) -> Self {
        Self::new(self.min.min(self.max), self.min.max(self.max))
    }

    #[must_use]
    pub fn size(&self) -> V2 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> V2 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Translate by `offset`.
    #[must_use]
    pub fn add(&self, offset: V2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    #[must_use]
    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor).canon()
    }

    #[must_use]
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(self.min - V2::splat(margin), self.max + V2::splat(margin))
    }

    #[must_use]
    pub fn vertices(&self) -> [V2; 4] {
        [
            V2::new(self.min.x, self.min.y),
            V2::new(self.max.x, self.min.y),
            V2::new(self.min.x, self.max.y),
            V2::new(self.max.x, self.max.y),
        ]
    }

    #[must_use]
    pub fn include_point(&self, p: V2) -> Self {
        Self::new(self.min.min(p), self.max.max(p))
    }

    /// Apply a 2D affine transform conservatively: enumerate the 4 corners,
    /// transform each, and take the AABB of the results.
    #[must_use]
    pub fn mul_box(&self, mat: Mat3) -> Self {
        let mut result = Self::new(V2::splat(f32::MAX), V2::splat(f32::MIN));
        for v in self.vertices() {
            let transformed = mat.transform_point2(v);
            result = result.include_point(transformed);
        }
        result
    }
}

/// Axis-aligned box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3 {
    pub min: V3,
    pub max: V3,
}

impl Box3 {
    #[must_use]
    pub fn new(min: V3, max: V3) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn from_center_half_extents(center: V3, half_extents: V3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    #[must_use]
    pub fn cube(half_size: f32) -> Self {
        Self::new(V3::splat(-half_size), V3::splat(half_size))
    }

    #[must_use]
    pub fn canon(&self) -> Self {
        Self::new(self.min.min(self.max), self.min.max(self.max))
    }

    #[must_use]
    pub fn size(&self) -> V3 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> V3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self::new(self.min.max(other.min), self.max.min(other.max))
    }

    #[must_use]
    pub fn add(&self, offset: V3) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    #[must_use]
    pub fn scale(&self, factor: f32) -> Self {
        Self::new(self.min * factor, self.max * factor).canon()
    }

    #[must_use]
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(self.min - V3::splat(margin), self.max + V3::splat(margin))
    }

    #[must_use]
    pub fn vertices(&self) -> [V3; 8] {
        [
            V3::new(self.min.x, self.min.y, self.min.z),
            V3::new(self.max.x, self.min.y, self.min.z),
            V3::new(self.min.x, self.max.y, self.min.z),
            V3::new(self.max.x, self.max.y, self.min.z),
            V3::new(self.min.x, self.min.y, self.max.z),
            V3::new(self.max.x, self.min.y, self.max.z),
            V3::new(self.min.x, self.max.y, self.max.z),
            V3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    #[must_use]
    pub fn include_point(&self, p: V3) -> Self {
        Self::new(self.min.min(p), self.max.max(p))
    }

    /// Apply a 3D affine transform conservatively: enumerate the 8 corners,
    /// transform each, and take the AABB of the results. This is the bounds
    /// rule every transform-carrying node (translate, rotate, general
    /// transform) uses.
    #[must_use]
    pub fn mul_box(&self, mat: Mat4) -> Self {
        let mut result = Self::new(V3::splat(f32::MAX), V3::splat(f32::MIN));
        for v in self.vertices() {
            let transformed = mat.transform_point3(v);
            result = result.include_point(transformed);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canon_fixes_flipped_box() {
        let b = Box3::new(V3::splat(1.0), V3::splat(-1.0)).canon();
        assert_eq!(b.min, V3::splat(-1.0));
        assert_eq!(b.max, V3::splat(1.0));
    }

    #[test]
    fn union_and_intersect() {
        let a = Box2::new(V2::new(-1.0, -1.0), V2::new(1.0, 1.0));
        let b = Box2::new(V2::new(0.0, 0.0), V2::new(2.0, 2.0));
        assert_eq!(a.union(&b), Box2::new(V2::new(-1.0, -1.0), V2::new(2.0, 2.0)));
        assert_eq!(a.intersect(&b), Box2::new(V2::new(0.0, 0.0), V2::new(1.0, 1.0)));
    }

    #[test]
    fn mul_box_rotated_unit_cube() {
        let b = Box3::cube(1.0);
        let mat = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let rotated = b.mul_box(mat);
        // Rotating a cube by 45deg around Y grows the X/Z extent to sqrt(2).
        assert!((rotated.max.x - std::f32::consts::SQRT_2).abs() < 1e-5);
    }
}
