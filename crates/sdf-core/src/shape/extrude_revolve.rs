//! Dimension-lifting operators: turn a 2D shape into a 3D one.
//! Both are the only nodes that carry a `children2` but no `children3`.

use sdf_math::{name_encode_float as name_f, Box3, V2, V3};

use crate::error::Result;
use crate::eval::EvalCtx3;
use crate::shape::{Shape2Handle, Shape3, Shape3Handle};

/// Extrude a 2D profile along Z by total `height`, centered on the origin.
/// `d = max(d2(x, y), |z| - height/2)`.
#[derive(Debug, Clone)]
pub struct Extrude {
    pub profile: Shape2Handle,
    pub height: f32,
}

impl Extrude {
    #[must_use]
    pub fn new(profile: Shape2Handle, height: f32) -> Self {
        Self { profile, height }
    }
}

impl Shape3 for Extrude {
    fn append_name(&self, out: &mut String) {
        out.push_str("extrude_");
        out.push_str(&name_f(self.height));
        out.push('_');
        out.push_str(&self.profile.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}float d2 = {profile}(p.xy);\n\
             \u{20}\u{20}float dz = abs(p.z) - {half};\n\
             \u{20}\u{20}return max(d2, dz);\n}}\n",
            name = name,
            profile = self.profile.name(),
            half = name_f_lit(self.height * 0.5),
        ));
    }

    fn bounds(&self) -> Box3 {
        let b2 = self.profile.bounds();
        let half = self.height * 0.5;
        Box3::new(
            V3::new(b2.min.x, b2.min.y, -half),
            V3::new(b2.max.x, b2.max.y, half),
        )
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.profile.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let mut xy = ctx.pool.acquire_v2(positions.len());
        for (p, q) in positions.iter().zip(xy.iter_mut()) {
            *q = V2::new(p.x, p.y);
        }
        let mut d2 = ctx.pool.acquire_f32(positions.len());
        let mut ctx2 = crate::eval::EvalCtx2 { pool: std::mem::take(&mut ctx.pool) };
        self.profile.evaluate(&xy, &mut d2, &mut ctx2)?;
        ctx.pool = ctx2.pool;
        let half = self.height * 0.5;
        for ((p, out), d2v) in positions.iter().zip(distances.iter_mut()).zip(d2.iter()) {
            let dz = p.z.abs() - half;
            *out = d2v.max(dz);
        }
        ctx.pool.release_v2(xy);
        ctx.pool.release_f32(d2);
        Ok(())
    }
}

fn name_f_lit(f: f32) -> String {
    sdf_math::format_float(f)
}

/// Revolve a 2D profile around the Y axis, offset from the axis by `offset`.
/// `d = d2(hypot(x, z) - offset, y)`.
#[derive(Debug, Clone)]
pub struct Revolve {
    pub profile: Shape2Handle,
    pub offset: f32,
}

impl Revolve {
    #[must_use]
    pub fn new(profile: Shape2Handle, offset: f32) -> Self {
        Self { profile, offset }
    }
}

impl Shape3 for Revolve {
    fn append_name(&self, out: &mut String) {
        out.push_str("revolve_");
        out.push_str(&name_f(self.offset));
        out.push('_');
        out.push_str(&self.profile.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}vec2 q = vec2(length(p.xz) - {offset}, p.y);\n\
             \u{20}\u{20}return {profile}(q);\n}}\n",
            name = name,
            offset = name_f_lit(self.offset),
            profile = self.profile.name(),
        ));
    }

    fn bounds(&self) -> Box3 {
        let b2 = self.profile.bounds();
        let radial = (b2.max.x + self.offset).max(0.0);
        Box3::new(
            V3::new(-radial, b2.min.y, -radial),
            V3::new(radial, b2.max.y, radial),
        )
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.profile.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let mut q = ctx.pool.acquire_v2(positions.len());
        for (p, out) in positions.iter().zip(q.iter_mut()) {
            *out = V2::new((p.x * p.x + p.z * p.z).sqrt() - self.offset, p.y);
        }
        let mut ctx2 = crate::eval::EvalCtx2 { pool: std::mem::take(&mut ctx.pool) };
        self.profile.evaluate(&q, distances, &mut ctx2)?;
        ctx.pool = ctx2.pool;
        ctx.pool.release_v2(q);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::primitives2::Circle;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn extrude_matches_max_of_profile_and_slab() {
        let profile: Shape2Handle = Arc::new(Circle::new(1.0));
        let e = Extrude::new(profile, 2.0);
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(0.0, 0.0, 0.0)];
        let mut distances = vec![0.0];
        e.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn revolve_bounds_are_radial() {
        let profile: Shape2Handle = Arc::new(Circle::new(1.0));
        let r = Revolve::new(profile, 2.0);
        let b = r.bounds();
        assert_relative_eq!(b.max.x, 3.0, epsilon = 1e-6);
        assert_relative_eq!(b.max.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn revolve_evaluates_on_meridian_plane() {
        let profile: Shape2Handle = Arc::new(Circle::new(1.0));
        let r = Revolve::new(profile, 2.0);
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(2.0, 0.0, 0.0)];
        let mut distances = vec![0.0];
        r.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -1.0, epsilon = 1e-6);
    }
}
