//! 3D primitives: sphere, box, box-frame, cylinder, hex-prism, torus.
//! Triangular prism is not a primitive here — it is modelled as
//! `extrude(equilateral_triangle(h), height)` instead.
//!
//! Formulas follow Inigo Quilez's analytic SDF library, reproduced
//! bit-equivalently between this module and `sdf-codegen`'s GLSL text for
//! the same node.

use sdf_math::{format_float, name_encode_float, Box3, V3};

use crate::error::Result;
use crate::eval::EvalCtx3;
use crate::shape::Shape3;

fn lit(f: f32) -> String {
    format_float(f)
}

fn name_f(f: f32) -> String {
    name_encode_float(f)
}

/// Sphere of radius `r`, centered at the origin.
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    pub radius: f32,
}

impl Sphere {
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Shape3 for Sphere {
    fn append_name(&self, out: &mut String) {
        out.push_str("sphere_r");
        out.push_str(&name_f(self.radius));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{ return length(p) - {r}; }}\n",
            name = name,
            r = lit(self.radius)
        ));
    }

    fn bounds(&self) -> Box3 {
        Box3::cube(self.radius)
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], _ctx: &mut EvalCtx3) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = p.length() - self.radius;
        }
        Ok(())
    }
}

/// Axis-aligned box with half-extents `(dx, dy, dz)` and edge rounding
/// `round` (0 for a sharp box).
#[derive(Debug, Clone, Copy)]
pub struct Box3Shape {
    pub half_extents: V3,
    pub round: f32,
}

impl Box3Shape {
    #[must_use]
    pub fn new(half_extents: V3, round: f32) -> Self {
        Self { half_extents, round }
    }
}

impl Shape3 for Box3Shape {
    fn append_name(&self, out: &mut String) {
        out.push_str("box_");
        out.push_str(&name_f(self.half_extents.x));
        out.push('_');
        out.push_str(&name_f(self.half_extents.y));
        out.push('_');
        out.push_str(&name_f(self.half_extents.z));
        out.push_str("_r");
        out.push_str(&name_f(self.round));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}vec3 q = abs(p) - vec3({ex}, {ey}, {ez}) + vec3({r});\n\
             \u{20}\u{20}return length(max(q, vec3(0.0))) + min(max(q.x, max(q.y, q.z)), 0.0) - {r};\n\
             }}\n",
            name = name,
            ex = lit(self.half_extents.x),
            ey = lit(self.half_extents.y),
            ez = lit(self.half_extents.z),
            r = lit(self.round)
        ));
    }

    fn bounds(&self) -> Box3 {
        Box3::new(-self.half_extents, self.half_extents)
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], _ctx: &mut EvalCtx3) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            let q = p.abs() - self.half_extents + V3::splat(self.round);
            *d = q.max(V3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0) - self.round;
        }
        Ok(())
    }
}

/// Hollow box frame: a box minus its interior, with edge thickness `edge`.
#[derive(Debug, Clone, Copy)]
pub struct BoxFrame {
    pub half_extents: V3,
    pub edge: f32,
}

impl BoxFrame {
    #[must_use]
    pub fn new(half_extents: V3, edge: f32) -> Self {
        Self { half_extents, edge }
    }
}

fn box_frame_distance(p: V3, b: V3, e: f32) -> f32 {
    let p = p.abs() - b;
    let q = (p + V3::splat(e)).abs() - V3::splat(e);
    let a = V3::new(p.x, q.y, q.z).max(V3::ZERO).length() + p.x.max(q.y.max(q.z)).min(0.0);
    let c = V3::new(q.x, p.y, q.z).max(V3::ZERO).length() + q.x.max(p.y.max(q.z)).min(0.0);
    let d = V3::new(q.x, q.y, p.z).max(V3::ZERO).length() + q.x.max(q.y.max(p.z)).min(0.0);
    a.min(c).min(d)
}

impl Shape3 for BoxFrame {
    fn append_name(&self, out: &mut String) {
        out.push_str("boxframe_");
        out.push_str(&name_f(self.half_extents.x));
        out.push('_');
        out.push_str(&name_f(self.half_extents.y));
        out.push('_');
        out.push_str(&name_f(self.half_extents.z));
        out.push_str("_e");
        out.push_str(&name_f(self.edge));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p0) {{\n\
             \u{20}\u{20}vec3 p = abs(p0) - vec3({ex}, {ey}, {ez});\n\
             \u{20}\u{20}vec3 q = abs(p + vec3({e})) - vec3({e});\n\
             \u{20}\u{20}float a = length(max(vec3(p.x, q.y, q.z), vec3(0.0))) + min(max(p.x, max(q.y, q.z)), 0.0);\n\
             \u{20}\u{20}float c = length(max(vec3(q.x, p.y, q.z), vec3(0.0))) + min(max(q.x, max(p.y, q.z)), 0.0);\n\
             \u{20}\u{20}float d = length(max(vec3(q.x, q.y, p.z), vec3(0.0))) + min(max(q.x, max(q.y, p.z)), 0.0);\n\
             \u{20}\u{20}return min(min(a, c), d);\n\
             }}\n",
            name = name,
            ex = lit(self.half_extents.x),
            ey = lit(self.half_extents.y),
            ez = lit(self.half_extents.z),
            e = lit(self.edge)
        ));
    }

    fn bounds(&self) -> Box3 {
        Box3::new(-self.half_extents, self.half_extents)
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], _ctx: &mut EvalCtx3) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = box_frame_distance(*p, self.half_extents, self.edge);
        }
        Ok(())
    }
}

/// Y-axis cylinder with radius `r`, half-height `h/2`, and edge rounding.
#[derive(Debug, Clone, Copy)]
pub struct Cylinder {
    pub radius: f32,
    pub half_height: f32,
    pub round: f32,
}

impl Cylinder {
    #[must_use]
    pub fn new(radius: f32, height: f32, round: f32) -> Self {
        Self {
            radius,
            half_height: height * 0.5,
            round,
        }
    }
}

impl Shape3 for Cylinder {
    fn append_name(&self, out: &mut String) {
        out.push_str("cylinder_r");
        out.push_str(&name_f(self.radius));
        out.push_str("_h");
        out.push_str(&name_f(self.half_height));
        out.push_str("_r");
        out.push_str(&name_f(self.round));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}vec2 d = abs(vec2(length(p.xz), p.y)) - vec2({r}, {hh}) + vec2({rd});\n\
             \u{20}\u{20}return min(max(d.x, d.y), 0.0) + length(max(d, vec2(0.0))) - {rd};\n\
             }}\n",
            name = name,
            r = lit(self.radius),
            hh = lit(self.half_height),
            rd = lit(self.round)
        ));
    }

    fn bounds(&self) -> Box3 {
        let r = self.radius + self.round.max(0.0);
        Box3::new(
            V3::new(-r, -self.half_height, -r),
            V3::new(r, self.half_height, r),
        )
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], _ctx: &mut EvalCtx3) -> Result<()> {
        for (p, dist) in positions.iter().zip(distances.iter_mut()) {
            let xz_len = sdf_math::V2::new(p.x, p.z).length();
            let d = sdf_math::V2::new(xz_len, p.y).abs()
                - sdf_math::V2::new(self.radius, self.half_height)
                + sdf_math::V2::splat(self.round);
            *dist = d.x.max(d.y).min(0.0) + d.max(sdf_math::V2::ZERO).length() - self.round;
        }
        Ok(())
    }
}

/// Y-axis hexagonal prism: `face2face` is the across-flats hexagon size,
/// `h` the full height.
#[derive(Debug, Clone, Copy)]
pub struct HexPrism {
    pub face2face: f32,
    pub half_height: f32,
}

impl HexPrism {
    #[must_use]
    pub fn new(face2face: f32, height: f32) -> Self {
        Self {
            face2face,
            half_height: height * 0.5,
        }
    }
}

const HEX_K: (f32, f32, f32) = (-0.866_025_404, 0.5, 0.577_350_269);

fn hex_prism_distance(p: V3, face2face: f32, half_height: f32) -> f32 {
    use sdf_math::V2;
    let (kx, ky, kz) = HEX_K;
    let p_abs = p.abs();
    let mut xy = V2::new(p_abs.x, p_abs.z);
    xy -= 2.0 * kx.min(xy.dot(V2::new(kx, ky))) * V2::new(kx, ky);
    let clamped = V2::new(xy.x.clamp(-kz * face2face, kz * face2face), face2face);
    let d = V2::new(
        (xy - clamped).length() * sdf_math::glsl_sign(xy.y - face2face),
        p_abs.y - half_height,
    );
    d.x.max(d.y).min(0.0) + d.max(V2::ZERO).length()
}

impl Shape3 for HexPrism {
    fn append_name(&self, out: &mut String) {
        out.push_str("hexprism_f");
        out.push_str(&name_f(self.face2face));
        out.push_str("_h");
        out.push_str(&name_f(self.half_height));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p0) {{\n\
             \u{20}\u{20}const vec3 k = vec3({kx}, {ky}, {kz});\n\
             \u{20}\u{20}vec3 p = abs(p0);\n\
             \u{20}\u{20}vec2 xy = vec2(p.x, p.z);\n\
             \u{20}\u{20}xy -= 2.0 * min(dot(k.xy, xy), 0.0) * k.xy;\n\
             \u{20}\u{20}vec2 clamped = vec2(clamp(xy.x, -k.z*{f2f}, k.z*{f2f}), {f2f});\n\
             \u{20}\u{20}vec2 d = vec2(length(xy - clamped) * sign(xy.y - {f2f}), p.y - {hh});\n\
             \u{20}\u{20}return min(max(d.x, d.y), 0.0) + length(max(d, vec2(0.0)));\n\
             }}\n",
            name = name,
            kx = kx(),
            ky = ky(),
            kz = kz(),
            f2f = lit(self.face2face),
            hh = lit(self.half_height)
        ));
    }

    fn bounds(&self) -> Box3 {
        // `face2face` is the apothem (across-flats half-size); the vertices
        // sit at the circumradius, `face2face * 2/sqrt(3)`, in XZ.
        let r = self.face2face * 2.0 / 3.0_f32.sqrt();
        Box3::new(
            V3::new(-r, -self.half_height, -r),
            V3::new(r, self.half_height, r),
        )
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], _ctx: &mut EvalCtx3) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = hex_prism_distance(*p, self.face2face, self.half_height);
        }
        Ok(())
    }
}

fn kx() -> String {
    lit(HEX_K.0)
}
fn ky() -> String {
    lit(HEX_K.1)
}
fn kz() -> String {
    lit(HEX_K.2)
}

/// Torus lying in the XZ plane, major radius `r_major`, tube radius
/// `r_minor`.
#[derive(Debug, Clone, Copy)]
pub struct Torus {
    pub major_radius: f32,
    pub minor_radius: f32,
}

impl Torus {
    #[must_use]
    pub fn new(major_radius: f32, minor_radius: f32) -> Self {
        Self {
            major_radius,
            minor_radius,
        }
    }
}

impl Shape3 for Torus {
    fn append_name(&self, out: &mut String) {
        out.push_str("torus_R");
        out.push_str(&name_f(self.major_radius));
        out.push_str("_r");
        out.push_str(&name_f(self.minor_radius));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}vec2 q = vec2(length(p.xz) - {rmaj}, p.y);\n\
             \u{20}\u{20}return length(q) - {rmin};\n\
             }}\n",
            name = name,
            rmaj = lit(self.major_radius),
            rmin = lit(self.minor_radius)
        ));
    }

    fn bounds(&self) -> Box3 {
        let r = self.major_radius + self.minor_radius;
        Box3::new(
            V3::new(-r, -self.minor_radius, -r),
            V3::new(r, self.minor_radius, r),
        )
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], _ctx: &mut EvalCtx3) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            let xz_len = sdf_math::V2::new(p.x, p.z).length();
            let q = sdf_math::V2::new(xz_len - self.major_radius, p.y);
            *d = q.length() - self.minor_radius;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sphere_distance_matches_formula() {
        let s = Sphere::new(1.0);
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(2.0, 0.0, 0.0)];
        let mut distances = vec![0.0];
        s.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn sphere_name_is_deterministic() {
        assert_eq!(Sphere::new(1.0).name(), Sphere::new(1.0).name());
    }

    #[test]
    fn box_distance_at_origin_is_negative_min_extent() {
        let b = Box3Shape::new(V3::new(1.0, 0.6, 0.8), 0.0);
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::ZERO];
        let mut distances = vec![0.0];
        b.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -0.6, epsilon = 1e-6);
    }

    #[test]
    fn torus_bounds_match_formula() {
        let t = Torus::new(1.0, 0.25);
        let bounds = t.bounds();
        assert_relative_eq!(bounds.max.x, 1.25, epsilon = 1e-6);
    }

    #[test]
    fn cylinder_zero_round_matches_sharp_cylinder() {
        let c = Cylinder::new(1.0, 2.0, 0.0);
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(0.0, 0.0, 0.0)];
        let mut distances = vec![0.0];
        c.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -1.0, epsilon = 1e-6);
    }
}
