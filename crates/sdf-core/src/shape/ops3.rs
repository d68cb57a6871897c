//! 3D operators: unary transforms/modifiers and binary booleans over
//! [`crate::shape::Shape3Handle`] children.

use sdf_math::{fold_to_u32, hash64, mix, name_encode_float as name_f, Box3, Mat4, V3};

use crate::error::{Error, Result};
use crate::eval::EvalCtx3;
use crate::shape::{Shape3, Shape3Handle};

fn lit(f: f32) -> String {
    sdf_math::format_float(f)
}

fn call(out: &mut String, child: &Shape3Handle, arg: &str) {
    out.push_str(&child.name());
    out.push('(');
    out.push_str(arg);
    out.push(')');
}

// ---------------------------------------------------------------------
// Unary transforms
// ---------------------------------------------------------------------

/// Arbitrary affine transform. `rotate` and `translate`-by-matrix both
/// reduce to this; the inverse is precomputed so the evaluator never
/// inverts a matrix on the hot path. Construction validates
/// `|det| >= 6e-7` (enforced by [`crate::builder::Builder`]).
#[derive(Debug, Clone)]
pub struct Transform3 {
    pub child: Shape3Handle,
    pub matrix: Mat4,
    pub inverse: Mat4,
}

impl Transform3 {
    #[must_use]
    pub fn new(child: Shape3Handle, matrix: Mat4, inverse: Mat4) -> Self {
        Self {
            child,
            matrix,
            inverse,
        }
    }

    #[must_use]
    pub fn translate(child: Shape3Handle, offset: V3) -> Self {
        let matrix = Mat4::from_translation(offset);
        Self::new(child, matrix, Mat4::from_translation(-offset))
    }

    #[must_use]
    pub fn rotate(child: Shape3Handle, axis: V3, angle: f32) -> Self {
        let matrix = Mat4::from_axis_angle(axis.normalize(), angle);
        Self::new(child, matrix, matrix.inverse())
    }
}

impl Shape3 for Transform3 {
    fn append_name(&self, out: &mut String) {
        let h = fold_to_u32(hash64(bytemuck::cast_slice(&self.matrix.to_cols_array())));
        out.push_str("transform_");
        out.push_str(&h.to_string());
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        let m = self.inverse.to_cols_array();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}mat4 inv = mat4({m0},{m1},{m2},{m3}, {m4},{m5},{m6},{m7}, {m8},{m9},{m10},{m11}, {m12},{m13},{m14},{m15});\n\
             \u{20}\u{20}vec3 q = (inv * vec4(p, 1.0)).xyz;\n\
             \u{20}\u{20}return ",
            name = name,
            m0 = lit(m[0]), m1 = lit(m[1]), m2 = lit(m[2]), m3 = lit(m[3]),
            m4 = lit(m[4]), m5 = lit(m[5]), m6 = lit(m[6]), m7 = lit(m[7]),
            m8 = lit(m[8]), m9 = lit(m[9]), m10 = lit(m[10]), m11 = lit(m[11]),
            m12 = lit(m[12]), m13 = lit(m[13]), m14 = lit(m[14]), m15 = lit(m[15]),
        ));
        call(out, &self.child, "q");
        out.push_str(";\n}\n");
    }

    fn bounds(&self) -> Box3 {
        self.child.bounds().mul_box(self.matrix)
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let mut local = ctx.pool.acquire_v3(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = self.inverse.transform_point3(*p);
        }
        let result = self.child.evaluate(&local, distances, ctx);
        ctx.pool.release_v3(local);
        result
    }
}

/// Uniform scale by `factor`.
#[derive(Debug, Clone)]
pub struct Scale3 {
    pub child: Shape3Handle,
    pub factor: f32,
}

impl Scale3 {
    #[must_use]
    pub fn new(child: Shape3Handle, factor: f32) -> Self {
        Self { child, factor }
    }
}

impl Shape3 for Scale3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("scale_");
        out.push_str(&name_f(self.factor));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec3 p) {{ return ", name = name));
        call(out, &self.child, &format!("p / {f}", f = lit(self.factor)));
        out.push_str(&format!(" * {f}; }}\n", f = lit(self.factor)));
    }

    fn bounds(&self) -> Box3 {
        self.child.bounds().scale(self.factor)
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let mut local = ctx.pool.acquire_v3(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = *p / self.factor;
        }
        self.child.evaluate(&local, distances, ctx)?;
        for d in distances.iter_mut() {
            *d *= self.factor;
        }
        ctx.pool.release_v3(local);
        Ok(())
    }
}

/// Per-axis mirror: folds any enabled axis onto its positive half.
#[derive(Debug, Clone)]
pub struct Symmetry3 {
    pub child: Shape3Handle,
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl Symmetry3 {
    #[must_use]
    pub fn new(child: Shape3Handle, x: bool, y: bool, z: bool) -> Self {
        Self { child, x, y, z }
    }

    fn fold(&self, p: V3) -> V3 {
        V3::new(
            if self.x { p.x.abs() } else { p.x },
            if self.y { p.y.abs() } else { p.y },
            if self.z { p.z.abs() } else { p.z },
        )
    }
}

impl Shape3 for Symmetry3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("symmetry_");
        out.push(if self.x { '1' } else { '0' });
        out.push(if self.y { '1' } else { '0' });
        out.push(if self.z { '1' } else { '0' });
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p0) {{\n\
             \u{20}\u{20}vec3 p = vec3({x}, {y}, {z});\n\
             \u{20}\u{20}return ",
            name = name,
            x = if self.x { "abs(p0.x)" } else { "p0.x" },
            y = if self.y { "abs(p0.y)" } else { "p0.y" },
            z = if self.z { "abs(p0.z)" } else { "p0.z" },
        ));
        call(out, &self.child, "p");
        out.push_str(";\n}\n");
    }

    fn bounds(&self) -> Box3 {
        let b = self.child.bounds();
        let fold_axis = |lo: f32, hi: f32, active: bool| -> (f32, f32) {
            if active {
                let m = lo.abs().max(hi.abs());
                (-m, m)
            } else {
                (lo, hi)
            }
        };
        let (minx, maxx) = fold_axis(b.min.x, b.max.x, self.x);
        let (miny, maxy) = fold_axis(b.min.y, b.max.y, self.y);
        let (minz, maxz) = fold_axis(b.min.z, b.max.z, self.z);
        Box3::new(V3::new(minx, miny, minz), V3::new(maxx, maxy, maxz))
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let mut local = ctx.pool.acquire_v3(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = self.fold(*p);
        }
        let result = self.child.evaluate(&local, distances, ctx);
        ctx.pool.release_v3(local);
        result
    }
}

/// Absolute interior carve-out: `|d(inner)| - thickness`.
#[derive(Debug, Clone)]
pub struct Shell3 {
    pub child: Shape3Handle,
    pub thickness: f32,
}

impl Shell3 {
    #[must_use]
    pub fn new(child: Shape3Handle, thickness: f32) -> Self {
        Self { child, thickness }
    }
}

impl Shape3 for Shell3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("shell_");
        out.push_str(&name_f(self.thickness));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec3 p) {{ return abs(", name = name));
        call(out, &self.child, "p");
        out.push_str(&format!(") - {t}; }}\n", t = lit(self.thickness)));
    }

    fn bounds(&self) -> Box3 {
        self.child.bounds()
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        self.child.evaluate(positions, distances, ctx)?;
        for d in distances.iter_mut() {
            *d = d.abs() - self.thickness;
        }
        Ok(())
    }
}

/// Add a scalar offset to the distance field: positive expands, negative
/// rounds inward.
#[derive(Debug, Clone)]
pub struct Offset3 {
    pub child: Shape3Handle,
    pub offset: f32,
}

impl Offset3 {
    #[must_use]
    pub fn new(child: Shape3Handle, offset: f32) -> Self {
        Self { child, offset }
    }
}

impl Shape3 for Offset3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("offset_");
        out.push_str(&name_f(self.offset));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec3 p) {{ return ", name = name));
        call(out, &self.child, "p");
        out.push_str(&format!(" - ({o}); }}\n", o = lit(-self.offset)));
    }

    fn bounds(&self) -> Box3 {
        self.child.bounds().expand(self.offset.abs())
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        self.child.evaluate(positions, distances, ctx)?;
        for d in distances.iter_mut() {
            *d -= self.offset;
        }
        Ok(())
    }
}

/// Stretch along each axis by `h`, discarding the negative half of the
/// stretch (the standard IQ elongate trick).
#[derive(Debug, Clone)]
pub struct Elongate3 {
    pub child: Shape3Handle,
    pub h: V3,
}

impl Elongate3 {
    #[must_use]
    pub fn new(child: Shape3Handle, h: V3) -> Self {
        Self { child, h }
    }
}

impl Shape3 for Elongate3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("elongate_");
        out.push_str(&name_f(self.h.x));
        out.push('_');
        out.push_str(&name_f(self.h.y));
        out.push('_');
        out.push_str(&name_f(self.h.z));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}vec3 q = abs(p) - vec3({hx}, {hy}, {hz});\n\
             \u{20}\u{20}return ",
            name = name,
            hx = lit(self.h.x),
            hy = lit(self.h.y),
            hz = lit(self.h.z)
        ));
        call(out, &self.child, "max(q, vec3(0.0))");
        out.push_str(" + min(max(q.x, max(q.y, q.z)), 0.0);\n}\n");
    }

    fn bounds(&self) -> Box3 {
        let b = self.child.bounds();
        let half = V3::new(
            b.min.x.abs().max(b.max.x.abs()),
            b.min.y.abs().max(b.max.y.abs()),
            b.min.z.abs().max(b.max.z.abs()),
        ) + self.h * 0.5;
        Box3::new(-half, half)
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let mut local = ctx.pool.acquire_v3(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = (p.abs() - self.h).max(V3::ZERO);
        }
        self.child.evaluate(&local, distances, ctx)?;
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            let q = p.abs() - self.h;
            *d += q.x.max(q.y.max(q.z)).min(0.0);
        }
        ctx.pool.release_v3(local);
        Ok(())
    }
}

/// Finite 3D grid repetition: `count` copies spaced by `spacing` per axis.
#[derive(Debug, Clone)]
pub struct Array3 {
    pub child: Shape3Handle,
    pub spacing: V3,
    pub count: [u32; 3],
}

impl Array3 {
    #[must_use]
    pub fn new(child: Shape3Handle, spacing: V3, count: [u32; 3]) -> Self {
        Self {
            child,
            spacing,
            count,
        }
    }

    fn count_f(&self) -> V3 {
        V3::new(self.count[0] as f32, self.count[1] as f32, self.count[2] as f32)
    }
}

impl Shape3 for Array3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("array_");
        out.push_str(&name_f(self.spacing.x));
        out.push('_');
        out.push_str(&name_f(self.spacing.y));
        out.push('_');
        out.push_str(&name_f(self.spacing.z));
        out.push_str("_n");
        out.push_str(&format!("{}_{}_{}", self.count[0], self.count[1], self.count[2]));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}vec3 s = vec3({sx}, {sy}, {sz});\n\
             \u{20}\u{20}vec3 n = vec3({nx}, {ny}, {nz});\n\
             \u{20}\u{20}vec3 id = round(p / s);\n\
             \u{20}\u{20}vec3 o = sign(p - s * id);\n\
             \u{20}\u{20}float d = 1e20;\n\
             \u{20}\u{20}for (int z = 0; z <= 1; z++)\n\
             \u{20}\u{20}for (int y = 0; y <= 1; y++)\n\
             \u{20}\u{20}for (int x = 0; x <= 1; x++) {{\n\
             \u{20}\u{20}\u{20}\u{20}vec3 rid = clamp(id + vec3(x, y, z) * o, vec3(0.0), n - vec3(1.0));\n\
             \u{20}\u{20}\u{20}\u{20}d = min(d, ",
            name = name,
            sx = lit(self.spacing.x), sy = lit(self.spacing.y), sz = lit(self.spacing.z),
            nx = lit(self.count[0] as f32), ny = lit(self.count[1] as f32), nz = lit(self.count[2] as f32),
        ));
        call(out, &self.child, "p - s * rid");
        out.push_str(");\n\u{20}\u{20}}\n\u{20}\u{20}return d;\n}\n");
    }

    fn bounds(&self) -> Box3 {
        let b = self.child.bounds();
        // Tile ids are clamped to [0, n-1] (see `evaluate`), so instances
        // only ever sit at non-negative offsets from the origin.
        let extend = (self.count_f() - V3::ONE) * self.spacing;
        Box3::new(b.min, b.max + extend)
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let n = self.count_f();
        let mut best = ctx.pool.acquire_f32(positions.len());
        let mut scratch_pos = ctx.pool.acquire_v3(positions.len());
        let mut scratch_dist = ctx.pool.acquire_f32(positions.len());
        for b in best.iter_mut() {
            *b = f32::MAX;
        }
        for corner in 0..8u32 {
            let cx = (corner & 1) as f32;
            let cy = ((corner >> 1) & 1) as f32;
            let cz = ((corner >> 2) & 1) as f32;
            for (i, p) in positions.iter().enumerate() {
                let id = (*p / self.spacing).round();
                let o = sdf_math::glsl_sign3(*p - self.spacing * id);
                let rid = (id + V3::new(cx, cy, cz) * o).clamp(V3::ZERO, n - V3::ONE);
                scratch_pos[i] = *p - self.spacing * rid;
            }
            self.child.evaluate(&scratch_pos, &mut scratch_dist, ctx)?;
            for (b, d) in best.iter_mut().zip(scratch_dist.iter()) {
                *b = b.min(*d);
            }
        }
        distances.copy_from_slice(&best);
        ctx.pool.release_f32(best);
        ctx.pool.release_v3(scratch_pos);
        ctx.pool.release_f32(scratch_dist);
        Ok(())
    }
}

/// Rotational copy of `count` instances around the Z axis.
#[derive(Debug, Clone)]
pub struct CircularArray3 {
    pub child: Shape3Handle,
    pub num_instances: u32,
}

impl CircularArray3 {
    #[must_use]
    pub fn new(child: Shape3Handle, num_instances: u32) -> Self {
        Self {
            child,
            num_instances,
        }
    }

    fn sector_angle(&self) -> f32 {
        std::f32::consts::TAU / self.num_instances as f32
    }
}

fn rotate_z(p: V3, angle: f32) -> V3 {
    let (s, c) = angle.sin_cos();
    V3::new(c * p.x + s * p.y, -s * p.x + c * p.y, p.z)
}

impl Shape3 for CircularArray3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("circarray_n");
        out.push_str(&self.num_instances.to_string());
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        let delta = self.sector_angle();
        out.push_str(&format!(
            "float {name}(vec3 p) {{\n\
             \u{20}\u{20}float delta = {delta};\n\
             \u{20}\u{20}float n = {n};\n\
             \u{20}\u{20}float id = floor(atan(p.y, p.x) / delta);\n\
             \u{20}\u{20}float i0 = mod(id, n);\n\
             \u{20}\u{20}float i1 = mod(id + 1.0, n);\n\
             \u{20}\u{20}float a0 = i0 * delta, a1 = i1 * delta;\n\
             \u{20}\u{20}vec3 p0 = vec3(cos(a0)*p.x + sin(a0)*p.y, -sin(a0)*p.x + cos(a0)*p.y, p.z);\n\
             \u{20}\u{20}vec3 p1 = vec3(cos(a1)*p.x + sin(a1)*p.y, -sin(a1)*p.x + cos(a1)*p.y, p.z);\n\
             \u{20}\u{20}return min(",
            name = name,
            delta = lit(delta),
            n = lit(self.num_instances as f32),
        ));
        call(out, &self.child, "p0");
        out.push_str(", ");
        call(out, &self.child, "p1");
        out.push_str(");\n}\n");
    }

    fn bounds(&self) -> Box3 {
        let b = self.child.bounds();
        let mut result = b;
        for i in 1..self.num_instances {
            let angle = self.sector_angle() * i as f32;
            for v in b.vertices() {
                result = result.include_point(rotate_z(v, angle));
            }
        }
        result
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        let delta = self.sector_angle();
        let n = self.num_instances as f32;
        let mut p0 = ctx.pool.acquire_v3(positions.len());
        let mut p1 = ctx.pool.acquire_v3(positions.len());
        let mut d1 = ctx.pool.acquire_f32(positions.len());
        for (i, p) in positions.iter().enumerate() {
            let id = (p.y.atan2(p.x) / delta).floor();
            let i0 = id.rem_euclid(n);
            let i1 = (id + 1.0).rem_euclid(n);
            p0[i] = rotate_z(*p, i0 * delta);
            p1[i] = rotate_z(*p, i1 * delta);
        }
        self.child.evaluate(&p0, distances, ctx)?;
        self.child.evaluate(&p1, &mut d1, ctx)?;
        for (d, d2) in distances.iter_mut().zip(d1.iter()) {
            *d = d.min(*d2);
        }
        ctx.pool.release_v3(p0);
        ctx.pool.release_v3(p1);
        ctx.pool.release_f32(d1);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Binary booleans
// ---------------------------------------------------------------------

/// Union of `>= 2` children. Constructing a union over arguments that are
/// themselves unions flattens them (performed by the builder, not here).
#[derive(Debug, Clone)]
pub struct Union3 {
    pub children: Vec<Shape3Handle>,
}

impl Union3 {
    /// Flattens any immediate union children into `children`.
    #[must_use]
    pub fn new(children: Vec<Shape3Handle>) -> Result<Self> {
        if children.len() < 2 {
            return Err(Error::NilChild("union requires at least two children".into()));
        }
        let mut flat = Vec::with_capacity(children.len());
        for c in children {
            if let Some(u) = c.as_ref().as_any().downcast_ref::<Union3>() {
                flat.extend(u.children.iter().cloned());
            } else {
                flat.push(c);
            }
        }
        Ok(Self { children: flat })
    }
}

impl Shape3 for Union3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("union");
        for c in &self.children {
            out.push('_');
            out.push_str(&c.name());
        }
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec3 p) {{ return ", name = name));
        for (i, c) in self.children.iter().enumerate() {
            if i > 0 {
                out.push_str("min(");
            }
            call(out, c, "p");
            if i > 0 {
                out.push(')');
            }
        }
        out.push_str("; }\n");
    }

    fn bounds(&self) -> Box3 {
        let mut b = self.children[0].bounds();
        for c in &self.children[1..] {
            b = b.union(&c.bounds());
        }
        b
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        self.children.clone()
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        self.children[0].evaluate(positions, distances, ctx)?;
        let mut scratch = ctx.pool.acquire_f32(positions.len());
        for c in &self.children[1..] {
            c.evaluate(positions, &mut scratch, ctx)?;
            for (d, s) in distances.iter_mut().zip(scratch.iter()) {
                *d = d.min(*s);
            }
        }
        ctx.pool.release_f32(scratch);
        Ok(())
    }
}

fn binary_bounds_first(a: &Shape3Handle, _b: &Shape3Handle) -> Box3 {
    a.bounds()
}

macro_rules! binary_op3 {
    ($name:ident, $prefix:literal, $expr:expr, $bounds:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pub a: Shape3Handle,
            pub b: Shape3Handle,
        }

        impl $name {
            #[must_use]
            pub fn new(a: Shape3Handle, b: Shape3Handle) -> Self {
                Self { a, b }
            }
        }

        impl Shape3 for $name {
            fn append_name(&self, out: &mut String) {
                out.push_str($prefix);
                out.push('_');
                out.push_str(&self.a.name());
                out.push('_');
                out.push_str(&self.b.name());
            }

            fn append_body(&self, out: &mut String) {
                let name = self.name();
                out.push_str(&format!("float {name}(vec3 p) {{\n\u{20}\u{20}float a = ", name = name));
                call(out, &self.a, "p");
                out.push_str(";\n\u{20}\u{20}float b = ");
                call(out, &self.b, "p");
                out.push_str(&format!(";\n\u{20}\u{20}return {body};\n}}\n", body = $expr));
            }

            fn bounds(&self) -> Box3 {
                $bounds(&self.a, &self.b)
            }

            fn children3(&self) -> Vec<Shape3Handle> {
                vec![self.a.clone(), self.b.clone()]
            }

            fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
                self.a.evaluate(positions, distances, ctx)?;
                let mut scratch = ctx.pool.acquire_f32(positions.len());
                self.b.evaluate(positions, &mut scratch, ctx)?;
                for (d, s) in distances.iter_mut().zip(scratch.iter()) {
                    *d = binary_scalar_law(stringify!($name), *d, *s);
                }
                ctx.pool.release_f32(scratch);
                Ok(())
            }
        }
    };
}

fn binary_scalar_law(kind: &str, a: f32, b: f32) -> f32 {
    match kind {
        "Intersection3" => a.max(b),
        "Difference3" => a.max(-b),
        "Xor3" => a.min(b).max(-a.max(b)),
        _ => unreachable!("unhandled binary op kind: {kind}"),
    }
}

binary_op3!(Intersection3, "intersect", "max(a, b)", |a: &Shape3Handle, b: &Shape3Handle| a.bounds().intersect(&b.bounds()));
binary_op3!(Difference3, "difference", "max(a, -b)", |a: &Shape3Handle, b: &Shape3Handle| binary_bounds_first(a, b));
binary_op3!(Xor3, "xor", "max(min(a, b), -max(a, b))", |a: &Shape3Handle, b: &Shape3Handle| a.bounds().union(&b.bounds()));

macro_rules! smooth_op3 {
    ($name:ident, $prefix:literal, $body:literal, $bounds:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pub a: Shape3Handle,
            pub b: Shape3Handle,
            pub k: f32,
        }

        impl $name {
            #[must_use]
            pub fn new(a: Shape3Handle, b: Shape3Handle, k: f32) -> Self {
                Self { a, b, k }
            }
        }

        impl Shape3 for $name {
            fn append_name(&self, out: &mut String) {
                out.push_str($prefix);
                out.push('_');
                out.push_str(&name_f(self.k));
                out.push('_');
                out.push_str(&self.a.name());
                out.push('_');
                out.push_str(&self.b.name());
            }

            fn append_body(&self, out: &mut String) {
                let name = self.name();
                out.push_str(&format!(
                    "float {name}(vec3 p) {{\n\u{20}\u{20}float a = ",
                    name = name
                ));
                call(out, &self.a, "p");
                out.push_str(";\n\u{20}\u{20}float b = ");
                call(out, &self.b, "p");
                out.push_str(&format!(";\n\u{20}\u{20}float k = {k};\n{body}\n}}\n", k = lit(self.k), body = $body));
            }

            fn bounds(&self) -> Box3 {
                $bounds(&self.a, &self.b)
            }

            fn children3(&self) -> Vec<Shape3Handle> {
                vec![self.a.clone(), self.b.clone()]
            }

            fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
                self.a.evaluate(positions, distances, ctx)?;
                let mut scratch = ctx.pool.acquire_f32(positions.len());
                self.b.evaluate(positions, &mut scratch, ctx)?;
                for (d, s) in distances.iter_mut().zip(scratch.iter()) {
                    *d = smooth_scalar_law(stringify!($name), *d, *s, self.k);
                }
                ctx.pool.release_f32(scratch);
                Ok(())
            }
        }
    };
}

fn smooth_scalar_law(kind: &str, a: f32, b: f32, k: f32) -> f32 {
    match kind {
        "SmoothUnion3" => {
            let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
            mix(b, a, h) - k * h * (1.0 - h)
        }
        "SmoothDifference3" => {
            let h = (0.5 - 0.5 * (b + a) / k).clamp(0.0, 1.0);
            mix(a, -b, h) + k * h * (1.0 - h)
        }
        "SmoothIntersect3" => {
            let h = (0.5 - 0.5 * (b - a) / k).clamp(0.0, 1.0);
            mix(b, a, h) + k * h * (1.0 - h)
        }
        _ => unreachable!("unhandled smooth op kind: {kind}"),
    }
}

smooth_op3!(
    SmoothUnion3,
    "smoothunion",
    "\u{20}\u{20}float h = clamp(0.5 + 0.5*(b-a)/k, 0.0, 1.0);\n\u{20}\u{20}return mix(b, a, h) - k*h*(1.0-h);",
    |a: &Shape3Handle, b: &Shape3Handle| a.bounds().union(&b.bounds())
);
smooth_op3!(
    SmoothDifference3,
    "smoothdiff",
    "\u{20}\u{20}float h = clamp(0.5 - 0.5*(b+a)/k, 0.0, 1.0);\n\u{20}\u{20}return mix(a, -b, h) + k*h*(1.0-h);",
    |a: &Shape3Handle, b: &Shape3Handle| binary_bounds_first(a, b)
);
smooth_op3!(
    SmoothIntersect3,
    "smoothintersect",
    "\u{20}\u{20}float h = clamp(0.5 - 0.5*(b-a)/k, 0.0, 1.0);\n\u{20}\u{20}return mix(b, a, h) + k*h*(1.0-h);",
    |a: &Shape3Handle, b: &Shape3Handle| a.bounds().intersect(&b.bounds())
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::primitives3::{Box3Shape, Sphere};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn union_is_min_of_children() {
        let a: Shape3Handle = Arc::new(Sphere::new(1.0));
        let b: Shape3Handle = Arc::new(Box3Shape::new(V3::splat(1.0), 0.0));
        let u = Union3::new(vec![a, b]).unwrap();
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(0.0, 0.0, 0.0)];
        let mut distances = vec![0.0];
        u.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn union_flattens_nested_unions() {
        let a: Shape3Handle = Arc::new(Sphere::new(1.0));
        let b: Shape3Handle = Arc::new(Sphere::new(1.0));
        let c: Shape3Handle = Arc::new(Sphere::new(1.0));
        let d: Shape3Handle = Arc::new(Sphere::new(1.0));
        let u1 = Arc::new(Union3::new(vec![a, b]).unwrap()) as Shape3Handle;
        let u2 = Arc::new(Union3::new(vec![c, d]).unwrap()) as Shape3Handle;
        let outer = Union3::new(vec![u1, u2]).unwrap();
        assert_eq!(outer.children.len(), 4);
    }

    #[test]
    fn translate_by_zero_is_identity() {
        let sphere: Shape3Handle = Arc::new(Sphere::new(1.0));
        let t = Transform3::translate(sphere.clone(), V3::ZERO);
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(0.3, 0.1, -0.2)];
        let mut direct = vec![0.0];
        let mut transformed = vec![0.0];
        sphere.evaluate(&positions, &mut direct, &mut ctx).unwrap();
        t.evaluate(&positions, &mut transformed, &mut ctx).unwrap();
        assert_relative_eq!(direct[0], transformed[0], epsilon = 1e-6);
    }

    #[test]
    fn smooth_union_degenerates_to_min_for_small_k() {
        let a: Shape3Handle = Arc::new(Sphere::new(1.0));
        let b: Shape3Handle = Arc::new(Transform3::translate(Arc::new(Sphere::new(1.0)), V3::new(1.5, 0.0, 0.0)));
        let su = SmoothUnion3::new(a.clone(), b.clone(), 1e-4);
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(0.75, 0.0, 0.0)];
        let mut da = vec![0.0];
        let mut db = vec![0.0];
        let mut ds = vec![0.0];
        a.evaluate(&positions, &mut da, &mut ctx).unwrap();
        b.evaluate(&positions, &mut db, &mut ctx).unwrap();
        su.evaluate(&positions, &mut ds, &mut ctx).unwrap();
        assert_relative_eq!(ds[0], da[0].min(db[0]), epsilon = 1e-2);
    }

    #[test]
    fn difference_bounds_is_first_child() {
        let a: Shape3Handle = Arc::new(Sphere::new(2.0));
        let b: Shape3Handle = Arc::new(Sphere::new(1.0));
        let d = Difference3::new(a.clone(), b);
        assert_eq!(d.bounds(), a.bounds());
    }
}
