//! 2D operators: unary transforms/modifiers and binary booleans over
//! [`crate::shape::Shape2Handle`] children. Mirrors `ops3`; every formula
//! and bounds rule is the 2D restriction of the corresponding 3D one, since
//! none of these operators treat a dimension specially.

use sdf_math::{fold_to_u32, glsl_sign2, hash64, mix, name_encode_float as name_f, Box2, Mat3, V2};

use crate::error::{Error, Result};
use crate::eval::EvalCtx2;
use crate::shape::{Shape2, Shape2Handle};

fn lit(f: f32) -> String {
    sdf_math::format_float(f)
}

fn call(out: &mut String, child: &Shape2Handle, arg: &str) {
    out.push_str(&child.name());
    out.push('(');
    out.push_str(arg);
    out.push(')');
}

// ---------------------------------------------------------------------
// Unary transforms
// ---------------------------------------------------------------------

/// Arbitrary 2D affine transform (the 2D analogue of [`crate::shape::ops3::Transform3`]).
#[derive(Debug, Clone)]
pub struct Transform2 {
    pub child: Shape2Handle,
    pub matrix: Mat3,
    pub inverse: Mat3,
}

impl Transform2 {
    #[must_use]
    pub fn new(child: Shape2Handle, matrix: Mat3, inverse: Mat3) -> Self {
        Self { child, matrix, inverse }
    }

    #[must_use]
    pub fn translate(child: Shape2Handle, offset: V2) -> Self {
        let matrix = Mat3::from_translation(offset);
        Self::new(child, matrix, Mat3::from_translation(-offset))
    }

    #[must_use]
    pub fn rotate(child: Shape2Handle, angle: f32) -> Self {
        let matrix = Mat3::from_angle(angle);
        Self::new(child, matrix, matrix.inverse())
    }
}

impl Shape2 for Transform2 {
    fn append_name(&self, out: &mut String) {
        let h = fold_to_u32(hash64(bytemuck::cast_slice(&self.matrix.to_cols_array())));
        out.push_str("transform2_");
        out.push_str(&h.to_string());
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        let m = self.inverse.to_cols_array();
        out.push_str(&format!(
            "float {name}(vec2 p) {{\n\
             \u{20}\u{20}mat3 inv = mat3({m0},{m1},{m2}, {m3},{m4},{m5}, {m6},{m7},{m8});\n\
             \u{20}\u{20}vec2 q = (inv * vec3(p, 1.0)).xy;\n\
             \u{20}\u{20}return ",
            name = name,
            m0 = lit(m[0]), m1 = lit(m[1]), m2 = lit(m[2]),
            m3 = lit(m[3]), m4 = lit(m[4]), m5 = lit(m[5]),
            m6 = lit(m[6]), m7 = lit(m[7]), m8 = lit(m[8]),
        ));
        call(out, &self.child, "q");
        out.push_str(";\n}\n");
    }

    fn bounds(&self) -> Box2 {
        self.child.bounds().mul_box(self.matrix)
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        let mut local = ctx.pool.acquire_v2(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = self.inverse.transform_point2(*p);
        }
        let result = self.child.evaluate(&local, distances, ctx);
        ctx.pool.release_v2(local);
        result
    }
}

/// Uniform scale by `factor`.
#[derive(Debug, Clone)]
pub struct Scale2 {
    pub child: Shape2Handle,
    pub factor: f32,
}

impl Scale2 {
    #[must_use]
    pub fn new(child: Shape2Handle, factor: f32) -> Self {
        Self { child, factor }
    }
}

impl Shape2 for Scale2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("scale2_");
        out.push_str(&name_f(self.factor));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec2 p) {{ return ", name = name));
        call(out, &self.child, &format!("p / {f}", f = lit(self.factor)));
        out.push_str(&format!(" * {f}; }}\n", f = lit(self.factor)));
    }

    fn bounds(&self) -> Box2 {
        self.child.bounds().scale(self.factor)
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        let mut local = ctx.pool.acquire_v2(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = *p / self.factor;
        }
        self.child.evaluate(&local, distances, ctx)?;
        for d in distances.iter_mut() {
            *d *= self.factor;
        }
        ctx.pool.release_v2(local);
        Ok(())
    }
}

/// Per-axis mirror.
#[derive(Debug, Clone)]
pub struct Symmetry2 {
    pub child: Shape2Handle,
    pub x: bool,
    pub y: bool,
}

impl Symmetry2 {
    #[must_use]
    pub fn new(child: Shape2Handle, x: bool, y: bool) -> Self {
        Self { child, x, y }
    }

    fn fold(&self, p: V2) -> V2 {
        V2::new(
            if self.x { p.x.abs() } else { p.x },
            if self.y { p.y.abs() } else { p.y },
        )
    }
}

impl Shape2 for Symmetry2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("symmetry2_");
        out.push(if self.x { '1' } else { '0' });
        out.push(if self.y { '1' } else { '0' });
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}vec2 p = vec2({x}, {y});\n\
             \u{20}\u{20}return ",
            name = name,
            x = if self.x { "abs(p0.x)" } else { "p0.x" },
            y = if self.y { "abs(p0.y)" } else { "p0.y" },
        ));
        call(out, &self.child, "p");
        out.push_str(";\n}\n");
    }

    fn bounds(&self) -> Box2 {
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
        Box2::new(V2::new(minx, miny), V2::new(maxx, maxy))
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        let mut local = ctx.pool.acquire_v2(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = self.fold(*p);
        }
        let result = self.child.evaluate(&local, distances, ctx);
        ctx.pool.release_v2(local);
        result
    }
}

/// Absolute interior carve-out: `|d(inner)| - thickness`.
#[derive(Debug, Clone)]
pub struct Shell2 {
    pub child: Shape2Handle,
    pub thickness: f32,
}

impl Shell2 {
    #[must_use]
    pub fn new(child: Shape2Handle, thickness: f32) -> Self {
        Self { child, thickness }
    }
}

impl Shape2 for Shell2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("shell2_");
        out.push_str(&name_f(self.thickness));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec2 p) {{ return abs(", name = name));
        call(out, &self.child, "p");
        out.push_str(&format!(") - {t}; }}\n", t = lit(self.thickness)));
    }

    fn bounds(&self) -> Box2 {
        self.child.bounds()
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
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
pub struct Offset2 {
    pub child: Shape2Handle,
    pub offset: f32,
}

impl Offset2 {
    #[must_use]
    pub fn new(child: Shape2Handle, offset: f32) -> Self {
        Self { child, offset }
    }
}

impl Shape2 for Offset2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("offset2_");
        out.push_str(&name_f(self.offset));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec2 p) {{ return ", name = name));
        call(out, &self.child, "p");
        out.push_str(&format!(" - ({o}); }}\n", o = lit(-self.offset)));
    }

    fn bounds(&self) -> Box2 {
        self.child.bounds().expand(self.offset.abs())
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        self.child.evaluate(positions, distances, ctx)?;
        for d in distances.iter_mut() {
            *d -= self.offset;
        }
        Ok(())
    }
}

/// Stretch along each axis by `h`, discarding the negative half.
#[derive(Debug, Clone)]
pub struct Elongate2 {
    pub child: Shape2Handle,
    pub h: V2,
}

impl Elongate2 {
    #[must_use]
    pub fn new(child: Shape2Handle, h: V2) -> Self {
        Self { child, h }
    }
}

impl Shape2 for Elongate2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("elongate2_");
        out.push_str(&name_f(self.h.x));
        out.push('_');
        out.push_str(&name_f(self.h.y));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p) {{\n\
             \u{20}\u{20}vec2 q = abs(p) - vec2({hx}, {hy});\n\
             \u{20}\u{20}return ",
            name = name,
            hx = lit(self.h.x),
            hy = lit(self.h.y)
        ));
        call(out, &self.child, "max(q, vec2(0.0))");
        out.push_str(" + min(max(q.x, q.y), 0.0);\n}\n");
    }

    fn bounds(&self) -> Box2 {
        let b = self.child.bounds();
        let half = V2::new(
            b.min.x.abs().max(b.max.x.abs()),
            b.min.y.abs().max(b.max.y.abs()),
        ) + self.h * 0.5;
        Box2::new(-half, half)
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        let mut local = ctx.pool.acquire_v2(positions.len());
        for (p, q) in positions.iter().zip(local.iter_mut()) {
            *q = (p.abs() - self.h).max(V2::ZERO);
        }
        self.child.evaluate(&local, distances, ctx)?;
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            let q = p.abs() - self.h;
            *d += q.x.max(q.y).min(0.0);
        }
        ctx.pool.release_v2(local);
        Ok(())
    }
}

/// Finite 2D grid repetition. Tile ids are clamped to `[0, n-1]`, so
/// instances only ever sit at non-negative offsets from the origin; bounds
/// extend the child's box by `(n-1)*spacing` on the positive side of each
/// axis only, same as the 3D array (see `DESIGN.md`).
#[derive(Debug, Clone)]
pub struct Array2 {
    pub child: Shape2Handle,
    pub spacing: V2,
    pub count: [u32; 2],
}

impl Array2 {
    #[must_use]
    pub fn new(child: Shape2Handle, spacing: V2, count: [u32; 2]) -> Self {
        Self { child, spacing, count }
    }

    fn count_f(&self) -> V2 {
        V2::new(self.count[0] as f32, self.count[1] as f32)
    }
}

impl Shape2 for Array2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("array2_");
        out.push_str(&name_f(self.spacing.x));
        out.push('_');
        out.push_str(&name_f(self.spacing.y));
        out.push_str("_n");
        out.push_str(&format!("{}_{}", self.count[0], self.count[1]));
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p) {{\n\
             \u{20}\u{20}vec2 s = vec2({sx}, {sy});\n\
             \u{20}\u{20}vec2 n = vec2({nx}, {ny});\n\
             \u{20}\u{20}vec2 id = round(p / s);\n\
             \u{20}\u{20}vec2 o = sign(p - s * id);\n\
             \u{20}\u{20}float d = 1e20;\n\
             \u{20}\u{20}for (int y = 0; y <= 1; y++)\n\
             \u{20}\u{20}for (int x = 0; x <= 1; x++) {{\n\
             \u{20}\u{20}\u{20}\u{20}vec2 rid = clamp(id + vec2(x, y) * o, vec2(0.0), n - vec2(1.0));\n\
             \u{20}\u{20}\u{20}\u{20}d = min(d, ",
            name = name,
            sx = lit(self.spacing.x), sy = lit(self.spacing.y),
            nx = lit(self.count[0] as f32), ny = lit(self.count[1] as f32),
        ));
        call(out, &self.child, "p - s * rid");
        out.push_str(");\n\u{20}\u{20}}\n\u{20}\u{20}return d;\n}\n");
    }

    fn bounds(&self) -> Box2 {
        let b = self.child.bounds();
        let extend = (self.count_f() - V2::ONE) * self.spacing;
        Box2::new(b.min, b.max + extend)
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        let n = self.count_f();
        let mut best = ctx.pool.acquire_f32(positions.len());
        let mut scratch_pos = ctx.pool.acquire_v2(positions.len());
        let mut scratch_dist = ctx.pool.acquire_f32(positions.len());
        for b in best.iter_mut() {
            *b = f32::MAX;
        }
        for corner in 0..4u32 {
            let cx = (corner & 1) as f32;
            let cy = ((corner >> 1) & 1) as f32;
            for (i, p) in positions.iter().enumerate() {
                let id = (*p / self.spacing).round();
                let o = glsl_sign2(*p - self.spacing * id);
                let rid = (id + V2::new(cx, cy) * o).clamp(V2::ZERO, n - V2::ONE);
                scratch_pos[i] = *p - self.spacing * rid;
            }
            self.child.evaluate(&scratch_pos, &mut scratch_dist, ctx)?;
            for (b, d) in best.iter_mut().zip(scratch_dist.iter()) {
                *b = b.min(*d);
            }
        }
        distances.copy_from_slice(&best);
        ctx.pool.release_f32(best);
        ctx.pool.release_v2(scratch_pos);
        ctx.pool.release_f32(scratch_dist);
        Ok(())
    }
}

/// Rotational copy of `count` instances around the origin.
#[derive(Debug, Clone)]
pub struct CircularArray2 {
    pub child: Shape2Handle,
    pub num_instances: u32,
}

impl CircularArray2 {
    #[must_use]
    pub fn new(child: Shape2Handle, num_instances: u32) -> Self {
        Self { child, num_instances }
    }

    fn sector_angle(&self) -> f32 {
        std::f32::consts::TAU / self.num_instances as f32
    }
}

fn rotate2(p: V2, angle: f32) -> V2 {
    let (s, c) = angle.sin_cos();
    V2::new(c * p.x + s * p.y, -s * p.x + c * p.y)
}

impl Shape2 for CircularArray2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("circarray2_n");
        out.push_str(&self.num_instances.to_string());
        out.push('_');
        out.push_str(&self.child.name());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        let delta = self.sector_angle();
        out.push_str(&format!(
            "float {name}(vec2 p) {{\n\
             \u{20}\u{20}float delta = {delta};\n\
             \u{20}\u{20}float n = {n};\n\
             \u{20}\u{20}float id = floor(atan(p.y, p.x) / delta);\n\
             \u{20}\u{20}float i0 = mod(id, n);\n\
             \u{20}\u{20}float i1 = mod(id + 1.0, n);\n\
             \u{20}\u{20}float a0 = i0 * delta, a1 = i1 * delta;\n\
             \u{20}\u{20}vec2 p0 = vec2(cos(a0)*p.x + sin(a0)*p.y, -sin(a0)*p.x + cos(a0)*p.y);\n\
             \u{20}\u{20}vec2 p1 = vec2(cos(a1)*p.x + sin(a1)*p.y, -sin(a1)*p.x + cos(a1)*p.y);\n\
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

    fn bounds(&self) -> Box2 {
        let b = self.child.bounds();
        let mut result = b;
        for i in 1..self.num_instances {
            let angle = self.sector_angle() * i as f32;
            for v in b.vertices() {
                result = result.include_point(rotate2(v, angle));
            }
        }
        result
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.child.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        let delta = self.sector_angle();
        let n = self.num_instances as f32;
        let mut p0 = ctx.pool.acquire_v2(positions.len());
        let mut p1 = ctx.pool.acquire_v2(positions.len());
        let mut d1 = ctx.pool.acquire_f32(positions.len());
        for (i, p) in positions.iter().enumerate() {
            let id = (p.y.atan2(p.x) / delta).floor();
            let i0 = id.rem_euclid(n);
            let i1 = (id + 1.0).rem_euclid(n);
            p0[i] = rotate2(*p, i0 * delta);
            p1[i] = rotate2(*p, i1 * delta);
        }
        self.child.evaluate(&p0, distances, ctx)?;
        self.child.evaluate(&p1, &mut d1, ctx)?;
        for (d, d2) in distances.iter_mut().zip(d1.iter()) {
            *d = d.min(*d2);
        }
        ctx.pool.release_v2(p0);
        ctx.pool.release_v2(p1);
        ctx.pool.release_f32(d1);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Binary booleans
// ---------------------------------------------------------------------

/// Union of `>= 2` children, flattening nested unions.
#[derive(Debug, Clone)]
pub struct Union2 {
    pub children: Vec<Shape2Handle>,
}

impl Union2 {
    #[must_use]
    pub fn new(children: Vec<Shape2Handle>) -> Result<Self> {
        if children.len() < 2 {
            return Err(Error::NilChild("union requires at least two children".into()));
        }
        let mut flat = Vec::with_capacity(children.len());
        for c in children {
            if let Some(u) = c.as_ref().as_any().downcast_ref::<Union2>() {
                flat.extend(u.children.iter().cloned());
            } else {
                flat.push(c);
            }
        }
        Ok(Self { children: flat })
    }
}

impl Shape2 for Union2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("union2");
        for c in &self.children {
            out.push('_');
            out.push_str(&c.name());
        }
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!("float {name}(vec2 p) {{ return ", name = name));
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

    fn bounds(&self) -> Box2 {
        let mut b = self.children[0].bounds();
        for c in &self.children[1..] {
            b = b.union(&c.bounds());
        }
        b
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        self.children.clone()
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
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

fn binary_bounds_first2(a: &Shape2Handle, _b: &Shape2Handle) -> Box2 {
    a.bounds()
}

macro_rules! binary_op2 {
    ($name:ident, $prefix:literal, $expr:expr, $bounds:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pub a: Shape2Handle,
            pub b: Shape2Handle,
        }

        impl $name {
            #[must_use]
            pub fn new(a: Shape2Handle, b: Shape2Handle) -> Self {
                Self { a, b }
            }
        }

        impl Shape2 for $name {
            fn append_name(&self, out: &mut String) {
                out.push_str($prefix);
                out.push('_');
                out.push_str(&self.a.name());
                out.push('_');
                out.push_str(&self.b.name());
            }

            fn append_body(&self, out: &mut String) {
                let name = self.name();
                out.push_str(&format!("float {name}(vec2 p) {{\n\u{20}\u{20}float a = ", name = name));
                call(out, &self.a, "p");
                out.push_str(";\n\u{20}\u{20}float b = ");
                call(out, &self.b, "p");
                out.push_str(&format!(";\n\u{20}\u{20}return {body};\n}}\n", body = $expr));
            }

            fn bounds(&self) -> Box2 {
                $bounds(&self.a, &self.b)
            }

            fn children2(&self) -> Vec<Shape2Handle> {
                vec![self.a.clone(), self.b.clone()]
            }

            fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
                self.a.evaluate(positions, distances, ctx)?;
                let mut scratch = ctx.pool.acquire_f32(positions.len());
                self.b.evaluate(positions, &mut scratch, ctx)?;
                for (d, s) in distances.iter_mut().zip(scratch.iter()) {
                    *d = binary_scalar_law2(stringify!($name), *d, *s);
                }
                ctx.pool.release_f32(scratch);
                Ok(())
            }
        }
    };
}

fn binary_scalar_law2(kind: &str, a: f32, b: f32) -> f32 {
    match kind {
        "Intersection2" => a.max(b),
        "Difference2" => a.max(-b),
        "Xor2" => a.min(b).max(-a.max(b)),
        _ => unreachable!("unhandled binary op kind: {kind}"),
    }
}

binary_op2!(Intersection2, "intersect2", "max(a, b)", |a: &Shape2Handle, b: &Shape2Handle| a.bounds().intersect(&b.bounds()));
binary_op2!(Difference2, "difference2", "max(a, -b)", |a: &Shape2Handle, b: &Shape2Handle| binary_bounds_first2(a, b));
binary_op2!(Xor2, "xor2", "max(min(a, b), -max(a, b))", |a: &Shape2Handle, b: &Shape2Handle| a.bounds().union(&b.bounds()));

macro_rules! smooth_op2 {
    ($name:ident, $prefix:literal, $body:literal, $bounds:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name {
            pub a: Shape2Handle,
            pub b: Shape2Handle,
            pub k: f32,
        }

        impl $name {
            #[must_use]
            pub fn new(a: Shape2Handle, b: Shape2Handle, k: f32) -> Self {
                Self { a, b, k }
            }
        }

        impl Shape2 for $name {
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
                    "float {name}(vec2 p) {{\n\u{20}\u{20}float a = ",
                    name = name
                ));
                call(out, &self.a, "p");
                out.push_str(";\n\u{20}\u{20}float b = ");
                call(out, &self.b, "p");
                out.push_str(&format!(";\n\u{20}\u{20}float k = {k};\n{body}\n}}\n", k = lit(self.k), body = $body));
            }

            fn bounds(&self) -> Box2 {
                $bounds(&self.a, &self.b)
            }

            fn children2(&self) -> Vec<Shape2Handle> {
                vec![self.a.clone(), self.b.clone()]
            }

            fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
                self.a.evaluate(positions, distances, ctx)?;
                let mut scratch = ctx.pool.acquire_f32(positions.len());
                self.b.evaluate(positions, &mut scratch, ctx)?;
                for (d, s) in distances.iter_mut().zip(scratch.iter()) {
                    *d = smooth_scalar_law2(stringify!($name), *d, *s, self.k);
                }
                ctx.pool.release_f32(scratch);
                Ok(())
            }
        }
    };
}

fn smooth_scalar_law2(kind: &str, a: f32, b: f32, k: f32) -> f32 {
    match kind {
        "SmoothUnion2" => {
            let h = (0.5 + 0.5 * (b - a) / k).clamp(0.0, 1.0);
            mix(b, a, h) - k * h * (1.0 - h)
        }
        "SmoothDifference2" => {
            let h = (0.5 - 0.5 * (b + a) / k).clamp(0.0, 1.0);
            mix(a, -b, h) + k * h * (1.0 - h)
        }
        "SmoothIntersect2" => {
            let h = (0.5 - 0.5 * (b - a) / k).clamp(0.0, 1.0);
            mix(b, a, h) + k * h * (1.0 - h)
        }
        _ => unreachable!("unhandled smooth op kind: {kind}"),
    }
}

smooth_op2!(
    SmoothUnion2,
    "smoothunion2",
    "\u{20}\u{20}float h = clamp(0.5 + 0.5*(b-a)/k, 0.0, 1.0);\n\u{20}\u{20}return mix(b, a, h) - k*h*(1.0-h);",
    |a: &Shape2Handle, b: &Shape2Handle| a.bounds().union(&b.bounds())
);
smooth_op2!(
    SmoothDifference2,
    "smoothdiff2",
    "\u{20}\u{20}float h = clamp(0.5 - 0.5*(b+a)/k, 0.0, 1.0);\n\u{20}\u{20}return mix(a, -b, h) + k*h*(1.0-h);",
    |a: &Shape2Handle, b: &Shape2Handle| binary_bounds_first2(a, b)
);
smooth_op2!(
    SmoothIntersect2,
    "smoothintersect2",
    "\u{20}\u{20}float h = clamp(0.5 - 0.5*(b-a)/k, 0.0, 1.0);\n\u{20}\u{20}return mix(b, a, h) + k*h*(1.0-h);",
    |a: &Shape2Handle, b: &Shape2Handle| a.bounds().intersect(&b.bounds())
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::primitives2::{Circle, Rectangle};
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn union_is_min_of_children() {
        let a: Shape2Handle = Arc::new(Circle::new(1.0));
        let b: Shape2Handle = Arc::new(Rectangle::new(2.0, 2.0));
        let u = Union2::new(vec![a, b]).unwrap();
        let mut ctx = EvalCtx2::new();
        let positions = vec![V2::new(0.0, 0.0)];
        let mut distances = vec![0.0];
        u.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn union_flattens_nested_unions() {
        let a: Shape2Handle = Arc::new(Circle::new(1.0));
        let b: Shape2Handle = Arc::new(Circle::new(1.0));
        let c: Shape2Handle = Arc::new(Circle::new(1.0));
        let d: Shape2Handle = Arc::new(Circle::new(1.0));
        let u1 = Arc::new(Union2::new(vec![a, b]).unwrap()) as Shape2Handle;
        let u2 = Arc::new(Union2::new(vec![c, d]).unwrap()) as Shape2Handle;
        let outer = Union2::new(vec![u1, u2]).unwrap();
        assert_eq!(outer.children.len(), 4);
    }

    #[test]
    fn translate_by_zero_is_identity() {
        let circle: Shape2Handle = Arc::new(Circle::new(1.0));
        let t = Transform2::translate(circle.clone(), V2::ZERO);
        let mut ctx = EvalCtx2::new();
        let positions = vec![V2::new(0.3, -0.2)];
        let mut direct = vec![0.0];
        let mut transformed = vec![0.0];
        circle.evaluate(&positions, &mut direct, &mut ctx).unwrap();
        t.evaluate(&positions, &mut transformed, &mut ctx).unwrap();
        assert_relative_eq!(direct[0], transformed[0], epsilon = 1e-6);
    }

    #[test]
    fn array_bounds_extend_by_n_minus_one_spacing() {
        let child: Shape2Handle = Arc::new(Circle::new(0.5));
        let arr = Array2::new(child, V2::new(2.0, 2.0), [3, 1]);
        let b = arr.bounds();
        // Tile ids are clamped to [0, n-1], so the highest instance sits at
        // (n-1)*spacing from the origin, not (n-1)*spacing/2 either side.
        assert_relative_eq!(b.max.x, 0.5 + 2.0 * 2.0, epsilon = 1e-6);
        assert_relative_eq!(b.min.x, -0.5, epsilon = 1e-6);
    }

    #[test]
    fn difference_bounds_is_first_child() {
        let a: Shape2Handle = Arc::new(Circle::new(2.0));
        let b: Shape2Handle = Arc::new(Circle::new(1.0));
        let d = Difference2::new(a.clone(), b);
        assert_eq!(d.bounds(), a.bounds());
    }
}
