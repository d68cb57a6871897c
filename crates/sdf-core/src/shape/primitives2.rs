//! 2D primitives: circle, rectangle, hexagon, octagon, equilateral triangle,
//! ellipse, arc, line, lines, polygon, diamond, rounded-X, quadratic Bezier.
//!
//! Formulas follow Inigo Quilez's 2D analytic distance function library.
//! `polygon` and `lines` hold variable-length vertex data; past the
//! builder's packing threshold that data moves into a shader buffer instead
//! of being inlined as literals (see `append_shader_objects`).

use sdf_math::{format_float, glsl_sign, name_encode_float, Box2, V2};

use crate::error::Result;
use crate::eval::EvalCtx2;
use crate::shader_object::{BufferObject, ShaderObject};
use crate::shape::Shape2;

fn lit(f: f32) -> String {
    format_float(f)
}

fn name_f(f: f32) -> String {
    name_encode_float(f)
}

fn dot2(v: V2) -> f32 {
    v.dot(v)
}

/// Circle of radius `r`.
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    pub radius: f32,
}

impl Circle {
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

impl Shape2 for Circle {
    fn append_name(&self, out: &mut String) {
        out.push_str("circle_r");
        out.push_str(&name_f(self.radius));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p) {{ return length(p) - {r}; }}\n",
            r = lit(self.radius)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::cube(self.radius)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = p.length() - self.radius;
        }
        Ok(())
    }
}

/// Axis-aligned rectangle with half-extents `(w/2, h/2)`.
#[derive(Debug, Clone, Copy)]
pub struct Rectangle {
    pub half_extents: V2,
}

impl Rectangle {
    #[must_use]
    pub fn new(w: f32, h: f32) -> Self {
        Self {
            half_extents: V2::new(w * 0.5, h * 0.5),
        }
    }
}

impl Shape2 for Rectangle {
    fn append_name(&self, out: &mut String) {
        out.push_str("rect_");
        out.push_str(&name_f(self.half_extents.x));
        out.push('_');
        out.push_str(&name_f(self.half_extents.y));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p) {{\n\
             \u{20}\u{20}vec2 d = abs(p) - vec2({ex}, {ey});\n\
             \u{20}\u{20}return length(max(d, vec2(0.0))) + min(max(d.x, d.y), 0.0);\n\
             }}\n",
            name = name,
            ex = lit(self.half_extents.x),
            ey = lit(self.half_extents.y)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::new(-self.half_extents, self.half_extents)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, dist) in positions.iter().zip(distances.iter_mut()) {
            let d = p.abs() - self.half_extents;
            *dist = d.max(V2::ZERO).length() + d.x.max(d.y).min(0.0);
        }
        Ok(())
    }
}

const HEX2_K: (f32, f32, f32) = (-0.866_025_404, 0.5, 0.577_350_269);

/// Regular hexagon with across-flats size `side`.
#[derive(Debug, Clone, Copy)]
pub struct Hexagon {
    pub side: f32,
}

impl Hexagon {
    #[must_use]
    pub fn new(side: f32) -> Self {
        Self { side }
    }
}

fn hexagon_distance(p: V2, r: f32) -> f32 {
    let (kx, ky, kz) = HEX2_K;
    let mut p = p.abs();
    p -= 2.0 * kx.min(p.dot(V2::new(kx, ky))) * V2::new(kx, ky);
    p -= V2::new(p.x.clamp(-kz * r, kz * r), r);
    p.length() * glsl_sign(p.y)
}

impl Shape2 for Hexagon {
    fn append_name(&self, out: &mut String) {
        out.push_str("hexagon_s");
        out.push_str(&name_f(self.side));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}const vec3 k = vec3({kx}, {ky}, {kz});\n\
             \u{20}\u{20}vec2 p = abs(p0);\n\
             \u{20}\u{20}p -= 2.0 * min(dot(k.xy, p), 0.0) * k.xy;\n\
             \u{20}\u{20}p -= vec2(clamp(p.x, -k.z*{side}, k.z*{side}), {side});\n\
             \u{20}\u{20}return length(p) * sign(p.y);\n\
             }}\n",
            name = name,
            kx = lit(HEX2_K.0),
            ky = lit(HEX2_K.1),
            kz = lit(HEX2_K.2),
            side = lit(self.side)
        ));
    }

    fn bounds(&self) -> Box2 {
        // `side` is the apothem (across-flats half-size); the vertices sit
        // at the circumradius, `side * 2/sqrt(3)`, along the other axis.
        Box2::cube(self.side * 2.0 / 3.0_f32.sqrt())
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = hexagon_distance(*p, self.side);
        }
        Ok(())
    }
}

const OCT2_K: (f32, f32, f32) = (-0.923_879_532_5, 0.382_683_432_3, 0.414_213_562_3);

/// Regular octagon with circumradius `c`.
#[derive(Debug, Clone, Copy)]
pub struct Octagon {
    pub circumradius: f32,
}

impl Octagon {
    #[must_use]
    pub fn new(circumradius: f32) -> Self {
        Self { circumradius }
    }
}

fn octagon_distance(p: V2, r: f32) -> f32 {
    let (kx, ky, kz) = OCT2_K;
    let mut p = p.abs();
    p -= 2.0 * kx.min(p.dot(V2::new(kx, ky))) * V2::new(kx, ky);
    p -= 2.0 * (-kx).min(p.dot(V2::new(-kx, ky))) * V2::new(-kx, ky);
    p -= V2::new(p.x.clamp(-kz * r, kz * r), r);
    p.length() * glsl_sign(p.y)
}

impl Shape2 for Octagon {
    fn append_name(&self, out: &mut String) {
        out.push_str("octagon_c");
        out.push_str(&name_f(self.circumradius));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}const vec3 k = vec3({kx}, {ky}, {kz});\n\
             \u{20}\u{20}vec2 p = abs(p0);\n\
             \u{20}\u{20}p -= 2.0 * min(dot(vec2(k.x, k.y), p), 0.0) * vec2(k.x, k.y);\n\
             \u{20}\u{20}p -= 2.0 * min(dot(vec2(-k.x, k.y), p), 0.0) * vec2(-k.x, k.y);\n\
             \u{20}\u{20}p -= vec2(clamp(p.x, -k.z*{c}, k.z*{c}), {c});\n\
             \u{20}\u{20}return length(p) * sign(p.y);\n\
             }}\n",
            name = name,
            kx = lit(OCT2_K.0),
            ky = lit(OCT2_K.1),
            kz = lit(OCT2_K.2),
            c = lit(self.circumradius)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::cube(self.circumradius)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = octagon_distance(*p, self.circumradius);
        }
        Ok(())
    }
}

/// Equilateral triangle, base on the x-axis, apex up, size `r`.
#[derive(Debug, Clone, Copy)]
pub struct EquilateralTriangle {
    pub size: f32,
}

impl EquilateralTriangle {
    #[must_use]
    pub fn new(size: f32) -> Self {
        Self { size }
    }
}

const SQRT3: f32 = 1.732_050_808;

fn equilateral_triangle_distance(p: V2, r: f32) -> f32 {
    let mut p = p;
    p.x = p.x.abs() - r;
    p.y = p.y + r / SQRT3;
    if p.x + SQRT3 * p.y > 0.0 {
        p = V2::new(p.x - SQRT3 * p.y, -SQRT3 * p.x - p.y) * 0.5;
    }
    p.x -= p.x.clamp(-2.0 * r, 0.0);
    -p.length() * glsl_sign(p.y)
}

impl Shape2 for EquilateralTriangle {
    fn append_name(&self, out: &mut String) {
        out.push_str("eqtri_s");
        out.push_str(&name_f(self.size));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}const float k = {sqrt3};\n\
             \u{20}\u{20}vec2 p = p0;\n\
             \u{20}\u{20}p.x = abs(p.x) - {r};\n\
             \u{20}\u{20}p.y = p.y + {r}/k;\n\
             \u{20}\u{20}if (p.x + k*p.y > 0.0) p = vec2(p.x - k*p.y, -k*p.x - p.y) / 2.0;\n\
             \u{20}\u{20}p.x -= clamp(p.x, -2.0*{r}, 0.0);\n\
             \u{20}\u{20}return -length(p)*sign(p.y);\n\
             }}\n",
            name = name,
            sqrt3 = lit(SQRT3),
            r = lit(self.size)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::new(
            V2::new(-self.size, -self.size / SQRT3),
            V2::new(self.size, 2.0 * self.size / SQRT3),
        )
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = equilateral_triangle_distance(*p, self.size);
        }
        Ok(())
    }
}

/// Axis-aligned ellipse with semi-axes `(a, b)`.
#[derive(Debug, Clone, Copy)]
pub struct Ellipse {
    pub radii: V2,
}

impl Ellipse {
    #[must_use]
    pub fn new(a: f32, b: f32) -> Self {
        Self { radii: V2::new(a, b) }
    }
}

/// Exact ellipse distance (IQ's cubic/quartic solve). Faithful port of the
/// canonical GLSL so the CPU and GPU backends agree within float tolerance.
fn ellipse_distance(p: V2, ab: V2) -> f32 {
    let mut p = p.abs();
    let mut ab = ab;
    if p.x > p.y {
        p = V2::new(p.y, p.x);
        ab = V2::new(ab.y, ab.x);
    }
    let l = ab.y * ab.y - ab.x * ab.x;
    if l == 0.0 {
        return p.length() - ab.x;
    }
    let m = ab.x * p.x / l;
    let m2 = m * m;
    let n = ab.y * p.y / l;
    let n2 = n * n;
    let c = (m2 + n2 - 1.0) / 3.0;
    let c3 = c * c * c;
    let q = c3 + m2 * n2 * 2.0;
    let d = c3 + m2 * n2;
    let g = m + m * n2;
    let co = if d < 0.0 {
        let h = (q / c3).acos() / 3.0;
        let s = h.cos();
        let t = h.sin() * SQRT3;
        let rx = (-c * (s + t + 2.0) + m2).sqrt();
        let ry = (-c * (s - t + 2.0) + m2).sqrt();
        (ry + glsl_sign(l) * rx + (g / (rx * ry)).abs() - m) / 2.0
    } else {
        let h = 2.0 * m * n * d.sqrt();
        let s = glsl_sign(q + h) * (q + h).abs().powf(1.0 / 3.0);
        let u = glsl_sign(q - h) * (q - h).abs().powf(1.0 / 3.0);
        let rx = -s - u - c * 4.0 + 2.0 * m2;
        let ry = (s - u) * SQRT3;
        let rm = (rx * rx + ry * ry).sqrt();
        (ry / (rm - rx).sqrt() + 2.0 * g / rm - m) / 2.0
    };
    let r = ab * V2::new(co, (1.0 - co * co).max(0.0).sqrt());
    (r - p).length() * glsl_sign(p.y - r.y)
}

impl Shape2 for Ellipse {
    fn append_name(&self, out: &mut String) {
        out.push_str("ellipse_a");
        out.push_str(&name_f(self.radii.x));
        out.push_str("_b");
        out.push_str(&name_f(self.radii.y));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}vec2 ab = vec2({a}, {b});\n\
             \u{20}\u{20}vec2 p = abs(p0);\n\
             \u{20}\u{20}if (p.x > p.y) {{ p = p.yx; ab = ab.yx; }}\n\
             \u{20}\u{20}float l = ab.y*ab.y - ab.x*ab.x;\n\
             \u{20}\u{20}float m = ab.x*p.x/l;       float m2 = m*m;\n\
             \u{20}\u{20}float n = ab.y*p.y/l;       float n2 = n*n;\n\
             \u{20}\u{20}float c = (m2+n2-1.0)/3.0;  float c3 = c*c*c;\n\
             \u{20}\u{20}float q = c3 + m2*n2*2.0;\n\
             \u{20}\u{20}float d = c3 + m2*n2;\n\
             \u{20}\u{20}float g = m + m*n2;\n\
             \u{20}\u{20}float co;\n\
             \u{20}\u{20}if (d < 0.0) {{\n\
             \u{20}\u{20}\u{20}\u{20}float h = acos(q/c3)/3.0;\n\
             \u{20}\u{20}\u{20}\u{20}float s = cos(h);\n\
             \u{20}\u{20}\u{20}\u{20}float t = sin(h)*sqrt(3.0);\n\
             \u{20}\u{20}\u{20}\u{20}float rx = sqrt(-c*(s+t+2.0)+m2);\n\
             \u{20}\u{20}\u{20}\u{20}float ry = sqrt(-c*(s-t+2.0)+m2);\n\
             \u{20}\u{20}\u{20}\u{20}co = (ry+sign(l)*rx+abs(g)/(rx*ry)-m)/2.0;\n\
             \u{20}\u{20}}} else {{\n\
             \u{20}\u{20}\u{20}\u{20}float h = 2.0*m*n*sqrt(d);\n\
             \u{20}\u{20}\u{20}\u{20}float s = sign(q+h)*pow(abs(q+h), 1.0/3.0);\n\
             \u{20}\u{20}\u{20}\u{20}float u = sign(q-h)*pow(abs(q-h), 1.0/3.0);\n\
             \u{20}\u{20}\u{20}\u{20}float rx = -s-u-c*4.0+2.0*m2;\n\
             \u{20}\u{20}\u{20}\u{20}float ry = (s-u)*sqrt(3.0);\n\
             \u{20}\u{20}\u{20}\u{20}float rm = sqrt(rx*rx+ry*ry);\n\
             \u{20}\u{20}\u{20}\u{20}co = (ry/sqrt(rm-rx)+2.0*g/rm-m)/2.0;\n\
             \u{20}\u{20}}}\n\
             \u{20}\u{20}vec2 r = ab * vec2(co, sqrt(max(1.0-co*co, 0.0)));\n\
             \u{20}\u{20}return length(r-p) * sign(p.y-r.y);\n\
             }}\n",
            name = name,
            a = lit(self.radii.x),
            b = lit(self.radii.y)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::new(-self.radii, self.radii)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = ellipse_distance(*p, self.radii);
        }
        Ok(())
    }
}

/// Circular arc of radius `r`, full aperture `angle` (radians), thickness
/// `thick`, centered on the y-axis bisector.
#[derive(Debug, Clone, Copy)]
pub struct Arc {
    pub radius: f32,
    pub angle: f32,
    pub thickness: f32,
}

impl Arc {
    #[must_use]
    pub fn new(radius: f32, angle: f32, thickness: f32) -> Self {
        Self {
            radius,
            angle,
            thickness,
        }
    }

    fn sc(&self) -> V2 {
        let half = self.angle * 0.5;
        V2::new(half.sin(), half.cos())
    }
}

impl Shape2 for Arc {
    fn append_name(&self, out: &mut String) {
        out.push_str("arc_r");
        out.push_str(&name_f(self.radius));
        out.push_str("_a");
        out.push_str(&name_f(self.angle));
        out.push_str("_t");
        out.push_str(&name_f(self.thickness));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        let sc = self.sc();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}vec2 sc = vec2({scx}, {scy});\n\
             \u{20}\u{20}vec2 p = vec2(abs(p0.x), p0.y);\n\
             \u{20}\u{20}float d = (sc.y*p.x > sc.x*p.y) ? length(p-sc*{r}) : abs(length(p)-{r});\n\
             \u{20}\u{20}return d - {t};\n\
             }}\n",
            name = name,
            scx = lit(sc.x),
            scy = lit(sc.y),
            r = lit(self.radius),
            t = lit(self.thickness)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::cube(self.radius + self.thickness)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        let sc = self.sc();
        for (p0, dist) in positions.iter().zip(distances.iter_mut()) {
            let p = V2::new(p0.x.abs(), p0.y);
            let d = if sc.y * p.x > sc.x * p.y {
                (p - sc * self.radius).length()
            } else {
                (p.length() - self.radius).abs()
            };
            *dist = d - self.thickness;
        }
        Ok(())
    }
}

fn segment_distance(p: V2, a: V2, b: V2) -> f32 {
    let pa = p - a;
    let ba = b - a;
    let h = (pa.dot(ba) / ba.dot(ba)).clamp(0.0, 1.0);
    (pa - ba * h).length()
}

/// Single line segment from `a` to `b`, thickness `thick`.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub a: V2,
    pub b: V2,
    pub thickness: f32,
}

impl Line {
    #[must_use]
    pub fn new(a: V2, b: V2, thickness: f32) -> Self {
        Self { a, b, thickness }
    }
}

impl Shape2 for Line {
    fn append_name(&self, out: &mut String) {
        out.push_str("line_");
        out.push_str(&name_f(self.a.x));
        out.push('_');
        out.push_str(&name_f(self.a.y));
        out.push('_');
        out.push_str(&name_f(self.b.x));
        out.push('_');
        out.push_str(&name_f(self.b.y));
        out.push_str("_t");
        out.push_str(&name_f(self.thickness));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p) {{\n\
             \u{20}\u{20}vec2 a = vec2({ax}, {ay});\n\
             \u{20}\u{20}vec2 b = vec2({bx}, {by});\n\
             \u{20}\u{20}vec2 pa = p-a, ba = b-a;\n\
             \u{20}\u{20}float h = clamp(dot(pa,ba)/dot(ba,ba), 0.0, 1.0);\n\
             \u{20}\u{20}return length(pa-ba*h) - {t};\n\
             }}\n",
            name = name,
            ax = lit(self.a.x),
            ay = lit(self.a.y),
            bx = lit(self.b.x),
            by = lit(self.b.y),
            t = lit(self.thickness)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::new(self.a.min(self.b), self.a.max(self.b)).expand(self.thickness)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = segment_distance(*p, self.a, self.b) - self.thickness;
        }
        Ok(())
    }
}

/// Polyline through `points`, thickness `thick`. Past the builder's packing
/// threshold the vertex list is emitted as a shader buffer instead of
/// inline literals.
#[derive(Debug, Clone)]
pub struct Lines {
    pub points: Vec<V2>,
    pub thickness: f32,
    pub use_shader_buffer: bool,
}

impl Lines {
    #[must_use]
    pub fn new(points: Vec<V2>, thickness: f32, use_shader_buffer: bool) -> Self {
        Self {
            points,
            thickness,
            use_shader_buffer,
        }
    }

    fn buffer_name(&self) -> String {
        let mut s = String::new();
        s.push_str("linesPts");
        s.push_str(&name_f(self.points.len() as f32));
        s
    }
}

impl Shape2 for Lines {
    fn append_name(&self, out: &mut String) {
        let hash = sdf_math::fold_to_u32(sdf_math::hash64(bytemuck::cast_slice(
            &self.points.iter().map(sdf_math::V2::to_array).collect::<Vec<_>>(),
        )));
        out.push_str("lines_n");
        out.push_str(&self.points.len().to_string());
        out.push_str("_h");
        out.push_str(&hash.to_string());
        out.push_str("_t");
        out.push_str(&name_f(self.thickness));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        let n = self.points.len();
        if self.use_shader_buffer {
            let buf = self.buffer_name();
            out.push_str(&format!(
                "float {name}(vec2 p) {{\n\
                 \u{20}\u{20}float best = 1e20;\n\
                 \u{20}\u{20}for (int i = 0; i < {n}-1; i++) {{\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 a = {buf}[i]; vec2 b = {buf}[i+1];\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 pa = p-a, ba = b-a;\n\
                 \u{20}\u{20}\u{20}\u{20}float h = clamp(dot(pa,ba)/dot(ba,ba), 0.0, 1.0);\n\
                 \u{20}\u{20}\u{20}\u{20}best = min(best, length(pa-ba*h));\n\
                 \u{20}\u{20}}}\n\
                 \u{20}\u{20}return best - {t};\n\
                 }}\n",
                name = name,
                n = n,
                buf = buf,
                t = lit(self.thickness)
            ));
        } else {
            out.push_str(&format!("float {name}(vec2 p) {{\n\u{20}\u{20}float best = 1e20;\n", name = name));
            for w in self.points.windows(2) {
                out.push_str(&format!(
                    "\u{20}\u{20}{{ vec2 a = vec2({ax},{ay}); vec2 b = vec2({bx},{by}); vec2 pa=p-a, ba=b-a; float h=clamp(dot(pa,ba)/dot(ba,ba),0.0,1.0); best=min(best, length(pa-ba*h)); }}\n",
                    ax = lit(w[0].x),
                    ay = lit(w[0].y),
                    bx = lit(w[1].x),
                    by = lit(w[1].y)
                ));
            }
            out.push_str(&format!("\u{20}\u{20}return best - {t};\n}}\n", t = lit(self.thickness)));
        }
    }

    fn append_shader_objects(&self, out: &mut Vec<ShaderObject>) {
        if self.use_shader_buffer {
            out.push(ShaderObject::Buffer(BufferObject::new_v2(self.buffer_name(), &self.points)));
        }
    }

    fn bounds(&self) -> Box2 {
        let mut b = Box2::new(self.points[0], self.points[0]);
        for &p in &self.points[1..] {
            b = b.include_point(p);
        }
        b.expand(self.thickness)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, dist) in positions.iter().zip(distances.iter_mut()) {
            let mut best = f32::MAX;
            for w in self.points.windows(2) {
                best = best.min(segment_distance(*p, w[0], w[1]));
            }
            *dist = best - self.thickness;
        }
        Ok(())
    }
}

/// Closed polygon through `verts` (winding-number style exact SDF). Past
/// the builder's packing threshold, vertices move to a shader buffer.
#[derive(Debug, Clone)]
pub struct Polygon {
    pub verts: Vec<V2>,
    pub use_shader_buffer: bool,
}

impl Polygon {
    #[must_use]
    pub fn new(verts: Vec<V2>, use_shader_buffer: bool) -> Self {
        Self {
            verts,
            use_shader_buffer,
        }
    }

    fn buffer_name(&self) -> String {
        format!("polyVerts{}", self.verts.len())
    }
}

fn polygon_distance(p: V2, v: &[V2]) -> f32 {
    let n = v.len();
    let mut d = (p - v[0]).dot(p - v[0]);
    let mut s = 1.0f32;
    let mut j = n - 1;
    for i in 0..n {
        let e = v[j] - v[i];
        let w = p - v[i];
        let b = w - e * (w.dot(e) / e.dot(e)).clamp(0.0, 1.0);
        d = d.min(b.dot(b));
        let c1 = p.y >= v[i].y;
        let c2 = p.y < v[j].y;
        let c3 = e.x * w.y > e.y * w.x;
        if (c1 && c2 && c3) || (!c1 && !c2 && !c3) {
            s = -s;
        }
        j = i;
    }
    s * d.sqrt()
}

impl Shape2 for Polygon {
    fn append_name(&self, out: &mut String) {
        let hash = sdf_math::fold_to_u32(sdf_math::hash64(bytemuck::cast_slice(
            &self.verts.iter().map(sdf_math::V2::to_array).collect::<Vec<_>>(),
        )));
        out.push_str("polygon_n");
        out.push_str(&self.verts.len().to_string());
        out.push_str("_h");
        out.push_str(&hash.to_string());
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        let n = self.verts.len();
        if self.use_shader_buffer {
            let buf = self.buffer_name();
            out.push_str(&format!(
                "float {name}(vec2 p) {{\n\
                 \u{20}\u{20}float d = dot(p-{buf}[0], p-{buf}[0]);\n\
                 \u{20}\u{20}float s = 1.0;\n\
                 \u{20}\u{20}for (int i = 0, j = {n}-1; i < {n}; j = i, i++) {{\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 e = {buf}[j] - {buf}[i];\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 w = p - {buf}[i];\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 b = w - e*clamp(dot(w,e)/dot(e,e), 0.0, 1.0);\n\
                 \u{20}\u{20}\u{20}\u{20}d = min(d, dot(b,b));\n\
                 \u{20}\u{20}\u{20}\u{20}bvec3 c = bvec3(p.y>={buf}[i].y, p.y<{buf}[j].y, e.x*w.y>e.y*w.x);\n\
                 \u{20}\u{20}\u{20}\u{20}if (all(c) || all(not(c))) s *= -1.0;\n\
                 \u{20}\u{20}}}\n\
                 \u{20}\u{20}return s*sqrt(d);\n\
                 }}\n",
                name = name,
                n = n,
                buf = buf
            ));
        } else {
            out.push_str(&format!(
                "float {name}(vec2 p) {{\n\
                 \u{20}\u{20}vec2 v[{n}] = vec2[{n}](",
                name = name,
                n = n
            ));
            let coords: Vec<String> = self
                .verts
                .iter()
                .map(|v| format!("vec2({},{})", lit(v.x), lit(v.y)))
                .collect();
            out.push_str(&coords.join(", "));
            out.push_str(
                ");\n\
                 \u{20}\u{20}float d = dot(p-v[0], p-v[0]);\n\
                 \u{20}\u{20}float s = 1.0;\n",
            );
            out.push_str(&format!(
                "\u{20}\u{20}for (int i = 0, j = {n}-1; i < {n}; j = i, i++) {{\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 e = v[j] - v[i];\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 w = p - v[i];\n\
                 \u{20}\u{20}\u{20}\u{20}vec2 b = w - e*clamp(dot(w,e)/dot(e,e), 0.0, 1.0);\n\
                 \u{20}\u{20}\u{20}\u{20}d = min(d, dot(b,b));\n\
                 \u{20}\u{20}\u{20}\u{20}bvec3 c = bvec3(p.y>=v[i].y, p.y<v[j].y, e.x*w.y>e.y*w.x);\n\
                 \u{20}\u{20}\u{20}\u{20}if (all(c) || all(not(c))) s *= -1.0;\n\
                 \u{20}\u{20}}}\n\
                 \u{20}\u{20}return s*sqrt(d);\n\
                 }}\n",
                n = n
            ));
        }
    }

    fn append_shader_objects(&self, out: &mut Vec<ShaderObject>) {
        if self.use_shader_buffer {
            out.push(ShaderObject::Buffer(BufferObject::new_v2(self.buffer_name(), &self.verts)));
        }
    }

    fn bounds(&self) -> Box2 {
        let mut b = Box2::new(self.verts[0], self.verts[0]);
        for &p in &self.verts[1..] {
            b = b.include_point(p);
        }
        b
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = polygon_distance(*p, &self.verts);
        }
        Ok(())
    }
}

fn ndot(a: V2, b: V2) -> f32 {
    a.x * b.x - a.y * b.y
}

/// Rhombus ("diamond") with half-diagonals `(x, y)`.
#[derive(Debug, Clone, Copy)]
pub struct Diamond {
    pub half_diagonals: V2,
}

impl Diamond {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            half_diagonals: V2::new(x, y),
        }
    }
}

fn rhombus_distance(p: V2, b: V2) -> f32 {
    let p = p.abs();
    let h = (ndot(b - 2.0 * p, b) / b.dot(b)).clamp(-1.0, 1.0);
    let d = (p - 0.5 * b * V2::new(1.0 - h, 1.0 + h)).length();
    d * glsl_sign(p.x * b.y + p.y * b.x - b.x * b.y)
}

impl Shape2 for Diamond {
    fn append_name(&self, out: &mut String) {
        out.push_str("diamond_x");
        out.push_str(&name_f(self.half_diagonals.x));
        out.push_str("_y");
        out.push_str(&name_f(self.half_diagonals.y));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}vec2 b = vec2({bx}, {by});\n\
             \u{20}\u{20}vec2 p = abs(p0);\n\
             \u{20}\u{20}float h = clamp(((b.x-2.0*p.x)*b.x - (b.y-2.0*p.y)*b.y)/dot(b,b), -1.0, 1.0);\n\
             \u{20}\u{20}vec2 d2 = p - 0.5*b*vec2(1.0-h, 1.0+h);\n\
             \u{20}\u{20}return length(d2) * sign(p.x*b.y + p.y*b.x - b.x*b.y);\n\
             }}\n",
            name = name,
            bx = lit(self.half_diagonals.x),
            by = lit(self.half_diagonals.y)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::new(-self.half_diagonals, self.half_diagonals)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = rhombus_distance(*p, self.half_diagonals);
        }
        Ok(())
    }
}

/// Rounded "X" (two crossed bars), half-width `w`, corner radius `r`.
#[derive(Debug, Clone, Copy)]
pub struct RoundedX {
    pub half_width: f32,
    pub radius: f32,
}

impl RoundedX {
    #[must_use]
    pub fn new(half_width: f32, radius: f32) -> Self {
        Self {
            half_width,
            radius,
        }
    }
}

impl Shape2 for RoundedX {
    fn append_name(&self, out: &mut String) {
        out.push_str("roundedx_w");
        out.push_str(&name_f(self.half_width));
        out.push_str("_r");
        out.push_str(&name_f(self.radius));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 p0) {{\n\
             \u{20}\u{20}vec2 p = abs(p0);\n\
             \u{20}\u{20}return length(p-min(p.x+p.y, {w})*0.5) - {r};\n\
             }}\n",
            name = name,
            w = lit(self.half_width),
            r = lit(self.radius)
        ));
    }

    fn bounds(&self) -> Box2 {
        Box2::cube(self.half_width * 0.5 + self.radius)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p0, d) in positions.iter().zip(distances.iter_mut()) {
            let p = p0.abs();
            *d = (p - V2::splat((p.x + p.y).min(self.half_width)) * 0.5).length() - self.radius;
        }
        Ok(())
    }
}

/// Quadratic Bezier curve through control points `a`, `b`, `c`, thickness
/// `thick`. Exact distance via the cubic-resolvent method.
#[derive(Debug, Clone, Copy)]
pub struct QuadraticBezier {
    pub a: V2,
    pub b: V2,
    pub c: V2,
    pub thickness: f32,
}

impl QuadraticBezier {
    #[must_use]
    pub fn new(a: V2, b: V2, c: V2, thickness: f32) -> Self {
        Self { a, b, c, thickness }
    }
}

fn bezier_distance(pos: V2, a: V2, b: V2, c: V2) -> f32 {
    let va = b - a;
    let vb = a - 2.0 * b + c;
    let vc = va * 2.0;
    let vd = a - pos;
    let kk = 1.0 / vb.dot(vb);
    let kx = kk * va.dot(vb);
    let ky = kk * (2.0 * va.dot(va) + vd.dot(vb)) / 3.0;
    let kz = kk * vd.dot(va);
    let p = ky - kx * kx;
    let p3 = p * p * p;
    let q = kx * (2.0 * kx * kx - 3.0 * ky) + kz;
    let h = q * q + 4.0 * p3;
    let res;
    if h >= 0.0 {
        let h = h.sqrt();
        let x = (V2::new(h, -h) - V2::splat(q)) * 0.5;
        let ux = glsl_sign(x.x) * x.x.abs().powf(1.0 / 3.0);
        let uy = glsl_sign(x.y) * x.y.abs().powf(1.0 / 3.0);
        let t = (ux + uy - kx).clamp(0.0, 1.0);
        let d = vd + (vc + vb * t) * t;
        res = d.dot(d);
    } else {
        let z = (-p).sqrt();
        let v = (q / (p * z * 2.0)).acos() / 3.0;
        let m = v.cos();
        let n = v.sin() * SQRT3;
        let t0 = ((m + m) * z - kx).clamp(0.0, 1.0);
        let t1 = ((-n - m) * z - kx).clamp(0.0, 1.0);
        let d0 = vd + (vc + vb * t0) * t0;
        let d1 = vd + (vc + vb * t1) * t1;
        res = d0.dot(d0).min(d1.dot(d1));
    }
    res.sqrt()
}

impl Shape2 for QuadraticBezier {
    fn append_name(&self, out: &mut String) {
        out.push_str("bezier2_");
        for p in [self.a, self.b, self.c] {
            out.push_str(&name_f(p.x));
            out.push('_');
            out.push_str(&name_f(p.y));
            out.push('_');
        }
        out.push_str("t");
        out.push_str(&name_f(self.thickness));
    }

    fn append_body(&self, out: &mut String) {
        let name = self.name();
        out.push_str(&format!(
            "float {name}(vec2 pos) {{\n\
             \u{20}\u{20}vec2 a = vec2({ax},{ay}); vec2 b = vec2({bx},{by}); vec2 c = vec2({cx},{cy});\n\
             \u{20}\u{20}vec2 va = b - a; vec2 vb = a - 2.0*b + c; vec2 vc = va*2.0; vec2 vd = a - pos;\n\
             \u{20}\u{20}float kk = 1.0/dot(vb,vb);\n\
             \u{20}\u{20}float kx = kk * dot(va,vb);\n\
             \u{20}\u{20}float ky = kk * (2.0*dot(va,va)+dot(vd,vb)) / 3.0;\n\
             \u{20}\u{20}float kz = kk * dot(vd,va);\n\
             \u{20}\u{20}float res = 0.0;\n\
             \u{20}\u{20}float p = ky - kx*kx;\n\
             \u{20}\u{20}float p3 = p*p*p;\n\
             \u{20}\u{20}float q = kx*(2.0*kx*kx-3.0*ky) + kz;\n\
             \u{20}\u{20}float h = q*q + 4.0*p3;\n\
             \u{20}\u{20}if (h >= 0.0) {{\n\
             \u{20}\u{20}\u{20}\u{20}h = sqrt(h);\n\
             \u{20}\u{20}\u{20}\u{20}vec2 x = (vec2(h,-h)-q)/2.0;\n\
             \u{20}\u{20}\u{20}\u{20}vec2 uv = sign(x)*pow(abs(x), vec2(1.0/3.0));\n\
             \u{20}\u{20}\u{20}\u{20}float t = clamp(uv.x+uv.y-kx, 0.0, 1.0);\n\
             \u{20}\u{20}\u{20}\u{20}res = dot(vd+(vc+vb*t)*t, vd+(vc+vb*t)*t);\n\
             \u{20}\u{20}}} else {{\n\
             \u{20}\u{20}\u{20}\u{20}float z = sqrt(-p);\n\
             \u{20}\u{20}\u{20}\u{20}float v = acos(q/(p*z*2.0)) / 3.0;\n\
             \u{20}\u{20}\u{20}\u{20}float m = cos(v);\n\
             \u{20}\u{20}\u{20}\u{20}float n = sin(v)*1.732050808;\n\
             \u{20}\u{20}\u{20}\u{20}vec3 t = clamp(vec3(m+m,-n-m,n-m)*z-kx, 0.0, 1.0);\n\
             \u{20}\u{20}\u{20}\u{20}vec2 d0 = vd+(vc+vb*t.x)*t.x;\n\
             \u{20}\u{20}\u{20}\u{20}vec2 d1 = vd+(vc+vb*t.y)*t.y;\n\
             \u{20}\u{20}\u{20}\u{20}res = min(dot(d0,d0), dot(d1,d1));\n\
             \u{20}\u{20}}}\n\
             \u{20}\u{20}return sqrt(res) - {thick};\n\
             }}\n",
            name = name,
            ax = lit(self.a.x),
            ay = lit(self.a.y),
            bx = lit(self.b.x),
            by = lit(self.b.y),
            cx = lit(self.c.x),
            cy = lit(self.c.y),
            thick = lit(self.thickness)
        ));
    }

    fn bounds(&self) -> Box2 {
        let mut b = Box2::new(self.a, self.a);
        b = b.include_point(self.b).include_point(self.c);
        b.expand(self.thickness)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        for (p, d) in positions.iter().zip(distances.iter_mut()) {
            *d = bezier_distance(*p, self.a, self.b, self.c) - self.thickness;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn circle_distance_matches_formula() {
        let c = Circle::new(1.0);
        let mut ctx = EvalCtx2::new();
        let positions = vec![V2::new(2.0, 0.0)];
        let mut distances = vec![0.0];
        c.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn rectangle_distance_at_origin() {
        let r = Rectangle::new(2.0, 1.0);
        let mut ctx = EvalCtx2::new();
        let positions = vec![V2::ZERO];
        let mut distances = vec![0.0];
        r.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -0.5, epsilon = 1e-6);
    }

    #[test]
    fn polygon_inside_is_negative() {
        let p = Polygon::new(vec![V2::new(0.0, 0.0), V2::new(1.0, 0.0), V2::new(0.0, 1.0)], false);
        let mut ctx = EvalCtx2::new();
        let positions = vec![V2::new(0.2, 0.2)];
        let mut distances = vec![0.0];
        p.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert!(distances[0] < 0.0);
    }

    #[test]
    fn rounded_x_matches_formula_at_origin() {
        let x = RoundedX::new(1.0, 0.1);
        let mut ctx = EvalCtx2::new();
        let positions = vec![V2::ZERO];
        let mut distances = vec![0.0];
        x.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], -0.1, epsilon = 1e-6);
    }

    #[test]
    fn ellipse_distance_at_degenerate_circle_matches_circle() {
        let e = Ellipse::new(1.0, 1.0);
        let mut ctx = EvalCtx2::new();
        let positions = vec![V2::new(2.0, 0.0)];
        let mut distances = vec![0.0];
        e.evaluate(&positions, &mut distances, &mut ctx).unwrap();
        assert_relative_eq!(distances[0], 1.0, epsilon = 1e-3);
    }
}
