//! Builder and error policy: the factory façade that constructs every node,
//! validating each constructor's invariants before handing back a handle.
//!
//! Validation failures either abort the process (the default) or, with
//! [`BuilderFlags::NO_DIMENSION_PANIC`] set, accumulate in `self.errors` and
//! the constructor returns a placeholder node so the caller's composition
//! can keep going and collect further errors in one pass rather than
//! short-circuiting at the first one.

use std::sync::Arc;

use sdf_math::{Mat3, Mat4, V2, V3};

use crate::error::{Error, Result};
use crate::eval::{EvalCtx2, EvalCtx3};
use crate::shape::extrude_revolve::{Extrude, Revolve};
use crate::shape::ops2::{
    Array2, CircularArray2, Difference2, Elongate2, Intersection2, Offset2, Scale2, Shell2,
    SmoothDifference2, SmoothIntersect2, SmoothUnion2, Symmetry2, Transform2, Union2, Xor2,
};
use crate::shape::ops3::{
    Array3, CircularArray3, Difference3, Elongate3, Intersection3, Offset3, Scale3, Shell3,
    SmoothDifference3, SmoothIntersect3, SmoothUnion3, Symmetry3, Transform3, Union3, Xor3,
};
use crate::shape::primitives2::{
    Arc as Arc2, Diamond, Ellipse, EquilateralTriangle, Hexagon, Line, Lines, Octagon, Polygon,
    QuadraticBezier, Rectangle as Rectangle2, RoundedX,
};
use crate::shape::primitives3::{BoxFrame, Box3Shape, Cylinder, HexPrism, Sphere, Torus};
use crate::shape::{Shape2, Shape2Handle, Shape3, Shape3Handle};

/// Bit-flag construction policy, read once per constructor call. Hand-rolled
/// rather than pulled from a crate: three flags don't earn a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuilderFlags(u8);

impl BuilderFlags {
    pub const NONE: Self = Self(0);
    /// Accumulate validation errors instead of panicking.
    pub const NO_DIMENSION_PANIC: Self = Self(1 << 0);
    /// Force shader-buffer packing regardless of the component-count threshold.
    pub const USE_SHADER_BUFFERS: Self = Self(1 << 1);
    /// Forbid shader-buffer packing regardless of the component-count threshold.
    pub const NO_SHADER_BUFFERS: Self = Self(1 << 2);

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for BuilderFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for BuilderFlags {
    fn default() -> Self {
        Self::NONE
    }
}

fn require_positive(value: f32, what: &str) -> std::result::Result<(), Error> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidDimension(format!("{what} must be positive and finite, got {value}")));
    }
    Ok(())
}

fn require_finite(value: f32, what: &str) -> std::result::Result<(), Error> {
    if !value.is_finite() {
        return Err(Error::InvalidDimension(format!("{what} must be finite, got {value}")));
    }
    Ok(())
}

/// Default component-count threshold (in scalar floats) past which a
/// variable-length node (`lines`, `polygon`) packs its data into a shader
/// buffer instead of inlining it as literals.
pub const DEFAULT_SHADER_BUFFER_THRESHOLD: usize = 128;

/// Factory façade over every primitive and operator constructor. Exclusive
/// to one thread during construction; once built, shape handles are
/// immutable and freely shared.
#[derive(Debug, Default)]
pub struct Builder {
    flags: BuilderFlags,
    shader_buffer_threshold: usize,
    errors: Vec<Error>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            flags: BuilderFlags::NONE,
            shader_buffer_threshold: DEFAULT_SHADER_BUFFER_THRESHOLD,
            errors: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_flags(flags: BuilderFlags) -> Self {
        Self {
            flags,
            ..Self::new()
        }
    }

    /// The join of all errors accumulated so far (`None` once drained).
    #[must_use]
    pub fn err(&self) -> Option<Error> {
        Error::join(self.errors.clone())
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    fn panics(&self) -> bool {
        !self.flags.contains(BuilderFlags::NO_DIMENSION_PANIC)
    }

    fn fail3(&mut self, err: Error) -> Shape3Handle {
        if self.panics() {
            panic!("{err}");
        }
        tracing::warn!("shape construction error accumulated: {err}");
        self.errors.push(err);
        Arc::new(Placeholder3)
    }

    fn fail2(&mut self, err: Error) -> Shape2Handle {
        if self.panics() {
            panic!("{err}");
        }
        tracing::warn!("shape construction error accumulated: {err}");
        self.errors.push(err);
        Arc::new(Placeholder2)
    }

    fn uses_shader_buffer(&self, component_count: usize) -> bool {
        if self.flags.contains(BuilderFlags::USE_SHADER_BUFFERS) {
            return true;
        }
        if self.flags.contains(BuilderFlags::NO_SHADER_BUFFERS) {
            return false;
        }
        component_count > self.shader_buffer_threshold
    }


    // -------------------------------------------------------------
    // 3D primitives
    // -------------------------------------------------------------

    #[must_use]
    pub fn sphere(&mut self, radius: f32) -> Shape3Handle {
        if let Err(e) = require_positive(radius, "sphere radius") {
            return self.fail3(e);
        }
        Arc::new(Sphere::new(radius))
    }

    #[must_use]
    pub fn boxed(&mut self, dx: f32, dy: f32, dz: f32, round: f32) -> Shape3Handle {
        for (v, what) in [(dx, "box dx"), (dy, "box dy"), (dz, "box dz")] {
            if let Err(e) = require_positive(v, what) {
                return self.fail3(e);
            }
        }
        if round < 0.0 || !round.is_finite() {
            return self.fail3(Error::InvalidDimension(format!("box round must be non-negative and finite, got {round}")));
        }
        let half = V3::new(dx, dy, dz) * 0.5;
        if round > half.x.min(half.y).min(half.z) {
            return self.fail3(Error::InvalidDimension(
                "box round exceeds half the smallest extent".into(),
            ));
        }
        Arc::new(Box3Shape::new(half, round))
    }

    #[must_use]
    pub fn box_frame(&mut self, dx: f32, dy: f32, dz: f32, edge: f32) -> Shape3Handle {
        for (v, what) in [(dx, "box_frame dx"), (dy, "box_frame dy"), (dz, "box_frame dz")] {
            if let Err(e) = require_positive(v, what) {
                return self.fail3(e);
            }
        }
        if let Err(e) = require_positive(edge, "box_frame edge") {
            return self.fail3(e);
        }
        let half = V3::new(dx, dy, dz) * 0.5;
        if edge > half.x.min(half.y).min(half.z) {
            return self.fail3(Error::InvalidDimension(
                "box_frame edge exceeds half the smallest extent".into(),
            ));
        }
        Arc::new(BoxFrame::new(half, edge))
    }

    #[must_use]
    pub fn cylinder(&mut self, radius: f32, height: f32, round: f32) -> Shape3Handle {
        if let Err(e) = require_positive(radius, "cylinder radius") {
            return self.fail3(e);
        }
        if let Err(e) = require_positive(height, "cylinder height") {
            return self.fail3(e);
        }
        if round < 0.0 || !round.is_finite() {
            return self.fail3(Error::InvalidDimension(format!("cylinder round must be non-negative and finite, got {round}")));
        }
        if round > radius.min(height * 0.5) {
            return self.fail3(Error::InvalidDimension(
                "cylinder round exceeds half the smallest extent".into(),
            ));
        }
        Arc::new(Cylinder::new(radius, height, round))
    }

    #[must_use]
    pub fn hex_prism(&mut self, face2face: f32, height: f32) -> Shape3Handle {
        if let Err(e) = require_positive(face2face, "hex_prism face2face") {
            return self.fail3(e);
        }
        if let Err(e) = require_positive(height, "hex_prism height") {
            return self.fail3(e);
        }
        Arc::new(HexPrism::new(face2face, height))
    }

    #[must_use]
    pub fn torus(&mut self, major_radius: f32, minor_radius: f32) -> Shape3Handle {
        if let Err(e) = require_positive(major_radius, "torus major_radius") {
            return self.fail3(e);
        }
        if let Err(e) = require_positive(minor_radius, "torus minor_radius") {
            return self.fail3(e);
        }
        if minor_radius > major_radius {
            return self.fail3(Error::InvalidDimension(
                "torus minor_radius must not exceed major_radius".into(),
            ));
        }
        Arc::new(Torus::new(major_radius, minor_radius))
    }

    /// Triangular prism, modelled as an extrusion of an equilateral triangle.
    #[must_use]
    pub fn triangular_prism(&mut self, size: f32, height: f32) -> Shape3Handle {
        let profile = self.equilateral_triangle(size);
        if let Err(e) = require_positive(height, "triangular_prism height") {
            return self.fail3(e);
        }
        Arc::new(Extrude::new(profile, height))
    }

    // -------------------------------------------------------------
    // 2D primitives
    // -------------------------------------------------------------

    #[must_use]
    pub fn circle(&mut self, radius: f32) -> Shape2Handle {
        if let Err(e) = require_positive(radius, "circle radius") {
            return self.fail2(e);
        }
        Arc::new(crate::shape::primitives2::Circle::new(radius))
    }

    #[must_use]
    pub fn rectangle(&mut self, w: f32, h: f32) -> Shape2Handle {
        if let Err(e) = require_positive(w, "rectangle w") {
            return self.fail2(e);
        }
        if let Err(e) = require_positive(h, "rectangle h") {
            return self.fail2(e);
        }
        Arc::new(Rectangle2::new(w, h))
    }

    #[must_use]
    pub fn hexagon(&mut self, side: f32) -> Shape2Handle {
        if let Err(e) = require_positive(side, "hexagon side") {
            return self.fail2(e);
        }
        Arc::new(Hexagon::new(side))
    }

    #[must_use]
    pub fn octagon(&mut self, circumradius: f32) -> Shape2Handle {
        if let Err(e) = require_positive(circumradius, "octagon circumradius") {
            return self.fail2(e);
        }
        Arc::new(Octagon::new(circumradius))
    }

    #[must_use]
    pub fn equilateral_triangle(&mut self, size: f32) -> Shape2Handle {
        if let Err(e) = require_positive(size, "equilateral_triangle size") {
            return self.fail2(e);
        }
        Arc::new(EquilateralTriangle::new(size))
    }

    #[must_use]
    pub fn ellipse(&mut self, a: f32, b: f32) -> Shape2Handle {
        if let Err(e) = require_positive(a, "ellipse a") {
            return self.fail2(e);
        }
        if let Err(e) = require_positive(b, "ellipse b") {
            return self.fail2(e);
        }
        Arc::new(Ellipse::new(a, b))
    }

    #[must_use]
    pub fn arc(&mut self, radius: f32, angle: f32, thickness: f32) -> Shape2Handle {
        if let Err(e) = require_positive(radius, "arc radius") {
            return self.fail2(e);
        }
        if let Err(e) = require_positive(thickness, "arc thickness") {
            return self.fail2(e);
        }
        if !(angle > 0.0 && angle <= std::f32::consts::TAU) {
            return self.fail2(Error::InvalidDimension(format!(
                "arc angle must be in (0, 2*pi], got {angle}"
            )));
        }
        Arc::new(Arc2::new(radius, angle, thickness))
    }

    #[must_use]
    pub fn line(&mut self, a: V2, b: V2, thickness: f32) -> Shape2Handle {
        if let Err(e) = require_positive(thickness, "line thickness") {
            return self.fail2(e);
        }
        if a.distance_squared(b) < f32::EPSILON {
            return self.fail2(Error::DegenerateInput("line endpoints must be distinct".into()));
        }
        Arc::new(Line::new(a, b, thickness))
    }

    #[must_use]
    pub fn lines(&mut self, points: Vec<V2>, thickness: f32) -> Shape2Handle {
        if let Err(e) = require_positive(thickness, "lines thickness") {
            return self.fail2(e);
        }
        if points.len() < 2 {
            return self.fail2(Error::DegenerateInput("lines requires at least two points".into()));
        }
        for w in points.windows(2) {
            if w[0].distance_squared(w[1]) < f32::EPSILON {
                return self.fail2(Error::DegenerateInput("lines segments must not be degenerate".into()));
            }
        }
        let use_buffer = self.uses_shader_buffer(points.len() * 2);
        Arc::new(Lines::new(points, thickness, use_buffer))
    }

    /// Validates a polygon vertex list, trimming a self-closing final vertex
    /// if the caller supplied one.
    fn prepare_polygon_verts(&mut self, mut verts: Vec<V2>) -> std::result::Result<Vec<V2>, Error> {
        if verts.len() >= 2 && verts.first() == verts.last() {
            verts.pop();
        }
        if verts.len() < 3 {
            return Err(Error::DegenerateInput(
                "polygon requires at least three distinct vertices".into(),
            ));
        }
        for w in verts.windows(2) {
            if w[0].distance_squared(w[1]) < f32::EPSILON {
                return Err(Error::DegenerateInput("polygon has repeated consecutive vertices".into()));
            }
        }
        if verts.iter().any(|v| !v.is_finite()) {
            return Err(Error::DegenerateInput("polygon vertices must be finite".into()));
        }
        Ok(verts)
    }

    #[must_use]
    pub fn polygon(&mut self, verts: Vec<V2>) -> Shape2Handle {
        let verts = match self.prepare_polygon_verts(verts) {
            Ok(v) => v,
            Err(e) => return self.fail2(e),
        };
        let use_buffer = self.uses_shader_buffer(verts.len() * 2);
        Arc::new(Polygon::new(verts, use_buffer))
    }

    #[must_use]
    pub fn diamond(&mut self, x: f32, y: f32) -> Shape2Handle {
        if let Err(e) = require_positive(x, "diamond x") {
            return self.fail2(e);
        }
        if let Err(e) = require_positive(y, "diamond y") {
            return self.fail2(e);
        }
        Arc::new(Diamond::new(x, y))
    }

    #[must_use]
    pub fn rounded_x(&mut self, w: f32, r: f32) -> Shape2Handle {
        if let Err(e) = require_positive(w, "rounded_x w") {
            return self.fail2(e);
        }
        if r < 0.0 || !r.is_finite() {
            return self.fail2(Error::InvalidDimension(format!("rounded_x r must be non-negative and finite, got {r}")));
        }
        Arc::new(RoundedX::new(w, r))
    }

    #[must_use]
    pub fn quadratic_bezier(&mut self, a: V2, b: V2, c: V2, thickness: f32) -> Shape2Handle {
        if let Err(e) = require_positive(thickness, "quadratic_bezier thickness") {
            return self.fail2(e);
        }
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return self.fail2(Error::DegenerateInput("quadratic_bezier control points must be finite".into()));
        }
        Arc::new(QuadraticBezier::new(a, b, c, thickness))
    }

    // -------------------------------------------------------------
    // 3D operators
    // -------------------------------------------------------------

    #[must_use]
    pub fn translate(&mut self, child: Shape3Handle, offset: V3) -> Shape3Handle {
        if !offset.is_finite() {
            return self.fail3(Error::DegenerateInput("translate offset must be finite".into()));
        }
        Arc::new(Transform3::translate(child, offset))
    }

    #[must_use]
    pub fn scale(&mut self, child: Shape3Handle, factor: f32) -> Shape3Handle {
        if let Err(e) = require_positive(factor, "scale factor") {
            return self.fail3(e);
        }
        Arc::new(Scale3::new(child, factor))
    }

    #[must_use]
    pub fn rotate(&mut self, child: Shape3Handle, axis: V3, angle: f32) -> Shape3Handle {
        if axis.length_squared() < f32::EPSILON {
            return self.fail3(Error::DegenerateInput("rotate axis must be non-zero".into()));
        }
        if let Err(e) = require_finite(angle, "rotate angle") {
            return self.fail3(e);
        }
        Arc::new(Transform3::rotate(child, axis, angle))
    }

    #[must_use]
    pub fn transform(&mut self, child: Shape3Handle, matrix: Mat4) -> Shape3Handle {
        let det = matrix.determinant();
        if det.abs() < 6e-7 {
            return self.fail3(Error::DegenerateInput(format!(
                "transform matrix is near-singular: |det| = {det}"
            )));
        }
        Arc::new(Transform3::new(child, matrix, matrix.inverse()))
    }

    #[must_use]
    pub fn symmetry(&mut self, child: Shape3Handle, x: bool, y: bool, z: bool) -> Shape3Handle {
        if !(x || y || z) {
            return self.fail3(Error::DegenerateInput("symmetry requires at least one active axis".into()));
        }
        Arc::new(Symmetry3::new(child, x, y, z))
    }

    #[must_use]
    pub fn shell(&mut self, child: Shape3Handle, thickness: f32) -> Shape3Handle {
        if let Err(e) = require_positive(thickness, "shell thickness") {
            return self.fail3(e);
        }
        Arc::new(Shell3::new(child, thickness))
    }

    #[must_use]
    pub fn offset(&mut self, child: Shape3Handle, offset: f32) -> Shape3Handle {
        if let Err(e) = require_finite(offset, "offset") {
            return self.fail3(e);
        }
        Arc::new(Offset3::new(child, offset))
    }

    #[must_use]
    pub fn elongate(&mut self, child: Shape3Handle, h: V3) -> Shape3Handle {
        if h.x < 0.0 || h.y < 0.0 || h.z < 0.0 || !h.is_finite() {
            return self.fail3(Error::InvalidDimension("elongate h must be non-negative and finite".into()));
        }
        Arc::new(Elongate3::new(child, h))
    }

    #[must_use]
    pub fn array(&mut self, child: Shape3Handle, spacing: V3, count: [u32; 3]) -> Shape3Handle {
        if !spacing.is_finite() || spacing.x <= 0.0 || spacing.y <= 0.0 || spacing.z <= 0.0 {
            return self.fail3(Error::InvalidDimension("array spacing must be positive and finite".into()));
        }
        if count.iter().any(|&c| c == 0) {
            return self.fail3(Error::InvalidDimension("array count must be at least 1 per axis".into()));
        }
        Arc::new(Array3::new(child, spacing, count))
    }

    #[must_use]
    pub fn circular_array(&mut self, child: Shape3Handle, num_instances: u32) -> Shape3Handle {
        if num_instances == 0 {
            return self.fail3(Error::InvalidDimension("circular_array requires at least one instance".into()));
        }
        Arc::new(CircularArray3::new(child, num_instances))
    }

    #[must_use]
    pub fn union(&mut self, children: Vec<Shape3Handle>) -> Shape3Handle {
        match Union3::new(children) {
            Ok(u) => Arc::new(u),
            Err(e) => self.fail3(e),
        }
    }

    #[must_use]
    pub fn intersection(&mut self, a: Shape3Handle, b: Shape3Handle) -> Shape3Handle {
        Arc::new(Intersection3::new(a, b))
    }

    #[must_use]
    pub fn difference(&mut self, a: Shape3Handle, b: Shape3Handle) -> Shape3Handle {
        Arc::new(Difference3::new(a, b))
    }

    #[must_use]
    pub fn xor(&mut self, a: Shape3Handle, b: Shape3Handle) -> Shape3Handle {
        Arc::new(Xor3::new(a, b))
    }

    #[must_use]
    pub fn smooth_union(&mut self, a: Shape3Handle, b: Shape3Handle, k: f32) -> Shape3Handle {
        if let Err(e) = require_positive(k, "smooth_union k") {
            return self.fail3(e);
        }
        Arc::new(SmoothUnion3::new(a, b, k))
    }

    #[must_use]
    pub fn smooth_difference(&mut self, a: Shape3Handle, b: Shape3Handle, k: f32) -> Shape3Handle {
        if let Err(e) = require_positive(k, "smooth_difference k") {
            return self.fail3(e);
        }
        Arc::new(SmoothDifference3::new(a, b, k))
    }

    #[must_use]
    pub fn smooth_intersect(&mut self, a: Shape3Handle, b: Shape3Handle, k: f32) -> Shape3Handle {
        if let Err(e) = require_positive(k, "smooth_intersect k") {
            return self.fail3(e);
        }
        Arc::new(SmoothIntersect3::new(a, b, k))
    }

    // -------------------------------------------------------------
    // 2D operators
    // -------------------------------------------------------------

    #[must_use]
    pub fn translate2(&mut self, child: Shape2Handle, offset: V2) -> Shape2Handle {
        if !offset.is_finite() {
            return self.fail2(Error::DegenerateInput("translate2 offset must be finite".into()));
        }
        Arc::new(Transform2::translate(child, offset))
    }

    #[must_use]
    pub fn scale2(&mut self, child: Shape2Handle, factor: f32) -> Shape2Handle {
        if let Err(e) = require_positive(factor, "scale2 factor") {
            return self.fail2(e);
        }
        Arc::new(Scale2::new(child, factor))
    }

    #[must_use]
    pub fn rotate2(&mut self, child: Shape2Handle, angle: f32) -> Shape2Handle {
        if let Err(e) = require_finite(angle, "rotate2 angle") {
            return self.fail2(e);
        }
        Arc::new(Transform2::rotate(child, angle))
    }

    #[must_use]
    pub fn transform2(&mut self, child: Shape2Handle, matrix: Mat3) -> Shape2Handle {
        let det = matrix.determinant();
        if det.abs() < 6e-7 {
            return self.fail2(Error::DegenerateInput(format!(
                "transform2 matrix is near-singular: |det| = {det}"
            )));
        }
        Arc::new(Transform2::new(child, matrix, matrix.inverse()))
    }

    #[must_use]
    pub fn symmetry2(&mut self, child: Shape2Handle, x: bool, y: bool) -> Shape2Handle {
        if !(x || y) {
            return self.fail2(Error::DegenerateInput("symmetry2 requires at least one active axis".into()));
        }
        Arc::new(Symmetry2::new(child, x, y))
    }

    #[must_use]
    pub fn shell2(&mut self, child: Shape2Handle, thickness: f32) -> Shape2Handle {
        if let Err(e) = require_positive(thickness, "shell2 thickness") {
            return self.fail2(e);
        }
        Arc::new(Shell2::new(child, thickness))
    }

    #[must_use]
    pub fn offset2(&mut self, child: Shape2Handle, offset: f32) -> Shape2Handle {
        if let Err(e) = require_finite(offset, "offset2") {
            return self.fail2(e);
        }
        Arc::new(Offset2::new(child, offset))
    }

    #[must_use]
    pub fn elongate2(&mut self, child: Shape2Handle, h: V2) -> Shape2Handle {
        if h.x < 0.0 || h.y < 0.0 || !h.is_finite() {
            return self.fail2(Error::InvalidDimension("elongate2 h must be non-negative and finite".into()));
        }
        Arc::new(Elongate2::new(child, h))
    }

    #[must_use]
    pub fn array2(&mut self, child: Shape2Handle, spacing: V2, count: [u32; 2]) -> Shape2Handle {
        if !spacing.is_finite() || spacing.x <= 0.0 || spacing.y <= 0.0 {
            return self.fail2(Error::InvalidDimension("array2 spacing must be positive and finite".into()));
        }
        if count.iter().any(|&c| c == 0) {
            return self.fail2(Error::InvalidDimension("array2 count must be at least 1 per axis".into()));
        }
        Arc::new(Array2::new(child, spacing, count))
    }

    #[must_use]
    pub fn circular_array2(&mut self, child: Shape2Handle, num_instances: u32) -> Shape2Handle {
        if num_instances == 0 {
            return self.fail2(Error::InvalidDimension("circular_array2 requires at least one instance".into()));
        }
        Arc::new(CircularArray2::new(child, num_instances))
    }

    #[must_use]
    pub fn union2(&mut self, children: Vec<Shape2Handle>) -> Shape2Handle {
        match Union2::new(children) {
            Ok(u) => Arc::new(u),
            Err(e) => self.fail2(e),
        }
    }

    #[must_use]
    pub fn intersection2(&mut self, a: Shape2Handle, b: Shape2Handle) -> Shape2Handle {
        Arc::new(Intersection2::new(a, b))
    }

    #[must_use]
    pub fn difference2(&mut self, a: Shape2Handle, b: Shape2Handle) -> Shape2Handle {
        Arc::new(Difference2::new(a, b))
    }

    #[must_use]
    pub fn xor2(&mut self, a: Shape2Handle, b: Shape2Handle) -> Shape2Handle {
        Arc::new(Xor2::new(a, b))
    }

    #[must_use]
    pub fn smooth_union2(&mut self, a: Shape2Handle, b: Shape2Handle, k: f32) -> Shape2Handle {
        if let Err(e) = require_positive(k, "smooth_union2 k") {
            return self.fail2(e);
        }
        Arc::new(SmoothUnion2::new(a, b, k))
    }

    #[must_use]
    pub fn smooth_difference2(&mut self, a: Shape2Handle, b: Shape2Handle, k: f32) -> Shape2Handle {
        if let Err(e) = require_positive(k, "smooth_difference2 k") {
            return self.fail2(e);
        }
        Arc::new(SmoothDifference2::new(a, b, k))
    }

    #[must_use]
    pub fn smooth_intersect2(&mut self, a: Shape2Handle, b: Shape2Handle, k: f32) -> Shape2Handle {
        if let Err(e) = require_positive(k, "smooth_intersect2 k") {
            return self.fail2(e);
        }
        Arc::new(SmoothIntersect2::new(a, b, k))
    }

    // -------------------------------------------------------------
    // Dimension-lifting
    // -------------------------------------------------------------

    #[must_use]
    pub fn extrude(&mut self, profile: Shape2Handle, height: f32) -> Shape3Handle {
        if let Err(e) = require_positive(height, "extrude height") {
            return self.fail3(e);
        }
        Arc::new(Extrude::new(profile, height))
    }

    #[must_use]
    pub fn revolve(&mut self, profile: Shape2Handle, offset: f32) -> Shape3Handle {
        if offset < 0.0 || !offset.is_finite() {
            return self.fail3(Error::InvalidDimension(format!("revolve offset must be non-negative and finite, got {offset}")));
        }
        Arc::new(Revolve::new(profile, offset))
    }
}

/// Returned in place of a real node when a constructor fails with panics
/// disabled. Evaluates to a constant zero everywhere and carries a
/// zero-sized box, so downstream composition can proceed without crashing;
/// its presence anywhere in a finished tree signals a construction error
/// that should have been caught via `Builder::err()`.
#[derive(Debug, Clone, Copy)]
struct Placeholder3;

impl Shape3 for Placeholder3 {
    fn append_name(&self, out: &mut String) {
        out.push_str("placeholder3");
    }

    fn append_body(&self, out: &mut String) {
        out.push_str("float placeholder3(vec3 p) { return 0.0; }\n");
    }

    fn bounds(&self) -> sdf_math::Box3 {
        sdf_math::Box3::cube(0.0)
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], _ctx: &mut EvalCtx3) -> Result<()> {
        let _ = positions;
        for d in distances.iter_mut() {
            *d = 0.0;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Placeholder2;

impl Shape2 for Placeholder2 {
    fn append_name(&self, out: &mut String) {
        out.push_str("placeholder2");
    }

    fn append_body(&self, out: &mut String) {
        out.push_str("float placeholder2(vec2 p) { return 0.0; }\n");
    }

    fn bounds(&self) -> sdf_math::Box2 {
        sdf_math::Box2::cube(0.0)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], _ctx: &mut EvalCtx2) -> Result<()> {
        let _ = positions;
        for d in distances.iter_mut() {
            *d = 0.0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_radius_panics_by_default() {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut b = Builder::new();
            b.sphere(-1.0);
        }));
        assert!(result.is_err());
    }

    #[test]
    fn negative_radius_accumulates_when_panics_disabled() {
        let mut b = Builder::with_flags(BuilderFlags::NO_DIMENSION_PANIC);
        let placeholder = b.sphere(-1.0);
        assert!(b.err().is_some());
        assert_eq!(placeholder.bounds(), sdf_math::Box3::cube(0.0));
    }

    #[test]
    fn clear_errors_empties_accumulator() {
        let mut b = Builder::with_flags(BuilderFlags::NO_DIMENSION_PANIC);
        b.sphere(-1.0);
        assert!(b.err().is_some());
        b.clear_errors();
        assert!(b.err().is_none());
    }

    #[test]
    fn union_of_one_child_is_an_error() {
        let mut b = Builder::with_flags(BuilderFlags::NO_DIMENSION_PANIC);
        let sphere = b.sphere(1.0);
        let _ = b.union(vec![sphere]);
        assert!(b.err().is_some());
    }

    #[test]
    fn box_round_exceeding_half_extent_is_rejected() {
        let mut b = Builder::with_flags(BuilderFlags::NO_DIMENSION_PANIC);
        let _ = b.boxed(1.0, 1.0, 1.0, 10.0);
        assert!(b.err().is_some());
    }

    #[test]
    fn rotate_with_zero_axis_is_rejected() {
        let mut b = Builder::with_flags(BuilderFlags::NO_DIMENSION_PANIC);
        let sphere = b.sphere(1.0);
        let _ = b.rotate(sphere, V3::ZERO, 1.0);
        assert!(b.err().is_some());
    }

    #[test]
    fn polygon_trims_self_closing_vertex() {
        let mut b = Builder::new();
        let verts = vec![
            V2::new(0.0, 0.0),
            V2::new(1.0, 0.0),
            V2::new(0.0, 1.0),
            V2::new(0.0, 0.0),
        ];
        let poly = b.polygon(verts);
        // three-vertex triangle, not a degenerate four-vertex ring
        assert_eq!(poly.name().contains("polygon_n3"), true);
    }

    #[test]
    fn valid_construction_leaves_no_errors() {
        let mut b = Builder::with_flags(BuilderFlags::NO_DIMENSION_PANIC);
        let sphere = b.sphere(1.0);
        let cube = b.boxed(1.0, 1.0, 1.0, 0.0);
        let _ = b.union(vec![sphere, cube]);
        assert!(b.err().is_none());
    }
}
