//! Caching and renaming shims: nodes that wrap another node without changing
//! its geometry.
//!
//! [`CachedShape3D`]/[`CachedShape2D`] snapshot name/body/bounds into owned
//! buffers so a node that recomputes those strings expensively (e.g. a deep
//! subtree whose name is the concatenation of every descendant's name) only
//! pays for it once. [`NameOverrideShape3`]/[`NameOverrideShape2`] are what
//! the code emitter's name-shortening pass reaches for when a node's
//! content-hash name would overflow a GLSL identifier budget: it mints a
//! short name and emits a one-line forwarding function, leaving the
//! original (long-named) function exactly as the rest of the tree already
//! calls it.

use sdf_math::{Box2, Box3, V2, V3};

use crate::error::Result;
use crate::eval::{EvalCtx2, EvalCtx3};
use crate::shader_object::ShaderObject;
use crate::shape::{Shape2, Shape2Handle, Shape3, Shape3Handle};

/// Freezes a 3D node's `name`/`body`/`bounds` into owned buffers.
#[derive(Debug, Clone)]
pub struct CachedShape3D {
    inner: Shape3Handle,
    name: String,
    body: String,
    bounds: Box3,
}

impl CachedShape3D {
    #[must_use]
    pub fn new(inner: Shape3Handle) -> Self {
        // Collapse nested caches instead of stacking snapshot layers: the
        // innermost cache is already authoritative, re-snapshotting it is a
        // no-op modulo one extra clone.
        let inner = match inner.as_ref().as_any().downcast_ref::<CachedShape3D>() {
            Some(cached) => cached.inner.clone(),
            None => inner,
        };
        let mut shape = Self {
            inner,
            name: String::new(),
            body: String::new(),
            bounds: Box3::new(V3::ZERO, V3::ZERO),
        };
        shape.refresh_cache();
        shape
    }

    /// Recompute the cached name/body/bounds from the wrapped node. Callers
    /// only need this if the wrapped node is itself mutated in place, which
    /// nothing in this crate does today — nodes are immutable once built.
    pub fn refresh_cache(&mut self) {
        self.name = self.inner.name();
        self.body = self.inner.body();
        self.bounds = self.inner.bounds();
    }
}

impl Shape3 for CachedShape3D {
    fn append_name(&self, out: &mut String) {
        out.push_str(&self.name);
    }

    fn append_body(&self, out: &mut String) {
        out.push_str(&self.body);
    }

    fn append_shader_objects(&self, out: &mut Vec<ShaderObject>) {
        self.inner.append_shader_objects(out);
    }

    fn bounds(&self) -> Box3 {
        self.bounds
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        self.inner.children3()
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        self.inner.children2()
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        self.inner.evaluate(positions, distances, ctx)
    }
}

/// 2D analogue of [`CachedShape3D`].
#[derive(Debug, Clone)]
pub struct CachedShape2D {
    inner: Shape2Handle,
    name: String,
    body: String,
    bounds: Box2,
}

impl CachedShape2D {
    #[must_use]
    pub fn new(inner: Shape2Handle) -> Self {
        let inner = match inner.as_ref().as_any().downcast_ref::<CachedShape2D>() {
            Some(cached) => cached.inner.clone(),
            None => inner,
        };
        let mut shape = Self {
            inner,
            name: String::new(),
            body: String::new(),
            bounds: Box2::new(V2::ZERO, V2::ZERO),
        };
        shape.refresh_cache();
        shape
    }

    pub fn refresh_cache(&mut self) {
        self.name = self.inner.name();
        self.body = self.inner.body();
        self.bounds = self.inner.bounds();
    }
}

impl Shape2 for CachedShape2D {
    fn append_name(&self, out: &mut String) {
        out.push_str(&self.name);
    }

    fn append_body(&self, out: &mut String) {
        out.push_str(&self.body);
    }

    fn append_shader_objects(&self, out: &mut Vec<ShaderObject>) {
        self.inner.append_shader_objects(out);
    }

    fn bounds(&self) -> Box2 {
        self.bounds
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        self.inner.children2()
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        self.inner.evaluate(positions, distances, ctx)
    }
}

/// Overrides only the emitted name, forwarding to the (unrenamed) inner
/// node's function rather than re-emitting its body. Used by the emitter to
/// shorten an over-long content-hash name without disturbing the original
/// function any other node in the tree already calls by that long name.
#[derive(Debug, Clone)]
pub struct NameOverrideShape3 {
    inner: Shape3Handle,
    override_name: String,
}

impl NameOverrideShape3 {
    #[must_use]
    pub fn new(inner: Shape3Handle, override_name: impl Into<String>) -> Self {
        // Idempotent: renaming an already-renamed node replaces the override
        // rather than stacking forwarding shims two deep.
        let inner = match inner.as_ref().as_any().downcast_ref::<NameOverrideShape3>() {
            Some(prior) => prior.inner.clone(),
            None => inner,
        };
        Self {
            inner,
            override_name: override_name.into(),
        }
    }
}

impl Shape3 for NameOverrideShape3 {
    fn append_name(&self, out: &mut String) {
        out.push_str(&self.override_name);
    }

    fn append_body(&self, out: &mut String) {
        out.push_str(&format!(
            "float {short}(vec3 p) {{ return {long}(p); }}\n",
            short = self.override_name,
            long = self.inner.name(),
        ));
    }

    fn append_shader_objects(&self, out: &mut Vec<ShaderObject>) {
        self.inner.append_shader_objects(out);
    }

    fn bounds(&self) -> Box3 {
        self.inner.bounds()
    }

    fn children3(&self) -> Vec<Shape3Handle> {
        vec![self.inner.clone()]
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        Vec::new()
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        self.inner.evaluate(positions, distances, ctx)
    }
}

/// 2D analogue of [`NameOverrideShape3`].
#[derive(Debug, Clone)]
pub struct NameOverrideShape2 {
    inner: Shape2Handle,
    override_name: String,
}

impl NameOverrideShape2 {
    #[must_use]
    pub fn new(inner: Shape2Handle, override_name: impl Into<String>) -> Self {
        let inner = match inner.as_ref().as_any().downcast_ref::<NameOverrideShape2>() {
            Some(prior) => prior.inner.clone(),
            None => inner,
        };
        Self {
            inner,
            override_name: override_name.into(),
        }
    }
}

impl Shape2 for NameOverrideShape2 {
    fn append_name(&self, out: &mut String) {
        out.push_str(&self.override_name);
    }

    fn append_body(&self, out: &mut String) {
        out.push_str(&format!(
            "float {short}(vec2 p) {{ return {long}(p); }}\n",
            short = self.override_name,
            long = self.inner.name(),
        ));
    }

    fn append_shader_objects(&self, out: &mut Vec<ShaderObject>) {
        self.inner.append_shader_objects(out);
    }

    fn bounds(&self) -> Box2 {
        self.inner.bounds()
    }

    fn children2(&self) -> Vec<Shape2Handle> {
        vec![self.inner.clone()]
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        self.inner.evaluate(positions, distances, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::primitives3::Sphere;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn cached_shape_preserves_name_and_bounds() {
        let sphere: Shape3Handle = Arc::new(Sphere::new(1.5));
        let cached = CachedShape3D::new(sphere.clone());
        assert_eq!(cached.name(), sphere.name());
        assert_eq!(cached.bounds(), sphere.bounds());
    }

    #[test]
    fn cached_shape_collapses_nested_wraps() {
        let sphere: Shape3Handle = Arc::new(Sphere::new(1.0));
        let once = Arc::new(CachedShape3D::new(sphere.clone())) as Shape3Handle;
        let twice = CachedShape3D::new(once);
        assert_eq!(twice.name(), sphere.name());
    }

    #[test]
    fn name_override_forwards_to_original_function() {
        let sphere: Shape3Handle = Arc::new(Sphere::new(1.0));
        let renamed = NameOverrideShape3::new(sphere.clone(), "s_short");
        assert_eq!(renamed.name(), "s_short");
        assert!(renamed.body().contains(&sphere.name()));
    }

    #[test]
    fn name_override_is_idempotent_when_rewrapped() {
        let sphere: Shape3Handle = Arc::new(Sphere::new(1.0));
        let once = Arc::new(NameOverrideShape3::new(sphere.clone(), "a")) as Shape3Handle;
        let twice = NameOverrideShape3::new(once, "b");
        assert_eq!(twice.name(), "b");
        assert_eq!(twice.inner.name(), sphere.name());
    }

    #[test]
    fn name_override_evaluates_identically_to_inner() {
        let sphere: Shape3Handle = Arc::new(Sphere::new(1.0));
        let renamed = NameOverrideShape3::new(sphere.clone(), "s_short");
        let mut ctx = EvalCtx3::new();
        let positions = vec![V3::new(0.3, 0.0, 0.0)];
        let mut direct = vec![0.0];
        let mut via_rename = vec![0.0];
        sphere.evaluate(&positions, &mut direct, &mut ctx).unwrap();
        renamed.evaluate(&positions, &mut via_rename, &mut ctx).unwrap();
        assert_relative_eq!(direct[0], via_rename[0], epsilon = 1e-6);
    }
}
