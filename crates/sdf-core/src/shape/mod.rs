//! Shape tree: the sealed set of 2D/3D nodes the builder constructs.
//!
//! Every node is an owned, immutable handle; operators hold owned handles to
//! their children (never raw pointers, never `&`), so the tree can be shared
//! cheaply by cloning an `Arc` without ever mutating a shared subtree. The
//! four-method contract (`append_name`, `append_body`, `append_shader_objects`,
//! `bounds`) plus child iteration is what the code emitter walks; `evaluate`
//! is what the CPU evaluator calls.

pub mod extrude_revolve;
pub mod ops2;
pub mod ops3;
pub mod primitives2;
pub mod primitives3;
pub mod shims;

use std::sync::Arc;

use sdf_math::{Box2, Box3, V2, V3};

use crate::eval::{EvalCtx2, EvalCtx3};
use crate::error::Result;
use crate::shader_object::ShaderObject;

/// Shared handle to a 3D shape node. `Arc` (not `Box`) because operators
/// flatten and re-share subtrees (e.g. union flattening keeps the original
/// child handles rather than deep-cloning them).
pub type Shape3Handle = Arc<dyn Shape3>;

/// Shared handle to a 2D shape node.
pub type Shape2Handle = Arc<dyn Shape2>;

/// The shape contract for a 3D node.
pub trait Shape3: Send + Sync + std::fmt::Debug + 'static {
    /// Append this node's unique, content-derived, GLSL-identifier-safe
    /// name. Pure function of the node's own parameters and its children's
    /// *names* (never their bodies).
    fn append_name(&self, out: &mut String);

    /// Append this node's GLSL function body text. May reference a child by
    /// calling `<childName>(p)`; must never inline the child's body.
    fn append_body(&self, out: &mut String);

    /// Append any bulk buffers or helper functions this node (not its
    /// children) contributes to emission.
    fn append_shader_objects(&self, _out: &mut Vec<ShaderObject>) {}

    /// Conservative bounding box: every point strictly outside it evaluates
    /// to a positive distance.
    fn bounds(&self) -> Box3;

    /// Direct 3D children, for emitter traversal.
    fn children3(&self) -> Vec<Shape3Handle> {
        Vec::new()
    }

    /// Direct 2D children (extrude/revolve), for emitter traversal.
    fn children2(&self) -> Vec<Shape2Handle> {
        Vec::new()
    }

    /// CPU evaluation.
    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()>;

    /// Computed name, for callers that just need the string once.
    fn name(&self) -> String {
        let mut s = String::new();
        self.append_name(&mut s);
        s
    }

    /// Computed body, for callers that just need the string once.
    fn body(&self) -> String {
        let mut s = String::new();
        self.append_body(&mut s);
        s
    }

    /// Type-erased downcast seam, used by [`crate::shape::ops3::Union3::new`]
    /// to detect and flatten nested unions. Every implementor gets this for
    /// free; nothing downstream needs to override it.
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// The shape contract for a 2D node; mirrors [`Shape3`].
pub trait Shape2: Send + Sync + std::fmt::Debug + 'static {
    fn append_name(&self, out: &mut String);
    fn append_body(&self, out: &mut String);
    fn append_shader_objects(&self, _out: &mut Vec<ShaderObject>) {}
    fn bounds(&self) -> Box2;
    fn children2(&self) -> Vec<Shape2Handle> {
        Vec::new()
    }
    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()>;

    fn name(&self) -> String {
        let mut s = String::new();
        self.append_name(&mut s);
        s
    }

    fn body(&self) -> String {
        let mut s = String::new();
        self.append_body(&mut s);
        s
    }

    /// Type-erased downcast seam; mirrors [`Shape3::as_any`].
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl crate::eval::Sdf3 for dyn Shape3 {
    fn bounds(&self) -> Box3 {
        Shape3::bounds(self)
    }

    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()> {
        Shape3::evaluate(self, positions, distances, ctx)
    }
}

impl crate::eval::Sdf2 for dyn Shape2 {
    fn bounds(&self) -> Box2 {
        Shape2::bounds(self)
    }

    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()> {
        Shape2::evaluate(self, positions, distances, ctx)
    }
}
