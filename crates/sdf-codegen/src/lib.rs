//! # SDF Codegen
//!
//! The GLSL code emitter (C5) and shader object registry glue (C6) for the
//! SDF shape algebra. Given a root [`sdf_core::shape::Shape3`] or
//! [`sdf_core::shape::Shape2`], [`Emitter`] walks the tree once, emits one
//! GLSL function per distinct node (by content hash), resolves shader
//! object bindings, and assembles a complete compute or fragment program.
//!
//! ## Entry points
//!
//! - [`Emitter::write_compute_sdf3`] / [`Emitter::write_compute_sdf2`] —
//!   compute shaders that evaluate the root SDF against a positions buffer.
//! - [`Emitter::write_frag_visualizer_sdf3`] — SDF declarations plus a
//!   fixed ray-marching fragment shader; rejects any tree that needs a bulk
//!   data buffer.

mod assemble;
mod emitter;
mod error;
mod node;
mod templates;

pub use emitter::{EmitOutcome, Emitter, DEFAULT_LOCAL_SIZE_X, DEFAULT_MAX_NAME_LEN};
pub use error::{EmitError, EmitFailure, Result};
pub use node::{bfs_collect, AnyNode};
