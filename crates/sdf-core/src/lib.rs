//! # SDF Core
//!
//! A constructive-solid-geometry library built from signed distance
//! functions: a shape DAG ([`shape`]) constructed through a validating
//! [`builder::Builder`], evaluated on the CPU ([`eval`]), and emitted to
//! GLSL shader source by the sibling `sdf-codegen` crate.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sdf_core::prelude::*;
//!
//! let mut b = Builder::new();
//! let sphere = b.sphere(1.0);
//! let cube = b.boxed(1.5, 1.5, 1.5, 0.1);
//! let shape = b.smooth_union(sphere, cube, 0.2);
//! assert!(b.err().is_none());
//!
//! let mut ctx = EvalCtx3::new();
//! let mut distances = vec![0.0];
//! shape.evaluate(&[V3::ZERO], &mut distances, &mut ctx)?;
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: arbitrary units (typically meters). `1.0` = 1 meter.
//! - **Angles**: radians throughout.
//! - **Precision**: `f32` everywhere, for GPU parity.
//! - **Coordinate system**: right-handed, Y-up.

pub mod builder;
pub mod eval;
pub mod shader_object;
pub mod shape;

mod error;

pub use error::{Error, Result};

/// Convenience re-exports for consumers of this crate.
pub mod prelude {
    pub use crate::builder::{Builder, BuilderFlags, DEFAULT_SHADER_BUFFER_THRESHOLD};

    pub use crate::shape::{Shape2, Shape2Handle, Shape3, Shape3Handle};

    pub use crate::eval::{EvalCtx2, EvalCtx3, Sdf2, Sdf3, ScratchPool};

    pub use crate::shader_object::{BufferObject, ElementType, HelperFunction, ShaderObject};

    pub use sdf_math::{Box2, Box3, Mat2, Mat3, Mat4, Quat, V2, V3};

    pub use crate::{Error, Result};
}
