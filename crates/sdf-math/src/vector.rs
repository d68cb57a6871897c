//! 2D/3D vector types.
//!
//! `V2`/`V3` are plain aliases over `glam`'s `f32` vectors rather than a
//! hand-rolled vector type. GLSL's zero-preserving `sign()` has no
//! equivalent on `glam`'s types (`signum` never returns `0.0`); that helper
//! lives in [`crate::scalar`] instead, since it needs to match GLSL bit for
//! bit rather than read like a `glam` extension.

pub use glam::{Mat2, Mat3, Mat4, Quat, Vec2 as V2, Vec3 as V3};
