//! Math kernels shared by the SDF CPU evaluator and GPU code emitter.
//!
//! Provides the vector/matrix aliases (`V2`/`V3`), axis-aligned box algebra
//! (`Box2`/`Box3`), the deterministic content hash used for name/body
//! deduplication, and the deterministic float formatting that keeps emitted
//! shader literals and identifiers identical across runs.

mod bbox;
mod fmt;
mod hash;
mod scalar;
mod vector;

pub use bbox::{Box2, Box3};
pub use fmt::{DEFAULT_NAME_SUBSTITUTIONS, format_float, format_float_for_name, name_encode_float};
pub use hash::{fold_to_u32, hash64, hash64_seeded, hash_str, hash_str_seeded};
pub use scalar::{glsl_sign, glsl_sign2, glsl_sign3, mix};
pub use vector::{Mat2, Mat3, Mat4, Quat, V2, V3};
