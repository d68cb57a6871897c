//! Scalar helpers kept separate from `glam` because they must match GLSL
//! semantics exactly, not Rust's.

use crate::vector::{V2, V3};

/// `sign(x)` the way GLSL defines it: `-1`/`0`/`1`, with an honest zero.
///
/// `f32::signum` (used by `glam`'s `Vec3::signum`) never returns `0.0` — it
/// returns `1.0` for `+0.0`. The array/circular-array repetition formulas use
/// `sign` to pick a neighbor-tile direction, and the emitted GLSL uses the
/// built-in `sign()`, so the CPU evaluator must reproduce GLSL's zero case
/// bit-for-bit to stay within the CPU/GPU agreement tolerance at tile
/// boundaries.
#[must_use]
pub fn glsl_sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Component-wise [`glsl_sign`] for `V2`.
#[must_use]
pub fn glsl_sign2(v: V2) -> V2 {
    V2::new(glsl_sign(v.x), glsl_sign(v.y))
}

/// Component-wise [`glsl_sign`] for `V3`.
#[must_use]
pub fn glsl_sign3(v: V3) -> V3 {
    V3::new(glsl_sign(v.x), glsl_sign(v.y), glsl_sign(v.z))
}

/// `mix(a, b, t)` as GLSL spells `lerp`.
#[must_use]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_of_zero_is_zero() {
        assert_eq!(glsl_sign(0.0), 0.0);
        assert_eq!(glsl_sign(-0.0), 0.0);
    }

    #[test]
    fn sign_matches_rust_away_from_zero() {
        assert_eq!(glsl_sign(4.0), 1.0_f32.signum());
        assert_eq!(glsl_sign(-4.0), (-1.0_f32).signum());
    }

    #[test]
    fn mix_interpolates() {
        assert!((mix(0.0, 10.0, 0.5) - 5.0).abs() < 1e-6);
    }
}
