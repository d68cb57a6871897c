//! Scratch pool and evaluator traits (C4, C8).
//!
//! The CPU evaluator never allocates from the global allocator on the hot
//! path; every temporary buffer a composition needs is borrowed from a
//! [`ScratchPool`] attached to the call's [`EvalCtx2`]/[`EvalCtx3`] and
//! returned when the borrowing operator is done with it.

use sdf_math::{Box2, Box3, V2, V3};

use crate::error::Result;

fn acquire<T: Default + Clone>(free: &mut Vec<Vec<T>>, len: usize) -> Vec<T> {
    if let Some(pos) = free.iter().rposition(|b| b.len() == len) {
        free.remove(pos)
    } else {
        vec![T::default(); len]
    }
}

/// Three LIFO free-lists, one per element type the evaluator borrows:
/// `f32` (distance buffers), `V2` (2D sample points), `V3` (3D sample
/// points). Buffers are zeroed on first acquire; reused buffers are handed
/// back with whatever stale contents they held, since every caller
/// overwrites every slot before reading it back.
#[derive(Debug, Default)]
pub struct ScratchPool {
    f32_free: Vec<Vec<f32>>,
    v2_free: Vec<Vec<V2>>,
    v3_free: Vec<Vec<V3>>,
}

impl ScratchPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn acquire_f32(&mut self, len: usize) -> Vec<f32> {
        acquire(&mut self.f32_free, len)
    }

    pub fn release_f32(&mut self, buf: Vec<f32>) {
        self.f32_free.push(buf);
    }

    #[must_use]
    pub fn acquire_v2(&mut self, len: usize) -> Vec<V2> {
        acquire(&mut self.v2_free, len)
    }

    pub fn release_v2(&mut self, buf: Vec<V2>) {
        self.v2_free.push(buf);
    }

    #[must_use]
    pub fn acquire_v3(&mut self, len: usize) -> Vec<V3> {
        acquire(&mut self.v3_free, len)
    }

    pub fn release_v3(&mut self, buf: Vec<V3>) {
        self.v3_free.push(buf);
    }
}

/// Evaluation context for the 3D backend: owns the pool every operator
/// along the call chain borrows scratch buffers from.
#[derive(Debug, Default)]
pub struct EvalCtx3 {
    pub pool: ScratchPool,
}

impl EvalCtx3 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// 2D analogue of [`EvalCtx3`].
#[derive(Debug, Default)]
pub struct EvalCtx2 {
    pub pool: ScratchPool,
}

impl EvalCtx2 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// External evaluator interface: the only contract a downstream consumer
/// (e.g. a mesher) needs against a 3D shape.
pub trait Sdf3 {
    fn bounds(&self) -> Box3;
    fn evaluate(&self, positions: &[V3], distances: &mut [f32], ctx: &mut EvalCtx3) -> Result<()>;
}

/// 2D analogue of [`Sdf3`].
pub trait Sdf2 {
    fn bounds(&self) -> Box2;
    fn evaluate(&self, positions: &[V2], distances: &mut [f32], ctx: &mut EvalCtx2) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_zeroes_fresh_buffer() {
        let mut pool = ScratchPool::new();
        let buf = pool.acquire_f32(4);
        assert_eq!(buf, vec![0.0; 4]);
    }

    #[test]
    fn release_then_acquire_reuses_allocation() {
        let mut pool = ScratchPool::new();
        let buf = pool.acquire_v3(3);
        let ptr = buf.as_ptr();
        pool.release_v3(buf);
        let buf2 = pool.acquire_v3(3);
        assert_eq!(buf2.as_ptr(), ptr);
    }

    #[test]
    fn mismatched_length_allocates_fresh() {
        let mut pool = ScratchPool::new();
        let buf = pool.acquire_v2(2);
        pool.release_v2(buf);
        let buf2 = pool.acquire_v2(5);
        assert_eq!(buf2.len(), 5);
    }
}
