//! Error types for the shape tree, builder, and evaluator.
//!
//! Construction-time errors either panic (default) or accumulate in the
//! [`crate::builder::Builder`], depending on its `NO_DIMENSION_PANIC` flag.
//! Evaluator and emission errors always propagate as `Result`.

use thiserror::Error;

/// Result type alias used throughout `sdf-core`.
pub type Result<T> = std::result::Result<T, Error>;

/// Every error this crate's public surface can raise.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A length, radius, or count is non-positive, non-finite, or exceeds a
    /// structural limit (e.g. rounding radius greater than half the
    /// smallest extent).
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    /// Degenerate geometric input: too few distinct vertices, repeated
    /// points, NaN coordinates, a singular transform.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// A composition operator received a null/placeholder operand where a
    /// real child was required.
    #[error("nil child: {0}")]
    NilChild(String),

    /// Two distinct nodes produced the same emitted function or buffer name
    /// with different bodies/payloads.
    #[error("emission name collision on `{name}`:\n--- first ---\n{first_body}\n--- second ---\n{second_body}")]
    EmissionNameCollision {
        name: String,
        first_body: String,
        second_body: String,
    },

    /// A shader object's binding slot was not `-1` at emission time — the
    /// same object descriptor was consumed twice without being reset.
    #[error("binding conflict on shader object `{0}`: already assigned a binding slot")]
    EmissionBindingConflict(String),

    /// The visualizer emission path was asked to serialize a tree whose
    /// subtree requires bulk data buffers, which the visualizer ABI forbids.
    #[error("visualizer emission rejected bulk buffer `{0}`: only bindings 0/1 are permitted")]
    VisualizerBufferRejection(String),

    /// A node was asked to evaluate on a backend it has no implementation
    /// for (e.g. a construction-error placeholder with no real SDF body).
    #[error("no evaluator implementation for node: {0}")]
    EvaluatorTypeMismatch(String),

    /// Several errors accumulated by a [`crate::builder::Builder`] with
    /// panics disabled, joined together. `message` is precomputed so
    /// `Display` never has to re-walk `errors`.
    #[error("{message}")]
    Multi {
        message: String,
        errors: Vec<Error>,
    },
}

impl Error {
    /// Join a list of errors into one, matching the builder's `err()`
    /// contract of returning "the join of all accumulated errors". Returns
    /// `None` for an empty list and the bare error for a single one.
    #[must_use]
    pub fn join(mut errors: Vec<Error>) -> Option<Error> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => {
                let message = format!(
                    "{} accumulated error(s):\n{}",
                    errors.len(),
                    errors
                        .iter()
                        .map(std::string::ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("\n")
                );
                Some(Error::Multi { message, errors })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_empty_is_none() {
        assert!(Error::join(vec![]).is_none());
    }

    #[test]
    fn join_single_is_unwrapped() {
        let e = Error::join(vec![Error::InvalidDimension("x".into())]);
        assert!(matches!(e, Some(Error::InvalidDimension(_))));
    }

    #[test]
    fn join_multiple_is_multi() {
        let e = Error::join(vec![
            Error::InvalidDimension("a".into()),
            Error::NilChild("b".into()),
        ]);
        assert!(matches!(e, Some(Error::Multi { errors, .. }) if errors.len() == 2));
    }
}
