//! Emission errors: either a shape-algebra error raised while walking
//! the tree (name/binding collisions, visualizer buffer rejection) or an
//! I/O error from the caller-supplied writer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error(transparent)]
    Shape(#[from] sdf_core::Error),

    #[error("io error during emission: {0}")]
    Io(#[from] std::io::Error),
}

/// Emission aborts on the first error and returns with a partial write
/// count; the caller must discard the output. `bytes_written` is how much
/// of the assembled program text had already been written to the caller's
/// `w` before the failure was detected.
#[derive(Error, Debug)]
#[error("emission failed after {bytes_written} byte(s): {source}")]
pub struct EmitFailure {
    pub bytes_written: usize,
    #[source]
    pub source: EmitError,
}

pub type Result<T> = std::result::Result<T, EmitFailure>;
