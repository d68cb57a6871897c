//! The three emission entry points: compute-SDF3, compute-SDF2, and
//! the fragment visualizer. All three share [`crate::assemble::assemble`];
//! they differ only in which template stitches the pieces together and
//! whether bulk buffers are permitted.

use std::io::Write;

use sdf_core::shader_object::BufferObject;
use sdf_core::shape::shims::{NameOverrideShape2, NameOverrideShape3};
use sdf_core::shape::{Shape2, Shape2Handle, Shape3, Shape3Handle};
use sdf_math::{fold_to_u32, hash_str, hash_str_seeded};

use crate::assemble::assemble;
use crate::error::{EmitError, EmitFailure, Result};
use crate::node::{bfs_collect, AnyNode};
use crate::templates::{render_compute_sdf2, render_compute_sdf3, render_frag_visualizer_sdf3};

/// Default work-group width along X, used by the compute templates'
/// `local_size_x` layout qualifier unless overridden on the emitter.
pub const DEFAULT_LOCAL_SIZE_X: u32 = 32;

/// Default identifier budget past which the name-shortening pass
/// wraps a node in a [`NameOverrideShape3`]/[`NameOverrideShape2`]. GLSL
/// itself has no mandated identifier length limit; this default is chosen
/// to keep generated identifiers comfortably inside every known driver's
/// practical limit (most enforce 1024 bytes; content-hash names for deep
/// trees can otherwise run into the thousands of characters).
pub const DEFAULT_MAX_NAME_LEN: usize = 512;

/// Prefix length kept from the original name when minting a short alias:
/// `<prefix-of-original-name><32-bit-hash-of-name-and-body>`.
const SHORTEN_PREFIX_LEN: usize = 24;

/// Result of a successful emission: the assembled program text's length (in
/// bytes, as written to the caller's `w`) and the buffer objects the
/// consumer must upload before dispatch, each with its assigned binding.
pub struct EmitOutcome {
    pub bytes_written: usize,
    pub objects: Vec<BufferObject>,
}

/// Emission configuration. Constructed once and reused across trees; holds
/// no per-call state.
#[derive(Debug, Clone, Copy)]
pub struct Emitter {
    local_size_x: u32,
    max_name_len: Option<usize>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            local_size_x: DEFAULT_LOCAL_SIZE_X,
            max_name_len: Some(DEFAULT_MAX_NAME_LEN),
        }
    }
}

impl Emitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_local_size_x(mut self, local_size_x: u32) -> Self {
        self.local_size_x = local_size_x;
        self
    }

    /// Disable the name-shortening pass entirely.
    #[must_use]
    pub fn without_name_shortening(mut self) -> Self {
        self.max_name_len = None;
        self
    }

    #[must_use]
    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = Some(max_name_len);
        self
    }

    /// Emit a compute program evaluating `root` over a 3D positions buffer.
    pub fn write_compute_sdf3(
        &self,
        w: &mut impl Write,
        root: &Shape3Handle,
    ) -> Result<EmitOutcome> {
        let (root, name) = self.shorten_root3(root);
        self.write(w, AnyNode::D3(root), &name, false, |assembled, root_name| {
            render_compute_sdf3(assembled, root_name, self.local_size_x)
        })
    }

    /// 2D analogue of [`Emitter::write_compute_sdf3`].
    pub fn write_compute_sdf2(
        &self,
        w: &mut impl Write,
        root: &Shape2Handle,
    ) -> Result<EmitOutcome> {
        let (root, name) = self.shorten_root2(root);
        self.write(w, AnyNode::D2(root), &name, false, |assembled, root_name| {
            render_compute_sdf2(assembled, root_name, self.local_size_x)
        })
    }

    /// Emit SDF declarations plus a fixed ray-marching fragment shader for
    /// `root`. Any bulk buffer dependency anywhere in the tree is rejected:
    /// the visualizer has no way to bind one.
    pub fn write_frag_visualizer_sdf3(
        &self,
        w: &mut impl Write,
        root: &Shape3Handle,
    ) -> Result<EmitOutcome> {
        let (root, name) = self.shorten_root3(root);
        self.write(w, AnyNode::D3(root), &name, true, |assembled, root_name| {
            render_frag_visualizer_sdf3(assembled, root_name)
        })
    }

    fn write(
        &self,
        w: &mut impl Write,
        root: AnyNode,
        root_name: &str,
        reject_buffers: bool,
        render: impl FnOnce(&crate::assemble::Assembled, &str) -> String,
    ) -> Result<EmitOutcome> {
        let order = bfs_collect(root);
        let assembled = assemble(&order, reject_buffers).map_err(|e| EmitFailure {
            bytes_written: 0,
            source: EmitError::Shape(e),
        })?;
        let source = render(&assembled, root_name);

        w.write_all(source.as_bytes())
            .map_err(|e| EmitFailure {
                bytes_written: 0,
                source: EmitError::Io(e),
            })?;

        Ok(EmitOutcome {
            bytes_written: source.len(),
            objects: assembled.objects,
        })
    }

    /// Wrap `root` in a [`NameOverrideShape3`] if its emitted name exceeds
    /// the configured budget, returning the (possibly wrapped) handle and
    /// the name the caller should invoke it by.
    ///
    /// Only the *root* is a candidate: an interior node's over-long name is
    /// baked into its parent's already-constructed body text (the parent
    /// holds an owned handle to the original, unwrapped child and calls
    /// `child.name()` once at construction), so shortening an interior node
    /// after the fact cannot change what its parent's body calls — doing
    /// that generically would need every one of the ~20 node variants to
    /// support rebuilding itself with a substituted child, which no variant
    /// exposes today. The root is the one name actually observed outside
    /// the tree (the program's `main()` calls it directly), so it's the one
    /// place shortening has an externally visible effect; see DESIGN.md.
    fn shorten_root3(&self, root: &Shape3Handle) -> (Shape3Handle, String) {
        let name = root.name();
        match self.max_name_len {
            Some(max) if name.len() > max => {
                let short = short_alias(&name, &root.body());
                let wrapped: Shape3Handle =
                    std::sync::Arc::new(NameOverrideShape3::new(root.clone(), short.clone()));
                (wrapped, short)
            }
            _ => (root.clone(), name),
        }
    }

    fn shorten_root2(&self, root: &Shape2Handle) -> (Shape2Handle, String) {
        let name = root.name();
        match self.max_name_len {
            Some(max) if name.len() > max => {
                let short = short_alias(&name, &root.body());
                let wrapped: Shape2Handle =
                    std::sync::Arc::new(NameOverrideShape2::new(root.clone(), short.clone()));
                (wrapped, short)
            }
            _ => (root.clone(), name),
        }
    }
}

/// `<prefix-of-original-name><32-bit-hash-of-name-and-body>`.
fn short_alias(name: &str, body: &str) -> String {
    let h_name = hash_str(name);
    let h_body = hash_str_seeded(body, h_name);
    let prefix_len = name.len().min(SHORTEN_PREFIX_LEN);
    format!("{}_{:08x}", &name[..prefix_len], fold_to_u32(h_body))
}
