//! A dimension-erased view over [`Shape3Handle`]/[`Shape2Handle`] so the
//! emitter's traversal, dedup, and binding-assignment logic (all dimension
//! agnostic) is written once instead of twice.

use std::collections::VecDeque;

use sdf_core::shader_object::ShaderObject;
use sdf_core::shape::{Shape2, Shape2Handle, Shape3, Shape3Handle};

/// One node reachable from an emission root, in whichever dimension it was
/// constructed. 3D-from-2D nodes (extrude/revolve) surface their 2D source
/// through [`AnyNode::children`] exactly as their `children2` iterator does.
#[derive(Clone)]
pub enum AnyNode {
    D3(Shape3Handle),
    D2(Shape2Handle),
}

impl AnyNode {
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            AnyNode::D3(n) => n.name(),
            AnyNode::D2(n) => n.name(),
        }
    }

    #[must_use]
    pub fn body(&self) -> String {
        match self {
            AnyNode::D3(n) => n.body(),
            AnyNode::D2(n) => n.body(),
        }
    }

    #[must_use]
    pub fn shader_objects(&self) -> Vec<ShaderObject> {
        let mut out = Vec::new();
        match self {
            AnyNode::D3(n) => n.append_shader_objects(&mut out),
            AnyNode::D2(n) => n.append_shader_objects(&mut out),
        }
        out
    }

    /// Direct children, 3D before 2D, matching `Shape3::children3`/`children2`'s
    /// own declared order.
    #[must_use]
    pub fn children(&self) -> Vec<AnyNode> {
        match self {
            AnyNode::D3(n) => {
                let mut out: Vec<AnyNode> = n.children3().into_iter().map(AnyNode::D3).collect();
                out.extend(n.children2().into_iter().map(AnyNode::D2));
                out
            }
            AnyNode::D2(n) => n.children2().into_iter().map(AnyNode::D2).collect(),
        }
    }
}

/// Breadth-first enumeration from `root`, collecting every descendant.
/// Does not deduplicate by content — the same node may
/// appear more than once if it is shared by more than one parent; emission
/// dedup is a separate, later pass over this list.
#[must_use]
pub fn bfs_collect(root: AnyNode) -> Vec<AnyNode> {
    let mut order = Vec::new();
    let mut queue = VecDeque::new();
    queue.push_back(root);
    while let Some(node) = queue.pop_front() {
        let children = node.children();
        order.push(node);
        for child in children {
            queue.push_back(child);
        }
    }
    order
}
