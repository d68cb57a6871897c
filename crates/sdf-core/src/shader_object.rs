//! Shader objects: the GPU-side payloads a shape tree can reference.
//!
//! A node that needs more data than fits comfortably as inline scalar
//! literals (a polygon's vertex list, a `lines` segment array) packs it into
//! a read-only buffer instead. [`ShaderObject`] is the descriptor the emitter
//! collects while walking the tree; [`crate::shape::Shape3`]/`Shape2` push
//! these via `append_shader_objects`.

use sdf_math::{V2, V3};

/// GLSL element type for a bulk buffer. Only the variants `sdf-core`
/// actually emits are listed; a richer element-type matrix (f64, integer
/// vectors) can be added once a constructor here needs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    F32,
    V2,
    V3,
}

impl ElementType {
    /// The GLSL type name used in a buffer's layout declaration.
    #[must_use]
    pub const fn glsl_name(self) -> &'static str {
        match self {
            ElementType::F32 => "float",
            ElementType::V2 => "vec2",
            ElementType::V3 => "vec3",
        }
    }
}

/// A bulk, read-only data buffer a node references (e.g. a polygon's vertex
/// list). Identity for dedup is `(name_hash, kind, payload_hash)`; two
/// buffers with the same name hash are considered the same object only if
/// their element type and payload also match byte-for-byte.
#[derive(Debug, Clone)]
pub struct BufferObject {
    /// Name used both as the GLSL array identifier and the `<name>Buffer`
    /// block name. Editable by the name-shortening pass.
    pub name: String,
    pub element_type: ElementType,
    /// Raw payload, already flattened to the wire representation
    /// (`bytemuck::cast_slice` of `f32`/`V2`/`V3`).
    pub payload: Vec<u8>,
    /// `-1` until C5 assigns it during program assembly.
    pub binding: i32,
}

impl BufferObject {
    #[must_use]
    pub fn new_f32(name: impl Into<String>, data: &[f32]) -> Self {
        Self {
            name: name.into(),
            element_type: ElementType::F32,
            payload: bytemuck::cast_slice(data).to_vec(),
            binding: -1,
        }
    }

    #[must_use]
    pub fn new_v2(name: impl Into<String>, data: &[V2]) -> Self {
        let flat: Vec<[f32; 2]> = data.iter().map(|v| v.to_array()).collect();
        Self {
            name: name.into(),
            element_type: ElementType::V2,
            payload: bytemuck::cast_slice(&flat).to_vec(),
            binding: -1,
        }
    }

    #[must_use]
    pub fn new_v3(name: impl Into<String>, data: &[V3]) -> Self {
        let flat: Vec<[f32; 3]> = data.iter().map(|v| v.to_array()).collect();
        Self {
            name: name.into(),
            element_type: ElementType::V3,
            payload: bytemuck::cast_slice(&flat).to_vec(),
            binding: -1,
        }
    }

    /// Number of elements in the buffer (not bytes).
    #[must_use]
    pub fn len(&self) -> usize {
        let stride = match self.element_type {
            ElementType::F32 => std::mem::size_of::<f32>(),
            ElementType::V2 => std::mem::size_of::<[f32; 2]>(),
            ElementType::V3 => std::mem::size_of::<[f32; 3]>(),
        };
        self.payload.len() / stride
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// A helper function whose raw GLSL source the node wants declared once,
/// ahead of any function that calls it (e.g. a shared winding-number helper
/// used by several polygon-like primitives).
#[derive(Debug, Clone)]
pub struct HelperFunction {
    pub name: String,
    pub source: String,
}

/// One GPU-side dependency a node contributes during emission.
#[derive(Debug, Clone)]
pub enum ShaderObject {
    Buffer(BufferObject),
    Helper(HelperFunction),
}

impl ShaderObject {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            ShaderObject::Buffer(b) => &b.name,
            ShaderObject::Helper(h) => &h.name,
        }
    }

    #[must_use]
    pub fn is_buffer(&self) -> bool {
        matches!(self, ShaderObject::Buffer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_len_matches_element_count() {
        let b = BufferObject::new_v2("poly", &[V2::new(0.0, 0.0), V2::new(1.0, 0.0)]);
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn new_buffer_has_no_binding() {
        let b = BufferObject::new_f32("lens", &[1.0, 2.0]);
        assert_eq!(b.binding, -1);
    }

    #[test]
    fn glsl_names_match_spec_table() {
        assert_eq!(ElementType::F32.glsl_name(), "float");
        assert_eq!(ElementType::V2.glsl_name(), "vec2");
        assert_eq!(ElementType::V3.glsl_name(), "vec3");
    }
}
