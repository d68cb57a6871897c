//! The dimension-agnostic core of emission: the dedup law for emitted
//! functions, and binding allocation for shader objects.

use std::collections::HashMap;

use sdf_core::shader_object::{BufferObject, ShaderObject};
use sdf_core::Error;
use sdf_math::{hash64, hash64_seeded, hash_str, hash_str_seeded};

use crate::node::AnyNode;

/// First binding slot available to a bulk buffer object; 0 and 1 are
/// reserved for the positions/distances buffers.
pub const FIRST_BUFFER_BINDING: i32 = 2;

/// Everything the caller needs to finish assembling a program: the declared
/// helper/buffer text (in tree-discovery order), the per-node function
/// bodies (leaves first), and the buffer objects the consumer must upload.
pub struct Assembled {
    pub helper_decls: String,
    pub buffer_decls: String,
    pub functions: String,
    pub objects: Vec<BufferObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectKind {
    Buffer,
    Helper,
}

struct SeenObject {
    kind: ObjectKind,
    payload_hash: u64,
}

/// Walk `order` (BFS, tree-discovery order) once to collect shader objects
/// and assign bindings in that same discovery order.
/// `reject_buffers` is set by the visualizer path, which forbids any
/// binding other than 0/1.
fn collect_objects(
    order: &[AnyNode],
    reject_buffers: bool,
) -> std::result::Result<(String, String, Vec<BufferObject>), Error> {
    let mut seen: HashMap<u64, SeenObject> = HashMap::new();
    let mut helper_decls = String::new();
    let mut buffer_decls = String::new();
    let mut objects = Vec::new();
    let mut next_binding = FIRST_BUFFER_BINDING;

    for node in order {
        for obj in node.shader_objects() {
            let name_hash = hash_str(obj.name());
            let payload_hash = match &obj {
                ShaderObject::Buffer(b) => {
                    hash64_seeded(&b.payload, u64::from(b.element_type.glsl_name().len() as u32))
                }
                ShaderObject::Helper(h) => hash64(h.source.as_bytes()),
            };
            let kind = match &obj {
                ShaderObject::Buffer(_) => ObjectKind::Buffer,
                ShaderObject::Helper(_) => ObjectKind::Helper,
            };

            if let Some(prior) = seen.get(&name_hash) {
                if prior.kind == kind && prior.payload_hash == payload_hash {
                    continue; // identical object, already declared
                }
                tracing::error!(
                    "shader object `{}` collides with a prior {:?}, got {:?}",
                    obj.name(),
                    prior.kind,
                    kind
                );
                return Err(Error::EmissionNameCollision {
                    name: obj.name().to_string(),
                    first_body: format!("<shader object, kind={:?}>", prior.kind),
                    second_body: format!("<shader object, kind={kind:?}>"),
                });
            }

            match obj {
                ShaderObject::Buffer(mut buf) => {
                    if reject_buffers {
                        tracing::error!("visualizer emission rejected bulk buffer `{}`", buf.name);
                        return Err(Error::VisualizerBufferRejection(buf.name));
                    }
                    if buf.binding != -1 {
                        tracing::error!(
                            "shader object `{}` reused without resetting its binding (was {})",
                            buf.name,
                            buf.binding
                        );
                        return Err(Error::EmissionBindingConflict(buf.name));
                    }
                    buf.binding = next_binding;
                    buffer_decls.push_str(&buffer_layout_decl(&buf));
                    next_binding += 1;
                    seen.insert(
                        name_hash,
                        SeenObject {
                            kind: ObjectKind::Buffer,
                            payload_hash,
                        },
                    );
                    objects.push(buf);
                }
                ShaderObject::Helper(helper) => {
                    helper_decls.push_str(&helper.source);
                    if !helper.source.ends_with('\n') {
                        helper_decls.push('\n');
                    }
                    seen.insert(
                        name_hash,
                        SeenObject {
                            kind: ObjectKind::Helper,
                            payload_hash,
                        },
                    );
                }
            }
        }
    }

    Ok((helper_decls, buffer_decls, objects))
}

fn buffer_layout_decl(buf: &BufferObject) -> String {
    let glsl_ty = buf.element_type.glsl_name();
    format!(
        "layout(std430, binding = {binding}) readonly buffer {name}Buffer {{ {ty} {name}[]; }};\n",
        binding = buf.binding,
        name = buf.name,
        ty = glsl_ty,
    )
}

/// Emit each distinct node's function once, per the two-hash dedup law, in
/// the order `order` was given (the caller passes a reverse-BFS slice so
/// callees land above their callers).
fn emit_functions(order: &[AnyNode]) -> std::result::Result<String, Error> {
    let mut seen_bodies: HashMap<u64, (u64, String)> = HashMap::new();
    let mut functions = String::new();

    for node in order {
        let name = node.name();
        let h_name = hash_str(&name);
        let body = node.body();
        let h_body = hash_str_seeded(&body, h_name);

        match seen_bodies.get(&h_name) {
            None => {
                seen_bodies.insert(h_name, (h_body, body.clone()));
                functions.push_str(&body);
                if !functions.ends_with('\n') {
                    functions.push('\n');
                }
            }
            Some((prior_h_body, _)) if *prior_h_body == h_body => {
                // Identical function already declared; skip.
            }
            Some((_, prior_body)) => {
                tracing::error!("emitted function name `{name}` collides with differing body");
                return Err(Error::EmissionNameCollision {
                    name,
                    first_body: prior_body.clone(),
                    second_body: body,
                });
            }
        }
    }

    Ok(functions)
}

/// Run the full C5 pipeline over a BFS-collected node list: binding scan in
/// discovery order, then function emission in reverse-discovery order.
pub fn assemble(order: &[AnyNode], reject_buffers: bool) -> std::result::Result<Assembled, Error> {
    let (helper_decls, buffer_decls, objects) = collect_objects(order, reject_buffers)?;
    let reversed: Vec<AnyNode> = order.iter().rev().cloned().collect();
    let functions = emit_functions(&reversed)?;
    Ok(Assembled {
        helper_decls,
        buffer_decls,
        functions,
        objects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdf_core::builder::Builder;
    use std::sync::Arc;

    #[test]
    fn binding_allocation_starts_at_two_and_increments() {
        let mut b = Builder::new();
        let verts: Vec<sdf_math::V2> = (0..80)
            .map(|i| {
                let t = i as f32 / 80.0 * std::f32::consts::TAU;
                sdf_math::V2::new(t.cos(), t.sin())
            })
            .collect();
        let polygon = b.polygon(verts);
        let order = vec![crate::node::AnyNode::D2(polygon)];
        let (_, buffer_decls, objects) = collect_objects(&order, false).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].binding, FIRST_BUFFER_BINDING);
        assert!(buffer_decls.contains("binding = 2"));
    }

    #[test]
    fn colliding_name_same_body_is_deduped() {
        let mut b = Builder::new();
        let s1 = b.sphere(1.0);
        let s2 = b.sphere(1.0);
        let order = vec![
            crate::node::AnyNode::D3(s1),
            crate::node::AnyNode::D3(s2),
        ];
        let functions = emit_functions(&order).unwrap();
        assert_eq!(functions.lines().filter(|l| l.starts_with("float ")).count(), 1);
    }

    #[test]
    fn colliding_name_different_body_is_fatal() {
        // Two distinct in-memory shapes whose `append_name` happens to
        // collide but whose bodies differ: simulate directly against
        // `Sphere`'s trait impl by wrapping with a name override that
        // forces the same name onto two different spheres.
        use sdf_core::shape::shims::NameOverrideShape3;

        let mut b = Builder::new();
        let s1: sdf_core::shape::Shape3Handle = Arc::new(NameOverrideShape3::new(b.sphere(1.0), "same_name"));
        let s2: sdf_core::shape::Shape3Handle = Arc::new(NameOverrideShape3::new(b.sphere(2.0), "same_name"));
        let order = vec![crate::node::AnyNode::D3(s1), crate::node::AnyNode::D3(s2)];
        let err = emit_functions(&order).unwrap_err();
        assert!(matches!(err, Error::EmissionNameCollision { .. }));
    }
}
