//! End-to-end emission scenarios covering the compute and visualizer entry
//! points, plus the dedup and name-shortening behaviors that cut across all
//! of them.

use sdf_codegen::Emitter;
use sdf_core::builder::Builder;
use sdf_core::shape::Shape3;

fn count_function_decls(source: &str) -> usize {
    source.lines().filter(|l| l.starts_with("float ")).count()
}

/// `union(sphere(r=1), translate(box(1,0.6,0.8,round=0.1), 0.5,0.7,0.8))`
/// emits exactly 4 distinct functions (sphere, box, transform, union) with
/// no duplicates.
#[test]
fn s1_union_sphere_translated_box_emits_four_functions() {
    let mut b = Builder::new();
    let sphere = b.sphere(1.0);
    let cube = b.boxed(1.0, 0.6, 0.8, 0.1);
    let translated = b.translate(cube, sdf_math::V3::new(0.5, 0.7, 0.8));
    let root = b.union(vec![sphere, translated]);
    assert!(b.err().is_none());

    let emitter = Emitter::new();
    let mut out = Vec::new();
    let outcome = emitter.write_compute_sdf3(&mut out, &root).unwrap();
    let source = String::from_utf8(out).unwrap();

    assert_eq!(count_function_decls(&source), 4, "source:\n{source}");
    assert!(outcome.objects.is_empty());
    assert!(source.contains("void main()"));
}

/// Emitting a fragment visualizer for a shape whose subtree requires a
/// bulk buffer (a polygon with enough vertices to cross the packing
/// threshold) fails with the visualizer-buffer-rejection error.
#[test]
fn s6_visualizer_rejects_bulk_buffer_dependency() {
    let mut b = Builder::new();
    // DEFAULT_SHADER_BUFFER_THRESHOLD is 128 floats; 40 2D vertices is 80
    // floats, so ask for more than enough to force buffer packing.
    let verts: Vec<sdf_math::V2> = (0..80)
        .map(|i| {
            let t = i as f32 / 80.0 * std::f32::consts::TAU;
            sdf_math::V2::new(t.cos(), t.sin())
        })
        .collect();
    let polygon = b.polygon(verts);
    assert!(b.err().is_none());
    let extruded = b.extrude(polygon, 1.0);

    let emitter = Emitter::new();
    let mut out = Vec::new();
    let err = emitter
        .write_frag_visualizer_sdf3(&mut out, &extruded)
        .unwrap_err();
    assert!(matches!(
        err.source,
        sdf_codegen::EmitError::Shape(sdf_core::Error::VisualizerBufferRejection(_))
    ));
}

/// N syntactically identical primitives emit exactly one function
/// declaration.
#[test]
fn identical_primitives_dedup_to_one_declaration() {
    let mut b = Builder::new();
    let a = b.sphere(1.0);
    let c = b.sphere(1.0);
    let d = b.sphere(1.0);
    let root = b.union(vec![a, c, d]);

    let emitter = Emitter::new();
    let mut out = Vec::new();
    emitter.write_compute_sdf3(&mut out, &root).unwrap();
    let source = String::from_utf8(out).unwrap();

    // One sphere function, one union function.
    assert_eq!(count_function_decls(&source), 2, "source:\n{source}");
}

/// Identical parameters and identical children (by name) imply identical
/// emitted names, so two separately constructed but
/// equivalent subtrees dedup together even when not literally shared by
/// reference.
#[test]
fn name_determinism_dedups_equivalent_but_distinct_handles() {
    let mut b = Builder::new();
    let left = b.translate(b.sphere(2.0), sdf_math::V3::new(1.0, 0.0, 0.0));
    let right = b.translate(b.sphere(2.0), sdf_math::V3::new(1.0, 0.0, 0.0));
    assert_eq!(left.name(), right.name());

    let root = b.union(vec![left, right]);
    let emitter = Emitter::new();
    let mut out = Vec::new();
    emitter.write_compute_sdf3(&mut out, &root).unwrap();
    let source = String::from_utf8(out).unwrap();

    // sphere + transform + union = 3, not 5.
    assert_eq!(count_function_decls(&source), 3, "source:\n{source}");
}

/// A 2D tree emits via the 2D compute template with `vec2` positions.
#[test]
fn compute_sdf2_uses_vec2_positions() {
    let mut b = Builder::new();
    let root = b.circle(1.0);
    let emitter = Emitter::new();
    let mut out = Vec::new();
    emitter.write_compute_sdf2(&mut out, &root).unwrap();
    let source = String::from_utf8(out).unwrap();
    assert!(source.contains("buffer Positions { vec2 pos[]; }"));
}

/// A node whose name exceeds the configured budget gets a short alias at
/// the root, and `main()` calls the alias rather than the long name.
#[test]
fn oversized_root_name_gets_shortened() {
    let mut b = Builder::new();
    let mut shape = b.sphere(1.0);
    // Chain enough unary wraps that the root's content-hash name blows past
    // a tiny configured budget.
    for i in 0..20 {
        shape = b.translate(shape, sdf_math::V3::new(i as f32, 0.0, 0.0));
    }
    assert!(shape.name().len() > 64);

    let emitter = Emitter::new().with_max_name_len(64);
    let mut out = Vec::new();
    emitter.write_compute_sdf3(&mut out, &shape).unwrap();
    let source = String::from_utf8(out).unwrap();

    // main() calls a short alias, and the alias forwards to the long name.
    let main_line = source
        .lines()
        .find(|l| l.contains("d[i] ="))
        .expect("main body");
    assert!(!main_line.contains(&shape.name()));
}
