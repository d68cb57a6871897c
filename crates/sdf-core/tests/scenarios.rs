//! End-to-end CPU-evaluation scenarios and cross-cutting invariants: the
//! parts exercisable without an emitted GLSL program. The scenarios that
//! require emission live in `sdf-codegen`'s own `tests/scenarios.rs`.

use approx::assert_relative_eq;
use sdf_core::builder::Builder;
use sdf_core::eval::EvalCtx3;
use sdf_core::shape::Shape3;
use sdf_math::V3;

fn eval_one(shape: &sdf_core::shape::Shape3Handle, p: V3, ctx: &mut EvalCtx3) -> f32 {
    let positions = [p];
    let mut distances = [0.0];
    shape.evaluate(&positions, &mut distances, ctx).unwrap();
    distances[0]
}

/// `difference(cylinder(r=1,h=2,round=0), cylinder(r=0.5,h=3,round=0))`
/// takes its bounds from the outer cylinder and carves a clean annulus.
#[test]
fn s2_difference_of_cylinders_bounds_and_distance() {
    let mut b = Builder::new();
    let outer = b.cylinder(1.0, 2.0, 0.0);
    let inner = b.cylinder(0.5, 3.0, 0.0);
    let shape = b.difference(outer, inner);
    assert!(b.err().is_none());

    let bounds = shape.bounds();
    assert_relative_eq!(bounds.min.x, -1.0, epsilon = 1e-6);
    assert_relative_eq!(bounds.max.x, 1.0, epsilon = 1e-6);
    assert_relative_eq!(bounds.min.y, -1.0, epsilon = 1e-6);
    assert_relative_eq!(bounds.max.y, 1.0, epsilon = 1e-6);

    let mut ctx = EvalCtx3::new();
    let d = eval_one(&shape, V3::new(0.75, 0.0, 0.0), &mut ctx);
    assert_relative_eq!(d, -0.25, epsilon = 1e-3);
}

/// `extrude(polygon([(0,0),(1,0),(0,1)]), h=2)` is negative inside the
/// prism and positive past either cap.
#[test]
fn s3_extrude_triangle_profile_sign() {
    let mut b = Builder::new();
    let profile = b.polygon(vec![
        sdf_math::V2::new(0.0, 0.0),
        sdf_math::V2::new(1.0, 0.0),
        sdf_math::V2::new(0.0, 1.0),
    ]);
    assert!(b.err().is_none());
    let shape = b.extrude(profile, 2.0);

    let mut ctx = EvalCtx3::new();
    let inside = eval_one(&shape, V3::new(0.2, 0.2, 0.0), &mut ctx);
    assert!(inside < 0.0, "expected negative distance inside the prism, got {inside}");

    let above = eval_one(&shape, V3::new(0.0, 0.0, 1.5), &mut ctx);
    assert!(above > 0.0, "expected positive distance past the cap, got {above}");
}

/// `smooth_union` beats a plain `min` by a visible margin at the midpoint
/// between two overlapping spheres.
#[test]
fn s4_smooth_union_strictly_less_than_min() {
    let mut b = Builder::new();
    let left = b.sphere(1.0);
    let right_child = b.sphere(1.0);
    let right = b.translate(right_child, V3::new(1.5, 0.0, 0.0));
    let smooth = b.smooth_union(left.clone(), right.clone(), 0.2);

    let mut ctx = EvalCtx3::new();
    let p = V3::new(0.75, 0.0, 0.0);
    let d_left = eval_one(&left, p, &mut ctx);
    let d_right = eval_one(&right, p, &mut ctx);
    let d_smooth = eval_one(&smooth, p, &mut ctx);

    assert!(
        d_smooth <= d_left.min(d_right) - 0.01,
        "smooth union {d_smooth} not strictly below min({d_left}, {d_right}) by 0.01"
    );
}

/// `circular_array(translate(sphere(0.2),1,0,0), num_instances=5)` places
/// instance centers evenly on the unit circle, each reading back the child
/// sphere's own surface distance.
#[test]
fn s5_circular_array_instance_centers_and_bounds() {
    let mut b = Builder::new();
    let child = b.translate(b.sphere(0.2), V3::new(1.0, 0.0, 0.0));
    let array = b.circular_array(child.clone(), 5);
    assert!(b.err().is_none());

    let mut ctx = EvalCtx3::new();
    let delta = std::f32::consts::TAU / 5.0;
    for k in 0..5 {
        let angle = delta * k as f32;
        let center = V3::new(angle.cos(), angle.sin(), 0.0);
        let d = eval_one(&array, center, &mut ctx);
        assert_relative_eq!(d, -0.2, epsilon = 1e-3);
    }

    // The bounds must at least enclose every instance's own bounding box.
    let bounds = array.bounds();
    for k in 0..5 {
        let angle = delta * k as f32;
        let center = V3::new(angle.cos(), angle.sin(), 0.0);
        let instance_bounds = sdf_math::Box3::from_center_half_extents(center, V3::splat(0.2));
        for v in instance_bounds.vertices() {
            assert!(
                v.x >= bounds.min.x - 1e-4
                    && v.x <= bounds.max.x + 1e-4
                    && v.y >= bounds.min.y - 1e-4
                    && v.y <= bounds.max.y + 1e-4
                    && v.z >= bounds.min.z - 1e-4
                    && v.z <= bounds.max.z + 1e-4,
                "instance {k} corner {v:?} outside array bounds {bounds:?}"
            );
        }
    }
}

/// Sampling just outside `bounds()` yields non-negative distances, and the
/// surface normal there points outward-or-tangent.
#[test]
fn invariant_bounds_enclose_sign_changes_sphere() {
    let mut b = Builder::new();
    let sphere = b.sphere(1.0);
    let bounds = sphere.bounds();
    let eps = 1e-3;
    let grid = bounds.expand(eps);

    let mut ctx = EvalCtx3::new();
    let normal_eps = 1e-4;
    let face_centers = [
        V3::new(grid.max.x, 0.0, 0.0),
        V3::new(grid.min.x, 0.0, 0.0),
        V3::new(0.0, grid.max.y, 0.0),
        V3::new(0.0, grid.min.y, 0.0),
        V3::new(0.0, 0.0, grid.max.z),
        V3::new(0.0, 0.0, grid.min.z),
    ];
    let samples: Vec<V3> = grid.vertices().into_iter().chain(face_centers).collect();
    for corner in samples {
        let d = eval_one(&sphere, corner, &mut ctx);
        assert!(d >= -1e-3, "corner {corner:?} has negative distance {d}");

        let dx = eval_one(&sphere, corner + V3::new(normal_eps, 0.0, 0.0), &mut ctx)
            - eval_one(&sphere, corner - V3::new(normal_eps, 0.0, 0.0), &mut ctx);
        let dy = eval_one(&sphere, corner + V3::new(0.0, normal_eps, 0.0), &mut ctx)
            - eval_one(&sphere, corner - V3::new(0.0, normal_eps, 0.0), &mut ctx);
        let dz = eval_one(&sphere, corner + V3::new(0.0, 0.0, normal_eps), &mut ctx)
            - eval_one(&sphere, corner - V3::new(0.0, 0.0, normal_eps), &mut ctx);
        let normal = V3::new(dx, dy, dz).normalize_or_zero();
        let outward = (corner - bounds.center()).normalize_or_zero();
        assert!(
            normal.dot(outward) >= -1e-2,
            "normal {normal:?} at {corner:?} does not point outward (dot={})",
            normal.dot(outward)
        );
    }
}

/// The four boolean operators match their scalar laws at every sample,
/// not just at a single probe point.
#[test]
fn invariant_boolean_scalar_laws() {
    let mut b = Builder::new();
    let sphere_a = b.sphere(1.0);
    let sphere_b_child = b.sphere(1.0);
    let sphere_b = b.translate(sphere_b_child, V3::new(0.8, 0.0, 0.0));

    let union = b.union(vec![sphere_a.clone(), sphere_b.clone()]);
    let intersection = b.intersection(sphere_a.clone(), sphere_b.clone());
    let difference = b.difference(sphere_a.clone(), sphere_b.clone());
    let xor = b.xor(sphere_a.clone(), sphere_b.clone());

    let mut ctx = EvalCtx3::new();
    let samples = [
        V3::new(0.0, 0.0, 0.0),
        V3::new(0.4, 0.0, 0.0),
        V3::new(-0.6, 0.3, 0.1),
        V3::new(1.2, -0.2, 0.5),
        V3::new(2.0, 0.0, 0.0),
    ];
    for p in samples {
        let a = eval_one(&sphere_a, p, &mut ctx);
        let c = eval_one(&sphere_b, p, &mut ctx);

        assert_relative_eq!(eval_one(&union, p, &mut ctx), a.min(c), epsilon = 1e-5);
        assert_relative_eq!(eval_one(&intersection, p, &mut ctx), a.max(c), epsilon = 1e-5);
        assert_relative_eq!(eval_one(&difference, p, &mut ctx), a.max(-c), epsilon = 1e-5);
        assert_relative_eq!(
            eval_one(&xor, p, &mut ctx),
            a.min(c).max(-a.max(c)),
            epsilon = 1e-5
        );
    }
}

/// Rotate-by-zero is an identity across a whole sample grid, not just one
/// point.
#[test]
fn invariant_rotate_by_zero_is_identity_across_grid() {
    let mut b = Builder::new();
    let sphere = b.sphere(1.0);
    let rotated = b.rotate(sphere.clone(), V3::new(0.0, 1.0, 0.0), 0.0);

    let mut ctx = EvalCtx3::new();
    for i in -2..=2 {
        for j in -2..=2 {
            for k in -2..=2 {
                let p = V3::new(i as f32 * 0.3, j as f32 * 0.3, k as f32 * 0.3);
                let direct = eval_one(&sphere, p, &mut ctx);
                let via_rotate = eval_one(&rotated, p, &mut ctx);
                assert_relative_eq!(direct, via_rotate, epsilon = 1e-6);
            }
        }
    }
}
