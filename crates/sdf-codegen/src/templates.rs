//! Program templates for the three emission entry points.
//!
//! Each `render_*` takes the pieces [`crate::assemble::assemble`] produced
//! plus the emitter's configuration and stitches them into a fixed skeleton
//! where section order matters, keeping base-shader text separate from
//! generated SDF text the same way a hand-written GLSL program would.

use crate::assemble::Assembled;

fn local_size_decl(local_size_x: u32) -> String {
    format!("layout(local_size_x = {local_size_x}, local_size_y = 1, local_size_z = 1) in;\n")
}

/// `write_compute_sdf3` body: `vec3` positions at `std140`, `float`
/// distances at `std430`.
#[must_use]
pub fn render_compute_sdf3(assembled: &Assembled, root_name: &str, local_size_x: u32) -> String {
    format!(
        "#shader compute\n\
         #version 430\n\
         \n\
         {helpers}\
         {buffers}\
         {functions}\
         {local_size}\
         layout(std140, binding = 0) buffer Positions {{ vec3 pos[]; }};\n\
         layout(std430, binding = 1) buffer Distances {{ float d[]; }};\n\
         \n\
         void main() {{\n\
         \u{20}\u{20}\u{20}\u{20}int i = int(gl_GlobalInvocationID.x);\n\
         \u{20}\u{20}\u{20}\u{20}d[i] = {root_name}(pos[i]);\n\
         }}\n",
        helpers = assembled.helper_decls,
        buffers = assembled.buffer_decls,
        functions = assembled.functions,
        local_size = local_size_decl(local_size_x),
    )
}

/// 2D analogue: `vec2` positions, both buffers at `std430` (unlike the 3D
/// entry point, nothing here needs the wider `std140` alignment).
#[must_use]
pub fn render_compute_sdf2(assembled: &Assembled, root_name: &str, local_size_x: u32) -> String {
    format!(
        "#shader compute\n\
         #version 430\n\
         \n\
         {helpers}\
         {buffers}\
         {functions}\
         {local_size}\
         layout(std430, binding = 0) buffer Positions {{ vec2 pos[]; }};\n\
         layout(std430, binding = 1) buffer Distances {{ float d[]; }};\n\
         \n\
         void main() {{\n\
         \u{20}\u{20}\u{20}\u{20}int i = int(gl_GlobalInvocationID.x);\n\
         \u{20}\u{20}\u{20}\u{20}d[i] = {root_name}(pos[i]);\n\
         }}\n",
        helpers = assembled.helper_decls,
        buffers = assembled.buffer_decls,
        functions = assembled.functions,
        local_size = local_size_decl(local_size_x),
    )
}

/// Fixed ray-marching fragment body appended after the SDF declarations:
/// camera control driven by `iResolution`/`iMouse`, central-difference
/// normals, and a 2x2 antialiasing supersample.
const RAYMARCH_BODY: &str = r#"uniform vec2 iResolution;
uniform vec2 iMouse;
uniform float iTime;

const int MAX_STEPS = 256;
const float MAX_DIST = 500.0;
const float SURF_EPS = 0.0005;
const float NORMAL_EPS = 0.0005;

out vec4 fragColor;

vec3 ray_march(vec3 ro, vec3 rd) {
    float t = 0.0;
    for (int i = 0; i < MAX_STEPS; i++) {
        vec3 p = ro + rd * t;
        float d = sdf(p);
        if (d < SURF_EPS) {
            return vec3(t, 1.0, 0.0);
        }
        t += d;
        if (t > MAX_DIST) {
            break;
        }
    }
    return vec3(t, 0.0, 0.0);
}

vec3 calc_normal(vec3 p) {
    vec2 e = vec2(NORMAL_EPS, 0.0);
    return normalize(vec3(
        sdf(p + e.xyy) - sdf(p - e.xyy),
        sdf(p + e.yxy) - sdf(p - e.yxy),
        sdf(p + e.yyx) - sdf(p - e.yyx)
    ));
}

vec3 shade(vec3 ro, vec3 rd) {
    vec3 hit = ray_march(ro, rd);
    if (hit.y < 0.5) {
        return vec3(0.05, 0.06, 0.08); // background
    }
    vec3 p = ro + rd * hit.x;
    vec3 n = calc_normal(p);
    vec3 light_dir = normalize(vec3(0.6, 0.8, 0.4));
    float diffuse = max(dot(n, light_dir), 0.0);
    float ambient = 0.15;
    return vec3(1.0) * (ambient + diffuse * 0.85);
}

mat3 look_at(vec3 eye, vec3 target, vec3 up) {
    vec3 f = normalize(target - eye);
    vec3 r = normalize(cross(f, up));
    vec3 u = cross(r, f);
    return mat3(r, u, -f);
}

vec3 render_sample(vec2 frag_coord) {
    vec2 uv = (frag_coord - 0.5 * iResolution) / iResolution.y;

    float yaw = (iMouse.x / iResolution.x - 0.5) * 6.28318;
    float pitch = (iMouse.y / iResolution.y - 0.5) * 3.14159;
    vec3 eye = 4.0 * vec3(cos(pitch) * sin(yaw), sin(pitch), cos(pitch) * cos(yaw));

    mat3 cam = look_at(eye, vec3(0.0), vec3(0.0, 1.0, 0.0));
    vec3 rd = cam * normalize(vec3(uv, -1.5));

    return shade(eye, rd);
}

void main() {
    vec3 color = vec3(0.0);
    const int AA = 2;
    for (int sx = 0; sx < AA; sx++) {
        for (int sy = 0; sy < AA; sy++) {
            vec2 offset = (vec2(float(sx), float(sy)) / float(AA)) - 0.5;
            color += render_sample(gl_FragCoord.xy + offset);
        }
    }
    color /= float(AA * AA);

    fragColor = vec4(pow(color, vec3(1.0 / 2.2)), 1.0);
}
"#;

/// `write_frag_visualizer_sdf3` body: SDF declarations, a one-line
/// `sdf(vec3)` wrapper around the root function, then the fixed
/// ray-marching template. Bulk buffers were already rejected before this is
/// called (`Assembled.buffer_decls` is always empty on this path).
#[must_use]
pub fn render_frag_visualizer_sdf3(assembled: &Assembled, root_name: &str) -> String {
    format!(
        "#shader fragment\n\
         #version 430\n\
         \n\
         {helpers}\
         {functions}\
         float sdf(vec3 p) {{ return {root_name}(p); }}\n\
         \n\
         {raymarch}",
        helpers = assembled.helper_decls,
        functions = assembled.functions,
        raymarch = RAYMARCH_BODY,
    )
}
