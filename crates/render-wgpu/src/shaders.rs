/// Holographic mesh shader: vertical glitch jitter in the vertex stage,
/// scrolling stripes and a fresnel rim in the fragment stage.
pub const HOLOGRAPHIC_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    // drawing buffer width, height, pixel ratio, aspect
    viewport: vec4<f32>,
};

struct Hologram {
    color: vec4<f32>,
    time: f32,
};

struct Model {
    matrix: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> hologram: Hologram;

@group(2) @binding(0)
var<uniform> model: Model;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

fn random2d(value: vec2<f32>) -> f32 {
    return fract(sin(dot(value, vec2<f32>(12.9898, 78.233))) * 43758.5453123);
}

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var world = model.matrix * vec4<f32>(vertex.position, 1.0);

    let glitch_time = hologram.time - world.y;
    var glitch = sin(glitch_time) + sin(glitch_time * 3.45) + sin(glitch_time * 8.76);
    glitch = smoothstep(0.3, 1.0, glitch / 3.0) * 0.25;
    world.x += (random2d(world.xz + hologram.time) - 0.5) * glitch;
    world.z += (random2d(world.zx + hologram.time) - 0.5) * glitch;

    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (model.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var normal = normalize(in.world_normal);
    if !front {
        normal = -normal;
    }

    let stripes = pow(fract((in.world_position.y - hologram.time * 0.02) * 20.0), 3.0);

    let view_dir = normalize(in.world_position - camera.position.xyz);
    let fresnel = pow(dot(view_dir, normal) + 1.0, 2.0);
    let falloff = 1.0 - smoothstep(0.0, 0.8, fresnel);

    let strength = (stripes * fresnel + fresnel * 1.25) * falloff;
    return vec4<f32>(hologram.color.rgb, strength);
}
"#;

/// Point sprites drawn as camera-facing instanced quads.
pub const PARTICLE_SHADER: &str = r#"
struct Camera {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
    viewport: vec4<f32>,
};

struct Sprite {
    color: vec4<f32>,
    size: f32,
    // 1.0 when size shrinks with distance
    attenuation: f32,
    // 1.0 when the alpha map is bound
    has_alpha_map: f32,
};

@group(0) @binding(0)
var<uniform> camera: Camera;

@group(1) @binding(0)
var<uniform> sprite: Sprite;
@group(1) @binding(1)
var alpha_map: texture_2d<f32>;
@group(1) @binding(2)
var alpha_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) index: u32, @location(0) center: vec3<f32>) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[index];

    let clip = camera.view_proj * vec4<f32>(center, 1.0);
    let buffer = camera.viewport.xy;

    // Attenuated sprites cover `size * buffer_height / 2 / depth` pixels, which
    // in clip space is a constant `size` tall. Fixed sprites are `size` pixels.
    var half_extent: vec2<f32>;
    if sprite.attenuation > 0.5 {
        half_extent = vec2<f32>(sprite.size / camera.viewport.w, sprite.size) * 0.5;
    } else {
        let pixels = sprite.size * camera.viewport.z;
        half_extent = vec2<f32>(pixels / buffer.x, pixels / buffer.y) * clip.w;
    }

    var out: VertexOutput;
    out.clip_position = clip + vec4<f32>(corner * half_extent, 0.0, 0.0);
    out.uv = vec2<f32>(corner.x, -corner.y) * 0.5 + 0.5;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var alpha = sprite.color.a;
    if sprite.has_alpha_map > 0.5 {
        alpha *= textureSample(alpha_map, alpha_sampler, in.uv).g;
    }
    return vec4<f32>(sprite.color.rgb, alpha);
}
"#;

/// Copies the offscreen color target onto the window surface.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var source: texture_2d<f32>;
@group(0) @binding(1)
var source_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> VertexOutput {
    // One triangle covering the whole target.
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: VertexOutput;
    out.clip_position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_blit(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(source, source_sampler, in.uv);
}
"#;
