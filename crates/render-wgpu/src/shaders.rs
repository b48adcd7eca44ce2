//! WGSL sources. Every pipeline shares one uniform block, declared once in
//! [`FRAME_UNIFORMS`] and prepended to each shader body.

/// Uniform block shared by all pipelines. Layout must match `gpu::FrameUniforms`.
pub const FRAME_UNIFORMS: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec3<f32>,
    field_time: f32,
    camera_target: vec3<f32>,
    fov: f32,
    sun_direction: vec3<f32>,
    fog_fade: f32,
    resolution: vec2<f32>,
    wind: f32,
    subject_time: f32,
    base_color: vec4<f32>,
    tip_color: vec4<f32>,
    subject_color: vec4<f32>,
    rim: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
};

@group(0) @binding(0)
var<uniform> u: FrameUniforms;
"#;

/// Full-screen sky: gradient, sun glow, height fog, ACES tonemap.
const SKY_BODY: &str = r#"
struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
};

@vertex
fn vs_sky(@builtin(vertex_index) index: u32) -> SkyOutput {
    // One triangle covering the viewport
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: SkyOutput;
    out.clip_position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    return out;
}

const SKY_COLOUR: vec3<f32> = vec3<f32>(0.0585, 0.2145, 0.5265);

// Darker when looking up
fn sky_colour(ray_dir: vec3<f32>) -> vec3<f32> {
    return mix(0.35 * SKY_COLOUR, SKY_COLOUR, pow(1.0 - ray_dir.y, 4.0));
}

fn apply_fog(rgb: vec3<f32>, ray_ori: vec3<f32>, ray_dir_in: vec3<f32>, sun_dir: vec3<f32>) -> vec3<f32> {
    let dist = 4000.0;
    var ray_dir = ray_dir_in;
    if (abs(ray_dir.y) < 0.0001) {
        ray_dir.y = 0.0001;
    }
    let fog_amount = exp(-ray_ori.y * u.fog_fade)
        * (1.0 - exp(-dist * ray_dir.y * u.fog_fade)) / ray_dir.y;
    let sun_amount = max(dot(ray_dir, sun_dir), 0.0);
    let fog_colour = mix(vec3<f32>(0.35, 0.5, 0.9), vec3<f32>(1.0, 1.0, 0.75), pow(sun_amount, 16.0));
    return mix(rgb, fog_colour, clamp(fog_amount, 0.0, 1.0));
}

fn aces_film(x: vec3<f32>) -> vec3<f32> {
    let a = 2.51;
    let b = 0.03;
    let c = 2.43;
    let d = 0.59;
    let e = 0.14;
    return clamp((x * (a * x + b)) / (x * (c * x + d) + e), vec3<f32>(0.0), vec3<f32>(1.0));
}

fn ray_direction(fov_degrees: f32, frag_coord: vec2<f32>) -> vec3<f32> {
    let xy = frag_coord - u.resolution * 0.5;
    let z = (0.5 * u.resolution.y) / tan(radians(fov_degrees) * 0.5);
    return normalize(vec3<f32>(xy, -z));
}

fn look_at(eye: vec3<f32>, at: vec3<f32>, up: vec3<f32>) -> mat3x3<f32> {
    let z_axis = normalize(at - eye);
    let x_axis = normalize(cross(z_axis, up));
    let y_axis = cross(x_axis, z_axis);
    return mat3x3<f32>(x_axis, y_axis, -z_axis);
}

fn glow(dist: f32, radius: f32, intensity: f32) -> f32 {
    return pow(radius / max(dist, 1e-6), intensity);
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    // Framebuffer y grows downwards
    let frag = vec2<f32>(in.clip_position.x, u.resolution.y - in.clip_position.y);
    let orient = look_at(u.camera_position, u.camera_target, vec3<f32>(0.0, 1.0, 0.0));
    let ray_dir = orient * ray_direction(u.fov, frag);

    var col = sky_colour(ray_dir);

    let sun_dir = normalize(u.sun_direction);
    let mu = dot(sun_dir, ray_dir);
    col += vec3<f32>(1.0, 1.0, 0.8) * glow(1.0 - mu, 0.00005, 0.9);

    col += apply_fog(col, vec3<f32>(0.0, 1000.0, 0.0), ray_dir, sun_dir);

    // sRGB surface encodes on write; no manual gamma
    return vec4<f32>(aces_film(col), 1.0);
}
"#;

/// Instanced field (blades, planes) and the ground quad.
const FIELD_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) bend: f32,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) tint: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_field(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var world_pos = model * vec4<f32>(vertex.position, 1.0);

    // Neighbours sway out of step
    let origin = instance.model_3.xyz;
    let phase = u.field_time * 2.0 + origin.x * 0.6 + origin.z * 0.4;
    let sway = sin(phase) * u.wind * vertex.bend * vertex.bend;
    world_pos.x += sway;
    world_pos.z += sway * 0.5;

    var out: VertexOutput;
    out.clip_position = u.view_proj * world_pos;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.color = mix(u.base_color, u.tip_color, vertex.bend) * instance.tint;
    return out;
}

@fragment
fn fs_field(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(u.sun_direction);
    // Blades are double sided
    let diffuse = abs(dot(in.world_normal, light_dir));
    let lighting = 0.45 + diffuse * 0.55;
    return vec4<f32>(in.color.rgb * lighting, in.color.a);
}
"#;

/// Toon-shaded subject spinning about +Y.
const SUBJECT_BODY: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) world_pos: vec3<f32>,
};

fn spin(v: vec3<f32>, angle: f32) -> vec3<f32> {
    let c = cos(angle);
    let s = sin(angle);
    return vec3<f32>(c * v.x + s * v.z, v.y, -s * v.x + c * v.z);
}

@vertex
fn vs_subject(vertex: VertexInput) -> VertexOutput {
    let world_pos = spin(vertex.position, u.subject_time);
    var out: VertexOutput;
    out.clip_position = u.view_proj * vec4<f32>(world_pos, 1.0);
    out.world_normal = spin(vertex.normal, u.subject_time);
    out.world_pos = world_pos;
    return out;
}

@fragment
fn fs_subject(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let light_dir = normalize(u.sun_direction);
    let view_dir = normalize(u.camera_position - in.world_pos);

    // Three flat bands
    let ndl = max(dot(n, light_dir), 0.0);
    let band = floor(ndl * 3.0) / 3.0;
    let lighting = 0.35 + band * 0.65;

    let rim = pow(1.0 - max(dot(n, view_dir), 0.0), 3.0) * u.rim;
    let col = u.subject_color.rgb * lighting + vec3<f32>(rim);
    return vec4<f32>(col, u.subject_color.a);
}
"#;

pub fn sky() -> String {
    format!("{FRAME_UNIFORMS}{SKY_BODY}")
}

pub fn field() -> String {
    format!("{FRAME_UNIFORMS}{FIELD_BODY}")
}

pub fn subject() -> String {
    format!("{FRAME_UNIFORMS}{SUBJECT_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shader_declares_uniforms_once() {
        for source in [sky(), field(), subject()] {
            assert_eq!(source.matches("struct FrameUniforms").count(), 1);
            assert!(source.contains("var<uniform> u: FrameUniforms"));
        }
    }

    #[test]
    fn entry_points_present() {
        assert!(sky().contains("fn vs_sky") && sky().contains("fn fs_sky"));
        assert!(field().contains("fn vs_field") && field().contains("fn fs_field"));
        assert!(subject().contains("fn vs_subject") && subject().contains("fn fs_subject"));
    }
}
