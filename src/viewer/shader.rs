pub const MODEL_SHADER: &str = r#"
// Textured model shader with a camera-mounted light

struct CameraUniform {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
}

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
}

// Non-zero entry: the matching texture slot holds a real texture
struct MaterialUniform {
    texture_mask: vec4<u32>,
}

@group(0) @binding(0) var<uniform> camera: CameraUniform;
@group(0) @binding(1) var material_sampler: sampler;
@group(1) @binding(0) var<uniform> object: ObjectUniform;
@group(2) @binding(0) var diffuse_texture: texture_2d<f32>;
@group(2) @binding(1) var specular_texture: texture_2d<f32>;
@group(2) @binding(2) var normal_texture: texture_2d<f32>;
@group(2) @binding(3) var roughness_texture: texture_2d<f32>;
@group(2) @binding(4) var<uniform> material: MaterialUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;

    let world_pos = object.model * vec4<f32>(in.position, 1.0);
    out.world_position = world_pos.xyz;
    out.clip_position = camera.view_proj * world_pos;
    out.world_normal = (object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;

    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = textureSample(diffuse_texture, material_sampler, in.uv);
    let specular_map = textureSample(specular_texture, material_sampler, in.uv).r;
    let roughness = textureSample(roughness_texture, material_sampler, in.uv).g;
    // Tangent-space normals are not carried by the vertex layout
    let unused = textureSample(normal_texture, material_sampler, in.uv).r;

    var base = vec3<f32>(0.7, 0.7, 0.7);
    if (material.texture_mask.x != 0u) {
        base = diffuse.rgb;
    }

    var shininess = 32.0;
    if (material.texture_mask.w != 0u) {
        shininess = mix(128.0, 8.0, roughness);
    }
    var specular_strength = 0.2;
    if (material.texture_mask.y != 0u) {
        specular_strength = specular_map;
    }

    let view_dir = normalize(camera.eye.xyz - in.world_position);
    var normal = in.world_normal;
    if (dot(normal, normal) > 0.0) {
        normal = normalize(normal);
    } else {
        normal = view_dir;
    }

    let ambient = 0.15;
    let ndotl = max(dot(normal, view_dir), 0.0);
    let specular = pow(ndotl, shininess) * specular_strength;

    let color = base * (ambient + ndotl * 0.85) + vec3<f32>(specular) + vec3<f32>(unused * 0.0);
    return vec4<f32>(color, 1.0);
}
"#;
