//! GLSL fixtures compiled to SPIR-V with naga.

use naga::back::spv;
use naga::front::glsl::{Frontend, Options};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::ShaderStage;

/// One uniform buffer at (0, 0).
pub const VERTEX_FRAME: &str = r#"
#version 450

layout(set = 0, binding = 0) uniform Frame {
    mat4 viewproj;
} frame;

layout(location = 0) in vec3 position;

void main() {
    gl_Position = frame.viewproj * vec4(position, 1.0);
}
"#;

/// No descriptor bindings at all.
pub const VERTEX_BARE: &str = r#"
#version 450

layout(location = 0) in vec3 position;

void main() {
    gl_Position = vec4(position, 1.0);
}
"#;

/// A sampled image at (0, 1) and its sampler at (0, 2).
pub const FRAGMENT_TEXTURED: &str = r#"
#version 450

layout(set = 0, binding = 1) uniform texture2D albedo;
layout(set = 0, binding = 2) uniform sampler albedo_sampler;

layout(location = 0) in vec2 uv;
layout(location = 0) out vec4 color;

void main() {
    color = texture(sampler2D(albedo, albedo_sampler), uv);
}
"#;

/// A read-only storage buffer at (0, 0).
pub const FRAGMENT_TINTS: &str = r#"
#version 450

layout(set = 0, binding = 0) readonly buffer Tints {
    vec4 values[];
} tints;

layout(location = 0) out vec4 color;

void main() {
    color = tints.values[0];
}
"#;

/// A storage buffer at (1, 2) and a uniform buffer at (2, 5).
pub const FRAGMENT_SCATTERED: &str = r#"
#version 450

layout(set = 1, binding = 2) readonly buffer Lights {
    vec4 values[];
} lights;

layout(set = 2, binding = 5) uniform Material {
    vec4 base_color;
} material;

layout(location = 0) out vec4 color;

void main() {
    color = material.base_color * lights.values[0];
}
"#;

/// A storage image at (0, 0) fed from a storage buffer at (0, 1).
pub const COMPUTE_SPLAT: &str = r#"
#version 450

layout(local_size_x = 8, local_size_y = 8) in;

layout(set = 0, binding = 0, rgba8) uniform writeonly image2D target;
layout(set = 0, binding = 1) readonly buffer Weights {
    vec4 values[];
} weights;

void main() {
    imageStore(target, ivec2(gl_GlobalInvocationID.xy), weights.values[0]);
}
"#;

fn compile(stage: ShaderStage, source: &str) -> Vec<u8> {
    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(stage), source)
        .unwrap_or_else(|err| panic!("fixture does not parse: {err:?}"));

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    let info = validator
        .validate(&module)
        .unwrap_or_else(|err| panic!("fixture does not validate: {err:?}"));

    let words = spv::write_vec(&module, &info, &spv::Options::default(), None)
        .unwrap_or_else(|err| panic!("fixture does not emit: {err:?}"));
    bytemuck::cast_slice::<u32, u8>(&words).to_vec()
}

pub fn vertex(source: &str) -> Vec<u8> {
    compile(ShaderStage::Vertex, source)
}

pub fn fragment(source: &str) -> Vec<u8> {
    compile(ShaderStage::Fragment, source)
}

pub fn compute(source: &str) -> Vec<u8> {
    compile(ShaderStage::Compute, source)
}
