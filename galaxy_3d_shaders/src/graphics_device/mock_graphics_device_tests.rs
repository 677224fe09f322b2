/// Unit tests for MockGraphicsDevice
///
/// The shader tests rely on the mock's declaration scanner and link checks,
/// so they are pinned down here.

use crate::graphics_device::mock_graphics_device::*;
use crate::graphics_device::{
    GraphicsDevice, ShaderStage, GlslType, UniformLocation, UniformValue,
    BufferTarget, BufferUsage, StageHandle,
};

const VERTEX: &str = "#version 130
in vec3 aPosition;
attribute vec2 aUv;
out vec2 vUv;
uniform mat4 uMvp;
uniform vec3 uLights[4];
void main() { gl_Position = uMvp * vec4(aPosition, 1.0); vUv = aUv; }
";

const FRAGMENT: &str = "#version 130
in vec2 vUv;
uniform sampler2D uTexture0;
uniform mat4 uMvp;
out vec4 oColor;
void main() { oColor = texture(uTexture0, vUv); }
";

fn compile(device: &mut MockGraphicsDevice, stage: ShaderStage, source: &str) -> StageHandle {
    let output = device.compile_stage(stage, source).unwrap();
    assert!(output.success, "{}", output.log);
    output.handle
}

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_compile_records_call_and_declarations() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();

    let handle = compile(&mut device, ShaderStage::Vertex, VERTEX);

    let state = state.lock().unwrap();
    assert_eq!(state.call_count("compile_stage"), 1);
    let stage = &state.stages[&handle.0];
    assert_eq!(stage.inputs.len(), 2);
    assert_eq!(stage.outputs[0].name, "vUv");
    assert_eq!(stage.uniforms[1].name, "uLights");
    assert_eq!(stage.uniforms[1].size, 4);
    assert_eq!(stage.uniforms[1].kind, GlslType::FloatVec3);
}

#[test]
fn test_compile_fails_on_error_directive() {
    let mut device = MockGraphicsDevice::new();
    let output = device
        .compile_stage(ShaderStage::Fragment, "#version 130\n#error broken\n")
        .unwrap();

    assert!(!output.success);
    assert!(output.log.contains("0:2"));
    assert!(output.log.contains("broken"));
}

#[test]
fn test_layout_qualifier_is_skipped() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();
    let handle = compile(
        &mut device,
        ShaderStage::Vertex,
        "layout(location = 0) in vec4 aColor;\nflat out int vId;\n",
    );

    let state = state.lock().unwrap();
    let stage = &state.stages[&handle.0];
    assert_eq!(stage.inputs[0].name, "aColor");
    assert_eq!(stage.inputs[0].kind, GlslType::FloatVec4);
    assert_eq!(stage.outputs[0].name, "vId");
}

#[test]
fn test_glsl_type_from_name() {
    assert_eq!(glsl_type_from_name("mat3"), GlslType::FloatMat3);
    assert_eq!(glsl_type_from_name("samplerCube"), GlslType::SamplerCube);
    assert_eq!(glsl_type_from_name("dvec3"), GlslType::Other(0));
}

// ============================================================================
// Linking
// ============================================================================

#[test]
fn test_link_reports_attributes_and_uniforms() {
    let mut device = MockGraphicsDevice::new();
    let vs = compile(&mut device, ShaderStage::Vertex, VERTEX);
    let fs = compile(&mut device, ShaderStage::Fragment, FRAGMENT);

    let link = device.link_program(&[vs, fs]).unwrap();
    assert!(link.success);

    let attributes = device.active_attributes(link.handle);
    assert_eq!(attributes.len(), 2);
    assert_eq!(attributes[0].name, "aPosition");

    let uniforms = device.active_uniforms(link.handle);
    let names: Vec<&str> = uniforms.iter().map(|u| u.name.as_str()).collect();
    // uMvp is declared by both stages but reported once
    assert_eq!(names, vec!["uMvp", "uLights[0]", "uTexture0"]);
    assert_eq!(uniforms[1].size, 4);
}

#[test]
fn test_array_element_locations_are_consecutive() {
    let mut device = MockGraphicsDevice::new();
    let vs = compile(&mut device, ShaderStage::Vertex, VERTEX);
    let fs = compile(&mut device, ShaderStage::Fragment, FRAGMENT);
    let program = device.link_program(&[vs, fs]).unwrap().handle;

    let base = device.uniform_location(program, "uLights").unwrap();
    assert_eq!(device.uniform_location(program, "uLights[0]"), Some(base));
    assert_eq!(device.uniform_location(program, "uLights[3]"), Some(UniformLocation(base.0 + 3)));
    assert_eq!(device.uniform_location(program, "uLights[4]"), None);
    assert_eq!(device.uniform_location(program, "uMissing"), None);
    assert_eq!(device.attribute_location(program, "aUv"), Some(1));
}

#[test]
fn test_link_fails_on_unmatched_varying() {
    let mut device = MockGraphicsDevice::new();
    let vs = compile(&mut device, ShaderStage::Vertex, "in vec3 aPosition;\n");
    let fs = compile(&mut device, ShaderStage::Fragment, FRAGMENT);

    let link = device.link_program(&[vs, fs]).unwrap();
    assert!(!link.success);
    assert!(link.log.contains("vUv"));
}

#[test]
fn test_link_geometry_stage_feeds_fragment() {
    let mut device = MockGraphicsDevice::new();
    let vs = compile(&mut device, ShaderStage::Vertex, "in vec3 aPosition;\nout vec3 vPos;\n");
    let gs = compile(&mut device, ShaderStage::Geometry, "in vec3 vPos[];\nout vec2 vUv;\n");
    let fs = compile(&mut device, ShaderStage::Fragment, FRAGMENT);

    assert!(device.link_program(&[vs, gs, fs]).unwrap().success);
}

#[test]
fn test_link_requires_vertex_and_fragment() {
    let mut device = MockGraphicsDevice::new();
    let vs = compile(&mut device, ShaderStage::Vertex, VERTEX);

    assert!(!device.link_program(&[vs]).unwrap().success);
}

#[test]
fn test_link_unknown_stage_is_error() {
    let mut device = MockGraphicsDevice::new();
    assert!(device.link_program(&[StageHandle(99)]).is_err());
}

#[test]
fn test_delete_program_clears_current() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();
    let vs = compile(&mut device, ShaderStage::Vertex, VERTEX);
    let fs = compile(&mut device, ShaderStage::Fragment, FRAGMENT);
    let program = device.link_program(&[vs, fs]).unwrap().handle;

    device.use_program(Some(program));
    assert_eq!(state.lock().unwrap().current_program, Some(program));

    device.delete_program(program);
    let state = state.lock().unwrap();
    assert_eq!(state.current_program, None);
    assert!(state.programs.is_empty());
}

// ============================================================================
// Uniforms and buffers
// ============================================================================

#[test]
fn test_set_uniform_is_recorded() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();

    device.set_uniform(UniformLocation(3), UniformValue::Float(0.5));

    let state = state.lock().unwrap();
    assert_eq!(state.uniform_uploads, vec![(UniformLocation(3), UniformValue::Float(0.5))]);
}

#[test]
fn test_buffer_and_vertex_array_lifecycle() {
    let mut device = MockGraphicsDevice::new();
    let state = device.state();

    let buffer = device.create_buffer(BufferTarget::Array, &[1, 2, 3, 4], BufferUsage::StaticDraw).unwrap();
    let vao = device.create_vertex_array().unwrap();
    assert_eq!(state.lock().unwrap().buffers[&buffer.0], vec![1, 2, 3, 4]);

    device.delete_buffer(buffer);
    device.delete_vertex_array(vao);

    let state = state.lock().unwrap();
    assert!(state.buffers.is_empty());
    assert!(state.vertex_arrays.is_empty());
}

#[test]
fn test_limits() {
    let device = MockGraphicsDevice::new();
    assert_eq!(device.limits().max_vertex_attributes, 16);
}
