/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// The mock "compiles" GLSL by scanning top-level declarations:
/// - compilation fails when a line starts with `#error`,
/// - `in`/`attribute` declarations of the vertex stage become active attributes,
/// - `uniform` declarations of every stage become active uniforms (arrays are
///   reported as `name[0]`, like real drivers do),
/// - linking fails when a fragment input is not written by the previous stage,
///   or when the stage set is not one vertex + one fragment (+ one geometry).
///
/// Every call is recorded by name in [`MockState::calls`], and every uniform
/// upload in [`MockState::uniform_uploads`].

use std::sync::{Arc, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::Result;
use crate::engine_bail;
use crate::graphics_device::{
    GraphicsDevice, ShaderStage, GlslType, ActiveResource,
    StageHandle, ProgramHandle, BufferHandle, VertexArrayHandle, UniformLocation,
    CompileOutput, LinkOutput, UniformValue, BufferTarget, BufferUsage,
    VertexAttributePointer, DeviceLimits,
};

// ============================================================================
// Mock objects
// ============================================================================

/// One declaration found in a mock stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockDeclaration {
    pub name: String,
    pub kind: GlslType,
    pub size: i32,
}

/// A compiled mock stage
#[derive(Debug, Clone)]
pub struct MockStage {
    pub stage: ShaderStage,
    pub source: String,
    pub inputs: Vec<MockDeclaration>,
    pub outputs: Vec<MockDeclaration>,
    pub uniforms: Vec<MockDeclaration>,
}

/// A linked mock program
#[derive(Debug, Clone, Default)]
pub struct MockProgram {
    pub attributes: Vec<ActiveResource>,
    pub uniforms: Vec<ActiveResource>,
    pub attribute_locations: FxHashMap<String, u32>,
    pub uniform_locations: FxHashMap<String, UniformLocation>,
}

/// Everything the mock has recorded, shared with the test through an `Arc`
#[derive(Debug, Default)]
pub struct MockState {
    /// Name of every device call, in order
    pub calls: Vec<String>,
    /// Every `set_uniform` call
    pub uniform_uploads: Vec<(UniformLocation, UniformValue)>,
    /// Every `enable_vertex_attribute` call
    pub attribute_pointers: Vec<(u32, VertexAttributePointer)>,
    /// Live stages by handle
    pub stages: FxHashMap<u32, MockStage>,
    /// Live programs by handle
    pub programs: FxHashMap<u32, MockProgram>,
    /// Live buffers by handle (uploaded bytes)
    pub buffers: FxHashMap<u32, Vec<u8>>,
    /// Live vertex arrays
    pub vertex_arrays: FxHashSet<u32>,
    /// Current program as seen by the device
    pub current_program: Option<ProgramHandle>,
    next_handle: u32,
}

impl MockState {
    /// Number of recorded calls with this name
    pub fn call_count(&self, name: &str) -> usize {
        self.calls.iter().filter(|c| c.as_str() == name).count()
    }

    fn next_handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Mock device that records calls without a GPU
#[derive(Debug)]
pub struct MockGraphicsDevice {
    pub state: Arc<Mutex<MockState>>,
    pub limits: DeviceLimits,
}

impl MockGraphicsDevice {
    /// Create a new mock device
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            limits: DeviceLimits {
                max_vertex_attributes: 16,
                max_vertex_uniform_components: 1024,
                max_fragment_uniform_components: 1024,
                max_combined_vertex_uniform_components: 2048,
            },
        }
    }

    /// Shared handle on the recorded state (clone it before moving the device)
    pub fn state(&self) -> Arc<Mutex<MockState>> {
        self.state.clone()
    }

    fn record(&self, call: &str) {
        self.state.lock().unwrap().calls.push(call.to_string());
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<CompileOutput> {
        self.record("compile_stage");
        let mut state = self.state.lock().unwrap();
        let handle = state.next_handle();

        let error_line = source
            .lines()
            .enumerate()
            .find(|(_, line)| line.trim_start().starts_with("#error"));
        if let Some((index, line)) = error_line {
            return Ok(CompileOutput {
                handle: StageHandle(handle),
                success: false,
                log: format!("0:{}: {}", index + 1, line.trim()),
            });
        }

        let (inputs, outputs, uniforms) = scan_declarations(stage, source);
        state.stages.insert(handle, MockStage {
            stage,
            source: source.to_string(),
            inputs,
            outputs,
            uniforms,
        });

        Ok(CompileOutput { handle: StageHandle(handle), success: true, log: String::new() })
    }

    fn delete_stage(&mut self, stage: StageHandle) {
        self.record("delete_stage");
        self.state.lock().unwrap().stages.remove(&stage.0);
    }

    fn link_program(&mut self, stages: &[StageHandle]) -> Result<LinkOutput> {
        self.record("link_program");
        let mut state = self.state.lock().unwrap();

        let mut linked = Vec::with_capacity(stages.len());
        for handle in stages {
            match state.stages.get(&handle.0) {
                Some(stage) => linked.push(stage.clone()),
                None => engine_bail!("galaxy3d::mock", "link_program: unknown stage {}", handle.0),
            }
        }

        let handle = ProgramHandle(state.next_handle());
        match link_mock_stages(&linked) {
            Ok(program) => {
                state.programs.insert(handle.0, program);
                Ok(LinkOutput { handle, success: true, log: String::new() })
            }
            Err(log) => Ok(LinkOutput { handle, success: false, log }),
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.record("delete_program");
        let mut state = self.state.lock().unwrap();
        state.programs.remove(&program.0);
        if state.current_program == Some(program) {
            state.current_program = None;
        }
    }

    fn active_attributes(&mut self, program: ProgramHandle) -> Vec<ActiveResource> {
        self.record("active_attributes");
        let state = self.state.lock().unwrap();
        state.programs.get(&program.0).map(|p| p.attributes.clone()).unwrap_or_default()
    }

    fn active_uniforms(&mut self, program: ProgramHandle) -> Vec<ActiveResource> {
        self.record("active_uniforms");
        let state = self.state.lock().unwrap();
        state.programs.get(&program.0).map(|p| p.uniforms.clone()).unwrap_or_default()
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        self.record("attribute_location");
        let state = self.state.lock().unwrap();
        state.programs.get(&program.0)?.attribute_locations.get(name).copied()
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.record("uniform_location");
        let state = self.state.lock().unwrap();
        state.programs.get(&program.0)?.uniform_locations.get(name).copied()
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        self.record("use_program");
        self.state.lock().unwrap().current_program = program;
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        self.record("set_uniform");
        self.state.lock().unwrap().uniform_uploads.push((location, value));
    }

    fn create_buffer(&mut self, _target: BufferTarget, data: &[u8], _usage: BufferUsage) -> Result<BufferHandle> {
        self.record("create_buffer");
        let mut state = self.state.lock().unwrap();
        let handle = state.next_handle();
        state.buffers.insert(handle, data.to_vec());
        Ok(BufferHandle(handle))
    }

    fn bind_buffer(&mut self, _target: BufferTarget, _buffer: Option<BufferHandle>) {
        self.record("bind_buffer");
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.record("delete_buffer");
        self.state.lock().unwrap().buffers.remove(&buffer.0);
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle> {
        self.record("create_vertex_array");
        let mut state = self.state.lock().unwrap();
        let handle = state.next_handle();
        state.vertex_arrays.insert(handle);
        Ok(VertexArrayHandle(handle))
    }

    fn bind_vertex_array(&mut self, _vertex_array: Option<VertexArrayHandle>) {
        self.record("bind_vertex_array");
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.record("delete_vertex_array");
        self.state.lock().unwrap().vertex_arrays.remove(&vertex_array.0);
    }

    fn enable_vertex_attribute(&mut self, location: u32, pointer: VertexAttributePointer) {
        self.record("enable_vertex_attribute");
        self.state.lock().unwrap().attribute_pointers.push((location, pointer));
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }
}

// ============================================================================
// Declaration scanning
// ============================================================================

/// Qualifiers skipped before the storage keyword (`layout(...)` is stripped first)
const QUALIFIERS: &[&str] = &[
    "flat", "smooth", "noperspective", "centroid", "invariant",
    "highp", "mediump", "lowp", "const",
];

/// Scan top-level `in`/`out`/`attribute`/`varying`/`uniform` declarations
fn scan_declarations(
    stage: ShaderStage,
    source: &str,
) -> (Vec<MockDeclaration>, Vec<MockDeclaration>, Vec<MockDeclaration>) {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();
    let mut uniforms = Vec::new();

    for line in source.lines() {
        let mut line = line.trim();
        if line.starts_with("layout") {
            match line.split_once(')') {
                Some((_, rest)) => line = rest,
                None => continue,
            }
        }

        let mut tokens = line
            .split_whitespace()
            .skip_while(|t| QUALIFIERS.contains(t));

        let (Some(storage), Some(type_name), Some(name)) = (tokens.next(), tokens.next(), tokens.next()) else {
            continue;
        };
        let Some(declaration) = parse_declarator(type_name, name) else {
            continue;
        };

        match (storage, stage) {
            ("uniform", _) => uniforms.push(declaration),
            ("in" | "attribute", _) => inputs.push(declaration),
            ("varying", ShaderStage::Vertex) => outputs.push(declaration),
            ("varying", _) => inputs.push(declaration),
            ("out", _) => outputs.push(declaration),
            _ => {}
        }
    }

    (inputs, outputs, uniforms)
}

/// Parse `name;`, `name[4];` or `name[];` into a declaration
fn parse_declarator(type_name: &str, declarator: &str) -> Option<MockDeclaration> {
    let declarator = declarator.trim_end_matches(';');
    let (name, size) = match declarator.split_once('[') {
        Some((name, rest)) => {
            let count = rest.trim_end_matches(']');
            (name, count.parse::<i32>().unwrap_or(1))
        }
        None => (declarator, 1),
    };

    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    Some(MockDeclaration { name: name.to_string(), kind: glsl_type_from_name(type_name), size })
}

/// GLSL type keyword to type tag
pub fn glsl_type_from_name(type_name: &str) -> GlslType {
    match type_name {
        "float" => GlslType::Float,
        "vec2" => GlslType::FloatVec2,
        "vec3" => GlslType::FloatVec3,
        "vec4" => GlslType::FloatVec4,
        "int" => GlslType::Int,
        "ivec2" => GlslType::IntVec2,
        "ivec3" => GlslType::IntVec3,
        "ivec4" => GlslType::IntVec4,
        "uint" => GlslType::UnsignedInt,
        "bool" => GlslType::Bool,
        "mat2" => GlslType::FloatMat2,
        "mat3" => GlslType::FloatMat3,
        "mat4" => GlslType::FloatMat4,
        "sampler2D" => GlslType::Sampler2D,
        "sampler3D" => GlslType::Sampler3D,
        "samplerCube" => GlslType::SamplerCube,
        "sampler2DShadow" => GlslType::Sampler2DShadow,
        "sampler2DArray" => GlslType::Sampler2DArray,
        _ => GlslType::Other(0),
    }
}

/// Link mock stages, building the reflection data a driver would report
fn link_mock_stages(stages: &[MockStage]) -> std::result::Result<MockProgram, String> {
    let count = |kind: ShaderStage| stages.iter().filter(|s| s.stage == kind).count();
    if count(ShaderStage::Vertex) != 1 || count(ShaderStage::Fragment) != 1 || count(ShaderStage::Geometry) > 1 {
        return Err("error: a program needs one vertex and one fragment stage".to_string());
    }

    let find = |kind: ShaderStage| stages.iter().find(|s| s.stage == kind);
    let (Some(vertex), Some(fragment)) = (find(ShaderStage::Vertex), find(ShaderStage::Fragment)) else {
        return Err("error: missing stage".to_string());
    };
    let feeding_fragment = find(ShaderStage::Geometry).unwrap_or(vertex);

    for input in &fragment.inputs {
        if !feeding_fragment.outputs.iter().any(|o| o.name == input.name) {
            return Err(format!(
                "error: fragment shader input '{}' is not written by the previous stage",
                input.name
            ));
        }
    }

    let mut program = MockProgram::default();

    for (location, input) in vertex.inputs.iter().enumerate() {
        program.attributes.push(ActiveResource { name: input.name.clone(), kind: input.kind, size: 1 });
        program.attribute_locations.insert(input.name.clone(), location as u32);
    }

    let mut next_location = 0u32;
    for stage in stages {
        for uniform in &stage.uniforms {
            if program.uniforms.iter().any(|u| u.name.trim_end_matches("[0]") == uniform.name) {
                continue;
            }

            let reported = if uniform.size > 1 { format!("{}[0]", uniform.name) } else { uniform.name.clone() };
            program.uniforms.push(ActiveResource { name: reported, kind: uniform.kind, size: uniform.size });
            program.uniform_locations.insert(uniform.name.clone(), UniformLocation(next_location));
            for i in 0..uniform.size {
                program.uniform_locations.insert(
                    format!("{}[{}]", uniform.name, i),
                    UniformLocation(next_location + i as u32),
                );
            }
            next_location += uniform.size as u32;
        }
    }

    Ok(program)
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
