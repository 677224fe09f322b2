/// GlowGraphicsDevice - OpenGL implementation of the GraphicsDevice trait

use std::num::NonZeroU32;
use glow::HasContext;
use galaxy_3d_shaders::galaxy3d::{Error, Result};
use galaxy_3d_shaders::galaxy3d::device::{
    ActiveResource, BufferHandle, BufferTarget, BufferUsage, CompileOutput, DeviceLimits,
    GraphicsDevice, LinkOutput, ProgramHandle, ShaderStage, StageHandle, UniformLocation,
    UniformValue, VertexArrayHandle, VertexAttributePointer,
};
use galaxy_3d_shaders::{engine_err, engine_warn};
use crate::glow_types::{
    glsl_type_from_gl, stage_to_gl, buffer_target_to_gl, usage_to_gl, element_type_to_gl,
};

const SOURCE: &str = "galaxy3d::glow";

/// OpenGL device backed by a `glow::Context`
pub struct GlowGraphicsDevice {
    gl: glow::Context,
}

impl GlowGraphicsDevice {
    /// Wrap a GL context
    ///
    /// # Safety
    ///
    /// `gl` must be current on the calling thread for the whole life of the
    /// device, and every GL object this device creates must be released
    /// before the context is destroyed.
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Underlying GL context
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    fn parameter(&self, parameter: u32) -> u32 {
        let value = unsafe { self.gl.get_parameter_i32(parameter) };
        value.max(0) as u32
    }
}

// ===== HANDLE CONVERSIONS =====

fn native_shader(stage: StageHandle) -> Option<glow::NativeShader> {
    NonZeroU32::new(stage.0).map(glow::NativeShader)
}

fn native_program(program: ProgramHandle) -> Option<glow::NativeProgram> {
    NonZeroU32::new(program.0).map(glow::NativeProgram)
}

fn native_buffer(buffer: BufferHandle) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(buffer.0).map(glow::NativeBuffer)
}

fn native_vertex_array(vertex_array: VertexArrayHandle) -> Option<glow::NativeVertexArray> {
    NonZeroU32::new(vertex_array.0).map(glow::NativeVertexArray)
}

impl GraphicsDevice for GlowGraphicsDevice {
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<CompileOutput> {
        unsafe {
            let shader = self.gl.create_shader(stage_to_gl(stage)).map_err(|e| {
                engine_err!(SOURCE, "Failed to create {:?} shader object: {}", stage, e)
            })?;

            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);

            Ok(CompileOutput {
                handle: StageHandle(shader.0.get()),
                success: self.gl.get_shader_compile_status(shader),
                log: self.gl.get_shader_info_log(shader),
            })
        }
    }

    fn delete_stage(&mut self, stage: StageHandle) {
        if let Some(shader) = native_shader(stage) {
            unsafe { self.gl.delete_shader(shader) };
        }
    }

    fn link_program(&mut self, stages: &[StageHandle]) -> Result<LinkOutput> {
        let shaders = stages
            .iter()
            .map(|&stage| {
                native_shader(stage).ok_or_else(|| {
                    Error::InvalidResource(format!("Null stage handle in link of {} stage(s)", stages.len()))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        unsafe {
            let program = self.gl.create_program().map_err(|e| {
                engine_err!(SOURCE, "Failed to create program object: {}", e)
            })?;

            for &shader in &shaders {
                self.gl.attach_shader(program, shader);
            }
            self.gl.link_program(program);

            let success = self.gl.get_program_link_status(program);
            let log = self.gl.get_program_info_log(program);

            // Stages stay owned by the shader manager
            for &shader in &shaders {
                self.gl.detach_shader(program, shader);
            }

            Ok(LinkOutput { handle: ProgramHandle(program.0.get()), success, log })
        }
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(program) = native_program(program) {
            unsafe { self.gl.delete_program(program) };
        }
    }

    fn active_attributes(&mut self, program: ProgramHandle) -> Vec<ActiveResource> {
        let Some(program) = native_program(program) else {
            return Vec::new();
        };

        unsafe {
            let count = self.gl.get_active_attributes(program);
            (0..count)
                .filter_map(|index| self.gl.get_active_attribute(program, index))
                .map(|attribute| ActiveResource {
                    name: attribute.name,
                    kind: glsl_type_from_gl(attribute.atype),
                    size: attribute.size,
                })
                .collect()
        }
    }

    fn active_uniforms(&mut self, program: ProgramHandle) -> Vec<ActiveResource> {
        let Some(program) = native_program(program) else {
            return Vec::new();
        };

        unsafe {
            let count = self.gl.get_active_uniforms(program);
            (0..count)
                .filter_map(|index| self.gl.get_active_uniform(program, index))
                .map(|uniform| ActiveResource {
                    name: uniform.name,
                    kind: glsl_type_from_gl(uniform.utype),
                    size: uniform.size,
                })
                .collect()
        }
    }

    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32> {
        let program = native_program(program)?;
        unsafe { self.gl.get_attrib_location(program, name) }
    }

    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let program = native_program(program)?;
        unsafe { self.gl.get_uniform_location(program, name) }.map(|location| UniformLocation(location.0))
    }

    fn use_program(&mut self, program: Option<ProgramHandle>) {
        unsafe { self.gl.use_program(program.and_then(native_program)) };
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        let location = Some(&location);

        unsafe {
            match value {
                UniformValue::Float(x) => self.gl.uniform_1_f32(location, x),
                UniformValue::Int(x) => self.gl.uniform_1_i32(location, x),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(location, x, y),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(location, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(location, x, y, z, w),
                UniformValue::Mat3 { data, transpose } => {
                    self.gl.uniform_matrix_3_f32_slice(location, transpose, &data)
                }
                UniformValue::Mat4 { data, transpose } => {
                    self.gl.uniform_matrix_4_f32_slice(location, transpose, &data)
                }
            }
        }
    }

    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<BufferHandle> {
        let gl_target = buffer_target_to_gl(target);

        unsafe {
            let buffer = self.gl.create_buffer().map_err(|e| {
                engine_err!(SOURCE, "Failed to create {:?} buffer: {}", target, e)
            })?;

            self.gl.bind_buffer(gl_target, Some(buffer));
            self.gl.buffer_data_u8_slice(gl_target, data, usage_to_gl(usage));
            self.gl.bind_buffer(gl_target, None);

            Ok(BufferHandle(buffer.0.get()))
        }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl.bind_buffer(buffer_target_to_gl(target), buffer.and_then(native_buffer));
        }
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        if let Some(buffer) = native_buffer(buffer) {
            unsafe { self.gl.delete_buffer(buffer) };
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle> {
        let vertex_array = unsafe { self.gl.create_vertex_array() }.map_err(|e| {
            engine_err!(SOURCE, "Failed to create vertex array: {}", e)
        })?;
        Ok(VertexArrayHandle(vertex_array.0.get()))
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>) {
        unsafe { self.gl.bind_vertex_array(vertex_array.and_then(native_vertex_array)) };
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        if let Some(vertex_array) = native_vertex_array(vertex_array) {
            unsafe { self.gl.delete_vertex_array(vertex_array) };
        }
    }

    fn enable_vertex_attribute(&mut self, location: u32, pointer: VertexAttributePointer) {
        if !(1..=4).contains(&pointer.components) {
            engine_warn!(SOURCE, "Ignoring attribute {} with {} component(s)", location, pointer.components);
            return;
        }

        unsafe {
            self.gl.enable_vertex_attrib_array(location);
            self.gl.vertex_attrib_pointer_f32(
                location,
                pointer.components,
                element_type_to_gl(pointer.element_type),
                pointer.normalize,
                pointer.stride,
                pointer.offset,
            );
        }
    }

    fn limits(&self) -> DeviceLimits {
        DeviceLimits {
            max_vertex_attributes: self.parameter(glow::MAX_VERTEX_ATTRIBS),
            max_vertex_uniform_components: self.parameter(glow::MAX_VERTEX_UNIFORM_COMPONENTS),
            max_fragment_uniform_components: self.parameter(glow::MAX_FRAGMENT_UNIFORM_COMPONENTS),
            max_combined_vertex_uniform_components: self
                .parameter(glow::MAX_COMBINED_VERTEX_UNIFORM_COMPONENTS),
        }
    }
}
