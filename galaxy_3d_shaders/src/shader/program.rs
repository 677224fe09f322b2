/// Shader - a linked program and its typed uniform/attribute API
///
/// A `Shader` is created by [`ShaderManager`](super::ShaderManager) from one
/// vertex, one fragment and optionally one geometry stage. Right after the
/// link, the active attributes and uniforms are introspected once
/// ([`ProgramReflection`]).
///
/// Setters return `false` without touching the device when the name is not
/// an active uniform/attribute or when its type doesn't fit the value. They
/// make the program current first; the bind is elided when it already is.

use glam::{Affine3A, Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
use crate::error::{Error, Result};
use crate::graphics_device::{
    SharedGraphicsContext, GlslType, ProgramHandle, StageHandle,
    UniformValue, BufferTarget, ElementType, VertexAttributePointer,
};
use crate::buffer::VertexBufferObject;
use crate::{engine_debug, engine_warn};
use super::color::Color;
use super::reflection::{ProgramReflection, Attribute, Uniform};

pub struct Shader {
    context: SharedGraphicsContext,
    handle: ProgramHandle,
    /// Composite key the program was linked under
    name: String,
    reflection: ProgramReflection,
    link_log: String,
}

impl Shader {
    /// Link stages into a program and introspect it
    ///
    /// # Errors
    ///
    /// [`Error::LinkFailed`] with the linker log (the failed program object is
    /// released).
    pub(crate) fn link(context: &SharedGraphicsContext, name: &str, stages: &[StageHandle]) -> Result<Self> {
        let mut ctx = context.borrow_mut();
        let output = ctx.device().link_program(stages)?;

        if !output.success {
            ctx.device().delete_program(output.handle);
            return Err(Error::LinkFailed { program: name.to_string(), log: output.log });
        }

        let reflection = ProgramReflection::build(ctx.device(), output.handle);
        engine_debug!(
            "galaxy3d::Shader",
            "Linked {} ({} attribute(s), {} uniform(s))",
            name, reflection.attribute_count(), reflection.uniform_count()
        );

        Ok(Self {
            context: context.clone(),
            handle: output.handle,
            name: name.to_string(),
            reflection,
            link_log: output.log,
        })
    }

    // ===== BINDING =====

    /// Make this program current (no device call if it already is)
    pub fn bind(&self) {
        self.context.borrow_mut().bind_program(self.handle);
    }

    /// Unbind whatever program is current on `context`
    pub fn unbind(context: &SharedGraphicsContext) {
        context.borrow_mut().unbind_program();
    }

    /// Check whether this program is the context's current one
    pub fn is_bound(&self) -> bool {
        self.context.borrow().bound_program() == Some(self.handle)
    }

    // ===== PROBES =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    /// Linker output (warnings only, since the program linked)
    pub fn link_log(&self) -> &str {
        &self.link_log
    }

    pub fn reflection(&self) -> &ProgramReflection {
        &self.reflection
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.reflection.uniform(name).is_some()
    }

    pub fn has_vertex_attribute(&self, name: &str) -> bool {
        self.reflection.attribute(name).is_some()
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.reflection.uniform(name)
    }

    pub fn vertex_attribute(&self, name: &str) -> Option<&Attribute> {
        self.reflection.attribute(name)
    }

    // ===== SCALAR SETTERS =====

    /// Set a `float` uniform
    pub fn set_uniform_f32(&self, name: &str, value: f32) -> bool {
        self.upload(name, 0, |kind| kind == GlslType::Float, |_| UniformValue::Float(value))
    }

    /// Set an `int`, `bool` or sampler uniform
    pub fn set_uniform_i32(&self, name: &str, value: i32) -> bool {
        self.upload(name, 0, accepts_int, |_| UniformValue::Int(value))
    }

    /// Point the sampler of a texture unit at that unit
    ///
    /// Samplers follow the one-uniform-per-unit convention: unit 2 of
    /// `uTexture` is the uniform `uTexture2`.
    pub fn set_uniform_sampler(&self, name: &str, unit: u32) -> bool {
        let uniform_name = format!("{}{}", name, unit);
        self.upload(&uniform_name, 0, |kind| kind.is_sampler(), |_| UniformValue::Int(unit as i32))
    }

    // ===== VECTOR SETTERS =====
    //
    // Vectors fit vec2/vec3/vec4 uniforms: extra components are dropped,
    // missing ones are 1.0.

    pub fn set_uniform_vec2(&self, name: &str, value: Vec2) -> bool {
        self.set_vector(name, 0, [value.x, value.y, 1.0, 1.0])
    }

    pub fn set_uniform_vec3(&self, name: &str, value: Vec3) -> bool {
        self.set_vector(name, 0, value.extend(1.0).to_array())
    }

    pub fn set_uniform_vec4(&self, name: &str, value: Vec4) -> bool {
        self.set_vector(name, 0, value.to_array())
    }

    pub fn set_uniform_color(&self, name: &str, color: Color) -> bool {
        self.set_vector(name, 0, color.to_array())
    }

    /// Quaternion as `(x, y, z, w)`
    pub fn set_uniform_quat(&self, name: &str, value: Quat) -> bool {
        self.set_vector(name, 0, value.to_array())
    }

    // ===== MATRIX SETTERS =====

    /// Set a `mat4` uniform (`transpose` = `value` is row-major)
    pub fn set_uniform_mat4(&self, name: &str, value: &Mat4, transpose: bool) -> bool {
        self.set_matrix(name, 0, value, transpose)
    }

    /// Set a `mat4` uniform to the inverse of `value`
    pub fn set_uniform_mat4_inverse(&self, name: &str, value: &Mat4, transpose: bool) -> bool {
        self.set_matrix(name, 0, &value.inverse(), transpose)
    }

    /// Set a `mat3` (linear part) or `mat4` uniform from an affine transform
    pub fn set_uniform_affine(&self, name: &str, value: &Affine3A, transpose: bool) -> bool {
        self.set_affine(name, 0, value, transpose)
    }

    /// Affine variant of [`set_uniform_mat4_inverse`](Self::set_uniform_mat4_inverse)
    pub fn set_uniform_affine_inverse(&self, name: &str, value: &Affine3A, transpose: bool) -> bool {
        self.set_affine(name, 0, &value.inverse(), transpose)
    }

    // ===== ARRAY ELEMENT SETTERS =====

    pub fn set_uniform_array_f32(&self, name: &str, index: usize, value: f32) -> bool {
        self.upload(name, index, |kind| kind == GlslType::Float, |_| UniformValue::Float(value))
    }

    pub fn set_uniform_array_vec3(&self, name: &str, index: usize, value: Vec3) -> bool {
        self.set_vector(name, index, value.extend(1.0).to_array())
    }

    pub fn set_uniform_array_vec4(&self, name: &str, index: usize, value: Vec4) -> bool {
        self.set_vector(name, index, value.to_array())
    }

    pub fn set_uniform_array_mat4(&self, name: &str, index: usize, value: &Mat4, transpose: bool) -> bool {
        self.set_matrix(name, index, value, transpose)
    }

    pub fn set_uniform_array_mat4_inverse(&self, name: &str, index: usize, value: &Mat4, transpose: bool) -> bool {
        self.set_matrix(name, index, &value.inverse(), transpose)
    }

    pub fn set_uniform_array_affine(&self, name: &str, index: usize, value: &Affine3A, transpose: bool) -> bool {
        self.set_affine(name, index, value, transpose)
    }

    pub fn set_uniform_array_affine_inverse(&self, name: &str, index: usize, value: &Affine3A, transpose: bool) -> bool {
        self.set_affine(name, index, &value.inverse(), transpose)
    }

    // ===== VERTEX ATTRIBUTES =====

    /// Feed an attribute from a whole vertex buffer
    ///
    /// Float buffers must have as many components as the attribute
    /// (`float` = 1 ... `vec4` = 4).
    pub fn set_vertex_attribute(&self, name: &str, buffer: &VertexBufferObject) -> bool {
        self.attach_attribute(name, buffer, buffer.pointer())
    }

    /// Feed an attribute from part of an interleaved vertex buffer
    ///
    /// `components` overrides the buffer's component count and `offset` is
    /// the byte offset of the first component; the stride stays the buffer's.
    pub fn set_vertex_attribute_range(
        &self,
        name: &str,
        buffer: &VertexBufferObject,
        components: i32,
        offset: i32,
    ) -> bool {
        if !(1..=4).contains(&components) || offset < 0 {
            engine_warn!(
                "galaxy3d::Shader",
                "{}: invalid range for attribute {} ({} component(s) at offset {})",
                self.name, name, components, offset
            );
            return false;
        }

        let pointer = VertexAttributePointer { components, offset, ..buffer.pointer() };
        self.attach_attribute(name, buffer, pointer)
    }

    // ===== INTERNALS =====

    fn set_vector(&self, name: &str, index: usize, v: [f32; 4]) -> bool {
        self.upload(name, index, accepts_vector, |kind| match kind {
            GlslType::FloatVec2 => UniformValue::Vec2([v[0], v[1]]),
            GlslType::FloatVec3 => UniformValue::Vec3([v[0], v[1], v[2]]),
            _ => UniformValue::Vec4(v),
        })
    }

    fn set_matrix(&self, name: &str, index: usize, value: &Mat4, transpose: bool) -> bool {
        let data = value.to_cols_array();
        self.upload(name, index, |kind| kind == GlslType::FloatMat4, |_| UniformValue::Mat4 { data, transpose })
    }

    fn set_affine(&self, name: &str, index: usize, value: &Affine3A, transpose: bool) -> bool {
        let value = *value;
        self.upload(name, index, accepts_affine, |kind| match kind {
            GlslType::FloatMat3 => UniformValue::Mat3 {
                data: Mat3::from(value.matrix3).to_cols_array(),
                transpose,
            },
            _ => UniformValue::Mat4 { data: Mat4::from(value).to_cols_array(), transpose },
        })
    }

    /// Upload one value to element `index` of a uniform
    fn upload(
        &self,
        name: &str,
        index: usize,
        accepts: impl Fn(GlslType) -> bool,
        value: impl FnOnce(GlslType) -> UniformValue,
    ) -> bool {
        let Some(uniform) = self.reflection.uniform(name) else {
            return false;
        };

        if !accepts(uniform.kind) {
            engine_warn!(
                "galaxy3d::Shader",
                "{}: uniform {} has type {:?}, which doesn't fit this setter",
                self.name, name, uniform.kind
            );
            return false;
        }

        let Some(location) = uniform.element_location(index) else {
            engine_warn!(
                "galaxy3d::Shader",
                "{}: index {} out of bounds for uniform {} ({} element(s))",
                self.name, index, name, uniform.element_count()
            );
            return false;
        };

        let mut ctx = self.context.borrow_mut();
        ctx.bind_program(self.handle);
        ctx.device().set_uniform(location, value(uniform.kind));
        true
    }

    fn attach_attribute(&self, name: &str, buffer: &VertexBufferObject, pointer: VertexAttributePointer) -> bool {
        let Some(attribute) = self.reflection.attribute(name) else {
            return false;
        };

        if pointer.element_type == ElementType::Float
            && attribute.kind.float_components() != Some(pointer.components)
        {
            engine_warn!(
                "galaxy3d::Shader",
                "{}: attribute {} has type {:?} but is fed {} float component(s)",
                self.name, name, attribute.kind, pointer.components
            );
            return false;
        }

        let mut ctx = self.context.borrow_mut();
        let device = ctx.device();
        device.bind_buffer(BufferTarget::Array, Some(buffer.handle()));
        device.enable_vertex_attribute(attribute.location, pointer);
        true
    }
}

fn accepts_int(kind: GlslType) -> bool {
    matches!(kind, GlslType::Int | GlslType::Bool) || kind.is_sampler()
}

fn accepts_vector(kind: GlslType) -> bool {
    matches!(kind, GlslType::FloatVec2 | GlslType::FloatVec3 | GlslType::FloatVec4)
}

fn accepts_affine(kind: GlslType) -> bool {
    matches!(kind, GlslType::FloatMat3 | GlslType::FloatMat4)
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        match self.context.try_borrow_mut() {
            Ok(mut ctx) => {
                ctx.forget_program(self.handle);
                ctx.device().delete_program(self.handle);
            }
            Err(_) => engine_warn!(
                "galaxy3d::Shader",
                "Context busy while dropping program {}, GPU object leaked", self.name
            ),
        }
    }
}

#[cfg(test)]
#[path = "program_tests.rs"]
mod tests;
