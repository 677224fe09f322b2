/// Vertex buffers, index buffers and vertex array objects
///
/// Thin owners of one GPU object each. Data is uploaded on construction and
/// the object is released on drop. Vertex buffers carry the layout used when
/// they feed a shader attribute (see `Shader::set_vertex_attribute`).

use bytemuck::Pod;
use crate::error::{Error, Result};
use crate::engine_warn;
use crate::graphics_device::{
    SharedGraphicsContext, GraphicsContext, BufferHandle, VertexArrayHandle, BufferTarget,
    BufferUsage, ElementType, VertexAttributePointer,
};

// ===== INDEX ELEMENT =====

/// Scalar types usable as index data
pub trait IndexElement: Pod {
    const ELEMENT_TYPE: ElementType;
}

impl IndexElement for i32 {
    const ELEMENT_TYPE: ElementType = ElementType::Int;
}

impl IndexElement for u32 {
    const ELEMENT_TYPE: ElementType = ElementType::UnsignedInt;
}

impl IndexElement for i16 {
    const ELEMENT_TYPE: ElementType = ElementType::Short;
}

impl IndexElement for u16 {
    const ELEMENT_TYPE: ElementType = ElementType::UnsignedShort;
}

// ===== BUFFER LAYOUT =====

/// Layout shared by vertex and index buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    components: i32,
    element_type: ElementType,
    normalize: bool,
    /// Number of scalar elements uploaded
    len: usize,
}

impl Layout {
    fn new(len: usize, components: i32, element_type: ElementType, what: &str) -> Result<Self> {
        if len == 0 {
            return Err(Error::InvalidResource(format!("{}: no data to upload", what)));
        }
        if !(1..=4).contains(&components) {
            return Err(Error::InvalidResource(format!(
                "{}: {} components per vertex (expected 1 to 4)", what, components
            )));
        }
        if len % components as usize != 0 {
            return Err(Error::InvalidResource(format!(
                "{}: {} elements is not a multiple of {} components", what, len, components
            )));
        }

        Ok(Self { components, element_type, normalize: false, len })
    }

    fn stride(&self) -> i32 {
        self.components * self.element_type.size_bytes()
    }
}

fn upload(
    context: &SharedGraphicsContext,
    target: BufferTarget,
    bytes: &[u8],
    usage: BufferUsage,
) -> Result<BufferHandle> {
    context.borrow_mut().device().create_buffer(target, bytes, usage)
}

fn release(context: &SharedGraphicsContext, what: &str, delete: impl FnOnce(&mut GraphicsContext)) {
    match context.try_borrow_mut() {
        Ok(mut ctx) => delete(&mut *ctx),
        Err(_) => engine_warn!("galaxy3d::Buffer", "Context busy while dropping {}, GPU object leaked", what),
    }
}

// ============================================================================
// VertexBufferObject
// ============================================================================

/// Float vertex data (positions, normals, texture coordinates...)
pub struct VertexBufferObject {
    context: SharedGraphicsContext,
    handle: BufferHandle,
    layout: Layout,
}

impl VertexBufferObject {
    /// Upload `data`, `components` floats per vertex
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResource`] for empty data, a component count outside
    /// 1..=4 or a length that isn't a multiple of it.
    pub fn new(context: &SharedGraphicsContext, data: &[f32], components: i32, usage: BufferUsage) -> Result<Self> {
        let layout = Layout::new(data.len(), components, ElementType::Float, "VertexBufferObject")?;
        let handle = upload(context, BufferTarget::Array, bytemuck::cast_slice(data), usage)?;

        Ok(Self { context: context.clone(), handle, layout })
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn components(&self) -> i32 {
        self.layout.components
    }

    pub fn element_type(&self) -> ElementType {
        self.layout.element_type
    }

    /// Stride in bytes between two vertices
    pub fn stride(&self) -> i32 {
        self.layout.stride()
    }

    pub fn vertex_count(&self) -> usize {
        self.layout.len / self.layout.components as usize
    }

    /// Attribute pointer covering the whole buffer
    pub fn pointer(&self) -> VertexAttributePointer {
        VertexAttributePointer {
            components: self.layout.components,
            element_type: self.layout.element_type,
            normalize: self.layout.normalize,
            stride: self.layout.stride(),
            offset: 0,
        }
    }

    pub fn bind(&self) {
        self.context.borrow_mut().device().bind_buffer(BufferTarget::Array, Some(self.handle));
    }

    pub fn unbind(context: &SharedGraphicsContext) {
        context.borrow_mut().device().bind_buffer(BufferTarget::Array, None);
    }
}

impl Drop for VertexBufferObject {
    fn drop(&mut self) {
        let handle = self.handle;
        release(&self.context, "vertex buffer", |ctx| ctx.device().delete_buffer(handle));
    }
}

// ============================================================================
// ElementsBufferObject
// ============================================================================

/// Index data
pub struct ElementsBufferObject {
    context: SharedGraphicsContext,
    handle: BufferHandle,
    layout: Layout,
}

impl ElementsBufferObject {
    /// Upload `data`, `components` indices per primitive
    ///
    /// # Errors
    ///
    /// Same as [`VertexBufferObject::new`].
    pub fn new<T: IndexElement>(
        context: &SharedGraphicsContext,
        data: &[T],
        components: i32,
        usage: BufferUsage,
    ) -> Result<Self> {
        let layout = Layout::new(data.len(), components, T::ELEMENT_TYPE, "ElementsBufferObject")?;
        let handle = upload(context, BufferTarget::ElementArray, bytemuck::cast_slice(data), usage)?;

        Ok(Self { context: context.clone(), handle, layout })
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    pub fn components(&self) -> i32 {
        self.layout.components
    }

    pub fn element_type(&self) -> ElementType {
        self.layout.element_type
    }

    pub fn index_count(&self) -> usize {
        self.layout.len
    }

    pub fn bind(&self) {
        self.context.borrow_mut().device().bind_buffer(BufferTarget::ElementArray, Some(self.handle));
    }

    pub fn unbind(context: &SharedGraphicsContext) {
        context.borrow_mut().device().bind_buffer(BufferTarget::ElementArray, None);
    }
}

impl Drop for ElementsBufferObject {
    fn drop(&mut self) {
        let handle = self.handle;
        release(&self.context, "index buffer", |ctx| ctx.device().delete_buffer(handle));
    }
}

// ============================================================================
// VertexArrayObject
// ============================================================================

/// Records attribute bindings and the index buffer while bound
pub struct VertexArrayObject {
    context: SharedGraphicsContext,
    handle: VertexArrayHandle,
}

impl VertexArrayObject {
    pub fn new(context: &SharedGraphicsContext) -> Result<Self> {
        let handle = context.borrow_mut().device().create_vertex_array()?;
        Ok(Self { context: context.clone(), handle })
    }

    pub fn handle(&self) -> VertexArrayHandle {
        self.handle
    }

    /// Bind (and start recording attribute state)
    pub fn bind(&self) {
        self.context.borrow_mut().device().bind_vertex_array(Some(self.handle));
    }

    pub fn unbind(context: &SharedGraphicsContext) {
        context.borrow_mut().device().bind_vertex_array(None);
    }
}

impl Drop for VertexArrayObject {
    fn drop(&mut self) {
        let handle = self.handle;
        release(&self.context, "vertex array", |ctx| ctx.device().delete_vertex_array(handle));
    }
}

#[cfg(test)]
#[path = "vertex_array_tests.rs"]
mod tests;
