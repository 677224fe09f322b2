//! Buffer module
//!
//! Vertex/index buffers and vertex array objects feeding shader attributes.

pub mod vertex_array;

pub use vertex_array::{
    VertexBufferObject, ElementsBufferObject, VertexArrayObject,
    IndexElement,
};
