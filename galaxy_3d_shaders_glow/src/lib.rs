/*!
# Galaxy 3D Shaders - OpenGL Backend

OpenGL implementation of the `GraphicsDevice` trait of galaxy_3d_shaders,
using the glow library for GL bindings.

The device is created from an already-current `glow::Context` and must stay
on the thread owning that context.
*/

mod glow_device;
mod glow_types;

pub use glow_device::GlowGraphicsDevice;
pub use glow_types::{
    glsl_type_from_gl, stage_to_gl, buffer_target_to_gl, usage_to_gl, element_type_to_gl,
};
