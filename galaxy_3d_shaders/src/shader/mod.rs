//! Shader module
//!
//! Stage compilation with include expansion, program linking and
//! introspection, typed uniform setters and the shader manager caching it all.

mod compiled_shader;
mod program;
pub mod color;
pub mod compile_flags;
pub mod error_shader;
pub mod include_manager;
pub mod loader;
pub mod reflection;
pub mod shader_manager;

pub use color::Color;
pub use compiled_shader::CompiledShader;
pub use compile_flags::{ShaderCompileFlag, ShaderCompileFlags};
pub use error_shader::{
    DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER,
    ERROR_VERTEX_SRC, ERROR_FRAGMENT_SRC,
};
pub use include_manager::ShaderIncludeManager;
pub use loader::{SourceLoader, FileSystemLoader, MemorySourceLoader};
pub use program::Shader;
pub use reflection::{ProgramReflection, Attribute, Uniform};
pub use shader_manager::{ShaderManager, ShaderManagerConfig, ProgramKey};
