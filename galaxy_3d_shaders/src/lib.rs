/*!
# Galaxy 3D Shaders

Shader compile, link and uniform-binding subsystem of the Galaxy 3D engine.

This crate owns the life of GLSL programs on top of a backend-agnostic device
trait: stage sources are loaded from disk (or memory), `#include` directives
are expanded, compile flags are injected as `#define` lines, and stages are
compiled and linked into programs whose attributes and uniforms are reflected
so that setters can be called by name. Backend implementations (OpenGL via
glow, ...) provide the device.

## Architecture

- **GraphicsDevice**: Backend trait for stage/program/buffer calls
- **GraphicsContext**: Shared device wrapper tracking the bound program
- **ShaderManager**: Stage registry and program cache
- **Shader**: Linked program with reflected uniform and attribute setters
- **ShaderIncludeManager**: `#include` registry and expander
- **VertexBufferObject / ElementsBufferObject / VertexArrayObject**: Thin buffer wrappers
  fed to vertex attributes

When a requested program can't be built, the manager hands out a flat red
error program instead so rendering goes on.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod shader;
pub mod buffer;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine lifecycle owner
    pub use crate::engine::Engine;

    // Shader manager (main entry point)
    pub use crate::shader::ShaderManager;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, SeverityFilter};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // Device sub-module with the backend trait and shared context
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Shader sub-module
    pub mod shader {
        pub use crate::shader::*;
    }

    // Buffer sub-module
    pub mod buffer {
        pub use crate::buffer::*;
    }
}

// Re-export math library at crate root
pub use glam;
