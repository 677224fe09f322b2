//! Error types for the Galaxy3D shader subsystem
//!
//! This module defines the error types used internally by the shader
//! subsystem: backend failures, stage compilation and program linking
//! failures, include resolution failures and source loading failures.
//!
//! The public shader-manager surface does not propagate most of these
//! (it reports `bool` or falls back to the error shader), but they carry
//! the diagnostics that end up in compile logs.

use std::fmt;

/// Result type for Galaxy3D shader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D shader subsystem errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (OpenGL driver, mock device, etc.)
    BackendError(String),

    /// Invalid resource (unknown stage kind, empty buffer, etc.)
    InvalidResource(String),

    /// Initialization failed (context, manager, built-in shaders)
    InitializationFailed(String),

    /// A shader stage failed to compile
    CompileFailed {
        /// Name of the stage
        shader: String,
        /// Compiler diagnostic log
        log: String,
    },

    /// Stages failed to link into a program
    LinkFailed {
        /// Composite name of the program
        program: String,
        /// Linker diagnostic log
        log: String,
    },

    /// An `#include` directive names an include that does not exist
    MissingInclude {
        /// Shader containing the directive
        shader: String,
        /// Unresolved include name
        include: String,
    },

    /// Includes form a cycle (first and last entries are the same include)
    CircularInclude {
        /// Include chain, in inclusion order
        cycle: Vec<String>,
    },

    /// Malformed `#include` directive
    IncludeSyntax {
        /// Shader containing the directive
        shader: String,
        /// 1-based line of the directive
        line: usize,
        /// What is wrong with it
        message: String,
    },

    /// Source could not be read
    Io {
        /// Path that was read
        path: String,
        /// Underlying error message
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::CompileFailed { shader, log } => {
                write!(f, "Shader '{}' failed to compile: {}", shader, log)
            }
            Error::LinkFailed { program, log } => {
                write!(f, "Program '{}' failed to link: {}", program, log)
            }
            Error::MissingInclude { shader, include } => {
                write!(f, "Shader '{}': can't find the include file \"{}\"", shader, include)
            }
            Error::CircularInclude { cycle } => {
                write!(f, "Circular include: {}", cycle.join(" -> "))
            }
            Error::IncludeSyntax { shader, line, message } => {
                write!(f, "Shader '{}' line {}: syntax error in #include: {}", shader, line, message)
            }
            Error::Io { path, message } => write!(f, "Can't read '{}': {}", path, message),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an [`Error::BackendError`] from it
///
/// # Example
///
/// ```ignore
/// let err = engine_err!("galaxy3d::ShaderManager", "Stage '{}' is missing", name);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::engine_error!($source, "{}", message);
        $crate::galaxy3d::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return early with an [`Error::BackendError`]
///
/// # Example
///
/// ```ignore
/// engine_bail!("galaxy3d::ShaderManager", "Stage '{}' is missing", name);
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
