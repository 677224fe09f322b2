/// Galaxy3D Engine - lifecycle owner of the graphics context and its shader manager
///
/// The shader subsystem is single-threaded (its context is shared as
/// `Rc<RefCell<_>>`), so the engine is an owned value rather than a global
/// singleton: create it on the thread owning the graphics context and pass it
/// (or its shader manager) to whoever draws.
///
/// Only the logger is process-wide: `Engine::set_logger` / `Engine::log`
/// are associated functions backed by a static, usable from any thread.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, GraphicsContext, SharedGraphicsContext};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::shader::{ShaderManager, ShaderManagerConfig, SourceLoader};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

// ===== PUBLIC API =====

/// Owner of the graphics context and the shader manager built on it
///
/// # Example
///
/// ```ignore
/// use galaxy_3d_shaders::galaxy3d::{Engine, shader::{FileSystemLoader, ShaderManagerConfig}};
/// use galaxy_3d_shaders_glow::GlowGraphicsDevice;
///
/// let device = unsafe { GlowGraphicsDevice::new(gl) };
/// let loader = FileSystemLoader::new("data/shaders");
/// let mut engine = Engine::new(device, ShaderManagerConfig::default(), Some(Box::new(loader)));
///
/// let shader = engine.shader_manager_mut()?.get_or_link_shader("Model.vert", "Model.frag", "")?;
/// shader.bind();
///
/// engine.shutdown();
/// # Ok::<(), galaxy_3d_shaders::galaxy3d::Error>(())
/// ```
pub struct Engine {
    context: SharedGraphicsContext,
    shader_manager: Option<ShaderManager>,
}

impl Engine {
    /// Wrap a device in a graphics context and create the shader manager on it
    pub fn new<D: GraphicsDevice + 'static>(
        device: D,
        config: ShaderManagerConfig,
        loader: Option<Box<dyn SourceLoader>>,
    ) -> Self {
        let context = GraphicsContext::shared(device);
        let shader_manager = ShaderManager::new(context.clone(), config, loader);
        crate::engine_info!("galaxy3d::Engine", "Shader manager created");

        Self { context, shader_manager: Some(shader_manager) }
    }

    /// Current graphics context
    pub fn context(&self) -> &SharedGraphicsContext {
        &self.context
    }

    /// Shader manager of the current context
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has been shut down.
    pub fn shader_manager(&self) -> Result<&ShaderManager> {
        self.shader_manager.as_ref().ok_or_else(Self::not_running)
    }

    /// Mutable access to the shader manager of the current context
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has been shut down.
    pub fn shader_manager_mut(&mut self) -> Result<&mut ShaderManager> {
        self.shader_manager.as_mut().ok_or_else(Self::not_running)
    }

    /// Check whether the engine still owns a shader manager
    pub fn is_running(&self) -> bool {
        self.shader_manager.is_some()
    }

    /// Replace the graphics context (e.g. after a resolution change)
    ///
    /// The shader manager is torn down (releasing every GPU object it owns
    /// on the old context) and rebuilt on the new one from the sources it
    /// had loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine has been shut down.
    pub fn recreate_context<D: GraphicsDevice + 'static>(&mut self, device: D) -> Result<()> {
        let manager = self.shader_manager.take().ok_or_else(Self::not_running)?;

        let context = GraphicsContext::shared(device);
        self.shader_manager = Some(manager.rebuild(context.clone()));
        self.context = context;

        crate::engine_info!("galaxy3d::Engine", "Graphics context recreated");
        Ok(())
    }

    /// Tear down the shader manager, then the context
    pub fn shutdown(&mut self) {
        if self.shader_manager.take().is_some() {
            crate::engine_info!("galaxy3d::Engine", "Shader manager destroyed");
        }
    }

    fn not_running() -> Error {
        let error = Error::InitializationFailed("Engine has been shut down".to_string());
        crate::engine_error!("galaxy3d::Engine", "{}", error);
        error
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// Replaces the default console logger with a custom implementation.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use galaxy_3d_shaders::galaxy3d::Engine;
    /// use galaxy_3d_shaders::galaxy3d::log::{Logger, LogEntry};
    ///
    /// struct ShaderLogCollector;
    ///
    /// impl Logger for ShaderLogCollector {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Forward to an in-game console...
    ///     }
    /// }
    ///
    /// Engine::set_logger(ShaderLogCollector);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_slot().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        Self::set_logger(DefaultLogger);
    }

    /// Log an entry without source location
    ///
    /// Backs the `engine_trace!` ... `engine_warn!` macros.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Log an entry with the file:line it was emitted from
    ///
    /// Backs `engine_error!`.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        if let Ok(logger) = logger_slot().read() {
            logger.log(&entry);
        }
    }
}

fn logger_slot() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
