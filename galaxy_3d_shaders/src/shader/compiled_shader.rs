/// Compiled shader stage
///
/// One compiled vertex, fragment or geometry stage. Immutable once compiled;
/// the GPU object is released when the value is dropped.

use crate::error::{Error, Result};
use crate::graphics_device::{SharedGraphicsContext, ShaderStage, StageHandle};
use crate::{engine_debug, engine_warn};

pub struct CompiledShader {
    context: SharedGraphicsContext,
    kind: ShaderStage,
    /// Source as compiled (includes expanded, flags injected)
    source: String,
    handle: StageHandle,
    /// Compiler output (warnings only, since the stage compiled)
    log: String,
}

impl CompiledShader {
    /// Compile a stage
    ///
    /// # Errors
    ///
    /// [`Error::CompileFailed`] with the driver log if compilation fails
    /// (the failed stage object is released), or the backend error if the
    /// stage object can't be created at all.
    pub fn compile(
        context: &SharedGraphicsContext,
        name: &str,
        kind: ShaderStage,
        source: String,
    ) -> Result<Self> {
        let output = context.borrow_mut().device().compile_stage(kind, &source)?;

        if !output.success {
            context.borrow_mut().device().delete_stage(output.handle);
            return Err(Error::CompileFailed { shader: name.to_string(), log: output.log });
        }

        engine_debug!("galaxy3d::CompiledShader", "Compiled {} ({:?})", name, kind);

        Ok(Self {
            context: context.clone(),
            kind,
            source,
            handle: output.handle,
            log: output.log,
        })
    }

    pub fn kind(&self) -> ShaderStage {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn handle(&self) -> StageHandle {
        self.handle
    }

    pub fn log(&self) -> &str {
        &self.log
    }
}

impl std::fmt::Debug for CompiledShader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledShader")
            .field("kind", &self.kind)
            .field("handle", &self.handle)
            .finish()
    }
}

impl Drop for CompiledShader {
    fn drop(&mut self) {
        match self.context.try_borrow_mut() {
            Ok(mut context) => context.device().delete_stage(self.handle),
            Err(_) => engine_warn!(
                "galaxy3d::CompiledShader",
                "Context busy while dropping stage {}, GPU object leaked", self.handle.0
            ),
        }
    }
}
