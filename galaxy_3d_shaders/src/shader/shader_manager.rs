/// Shader manager - compiled stage cache and linked program cache
///
/// Stages are stored by name, one map per stage kind, and compiled at most
/// once per source. Programs are linked on demand from a
/// (vertex, fragment, geometry) triple and cached under the composite key
/// `vertex|fragment|geometry`. Whatever can't be built falls back to the
/// built-in error shader, so callers always get something to draw with.
///
/// Linked programs are not tracked back to the stages they were built from:
/// destroying a stage leaves its programs cached (they don't need the stage
/// object any more). Use [`ShaderManager::destroy_programs_using`] to evict
/// them. Replacing a stage with a new source does evict them.

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::graphics_device::{SharedGraphicsContext, ShaderStage, StageHandle};
use crate::{engine_debug, engine_error, engine_info, engine_warn};
use super::compile_flags::ShaderCompileFlags;
use super::compiled_shader::CompiledShader;
use super::error_shader::{
    DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER, ERROR_VERTEX_SRC, ERROR_FRAGMENT_SRC,
};
use super::include_manager::ShaderIncludeManager;
use super::loader::{extension_of, SourceLoader, SHADER_EXTENSIONS};
use super::program::Shader;

const SOURCE: &str = "galaxy3d::ShaderManager";

const INCLUDE_EXTENSION: &str = "shadinc";

new_key_type! {
    /// Stable key of a linked program
    pub struct ProgramKey;
}

// ===== CONFIG =====

/// Shader manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderManagerConfig {
    /// Vertex stage used when none is named (holds the error shader)
    pub default_vertex_shader: String,
    /// Fragment stage used when none is named (holds the error shader)
    pub default_fragment_shader: String,
    /// Separator between stage names in program keys
    pub program_separator: String,
    /// Separator between a stage/program name and its compile flags
    pub flag_separator: String,
    /// Load every source the loader lists when the manager is created
    pub preload_directory: bool,
}

impl Default for ShaderManagerConfig {
    fn default() -> Self {
        Self {
            default_vertex_shader: DEFAULT_VERTEX_SHADER.to_string(),
            default_fragment_shader: DEFAULT_FRAGMENT_SHADER.to_string(),
            program_separator: "|".to_string(),
            flag_separator: "?".to_string(),
            preload_directory: true,
        }
    }
}

/// Raw (pre-expansion) source of a stage
#[derive(Debug, Clone)]
struct StageSource {
    kind: ShaderStage,
    raw: String,
}

// ===== SHADER MANAGER =====

pub struct ShaderManager {
    context: SharedGraphicsContext,
    config: ShaderManagerConfig,
    loader: Option<Box<dyn SourceLoader>>,
    includes: ShaderIncludeManager,

    vertex_shaders: FxHashMap<String, CompiledShader>,
    fragment_shaders: FxHashMap<String, CompiledShader>,
    geometry_shaders: FxHashMap<String, CompiledShader>,
    sources: FxHashMap<String, StageSource>,
    compile_logs: FxHashMap<String, String>,
    /// Flag variants that failed to compile, not retried until their base changes
    failed_variants: FxHashSet<String>,

    programs: SlotMap<ProgramKey, Shader>,
    /// Program key -> program (failed keys alias the error program)
    linked: FxHashMap<String, ProgramKey>,
    link_logs: FxHashMap<String, String>,
    error_program: Option<ProgramKey>,
}

impl ShaderManager {
    /// Create a manager on a graphics context
    ///
    /// Logs the device limits, then preloads every source of `loader` if
    /// [`ShaderManagerConfig::preload_directory`] is set. The error shader is
    /// compiled on first use.
    pub fn new(
        context: SharedGraphicsContext,
        config: ShaderManagerConfig,
        loader: Option<Box<dyn SourceLoader>>,
    ) -> Self {
        let preload = config.preload_directory && loader.is_some();
        let mut manager = Self::empty(context, config, loader, ShaderIncludeManager::new());

        let limits = manager.context.borrow().limits();
        engine_info!(
            SOURCE,
            "Max vertex attributes: {}, max uniform components: {} (vertex) {} (fragment) {} (combined vertex)",
            limits.max_vertex_attributes,
            limits.max_vertex_uniform_components,
            limits.max_fragment_uniform_components,
            limits.max_combined_vertex_uniform_components
        );

        if preload {
            manager.load_directory();
        }

        manager
    }

    fn empty(
        context: SharedGraphicsContext,
        config: ShaderManagerConfig,
        loader: Option<Box<dyn SourceLoader>>,
        includes: ShaderIncludeManager,
    ) -> Self {
        Self {
            context,
            config,
            loader,
            includes,
            vertex_shaders: FxHashMap::default(),
            fragment_shaders: FxHashMap::default(),
            geometry_shaders: FxHashMap::default(),
            sources: FxHashMap::default(),
            compile_logs: FxHashMap::default(),
            failed_variants: FxHashSet::default(),
            programs: SlotMap::with_key(),
            linked: FxHashMap::default(),
            link_logs: FxHashMap::default(),
            error_program: None,
        }
    }

    /// Tear this manager down and rebuild it on a new context
    ///
    /// Every GPU object of this manager is released on the old context before
    /// anything is compiled on the new one. Includes and the raw sources of
    /// every stage carry over; stages are recompiled, programs are linked
    /// again on demand.
    pub fn rebuild(self, context: SharedGraphicsContext) -> Self {
        let ShaderManager {
            context: old_context,
            config,
            loader,
            includes,
            vertex_shaders,
            fragment_shaders,
            geometry_shaders,
            sources,
            programs,
            ..
        } = self;

        // Old GPU objects go before anything is compiled on the new context
        drop(programs);
        drop(vertex_shaders);
        drop(fragment_shaders);
        drop(geometry_shaders);
        drop(old_context);

        let mut manager = Self::empty(context, config, loader, includes);

        let mut names: Vec<&String> = sources.keys().collect();
        names.sort();
        for name in names {
            let source = &sources[name];
            manager.compile_stage(name, source.kind, &source.raw);
        }

        engine_info!(SOURCE, "Rebuilt {} stage(s) on the new context", manager.stage_count());
        manager
    }

    pub fn config(&self) -> &ShaderManagerConfig {
        &self.config
    }

    pub fn context(&self) -> &SharedGraphicsContext {
        &self.context
    }

    pub fn include_manager(&self) -> &ShaderIncludeManager {
        &self.includes
    }

    // ===== STAGES =====

    /// Load a stage (or include) through the source loader
    ///
    /// The stage kind comes from the extension of `path`: `.vert`, `.frag`,
    /// `.geom`, or `.shadinc` for includes. The stage is stored under `name`,
    /// or under `path` when no name is given. Returns `false` on failure;
    /// the reason is kept in [`compile_log`](Self::compile_log).
    pub fn load_shader(&mut self, path: &str, name: Option<&str>) -> bool {
        let name = name.unwrap_or(path);

        let read = match &self.loader {
            Some(loader) => loader.read_source(path),
            None => Err(Error::InvalidResource("no source loader".to_string())),
        };

        match read {
            Ok(content) => self.store_source(name, extension_of(path), &content),
            Err(e) => {
                engine_error!(SOURCE, "Can't load shader {}: {}", name, e);
                self.compile_logs.insert(name.to_string(), e.to_string());
                false
            }
        }
    }

    /// Compile a stage (or register an include) from an in-memory source
    ///
    /// The stage kind comes from the extension of `name`; a name without a
    /// known extension is refused (use [`make_shader_as`](Self::make_shader_as)).
    pub fn make_shader(&mut self, name: &str, content: &str) -> bool {
        self.store_source(name, extension_of(name), content)
    }

    /// Compile a stage of an explicit kind from an in-memory source
    ///
    /// Unlike [`make_shader`](Self::make_shader), `name` needs no extension.
    pub fn make_shader_as(&mut self, name: &str, kind: ShaderStage, content: &str) -> bool {
        if self.is_reserved(name) {
            engine_warn!(SOURCE, "{} is reserved for the built-in error shader", name);
            return false;
        }
        self.compile_stage(name, kind, content)
    }

    /// Check whether a compiled stage with this name exists
    ///
    /// Includes are not stages, see [`has_include`](Self::has_include).
    pub fn has_shader(&self, name: &str) -> bool {
        self.stage(name).is_some()
    }

    /// Check whether an include with this name is registered
    pub fn has_include(&self, name: &str) -> bool {
        self.includes.has_include(name)
    }

    /// Source of a stage as it was compiled (includes expanded)
    pub fn get_source(&self, name: &str) -> Option<&str> {
        self.stage(name).map(|s| s.source())
    }

    /// Kind of a compiled stage
    pub fn stage_kind(&self, name: &str) -> Option<ShaderStage> {
        self.stage(name).map(|s| s.kind())
    }

    /// Last compile diagnostics for a stage (empty when it compiled cleanly)
    pub fn compile_log(&self, name: &str) -> Option<&str> {
        self.compile_logs.get(name).map(|s| s.as_str())
    }

    /// Number of compiled stages (flag variants included)
    pub fn stage_count(&self) -> usize {
        self.vertex_shaders.len() + self.fragment_shaders.len() + self.geometry_shaders.len()
    }

    /// Release a stage and its flag variants
    ///
    /// Programs linked from it stay cached. Unknown and built-in names are a
    /// logged no-op. Returns `true` if a stage was released.
    pub fn destroy_shader(&mut self, name: &str) -> bool {
        if self.is_reserved(name) {
            engine_warn!(SOURCE, "Refusing to destroy the built-in shader {}", name);
            return false;
        }

        let Some(kind) = self.stage_kind(name) else {
            engine_warn!(SOURCE, "Want to destroy the inexistent shader {}", name);
            return false;
        };

        self.remove_variants(kind, name);
        self.vertex_shaders.remove(name);
        self.fragment_shaders.remove(name);
        self.geometry_shaders.remove(name);
        self.sources.remove(name);
        self.compile_logs.remove(name);
        engine_debug!(SOURCE, "Destroyed shader {}", name);
        true
    }

    /// Preload every source the loader lists
    ///
    /// Includes go first, then vertex, fragment and geometry stages. Returns
    /// the number of sources loaded successfully.
    pub fn load_directory(&mut self) -> usize {
        let listed = match &self.loader {
            Some(loader) => loader.list_sources(),
            None => return 0,
        };

        let paths = match listed {
            Ok(paths) => paths,
            Err(e) => {
                engine_error!(SOURCE, "Can't list shader sources: {}", e);
                return 0;
            }
        };

        let mut loaded = 0;
        for extension in SHADER_EXTENSIONS {
            for path in paths.iter().filter(|p| extension_of(p) == Some(*extension)) {
                if self.load_shader(path, None) {
                    loaded += 1;
                }
            }
        }

        engine_info!(SOURCE, "Preloaded {} of {} shader source(s)", loaded, paths.len());
        loaded
    }

    // ===== PROGRAMS =====

    /// Get the program linking these stages, linking it if needed
    ///
    /// Empty names select the default stages (empty geometry = none). When a
    /// stage is missing or the link fails, the error shader is returned and
    /// the cause is logged.
    ///
    /// # Errors
    ///
    /// Only if the built-in error shader itself can't be built.
    pub fn get_or_link_shader(&mut self, vertex: &str, fragment: &str, geometry: &str) -> Result<&Shader> {
        self.get_or_link_shader_with_flags(vertex, fragment, geometry, &ShaderCompileFlags::new())
    }

    /// The built-in error shader
    pub fn get_or_link_default(&mut self) -> Result<&Shader> {
        let key = self.error_program_key()?;
        Ok(&self.programs[key])
    }

    /// Variant of [`get_or_link_shader`](Self::get_or_link_shader) with compile flags
    ///
    /// Each stage is compiled again with the flags' `#define`s (cached as
    /// `name?FLAGS`) and the program is cached as `key?FLAGS`.
    pub fn get_or_link_shader_with_flags(
        &mut self,
        vertex: &str,
        fragment: &str,
        geometry: &str,
        flags: &ShaderCompileFlags,
    ) -> Result<&Shader> {
        let vertex = if vertex.is_empty() { self.config.default_vertex_shader.clone() } else { vertex.to_string() };
        let fragment = if fragment.is_empty() { self.config.default_fragment_shader.clone() } else { fragment.to_string() };

        let key = self.program_key(&vertex, &fragment, geometry, flags);
        if key == self.default_program_key() {
            return self.get_or_link_default();
        }
        if let Some(program) = self.linked.get(&key).copied() {
            return Ok(&self.programs[program]);
        }

        self.ensure_builtin(&vertex);
        self.ensure_builtin(&fragment);

        let mut stages = Vec::with_capacity(3);
        let requested = [
            (ShaderStage::Vertex, vertex.as_str()),
            (ShaderStage::Fragment, fragment.as_str()),
            (ShaderStage::Geometry, geometry),
        ];
        for (kind, name) in requested {
            if kind == ShaderStage::Geometry && name.is_empty() {
                continue;
            }
            match self.stage_variant(kind, name, flags) {
                Some(handle) => stages.push(handle),
                None => {
                    engine_error!(
                        SOURCE,
                        "Can't link {}: {} shader {} is not available, using the error shader",
                        key, kind.extension(), name
                    );
                    return self.get_or_link_default();
                }
            }
        }

        match Shader::link(&self.context, &key, &stages) {
            Ok(shader) => {
                self.link_logs.insert(key.clone(), shader.link_log().to_string());
                let program = self.programs.insert(shader);
                self.linked.insert(key, program);
                Ok(&self.programs[program])
            }
            Err(e) => {
                let log = match e {
                    Error::LinkFailed { log, .. } => log,
                    other => other.to_string(),
                };
                engine_error!(SOURCE, "Failed to link {}, using the error shader:\n{}", key, log);

                let error_program = self.error_program_key()?;
                self.link_logs.insert(key.clone(), log);
                self.linked.insert(key, error_program);
                Ok(&self.programs[error_program])
            }
        }
    }

    /// Evict every cached program whose key names this stage
    ///
    /// Returns the number of cache entries removed. The error shader itself
    /// is never evicted.
    pub fn destroy_programs_using(&mut self, name: &str) -> usize {
        let default_key = self.default_program_key();
        let doomed: Vec<String> = self
            .linked
            .keys()
            .filter(|key| **key != default_key && self.key_uses(key, name))
            .cloned()
            .collect();

        for key in &doomed {
            if let Some(program) = self.linked.remove(key) {
                if Some(program) != self.error_program {
                    self.programs.remove(program);
                }
            }
            self.link_logs.remove(key);
        }

        if !doomed.is_empty() {
            engine_debug!(SOURCE, "Evicted {} program(s) using {}", doomed.len(), name);
        }
        doomed.len()
    }

    /// Linker diagnostics of a program key (also kept for failed links)
    pub fn link_log(&self, key: &str) -> Option<&str> {
        self.link_logs.get(key).map(|s| s.as_str())
    }

    /// Number of linked programs (aliases of the error shader not counted)
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Number of program cache entries (aliases of the error shader counted)
    pub fn cached_key_count(&self) -> usize {
        self.linked.len()
    }

    /// Composite cache key of a stage triple
    pub fn program_key(&self, vertex: &str, fragment: &str, geometry: &str, flags: &ShaderCompileFlags) -> String {
        let sep = &self.config.program_separator;
        let mut key = format!("{}{}{}{}{}", vertex, sep, fragment, sep, geometry);
        if !flags.is_empty() {
            key.push_str(&self.config.flag_separator);
            key.push_str(&flags.key());
        }
        key
    }

    // ===== INTERNALS =====

    fn stage(&self, name: &str) -> Option<&CompiledShader> {
        self.vertex_shaders
            .get(name)
            .or_else(|| self.fragment_shaders.get(name))
            .or_else(|| self.geometry_shaders.get(name))
    }

    fn stages_mut(&mut self, kind: ShaderStage) -> &mut FxHashMap<String, CompiledShader> {
        match kind {
            ShaderStage::Vertex => &mut self.vertex_shaders,
            ShaderStage::Fragment => &mut self.fragment_shaders,
            ShaderStage::Geometry => &mut self.geometry_shaders,
        }
    }

    fn is_reserved(&self, name: &str) -> bool {
        name == self.config.default_vertex_shader || name == self.config.default_fragment_shader
    }

    fn default_program_key(&self) -> String {
        let config = &self.config;
        self.program_key(
            &config.default_vertex_shader,
            &config.default_fragment_shader,
            "",
            &ShaderCompileFlags::new(),
        )
    }

    /// Does a program key name this stage (flags ignored)?
    fn key_uses(&self, key: &str, name: &str) -> bool {
        let stages = key.split(self.config.flag_separator.as_str()).next().unwrap_or(key);
        stages.split(self.config.program_separator.as_str()).any(|stage| stage == name)
    }

    fn variant_name(&self, name: &str, flags: &ShaderCompileFlags) -> String {
        format!("{}{}{}", name, self.config.flag_separator, flags.key())
    }

    /// Route a source to the include manager or the stage compiler
    fn store_source(&mut self, name: &str, extension: Option<&str>, content: &str) -> bool {
        if extension == Some(INCLUDE_EXTENSION) {
            self.includes.add_include(name, content);
            engine_debug!(SOURCE, "Registered include {}", name);
            return true;
        }

        if self.is_reserved(name) {
            engine_warn!(SOURCE, "{} is reserved for the built-in error shader", name);
            return false;
        }

        let Some(kind) = extension.and_then(ShaderStage::from_extension) else {
            let message = format!("can't tell the stage kind of {}", name);
            engine_error!(SOURCE, "{}", message);
            self.compile_logs.insert(name.to_string(), message);
            return false;
        };

        self.compile_stage(name, kind, content)
    }

    /// Resolve includes, compile and store a stage
    ///
    /// Same name and same source is a no-op. A new source replaces the stage
    /// and evicts its programs; if it fails to compile, the old stage stays.
    fn compile_stage(&mut self, name: &str, kind: ShaderStage, raw: &str) -> bool {
        let unchanged = self
            .sources
            .get(name)
            .is_some_and(|s| s.kind == kind && s.raw == raw);
        if unchanged && self.stage(name).is_some() {
            return true;
        }

        let Some(stage) = self.compile(name, kind, raw) else {
            return false;
        };

        let previous = self.stage_kind(name);
        if let Some(previous) = previous {
            self.remove_variants(previous, name);
            self.stages_mut(previous).remove(name);
            self.destroy_programs_using(name);
        }

        self.stages_mut(kind).insert(name.to_string(), stage);
        self.sources.insert(name.to_string(), StageSource { kind, raw: raw.to_string() });
        true
    }

    /// Expand includes and compile, recording the compile log
    fn compile(&mut self, name: &str, kind: ShaderStage, raw: &str) -> Option<CompiledShader> {
        let result = self
            .includes
            .resolve(name, raw, self.loader.as_deref())
            .and_then(|source| CompiledShader::compile(&self.context, name, kind, source));

        match result {
            Ok(stage) => {
                self.compile_logs.insert(name.to_string(), stage.log().to_string());
                Some(stage)
            }
            Err(e) => {
                let log = match e {
                    Error::CompileFailed { log, .. } => log,
                    other => other.to_string(),
                };
                engine_error!(SOURCE, "Failed to compile {}:\n{}", name, log);
                self.compile_logs.insert(name.to_string(), log);
                None
            }
        }
    }

    /// Handle of a stage, compiling its flag variant on demand
    fn stage_variant(&mut self, kind: ShaderStage, name: &str, flags: &ShaderCompileFlags) -> Option<StageHandle> {
        if flags.is_empty() {
            return self.stages_mut(kind).get(name).map(|s| s.handle());
        }

        let variant = self.variant_name(name, flags);
        if let Some(stage) = self.stages_mut(kind).get(&variant) {
            return Some(stage.handle());
        }

        if self.failed_variants.contains(&variant) {
            return None;
        }

        let source = self.sources.get(name).filter(|s| s.kind == kind)?;
        let raw = flags.apply(&source.raw);
        let Some(stage) = self.compile(&variant, kind, &raw) else {
            self.failed_variants.insert(variant);
            return None;
        };
        let handle = stage.handle();
        self.stages_mut(kind).insert(variant, stage);
        Some(handle)
    }

    fn remove_variants(&mut self, kind: ShaderStage, name: &str) {
        let prefix = format!("{}{}", name, self.config.flag_separator);
        let stages = self.stages_mut(kind);
        stages.retain(|stage_name, _| !stage_name.starts_with(&prefix));
        self.compile_logs.retain(|log_name, _| !log_name.starts_with(&prefix));
        self.failed_variants.retain(|variant| !variant.starts_with(&prefix));
    }

    /// Compile a built-in stage the first time it is needed
    fn ensure_builtin(&mut self, name: &str) {
        let (kind, source) = if name == self.config.default_vertex_shader {
            (ShaderStage::Vertex, ERROR_VERTEX_SRC)
        } else if name == self.config.default_fragment_shader {
            (ShaderStage::Fragment, ERROR_FRAGMENT_SRC)
        } else {
            return;
        };

        if !self.stages_mut(kind).contains_key(name) {
            self.compile_stage(name, kind, source);
        }
    }

    /// The error program, linked on first use
    fn error_program_key(&mut self) -> Result<ProgramKey> {
        if let Some(program) = self.error_program {
            return Ok(program);
        }

        let vertex = self.config.default_vertex_shader.clone();
        let fragment = self.config.default_fragment_shader.clone();
        self.ensure_builtin(&vertex);
        self.ensure_builtin(&fragment);

        let stages = match (self.vertex_shaders.get(&vertex), self.fragment_shaders.get(&fragment)) {
            (Some(vs), Some(fs)) => [vs.handle(), fs.handle()],
            (vs, _) => {
                let failed = if vs.is_none() { &vertex } else { &fragment };
                return Err(Error::InitializationFailed(format!(
                    "the built-in error shader failed to compile ({}): {}",
                    failed, self.compile_log(failed).unwrap_or_default()
                )));
            }
        };

        let key = self.default_program_key();
        let shader = Shader::link(&self.context, &key, &stages)
            .map_err(|e| Error::InitializationFailed(format!("the built-in error shader failed to link: {}", e)))?;

        let program = self.programs.insert(shader);
        self.linked.insert(key, program);
        self.error_program = Some(program);
        Ok(program)
    }
}

#[cfg(test)]
#[path = "shader_manager_tests.rs"]
mod tests;
