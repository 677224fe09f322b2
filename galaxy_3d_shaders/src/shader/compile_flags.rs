/// Shader compile flags - preprocessor defines selecting a variant of a stage
///
/// Flags combine with `|`:
///
/// ```ignore
/// let flags = ShaderCompileFlag::lit() | ShaderCompileFlag::textured();
/// let shader = manager.get_or_link_shader_with_flags("Model.vert", "Model.frag", "", &flags)?;
/// ```
///
/// Each flag becomes one `#define NAME [VALUE]` line injected right after the
/// `#version` line of the stage source.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One preprocessor define
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderCompileFlag {
    name: String,
    value: Option<String>,
}

impl ShaderCompileFlag {
    /// Flag without value (`#define NAME`)
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }

    /// Flag with a value (`#define NAME VALUE`)
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: Some(value.into()) }
    }

    /// The object is lit
    pub fn lit() -> Self {
        Self::new("LIT")
    }

    /// The object has a diffuse texture
    pub fn textured() -> Self {
        Self::new("TEXTURED")
    }

    /// The object is skinned
    pub fn skeletal_animated() -> Self {
        Self::new("SKELETAL_ANIMATED")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn define_line(&self) -> String {
        match &self.value {
            Some(value) => format!("#define {} {}", self.name, value),
            None => format!("#define {}", self.name),
        }
    }
}

impl fmt::Display for ShaderCompileFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Set of flags, kept sorted by name so equal sets build equal keys
///
/// Setting a flag that is already present replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ShaderCompileFlags {
    flags: Vec<ShaderCompileFlag>,
}

impl ShaderCompileFlags {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a flag
    pub fn insert(&mut self, flag: ShaderCompileFlag) {
        match self.flags.binary_search_by(|f| f.name.cmp(&flag.name)) {
            Ok(index) => self.flags[index] = flag,
            Err(index) => self.flags.insert(index, flag),
        }
    }

    /// Check whether a flag with this name is set
    pub fn contains(&self, name: &str) -> bool {
        self.flags.iter().any(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShaderCompileFlag> {
        self.flags.iter()
    }

    /// Canonical text used in cache keys (`LIT,TEXTURED,MAX_BONES=4`)
    pub fn key(&self) -> String {
        self.flags.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(",")
    }

    /// Inject one `#define` per flag after the `#version` line
    ///
    /// Without a `#version` line the defines go first.
    pub fn apply(&self, source: &str) -> String {
        if self.flags.is_empty() {
            return source.to_string();
        }

        let defines: Vec<String> = self.flags.iter().map(|f| f.define_line()).collect();
        let defines = defines.join("\n");

        let version_line = source
            .lines()
            .position(|line| line.trim_start().starts_with("#version"));

        match version_line {
            Some(index) => {
                let mut lines: Vec<&str> = source.lines().collect();
                lines.insert(index + 1, &defines);
                let mut result = lines.join("\n");
                if source.ends_with('\n') {
                    result.push('\n');
                }
                result
            }
            None => format!("{}\n{}", defines, source),
        }
    }
}

impl From<ShaderCompileFlag> for ShaderCompileFlags {
    fn from(flag: ShaderCompileFlag) -> Self {
        Self { flags: vec![flag] }
    }
}

impl BitOr for ShaderCompileFlag {
    type Output = ShaderCompileFlags;

    fn bitor(self, rhs: ShaderCompileFlag) -> ShaderCompileFlags {
        ShaderCompileFlags::from(self) | rhs
    }
}

impl BitOr<ShaderCompileFlag> for ShaderCompileFlags {
    type Output = ShaderCompileFlags;

    fn bitor(mut self, rhs: ShaderCompileFlag) -> ShaderCompileFlags {
        self.insert(rhs);
        self
    }
}

impl BitOr for ShaderCompileFlags {
    type Output = ShaderCompileFlags;

    fn bitor(mut self, rhs: ShaderCompileFlags) -> ShaderCompileFlags {
        self |= rhs;
        self
    }
}

impl BitOrAssign<ShaderCompileFlag> for ShaderCompileFlags {
    fn bitor_assign(&mut self, rhs: ShaderCompileFlag) {
        self.insert(rhs);
    }
}

impl BitOrAssign for ShaderCompileFlags {
    fn bitor_assign(&mut self, rhs: ShaderCompileFlags) {
        for flag in rhs.flags {
            self.insert(flag);
        }
    }
}

#[cfg(test)]
#[path = "compile_flags_tests.rs"]
mod tests;
