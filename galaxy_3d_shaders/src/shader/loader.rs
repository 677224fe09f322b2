/// Shader source loaders
///
/// The shader manager never touches the filesystem directly: stage sources
/// and includes are read through a [`SourceLoader`].

use std::fs;
use std::path::PathBuf;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};

/// File extensions the shader manager knows how to handle
pub const SHADER_EXTENSIONS: &[&str] = &["shadinc", "vert", "frag", "geom"];

/// Source of shader text
pub trait SourceLoader {
    /// Read the source stored under `path`
    fn read_source(&self, path: &str) -> Result<String>;

    /// List every shader source this loader can provide (used by preloading)
    fn list_sources(&self) -> Result<Vec<String>>;
}

/// Extension of a shader path (`"Water.vert"` -> `Some("vert")`)
pub fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

// ============================================================================
// FileSystemLoader
// ============================================================================

/// Reads shader sources from a directory
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
}

impl FileSystemLoader {
    /// Create a loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory sources are read from
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl SourceLoader for FileSystemLoader {
    fn read_source(&self, path: &str) -> Result<String> {
        let full_path = self.root.join(path);
        fs::read_to_string(&full_path).map_err(|e| Error::Io {
            path: full_path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn list_sources(&self) -> Result<Vec<String>> {
        let io_error = |e: std::io::Error| Error::Io {
            path: self.root.display().to_string(),
            message: e.to_string(),
        };

        let mut sources = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            if !entry.file_type().map_err(io_error)?.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if extension_of(&name).is_some_and(|ext| SHADER_EXTENSIONS.contains(&ext)) {
                sources.push(name);
            }
        }

        sources.sort();
        Ok(sources)
    }
}

// ============================================================================
// MemorySourceLoader
// ============================================================================

/// In-memory sources (embedded shaders, tests)
#[derive(Debug, Clone, Default)]
pub struct MemorySourceLoader {
    sources: FxHashMap<String, String>,
}

impl MemorySourceLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a source
    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(path.into(), source.into());
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_source(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl SourceLoader for MemorySourceLoader {
    fn read_source(&self, path: &str) -> Result<String> {
        self.sources.get(path).cloned().ok_or_else(|| Error::Io {
            path: path.to_string(),
            message: "no such source".to_string(),
        })
    }

    fn list_sources(&self) -> Result<Vec<String>> {
        let mut sources: Vec<String> = self.sources.keys().cloned().collect();
        sources.sort();
        Ok(sources)
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
