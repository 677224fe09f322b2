/// Shader include manager - expands `#include "name"` directives
///
/// GLSL has no include mechanism, so includes are expanded textually before
/// a stage is handed to the driver. A directive is a line starting with `#`,
/// then optional blanks, `include`, optional blanks, a double-quoted name and
/// nothing but trailing blanks.
///
/// Each include gets a stable source-string number (1-based, registration
/// order; the main source is 0). The expansion is wrapped in `#line`
/// directives so driver diagnostics point at the right file and line:
///
/// ```text
/// #line 1 <include number>
/// ...include body...
/// #line <line after the directive> <parent number>
/// ```

use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::engine_debug;
use super::loader::SourceLoader;

/// Registry of named include sources
#[derive(Debug, Default)]
pub struct ShaderIncludeManager {
    includes: FxHashMap<String, String>,
    /// Include names in registration order (index + 1 = source-string number)
    names: Vec<String>,
}

/// A parsed `#include` line
#[derive(Debug, PartialEq, Eq)]
enum Directive<'a> {
    Include(&'a str),
    Malformed(&'static str),
}

/// State of one `resolve` call
struct Expansion<'a> {
    loader: Option<&'a dyn SourceLoader>,
    /// Include chain from the main shader down to the file being expanded
    stack: Vec<String>,
    /// Includes already expanded during this resolution
    expanded: FxHashSet<String>,
}

impl ShaderIncludeManager {
    /// Create an empty include manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named include
    pub fn add_include(&mut self, name: &str, content: &str) {
        if self.includes.insert(name.to_string(), content.to_string()).is_none() {
            self.names.push(name.to_string());
        }
    }

    /// Check whether an include is registered
    pub fn has_include(&self, name: &str) -> bool {
        self.includes.contains_key(name)
    }

    /// Content of a registered include
    pub fn include(&self, name: &str) -> Option<&str> {
        self.includes.get(name).map(|s| s.as_str())
    }

    /// Number of registered includes
    pub fn include_count(&self) -> usize {
        self.names.len()
    }

    /// Source-string number used in `#line` directives for an include
    pub fn source_string_number(&self, name: &str) -> Option<u32> {
        self.names.iter().position(|n| n == name).map(|i| i as u32 + 1)
    }

    /// Include name behind a source-string number (0 is the main source)
    pub fn source_string_name(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        self.names.get(index).map(|s| s.as_str())
    }

    /// Expand every include of `source`, recursively
    ///
    /// Includes that are not registered are read through `loader` (when
    /// given) and registered on success.
    ///
    /// # Errors
    ///
    /// - [`Error::IncludeSyntax`] for a malformed directive
    /// - [`Error::MissingInclude`] when an include can't be found
    /// - [`Error::CircularInclude`] when an include (indirectly) includes itself
    pub fn resolve(
        &mut self,
        shader_name: &str,
        source: &str,
        loader: Option<&dyn SourceLoader>,
    ) -> Result<String> {
        let mut expansion = Expansion {
            loader,
            stack: vec![shader_name.to_string()],
            expanded: FxHashSet::default(),
        };

        self.expand(&mut expansion, source, 0)
    }

    fn expand(&mut self, expansion: &mut Expansion, source: &str, string_number: u32) -> Result<String> {
        let current = expansion.stack.last().cloned().unwrap_or_default();
        let mut lines = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let include = match parse_directive(line) {
                None => {
                    lines.push(line.to_string());
                    continue;
                }
                Some(Directive::Malformed(message)) => {
                    return Err(Error::IncludeSyntax {
                        shader: current,
                        line: index + 1,
                        message: message.to_string(),
                    });
                }
                Some(Directive::Include(name)) => name,
            };

            if let Some(start) = expansion.stack.iter().position(|n| n == include) {
                let mut cycle = expansion.stack[start..].to_vec();
                cycle.push(include.to_string());
                return Err(Error::CircularInclude { cycle });
            }

            // Already pulled in through another path
            if !expansion.expanded.insert(include.to_string()) {
                lines.push(String::new());
                continue;
            }

            let content = self.fetch(include, &current, expansion.loader)?;
            let number = self.source_string_number(include).unwrap_or(0);

            expansion.stack.push(include.to_string());
            let body = self.expand(expansion, &content, number)?;
            expansion.stack.pop();

            lines.push(format!("#line 1 {}", number));
            lines.push(body);
            lines.push(format!("#line {} {}", index + 2, string_number));
        }

        let mut result = lines.join("\n");
        if source.ends_with('\n') {
            result.push('\n');
        }
        Ok(result)
    }

    fn fetch(&mut self, include: &str, requested_by: &str, loader: Option<&dyn SourceLoader>) -> Result<String> {
        if let Some(content) = self.includes.get(include) {
            return Ok(content.clone());
        }

        let content = loader
            .and_then(|loader| loader.read_source(include).ok())
            .ok_or_else(|| Error::MissingInclude {
                shader: requested_by.to_string(),
                include: include.to_string(),
            })?;

        engine_debug!("galaxy3d::ShaderIncludeManager", "Loaded include '{}'", include);
        self.add_include(include, &content);
        Ok(content)
    }
}

/// Recognize an `#include "name"` line
fn parse_directive(line: &str) -> Option<Directive<'_>> {
    let rest = line.strip_prefix('#')?;
    let rest = rest.trim_start_matches([' ', '\t']).strip_prefix("include")?;

    // `#includes` or `#include_path` are other directives
    if rest.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }

    let rest = rest.trim_start_matches([' ', '\t']);
    let Some(rest) = rest.strip_prefix('"') else {
        return Some(Directive::Malformed("expected '\"' after #include"));
    };
    let Some((name, trailing)) = rest.split_once('"') else {
        return Some(Directive::Malformed("missing closing '\"'"));
    };
    if !trailing.trim().is_empty() {
        return Some(Directive::Malformed("unexpected characters after the include name"));
    }
    if name.is_empty() {
        return Some(Directive::Malformed("empty include name"));
    }

    Some(Directive::Include(name))
}

#[cfg(test)]
#[path = "include_manager_tests.rs"]
mod tests;
