/// Program reflection - active attributes and uniforms of a linked program
///
/// Built once right after a successful link, then never mutated.

use rustc_hash::FxHashMap;
use crate::engine_trace;
use crate::graphics_device::{GraphicsDevice, GlslType, ProgramHandle, UniformLocation};

/// An active vertex attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub location: u32,
    pub kind: GlslType,
    pub size: i32,
}

/// An active uniform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uniform {
    /// Name without the `[0]` drivers append to arrays
    pub name: String,
    /// Location of the uniform (of element 0 for arrays)
    pub location: UniformLocation,
    pub kind: GlslType,
    /// Element count (1 for non-arrays)
    pub size: i32,
    /// Location of every element, in index order (empty for non-arrays)
    pub array_locations: Vec<UniformLocation>,
}

impl Uniform {
    /// True for array uniforms
    pub fn is_array(&self) -> bool {
        !self.array_locations.is_empty()
    }

    /// Location of one element (`index` must be 0 for non-arrays)
    pub fn element_location(&self, index: usize) -> Option<UniformLocation> {
        if self.is_array() {
            self.array_locations.get(index).copied()
        } else if index == 0 {
            Some(self.location)
        } else {
            None
        }
    }

    /// Number of addressable elements
    pub fn element_count(&self) -> usize {
        self.array_locations.len().max(1)
    }
}

/// Attributes and uniforms of one program, keyed by name
#[derive(Debug, Clone, Default)]
pub struct ProgramReflection {
    attributes: FxHashMap<String, Attribute>,
    uniforms: FxHashMap<String, Uniform>,
}

impl ProgramReflection {
    /// Query the device for the active resources of a linked program
    ///
    /// Resources without a location (built-ins, block members) are skipped.
    pub fn build(device: &mut dyn GraphicsDevice, program: ProgramHandle) -> Self {
        let mut reflection = Self::default();

        for active in device.active_attributes(program) {
            let Some(location) = device.attribute_location(program, &active.name) else {
                continue;
            };

            engine_trace!("galaxy3d::Shader", "Found attribute {} at {}", active.name, location);
            reflection.attributes.insert(active.name.clone(), Attribute {
                name: active.name,
                location,
                kind: active.kind,
                size: active.size,
            });
        }

        for active in device.active_uniforms(program) {
            let name = active.name.strip_suffix("[0]").unwrap_or(&active.name).to_string();
            let Some(location) = device.uniform_location(program, &active.name) else {
                continue;
            };

            let mut array_locations = Vec::new();
            if active.size > 1 {
                for index in 0..active.size {
                    match device.uniform_location(program, &format!("{}[{}]", name, index)) {
                        Some(element) => array_locations.push(element),
                        None => break,
                    }
                }
            }

            engine_trace!(
                "galaxy3d::Shader",
                "Found uniform {} at {} ({} element(s))", name, location.0, active.size
            );
            reflection.uniforms.insert(name.clone(), Uniform {
                name,
                location,
                kind: active.kind,
                size: active.size,
                array_locations,
            });
        }

        reflection
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn uniform(&self, name: &str) -> Option<&Uniform> {
        self.uniforms.get(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    pub fn uniforms(&self) -> impl Iterator<Item = &Uniform> {
        self.uniforms.values()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    pub fn uniform_count(&self) -> usize {
        self.uniforms.len()
    }
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
