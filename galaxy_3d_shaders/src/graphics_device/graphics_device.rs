/// GraphicsDevice trait - the graphics-API capability set consumed by the shader subsystem
///
/// Every GPU call the shader subsystem issues goes through this trait:
/// stage compilation, program linking, active resource reflection, uniform
/// uploads, program binding and the buffer/vertex-array primitives used by
/// the buffer wrappers. Backends (e.g. `GlowGraphicsDevice`) implement it;
/// tests use `MockGraphicsDevice`.

use crate::error::Result;

// ============================================================================
// Handles
// ============================================================================

/// Opaque handle of a compiled shader stage (GL shader object name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StageHandle(pub u32);

/// Opaque handle of a linked program (GL program object name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Opaque handle of a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Opaque handle of a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub u32);

/// Location of a uniform (or of one element of a uniform array) in a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

// ============================================================================
// Shader stages and GLSL types
// ============================================================================

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment/Pixel shader
    Fragment,
    /// Geometry shader
    Geometry,
}

impl ShaderStage {
    /// Stage kind from a file extension (`vert`, `frag`, `geom`)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "vert" => Some(ShaderStage::Vertex),
            "frag" => Some(ShaderStage::Fragment),
            "geom" => Some(ShaderStage::Geometry),
            _ => None,
        }
    }

    /// File extension conventionally used for this stage
    pub fn extension(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::Fragment => "frag",
            ShaderStage::Geometry => "geom",
        }
    }
}

/// Type tag of an active attribute or uniform, as reported by reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlslType {
    Float,
    FloatVec2,
    FloatVec3,
    FloatVec4,
    Int,
    IntVec2,
    IntVec3,
    IntVec4,
    UnsignedInt,
    Bool,
    FloatMat2,
    FloatMat3,
    FloatMat4,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    Sampler2DShadow,
    Sampler2DArray,
    /// Any type the engine has no setter for (raw backend enum value)
    Other(u32),
}

impl GlslType {
    /// Number of float components for `float`/`vecN` types
    pub fn float_components(&self) -> Option<i32> {
        match self {
            GlslType::Float => Some(1),
            GlslType::FloatVec2 => Some(2),
            GlslType::FloatVec3 => Some(3),
            GlslType::FloatVec4 => Some(4),
            _ => None,
        }
    }

    /// True for every sampler type
    pub fn is_sampler(&self) -> bool {
        matches!(
            self,
            GlslType::Sampler2D
                | GlslType::Sampler3D
                | GlslType::SamplerCube
                | GlslType::Sampler2DShadow
                | GlslType::Sampler2DArray
        )
    }
}

/// One entry of a program's active attribute or active uniform list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveResource {
    /// Name as reported by the driver (arrays are usually reported as `name[0]`)
    pub name: String,
    /// Type tag
    pub kind: GlslType,
    /// Element count (1 for non-arrays)
    pub size: i32,
}

// ============================================================================
// Compile / link results
// ============================================================================

/// Result of compiling one stage
///
/// A failed compilation still yields a handle (the driver keeps the shader
/// object around so the log can be read); the caller releases it.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub handle: StageHandle,
    pub success: bool,
    pub log: String,
}

/// Result of linking stages into a program
#[derive(Debug, Clone)]
pub struct LinkOutput {
    pub handle: ProgramHandle,
    pub success: bool,
    pub log: String,
}

// ============================================================================
// Uniform values
// ============================================================================

/// A value uploaded to one uniform location
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major 3x3 matrix (`transpose` = source is row-major)
    Mat3 { data: [f32; 9], transpose: bool },
    /// Column-major 4x4 matrix (`transpose` = source is row-major)
    Mat4 { data: [f32; 16], transpose: bool },
}

// ============================================================================
// Buffers
// ============================================================================

/// Buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    /// Vertex attribute data
    Array,
    /// Index data
    ElementArray,
}

/// Buffer usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

/// Scalar element type stored in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Float,
    Int,
    UnsignedInt,
    Short,
    UnsignedShort,
}

impl ElementType {
    /// Size in bytes of one element
    pub fn size_bytes(&self) -> i32 {
        match self {
            ElementType::Float | ElementType::Int | ElementType::UnsignedInt => 4,
            ElementType::Short | ElementType::UnsignedShort => 2,
        }
    }
}

/// Layout passed to `glVertexAttribPointer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttributePointer {
    /// Components per vertex (1..=4)
    pub components: i32,
    /// Element type
    pub element_type: ElementType,
    /// Normalize integer data to [0, 1] / [-1, 1]
    pub normalize: bool,
    /// Stride in bytes between consecutive vertices
    pub stride: i32,
    /// Byte offset of the first component
    pub offset: i32,
}

/// Implementation limits, logged at shader manager creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_vertex_attributes: u32,
    pub max_vertex_uniform_components: u32,
    pub max_fragment_uniform_components: u32,
    pub max_combined_vertex_uniform_components: u32,
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Graphics-API capability set
///
/// All methods must be called on the thread owning the graphics context.
/// Methods returning `Result` only fail when the backend cannot create the
/// object at all; compile and link failures are reported through
/// [`CompileOutput`] / [`LinkOutput`].
pub trait GraphicsDevice {
    /// Compile one stage from (already include-expanded) source
    fn compile_stage(&mut self, stage: ShaderStage, source: &str) -> Result<CompileOutput>;

    /// Release a compiled stage
    fn delete_stage(&mut self, stage: StageHandle);

    /// Link stages into a program
    ///
    /// Stages are detached again once linking is done; the program does not
    /// keep them alive.
    fn link_program(&mut self, stages: &[StageHandle]) -> Result<LinkOutput>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramHandle);

    /// Active vertex attributes of a linked program
    fn active_attributes(&mut self, program: ProgramHandle) -> Vec<ActiveResource>;

    /// Active uniforms of a linked program
    fn active_uniforms(&mut self, program: ProgramHandle) -> Vec<ActiveResource>;

    /// Location of a vertex attribute (may differ from its active index)
    fn attribute_location(&mut self, program: ProgramHandle, name: &str) -> Option<u32>;

    /// Location of a uniform, or of one array element (`name[i]`)
    fn uniform_location(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;

    /// Make a program current (`None` unbinds)
    fn use_program(&mut self, program: Option<ProgramHandle>);

    /// Upload a value to a uniform location of the current program
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Create a buffer and upload `data` into it
    fn create_buffer(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) -> Result<BufferHandle>;

    /// Bind a buffer to a target (`None` unbinds)
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Release a buffer
    fn delete_buffer(&mut self, buffer: BufferHandle);

    /// Create a vertex array object
    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle>;

    /// Bind a vertex array object (`None` unbinds)
    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayHandle>);

    /// Release a vertex array object
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    /// Enable an attribute array and point it at the currently bound array buffer
    fn enable_vertex_attribute(&mut self, location: u32, pointer: VertexAttributePointer);

    /// Implementation limits
    fn limits(&self) -> DeviceLimits;
}
