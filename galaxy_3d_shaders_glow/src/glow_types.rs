/// Conversions between engine enums and GL enum values

use galaxy_3d_shaders::galaxy3d::device::{
    BufferTarget, BufferUsage, ElementType, GlslType, ShaderStage,
};

/// Map a GL uniform/attribute type enum to [`GlslType`]
pub fn glsl_type_from_gl(gl_type: u32) -> GlslType {
    match gl_type {
        glow::FLOAT => GlslType::Float,
        glow::FLOAT_VEC2 => GlslType::FloatVec2,
        glow::FLOAT_VEC3 => GlslType::FloatVec3,
        glow::FLOAT_VEC4 => GlslType::FloatVec4,
        glow::INT => GlslType::Int,
        glow::INT_VEC2 => GlslType::IntVec2,
        glow::INT_VEC3 => GlslType::IntVec3,
        glow::INT_VEC4 => GlslType::IntVec4,
        glow::UNSIGNED_INT => GlslType::UnsignedInt,
        glow::BOOL => GlslType::Bool,
        glow::FLOAT_MAT2 => GlslType::FloatMat2,
        glow::FLOAT_MAT3 => GlslType::FloatMat3,
        glow::FLOAT_MAT4 => GlslType::FloatMat4,
        glow::SAMPLER_2D => GlslType::Sampler2D,
        glow::SAMPLER_3D => GlslType::Sampler3D,
        glow::SAMPLER_CUBE => GlslType::SamplerCube,
        glow::SAMPLER_2D_SHADOW => GlslType::Sampler2DShadow,
        glow::SAMPLER_2D_ARRAY => GlslType::Sampler2DArray,
        other => GlslType::Other(other),
    }
}

/// GL shader object type of a stage
pub fn stage_to_gl(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        ShaderStage::Geometry => glow::GEOMETRY_SHADER,
    }
}

pub fn buffer_target_to_gl(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

pub fn usage_to_gl(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
    }
}

pub fn element_type_to_gl(element_type: ElementType) -> u32 {
    match element_type {
        ElementType::Float => glow::FLOAT,
        ElementType::Int => glow::INT,
        ElementType::UnsignedInt => glow::UNSIGNED_INT,
        ElementType::Short => glow::SHORT,
        ElementType::UnsignedShort => glow::UNSIGNED_SHORT,
    }
}

#[cfg(test)]
#[path = "glow_types_tests.rs"]
mod tests;
