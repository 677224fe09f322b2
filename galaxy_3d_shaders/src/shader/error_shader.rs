//! Built-in error shader
//!
//! Returned whenever a requested program can't be built, so broken objects
//! render flat red instead of disappearing. The stages are compiled lazily
//! under the reserved names [`DEFAULT_VERTEX_SHADER`] and
//! [`DEFAULT_FRAGMENT_SHADER`].

/// Reserved name of the built-in vertex stage
pub const DEFAULT_VERTEX_SHADER: &str = "Default.vert";

/// Reserved name of the built-in fragment stage
pub const DEFAULT_FRAGMENT_SHADER: &str = "Default.frag";

/// Position attribute of the error shader
pub const ERROR_POSITION_ATTRIBUTE: &str = "aVertexPosition";

/// Transform uniform of the error shader
pub const ERROR_MVP_UNIFORM: &str = "uModelViewProjectionMatrix";

pub const ERROR_VERTEX_SRC: &str = "#version 130
precision highp float;
precision lowp int;

in vec3 aVertexPosition;

uniform mat4 uModelViewProjectionMatrix;

invariant gl_Position;

void main ()
{
    gl_Position = uModelViewProjectionMatrix * vec4 (aVertexPosition, 1.0);
}
";

pub const ERROR_FRAGMENT_SRC: &str = "#version 130
precision highp float;
precision lowp int;

out vec4 oColor;

void main ()
{
    oColor = vec4 (1.0, 0.0, 0.0, 1.0);
}
";
