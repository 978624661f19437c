use std::fmt;
use std::path::Path;

use crate::error::GlslOptError;

/// Graphics API dialect the optimized shader has to stay compatible with.
///
/// The discriminants are the codes the engine expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShaderTarget {
    #[default]
    OpenGL = 1,
    OpenGLES20 = 2,
    OpenGLES30 = 3,
}

impl ShaderTarget {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ShaderTarget::OpenGL),
            2 => Some(ShaderTarget::OpenGLES20),
            3 => Some(ShaderTarget::OpenGLES30),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderTarget::OpenGL => "opengl",
            ShaderTarget::OpenGLES20 => "opengles2",
            ShaderTarget::OpenGLES30 => "opengles3",
        }
    }
}

impl fmt::Display for ShaderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn is_vertex(self) -> bool {
        self == ShaderStage::Vertex
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Maps the `--target` value to a [`ShaderTarget`]; absence means OpenGL.
pub fn resolve_target(value: Option<&str>) -> Result<ShaderTarget, GlslOptError> {
    let Some(value) = value else {
        return Ok(ShaderTarget::default());
    };
    match value.to_ascii_lowercase().as_str() {
        "opengl" => Ok(ShaderTarget::OpenGL),
        "opengles2" => Ok(ShaderTarget::OpenGLES20),
        "opengles3" => Ok(ShaderTarget::OpenGLES30),
        _ => Err(GlslOptError::InvalidTarget(value.to_string())),
    }
}

/// Picks the shader stage from the explicit flags, falling back to the
/// input's extension (`.vert` / `.frag`) when neither flag is set.
pub fn resolve_stage(
    vs: bool,
    fs: bool,
    input: Option<&Path>,
) -> Result<ShaderStage, GlslOptError> {
    match (vs, fs) {
        (true, true) => return Err(GlslOptError::ConflictingStage),
        (true, false) => return Ok(ShaderStage::Vertex),
        (false, true) => return Ok(ShaderStage::Fragment),
        (false, false) => {}
    }

    let ext = input
        .and_then(|path| path.extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match ext.as_deref() {
        Some("vert") => Ok(ShaderStage::Vertex),
        Some("frag") => Ok(ShaderStage::Fragment),
        _ => Err(GlslOptError::UndefinedStage),
    }
}
