use std::fmt;

use super::BufferTarget;

/// GL object categories, used in allocation errors and device counters.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObjectKind {
    VertexArray,
    Buffer,
    Program,
    Texture,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::VertexArray => "vertex array",
            ObjectKind::Buffer => "buffer",
            ObjectKind::Program => "program",
            ObjectKind::Texture => "texture",
        })
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Failure reported by a graphics backend.
///
/// Every variant is a one-shot failure of a single driver call; nothing in
/// the engine retries.
#[derive(Debug, Clone, PartialEq)]
pub enum GlError {
    /// The context could not create an object. Fatal for the owner being built.
    ObjectAllocation { kind: ObjectKind, reason: String },
    /// A buffer (re)allocation was refused; the buffer's storage is undefined.
    BufferAllocation { target: BufferTarget, bytes: usize, reason: String },
    ShaderCompile { stage: ShaderStage, log: String },
    ProgramLink { log: String },
    Texture { reason: String },
}

impl GlError {
    pub(crate) fn allocation(kind: ObjectKind, reason: impl Into<String>) -> Self {
        GlError::ObjectAllocation { kind, reason: reason.into() }
    }
}

impl fmt::Display for GlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlError::ObjectAllocation { kind, reason } => {
                write!(f, "failed to allocate GL {kind}: {reason}")
            }
            GlError::BufferAllocation { target, bytes, reason } => {
                write!(f, "failed to allocate {bytes} bytes for the {target:?} buffer: {reason}")
            }
            GlError::ShaderCompile { stage, log } => {
                write!(f, "{stage} shader compilation failed:\n{log}")
            }
            GlError::ProgramLink { log } => write!(f, "shader link failed:\n{log}"),
            GlError::Texture { reason } => write!(f, "texture upload failed: {reason}"),
        }
    }
}

impl std::error::Error for GlError {}
