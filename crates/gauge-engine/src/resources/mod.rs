//! Shader and texture providers plus resource file lookup.
//!
//! Everything here is created once at setup and handed to the renderer by
//! reference. GPU objects are owned and deleted on drop.

mod locate;
mod shader;
mod texture;

pub use locate::ResourceLocator;
pub use shader::{ColoredVertexShader, ShaderProgram};
pub use texture::{Texture, TextureImage};
