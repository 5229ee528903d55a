use crate::gl::{GlError, GraphicsApi};

/// Sources of the textured, vertex-colored quad shader.
///
/// Inputs match [`ColoredVertex`](crate::geometry::ColoredVertex):
/// position at location 0, texture coordinate at 1, color at 2. The color is
/// flat-interpolated, so every triangle takes its provoking vertex's color.
pub struct ColoredVertexShader;

impl ColoredVertexShader {
    pub const VERTEX: &'static str = r#"#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec2 aTexCoord;
layout (location = 2) in vec4 aForeColor;

uniform mat4 projection;
uniform mat4 model;

flat out vec4 ourForeColor;
out vec2 TexCoord;

void main() {
    gl_Position = projection * model * vec4(aPos, 1.0);
    ourForeColor = aForeColor;
    TexCoord = aTexCoord;
}
"#;

    pub const FRAGMENT: &'static str = r#"#version 330 core
out vec4 FragColor;

flat in vec4 ourForeColor;
in vec2 TexCoord;

uniform sampler2D our_texture;

void main() {
    FragColor = texture(our_texture, TexCoord) * ourForeColor;
}
"#;

    pub const PROJECTION: &'static str = "projection";
    pub const MODEL: &'static str = "model";
    pub const TEXTURE: &'static str = "our_texture";

    pub fn compile<G: GraphicsApi>(gl: &G) -> Result<ShaderProgram<'_, G>, GlError> {
        ShaderProgram::compile(gl, Self::VERTEX, Self::FRAGMENT)
    }
}

/// A linked program deleted on drop.
pub struct ShaderProgram<'g, G: GraphicsApi> {
    gl: &'g G,
    raw: G::Program,
}

impl<'g, G: GraphicsApi> ShaderProgram<'g, G> {
    pub fn compile(gl: &'g G, vertex_src: &str, fragment_src: &str) -> Result<Self, GlError> {
        let raw = gl.create_program(vertex_src, fragment_src)?;
        log::debug!("shader program linked: {raw:?}");
        Ok(Self { gl, raw })
    }

    #[inline]
    pub fn raw(&self) -> G::Program {
        self.raw
    }

    pub fn bind(&self) {
        self.gl.use_program(Some(self.raw));
    }
}

impl<G: GraphicsApi> Drop for ShaderProgram<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_program(self.raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{HeadlessDevice, ShaderStage};

    #[test]
    fn colored_vertex_shader_compiles_and_drops() {
        let gl = HeadlessDevice::new();
        {
            let program = ColoredVertexShader::compile(&gl).unwrap();
            program.bind();
            assert_eq!(gl.counters().programs_created, 1);
        }
        assert_eq!(gl.counters().programs_deleted, 1);
    }

    #[test]
    fn compile_error_carries_stage() {
        let gl = HeadlessDevice::new();
        let err = ShaderProgram::compile(&gl, "#version 330 core\n", ColoredVertexShader::FRAGMENT)
            .err()
            .unwrap();
        assert!(matches!(err, GlError::ShaderCompile { stage: ShaderStage::Vertex, .. }));
    }

    #[test]
    fn sources_declare_the_uniforms_they_are_fed() {
        for name in [ColoredVertexShader::PROJECTION, ColoredVertexShader::MODEL] {
            assert!(ColoredVertexShader::VERTEX.contains(&format!("uniform mat4 {name};")));
        }
        assert!(ColoredVertexShader::FRAGMENT.contains("uniform sampler2D our_texture;"));
    }
}
