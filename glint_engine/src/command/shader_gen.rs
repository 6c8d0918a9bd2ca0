/// GLSL source synthesis
///
/// Every command's shaders are a fixed preamble, one declaration per bound
/// resource, then the caller's body:
///
/// ```text
/// #version 300 es
/// precision highp float;
/// in vec2 position;          <- shared attributes (vertex only)
/// in vec4 color;             <- instanced attributes (vertex only)
/// layout(std140) uniform camera {
///   float zoom;
/// };
/// uniform sampler2D tex;
/// void main() { ... }
/// ```
///
/// Empty sections still produce an (empty) line so compiler line numbers
/// stay stable.

use crate::resource::Std140Layout;

pub const SHADER_VERSION: &str = "#version 300 es";

/// Declarations derived from a command's resources
#[derive(Debug, Default, Clone)]
pub struct ShaderInputs {
    /// (name, shader type) of per-vertex attributes
    pub attributes: Vec<(String, String)>,
    /// (name, shader type) of per-instance attributes
    pub instanced: Vec<(String, String)>,
    /// (name, layout) of uniform blocks
    pub blocks: Vec<(String, Std140Layout)>,
    /// (name, sampler type) of textures
    pub samplers: Vec<(String, String)>,
}

impl ShaderInputs {
    fn in_lines(declarations: &[(String, String)]) -> String {
        declarations
            .iter()
            .map(|(name, ty)| format!("in {} {};", ty, name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn block_lines(&self) -> String {
        self.blocks
            .iter()
            .map(|(name, layout)| {
                let fields = layout
                    .fields
                    .iter()
                    .map(|f| format!("{} {};", f.shader_type, f.name))
                    .collect::<Vec<_>>()
                    .join("\n  ");
                format!("layout(std140) uniform {} {{\n  {}\n}};", name, fields)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn sampler_lines(&self) -> String {
        self.samplers
            .iter()
            .map(|(name, ty)| format!("uniform {} {};", ty, name))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Complete vertex shader
    pub fn vertex_source(&self, precision: &str, body: &str) -> String {
        [
            SHADER_VERSION.to_string(),
            precision.to_string(),
            Self::in_lines(&self.attributes),
            Self::in_lines(&self.instanced),
            self.block_lines(),
            self.sampler_lines(),
            body.to_string(),
        ]
        .join("\n")
    }

    /// Complete fragment shader; attributes are not visible here
    pub fn fragment_source(&self, precision: &str, body: &str) -> String {
        [
            SHADER_VERSION.to_string(),
            precision.to_string(),
            self.block_lines(),
            self.sampler_lines(),
            body.to_string(),
        ]
        .join("\n")
    }
}

#[cfg(test)]
#[path = "shader_gen_tests.rs"]
mod tests;
