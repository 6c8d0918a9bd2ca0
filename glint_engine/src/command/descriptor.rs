/// Command descriptor - everything a caller supplies to build a draw unit

use std::fmt;
use std::sync::Arc;
use crate::device::{DrawMode, DepthFunc, CullFace, ShaderStage};
use crate::error::{Error, Result};
use crate::resource::{SharedResource, Value};

/// Default precision line for both shader stages
pub const DEFAULT_PRECISION: &str = "precision highp float;";

/// Visibility predicate, checked before every draw
#[derive(Clone)]
pub struct RenderPredicate(pub Arc<dyn Fn() -> bool + Send + Sync>);

impl RenderPredicate {
    pub fn new(f: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn check(&self) -> bool {
        (self.0)()
    }
}

impl fmt::Debug for RenderPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderPredicate")
    }
}

/// Description of one draw unit
///
/// `context` entries are shared: the same `SharedResource` used by several
/// commands is one GPU resource. `props` declare per-instance attributes with
/// their default value; each command gets its own instance buffers.
#[derive(Debug, Clone)]
pub struct CommandDesc {
    /// Vertex shader body, appended after the generated declarations
    pub vertex: Option<String>,
    /// Fragment shader body
    pub fragment: Option<String>,
    /// Shared resources by shader name, in declaration order
    pub context: Vec<(String, SharedResource)>,
    /// Instanced attributes by shader name, with default values
    pub props: Vec<(String, Value)>,
    /// Index list drawn with `draw_elements_instanced`
    pub elements: Option<Vec<u16>>,
    pub mode: DrawMode,
    /// `None` disables depth testing
    pub depth: Option<DepthFunc>,
    /// `None` disables face culling
    pub cull: Option<CullFace>,
    pub vertex_precision: String,
    pub fragment_precision: String,
    /// Sort key; registration order when `None`
    pub order: Option<f64>,
    /// Vertex count override
    pub count: Option<u32>,
    /// Instances drawn on top of the added ones
    pub instance_count: Option<u32>,
    pub should_render: Option<RenderPredicate>,
}

impl Default for CommandDesc {
    fn default() -> Self {
        Self {
            vertex: None,
            fragment: None,
            context: Vec::new(),
            props: Vec::new(),
            elements: None,
            mode: DrawMode::Triangles,
            depth: Some(DepthFunc::Less),
            cull: Some(CullFace::Back),
            vertex_precision: DEFAULT_PRECISION.to_string(),
            fragment_precision: DEFAULT_PRECISION.to_string(),
            order: None,
            count: None,
            instance_count: None,
            should_render: None,
        }
    }
}

impl CommandDesc {
    pub fn new(vertex: &str, fragment: &str) -> Self {
        Self {
            vertex: Some(vertex.to_string()),
            fragment: Some(fragment.to_string()),
            ..Self::default()
        }
    }

    // ===== BUILDER =====

    pub fn context(mut self, name: &str, resource: &SharedResource) -> Self {
        self.context.push((name.to_string(), resource.clone()));
        self
    }

    pub fn prop(mut self, name: &str, default_value: impl Into<Value>) -> Self {
        self.props.push((name.to_string(), default_value.into()));
        self
    }

    pub fn elements(mut self, indices: Vec<u16>) -> Self {
        self.elements = Some(indices);
        self
    }

    pub fn mode(mut self, mode: DrawMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn depth(mut self, depth: Option<DepthFunc>) -> Self {
        self.depth = depth;
        self
    }

    pub fn cull(mut self, cull: Option<CullFace>) -> Self {
        self.cull = cull;
        self
    }

    pub fn vertex_precision(mut self, precision: &str) -> Self {
        self.vertex_precision = precision.to_string();
        self
    }

    pub fn fragment_precision(mut self, precision: &str) -> Self {
        self.fragment_precision = precision.to_string();
        self
    }

    pub fn order(mut self, order: f64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn instance_count(mut self, count: u32) -> Self {
        self.instance_count = Some(count);
        self
    }

    pub fn should_render(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.should_render = Some(RenderPredicate::new(predicate));
        self
    }

    /// Both shader bodies, or the stage that is missing
    pub(crate) fn shader_bodies(&self) -> Result<(&str, &str)> {
        let vertex = self.vertex.as_deref().filter(|s| !s.is_empty());
        let fragment = self.fragment.as_deref().filter(|s| !s.is_empty());
        match (vertex, fragment) {
            (Some(v), Some(f)) => Ok((v, f)),
            (None, _) => Err(Error::MissingShaderSource(ShaderStage::Vertex)),
            (_, None) => Err(Error::MissingShaderSource(ShaderStage::Fragment)),
        }
    }
}
