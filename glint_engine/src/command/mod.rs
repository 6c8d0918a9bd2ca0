//! Draw commands
//!
//! Command descriptors, GLSL synthesis, the shader/program cache, the draw
//! unit itself and the ordered set the renderer walks every frame.

pub mod descriptor;
pub mod shader_gen;
pub mod program_cache;
pub mod command;
pub mod command_set;

pub use descriptor::{CommandDesc, RenderPredicate, DEFAULT_PRECISION};
pub use shader_gen::{ShaderInputs, SHADER_VERSION};
pub use program_cache::ProgramCache;
pub use command::{Command, CommandKey, InstanceKey};
pub use command_set::{CommandSet, DEFAULT_ORDER_STEP};
