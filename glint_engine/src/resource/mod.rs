//! Resource management module
//!
//! Attribute buffers, uniform blocks and textures, with their descriptors,
//! CPU shadow copies and the identity-keyed registry that owns them.

pub mod value;
pub mod typed_array;
pub mod dirty_range;
pub mod descriptor;
pub mod buffer;
pub mod uniform_block;
pub mod texture;
mod registry;

pub use value::{Value, ValueLayout};
pub use typed_array::TypedArray;
pub use dirty_range::DirtyRange;
pub use descriptor::{
    SharedResource, ResourceDesc,
    BufferDesc, UniformBlockDesc, TextureDesc,
};
pub(crate) use descriptor::descriptor_identity;
pub use buffer::BufferResource;
pub use uniform_block::{
    UniformBlockResource, UniformField, Std140Layout, pack_std140,
};
pub use texture::{TextureResource, TextureUpdate};
pub use registry::{ResourceKey, Resource, ResourceBody, ResourceRegistry};
