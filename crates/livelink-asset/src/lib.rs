//! Asset payload decoding for LiveLink.
//!
//! The ingestion core treats payloads as opaque bytes. This crate is the
//! builder-side view of them: it decodes the JSON array sent by the asset
//! browser into [`AssetDescriptor`] records and derives the [`ImportPlan`]
//! a scene builder acts on (which texture maps and meshes to use, and what to
//! call the resulting material).

pub mod descriptor;
pub mod error;
pub mod plan;

pub use descriptor::{decode_payload, AssetDescriptor, MeshDescriptor, TextureComponent};
pub use error::{AssetError, Result};
pub use plan::{plan_payload, ImportPlan, BASE_TEXTURE_TYPES, SUPPORTED_MESH_FORMATS};
