use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::descriptor::{decode_payload, AssetDescriptor, MeshDescriptor, TextureComponent};
use crate::error::Result;

/// Texture map types the shader graph knows how to wire.
pub const BASE_TEXTURE_TYPES: [&str; 13] = [
    "albedo",
    "displacement",
    "normal",
    "roughness",
    "specular",
    "normalbump",
    "ao",
    "opacity",
    "translucency",
    "gloss",
    "metalness",
    "bump",
    "fuzz",
];

/// Mesh formats the host can import.
pub const SUPPORTED_MESH_FORMATS: [&str; 2] = ["fbx", "obj"];

/// What a scene builder should do with one asset.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportPlan {
    pub asset_id: String,
    pub asset_type: String,
    /// Object name, derived from the asset name or its directory.
    pub asset_name: String,
    /// `<asset_name>_<asset_id>`.
    pub material_name: String,
    pub is_metal: bool,
    /// Texture maps of a known type, in payload order.
    pub textures: Vec<TextureComponent>,
    /// Meshes in a supported format, in payload order.
    pub meshes: Vec<MeshDescriptor>,
    /// Per-asset metadata file (`<path>/<id>.json`).
    pub metadata_path: PathBuf,
}

impl ImportPlan {
    /// Derive the plan for one asset record.
    pub fn from_descriptor(asset: &AssetDescriptor) -> Self {
        let textures = asset
            .components
            .iter()
            .filter(|c| BASE_TEXTURE_TYPES.contains(&c.map_type.as_str()))
            .cloned()
            .collect();

        let meshes = asset
            .mesh_list
            .iter()
            .filter(|m| {
                SUPPORTED_MESH_FORMATS
                    .iter()
                    .any(|f| m.format.eq_ignore_ascii_case(f))
            })
            .cloned()
            .collect();

        let asset_name = derive_asset_name(asset);
        let material_name = format!("{asset_name}_{}", asset.id);

        Self {
            asset_id: asset.id.clone(),
            asset_type: asset.asset_type.clone(),
            asset_name,
            material_name,
            is_metal: asset.category.as_deref() == Some("Metal"),
            textures,
            meshes,
            metadata_path: Path::new(&asset.path).join(format!("{}.json", asset.id)),
        }
    }

    /// Assets without a single usable texture map are skipped by the builder.
    pub fn is_importable(&self) -> bool {
        !self.textures.is_empty()
    }

    /// First texture of the given map type, if any.
    pub fn texture(&self, map_type: &str) -> Option<&TextureComponent> {
        self.textures.iter().find(|t| t.map_type == map_type)
    }
}

/// Decode a payload and plan every asset in it.
pub fn plan_payload(payload: &[u8]) -> Result<Vec<ImportPlan>> {
    Ok(decode_payload(payload)?
        .iter()
        .map(ImportPlan::from_descriptor)
        .collect())
}

fn derive_asset_name(asset: &AssetDescriptor) -> String {
    let raw = match &asset.name {
        Some(name) => name.clone(),
        None => Path::new(&asset.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| asset.path.clone()),
    };
    let name = raw.replace(' ', "_");

    // Browser names end in a variant or id segment; keep the descriptive part.
    let parts: Vec<&str> = name.split('_').collect();
    if parts.len() > 2 {
        parts[..parts.len() - 1].join("_")
    } else {
        name
    }
}
