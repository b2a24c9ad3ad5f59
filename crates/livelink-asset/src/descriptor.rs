use serde::{Deserialize, Serialize};

use crate::error::{AssetError, Result};

/// One texture map shipped with an asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextureComponent {
    /// File format, e.g. `jpg`, `exr`.
    pub format: String,
    /// Map type, e.g. `albedo`, `normal`.
    #[serde(rename = "type")]
    pub map_type: String,
    /// Absolute path of the texture file.
    pub path: String,
}

/// One mesh file shipped with an asset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeshDescriptor {
    /// File format, e.g. `fbx`, `obj`.
    pub format: String,
    /// Absolute path of the mesh file.
    pub path: String,
}

/// An asset record as sent by the asset browser.
///
/// Fields the importer does not use are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub id: String,
    /// Directory holding the asset's files.
    pub path: String,
    #[serde(rename = "type")]
    pub asset_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub components: Vec<TextureComponent>,
    #[serde(default)]
    pub mesh_list: Vec<MeshDescriptor>,
}

/// Decode a completed payload into its asset records, in payload order.
pub fn decode_payload(payload: &[u8]) -> Result<Vec<AssetDescriptor>> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(AssetError::Empty);
    }
    let assets: Vec<AssetDescriptor> = serde_json::from_slice(payload)?;
    tracing::debug!(count = assets.len(), "decoded asset payload");
    Ok(assets)
}
