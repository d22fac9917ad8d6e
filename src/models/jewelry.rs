// Data models for jewelry categories, loaded 3D models and placement offsets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ==============================================================================
// Category
// ==============================================================================

/// The fixed set of jewelry types a user can try on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JewelryCategory {
    Necklace,
    Earrings,
    Ring,
}

impl JewelryCategory {
    pub const ALL: [JewelryCategory; 3] = [
        JewelryCategory::Necklace,
        JewelryCategory::Earrings,
        JewelryCategory::Ring,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JewelryCategory::Necklace => "necklace",
            JewelryCategory::Earrings => "earrings",
            JewelryCategory::Ring => "ring",
        }
    }

    /// The category after this one, wrapping around.
    pub fn next(&self) -> JewelryCategory {
        match self {
            JewelryCategory::Necklace => JewelryCategory::Earrings,
            JewelryCategory::Earrings => JewelryCategory::Ring,
            JewelryCategory::Ring => JewelryCategory::Necklace,
        }
    }
}

impl Default for JewelryCategory {
    fn default() -> Self {
        JewelryCategory::Necklace
    }
}

impl fmt::Display for JewelryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown jewelry category: {0}. Must be one of: necklace, earrings, ring")]
pub struct UnknownCategory(pub String);

impl FromStr for JewelryCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "necklace" => Ok(JewelryCategory::Necklace),
            "earrings" => Ok(JewelryCategory::Earrings),
            "ring" => Ok(JewelryCategory::Ring),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

// ==============================================================================
// Placement Offset
// ==============================================================================

/// A position in scene space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Offset3D {
    pub const ORIGIN: Offset3D = Offset3D {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

// ==============================================================================
// Jewelry Model
// ==============================================================================

/// A loaded jewelry model, owned by the asset registry for the whole session
#[derive(Debug, Clone)]
pub struct JewelryModel {
    pub category: JewelryCategory,
    pub source: PathBuf,
    pub scene: GlbScene,
    pub visible: bool,
    pub position: Offset3D,
    pub scale: f32, // Uniform
}

impl JewelryModel {
    /// Models start hidden at the origin.
    pub fn new(category: JewelryCategory, source: PathBuf, scene: GlbScene, scale: f32) -> Self {
        Self {
            category,
            source,
            scene,
            visible: false,
            position: Offset3D::ORIGIN,
            scale,
        }
    }
}

// ==============================================================================
// Binary glTF
// ==============================================================================

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const CHUNK_TYPE_JSON: u32 = 0x4E4F_534A;
const CHUNK_TYPE_BIN: u32 = 0x004E_4942;

/// Summary of a validated `.glb` container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlbScene {
    pub version: u32,
    pub generator: Option<String>,
    pub node_count: usize,
    pub mesh_count: usize,
    pub material_count: usize,
    pub binary_len: usize,
}

impl GlbScene {
    /// Validate a binary glTF container and summarize its JSON chunk.
    pub fn parse(bytes: &[u8]) -> AssetResult<Self> {
        if bytes.len() < GLB_HEADER_LEN {
            return Err(AssetError::InvalidGlb(format!(
                "{} bytes is shorter than the GLB header",
                bytes.len()
            )));
        }

        if &bytes[0..4] != GLB_MAGIC {
            return Err(AssetError::InvalidGlb("missing glTF magic".to_string()));
        }

        let version = read_u32(bytes, 4);
        if version != GLB_VERSION {
            return Err(AssetError::UnsupportedVersion(version));
        }

        let declared = read_u32(bytes, 8) as usize;
        if declared != bytes.len() {
            return Err(AssetError::InvalidGlb(format!(
                "header declares {} bytes but file has {}",
                declared,
                bytes.len()
            )));
        }

        let (json_type, json) = read_chunk(bytes, GLB_HEADER_LEN)?
            .ok_or(AssetError::MissingJsonChunk)?;
        if json_type != CHUNK_TYPE_JSON {
            return Err(AssetError::MissingJsonChunk);
        }

        let document: serde_json::Value = serde_json::from_slice(json)?;

        let bin_offset = GLB_HEADER_LEN + CHUNK_HEADER_LEN + json.len();
        let binary_len = match read_chunk(bytes, bin_offset)? {
            Some((CHUNK_TYPE_BIN, data)) => data.len(),
            Some((other, _)) => {
                return Err(AssetError::InvalidGlb(format!(
                    "unexpected chunk type {:#010x} after JSON",
                    other
                )))
            }
            None => 0,
        };

        let count = |key: &str| {
            document
                .get(key)
                .and_then(|v| v.as_array())
                .map(|a| a.len())
                .unwrap_or(0)
        };

        Ok(Self {
            version,
            generator: document
                .get("asset")
                .and_then(|a| a.get("generator"))
                .and_then(|g| g.as_str())
                .map(str::to_string),
            node_count: count("nodes"),
            mesh_count: count("meshes"),
            material_count: count("materials"),
            binary_len,
        })
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Reads the chunk starting at `offset`; `None` at end of data.
fn read_chunk(bytes: &[u8], offset: usize) -> AssetResult<Option<(u32, &[u8])>> {
    if offset == bytes.len() {
        return Ok(None);
    }
    if offset + CHUNK_HEADER_LEN > bytes.len() {
        return Err(AssetError::InvalidGlb(format!(
            "truncated chunk header at byte {}",
            offset
        )));
    }

    let len = read_u32(bytes, offset) as usize;
    let chunk_type = read_u32(bytes, offset + 4);
    let start = offset + CHUNK_HEADER_LEN;
    let end = start
        .checked_add(len)
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| {
            AssetError::InvalidGlb(format!("chunk at byte {} overruns the file", offset))
        })?;

    Ok(Some((chunk_type, &bytes[start..end])))
}

// ==============================================================================
// Error Types
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid GLB: {0}")]
    InvalidGlb(String),

    #[error("Unsupported GLB version: {0}")]
    UnsupportedVersion(u32),

    #[error("GLB has no leading JSON chunk")]
    MissingJsonChunk,

    #[error("Malformed glTF JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Asset load task failed: {0}")]
    TaskFailed(String),
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Builds a minimal GLB container around the given JSON and binary payload.
#[cfg(test)]
pub(crate) fn test_glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let mut total = GLB_HEADER_LEN + CHUNK_HEADER_LEN + json.len();
    if !bin.is_empty() {
        total += CHUNK_HEADER_LEN + bin.len();
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(GLB_MAGIC);
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    out.extend_from_slice(&json);
    if !bin.is_empty() {
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
    }
    out
}
