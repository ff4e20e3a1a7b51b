//! Pack descriptors (`manifest.json`) and category inference.

use crate::constants::{
    BEHAVIOR_PACKS_DIR, RESOURCE_PACKS_DIR, WORLD_BEHAVIOR_PACKS_FILE, WORLD_RESOURCE_PACKS_FILE,
};
use crate::core::StewardError;
use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Behavior (server logic) or resource (client assets) content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackCategory {
    Behavior,
    Resource,
}

impl PackCategory {
    /// Folder under the install root holding packs of this category.
    #[must_use]
    pub const fn install_dir(self) -> &'static str {
        match self {
            Self::Behavior => BEHAVIOR_PACKS_DIR,
            Self::Resource => RESOURCE_PACKS_DIR,
        }
    }

    /// Registry file inside a world folder.
    #[must_use]
    pub const fn registry_file(self) -> &'static str {
        match self {
            Self::Behavior => WORLD_BEHAVIOR_PACKS_FILE,
            Self::Resource => WORLD_RESOURCE_PACKS_FILE,
        }
    }

    /// Classify a manifest module `type`.
    #[must_use]
    pub fn from_module_type(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "data" | "script" | "client_data" | "javascript" => Some(Self::Behavior),
            "resources" => Some(Self::Resource),
            _ => None,
        }
    }

    /// Best-effort guess from the folder names leading to a manifest.
    ///
    /// Segments are checked innermost first. A segment mentioning
    /// `behavior`/`behaviour` or ending in `bp` means behavior; one mentioning
    /// `resource` or ending in `rp` means resource.
    #[must_use]
    pub fn from_path_hint<'a, I>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: DoubleEndedIterator,
    {
        segments.into_iter().rev().find_map(|segment| {
            let segment = segment.to_ascii_lowercase();
            let segment = segment.trim_end_matches(['_', '-', ' ']);
            if segment.contains("behavior") || segment.contains("behaviour") || segment.ends_with("bp")
            {
                Some(Self::Behavior)
            } else if segment.contains("resource") || segment.ends_with("rp") {
                Some(Self::Resource)
            } else {
                None
            }
        })
    }
}

impl fmt::Display for PackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Behavior => "behavior",
            Self::Resource => "resource",
        })
    }
}

impl FromStr for PackCategory {
    type Err = StewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "behavior" | "behaviour" | "bp" => Ok(Self::Behavior),
            "resource" | "rp" => Ok(Self::Resource),
            other => Err(StewardError::Parse(format!("unknown pack category '{other}'"))),
        }
    }
}

/// `major.minor.patch` as used by pack headers and registries.
///
/// Serialized as a `[major, minor, patch]` array; deserializes from either the
/// array or a `"1.2.3"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PackVersion(pub [u32; 3]);

impl PackVersion {
    fn from_parts(parts: &[u32]) -> Option<Self> {
        if parts.is_empty() || parts.len() > 3 {
            return None;
        }
        let mut triple = [0; 3];
        triple[..parts.len()].copy_from_slice(parts);
        Some(Self(triple))
    }
}

impl fmt::Display for PackVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [major, minor, patch] = self.0;
        write!(f, "{major}.{minor}.{patch}")
    }
}

impl FromStr for PackVersion {
    type Err = StewardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .trim()
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| StewardError::Parse(format!("invalid pack version '{s}'")))?;
        Self::from_parts(&parts)
            .ok_or_else(|| StewardError::Parse(format!("invalid pack version '{s}'")))
    }
}

impl Serialize for PackVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PackVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Parts(Vec<u32>),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Parts(parts) => Self::from_parts(&parts).ok_or_else(|| {
                serde::de::Error::custom(format!("expected 1 to 3 version numbers, got {parts:?}"))
            }),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    header: Option<RawHeader>,
    #[serde(default)]
    modules: Vec<RawModule>,
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    name: Option<String>,
    uuid: Option<String>,
    version: Option<PackVersion>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// The parts of a pack's `manifest.json` steward cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackManifest {
    pub uuid: String,
    pub version: PackVersion,
    /// Display name; may be empty.
    pub name: String,
    pub module_types: Vec<String>,
}

impl PackManifest {
    /// Parse a manifest, requiring `header.uuid` and `header.version`.
    pub fn parse(content: &[u8]) -> Result<Self> {
        let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
        let raw: RawManifest = serde_json::from_slice(content)
            .map_err(|e| StewardError::Parse(format!("malformed manifest.json: {e}")))?;

        let header = raw
            .header
            .ok_or_else(|| StewardError::Parse("manifest.json has no header".to_string()))?;

        let uuid = header
            .uuid
            .ok_or_else(|| StewardError::Parse("manifest header is missing uuid".to_string()))?;
        uuid::Uuid::parse_str(&uuid)
            .map_err(|e| StewardError::Parse(format!("manifest uuid '{uuid}' is invalid: {e}")))?;

        let version = header
            .version
            .ok_or_else(|| StewardError::Parse("manifest header is missing version".to_string()))?;

        Ok(Self {
            uuid,
            version,
            name: header.name.unwrap_or_default(),
            module_types: raw.modules.into_iter().filter_map(|m| m.kind).collect(),
        })
    }

    /// Category declared by the first recognizable module type.
    #[must_use]
    pub fn declared_category(&self) -> Option<PackCategory> {
        self.module_types.iter().find_map(|kind| PackCategory::from_module_type(kind))
    }

    /// Folder name for this pack: the name with every non-alphanumeric
    /// character replaced by `_`, or the uuid when nothing usable remains.
    #[must_use]
    pub fn dir_name(&self) -> String {
        let sanitized: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();

        if sanitized.trim_matches('_').is_empty() {
            self.uuid.clone()
        } else {
            sanitized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::pack_manifest;

    const UUID: &str = "0f9c3a52-2b1e-4c5d-9a8b-7e6f5d4c3b2a";

    #[test]
    fn test_parse_array_version() {
        let json = pack_manifest("Cool Mobs", UUID, [1, 2, 3], "data");
        let manifest = PackManifest::parse(json.as_bytes()).unwrap();

        assert_eq!(manifest.uuid, UUID);
        assert_eq!(manifest.version, PackVersion([1, 2, 3]));
        assert_eq!(manifest.name, "Cool Mobs");
        assert_eq!(manifest.declared_category(), Some(PackCategory::Behavior));
    }

    #[test]
    fn test_parse_string_version_and_bom() {
        let json = format!(
            "\u{feff}{{\"header\":{{\"name\":\"Tex\",\"uuid\":\"{UUID}\",\"version\":\"2.0.1\"}},\
             \"modules\":[{{\"type\":\"resources\"}}]}}"
        );
        let manifest = PackManifest::parse(json.as_bytes()).unwrap();

        assert_eq!(manifest.version, PackVersion([2, 0, 1]));
        assert_eq!(manifest.declared_category(), Some(PackCategory::Resource));
    }

    #[test]
    fn test_missing_identity_is_parse_error() {
        let no_uuid = r#"{"header":{"name":"x","version":[1,0,0]}}"#;
        let err = PackManifest::parse(no_uuid.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("uuid"));

        let no_version = format!(r#"{{"header":{{"uuid":"{UUID}"}}}}"#);
        assert!(PackManifest::parse(no_version.as_bytes()).is_err());

        let bad_uuid = r#"{"header":{"uuid":"not-a-uuid","version":[1,0,0]}}"#;
        assert!(PackManifest::parse(bad_uuid.as_bytes()).is_err());

        assert!(PackManifest::parse(b"{ not json").is_err());
    }

    #[test]
    fn test_unknown_module_type_has_no_declared_category() {
        let json = pack_manifest("Skins", UUID, [1, 0, 0], "skin_pack");
        let manifest = PackManifest::parse(json.as_bytes()).unwrap();
        assert_eq!(manifest.declared_category(), None);
    }

    #[test]
    fn test_dir_name_sanitizing() {
        let json = pack_manifest("§aCool Mobs+!", UUID, [1, 0, 0], "data");
        let manifest = PackManifest::parse(json.as_bytes()).unwrap();
        assert_eq!(manifest.dir_name(), "_aCool_Mobs__");

        let json = pack_manifest("!!!", UUID, [1, 0, 0], "data");
        assert_eq!(PackManifest::parse(json.as_bytes()).unwrap().dir_name(), UUID);
    }

    #[test]
    fn test_path_hint() {
        use PackCategory::{Behavior, Resource};

        assert_eq!(PackCategory::from_path_hint(["MyAddon", "Cool_BP"]), Some(Behavior));
        assert_eq!(PackCategory::from_path_hint(["behaviour pack"]), Some(Behavior));
        assert_eq!(PackCategory::from_path_hint(["Resources"]), Some(Resource));
        assert_eq!(PackCategory::from_path_hint(["cool-rp"]), Some(Resource));
        assert_eq!(PackCategory::from_path_hint(["Textures"]), None);
        // Innermost segment wins
        assert_eq!(PackCategory::from_path_hint(["addon_rp", "logic_bp"]), Some(Behavior));
    }

    #[test]
    fn test_version_forms() {
        assert_eq!("1.2".parse::<PackVersion>().unwrap(), PackVersion([1, 2, 0]));
        assert!("1.2.3.4".parse::<PackVersion>().is_err());
        assert!("one".parse::<PackVersion>().is_err());
        assert_eq!(serde_json::to_string(&PackVersion([1, 0, 2])).unwrap(), "[1,0,2]");
        assert_eq!(PackVersion([1, 0, 2]).to_string(), "1.0.2");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Behavior".parse::<PackCategory>().unwrap(), PackCategory::Behavior);
        assert_eq!("rp".parse::<PackCategory>().unwrap(), PackCategory::Resource);
        assert!("skins".parse::<PackCategory>().is_err());
    }
}
