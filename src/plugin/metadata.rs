use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MetadataError;

/// Descriptor file expected at the root of a plugin source tree.
pub const DESCRIPTOR_FILE: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginId(String);

impl PluginId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of a KPackage `metadata.json` the installer reads.
#[derive(Debug, Deserialize)]
struct Descriptor {
    #[serde(rename = "KPlugin")]
    kplugin: KPluginSection,
}

#[derive(Debug, Deserialize)]
struct KPluginSection {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Debug, Clone)]
pub struct PluginMetadata {
    pub id: PluginId,
    pub descriptor_path: PathBuf,
}

impl PluginMetadata {
    pub fn load(source_tree: &Path) -> Result<Self, MetadataError> {
        let descriptor_path = source_tree.join(DESCRIPTOR_FILE);
        let raw = fs::read_to_string(&descriptor_path).map_err(|source| MetadataError::Read {
            path: descriptor_path.clone(),
            source,
        })?;

        Self::parse(&raw, descriptor_path)
    }

    fn parse(raw: &str, descriptor_path: PathBuf) -> Result<Self, MetadataError> {
        let descriptor: Descriptor =
            serde_json::from_str(raw).map_err(|source| MetadataError::Parse {
                path: descriptor_path.clone(),
                source,
            })?;

        let id = descriptor.kplugin.id.trim();
        if id.is_empty() {
            return Err(MetadataError::MissingId {
                path: descriptor_path,
            });
        }

        Ok(Self {
            id: PluginId(id.to_string()),
            descriptor_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(raw: &str) -> Result<PluginMetadata, MetadataError> {
        PluginMetadata::parse(raw, PathBuf::from(DESCRIPTOR_FILE))
    }

    #[test]
    fn reads_the_nested_id_and_ignores_other_fields() {
        let raw = r#"{
            "KPackageStructure": "KWin/Script",
            "KPlugin": {
                "Id": "a2n.windowSignal",
                "Name": "Window Signal",
                "Version": "1.0"
            },
            "X-Plasma-API": "javascript"
        }"#;

        let metadata = parse(raw).unwrap();
        assert_eq!(metadata.id.as_str(), "a2n.windowSignal");
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = parse("{\"KPlugin\": ").unwrap_err();
        assert!(matches!(err, MetadataError::Parse { .. }));
    }

    #[test]
    fn missing_id_field_is_a_parse_error() {
        let err = parse(r#"{"KPlugin": {"Name": "x"}}"#).unwrap_err();
        assert!(matches!(err, MetadataError::Parse { .. }));
    }

    #[test]
    fn blank_id_is_rejected() {
        let err = parse(r#"{"KPlugin": {"Id": "  "}}"#).unwrap_err();
        assert!(matches!(err, MetadataError::MissingId { .. }));
    }

    #[test]
    fn load_reads_descriptor_from_source_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DESCRIPTOR_FILE),
            r#"{"KPlugin":{"Id":"sample.plugin"}}"#,
        )
        .unwrap();

        let metadata = PluginMetadata::load(dir.path()).unwrap();

        assert_eq!(metadata.id.to_string(), "sample.plugin");
        assert_eq!(metadata.descriptor_path, dir.path().join(DESCRIPTOR_FILE));
    }

    #[test]
    fn load_without_descriptor_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = PluginMetadata::load(dir.path()).unwrap_err();
        assert!(matches!(err, MetadataError::Read { .. }));
    }
}
