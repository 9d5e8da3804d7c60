use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Version reported for packs whose manifest has no usable `header.version`.
pub const DEFAULT_PACK_VERSION: &str = "1.0.0";

/// Content type of an importable package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Unknown,
    ResourcePack,
    BehaviorPack,
    World,
    Addon,
}

impl PackageType {
    /// Human-readable label used in logs and listings.
    pub fn display_name(&self) -> &'static str {
        match self {
            PackageType::Unknown => "Unknown",
            PackageType::ResourcePack => "Resource Pack",
            PackageType::BehaviorPack => "Behavior Pack",
            PackageType::World => "World",
            PackageType::Addon => "Addon",
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Parsed `manifest.json` of a pack or world.
///
/// Third-party manifests are sloppy, so the raw JSON object is kept and each
/// field is interpreted on its own. A wrong-typed field only makes that one
/// accessor come back empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    /// Parse manifest bytes. Anything that is not a JSON object is an error.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice(bytes)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(serde_json::Error::custom("manifest is not a JSON object")),
        }
    }

    fn header(&self) -> Option<&Map<String, Value>> {
        self.fields.get("header").and_then(Value::as_object)
    }

    fn header_str(&self, key: &str) -> Option<&str> {
        self.header()
            .and_then(|header| header.get(key))
            .and_then(Value::as_str)
    }

    fn has_module(&self, kind: &str) -> bool {
        self.fields
            .get("modules")
            .and_then(Value::as_array)
            .is_some_and(|modules| {
                modules
                    .iter()
                    .any(|module| module.get("type").and_then(Value::as_str) == Some(kind))
            })
    }

    /// World manifests carry `format_version` or `level_name`, whatever
    /// their value.
    fn has_world_marker(&self) -> bool {
        self.fields.contains_key("format_version") || self.fields.contains_key("level_name")
    }

    /// Classify by module type first, then by world markers.
    pub fn package_type(&self) -> PackageType {
        if self.has_module("resources") {
            PackageType::ResourcePack
        } else if self.has_module("data") {
            PackageType::BehaviorPack
        } else if self.has_world_marker() {
            PackageType::World
        } else {
            PackageType::Unknown
        }
    }

    // Very old packs put identity at the top level instead of in `header`.
    pub fn uuid(&self) -> Option<String> {
        self.header_str("uuid")
            .or_else(|| self.fields.get("uuid").and_then(Value::as_str))
            .map(str::to_string)
    }

    pub fn name(&self) -> Option<String> {
        self.header_str("name")
            .or_else(|| self.fields.get("name").and_then(Value::as_str))
            .map(str::to_string)
    }

    pub fn description(&self) -> Option<String> {
        self.header_str("description").map(str::to_string)
    }

    /// `level_name` when it is a string.
    pub fn level_name(&self) -> Option<String> {
        self.fields
            .get("level_name")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// `header.version` rendered as `major.minor.patch`.
    ///
    /// Uses the first three elements of an array of at least three
    /// non-negative integers, else [`DEFAULT_PACK_VERSION`].
    pub fn version_string(&self) -> String {
        let parts = self
            .header()
            .and_then(|header| header.get("version"))
            .and_then(Value::as_array)
            .filter(|array| array.len() >= 3)
            .and_then(|array| {
                array[..3]
                    .iter()
                    .map(Value::as_u64)
                    .collect::<Option<Vec<_>>>()
            });

        match parts {
            Some(p) => format!("{}.{}.{}", p[0], p[1], p[2]),
            None => DEFAULT_PACK_VERSION.to_string(),
        }
    }
}

/// Identity fields gathered from a package manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageMetadata {
    pub kind: PackageType,
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub version: String,
    pub description: Option<String>,
}

impl PackageMetadata {
    pub fn unknown() -> Self {
        Self {
            kind: PackageType::Unknown,
            uuid: None,
            name: None,
            version: DEFAULT_PACK_VERSION.to_string(),
            description: None,
        }
    }

    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            kind: manifest.package_type(),
            uuid: manifest.uuid(),
            name: manifest.name(),
            version: manifest.version_string(),
            description: manifest.description(),
        }
    }
}

/// Structural markers of a world archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorldLayout {
    pub has_db: bool,
    pub has_level_dat: bool,
}

impl WorldLayout {
    pub fn looks_like_world(&self) -> bool {
        self.has_db || self.has_level_dat
    }
}
