use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{GenError, Result};

/// Generator options.
///
/// Every field has a default, so a configuration file only needs to list
/// what it changes:
///
/// ```ron
/// (
///     version: Some("1.3"),
///     platforms: ["xlib", "wayland"],
///     link_name: Some("vulkan"),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Name recorded in the generated headers.
    pub name: String,
    /// API to generate, as named by `api`/`supported` attributes.
    pub api: String,
    /// Highest core version to include (`"1.2"`); all versions when absent.
    pub version: Option<String>,
    /// Extensions to include; every supported extension when absent.
    pub extensions: Option<Vec<String>>,
    /// Window-system platforms whose extensions are included.
    pub platforms: Vec<String>,
    pub provisional: bool,
    /// Size of a native pointer in bytes.
    pub pointer_width: usize,
    /// Struct members left out of the bindings regardless of their API tag.
    pub member_exclusions: Vec<MemberExclusion>,
    /// Byte offsets pinned for struct members. A pinned member switches its
    /// struct to an explicit layout.
    pub member_offsets: Vec<MemberOffset>,
    /// Rust spelling of types provided by platform headers (`Display`, `HWND`, ...).
    pub external_types: BTreeMap<String, String>,
    /// Treat every parser diagnostic as fatal.
    pub strict: bool,
    /// Write a `mod.rs` declaring and re-exporting all units.
    pub module_index: bool,
    /// Library named in `#[link(name = ..)]` on the command block.
    pub link_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberExclusion {
    pub structure: String,
    pub member: String,
    /// Only exclude the declaration carrying this API tag.
    #[serde(default)]
    pub api: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberOffset {
    pub structure: String,
    pub member: String,
    pub offset: usize,
}

impl Default for GeneratorConfig {
    fn default() -> GeneratorConfig {
        GeneratorConfig {
            name: String::from("AllVersions"),
            api: String::from("vulkan"),
            version: None,
            extensions: None,
            platforms: Vec::new(),
            provisional: false,
            pointer_width: 8,
            member_exclusions: Vec::new(),
            member_offsets: Vec::new(),
            external_types: default_external_types(),
            strict: false,
            module_index: true,
            link_name: None,
        }
    }
}

/// Platform types which appear by value in structs of the common window-system extensions.
fn default_external_types() -> BTreeMap<String, String> {
    [
        ("Window", "u64"),
        ("VisualID", "u64"),
        ("RROutput", "u64"),
        ("xcb_window_t", "u32"),
        ("xcb_visualid_t", "u32"),
        ("zx_handle_t", "u32"),
        ("HINSTANCE", "*mut c_void"),
        ("HWND", "*mut c_void"),
        ("HMONITOR", "*mut c_void"),
        ("HANDLE", "*mut c_void"),
        ("DWORD", "u32"),
        ("LPCWSTR", "*const u16"),
    ]
    .iter()
    .map(|(k, v)| (String::from(*k), String::from(*v)))
    .collect()
}

impl GeneratorConfig {
    pub fn from_ron(text: &str) -> Result<GeneratorConfig> {
        let config: GeneratorConfig =
            ron::from_str(text).map_err(|e| GenError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<GeneratorConfig> {
        let text = std::fs::read_to_string(path).map_err(|source| GenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        GeneratorConfig::from_ron(&text)
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
            .map_err(|e| GenError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pointer_width != 4 && self.pointer_width != 8 {
            return Err(GenError::Config(format!(
                "pointer_width must be 4 or 8, got {}",
                self.pointer_width
            )));
        }
        if self.api.is_empty() {
            return Err(GenError::Config(String::from("api must not be empty")));
        }
        if let Some(version) = &self.version {
            parse_version(version).ok_or_else(|| {
                GenError::Config(format!("version `{}` is not of the form MAJOR.MINOR", version))
            })?;
        }
        Ok(())
    }

    pub fn excludes_member(&self, structure: &str, member: &str, api: Option<&str>) -> bool {
        self.member_exclusions.iter().any(|e| {
            e.structure == structure
                && e.member == member
                && e.api.as_deref().map_or(true, |a| Some(a) == api)
        })
    }

    pub fn member_offset(&self, structure: &str, member: &str) -> Option<usize> {
        self.member_offsets
            .iter()
            .find(|o| o.structure == structure && o.member == member)
            .map(|o| o.offset)
    }
}

/// Parses `"1.2"` into `(1, 2)`.
pub fn parse_version(text: &str) -> Option<(u32, u32)> {
    let (major, minor) = text.split_once('.')?;
    Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_ron("()").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.api, "vulkan");
        assert_eq!(config.pointer_width, 8);
    }

    #[test]
    fn test_partial_file() {
        let config = GeneratorConfig::from_ron(
            r#"(
                version: Some("1.1"),
                platforms: ["xlib"],
                member_exclusions: [(structure: "VkFoo", member: "bar")],
                member_offsets: [(structure: "VkFoo", member: "baz", offset: 4)],
            )"#,
        )
        .unwrap();
        assert_eq!(config.version.as_deref(), Some("1.1"));
        assert_eq!(config.platforms, vec![String::from("xlib")]);
        assert!(config.excludes_member("VkFoo", "bar", Some("vulkansc")));
        assert!(!config.excludes_member("VkFoo", "baz", None));
        assert_eq!(config.member_offset("VkFoo", "baz"), Some(4));
        assert_eq!(config.member_offset("VkFoo", "bar"), None);
    }

    #[test]
    fn test_invalid() {
        assert!(GeneratorConfig::from_ron("(pointer_width: 2)").is_err());
        assert!(GeneratorConfig::from_ron("(version: Some(\"one\"))").is_err());
        assert!(GeneratorConfig::from_ron("(unknown: 1)").is_err());
    }

    #[test]
    fn test_round_trip() {
        let config = GeneratorConfig {
            link_name: Some(String::from("vulkan")),
            ..GeneratorConfig::default()
        };
        let text = config.to_ron().unwrap();
        assert_eq!(GeneratorConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.3"), Some((1, 3)));
        assert_eq!(parse_version("1"), None);
    }
}
