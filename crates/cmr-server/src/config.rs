//! Bootstrap parameters and server configuration.
//!
//! Bootstrap reads a flat, string-keyed parameter map. Missing or
//! unparsable values fall back to their defaults; configuration never makes
//! bootstrap fail on its own.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use cmr_types::BaseKind;

use crate::error::{ServerError, ServerResult};

/// Parameter keys understood by the bootstrapper.
pub mod keys {
    pub const REPOSITORY_CLASS: &str = "repository.class";
    pub const REPOSITORY_ID: &str = "repository.id";
    pub const TYPE_CREATOR_CLASS: &str = "repository.typecreator.class";

    pub const FILLER_ENABLE: &str = "filler.enable";
    pub const FILLER_DEPTH: &str = "filler.depth";
    pub const FILLER_DOCS_PER_FOLDER: &str = "filler.docsPerFolder";
    pub const FILLER_FOLDERS_PER_FOLDER: &str = "filler.foldersPerFolder";
    pub const FILLER_DOCUMENT_TYPE: &str = "filler.documentType";
    pub const FILLER_FOLDER_TYPE: &str = "filler.folderType";
    pub const FILLER_CONTENT_SIZE_KB: &str = "filler.contentSizeKb";
    /// Followed by a sequential index: `filler.documentProperty0`, ...
    pub const FILLER_DOCUMENT_PROPERTY: &str = "filler.documentProperty";
    pub const FILLER_FOLDER_PROPERTY: &str = "filler.folderProperty";
}

/// Raw string-keyed bootstrap parameters.
pub type Parameters = BTreeMap<String, String>;

/// Typed view of the bootstrap parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub repository_class: Option<String>,
    pub repository_id: Option<String>,
    pub type_creator: Option<String>,
    pub filler: FillerConfig,
}

/// Settings of the demo tree generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FillerConfig {
    pub enabled: bool,
    pub depth: u32,
    pub docs_per_folder: u32,
    pub folders_per_folder: u32,
    pub document_type: String,
    pub folder_type: String,
    pub content_size_kb: u32,
    pub document_properties: Vec<String>,
    pub folder_properties: Vec<String>,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            depth: 1,
            docs_per_folder: 1,
            folders_per_folder: 2,
            document_type: BaseKind::Document.value().to_string(),
            folder_type: BaseKind::Folder.value().to_string(),
            content_size_kb: 0,
            document_properties: Vec::new(),
            folder_properties: Vec::new(),
        }
    }
}

impl BootstrapConfig {
    pub fn from_parameters(params: &Parameters) -> Self {
        let defaults = FillerConfig::default();
        let filler = FillerConfig {
            enabled: flag(params, keys::FILLER_ENABLE),
            depth: number(params, keys::FILLER_DEPTH, defaults.depth),
            docs_per_folder: number(params, keys::FILLER_DOCS_PER_FOLDER, defaults.docs_per_folder),
            folders_per_folder: number(
                params,
                keys::FILLER_FOLDERS_PER_FOLDER,
                defaults.folders_per_folder,
            ),
            document_type: text(params, keys::FILLER_DOCUMENT_TYPE).unwrap_or(defaults.document_type),
            folder_type: text(params, keys::FILLER_FOLDER_TYPE).unwrap_or(defaults.folder_type),
            content_size_kb: number(params, keys::FILLER_CONTENT_SIZE_KB, defaults.content_size_kb),
            document_properties: indexed(params, keys::FILLER_DOCUMENT_PROPERTY),
            folder_properties: indexed(params, keys::FILLER_FOLDER_PROPERTY),
        };
        Self {
            repository_class: text(params, keys::REPOSITORY_CLASS),
            repository_id: text(params, keys::REPOSITORY_ID),
            type_creator: text(params, keys::TYPE_CREATOR_CLASS),
            filler,
        }
    }
}

fn text(params: &Parameters, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn flag(params: &Parameters, key: &str) -> bool {
    params
        .get(key)
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn number(params: &Parameters, key: &str, default: u32) -> u32 {
    let Some(raw) = text(params, key) else {
        return default;
    };
    match raw.parse() {
        Ok(n) => n,
        Err(e) => {
            warn!(key, value = %raw, error = %e, default, "ignoring unparsable parameter");
            default
        }
    }
}

/// Values of `prefix0`, `prefix1`, ... up to the first missing index.
fn indexed(params: &Parameters, prefix: &str) -> Vec<String> {
    (0..)
        .map_while(|i| params.get(&format!("{prefix}{i}")))
        .map(|v| v.trim().to_string())
        .collect()
}

/// A parameter value as written in the TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Flag(bool),
    Integer(i64),
    Text(String),
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Process configuration for the `cmr` binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub parameters: BTreeMap<String, ParameterValue>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            parameters: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(source: &str) -> ServerResult<Self> {
        toml::from_str(source).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Parameters normalized to strings.
    pub fn bootstrap_parameters(&self) -> Parameters {
        self.parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }

    /// Set a parameter, overriding the file.
    pub fn set_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters
            .insert(key.into(), ParameterValue::Text(value.into()));
    }
}
