//! Server launch configuration
//!
//! Describes how the host starts the language server and which documents it
//! serves. The defaults match the stock Universal Language Connector setup.

mod selector;

pub use selector::Selector;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::{ConnectorError, Result};

/// Identifier the connector's sessions are registered under
pub const DEFAULT_SERVER_ID: &str = "universal-connector";

/// Launch configuration for the language server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server process argv
    pub command: Vec<String>,

    /// Scope selector restricting which documents activate the server
    pub selector: Selector,

    /// Whether the server should be started at all
    pub enabled: bool,

    /// Languages the server handles
    pub languages: Vec<LanguageConfig>,
}

/// One language handled by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    /// LSP language identifier
    pub language_id: String,

    /// Base scopes of documents in this language
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Syntax definitions providing those scopes
    #[serde(default)]
    pub syntaxes: Vec<String>,

    /// File extensions (without the dot) used to infer the language from a path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
}

impl LanguageConfig {
    fn builtin(language_id: &str, scope: &str, syntax: &str, extensions: &[&str]) -> Self {
        Self {
            language_id: language_id.to_string(),
            scopes: vec![scope.to_string()],
            syntaxes: vec![syntax.to_string()],
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Primary scope of the language
    pub fn scope(&self) -> Option<&str> {
        self.scopes.first().map(String::as_str)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: vec!["universal-connector-server".to_string()],
            selector: Selector::any_of(&["source.markdown", "text.html", "source.json"]),
            enabled: true,
            languages: vec![
                LanguageConfig::builtin(
                    "markdown",
                    "source.markdown",
                    "Packages/Markdown/Markdown.sublime-syntax",
                    &["md", "markdown"],
                ),
                LanguageConfig::builtin(
                    "html",
                    "text.html",
                    "Packages/HTML/HTML.sublime-syntax",
                    &["html", "htm"],
                ),
                LanguageConfig::builtin(
                    "json",
                    "source.json",
                    "Packages/JSON/JSON.sublime-syntax",
                    &["json"],
                ),
            ],
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str());

        match ext {
            Some("json") => Self::from_json_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("toml") => Self::from_toml_file(path),
            _ => Self::from_json_file(path)
                .or_else(|_| Self::from_yaml_file(path))
                .or_else(|_| Self::from_toml_file(path)),
        }
    }

    /// Config file names to search for during auto-discovery
    const DISCOVERY_NAMES: [&'static str; 4] = [
        ".universal-connector.json",
        ".universal-connector.yaml",
        ".universal-connector.yml",
        ".universal-connector.toml",
    ];

    /// Walk up from `start_dir` looking for a config file
    pub fn discover(start_dir: impl AsRef<Path>) -> Option<Self> {
        let mut dir = start_dir.as_ref().to_path_buf();
        loop {
            for name in &Self::DISCOVERY_NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    match Self::from_file(&candidate) {
                        Ok(config) => return Some(config),
                        Err(e) => log::warn!("ignoring {}: {}", candidate.display(), e),
                    }
                }
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Reject configurations the host could not act on
    pub fn validate(&self) -> Result<()> {
        if self.command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(ConnectorError::InvalidConfig(
                "`command` must name the server program".to_string(),
            ));
        }
        if self.selector.is_empty() {
            return Err(ConnectorError::InvalidConfig(
                "`selector` must not be empty".to_string(),
            ));
        }
        for language in &self.languages {
            if language.language_id.trim().is_empty() {
                return Err(ConnectorError::InvalidConfig(
                    "language with an empty `languageId`".to_string(),
                ));
            }
            if language.scopes.is_empty() {
                return Err(ConnectorError::InvalidConfig(format!(
                    "language '{}' has no scopes",
                    language.language_id
                )));
            }
        }
        Ok(())
    }

    /// Find the language a file belongs to by its extension
    pub fn language_for_path(&self, path: impl AsRef<Path>) -> Option<&LanguageConfig> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        self.languages
            .iter()
            .find(|lang| lang.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }

    /// Scope a file would be given, inferred from its extension
    pub fn scope_for_path(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.language_for_path(path).and_then(LanguageConfig::scope)
    }
}
