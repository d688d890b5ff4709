use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for typology conversion.
///
/// This struct holds settings that control how a worksheet is recognised and
/// how the resulting document is stamped and validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The token that marks the start of the typology table.
    ///
    /// The first row containing a cell with this text is taken as the
    /// title/header row. Matching is case-sensitive.
    marker: String,

    /// The value of the `edition` attribute on the document root.
    edition: String,

    /// An external schema to validate against instead of the bundled one.
    schema: Option<PathBuf>,

    /// Whether rows with no content in any cell are skipped.
    ///
    /// Defaults to `true`. When `false`, a blank row fails the conversion like
    /// any other row with a blank name.
    pub skip_blank_rows: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            edition: default_edition(),
            schema: None,
            skip_blank_rows: default_skip_blank_rows(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the header marker token.
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Returns the edition stamped on the document root.
    #[must_use]
    pub fn edition(&self) -> &str {
        &self.edition
    }

    /// Returns the external schema path, if one is configured.
    #[must_use]
    pub fn schema(&self) -> Option<&Path> {
        self.schema.as_deref()
    }

    /// Sets the header marker token.
    pub fn set_marker(&mut self, marker: impl Into<String>) {
        self.marker = marker.into();
    }

    /// Sets the edition stamped on the document root.
    pub fn set_edition(&mut self, edition: impl Into<String>) {
        self.edition = edition.into();
    }

    /// Uses an external schema file instead of the bundled one.
    pub fn set_schema(&mut self, schema: Option<PathBuf>) {
        self.schema = schema;
    }
}

fn default_marker() -> String {
    "MQM".to_string()
}

fn default_edition() -> String {
    "MQM2021".to_string()
}

const fn default_skip_blank_rows() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_marker")]
        marker: String,

        #[serde(default = "default_edition")]
        edition: String,

        /// Path to an XSD file replacing the bundled schema.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<PathBuf>,

        #[serde(default = "default_skip_blank_rows")]
        skip_blank_rows: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                marker,
                edition,
                schema,
                skip_blank_rows,
            } => Self {
                marker,
                edition,
                schema,
                skip_blank_rows,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            marker: config.marker,
            edition: config.edition,
            schema: config.schema,
            skip_blank_rows: config.skip_blank_rows,
        }
    }
}
