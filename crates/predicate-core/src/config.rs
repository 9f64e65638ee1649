use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Root application configuration, loaded from `~/.config/predicate/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub matching: MatchingConfig,
    pub merge: MergeConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum similarity for a fuzzy (third tier) match.
    pub similarity_threshold: f64,
    pub empty_names: EmptyNamePolicy,
}

/// Whether two records whose names normalize to `""` may be matched by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyNamePolicy {
    /// Two empty names are identical (similarity 1.0).
    #[default]
    Match,
    /// Unnamed records only match through their clearance key.
    Ignore,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub upload_policy: UploadPolicy,
}

/// Merge policy applied to records coming from PDF extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPolicy {
    FillMissing,
    /// Registry fields read from the clearance letter override search data.
    #[default]
    PdfExtraction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: String,
    /// Product code of the device being submitted, used when a query or upload has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    pub max_selected: usize,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.9,
            empty_names: EmptyNamePolicy::Match,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("predicate");

        Self {
            path: data_dir.join("session.json").to_string_lossy().to_string(),
            product_code: None,
            max_selected: 3,
        }
    }
}

impl EmptyNamePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Ignore => "ignore",
        }
    }
}

impl UploadPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FillMissing => "fill_missing",
            Self::PdfExtraction => "pdf_extraction",
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/predicate/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("PREDICATE_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("predicate")
            .join("config.toml")
    }

    /// Load and validate the config at `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CoreError::ConfigError(format!(
                "matching.similarity_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.session.max_selected == 0 {
            return Err(CoreError::ConfigError(
                "session.max_selected must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Session file to use: an explicit override, else `session.path`.
    pub fn session_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.session.path))
    }
}
