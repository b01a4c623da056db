//! Viewer configuration.
//!
//! Defaults work out of the box; each field can be overridden from the
//! environment (a `.env` file is honoured).

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_RENDER_SCALE: f32 = 1.5;
pub const DEFAULT_LOG_FILTER: &str = "jurisview_lib=info";

const RENDER_SCALE_VAR: &str = "JURISVIEW_RENDER_SCALE";
const DOCUMENTS_DIR_VAR: &str = "JURISVIEW_DOCUMENTS_DIR";
const PDFIUM_DIR_VAR: &str = "JURISVIEW_PDFIUM_DIR";
const LOG_VAR: &str = "JURISVIEW_LOG";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Page size multiplier (1.0 = 72 DPI)
    pub render_scale: f32,
    /// Base directory for relative document locations
    pub documents_dir: PathBuf,
    /// Directory holding the PDFium shared library, if not bundled or installed
    pub pdfium_dir: Option<PathBuf>,
    /// `tracing` filter directive
    pub log_filter: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
            documents_dir: PathBuf::from("."),
            pdfium_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ViewerConfig {
    /// Load `.env` if present, then read overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(RENDER_SCALE_VAR) {
            config.render_scale = match value.trim().parse::<f32>() {
                Ok(scale) if scale.is_finite() && scale > 0.0 => scale,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: RENDER_SCALE_VAR,
                        value,
                    })
                }
            };
        }
        if let Some(dir) = lookup(DOCUMENTS_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.documents_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(PDFIUM_DIR_VAR).filter(|v| !v.trim().is_empty()) {
            config.pdfium_dir = Some(PathBuf::from(dir));
        }
        if let Some(filter) = lookup(LOG_VAR).filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }

        Ok(config)
    }
}
