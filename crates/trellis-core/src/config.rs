//! `trellis.toml` configuration
//!
//! Every section is optional:
//!
//! ```toml
//! root = "project"
//! canvas = "board.canvas"
//!
//! [reconcile]
//! transitive_fields = ["depends_on", "children"]
//! cycle_entity_type = "milestone"
//!
//! [layout]
//! item_gap = 40.0
//! ```

use crate::error::TrellisError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use trellis_graph::ReconcileOptions;
use trellis_layout::LayoutConfig;

/// Default config file name
pub const CONFIG_FILE: &str = "trellis.toml";

/// Trellis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    /// Directory holding the entity records
    pub root: PathBuf,
    /// Canvas file, relative to `root` unless absolute
    pub canvas: PathBuf,
    /// Record file extension
    pub extension: String,
    /// Reconcile pass options
    pub reconcile: ReconcileOptions,
    /// Layout spacing
    pub layout: LayoutConfig,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            canvas: PathBuf::from("trellis.canvas"),
            extension: "md".to_string(),
            reconcile: ReconcileOptions::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl TrellisConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With record root
    #[inline]
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// With canvas path
    #[inline]
    #[must_use]
    pub fn with_canvas(mut self, canvas: impl Into<PathBuf>) -> Self {
        self.canvas = canvas.into();
        self
    }

    /// Parse TOML text
    pub fn from_toml(text: &str) -> Result<Self, TrellisError> {
        toml::from_str(text).map_err(|e| TrellisError::config(e.to_string()))
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, TrellisError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TrellisError::config(format!("{}: {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| TrellisError::config(format!("{}: {e}", path.display())))
    }

    /// Load a config file, falling back to defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, TrellisError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Canvas path resolved against the record root
    #[must_use]
    pub fn canvas_path(&self) -> PathBuf {
        if self.canvas.is_absolute() {
            self.canvas.clone()
        } else {
            self.root.join(&self.canvas)
        }
    }
}
