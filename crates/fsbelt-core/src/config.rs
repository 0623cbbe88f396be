//! Scan configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Options controlling a space-analyzer scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanOptions {
    /// Root path to scan.
    pub root: PathBuf,

    /// Maximum recursion depth (None = unlimited). Directories at the
    /// limit are reported but not descended into.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Compute SHA-512 content hashes for regular files.
    #[builder(default = "false")]
    #[serde(default)]
    pub compute_hashes: bool,

    /// Number of worker threads (0 = logical CPU count).
    #[builder(default = "0")]
    #[serde(default)]
    pub workers: usize,
}

impl ScanOptionsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanOptions {
    /// Create a new scan options builder.
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Create options for scanning a path with defaults.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_depth: None,
            compute_hashes: false,
            workers: 0,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new(".")
    }
}
