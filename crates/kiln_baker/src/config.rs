//! # Baker Configuration
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! output_dir = "assets_export"   # relative paths resolve against the input dir
//! texture_compression = "LZ4"    # or "None"
//! normal_mode = "flat"           # or "smooth"
//! workers = 0                    # 0 = one per CPU
//! ```
//!
//! Every key is optional. Unknown keys are rejected so typos surface.

use std::path::{Path, PathBuf};

use kiln_assets::{CompressionMode, NormalMode};
use serde::{Deserialize, Serialize};

use crate::error::BakeResult;

/// Config file picked up from the input directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "kiln.toml";

/// Output directory name used when the config does not set one.
pub const DEFAULT_OUTPUT_DIR: &str = "assets_export";

/// Settings for one baking run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BakerConfig {
    /// Where baked files go. `None` means `<input>/assets_export`.
    pub output_dir: Option<PathBuf>,
    /// Compression applied to texture payloads.
    pub texture_compression: CompressionMode,
    /// How mesh normals are regenerated.
    pub normal_mode: NormalMode,
    /// Worker threads. 0 means one per available CPU.
    pub workers: usize,
}

impl Default for BakerConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            texture_compression: CompressionMode::Lz4,
            normal_mode: NormalMode::Flat,
            workers: 0,
        }
    }
}

impl BakerConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`BakeError::Config`](crate::BakeError::Config) for malformed
    /// TOML, unknown keys or unknown enum tokens.
    pub fn from_toml_str(source: &str) -> BakeResult<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a config error.
    pub fn load(path: impl AsRef<Path>) -> BakeResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolves the config for a run: an explicit file wins, then
    /// `<input_dir>/kiln.toml`, then defaults.
    ///
    /// # Errors
    ///
    /// Same as [`BakerConfig::load`].
    pub fn resolve(input_dir: &Path, explicit: Option<&Path>) -> BakeResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let local = input_dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            Self::load(local)
        } else {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, input_dir.display());
            Ok(Self::default())
        }
    }

    /// Output directory for a given input directory.
    #[must_use]
    pub fn output_dir_for(&self, input_dir: &Path) -> PathBuf {
        match &self.output_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => input_dir.join(dir),
            None => input_dir.join(DEFAULT_OUTPUT_DIR),
        }
    }

    /// Number of worker threads to start.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BakeError;

    #[test]
    fn test_defaults() {
        let config = BakerConfig::default();
        assert_eq!(config.texture_compression, CompressionMode::Lz4);
        assert_eq!(config.normal_mode, NormalMode::Flat);
        assert_eq!(config.output_dir_for(Path::new("art")), Path::new("art").join("assets_export"));
        assert!(config.worker_count() >= 1);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(BakerConfig::from_toml_str("").unwrap(), BakerConfig::default());
    }

    #[test]
    fn test_parse_full_document() {
        let config = BakerConfig::from_toml_str(
            r#"
            output_dir = "baked"
            texture_compression = "None"
            normal_mode = "smooth"
            workers = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.texture_compression, CompressionMode::None);
        assert_eq!(config.normal_mode, NormalMode::Smooth);
        assert_eq!(config.worker_count(), 3);
        assert_eq!(config.output_dir_for(Path::new("art")), Path::new("art").join("baked"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            BakerConfig::from_toml_str("texture_compression = \"zstd\""),
            Err(BakeError::Config(_))
        ));
        assert!(matches!(
            BakerConfig::from_toml_str("normal_mode = \"Flat\""),
            Err(BakeError::Config(_))
        ));
        assert!(matches!(BakerConfig::from_toml_str("wokers = 2"), Err(BakeError::Config(_))));
    }

    #[test]
    fn test_resolve_without_file_uses_defaults() {
        let dir = std::env::temp_dir().join(format!("kiln_config_none_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        assert_eq!(BakerConfig::resolve(&dir, None).unwrap(), BakerConfig::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_resolve_prefers_local_file() {
        let dir = std::env::temp_dir().join(format!("kiln_config_local_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE_NAME), "workers = 2\n").unwrap();

        assert_eq!(BakerConfig::resolve(&dir, None).unwrap().workers, 2);
        assert!(matches!(
            BakerConfig::resolve(&dir, Some(&dir.join("missing.toml"))),
            Err(BakeError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).ok();
    }
}
