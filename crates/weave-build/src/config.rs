//! Build configuration.
//!
//! Loaded from a TOML file, every field optional:
//!
//! ```toml
//! output_mode = "esm"          # or "commonjs"
//! source_maps = true
//! install = true
//! installer = "npm"
//! installer_args = ["install"]
//! install_timeout_secs = 300
//! install_policy = "warn"      # or "strict"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use rhizome_weave_codegen_js::OutputMode;
use serde::{Deserialize, Serialize};

use crate::BuildError;

/// What to do when the package installer does not succeed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallPolicy {
    /// Log a warning and report the outcome; the build still succeeds.
    #[default]
    Warn,
    /// Fail the build.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub output_mode: OutputMode,
    /// Embed each unit's source map as a trailing data-URI comment.
    pub source_maps: bool,
    /// Run the installer when dependencies were declared.
    pub install: bool,
    pub installer: String,
    pub installer_args: Vec<String>,
    pub install_timeout_secs: u64,
    pub install_policy: InstallPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::CommonJs,
            source_maps: true,
            install: true,
            installer: "npm".to_string(),
            installer_args: vec!["install".to_string()],
            install_timeout_secs: 300,
            install_policy: InstallPolicy::Warn,
        }
    }
}

impl BuildConfig {
    /// Load a config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(BuildError::io("read", path))?;
        toml::from_str(&contents).map_err(|source| BuildError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: BuildConfig = toml::from_str("").unwrap();
        assert_eq!(config, BuildConfig::default());
        assert_eq!(config.output_mode, OutputMode::CommonJs);
        assert!(config.source_maps);
        assert_eq!(config.installer, "npm");
        assert_eq!(config.installer_args, vec!["install"]);
        assert_eq!(config.install_timeout(), Duration::from_secs(300));
        assert_eq!(config.install_policy, InstallPolicy::Warn);
    }

    #[test]
    fn test_parse_full_config() {
        let config: BuildConfig = toml::from_str(
            r#"
            output_mode = "esm"
            source_maps = false
            install = false
            installer = "pnpm"
            installer_args = ["install", "--frozen-lockfile"]
            install_timeout_secs = 30
            install_policy = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(config.output_mode, OutputMode::EsModule);
        assert!(!config.source_maps);
        assert!(!config.install);
        assert_eq!(config.installer, "pnpm");
        assert_eq!(config.installer_args.len(), 2);
        assert_eq!(config.install_timeout(), Duration::from_secs(30));
        assert_eq!(config.install_policy, InstallPolicy::Strict);
    }

    #[test]
    fn test_rejects_unknown_keys_and_modes() {
        assert!(toml::from_str::<BuildConfig>("outputmode = \"esm\"").is_err());
        assert!(toml::from_str::<BuildConfig>("output_mode = \"amd\"").is_err());
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weave.toml");
        fs::write(&path, "install_policy = \"loud\"").unwrap();
        let err = BuildConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, BuildError::Config { .. }));
        assert!(err.to_string().contains("weave.toml"));

        let missing = BuildConfig::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, BuildError::Io { action: "read", .. }));
    }
}
