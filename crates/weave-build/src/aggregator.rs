//! Package directory aggregation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rhizome_weave_codegen_js::{CompilationUnit, CompileContext, OutputMode};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::BuildError;
use crate::config::{BuildConfig, InstallPolicy};
use crate::index::{render_bootstrap, render_html};
use crate::installer::{CommandInstaller, InstallStatus, PackageInstaller};
use crate::manifest::BuildManifest;

/// What a finished build produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    /// Every file written, in write order.
    pub files: Vec<PathBuf>,
    pub manifest: BuildManifest,
    /// Installer outcome, `None` when the installer was not run.
    pub install: Option<InstallStatus>,
}

/// Writes compiled units into a package directory.
pub struct BuildAggregator<I = CommandInstaller> {
    installer: I,
    install: bool,
    policy: InstallPolicy,
}

impl BuildAggregator<CommandInstaller> {
    pub fn from_config(config: &BuildConfig) -> Self {
        BuildAggregator::new(CommandInstaller::from_config(config))
            .with_install(config.install)
            .with_policy(config.install_policy)
    }
}

impl<I: PackageInstaller> BuildAggregator<I> {
    pub fn new(installer: I) -> Self {
        Self {
            installer,
            install: true,
            policy: InstallPolicy::default(),
        }
    }

    /// Enable or disable the installer step.
    pub fn with_install(mut self, install: bool) -> Self {
        self.install = install;
        self
    }

    pub fn with_policy(mut self, policy: InstallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn installer(&self) -> &I {
        &self.installer
    }

    /// Write every unit, the bootstrap files and `package.json` into
    /// `output_dir`, then run the installer if any dependency was declared.
    ///
    /// Fails before writing anything if a unit has an empty module name or
    /// shares its module name with an earlier unit.
    pub async fn build_directory(
        &self,
        ctx: &CompileContext,
        output_dir: &Path,
        units: &[CompilationUnit],
        embed_source_map: bool,
    ) -> Result<BuildReport, BuildError> {
        let mode = ctx.output_mode();
        check_module_names(units)?;
        info!(
            "building {} units into {} ({})",
            units.len(),
            output_dir.display(),
            mode
        );
        fs::create_dir_all(output_dir)
            .await
            .map_err(BuildError::io("create directory", output_dir))?;

        let mut files = Vec::new();
        for unit in units {
            let path = output_dir.join(format!("{}.{}", unit.module_name(), mode.extension()));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(BuildError::io("create directory", parent))?;
            }

            let mut contents = unit.code().to_string();
            if embed_source_map {
                match unit.source_map() {
                    Some(map) => {
                        contents.push('\n');
                        contents.push_str(&map.data_uri_comment());
                    }
                    None => debug!("{} has no source map", unit.module_name()),
                }
            }
            write_file(&path, contents).await?;
            files.push(path);
        }

        let manifest = BuildManifest::from_units(mode, units);
        files.extend(
            self.build_index(mode, output_dir, &manifest.eager_load_index)
                .await?,
        );
        let (manifest_path, install) = self.build_manifest(output_dir, &manifest).await?;
        files.push(manifest_path);

        info!(
            "built {}: {} files, {} eager modules, {} dependencies",
            output_dir.display(),
            files.len(),
            manifest.eager_load_index.len(),
            manifest.dependencies.len()
        );
        Ok(BuildReport {
            files,
            manifest,
            install,
        })
    }

    /// Write the bootstrap module, plus `index.html` for ES module builds.
    pub async fn build_index(
        &self,
        mode: OutputMode,
        output_dir: &Path,
        index: &[String],
    ) -> Result<Vec<PathBuf>, BuildError> {
        let mut files = Vec::new();

        let bootstrap = output_dir.join(mode.index_file());
        write_file(&bootstrap, render_bootstrap(mode, index)).await?;
        files.push(bootstrap);

        if mode.is_esm() {
            let html = output_dir.join("index.html");
            write_file(&html, render_html(index)).await?;
            files.push(html);
        }
        Ok(files)
    }

    /// Write `package.json` and run the installer when `manifest` declares
    /// any dependency.
    pub async fn build_manifest(
        &self,
        output_dir: &Path,
        manifest: &BuildManifest,
    ) -> Result<(PathBuf, Option<InstallStatus>), BuildError> {
        let package = manifest.package();
        if !manifest.output_mode.is_esm() {
            debug!("package.json type is \"{}\" for a commonjs build", package.module_type);
        }
        let path = output_dir.join("package.json");
        write_file(&path, package.render()?).await?;

        if package.dependencies.is_empty() {
            return Ok((path, None));
        }
        if !self.install {
            info!(
                "skipping package install ({} dependencies declared)",
                package.dependencies.len()
            );
            return Ok((path, None));
        }

        let status = self.installer.install(output_dir).await;
        if status.is_success() {
            info!("installed {} packages", package.dependencies.len());
        } else if self.policy == InstallPolicy::Strict {
            error!("package install in {} {}", output_dir.display(), status);
            return Err(BuildError::Install {
                dir: output_dir.to_path_buf(),
                status,
            });
        } else {
            warn!("package install in {} {}", output_dir.display(), status);
        }
        Ok((path, Some(status)))
    }
}

/// Reject units whose module name is empty or taken by an earlier unit.
fn check_module_names(units: &[CompilationUnit]) -> Result<(), BuildError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for unit in units {
        let module = unit.module_name();
        if module.is_empty() {
            return Err(BuildError::EmptyModuleName {
                filename: unit.filename().to_string(),
            });
        }
        if let Some(first) = seen.insert(module, unit.filename()) {
            return Err(BuildError::DuplicateModule {
                module: module.to_string(),
                filename: unit.filename().to_string(),
                first: first.to_string(),
            });
        }
    }
    Ok(())
}

async fn write_file(path: &Path, contents: String) -> Result<(), BuildError> {
    debug!("writing {}", path.display());
    fs::write(path, contents)
        .await
        .map_err(BuildError::io("write", path))
}
