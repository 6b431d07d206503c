//! Build manifest and `package.json`.

use std::collections::BTreeMap;

use rhizome_weave_codegen_js::{CompilationUnit, DependencyRecord, OutputMode};
use serde::{Deserialize, Serialize};

use crate::BuildError;

/// Everything a build derives from its units besides their code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildManifest {
    /// Modules the bootstrap loads, in unit order.
    pub eager_load_index: Vec<String>,
    /// Package name to version, last declaration wins.
    pub dependencies: BTreeMap<String, String>,
    pub output_mode: OutputMode,
}

impl BuildManifest {
    /// Collect the eager-load index and merged dependencies of `units`.
    pub fn from_units(output_mode: OutputMode, units: &[CompilationUnit]) -> Self {
        let eager_load_index = units
            .iter()
            .filter(|unit| unit.flags().eager())
            .map(|unit| unit.module_name().to_string())
            .collect();
        let dependencies =
            merge_dependencies(units.iter().flat_map(|unit| unit.local_dependencies()));
        Self {
            eager_load_index,
            dependencies,
            output_mode,
        }
    }

    pub fn package(&self) -> PackageManifest {
        PackageManifest::new(self.output_mode, self.dependencies.clone())
    }
}

/// Fold dependency declarations into a name to version map.
///
/// A later declaration of the same name replaces the earlier version.
pub fn merge_dependencies<'a>(
    records: impl IntoIterator<Item = &'a DependencyRecord>,
) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for record in records {
        merged.insert(record.name.clone(), record.version.clone());
    }
    merged
}

/// The `package.json` written at the root of the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub private: bool,
    pub dependencies: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub module_type: String,
    pub main: String,
}

impl PackageManifest {
    pub fn new(output_mode: OutputMode, dependencies: BTreeMap<String, String>) -> Self {
        Self {
            private: true,
            dependencies,
            module_type: output_mode.package_type().to_string(),
            main: format!("./{}", output_mode.index_file()),
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn render(&self) -> Result<String, BuildError> {
        let mut json = serde_json::to_string_pretty(self).map_err(BuildError::Manifest)?;
        json.push('\n');
        Ok(json)
    }
}
