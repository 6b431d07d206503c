//! Build plans: the units of one build as handed over by the front end.

use std::path::Path;

use rhizome_weave_codegen_js::{
    CompilationUnit, CompileContext, OutputMode, UnitSource, compile_unit,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{BuildAggregator, BuildError, BuildReport, PackageInstaller};

/// Ordered list of unit sources.
///
/// ```json
/// { "units": [ { "filename": "app/main.rb", "fragments": [ ... ] } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    pub units: Vec<UnitSource>,
}

impl BuildPlan {
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        serde_json::from_str(json).map_err(BuildError::Plan)
    }

    pub async fn load(path: &Path) -> Result<Self, BuildError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(BuildError::io("read", path))?;
        Self::from_json(&json)
    }

    /// Compile every unit in order against `ctx`.
    ///
    /// Stops at the first unit that fails to compile.
    pub fn compile(self, ctx: &mut CompileContext) -> Result<Vec<CompilationUnit>, BuildError> {
        self.units
            .into_iter()
            .map(|source| compile_unit(ctx, source).map_err(BuildError::from))
            .collect()
    }
}

/// Compile `plan` in a fresh context and build it into `output_dir`.
pub async fn build_plan<I: PackageInstaller>(
    aggregator: &BuildAggregator<I>,
    mode: OutputMode,
    plan: BuildPlan,
    output_dir: &Path,
    embed_source_map: bool,
) -> Result<BuildReport, BuildError> {
    let mut ctx = CompileContext::new(mode);
    let units = plan.compile(&mut ctx)?;
    info!(
        "compiled {} units ({} imports, {} dependencies)",
        units.len(),
        ctx.imports().len(),
        ctx.dependencies().len()
    );
    aggregator
        .build_directory(&ctx, output_dir, &units, embed_source_map)
        .await
}
