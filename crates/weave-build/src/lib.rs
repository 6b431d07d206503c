//! Package directory builds for Weave.
//!
//! Folds the compilation units of one build into an on-disk package:
//!
//! ```text
//! out/
//!   <module>.js | <module>.mjs   one file per unit
//!   index.js | index.mjs         bootstrap loading the eager-load index
//!   index.html                   esm builds only
//!   package.json                 merged dependency manifest
//! ```
//!
//! When any unit declared a dependency, the package installer is run in
//! the output directory afterwards.

mod aggregator;
pub mod config;
mod error;
pub mod index;
mod installer;
pub mod manifest;
mod plan;

pub use aggregator::{BuildAggregator, BuildReport};
pub use config::{BuildConfig, InstallPolicy};
pub use error::BuildError;
pub use installer::{CommandInstaller, InstallStatus, PackageInstaller};
pub use manifest::{BuildManifest, PackageManifest};
pub use plan::{BuildPlan, build_plan};
